//! The Config structure stores configuration values in a hash map
//! that can be easily passed to data processing functions as a single variable.
//!
//! Values are gathered from environment variables. An unset variable takes
//! the caller's default, while a variable that is set but cannot be parsed
//! is reported as a ConfigError before any data is processed.

// dependencies
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use crate::error::ConfigError;

/// The Config struct gathers configuration values from environment variables
/// and can store derived configuration values in a hash map organized by data type.
/// Supported data types include usize, bool, and String.
#[derive(Debug, Default)]
pub struct Config {
    pub usize:  HashMap<String, usize>,
    pub bool:   HashMap<String, bool>,
    pub string: HashMap<String, String>,
}
impl Config {
    /// Create a new empty Config instance.
    pub fn new() -> Self {
        Config::default()
    }
    /* ------------------------------------------------------------------
    environment variable setters
    ------------------------------------------------------------------ */
    /// Set usize configuration values from environment variables,
    /// given as (key, default) pairs.
    pub fn set_usize_env(&mut self, keys: &[(&str, usize)]) -> Result<(), ConfigError> {
        for &(key, default) in keys {
            self.set_usize_from(key, Self::get_env_string(key).as_deref(), default)?;
        }
        Ok(())
    }
    /// Set bool configuration values from environment variables,
    /// given as (key, default) pairs.
    /// Accepts 1|0, true|false and yes|no in any case.
    pub fn set_bool_env(&mut self, keys: &[(&str, bool)]) -> Result<(), ConfigError> {
        for &(key, default) in keys {
            self.set_bool_from(key, Self::get_env_string(key).as_deref(), default)?;
        }
        Ok(())
    }
    /// Set String configuration values from environment variables,
    /// given as (key, default) pairs.
    pub fn set_string_env(&mut self, keys: &[(&str, &str)]) {
        for &(key, default) in keys {
            let value = Self::get_env_string(key).unwrap_or_else(|| default.to_string());
            self.string.insert(key.to_string(), value);
        }
    }
    /* ------------------------------------------------------------------
    raw value setters, used by the environment setters
    ------------------------------------------------------------------ */
    /// Set a usize value from an optional raw string, falling back to `default`.
    pub fn set_usize_from(&mut self, key: &str, raw: Option<&str>, default: usize) -> Result<(), ConfigError> {
        let value = match raw {
            Some(raw) => Self::parse_env_string(key, raw, "usize")?,
            None => default,
        };
        self.usize.insert(key.to_string(), value);
        Ok(())
    }
    /// Set a bool value from an optional raw string, falling back to `default`.
    pub fn set_bool_from(&mut self, key: &str, raw: Option<&str>, default: bool) -> Result<(), ConfigError> {
        let value = match raw.map(|raw| raw.trim().to_ascii_lowercase()) {
            None => default,
            Some(raw) => match raw.as_str() {
                "1" | "true"  | "yes" => true,
                "0" | "false" | "no"  => false,
                _ => return Err(ConfigError::Parse {
                    key:       key.to_string(),
                    value:     raw,
                    data_type: "bool",
                }),
            },
        };
        self.bool.insert(key.to_string(), value);
        Ok(())
    }
    /* ------------------------------------------------------------------
    environment variable helpers
    ------------------------------------------------------------------ */
    // get the string representation of an environment variable, if set and not empty
    fn get_env_string(key: &str) -> Option<String> {
        env::var_os(key)
            .map(|value| value.to_string_lossy().to_string())
            .filter(|value| !value.is_empty())
    }
    // parse an environment variable string into the desired data type
    fn parse_env_string<T: FromStr>(key: &str, value: &str, data_type: &'static str) -> Result<T, ConfigError> {
        value.trim().parse::<T>().map_err(|_| ConfigError::Parse {
            key:   key.to_string(),
            value: value.to_string(),
            data_type,
        })
    }
    /* ------------------------------------------------------------------
    config variable getters
    ------------------------------------------------------------------ */
    /// Get a usize configuration value by key. Panic if the key is not found.
    pub fn get_usize(&self, key: &str) -> usize {
        *self.usize.get(key).unwrap_or_else(|| Self::key_not_found(key, "usize"))
    }
    /// Get a bool configuration value by key. Panic if the key is not found.
    pub fn get_bool(&self, key: &str) -> bool {
        *self.bool.get(key).unwrap_or_else(|| Self::key_not_found(key, "bool"))
    }
    /// Get a String configuration value by key. Panic if the key is not found.
    pub fn get_string(&self, key: &str) -> &str {
        self.string.get(key).unwrap_or_else(|| Self::key_not_found(key, "String"))
    }
    /* ------------------------------------------------------------------
    config getter helpers
    ------------------------------------------------------------------ */
    fn key_not_found<T>(key: &str, data_type: &str) -> T {
        panic!("Config key {key} not found in {data_type} value map.")
    }
}

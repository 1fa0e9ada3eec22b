//! The Counters structure stores count values that can be shared by
//! reference across all threads of a streaming pipeline.
//!
//! Counter keys are fixed when a Counters object is created. Values are
//! atomic, so every stage increments the same instance without locking
//! and a progress reporter can read them at any time.

// dependencies
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use num_format::{Locale, ToFormattedString};

// define a constant to print a separator line when printing counters
pub const COUNTER_SEPARATOR: &str = "------------------------------------------------------------";

/// The Counters struct stores keyed atomic usize count values in a HashMap.
///
/// By convention, Counters objects are named `ctrs`.
#[derive(Debug)]
pub struct Counters {
    tool:         String,
    keys:         Vec<String>,
    descriptions: HashMap<String, String>,
    counts:       HashMap<String, AtomicUsize>,
}
impl Counters {
    /// Create a new Counters instance with the specified counter keys
    /// initialized to zero.
    ///
    /// Pass requested counters as a slice of tuples of form `&[(&str, &str)]`,
    /// where the first element of each tuple is the counter key and the second
    /// element is the counter description.
    ///
    /// Pass (COUNTER_SEPARATOR, "") to insert a separator line
    /// between groups of related counters.
    ///
    /// By convention, Counters objects are named `ctrs`.
    pub fn new(tool: &str, counters: &[(&str, &str)]) -> Self {
        let mut keys: Vec<String> = Vec::new();
        let mut descriptions: HashMap<String, String> = HashMap::new();
        let mut counts: HashMap<String, AtomicUsize> = HashMap::new();
        let mut n_separators = 0_usize;
        for (key, description) in counters {
            let mut final_key = key.to_string();
            if *key == COUNTER_SEPARATOR {
                final_key = format!("{}{}", COUNTER_SEPARATOR, n_separators);
                descriptions.insert(final_key.clone(), COUNTER_SEPARATOR.to_string());
                n_separators += 1;
            } else {
                descriptions.insert(final_key.clone(), (*description).to_string());
                counts.insert(final_key.clone(), AtomicUsize::new(0));
            }
            keys.push(final_key);
        }
        Counters {
            tool: tool.to_string(),
            keys,
            descriptions,
            counts,
        }
    }

    /// Return a handle to a single counter, so that hot loops can increment it
    /// without a key lookup per record.
    ///
    /// Panic if the key is not found, which is a programming error.
    pub fn counter(&self, key: &str) -> &AtomicUsize {
        self.counts.get(key).unwrap_or_else(||
            panic!("Counters::counter error: key '{}' not found", key)
        )
    }

    /// Return the current count for the specified counter key.
    ///
    /// Panic if the key is not found.
    pub fn get(&self, key: &str) -> usize {
        self.counter(key).load(Ordering::Relaxed)
    }

    /* ------------------------------------------------------------------
    count reporting
    ------------------------------------------------------------------ */
    /// Print the value of all counters with their descriptions
    /// to STDERR in the order they were initialized.
    pub fn print_all(&self) {
        for line in self.report_lines() {
            eprintln!("{}", line);
        }
    }

    // one formatted line per counter or separator, in declaration order
    fn report_lines(&self) -> Vec<String> {
        self.keys.iter().map(|key| {
            let description = &self.descriptions[key];
            if key.starts_with(COUNTER_SEPARATOR) {
                description.clone()
            } else {
                format!("{}\t{}\t{}\t{}",
                    self.tool,
                    self.get(key).to_formatted_string(&Locale::en),
                    key,
                    description
                )
            }
        }).collect()
    }
}

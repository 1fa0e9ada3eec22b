use std::io;
use thiserror::Error;

/// Errors surfaced by a rollup run.
///
/// Neither variant aborts the pipeline: by the time a RollupError is
/// returned, every record that was read has been merged and drained.
#[derive(Error, Debug)]
pub enum RollupError {
    #[error("error reading input: {0}")]
    Read(#[source] io::Error),
    #[error("error writing output: {0}")]
    Write(#[source] io::Error),
}

/// Errors raised while gathering configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {key} value '{value}' could not be parsed as {data_type}")]
    Parse {
        key:       String,
        value:     String,
        data_type: &'static str,
    },
    #[error("could not open {path}: {source}")]
    Open {
        path:   String,
        #[source]
        source: io::Error,
    },
}

// modules
pub mod error;    // error types returned by runs and configuration
pub mod workflow; // support for configuration, logging, counters and file streams
pub mod record;   // the streaming group-by-and-merge pipeline

// re-exports
pub use error::{ConfigError, RollupError};
pub use record::fanner::RollupFanner;
pub use record::{rollup_counters, Group, MergedRecord, RollupSummary};
pub use workflow::Workflow;

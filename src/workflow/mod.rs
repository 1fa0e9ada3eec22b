// modules
mod config;
mod counters;
mod log;
pub mod file;
pub mod progress;

// exports
pub use config::Config;
pub use counters::{Counters, COUNTER_SEPARATOR};
pub use log::Log;
pub use progress::Progress;

/// Declare string keys as `pub const KEY: &str = "KEY";`, where each constant's
/// value is its own name.
///
/// Used for the rollup counter keys, e.g., `ctrs.get(N_RECORDS_OUT)`, and for
/// the tool's environment variables, e.g., `w.cfg.get_usize(CSV_ROLLUP_CAPACITY)`,
/// where the variable name doubles as the Config key.
///
/// Keys may be space- or comma-separated.
#[macro_export]
macro_rules! pub_key_constants {
    ($($key:ident)+) => { // support space-separated keys
        $(
            pub const $key: &str = stringify!($key);
        )+
    };
    ($($key:ident),+ $(,)?) => { // support comma-separated keys
        $(
            pub const $key: &str = stringify!($key);
        )+
    };
}

/// The Workflow structure organizes the common components of a data processing workflow,
/// including configuration parameters, logging, and counters.
///
/// It is a convenience wrapper to facilitate passing these common components to functions
/// in a single variable. Pipeline stages on different threads share one Workflow by
/// reference; counters are atomic and need no `&mut`.
///
/// By convention, Workflow objects are named `w`, and elements are accessed as
/// `w.cfg`, `w.log`, and `w.ctrs`.
pub struct Workflow {
    pub cfg:  Config,
    pub ctrs: Counters,
    pub log:  Log,
}
impl Workflow {
    /// Create a new Workflow instance with specified tool name, configuration,
    /// and counters.
    ///
    /// By convention, Workflow objects are named `w`, and elements are accessed as
    /// `w.cfg`, `w.log`, and `w.ctrs`.
    pub fn new(tool: &str, cfg: Config, ctrs: Counters) -> Self {
        Self {
            cfg,
            ctrs,
            log: Log::new(tool),
        }
    }
}

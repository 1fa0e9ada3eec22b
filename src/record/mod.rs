// modules
pub mod queue;   // closeable bounded queues built on Crossbeam channels
pub mod reader;  // newline-delimited line reading
pub mod grouper; // contiguous key runs into Groups
pub mod merger;  // per-group value deduplication
pub mod writer;  // merged record output
pub mod fanner;  // the threaded pipeline that connects them

// dependencies
use crate::pub_key_constants;
use crate::workflow::{Counters, COUNTER_SEPARATOR};

/* ------------------------------------------------------------------
constants
------------------------------------------------------------------ */
/// Default separator between the key and the value of a line.
pub const DELIMITER: u8 = b',';
/// Default separator between merged values within one output value field.
pub const SENTINEL: u8 = b'\0';
/// Buffer size for input and output streams.
pub const IO_CAPACITY: usize = 8 * 1024 * 1024; // 8 MB

// counter keys shared by all pipeline stages
pub_key_constants!(
    N_LINES
    N_RECORDS_IN
    N_INVALID
    N_GROUPS
    N_RECORDS_OUT
);

/// Create the Counters used by a rollup pipeline.
pub fn rollup_counters(tool: &str) -> Counters {
    Counters::new(tool, &[
        (N_LINES,       "non-empty input lines"),
        (N_INVALID,     "invalid lines skipped"),
        (N_RECORDS_IN,  "valid input records"),
        (COUNTER_SEPARATOR, ""),
        (N_GROUPS,      "contiguous key groups"),
        (N_RECORDS_OUT, "merged output records"),
    ])
}

/// Final counts of a completed rollup run, read from its Counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollupSummary {
    pub n_lines:       usize,
    pub n_records_in:  usize,
    pub n_invalid:     usize,
    pub n_groups:      usize,
    pub n_records_out: usize,
}
impl RollupSummary {
    /// Snapshot the rollup counters; call only after every stage has finished.
    pub fn from_counters(ctrs: &Counters) -> Self {
        RollupSummary {
            n_lines:       ctrs.get(N_LINES),
            n_records_in:  ctrs.get(N_RECORDS_IN),
            n_invalid:     ctrs.get(N_INVALID),
            n_groups:      ctrs.get(N_GROUPS),
            n_records_out: ctrs.get(N_RECORDS_OUT),
        }
    }
}

/* ------------------------------------------------------------------
record types
------------------------------------------------------------------ */
/// Split a trimmed line into (key, value) at the first delimiter.
/// The value keeps any further delimiters verbatim.
///
/// Returns None for a malformed line, i.e., one with no delimiter,
/// an empty key, or an empty value.
pub fn split_record(line: &[u8], delimiter: u8) -> Option<(&[u8], &[u8])> {
    let i = line.iter().position(|&b| b == delimiter)?;
    let (key, value) = (&line[..i], &line[i + 1..]);
    if key.is_empty() || value.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

/// The values of one contiguous run of records sharing a key.
/// A Group is filled by the grouper and then handed whole to one merge worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key:    Vec<u8>,
    pub values: Vec<Vec<u8>>,
}
impl Group {
    /// Open a new, empty Group for a key.
    pub fn new(key: &[u8]) -> Self {
        Group {
            key:    key.to_vec(),
            values: Vec::new(),
        }
    }
}

/// One output record: a key and its deduplicated values,
/// already joined by the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub key:    Vec<u8>,
    pub values: Vec<u8>,
}

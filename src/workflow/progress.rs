//! Periodic throughput reporting to STDERR.
//!
//! A Progress reporter only reads counters; it never touches the record
//! stream. It runs on its own thread until told to quit.

// dependencies
use std::time::{Duration, Instant};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use num_format::{Locale, ToFormattedString};
use crate::workflow::{Counters, Log};

/// Reports records read and written, and their rates, at a fixed interval.
pub struct Progress<'a> {
    log:      &'a Log,
    ctrs:     &'a Counters,
    in_key:   &'a str,
    out_key:  &'a str,
    interval: Duration,
}
impl<'a> Progress<'a> {
    /// Create a reporter over two counter keys of a shared Counters instance.
    pub fn new(
        log:      &'a Log,
        ctrs:     &'a Counters,
        in_key:   &'a str,
        out_key:  &'a str,
        interval: Duration,
    ) -> Self {
        Self { log, ctrs, in_key, out_key, interval }
    }

    /// Print a report every interval until `quit` receives a message or
    /// its sender is dropped.
    pub fn run(&self, quit: &Receiver<()>) {
        let mut start = Instant::now();
        loop {
            match quit.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let n_in  = self.ctrs.get(self.in_key);
                    let n_out = self.ctrs.get(self.out_key);
                    // rates are measured from the first record, not from start-up
                    if n_in == 0 && n_out == 0 {
                        start = Instant::now();
                        continue;
                    }
                    if let Some(msg) = report(n_in, n_out, start.elapsed()) {
                        self.log.print(&msg);
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

/// Format a throughput report, or None if too little time has passed
/// for the rates to be meaningful.
pub fn report(n_in: usize, n_out: usize, elapsed: Duration) -> Option<String> {
    let secs = elapsed.as_secs_f64();
    if secs <= 1.0 {
        return None;
    }
    let rate = |n: usize| ((n as f64 / secs) as usize).to_formatted_string(&Locale::en);
    Some(format!("read {} and wrote {} records in {} seconds ({}/s in, {}/s out)",
        n_in.to_formatted_string(&Locale::en),
        n_out.to_formatted_string(&Locale::en),
        elapsed.as_secs(),
        rate(n_in),
        rate(n_out),
    ))
}

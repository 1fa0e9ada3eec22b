//! Read newline-delimited lines from a byte stream onto a queue.
//!
//! Lines of any length are supported. A line longer than the read buffer is
//! accumulated into a growable line buffer until its terminator arrives.

// dependencies
use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::Ordering;
use super::queue::Producer;
use super::{IO_CAPACITY, N_LINES};
use crate::workflow::Counters;

/// Read all lines from `input` onto `tx` using the default buffer size.
/// See `read_lines_with_capacity()`.
pub fn read_lines<R: Read>(
    input: R,
    tx:    Producer<Vec<u8>>,
    ctrs:  &Counters,
) -> io::Result<()> {
    read_lines_with_capacity(input, IO_CAPACITY, tx, ctrs)
}

/// Read all lines from `input` onto `tx`, buffering `capacity` bytes at a time.
///
/// Each line is trimmed of its terminator and surrounding ASCII whitespace;
/// lines that are then empty are dropped silently. The queue is always closed
/// on return, whether input ended or a read failed, so downstream stages can
/// drain and finish. A read failure is returned to the caller and any partial
/// line read before it is discarded.
pub fn read_lines_with_capacity<R: Read>(
    input:    R,
    capacity: usize,
    tx:       Producer<Vec<u8>>,
    ctrs:     &Counters,
) -> io::Result<()> {
    let n_lines = ctrs.counter(N_LINES);
    let mut rdr = BufReader::with_capacity(capacity.max(1), input);
    let mut buf: Vec<u8> = Vec::new();
    let result = loop {
        buf.clear();
        match rdr.read_until(b'\n', &mut buf) {
            Ok(0) => break Ok(()), // EOF
            Ok(_) => {
                let line = buf.trim_ascii();
                if line.is_empty() {
                    continue;
                }
                n_lines.fetch_add(1, Ordering::Relaxed);
                // a closed queue means the consumer thread died; the driver reports that
                if tx.push(line.to_vec()).is_err() {
                    break Ok(());
                }
            }
            Err(e) => break Err(e),
        }
    };
    tx.close();
    result
}

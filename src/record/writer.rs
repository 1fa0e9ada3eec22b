//! Write MergedRecords to the output stream in the order they arrive.

// dependencies
use std::io::{self, BufWriter, Write};
use super::queue::Consumer;
use super::{MergedRecord, IO_CAPACITY};
use crate::workflow::Log;
use crate::workflow::file::Finish;

/// Write one record as `key<delimiter>values<newline>`.
pub fn write_record<W: Write>(
    wtr:       &mut W,
    record:    &MergedRecord,
    delimiter: u8,
) -> io::Result<()> {
    wtr.write_all(&record.key)?;
    wtr.write_all(&[delimiter])?;
    wtr.write_all(&record.values)?;
    wtr.write_all(b"\n")
}

/// Drain `rx` until it is closed, writing every record to `output`.
///
/// After the first write failure nothing more is written, but the queue is
/// still drained so that upstream stages never block on a dead writer.
/// Once the queue closes, `output` is finished, e.g., a gzip trailer is
/// written. The first failure, including one while finishing, is returned.
pub fn write_records<W: Finish>(
    rx:        &Consumer<MergedRecord>,
    output:    W,
    delimiter: u8,
    log:       &Log,
) -> io::Result<()> {
    let mut wtr = BufWriter::with_capacity(IO_CAPACITY, output);
    let mut failure: Option<io::Error> = None;
    while let Some(record) = rx.pop() {
        if failure.is_some() {
            continue;
        }
        if let Err(e) = write_record(&mut wtr, &record, delimiter) {
            log.print("output failed, discarding remaining merged records");
            failure = Some(e);
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }
    let mut output = wtr.into_inner().map_err(|e| e.into_error())?;
    output.finish()
}

//! RollupFanner merges the values of keyed, pre-sorted lines into one
//! deduplicated record per key, fanning the merge work out over a pool of
//! threads.
//!
//! # Usage Overview
//!
//! Create a new RollupFanner using `RollupFanner::new(n_workers, capacity)`, where:
//! - `n_workers` is the number of merge threads, typically the number of available cores
//! - `capacity` is the maximum number of items buffered in each queue between stages
//!
//! then call `run(input, output, &w)` with any byte reader, any finishable
//! byte writer (see `workflow::file::Finish`), and a Workflow whose counters
//! were created by `record::rollup_counters()`. A successful run returns a
//! RollupSummary of the final counts.
//!
//! Input lines are assumed to be:
//! - comma-delimited into a key and a value, unless `delimiter(b'<delimiter>')` is called
//! - grouped by key, i.e., all lines for a key are adjacent, e.g., after `sort -t , -k 1`
//!
//! Values may be lists of values joined by a NUL byte, unless another byte
//! is set with `sentinel(b'<sentinel>')`. Output values are joined the same way.
//!
//! # Pipeline
//!
//! ```text
//! reader --lines--> grouper --groups--> merge pool (n) --merged--> writer
//! ```
//!
//! The reader runs on the calling thread; the grouper, each merge worker, the
//! writer, and an optional progress reporter each run on a scoped thread.
//! Every queue is bounded, so a slow writer throttles the whole pipeline.
//!
//! Shutdown runs in one direction only. The reader closes the line queue at
//! end of input or on a read failure; the grouper then sends its last Group
//! and closes the group queue; each merge worker exits once that queue is
//! drained; when all workers have exited the output queue is closed; and the
//! writer returns after draining it. Records are written in an arbitrary order
//! relative to input.
//!
//! # Error Handling
//!
//! Malformed lines are logged and skipped. A read or write failure does not
//! stop the pipeline early: whatever was read is still merged and drained,
//! and the failure is returned as a RollupError. Panics in any stage are
//! re-raised after all threads have been joined.

// dependencies
use std::io::Read;
use std::panic;
use std::time::Duration;
use crossbeam::channel;
use crossbeam::sync::WaitGroup;
use crate::error::RollupError;
use crate::workflow::file::Finish;
use crate::workflow::{Progress, Workflow};
use super::grouper::group_lines;
use super::merger::merge_groups;
use super::queue::{self, Consumer};
use super::reader::read_lines;
use super::writer::write_records;
use super::{Group, MergedRecord, RollupSummary, DELIMITER, N_RECORDS_IN, N_RECORDS_OUT, SENTINEL};

/// Initialize a rollup pipeline.
#[derive(Debug, Clone)]
pub struct RollupFanner {
    n_workers: usize,
    capacity:  usize,
    delimiter: u8,
    sentinel:  u8,
    progress:  Option<Duration>,
}
impl RollupFanner {

    /* ------------------------------------------------------------------
    public initialization methods
    ------------------------------------------------------------------ */
    /// Create a new RollupFanner instance with default settings, where:
    /// - `n_workers` is the number of merge threads (at least one)
    /// - `capacity` is the maximum number of items buffered per queue (at least one)
    pub fn new(n_workers: usize, capacity: usize) -> RollupFanner {
        RollupFanner {
            n_workers: n_workers.max(1),
            capacity:  capacity.max(1),
            delimiter: DELIMITER,
            sentinel:  SENTINEL,
            progress:  None,
        }
    }

    /// Set the byte that separates keys from values if not a comma.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the byte that joins merged values if not NUL.
    pub fn sentinel(&mut self, sentinel: u8) -> &mut Self {
        self.sentinel = sentinel;
        self
    }

    /// Report throughput to STDERR at the given interval, or never if None.
    pub fn progress(&mut self, interval: Option<Duration>) -> &mut Self {
        self.progress = interval;
        self
    }

    /// Number of merge threads.
    pub fn n_workers(&self) -> usize {
        self.n_workers
    }

    /* ------------------------------------------------------------------
    public streaming methods
    ------------------------------------------------------------------ */
    /// Read keyed lines from `input`, merge each contiguous run of keys,
    /// and write the merged records to `output`, which is finished at the end.
    ///
    /// Returns only after every stage has finished, with a summary of the
    /// run's counters on success. On a read failure, records
    /// read before the failure are still merged and written, and the read
    /// error is returned. A write failure is returned likewise once the
    /// pipeline has drained. If both occur the read error is returned and the
    /// write error is logged.
    pub fn run<R, W>(
        &self,
        input:  R,
        output: W,
        w:      &Workflow,
    ) -> Result<RollupSummary, RollupError>
    where
        R: Read,
        W: Finish + Send,
    {
        // initialize queues
        let (line_tx,   line_rx)   = queue::bounded::<Vec<u8>>(self.capacity);
        let (group_tx,  group_rx)  = queue::bounded::<Group>(self.capacity);
        let (merged_tx, merged_rx) = queue::bounded::<MergedRecord>(self.capacity);
        let (quit_tx,   quit_rx)   = channel::bounded::<()>(1);
        let (delimiter, sentinel)  = (self.delimiter, self.sentinel);

        let (read_result, write_result) = crossbeam::scope(|scope| {

            // spawn progress reporter thread
            if let Some(interval) = self.progress {
                scope.spawn(move |_| {
                    Progress::new(&w.log, &w.ctrs, N_RECORDS_IN, N_RECORDS_OUT, interval)
                        .run(&quit_rx);
                });
            }

            // spawn output writer thread
            // consumers are moved into their threads so a dead stage unblocks its producer
            let writer = scope.spawn(move |_| {
                write_records(&merged_rx, output, delimiter, &w.log)
            });

            // spawn merge worker threads, counted down by a WaitGroup
            let pool = WaitGroup::new();
            for _ in 0..self.n_workers {
                let rx: Consumer<Group> = group_rx.clone();
                let tx = merged_tx.handle();
                let done = pool.clone();
                scope.spawn(move |_| {
                    merge_groups(&rx, tx, sentinel, &w.ctrs);
                    drop(done);
                });
            }
            drop(group_rx);

            // spawn key grouping thread
            scope.spawn(move |_| {
                group_lines(&line_rx, group_tx, delimiter, &w.ctrs, &w.log);
            });

            // read input lines in the calling thread; closes the line queue on return
            let read_result = read_lines(input, line_tx, &w.ctrs);

            // once every worker has exited, close the output queue and let the writer drain
            pool.wait();
            merged_tx.close();
            let write_result = writer.join().unwrap_or_else(|e| panic::resume_unwind(e));

            // the writer is done; stop reporting
            drop(quit_tx);
            (read_result, write_result)
        }).unwrap_or_else(|e| panic::resume_unwind(e));

        match (read_result, write_result) {
            (Ok(()), Ok(())) => Ok(RollupSummary::from_counters(&w.ctrs)),
            (Err(e), Ok(())) => Err(RollupError::Read(e)),
            (Ok(()), Err(e)) => Err(RollupError::Write(e)),
            (Err(read_e), Err(write_e)) => {
                w.log.print(&RollupError::Write(write_e).to_string());
                Err(RollupError::Read(read_e))
            }
        }
    }
}

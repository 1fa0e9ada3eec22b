//! Merge the values of a Group into one deduplicated MergedRecord.
//!
//! Values may themselves be sentinel-joined lists left by an earlier merge,
//! so every value is split on the sentinel before deduplication. Merging is
//! therefore idempotent: re-merging merged output yields the same value set.

// dependencies
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use super::queue::{Consumer, Producer};
use super::{Group, MergedRecord, N_RECORDS_OUT};
use crate::workflow::Counters;

/// Deduplicate the values of one Group by exact byte match.
/// Empty sub-values are kept like any other value.
/// The order of values in the result is unspecified.
pub fn merge_group(group: Group, sentinel: u8) -> MergedRecord {
    let Group { key, values } = group;
    let unique: HashSet<&[u8]> = values
        .iter()
        .flat_map(|value| value.split(move |&b| b == sentinel))
        .collect();
    let len = unique.iter().map(|v| v.len() + 1).sum::<usize>();
    let mut joined: Vec<u8> = Vec::with_capacity(len);
    for (i, value) in unique.into_iter().enumerate() {
        if i > 0 {
            joined.push(sentinel);
        }
        joined.extend_from_slice(value);
    }
    MergedRecord { key, values: joined }
}

/// Run one merge worker: consume Groups from the shared queue `rx` until it
/// is closed and drained, sending one MergedRecord per Group to `tx`.
pub fn merge_groups(
    rx:       &Consumer<Group>,
    tx:       Producer<MergedRecord>,
    sentinel: u8,
    ctrs:     &Counters,
) {
    let n_out = ctrs.counter(N_RECORDS_OUT);
    while let Some(group) = rx.pop() {
        let merged = merge_group(group, sentinel);
        n_out.fetch_add(1, Ordering::Relaxed);
        if tx.push(merged).is_err() {
            break; // the writer is gone
        }
    }
}

//! Collect contiguous runs of same-key records into Groups.
//!
//! Grouping is strictly sequential: exactly one Group is open at a time and
//! it is closed, and sent on, as soon as a different key arrives. Input is
//! therefore expected to be sorted, or at least clustered, by key. A key that
//! reappears after its run has closed starts a new, separate Group.

// dependencies
use std::sync::atomic::Ordering;
use super::queue::{Consumer, Producer};
use super::{split_record, Group, N_GROUPS, N_INVALID, N_RECORDS_IN};
use crate::workflow::{Counters, Log};

/// Consume lines from `rx` until it closes, sending each completed Group to `tx`.
///
/// Malformed lines are logged, counted as invalid, and otherwise ignored;
/// they neither open nor close a Group. The final open Group is sent when
/// input ends, after which `tx` is closed.
pub fn group_lines(
    rx:        &Consumer<Vec<u8>>,
    tx:        Producer<Group>,
    delimiter: u8,
    ctrs:      &Counters,
    log:       &Log,
) {
    let n_records = ctrs.counter(N_RECORDS_IN);
    let n_invalid = ctrs.counter(N_INVALID);
    let n_groups  = ctrs.counter(N_GROUPS);
    let emit = |group: Group| -> bool {
        n_groups.fetch_add(1, Ordering::Relaxed);
        tx.push(group).is_ok()
    };
    let mut open: Option<Group> = None;
    for line in rx.iter() {
        let Some((key, value)) = split_record(&line, delimiter) else {
            log.invalid_line(&line);
            n_invalid.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        n_records.fetch_add(1, Ordering::Relaxed);
        if let Some(closed) = open.take_if(|group| group.key.as_slice() != key) {
            if !emit(closed) {
                break; // every merge worker is gone
            }
        }
        open.get_or_insert_with(|| Group::new(key))
            .values
            .push(value.to_vec());
    }
    if let Some(last) = open.filter(|group| !group.values.is_empty()) {
        emit(last);
    }
    tx.close();
}

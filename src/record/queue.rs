//! Closeable bounded queues that connect the stages of a rollup pipeline.
//!
//! Each queue has exactly one closer: the Producer returned by `bounded()`.
//! Additional producer handles may be made for a worker pool, but the queue
//! only closes once the closer has called `close()` and every handle has been
//! dropped. Consumers see the closed state as `pop()` returning None after the
//! queue has drained.
//!
//! Pushing to a full queue blocks, which throttles fast producers to the speed
//! of the slowest downstream stage.

// dependencies
use crossbeam::channel::{self, Receiver, Sender};

/// Create a closeable queue that holds at most `capacity` items (minimum 1).
pub fn bounded<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = channel::bounded(capacity.max(1));
    (Producer { tx }, Consumer { rx })
}

/// The sending side of a queue.
#[derive(Debug)]
pub struct Producer<T> {
    tx: Sender<T>,
}
impl<T> Producer<T> {
    /// Push an item, blocking while the queue is full.
    /// Returns the item if every consumer has gone away.
    pub fn push(&self, item: T) -> Result<(), T> {
        self.tx.send(item).map_err(|e| e.into_inner())
    }

    /// Make an additional sending handle, e.g., for one worker of a pool.
    /// A handle holds the queue open until it is dropped.
    pub fn handle(&self) -> Producer<T> {
        Producer { tx: self.tx.clone() }
    }

    /// Close the queue; consumers drain what remains and then see it closed.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// The receiving side of a queue. Clones share one queue, so each item
/// is delivered to exactly one consumer.
#[derive(Debug)]
pub struct Consumer<T> {
    rx: Receiver<T>,
}
impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Consumer { rx: self.rx.clone() }
    }
}
impl<T> Consumer<T> {
    /// Pop the next item, blocking while the queue is empty and open.
    /// Returns None once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Iterate over items until the queue is closed and drained.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.rx.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn close_lets_consumers_drain() {
        let (tx, rx) = bounded(4);
        tx.push(1).unwrap();
        tx.push(2).unwrap();
        tx.close();
        assert_eq!(rx.pop(), Some(1));
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn handles_keep_queue_open() {
        let (tx, rx) = bounded(4);
        let handle = tx.handle();
        tx.close();
        handle.push(7).unwrap();
        drop(handle);
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn push_fails_without_consumers() {
        let (tx, rx) = bounded(1);
        drop(rx);
        assert_eq!(tx.push(3), Err(3));
    }

    #[test]
    fn full_queue_blocks_producer() {
        let (tx, rx) = bounded(1);
        let pushed = AtomicUsize::new(0);
        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..3 {
                    tx.push(i).unwrap();
                    pushed.fetch_add(1, Ordering::SeqCst);
                }
            });
            thread::sleep(Duration::from_millis(20));
            // producer is stalled behind one queued item
            assert_eq!(pushed.load(Ordering::SeqCst), 1);
            assert_eq!((0..3).map(|_| rx.pop()).collect::<Vec<_>>(), vec![Some(0), Some(1), Some(2)]);
        });
    }

    #[test]
    fn each_item_goes_to_one_consumer() {
        let (tx, rx) = bounded(8);
        let total: usize = thread::scope(|s| {
            let workers: Vec<_> = (0..4).map(|_| {
                let rx = rx.clone();
                s.spawn(move || rx.iter().sum::<usize>())
            }).collect();
            for i in 1..=100 {
                tx.push(i).unwrap();
            }
            tx.close();
            workers.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(total, 5050);
    }
}

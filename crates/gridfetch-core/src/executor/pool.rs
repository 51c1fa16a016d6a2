//! Fixed-size worker pool draining a shared queue.
//!
//! Workers pop from the front of the queue until it is empty or shutdown is
//! requested; results are handed to the caller in completion order.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};

use crate::control::ShutdownToken;

/// Runs `work` over `items` on up to `workers` threads. `on_done` is called on
/// the calling thread for every finished item, first finished first. Returns
/// the items never dispatched because shutdown was requested.
pub(super) fn run_pool<T, O, W, D>(
    items: Vec<T>,
    workers: usize,
    shutdown: &ShutdownToken,
    work: W,
    mut on_done: D,
) -> Vec<T>
where
    T: Send,
    O: Send,
    W: Fn(T) -> O + Sync,
    D: FnMut(O),
{
    let count = items.len();
    if count == 0 {
        return Vec::new();
    }
    let queue: Mutex<VecDeque<T>> = Mutex::new(items.into());
    let num_workers = workers.max(1).min(count);
    let (tx, rx) = mpsc::channel::<O>();

    std::thread::scope(|scope| {
        for _ in 0..num_workers {
            let tx = tx.clone();
            let queue = &queue;
            let work = &work;
            scope.spawn(move || loop {
                if shutdown.is_requested() {
                    break;
                }
                let next = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(item) = next else {
                    break;
                };
                if tx.send(work(item)).is_err() {
                    break;
                }
            });
        }
        drop(tx);
        for out in rx {
            on_done(out);
        }
    });

    queue
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .into()
}

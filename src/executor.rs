//! Bounded parallel map with per-item failure isolation.
//!
//! [`WorkerPool::map`] applies one function to every item and returns one
//! [`ItemOutcome`] per item. An item that fails, panics or overruns its
//! deadline only affects its own outcome; siblings keep running.
//!
//! With more than one worker the items are submitted eagerly to a rayon pool
//! of exactly that many threads and outcomes come back in completion order.
//! With one worker everything runs on the caller's thread in input order.
//!
//! The per-item timeout is a deadline checked when the item finishes: work
//! already in flight is not pre-empted, but an overrun item is reported as
//! [`ItemError::TimedOut`] and its value discarded. Engines that talk to
//! external processes or services should enforce their own hard limit too.

use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ItemError<E> {
    #[error("{0}")]
    Failed(E),
    #[error("exceeded per-item timeout of {0:?}")]
    TimedOut(Duration),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

#[derive(Debug)]
pub struct ItemOutcome<I, T, E> {
    pub item: I,
    pub result: Result<T, ItemError<E>>,
    pub elapsed: Duration,
}

impl<I, T, E> ItemOutcome<I, T, E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    item_timeout: Option<Duration>,
}

impl WorkerPool {
    /// A worker count below one is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            item_timeout: None,
        }
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn with_item_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.item_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout
    }

    pub fn map<I, T, E, F>(&self, items: Vec<I>, f: F) -> Vec<ItemOutcome<I, T, E>>
    where
        I: Send,
        T: Send,
        E: Send,
        F: Fn(&I) -> Result<T, E> + Sync,
    {
        if self.workers == 1 || items.len() <= 1 {
            return self.map_sequential(items, &f);
        }

        let threads = self.workers.min(items.len());
        let pool = match ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("paku-worker-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                warn!("worker pool unavailable ({err}); running sequentially");
                return self.map_sequential(items, &f);
            }
        };
        debug!("worker pool threads={threads} items={}", items.len());

        let mut outcomes = Vec::with_capacity(items.len());
        let (tx, rx) = mpsc::channel();
        let f = &f;
        std::thread::scope(|s| {
            s.spawn(move || {
                pool.scope(move |ps| {
                    for item in items {
                        let tx = tx.clone();
                        ps.spawn(move |_| {
                            // The receiver lives until every sender is gone.
                            let _ = tx.send(self.run_one(item, f));
                        });
                    }
                });
            });
            for outcome in rx {
                outcomes.push(outcome);
            }
        });
        outcomes
    }

    fn map_sequential<I, T, E, F>(&self, items: Vec<I>, f: &F) -> Vec<ItemOutcome<I, T, E>>
    where
        F: Fn(&I) -> Result<T, E>,
    {
        items.into_iter().map(|item| self.run_one(item, f)).collect()
    }

    fn run_one<I, T, E, F>(&self, item: I, f: &F) -> ItemOutcome<I, T, E>
    where
        F: Fn(&I) -> Result<T, E>,
    {
        let start = Instant::now();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| f(&item))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ItemError::Failed(err)),
            Err(payload) => Err(ItemError::Panicked(panic_message(payload.as_ref()))),
        };
        let elapsed = start.elapsed();
        let result = match (result, self.item_timeout) {
            (Ok(_), Some(limit)) if elapsed > limit => Err(ItemError::TimedOut(limit)),
            (result, _) => result,
        };
        ItemOutcome {
            item,
            result,
            elapsed,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

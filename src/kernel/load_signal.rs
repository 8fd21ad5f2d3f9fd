use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Wakes the admission loop when something it waits on may have changed:
/// dispatcher load dropped, the dispatcher started, or a job was submitted.
///
/// A generation counter makes wakeups sticky: a waiter that read generation
/// `g` before checking its condition returns immediately if anything
/// notified in between.
#[derive(Debug, Default)]
pub struct LoadSignal {
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl LoadSignal {
    pub fn new() -> LoadSignal {
        LoadSignal::default()
    }

    pub fn generation(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notify(&self) {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation = generation.wrapping_add(1);
        self.condvar.notify_all();
    }

    /// Blocks until the generation moves past `seen` or `timeout` elapses.
    /// Returns `true` if notified.
    pub fn wait_past(&self, seen: u64, timeout: Duration) -> bool {
        let guard = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .condvar
            .wait_timeout_while(guard, timeout, |generation| *generation == seen)
            .unwrap_or_else(PoisonError::into_inner);
        *guard != seen
    }
}

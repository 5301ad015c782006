//! A flag that keeps the light state poll quiet while a light command is in flight.
//!
//! This is a plain flag, not a lock. A poll that has already checked the flag when a command
//! starts still reports the light state it fetches, which may be stale by the time it is written.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag blocking the light state poll. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct LightSwitchGuard {
    blocked: Arc<AtomicBool>,
}

impl LightSwitchGuard {
    /// Returns a new, unblocked guard.
    pub fn new() -> Self {
        LightSwitchGuard::default()
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Blocks the guard until the returned handle is dropped.
    ///
    /// The guard is released even if the holder returns early, panics, or is cancelled.
    pub fn block(&self) -> Blocked<'_> {
        self.set_blocked(true);
        Blocked {
            guard: self,
        }
    }
}

/// Keeps a [`LightSwitchGuard`] blocked while it is alive.
#[must_use = "the guard is released as soon as this is dropped"]
pub struct Blocked<'a> {
    guard: &'a LightSwitchGuard,
}

impl Drop for Blocked<'_> {
    fn drop(&mut self) {
        self.guard.set_blocked(false);
    }
}

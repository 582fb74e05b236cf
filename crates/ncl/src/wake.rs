// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wake notification primitive behind [`crate::WaitSet::wait`].
//!
//! Two tiers: an atomic flag for the lock-free fast path and a condvar for
//! blocked sleepers. Producers (condition trigger paths) only touch the
//! condvar when at least one waiter is actually asleep.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait implemented by wake signals handed to conditions.
///
/// Conditions retain a weak reference to these handles and call `signal()`
/// when their trigger value flips to `true`. The identifier lets a condition
/// drop the right hook when a wait-set detaches.
pub trait WaitsetSignal: Send + Sync {
    /// Notify the wait-set that the associated condition became active.
    fn signal(&self);

    /// Stable identifier for this signal (per registration).
    fn id(&self) -> u64;
}

/// Coalescing wake notifier.
///
/// Any number of `notify()` calls between two waits collapse into a single
/// wakeup; the waiter rechecks its conditions after every wake.
#[derive(Debug)]
pub struct WakeNotifier {
    /// Pending-wake flag for the lock-free fast path.
    pending: AtomicBool,
    /// Number of threads currently asleep on the condvar.
    sleepers: Mutex<usize>,
    condvar: Condvar,
}

impl WakeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            sleepers: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    /// Post a wake. Lock-free unless a waiter is asleep.
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);

        // Racy check is fine: a waiter that races past it re-reads `pending`
        // under the lock before sleeping.
        if *self.sleepers.lock() > 0 {
            self.condvar.notify_all();
        }
    }

    /// Consume a pending wake without blocking.
    pub fn check_and_clear(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }

    /// Peek at the pending flag without consuming it.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Block until a wake is posted or `timeout` elapses.
    ///
    /// `None` blocks indefinitely. Returns `true` when a wake was consumed,
    /// `false` on timeout.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        if self.pending.swap(false, Ordering::Acquire) {
            return true;
        }

        // Absurd timeouts that overflow Instant arithmetic block forever.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        let mut sleepers = self.sleepers.lock();
        if self.pending.swap(false, Ordering::Acquire) {
            return true;
        }

        *sleepers += 1;
        let woken = loop {
            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut sleepers, deadline).timed_out() {
                        break self.pending.swap(false, Ordering::Acquire);
                    }
                }
                None => self.condvar.wait(&mut sleepers),
            }

            if self.pending.swap(false, Ordering::Acquire) {
                break true;
            }
        };
        *sleepers -= 1;

        woken
    }

    /// Create a shared notifier wrapped in `Arc`.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for WakeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fast_path_roundtrip() {
        let notifier = WakeNotifier::new();

        assert!(!notifier.is_ready());
        notifier.notify();
        assert!(notifier.is_ready());
        assert!(notifier.check_and_clear());
        assert!(!notifier.is_ready());
    }

    #[test]
    fn notify_wakes_blocked_waiter() {
        let notifier = WakeNotifier::shared();
        let n = Arc::clone(&notifier);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            n.notify();
        });

        let start = Instant::now();
        let woken = notifier.wait(Some(Duration::from_millis(500)));

        assert!(woken, "should be woken by notify");
        assert!(start.elapsed() < Duration::from_millis(400));

        handle.join().unwrap();
    }

    #[test]
    fn wait_times_out() {
        let notifier = WakeNotifier::new();

        let start = Instant::now();
        let woken = notifier.wait(Some(Duration::from_millis(20)));

        assert!(!woken, "no notify posted");
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn pending_wake_returns_immediately() {
        let notifier = WakeNotifier::new();
        notifier.notify();

        let start = Instant::now();
        assert!(notifier.wait(Some(Duration::from_millis(500))));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn indefinite_wait_wakes() {
        let notifier = WakeNotifier::shared();
        let n = Arc::clone(&notifier);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            n.notify();
        });

        assert!(notifier.wait(None));
        handle.join().unwrap();
    }

    #[test]
    fn notifies_coalesce() {
        let notifier = WakeNotifier::new();

        notifier.notify();
        notifier.notify();
        notifier.notify();

        assert!(notifier.check_and_clear());
        assert!(!notifier.check_and_clear(), "wakes must coalesce");
    }
}

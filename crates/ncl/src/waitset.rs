// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet - blocking wait for condition triggers.
//!
//! Conditions register a wake signal when attached so a trigger flip wakes
//! blocked waiters immediately. Wait-sets carry a stable identity; the
//! context keys its per-wait-set interrupt guards on it.

use crate::condition::{Condition, GuardCondition};
use crate::wake::{WaitsetSignal, WakeNotifier};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

/// Stable identity of a wait-set (per-process, never reused).
pub type WaitSetId = u64;

/// Maximum number of conditions attachable to one wait-set.
pub const WAITSET_MAX_CONDITIONS: usize = 2048;

/// Wake signal handed to attached conditions.
///
/// Owned by the wait-set entry; conditions hold it weakly, so a detached or
/// dropped wait-set stops receiving wakes without further coordination.
struct SignalHandle {
    id: u64,
    notifier: Weak<WakeNotifier>,
}

impl WaitsetSignal for SignalHandle {
    fn signal(&self) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.notify();
        }
    }

    fn id(&self) -> u64 {
        self.id
    }
}

struct ConditionEntry {
    condition: Arc<dyn Condition>,
    signal: Arc<SignalHandle>,
}

/// WaitSet - wait for multiple conditions.
///
/// Blocks until at least one attached [`Condition`] has
/// `trigger_value == true`. Backed by a coalescing condvar notifier.
pub struct WaitSet {
    id: WaitSetId,
    notifier: Arc<WakeNotifier>,
    /// Attached conditions keyed by condition id.
    entries: Mutex<HashMap<u64, ConditionEntry>>,
}

impl WaitSet {
    /// Create a new wait-set.
    #[must_use]
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            notifier: WakeNotifier::shared(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stable identity of this wait-set.
    #[must_use]
    pub fn id(&self) -> WaitSetId {
        self.id
    }

    /// Attach a condition to this wait-set.
    ///
    /// Duplicate attachments are rejected with [`Error::Config`].
    pub fn attach_condition(&self, condition: Arc<dyn Condition>) -> Result<()> {
        let condition_id = condition.condition_id();

        let signal = {
            let mut entries = self.lock_entries();

            if entries.contains_key(&condition_id) {
                return Err(Error::Config);
            }
            if entries.len() >= WAITSET_MAX_CONDITIONS {
                return Err(Error::ResourceLimitExceeded(format!(
                    "wait-set {} condition slots",
                    self.id
                )));
            }

            static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(1);
            let signal = Arc::new(SignalHandle {
                id: NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed),
                notifier: Arc::downgrade(&self.notifier),
            });

            entries.insert(
                condition_id,
                ConditionEntry {
                    condition: Arc::clone(&condition),
                    signal: Arc::clone(&signal),
                },
            );

            signal
        };

        // Registered outside the entries lock; an already-true trigger
        // signals immediately from inside add_waitset_signal.
        condition.add_waitset_signal(signal);

        Ok(())
    }

    /// Attach a guard condition (used for interrupt and custom events).
    pub fn attach_guard(&self, guard: &Arc<GuardCondition>) -> Result<()> {
        self.attach_condition(Arc::clone(guard) as Arc<dyn Condition>)
    }

    /// Detach a condition from this wait-set.
    ///
    /// Unknown conditions are rejected with [`Error::Config`].
    pub fn detach_condition(&self, condition: &Arc<dyn Condition>) -> Result<()> {
        let condition_id = condition.condition_id();

        let entry = {
            let mut entries = self.lock_entries();
            entries.remove(&condition_id).ok_or(Error::Config)?
        };

        entry.condition.remove_waitset_signal(entry.signal.id);
        Ok(())
    }

    /// Detach a guard condition.
    pub fn detach_guard(&self, guard: &Arc<GuardCondition>) -> Result<()> {
        self.detach_condition(&(Arc::clone(guard) as Arc<dyn Condition>))
    }

    /// All currently attached conditions.
    #[must_use]
    pub fn get_conditions(&self) -> Vec<Arc<dyn Condition>> {
        self.lock_entries()
            .values()
            .map(|entry| Arc::clone(&entry.condition))
            .collect()
    }

    /// Wait until at least one attached condition is triggered.
    ///
    /// `None` blocks indefinitely; an elapsed timeout surfaces as
    /// [`Error::WouldBlock`].
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Vec<Arc<dyn Condition>>> {
        log::debug!("[waitset] wait id={} timeout={:?}", self.id, timeout);

        let triggered = self.collect_triggered();
        if !triggered.is_empty() {
            return Ok(triggered);
        }

        let start = timeout.map(|_| Instant::now());

        loop {
            let remaining = match (timeout, start) {
                (Some(total), Some(begin)) => {
                    let elapsed = begin.elapsed();
                    if elapsed >= total {
                        return Err(Error::WouldBlock);
                    }
                    Some(total.saturating_sub(elapsed))
                }
                _ => None,
            };

            self.notifier.wait(remaining);

            let triggered = self.collect_triggered();
            if !triggered.is_empty() {
                log::debug!(
                    "[waitset] wait id={} returning triggered_len={}",
                    self.id,
                    triggered.len()
                );
                return Ok(triggered);
            }
            // Woken without an active trigger (manual notify or a trigger
            // consumed elsewhere): keep waiting out the remaining budget.
        }
    }

    /// Wake a blocked `wait()` without triggering any condition.
    pub fn notify(&self) {
        self.notifier.notify();
    }

    fn collect_triggered(&self) -> Vec<Arc<dyn Condition>> {
        self.lock_entries()
            .values()
            .filter(|entry| entry.condition.get_trigger_value())
            .map(|entry| Arc::clone(&entry.condition))
            .collect()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<u64, ConditionEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::debug!("[waitset] entries mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WaitSet {
    fn drop(&mut self) {
        let entries = std::mem::take(&mut *self.lock_entries());
        for entry in entries.into_values() {
            entry.condition.remove_waitset_signal(entry.signal.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn new_waitset_is_empty() {
        let ws = WaitSet::new();
        assert_eq!(ws.get_conditions().len(), 0);
    }

    #[test]
    fn waitset_ids_are_unique() {
        let a = WaitSet::new();
        let b = WaitSet::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn attach_condition() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        assert!(ws.attach_guard(&guard).is_ok());
        assert_eq!(ws.get_conditions().len(), 1);
    }

    #[test]
    fn attach_duplicate_is_rejected() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        assert!(ws.attach_guard(&guard).is_ok());
        assert!(matches!(ws.attach_guard(&guard), Err(Error::Config)));
    }

    #[test]
    fn detach_condition() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        ws.attach_guard(&guard).expect("attach should succeed");
        assert!(ws.detach_guard(&guard).is_ok());
        assert_eq!(ws.get_conditions().len(), 0);
    }

    #[test]
    fn attach_beyond_capacity_is_rejected() {
        let ws = WaitSet::new();
        for _ in 0..WAITSET_MAX_CONDITIONS {
            let guard = Arc::new(GuardCondition::new());
            ws.attach_guard(&guard).expect("attach within capacity");
        }

        let overflow = Arc::new(GuardCondition::new());
        assert!(matches!(
            ws.attach_guard(&overflow),
            Err(Error::ResourceLimitExceeded(_))
        ));
    }

    #[test]
    fn detach_not_attached_is_rejected() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        assert!(matches!(ws.detach_guard(&guard), Err(Error::Config)));
    }

    #[test]
    fn wait_returns_immediately_on_pre_trigger() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        guard.trigger();
        ws.attach_guard(&guard).expect("attach should succeed");

        let triggered = ws
            .wait(Some(Duration::from_millis(100)))
            .expect("wait should succeed");
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].condition_id(), guard.condition_id());
    }

    #[test]
    fn wait_times_out() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        ws.attach_guard(&guard).expect("attach should succeed");

        let start = Instant::now();
        let result = ws.wait(Some(Duration::from_millis(100)));
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(Error::WouldBlock)));
        assert!(elapsed >= Duration::from_millis(80));
    }

    #[test]
    fn wait_wakes_on_async_trigger() {
        let ws = Arc::new(WaitSet::new());
        let guard = Arc::new(GuardCondition::new());

        ws.attach_guard(&guard).expect("attach should succeed");

        let guard_clone = Arc::clone(&guard);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            guard_clone.trigger();
        });

        let start = Instant::now();
        let triggered = ws
            .wait(Some(Duration::from_secs(1)))
            .expect("wait should succeed");
        let elapsed = start.elapsed();

        assert_eq!(triggered.len(), 1);
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(900));
    }

    #[test]
    fn wait_reports_only_triggered_conditions() {
        let ws = WaitSet::new();
        let quiet = Arc::new(GuardCondition::new());
        let loud = Arc::new(GuardCondition::new());

        ws.attach_guard(&quiet).expect("attach quiet");
        ws.attach_guard(&loud).expect("attach loud");

        loud.trigger();

        let triggered = ws
            .wait(Some(Duration::from_millis(100)))
            .expect("wait should succeed");
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].condition_id(), loud.condition_id());
    }

    #[test]
    fn manual_notify_does_not_end_wait() {
        let ws = Arc::new(WaitSet::new());
        let guard = Arc::new(GuardCondition::new());
        ws.attach_guard(&guard).expect("attach should succeed");

        let ws_clone = Arc::clone(&ws);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            ws_clone.notify();
        });

        // The bare notify carries no trigger; the wait must run out its
        // budget and time out.
        let result = ws.wait(Some(Duration::from_millis(100)));
        assert!(matches!(result, Err(Error::WouldBlock)));
    }

    #[test]
    fn detached_condition_no_longer_wakes() {
        let ws = WaitSet::new();
        let guard = Arc::new(GuardCondition::new());

        ws.attach_guard(&guard).expect("attach should succeed");
        ws.detach_guard(&guard).expect("detach should succeed");

        guard.trigger();

        let result = ws.wait(Some(Duration::from_millis(50)));
        assert!(matches!(result, Err(Error::WouldBlock)));
    }
}

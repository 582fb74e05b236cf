// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conditions - boolean predicates that wake blocked wait-sets.
//!
//! A condition carries a trigger value. Wait-sets register a wake signal on
//! attach so a trigger flip wakes blocked waiters immediately instead of
//! being observed on the next poll.

use crate::wake::WaitsetSignal;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Base interface for conditions attachable to wait-sets.
pub trait Condition: Send + Sync {
    /// Current trigger value of this condition.
    fn get_trigger_value(&self) -> bool;

    /// Stable identifier for this condition (registry key, dedup).
    fn condition_id(&self) -> u64;

    /// Register a wait-set signal so this condition can wake blocked waiters.
    fn add_waitset_signal(&self, signal: Arc<dyn WaitsetSignal>);

    /// Remove a previously registered wait-set signal.
    fn remove_waitset_signal(&self, signal_id: u64);

    /// Downcast support for registry introspection.
    fn as_any(&self) -> &dyn Any;
}

struct WaitsetHook {
    id: u64,
    signal: Weak<dyn WaitsetSignal>,
}

/// Manually-triggered condition.
///
/// The trigger value is entirely under application control. The context uses
/// one of these per wait-set to interrupt blocking waits on shutdown.
pub struct GuardCondition {
    id: u64,
    trigger_value: AtomicBool,
    /// Wait-set hooks to notify when the trigger value flips true.
    waitset_signals: Mutex<Vec<WaitsetHook>>,
}

impl GuardCondition {
    /// Create a new guard condition with `trigger_value = false`.
    #[must_use]
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        Self {
            id,
            trigger_value: AtomicBool::new(false),
            waitset_signals: Mutex::new(Vec::new()),
        }
    }

    /// Set the trigger value.
    ///
    /// Flipping it to `true` wakes every wait-set currently waiting on this
    /// condition.
    pub fn set_trigger_value(&self, value: bool) {
        self.trigger_value.store(value, Ordering::Release);
        if value {
            self.notify_waitsets();
        }
    }

    /// Shorthand for `set_trigger_value(true)`.
    pub fn trigger(&self) {
        self.set_trigger_value(true);
    }

    fn notify_waitsets(&self) {
        let mut hooks = match self.waitset_signals.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::debug!("[condition] guard waitset_signals poisoned, recovering");
                poisoned.into_inner()
            }
        };

        hooks.retain(|hook| {
            if let Some(signal) = hook.signal.upgrade() {
                signal.signal();
                true
            } else {
                false
            }
        });
    }
}

impl Condition for GuardCondition {
    fn get_trigger_value(&self) -> bool {
        self.trigger_value.load(Ordering::Acquire)
    }

    fn condition_id(&self) -> u64 {
        self.id
    }

    fn add_waitset_signal(&self, signal: Arc<dyn WaitsetSignal>) {
        let mut hooks = match self.waitset_signals.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::debug!("[condition] guard waitset_signals poisoned, recovering");
                poisoned.into_inner()
            }
        };

        hooks.retain(|hook| hook.signal.upgrade().is_some());
        hooks.push(WaitsetHook {
            id: signal.id(),
            signal: Arc::downgrade(&signal),
        });

        // A signal attached after the trigger flipped must not miss the wake.
        if self.get_trigger_value() {
            signal.signal();
        }
    }

    fn remove_waitset_signal(&self, signal_id: u64) {
        if let Ok(mut hooks) = self.waitset_signals.lock() {
            hooks.retain(|hook| hook.id != signal_id);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Default for GuardCondition {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

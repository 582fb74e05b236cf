// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use std::sync::atomic::AtomicUsize;

struct CountingSignal {
    id: u64,
    wakes: AtomicUsize,
}

impl CountingSignal {
    fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            wakes: AtomicUsize::new(0),
        })
    }

    fn wakes(&self) -> usize {
        self.wakes.load(Ordering::Acquire)
    }
}

impl WaitsetSignal for CountingSignal {
    fn signal(&self) {
        self.wakes.fetch_add(1, Ordering::AcqRel);
    }

    fn id(&self) -> u64 {
        self.id
    }
}

#[test]
fn guard_starts_untriggered() {
    let guard = GuardCondition::new();
    assert!(!guard.get_trigger_value());
}

#[test]
fn guard_ids_are_unique() {
    let a = GuardCondition::new();
    let b = GuardCondition::new();
    assert_ne!(a.condition_id(), b.condition_id());
}

#[test]
fn trigger_flips_value_and_signals() {
    let guard = GuardCondition::new();
    let signal = CountingSignal::new(7);
    guard.add_waitset_signal(Arc::clone(&signal) as Arc<dyn WaitsetSignal>);

    guard.trigger();

    assert!(guard.get_trigger_value());
    assert_eq!(signal.wakes(), 1);
}

#[test]
fn resetting_trigger_does_not_signal() {
    let guard = GuardCondition::new();
    let signal = CountingSignal::new(8);
    guard.add_waitset_signal(Arc::clone(&signal) as Arc<dyn WaitsetSignal>);

    guard.set_trigger_value(false);
    assert_eq!(signal.wakes(), 0);
}

#[test]
fn signal_attached_after_trigger_fires_immediately() {
    let guard = GuardCondition::new();
    guard.trigger();

    let signal = CountingSignal::new(9);
    guard.add_waitset_signal(Arc::clone(&signal) as Arc<dyn WaitsetSignal>);

    assert_eq!(signal.wakes(), 1, "late attach must not miss the wake");
}

#[test]
fn removed_signal_is_not_notified() {
    let guard = GuardCondition::new();
    let signal = CountingSignal::new(10);
    guard.add_waitset_signal(Arc::clone(&signal) as Arc<dyn WaitsetSignal>);
    guard.remove_waitset_signal(10);

    guard.trigger();
    assert_eq!(signal.wakes(), 0);
}

#[test]
fn dead_hooks_are_pruned_on_trigger() {
    let guard = GuardCondition::new();
    {
        let signal = CountingSignal::new(11);
        guard.add_waitset_signal(Arc::clone(&signal) as Arc<dyn WaitsetSignal>);
        // Arc dropped here; only the weak hook remains.
    }

    // Must not panic and must not keep dead hooks around.
    guard.trigger();

    let live = CountingSignal::new(12);
    guard.add_waitset_signal(Arc::clone(&live) as Arc<dyn WaitsetSignal>);
    assert_eq!(live.wakes(), 1, "already triggered, fires on attach");
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client context - init/shutdown lifecycle and wait-set interrupt plumbing.
//!
//! A [`Context`] wraps one [`SessionHandle`] and owns the guard conditions
//! used to interrupt blocking waits. `ok` / `shutdown` / `try_shutdown` are
//! serialized by a lifecycle mutex; the interrupt-guard registry has its own
//! lock so guard bookkeeping never contends with lifecycle queries.
//!
//! Contexts are not reusable: once shut down they stay invalid, and they are
//! finalized on drop.

use crate::condition::GuardCondition;
use crate::config::EnvConfig;
use crate::session::SessionHandle;
use crate::waitset::{WaitSet, WaitSetId};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Builder for [`Context`].
pub struct ContextBuilder {
    name: String,
    domain_id: u32,
}

impl ContextBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            domain_id: 0,
        }
    }

    /// Domain id to create the session in (0-232, default 0).
    #[must_use]
    pub fn domain_id(mut self, domain_id: u32) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Create the context.
    pub fn build(self) -> Result<Context> {
        let handle = SessionHandle::create(&self.name, self.domain_id)?;

        Ok(Context {
            handle,
            lifecycle: Mutex::new(()),
            interrupt_guards: Mutex::new(HashMap::new()),
        })
    }
}

/// Lifecycle handle for the middleware's init/shutdown state.
///
/// Multiple threads may share one context; all methods take `&self`.
pub struct Context {
    handle: Arc<SessionHandle>,
    /// Serializes `ok` / `shutdown` / `try_shutdown`.
    lifecycle: Mutex<()>,
    /// One interrupt guard per wait-set identity, created lazily.
    interrupt_guards: Mutex<HashMap<WaitSetId, Arc<GuardCondition>>>,
}

impl Context {
    /// Start building a context with the given session name.
    #[must_use]
    pub fn builder(name: &str) -> ContextBuilder {
        ContextBuilder::new(name)
    }

    /// Convenience constructor reading [`EnvConfig`] for domain id and
    /// session-name overrides.
    pub fn from_env(name: &str) -> Result<Self> {
        let config = EnvConfig::from_env();
        if config.is_custom() {
            log::info!(
                "[context] environment config: domain_id={} log_level={}",
                config.domain_id,
                config.log_level
            );
        }

        let name = config.session_name.as_deref().unwrap_or(name);
        Self::builder(name).domain_id(config.domain_id).build()
    }

    /// The underlying session handle (shared ownership).
    #[must_use]
    pub fn handle(&self) -> Arc<SessionHandle> {
        Arc::clone(&self.handle)
    }

    /// Session name supplied at creation.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Domain id this context was created in.
    #[must_use]
    pub fn domain_id(&self) -> u32 {
        self.handle.domain_id()
    }

    /// Whether the context is still valid.
    #[must_use]
    pub fn ok(&self) -> bool {
        let _lifecycle = self.lock_lifecycle();
        self.handle.is_valid()
    }

    /// Invalidate the context and interrupt all registered wait-sets.
    ///
    /// Shutting down an already-invalid context is
    /// [`Error::InvalidState`]; use [`Context::try_shutdown`] when racing
    /// other shutdown paths.
    pub fn shutdown(&self) -> Result<()> {
        let _lifecycle = self.lock_lifecycle();

        if !self.handle.invalidate() {
            return Err(Error::InvalidState(format!(
                "context {} already shut down",
                self.handle.id()
            )));
        }

        self.interrupt_wait_sets();
        Ok(())
    }

    /// Shut down only if currently valid (check-then-act under the
    /// lifecycle lock).
    ///
    /// Returns `true` only for the call that performed the shutdown;
    /// concurrent racers see `false`.
    pub fn try_shutdown(&self) -> bool {
        let _lifecycle = self.lock_lifecycle();

        if !self.handle.invalidate() {
            return false;
        }

        self.interrupt_wait_sets();
        true
    }

    /// Guard condition used to interrupt `wait_set`, created lazily.
    ///
    /// Each wait-set has at most one interrupt guard registered at a time;
    /// repeated calls for the same wait-set return the same condition.
    #[must_use]
    pub fn get_interrupt_guard_condition(&self, wait_set: &WaitSet) -> Arc<GuardCondition> {
        let mut guards = self.lock_guards();
        Arc::clone(
            guards
                .entry(wait_set.id())
                .or_insert_with(|| Arc::new(GuardCondition::new())),
        )
    }

    /// Stop triggering `wait_set`'s interrupt guard.
    ///
    /// Returns whether a guard was registered. The wait-set keeps any
    /// attachment it holds; the context just forgets the guard.
    pub fn release_interrupt_guard_condition(&self, wait_set: &WaitSet) -> bool {
        let mut guards = self.lock_guards();
        let released = guards.remove(&wait_set.id()).is_some();
        if released {
            log::debug!(
                "[context] released interrupt guard wait_set={}",
                wait_set.id()
            );
        }
        released
    }

    /// Trigger every registered interrupt guard once.
    ///
    /// Guards are snapshotted out of the registry before triggering, so a
    /// wake path can never contend with the registry lock.
    pub fn interrupt_wait_sets(&self) {
        let snapshot: Vec<Arc<GuardCondition>> = {
            let guards = self.lock_guards();
            guards.values().map(Arc::clone).collect()
        };

        log::debug!(
            "[context] id={} interrupting {} wait-set(s)",
            self.handle.id(),
            snapshot.len()
        );

        for guard in snapshot {
            guard.trigger();
        }
    }

    /// Number of wait-sets currently holding an interrupt guard.
    #[must_use]
    pub fn interrupt_guard_count(&self) -> usize {
        self.lock_guards().len()
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        match self.lifecycle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::debug!("[context] lifecycle mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn lock_guards(&self) -> MutexGuard<'_, HashMap<WaitSetId, Arc<GuardCondition>>> {
        match self.interrupt_guards.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::debug!("[context] interrupt_guards mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        // Contexts are finalized on drop: interrupt waiters and invalidate
        // if nobody shut us down explicitly, then forget the guards.
        self.try_shutdown();
        self.lock_guards().clear();
    }
}

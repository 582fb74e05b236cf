// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lifecycle state wrapped by [`crate::Context`].
//!
//! A session handle is valid from creation until the first `invalidate()`.
//! Handles are never reused; identity is a process-unique monotonic id.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Highest domain id accepted by the middleware (port-mapping limit).
pub const DOMAIN_ID_MAX: u32 = 232;

/// Process-unique lifecycle state for one context.
pub struct SessionHandle {
    id: u64,
    name: String,
    domain_id: u32,
    valid: AtomicBool,
}

impl SessionHandle {
    pub(crate) fn create(name: &str, domain_id: u32) -> Result<Arc<Self>> {
        if domain_id > DOMAIN_ID_MAX {
            return Err(Error::InvalidDomainId(domain_id));
        }

        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        log::debug!(
            "[session] created id={} name={} domain={}",
            id,
            name,
            domain_id
        );

        Ok(Arc::new(Self {
            id,
            name: name.to_string(),
            domain_id,
            valid: AtomicBool::new(true),
        }))
    }

    /// Process-unique identifier of this session.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Session name supplied at creation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Domain id this session was created in.
    #[must_use]
    pub fn domain_id(&self) -> u32 {
        self.domain_id
    }

    /// Whether the session is still valid (not yet shut down).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// One-shot transition valid -> invalid.
    ///
    /// Returns `true` only for the call that performed the transition,
    /// regardless of concurrent callers.
    pub(crate) fn invalidate(&self) -> bool {
        let transitioned = self.valid.swap(false, Ordering::AcqRel);
        if transitioned {
            log::info!("[session] shutdown id={} name={}", self.id, self.name);
        }
        transitioned
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # NCL - Middleware Client Context Layer
//!
//! A pure Rust implementation of the client-side lifecycle layer used by
//! DDS-style middlewares: context init/shutdown state, guard conditions,
//! and interruptible wait-sets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ncl::{Context, WaitSet};
//! use std::time::Duration;
//!
//! fn main() -> ncl::Result<()> {
//!     let context = Context::builder("my_app").domain_id(0).build()?;
//!     let waitset = WaitSet::new();
//!
//!     // Attach the interrupt guard so shutdown() wakes the wait below.
//!     let guard = context.get_interrupt_guard_condition(&waitset);
//!     waitset.attach_guard(&guard)?;
//!
//!     while context.ok() {
//!         match waitset.wait(Some(Duration::from_millis(100))) {
//!             Ok(_triggered) => break, // interrupted or event ready
//!             Err(ncl::Error::WouldBlock) => continue, // timeout, poll again
//!             Err(e) => return Err(e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     Application Layer                        |
//! |        Context -> WaitSet -> blocking wait / interrupt       |
//! +--------------------------------------------------------------+
//! |                      Lifecycle Layer                         |
//! |   SessionHandle (valid/invalid) | interrupt guard registry   |
//! +--------------------------------------------------------------+
//! |                       Wake Layer                             |
//! |   GuardCondition hooks | WakeNotifier (atomic + condvar)     |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Context`] | Init/shutdown lifecycle, owns per-wait-set interrupt guards |
//! | [`WaitSet`] | Blocks until an attached condition triggers |
//! | [`GuardCondition`] | Manually-triggered condition used to wake waiters |
//! | [`SessionHandle`] | The underlying lifecycle state a context wraps |

mod condition;
/// Environment variable configuration.
pub mod config;
mod context;
mod session;
mod waitset;
mod wake;

pub use condition::{Condition, GuardCondition};
pub use config::EnvConfig;
pub use context::{Context, ContextBuilder};
pub use session::{SessionHandle, DOMAIN_ID_MAX};
pub use waitset::{WaitSet, WaitSetId, WAITSET_MAX_CONDITIONS};
pub use wake::{WaitsetSignal, WakeNotifier};

/// Errors returned by NCL operations.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Generic configuration error (duplicate attach, unknown condition).
    Config,
    /// Domain id out of range (0-232).
    InvalidDomainId(u32),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Invalid state for the requested operation.
    InvalidState(String),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Operation would block (or the wait timeout elapsed).
    WouldBlock,
    /// Resource limit exceeded (wait-set condition slots).
    ResourceLimitExceeded(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config => write!(f, "Configuration error"),
            Error::InvalidDomainId(id) => write!(f, "Invalid domain_id: {} (must be 0-232)", id),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::WouldBlock => write!(f, "Operation would block"),
            Error::ResourceLimitExceeded(msg) => write!(f, "Resource limit exceeded: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C FFI bindings for the NCL context layer.
//!
//! Exposes the context lifecycle, guard conditions, and wait-sets to C and
//! C++ callers through opaque handles. Handles are created and destroyed by
//! this layer only; every fallible call reports an [`NclError`] code.

mod waitset;

pub use waitset::{
    ncl_waitset_attach_guard, ncl_waitset_create, ncl_waitset_destroy, ncl_waitset_detach_guard,
    ncl_waitset_id, ncl_waitset_notify, ncl_waitset_wait, NclWaitSet,
};

use crate::waitset::ForeignWaitSet;
use libc::c_char;
use ncl::{Condition, Context, EnvConfig, Error, GuardCondition};
use std::ffi::CStr;
use std::sync::{Arc, Once};
use std::time::Duration;

/// One-time initialization of environment configuration and logging.
static RUNTIME_INIT: Once = Once::new();

/// Initialize environment configuration (called once per process).
fn init_runtime() {
    RUNTIME_INIT.call_once(|| {
        let config = EnvConfig::from_env();
        config.apply_log_level();
        let _ = env_logger::Builder::from_default_env().try_init();

        if config.is_custom() {
            eprintln!(
                "[ncl-c] Environment config: domain_id={}, session_name={:?}, log_level={}",
                config.domain_id, config.session_name, config.log_level
            );
        }
    });
}

/// Error codes returned across the C boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NclError {
    NclOk = 0,
    NclInvalidArgument = 1,
    NclNotFound = 2,
    NclInvalidState = 3,
    NclTimeout = 4,
    NclResourceLimit = 5,
    NclOperationFailed = 6,
}

pub(crate) fn err_from(error: &Error) -> NclError {
    match error {
        Error::Config | Error::InvalidDomainId(_) => NclError::NclInvalidArgument,
        Error::InvalidState(_) => NclError::NclInvalidState,
        Error::WouldBlock => NclError::NclTimeout,
        Error::ResourceLimitExceeded(_) => NclError::NclResourceLimit,
    }
}

pub(crate) fn timeout_from_ns(timeout_ns: i64) -> Option<Duration> {
    if timeout_ns < 0 {
        None
    } else {
        u64::try_from(timeout_ns).ok().map(Duration::from_nanos)
    }
}

// =============================================================================
// Opaque handle types
// =============================================================================

/// Opaque handle to a context.
#[repr(C)]
pub struct NclContext {
    _private: [u8; 0],
}

/// Opaque handle to a guard condition.
#[repr(C)]
pub struct NclGuardCondition {
    _private: [u8; 0],
}

struct ForeignContext {
    context: Context,
}

pub(crate) struct ForeignGuardCondition {
    pub(crate) guard: Arc<GuardCondition>,
}

// =============================================================================
// Context FFI
// =============================================================================

/// Creates a new context.
///
/// Reads configuration from environment variables on first call:
/// - `NCL_DOMAIN_ID`: domain id (default: 0, or `ROS_DOMAIN_ID` if set)
/// - `NCL_SESSION_NAME`: overrides `name`
/// - `NCL_LOG_LEVEL`: logging level (default: "info")
///
/// # Safety
///
/// - `name` must be a valid, non-null pointer to a null-terminated C string
///   with valid UTF-8
/// - `out_context` must be a valid, non-null pointer for writing the
///   resulting context pointer
/// - The returned context must be destroyed with `ncl_context_destroy`
#[no_mangle]
pub unsafe extern "C" fn ncl_context_create(
    name: *const c_char,
    out_context: *mut *mut NclContext,
) -> NclError {
    init_runtime();

    if name.is_null() || out_context.is_null() {
        return NclError::NclInvalidArgument;
    }

    let name_str = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => return NclError::NclInvalidArgument,
    };

    match Context::from_env(name_str) {
        Ok(context) => {
            let boxed = Box::new(ForeignContext { context });
            *out_context = Box::into_raw(boxed).cast::<NclContext>();
            NclError::NclOk
        }
        Err(err) => err_from(&err),
    }
}

/// Returns whether the context is still valid. Null contexts report `false`.
///
/// # Safety
///
/// `context` must be null or a pointer returned by `ncl_context_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_context_ok(context: *const NclContext) -> bool {
    if context.is_null() {
        return false;
    }
    let foreign = &*context.cast::<ForeignContext>();
    foreign.context.ok()
}

/// Invalidates the context and interrupts all registered wait-sets.
///
/// Returns `NCL_INVALID_STATE` if the context was already shut down.
///
/// # Safety
///
/// `context` must be a valid pointer returned by `ncl_context_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_context_shutdown(context: *mut NclContext) -> NclError {
    if context.is_null() {
        return NclError::NclInvalidArgument;
    }
    let foreign = &*context.cast::<ForeignContext>();
    match foreign.context.shutdown() {
        Ok(()) => NclError::NclOk,
        Err(err) => err_from(&err),
    }
}

/// Shuts the context down only if it is still valid.
///
/// When `out_performed` is non-null it receives whether this call performed
/// the shutdown.
///
/// # Safety
///
/// - `context` must be a valid pointer returned by `ncl_context_create`
/// - `out_performed` must be null or a valid pointer to a `bool`
#[no_mangle]
pub unsafe extern "C" fn ncl_context_try_shutdown(
    context: *mut NclContext,
    out_performed: *mut bool,
) -> NclError {
    if context.is_null() {
        return NclError::NclInvalidArgument;
    }
    let foreign = &*context.cast::<ForeignContext>();
    let performed = foreign.context.try_shutdown();
    if !out_performed.is_null() {
        *out_performed = performed;
    }
    NclError::NclOk
}

/// Triggers every interrupt guard currently registered with the context.
///
/// # Safety
///
/// `context` must be a valid pointer returned by `ncl_context_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_context_interrupt_wait_sets(context: *mut NclContext) -> NclError {
    if context.is_null() {
        return NclError::NclInvalidArgument;
    }
    let foreign = &*context.cast::<ForeignContext>();
    foreign.context.interrupt_wait_sets();
    NclError::NclOk
}

/// Returns the domain id the context was created in (0 for null contexts).
///
/// # Safety
///
/// `context` must be null or a pointer returned by `ncl_context_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_context_domain_id(context: *const NclContext) -> u32 {
    if context.is_null() {
        return 0;
    }
    let foreign = &*context.cast::<ForeignContext>();
    foreign.context.domain_id()
}

/// Returns the process-unique session id (0 for null contexts).
///
/// # Safety
///
/// `context` must be null or a pointer returned by `ncl_context_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_context_session_id(context: *const NclContext) -> u64 {
    if context.is_null() {
        return 0;
    }
    let foreign = &*context.cast::<ForeignContext>();
    foreign.context.handle().id()
}

/// Obtains the interrupt guard condition for `wait_set`, creating it lazily.
///
/// The returned handle owns a reference and must be released with
/// `ncl_guard_condition_release`. Repeated calls for the same wait-set
/// return handles to the same underlying condition.
///
/// # Safety
///
/// - `context` must be a valid pointer returned by `ncl_context_create`
/// - `wait_set` must be a valid pointer returned by `ncl_waitset_create`
/// - `out_guard` must be a valid, non-null pointer for writing the guard
///   pointer
#[no_mangle]
pub unsafe extern "C" fn ncl_context_get_interrupt_guard(
    context: *mut NclContext,
    wait_set: *mut NclWaitSet,
    out_guard: *mut *mut NclGuardCondition,
) -> NclError {
    if context.is_null() || wait_set.is_null() || out_guard.is_null() {
        return NclError::NclInvalidArgument;
    }

    let foreign = &*context.cast::<ForeignContext>();
    let foreign_ws = &*wait_set.cast::<ForeignWaitSet>();

    let guard = foreign
        .context
        .get_interrupt_guard_condition(&foreign_ws.waitset);

    let boxed = Box::new(ForeignGuardCondition { guard });
    *out_guard = Box::into_raw(boxed).cast::<NclGuardCondition>();
    NclError::NclOk
}

/// Stops triggering `wait_set`'s interrupt guard.
///
/// Returns `NCL_NOT_FOUND` when no guard was registered for the wait-set.
/// Outstanding guard handles stay valid until released.
///
/// # Safety
///
/// - `context` must be a valid pointer returned by `ncl_context_create`
/// - `wait_set` must be a valid pointer returned by `ncl_waitset_create`
#[no_mangle]
pub unsafe extern "C" fn ncl_context_release_interrupt_guard(
    context: *mut NclContext,
    wait_set: *mut NclWaitSet,
) -> NclError {
    if context.is_null() || wait_set.is_null() {
        return NclError::NclInvalidArgument;
    }

    let foreign = &*context.cast::<ForeignContext>();
    let foreign_ws = &*wait_set.cast::<ForeignWaitSet>();

    if foreign
        .context
        .release_interrupt_guard_condition(&foreign_ws.waitset)
    {
        NclError::NclOk
    } else {
        NclError::NclNotFound
    }
}

/// Destroys a context. Shuts it down first if still valid. Null is a no-op.
///
/// # Safety
///
/// `context` must be null or a pointer returned by `ncl_context_create`,
/// and must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn ncl_context_destroy(context: *mut NclContext) {
    if context.is_null() {
        return;
    }
    drop(Box::from_raw(context.cast::<ForeignContext>()));
}

// =============================================================================
// Guard condition FFI
// =============================================================================

/// Creates a standalone guard condition with `trigger_value = false`.
///
/// Returns null on allocation failure. Release with
/// `ncl_guard_condition_release`.
#[no_mangle]
pub extern "C" fn ncl_guard_condition_create() -> *mut NclGuardCondition {
    let boxed = Box::new(ForeignGuardCondition {
        guard: Arc::new(GuardCondition::new()),
    });
    Box::into_raw(boxed).cast::<NclGuardCondition>()
}

/// Returns the stable condition id (0 for null handles).
///
/// # Safety
///
/// `guard` must be null or a valid guard-condition pointer.
#[no_mangle]
pub unsafe extern "C" fn ncl_guard_condition_id(guard: *const NclGuardCondition) -> u64 {
    if guard.is_null() {
        return 0;
    }
    let foreign = &*guard.cast::<ForeignGuardCondition>();
    foreign.guard.condition_id()
}

/// Triggers the guard condition, waking any wait-set it is attached to.
///
/// # Safety
///
/// `guard` must be a valid guard-condition pointer.
#[no_mangle]
pub unsafe extern "C" fn ncl_guard_condition_trigger(guard: *mut NclGuardCondition) -> NclError {
    if guard.is_null() {
        return NclError::NclInvalidArgument;
    }
    let foreign = &*guard.cast::<ForeignGuardCondition>();
    foreign.guard.trigger();
    NclError::NclOk
}

/// Sets the guard condition's trigger value.
///
/// # Safety
///
/// `guard` must be a valid guard-condition pointer.
#[no_mangle]
pub unsafe extern "C" fn ncl_guard_condition_set_trigger(
    guard: *mut NclGuardCondition,
    value: bool,
) -> NclError {
    if guard.is_null() {
        return NclError::NclInvalidArgument;
    }
    let foreign = &*guard.cast::<ForeignGuardCondition>();
    foreign.guard.set_trigger_value(value);
    NclError::NclOk
}

/// Reads the guard condition's trigger value (`false` for null handles).
///
/// # Safety
///
/// `guard` must be null or a valid guard-condition pointer.
#[no_mangle]
pub unsafe extern "C" fn ncl_guard_condition_get_trigger(
    guard: *const NclGuardCondition,
) -> bool {
    if guard.is_null() {
        return false;
    }
    let foreign = &*guard.cast::<ForeignGuardCondition>();
    foreign.guard.get_trigger_value()
}

/// Releases a guard-condition handle. Null is a no-op.
///
/// The underlying condition is freed once every handle and wait-set
/// attachment referencing it is gone.
///
/// # Safety
///
/// `guard` must be null or a valid guard-condition pointer, and must not be
/// used after this call.
#[no_mangle]
pub unsafe extern "C" fn ncl_guard_condition_release(guard: *mut NclGuardCondition) {
    if guard.is_null() {
        return;
    }
    drop(Box::from_raw(guard.cast::<ForeignGuardCondition>()));
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wait-set bridge exposing NCL wait-set primitives to the C FFI.

use crate::{err_from, timeout_from_ns, ForeignGuardCondition, NclError, NclGuardCondition};
use ncl::{Condition, Error, WaitSet};
use std::sync::Arc;

/// Opaque handle to a wait-set.
#[repr(C)]
pub struct NclWaitSet {
    _private: [u8; 0],
}

/// FFI-side wrapper; the wait-set's own registry keeps attached conditions
/// alive, so no extra bookkeeping is needed here.
pub(crate) struct ForeignWaitSet {
    pub(crate) waitset: WaitSet,
}

/// Creates a new wait-set. Destroy with `ncl_waitset_destroy`.
#[no_mangle]
pub extern "C" fn ncl_waitset_create() -> *mut NclWaitSet {
    let boxed = Box::new(ForeignWaitSet {
        waitset: WaitSet::new(),
    });
    Box::into_raw(boxed).cast::<NclWaitSet>()
}

/// Returns the stable wait-set id (0 for null handles).
///
/// # Safety
///
/// `wait_set` must be null or a pointer returned by `ncl_waitset_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_waitset_id(wait_set: *const NclWaitSet) -> u64 {
    if wait_set.is_null() {
        return 0;
    }
    let foreign = &*wait_set.cast::<ForeignWaitSet>();
    foreign.waitset.id()
}

/// Attaches a guard condition to the wait-set.
///
/// Duplicate attachments return `NCL_INVALID_ARGUMENT`.
///
/// # Safety
///
/// - `wait_set` must be a valid pointer returned by `ncl_waitset_create`
/// - `guard` must be a valid guard-condition pointer
#[no_mangle]
pub unsafe extern "C" fn ncl_waitset_attach_guard(
    wait_set: *mut NclWaitSet,
    guard: *mut NclGuardCondition,
) -> NclError {
    if wait_set.is_null() || guard.is_null() {
        return NclError::NclInvalidArgument;
    }

    let foreign_ws = &*wait_set.cast::<ForeignWaitSet>();
    let foreign_guard = &*guard.cast::<ForeignGuardCondition>();

    match foreign_ws.waitset.attach_guard(&foreign_guard.guard) {
        Ok(()) => NclError::NclOk,
        Err(err) => err_from(&err),
    }
}

/// Detaches a guard condition from the wait-set.
///
/// Returns `NCL_NOT_FOUND` when the guard is not attached.
///
/// # Safety
///
/// - `wait_set` must be a valid pointer returned by `ncl_waitset_create`
/// - `guard` must be a valid guard-condition pointer
#[no_mangle]
pub unsafe extern "C" fn ncl_waitset_detach_guard(
    wait_set: *mut NclWaitSet,
    guard: *mut NclGuardCondition,
) -> NclError {
    if wait_set.is_null() || guard.is_null() {
        return NclError::NclInvalidArgument;
    }

    let foreign_ws = &*wait_set.cast::<ForeignWaitSet>();
    let foreign_guard = &*guard.cast::<ForeignGuardCondition>();

    match foreign_ws.waitset.detach_guard(&foreign_guard.guard) {
        Ok(()) => NclError::NclOk,
        Err(Error::Config) => NclError::NclNotFound,
        Err(err) => err_from(&err),
    }
}

/// Waits until at least one attached condition triggers.
///
/// `timeout_ns < 0` blocks indefinitely. Triggered condition ids are copied
/// into `triggered` (up to `capacity`); `out_count` receives the number
/// copied. A timeout returns `NCL_TIMEOUT` with `out_count == 0`.
///
/// # Safety
///
/// - `wait_set` must be a valid pointer returned by `ncl_waitset_create`
/// - `triggered` must point to at least `capacity` writable `u64` slots,
///   or be null when `capacity` is 0
/// - `out_count` must be a valid, non-null pointer to a `usize`
#[no_mangle]
pub unsafe extern "C" fn ncl_waitset_wait(
    wait_set: *mut NclWaitSet,
    timeout_ns: i64,
    triggered: *mut u64,
    capacity: usize,
    out_count: *mut usize,
) -> NclError {
    if wait_set.is_null() || out_count.is_null() || (triggered.is_null() && capacity > 0) {
        return NclError::NclInvalidArgument;
    }
    *out_count = 0;

    let foreign_ws = &*wait_set.cast::<ForeignWaitSet>();

    let conditions: Vec<Arc<dyn Condition>> =
        match foreign_ws.waitset.wait(timeout_from_ns(timeout_ns)) {
            Ok(list) => list,
            Err(err) => return err_from(&err),
        };

    let copied = conditions.len().min(capacity);
    for (slot, condition) in conditions.iter().take(copied).enumerate() {
        *triggered.add(slot) = condition.condition_id();
    }
    *out_count = copied;

    NclError::NclOk
}

/// Wakes a blocked `ncl_waitset_wait` without triggering any condition.
///
/// # Safety
///
/// `wait_set` must be a valid pointer returned by `ncl_waitset_create`.
#[no_mangle]
pub unsafe extern "C" fn ncl_waitset_notify(wait_set: *mut NclWaitSet) -> NclError {
    if wait_set.is_null() {
        return NclError::NclInvalidArgument;
    }
    let foreign = &*wait_set.cast::<ForeignWaitSet>();
    foreign.waitset.notify();
    NclError::NclOk
}

/// Destroys a wait-set, detaching all conditions. Null is a no-op.
///
/// # Safety
///
/// `wait_set` must be null or a pointer returned by `ncl_waitset_create`,
/// and must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn ncl_waitset_destroy(wait_set: *mut NclWaitSet) {
    if wait_set.is_null() {
        return;
    }
    drop(Box::from_raw(wait_set.cast::<ForeignWaitSet>()));
}

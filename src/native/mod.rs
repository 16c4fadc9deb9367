//! The native round-robin database library, treated as an opaque capability.
//!
//! `RrdApi` is the complete surface the bridge uses: the per-thread context
//! initializer, four entry points, and the thread-global error channel. The
//! production implementation is `LibRrd` (runtime-loaded librrd); tests swap
//! in a call-counting fake.
//!
//! # Safety
//!
//! The entry points take raw pointers exactly as librrd does. Callers must
//! pass NUL-terminated strings that outlive the call and pointer arrays of
//! exactly `argc` elements.

pub mod loader;
pub mod sys;

use std::os::raw::{c_char, c_int, c_ulong, c_void};
use std::ptr;

pub use loader::LibRrd;
pub use sys::{NativeTime, RrdValue};

/// In/out parameters shared by `rrd_fetch_r` and `rrd_xport`.
///
/// `start`/`end`/`step` go in as the request (fetch only) and come back
/// adjusted. On success `legends` and `data` point at buffers the caller now
/// owns and must release with `RrdApi::free`.
#[derive(Debug)]
pub struct RawFetchOutput {
    pub start: NativeTime,
    pub end: NativeTime,
    pub step: c_ulong,
    pub column_count: c_ulong,
    pub legends: *mut *mut c_char,
    pub data: *mut RrdValue,
}

impl RawFetchOutput {
    /// A window for `rrd_fetch_r`; output pointers start out null.
    pub fn request(start: NativeTime, end: NativeTime, step: c_ulong) -> Self {
        Self {
            start,
            end,
            step,
            column_count: 0,
            legends: ptr::null_mut(),
            data: ptr::null_mut(),
        }
    }
}

impl Default for RawFetchOutput {
    fn default() -> Self {
        Self::request(0, 0, 0)
    }
}

pub trait RrdApi {
    /// Must run once on every thread before its first entry-point call.
    fn get_context(&self);

    /// # Safety
    /// See the module-level contract.
    unsafe fn create(
        &self,
        filename: *const c_char,
        pdp_step: c_ulong,
        last_up: NativeTime,
        argc: c_int,
        argv: *const *const c_char,
    ) -> c_int;

    /// # Safety
    /// See the module-level contract. `template` may be null.
    unsafe fn update(
        &self,
        filename: *const c_char,
        template: *const c_char,
        argc: c_int,
        argv: *const *const c_char,
    ) -> c_int;

    /// # Safety
    /// See the module-level contract.
    unsafe fn fetch(
        &self,
        filename: *const c_char,
        cf: *const c_char,
        output: &mut RawFetchOutput,
    ) -> c_int;

    /// # Safety
    /// See the module-level contract. librrd may permute `argv` (getopt), but
    /// never the strings it points at.
    unsafe fn xport(&self, argc: c_int, argv: *mut *mut c_char, output: &mut RawFetchOutput)
        -> c_int;

    /// True when the calling thread's error flag is set.
    fn test_error(&self) -> bool;

    /// A copy of the calling thread's error text. The native buffer is not freed.
    fn error_message(&self) -> String;

    fn clear_error(&self);

    /// Releases a buffer librrd handed to the caller.
    ///
    /// # Safety
    /// `ptr` must come from a successful fetch/export output and be freed once.
    unsafe fn free(&self, ptr: *mut c_void);
}

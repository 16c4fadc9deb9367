//! Raw C-level types and entry-point signatures of librrd.
//!
//! Only the thread-safe (`*_r`) entry points plus `rrd_xport` are bound. The
//! error accessors operate on the calling thread's `rrd_context_t`.

use std::os::raw::{c_char, c_int, c_ulong, c_void};

/// librrd's `rrd_value_t`.
pub type RrdValue = f64;

/// The native time representation (`time_t`). Its width is platform-defined;
/// see `kernels::narrowing` for how host timestamps are converted.
pub type NativeTime = libc::time_t;

/// `rrd_context_t *rrd_get_context(void);`
pub type GetContextFn = unsafe extern "C" fn() -> *mut c_void;

/// `int rrd_create_r(const char *filename, unsigned long pdp_step,
///                   time_t last_up, int argc, const char **argv);`
pub type CreateFn = unsafe extern "C" fn(
    *const c_char,
    c_ulong,
    NativeTime,
    c_int,
    *const *const c_char,
) -> c_int;

/// `int rrd_update_r(const char *filename, const char *_template,
///                   int argc, const char **argv);`
pub type UpdateFn =
    unsafe extern "C" fn(*const c_char, *const c_char, c_int, *const *const c_char) -> c_int;

/// `int rrd_fetch_r(const char *filename, const char *cf, time_t *start,
///                  time_t *end, unsigned long *step, unsigned long *ds_cnt,
///                  char ***ds_namv, rrd_value_t **data);`
pub type FetchFn = unsafe extern "C" fn(
    *const c_char,
    *const c_char,
    *mut NativeTime,
    *mut NativeTime,
    *mut c_ulong,
    *mut c_ulong,
    *mut *mut *mut c_char,
    *mut *mut RrdValue,
) -> c_int;

/// `int rrd_xport(int argc, char **argv, int *xsize, time_t *start,
///                time_t *end, unsigned long *step, unsigned long *col_cnt,
///                char ***legend_v, rrd_value_t **data);`
pub type XportFn = unsafe extern "C" fn(
    c_int,
    *mut *mut c_char,
    *mut c_int,
    *mut NativeTime,
    *mut NativeTime,
    *mut c_ulong,
    *mut c_ulong,
    *mut *mut *mut c_char,
    *mut *mut RrdValue,
) -> c_int;

/// `int rrd_test_error(void);`
pub type TestErrorFn = unsafe extern "C" fn() -> c_int;

/// `char *rrd_get_error(void);` The buffer belongs to librrd.
pub type GetErrorFn = unsafe extern "C" fn() -> *mut c_char;

/// `void rrd_clear_error(void);`
pub type ClearErrorFn = unsafe extern "C" fn();

//! Integer-width conversions between host values and librrd's C types.
//!
//! Host timestamps are `i64`; librrd takes `time_t`, whose width depends on
//! the target (64-bit on LP64 Linux and macOS, 32-bit on some 32-bit ABIs).
//! The conversion is made explicit through `TimeConversion` instead of a
//! silent cast.

use std::os::raw::{c_long, c_ulong};

use num_traits::AsPrimitive;

use crate::config::TimeConversion;
use crate::error::BridgeError;
use crate::native::NativeTime;

/// Narrows a host timestamp into `T` under `policy`.
///
/// `Checked` rejects values outside `T`'s range with `InvalidArgument` naming
/// `argument`; `Truncate` keeps the low bits, like a C cast.
pub fn narrow_timestamp<T>(
    timestamp: i64,
    policy: TimeConversion,
    argument: &'static str,
) -> Result<T, BridgeError>
where
    T: Copy + 'static + TryFrom<i64>,
    i64: AsPrimitive<T>,
{
    match policy {
        TimeConversion::Checked => {
            T::try_from(timestamp).map_err(|_| BridgeError::out_of_bounds(argument))
        }
        TimeConversion::Truncate => Ok(timestamp.as_()),
    }
}

/// `narrow_timestamp` for this target's `time_t`.
pub fn to_native_time(
    timestamp: i64,
    policy: TimeConversion,
    argument: &'static str,
) -> Result<NativeTime, BridgeError> {
    narrow_timestamp::<NativeTime>(timestamp, policy, argument)
}

/// Widens a native timestamp back to the host representation. Always lossless.
pub fn from_native_time(time: NativeTime) -> i64 {
    i64::from(time)
}

/// `rrd_create_r` takes the step as `unsigned long`; it must fit the signed
/// `long` range before being passed on.
pub fn pdp_step_to_native(pdp_step: i64) -> Result<c_ulong, BridgeError> {
    let step = c_long::try_from(pdp_step).map_err(|_| BridgeError::out_of_bounds("pdp_step"))?;
    Ok(step as c_ulong)
}

/// `rrd_fetch_r` takes the requested resolution as `unsigned long`.
pub fn fetch_step_to_native(step: i64) -> Result<c_ulong, BridgeError> {
    c_ulong::try_from(step).map_err(|_| BridgeError::out_of_bounds("step"))
}

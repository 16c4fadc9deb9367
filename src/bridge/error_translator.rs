// In: src/bridge/error_translator.rs

//! Converts librrd's thread-global error state into a per-call failure.

use crate::error::BridgeError;
use crate::native::RrdApi;

/// Reads the error state after `operation` returned a failure code.
///
/// The message is copied out before the state is cleared, and the state is
/// cleared whether or not librrd set it. Callers return the error immediately
/// and make no further native calls.
pub fn translate_failure<R: RrdApi + ?Sized>(rrd: &R, operation: &'static str) -> BridgeError {
    let message = if rrd.test_error() {
        rrd.error_message()
    } else {
        format!("{}() failed, but no error code was set.", operation)
    };
    rrd.clear_error();

    BridgeError::NativeOperation { operation, message }
}

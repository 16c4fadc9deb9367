// In: src/error.rs

//! This module defines the single, unified error type for the rrd bridge.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! The four boundary failure kinds (`InvalidArgument`, `ResourceExhausted`,
//! `NativeOperation`, `TypeResolution`) are what the orchestrators report. The
//! remaining variants belong to the ambient layers (library loading, config).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    // =========================================================================
    // === Boundary Failures (raised into the host runtime)
    // =========================================================================
    /// A required input was absent, or a numeric input does not fit the native
    /// representation. Detected before any native call.
    #[error("{message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    /// An allocation failed while marshaling. Everything acquired so far has
    /// already been released when this is returned.
    #[error("{0}")]
    ResourceExhausted(String),

    /// The native entry point reported failure. `message` is the text read
    /// from the native error state, or a fixed diagnostic naming `operation`.
    #[error("{message}")]
    NativeOperation {
        operation: &'static str,
        message: String,
    },

    /// A required host type or constructor could not be found.
    #[error("{0}")]
    TypeResolution(String),

    // =========================================================================
    // === Ambient Errors
    // =========================================================================
    /// The native library could not be located or one of its entry points is missing.
    #[error("Failed to load the rrd library: {0}")]
    LibraryLoad(String),

    /// The bridge configuration is invalid.
    #[error("Invalid bridge configuration: {0}")]
    Config(String),

    /// An error for Python FFI (Foreign Function Interface) operations.
    #[error("FFI operation failed: {0}")]
    FfiError(String), // PyErr doesn't impl Clone/Eq, so we can't use #[from] here.
}

impl BridgeError {
    /// Builds the `InvalidArgument` raised when a required input is absent.
    pub fn null_argument(argument: &'static str) -> Self {
        BridgeError::InvalidArgument {
            argument,
            message: format!("{} cannot be null.", argument),
        }
    }

    /// Builds the `InvalidArgument` raised when a numeric input does not fit
    /// the native range.
    pub fn out_of_bounds(argument: &'static str) -> Self {
        BridgeError::InvalidArgument {
            argument,
            message: format!("{} out of bounds.", argument),
        }
    }

    /// True for failures the host should see as its out-of-memory signal.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, BridgeError::ResourceExhausted(_))
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl From<libloading::Error> for BridgeError {
    fn from(err: libloading::Error) -> Self {
        BridgeError::LibraryLoad(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for BridgeError {
    fn from(err: pyo3::PyErr) -> Self {
        BridgeError::FfiError(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<BridgeError> for pyo3::PyErr {
    fn from(err: BridgeError) -> pyo3::PyErr {
        if err.is_resource_exhaustion() {
            pyo3::exceptions::PyMemoryError::new_err(err.to_string())
        } else {
            crate::ffi::python::RrdError::new_err(err.to_string())
        }
    }
}

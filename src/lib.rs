//! This file is the root of the `rrd_bridge` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`bridge`, `marshal`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (feature `python`).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod config;
pub mod error;
pub mod kernels;
pub mod marshal;
pub mod native;
pub mod traits;
pub mod types;

#[cfg(feature = "python")]
pub mod ffi;

#[cfg(test)]
mod test_support;

pub use bridge::Bridge;
pub use config::{BridgeConfig, TimeConversion};
pub use error::BridgeError;
pub use native::{LibRrd, RrdApi};
pub use traits::HostEnv;

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `rrd_bridge` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn rrd_bridge(py: Python, m: &PyModule) -> PyResult<()> {
    // --- Boundary operations ---
    m.add_function(wrap_pyfunction!(ffi::init_thread_context_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::create_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::update_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::fetch_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::xport_py, m)?)?;

    // --- Classes ---
    m.add_class::<ffi::PyRrd>()?;
    m.add_class::<ffi::PyFetchResults>()?;

    // --- Expose the custom error type ---
    m.add("RrdError", py.get_type::<ffi::RrdError>())?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on logging for library loading and result shapes ---
    m.add_function(wrap_pyfunction!(ffi::enable_verbose_logging_py, m)?)?;

    Ok(())
}

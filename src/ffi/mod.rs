//! This module serves as the public API for the Foreign Function Interface (FFI) layer.
//!
//! It adapts CPython to the bridge: `host_adapter` implements `HostEnv` over
//! pyo3, and `python` defines the classes and functions of the `rrd_bridge`
//! extension module.

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod host_adapter;
/// Contains all logic for interfacing with the Python/CPython ecosystem,
pub mod python;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
// This section defines the public API of the FFI layer that the main `lib.rs`
// will use to construct the final Python module.
pub use self::host_adapter::PyHost;
pub use self::python::{
    create_py, enable_verbose_logging_py, fetch_py, init_thread_context_py, update_py, xport_py,
    PyFetchResults, PyRrd, RrdError,
};

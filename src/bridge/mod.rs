// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the boundary between a managed host runtime and librrd. It owns
// no round-robin semantics; it converts values between the two memory models,
// guarantees every native buffer is released on every path, and turns librrd's
// thread-global error channel into per-call failures.
//
// Data Flow (fetch / xport):
//
//   1. [Host Facade (ffi::python)]          -> Receives host strings and integers
//         |
//         `-> builds a `Bridge` over (`RrdApi`, `HostEnv`) ->
//
//   2. [Orchestrator (orchestrator::Bridge)] -> Resolves `TypeHandleSet`, checks the
//                                               record constructor
//         |
//         `-> a. Null checks and range checks (`kernels::narrowing`)
//         |
//         `-> b. Marshals inputs into guards (`marshal::strings`)
//         |
//         `-> c. Clears stale error state, calls librrd
//         |
//         `-> d. On failure: `error_translator` -> `BridgeError::NativeOperation`
//         |
//         `-> e. On success: `output::NativeFetchOutput` owns the native buffers
//
//   3. [Result Assembly]                     -> legends via `marshal::strings`,
//                                               values via `marshal::matrix`,
//                                               one `new_record` call
//
// Data Flow (create / update): steps 1, 2a-2d. There is no output to marshal.
//
// Every `BridgeError` is raised into the host through the resolved exception or
// out-of-memory type before it leaves the orchestrator.
//
// ====================================================================================
pub(crate) mod error_translator;
pub mod orchestrator;
pub(crate) mod output;
pub mod thread_context;
pub mod xport_args;

pub use orchestrator::Bridge;
pub use xport_args::xport_argv;

//! Pure, stateless kernels used by the marshalers.
//!
//! Nothing in here touches the host runtime or librrd; these are the index and
//! integer-width rules the boundary depends on, kept separate so they can be
//! tested and benchmarked in isolation.

pub mod narrowing;
pub mod transpose;

//! Conversions between host values and native buffers.
//!
//! Every native allocation made here is owned by a guard whose `Drop` releases
//! it, so early returns through `?` can never leak a string view or a pointer
//! array.

pub mod matrix;
pub mod strings;

pub use matrix::values_to_matrix;
pub use strings::{strings_to_host, NativeString, NativeStringArray};

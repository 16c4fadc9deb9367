//! This module defines the strongly-typed host-side contracts used by the bridge.
//!
//! It includes the `RecordSchema` describing the fixed result-record
//! constructor and the `TypeHandleSet` resolver for the host types every
//! operation needs.

pub mod handles;
pub mod record_schema;

// Re-export the main type(s) for easier access.
pub use handles::TypeHandleSet;
pub use record_schema::{FieldKind, RecordField, RecordSchema, FETCH_RESULTS_SCHEMA};

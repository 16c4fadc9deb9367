// In: src/traits.rs

//! Defines the host-runtime seam used by the marshalers and orchestrators.
//!
//! `HostEnv` is the short list of things the bridge needs from a managed
//! runtime: find types by name, hand out NUL-terminated views of its strings,
//! allocate arrays and records, and raise failures. The Python adapter in
//! `ffi::host_adapter` implements it over pyo3; tests implement it with an
//! allocation-tracking fake.

use std::ffi::CStr;

use crate::error::BridgeError;
use crate::types::RecordSchema;

/// The host runtime as seen from the boundary.
///
/// Allocation-style operations return `None` when the host could not allocate,
/// the way a JNI `New*` call returns null. The marshalers turn that into
/// `BridgeError::ResourceExhausted` and release what they already hold.
pub trait HostEnv {
    /// A resolved host type (class object).
    type TypeRef: Clone;
    /// A host text value.
    type Str;
    /// A host ordered sequence of text values.
    type StrSeq;
    /// A native view of a host string, valid until handed back to `release_utf`.
    ///
    /// The bytes behind the view must not move when the view value itself is
    /// moved; the marshalers keep raw pointers into it across moves.
    type Utf: AsRef<CStr>;
    /// Any object the bridge creates on the host side.
    type Object: Clone;
    /// A failure raised into the host runtime.
    type Failure;

    // --- Type resolution ---

    /// Looks a type up by its stable, dotted name. A failure is the host's own
    /// lookup failure and is propagated unchanged.
    fn find_type(&self, name: &'static str) -> Result<Self::TypeRef, Self::Failure>;

    /// True when `record_type` can be constructed with the fields of `schema`,
    /// in order.
    fn has_constructor(
        &self,
        record_type: &Self::TypeRef,
        schema: &RecordSchema,
    ) -> Result<bool, Self::Failure>;

    /// Builds the failure to raise for `message`, using `exception_type`.
    fn raise(&self, exception_type: &Self::TypeRef, message: &str) -> Self::Failure;

    // --- Host -> native ---

    fn seq_len(&self, seq: &Self::StrSeq) -> Result<usize, BridgeError>;

    /// Returns element `index`; an element that is not a string is an
    /// `InvalidArgument` for `argument`.
    fn seq_item(
        &self,
        seq: &Self::StrSeq,
        index: usize,
        argument: &'static str,
    ) -> Result<Self::Str, BridgeError>;

    /// Acquires a native view of `value`. Every successful acquisition must be
    /// matched by exactly one `release_utf`.
    fn acquire_utf(&self, value: &Self::Str, argument: &'static str)
        -> Result<Self::Utf, BridgeError>;

    fn release_utf(&self, value: &Self::Str, view: Self::Utf);

    // --- Native -> host ---

    /// A host array of `len` empty slots whose elements are `element_type`.
    fn new_object_array(&self, element_type: &Self::TypeRef, len: usize) -> Option<Self::Object>;

    fn new_string(&self, value: &CStr) -> Option<Self::Object>;

    /// A host numeric array of `array_type` holding a bulk copy of `values`.
    /// An allocation failure is `ResourceExhausted`; any other host failure
    /// keeps its own kind.
    fn new_double_array(
        &self,
        array_type: &Self::TypeRef,
        values: &[f64],
    ) -> Result<Self::Object, BridgeError>;

    fn set_element(
        &self,
        array: &Self::Object,
        index: usize,
        value: Self::Object,
    ) -> Result<(), BridgeError>;

    /// Invokes the record constructor. Argument order follows `FETCH_RESULTS_SCHEMA`.
    fn new_record(
        &self,
        record_type: &Self::TypeRef,
        start: i64,
        end: i64,
        step: i64,
        columns: Self::Object,
        values: Self::Object,
    ) -> Result<Self::Object, BridgeError>;
}

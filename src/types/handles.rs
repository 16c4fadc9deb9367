//! Resolution of the host types every boundary operation needs.

use crate::error::BridgeError;
use crate::traits::HostEnv;
use crate::types::record_schema::{RecordSchema, FETCH_RESULTS_SCHEMA};

/// Stable names of the host types, looked up once per operation.
pub const EXCEPTION_TYPE: &str = "rrd_bridge.RrdError";
pub const OUT_OF_MEMORY_TYPE: &str = "builtins.MemoryError";
pub const STRING_TYPE: &str = "builtins.str";
pub const DOUBLE_ARRAY_TYPE: &str = "array.array";

/// The resolved host types plus the record constructor contract.
///
/// Built by `resolve`; never partially populated. The constructor itself is
/// checked separately by `require_record_constructor`.
#[derive(Debug, Clone)]
pub struct TypeHandleSet<T> {
    pub exception: T,
    pub out_of_memory: T,
    pub string: T,
    pub double_array: T,
    pub record: T,
    pub record_schema: &'static RecordSchema,
}

impl<T: Clone> TypeHandleSet<T> {
    /// Looks up all five types, stopping at the first failure. The host's own
    /// failure is returned unchanged so nothing masks it.
    pub fn resolve<H>(host: &H) -> Result<Self, H::Failure>
    where
        H: HostEnv<TypeRef = T>,
    {
        let exception = host.find_type(EXCEPTION_TYPE)?;
        let out_of_memory = host.find_type(OUT_OF_MEMORY_TYPE)?;
        let string = host.find_type(STRING_TYPE)?;
        let double_array = host.find_type(DOUBLE_ARRAY_TYPE)?;
        let record = host.find_type(FETCH_RESULTS_SCHEMA.type_name)?;

        Ok(Self {
            exception,
            out_of_memory,
            string,
            double_array,
            record,
            record_schema: &FETCH_RESULTS_SCHEMA,
        })
    }

    /// Checks that the record type can be built from `record_schema`. Only the
    /// operations that return a record need this.
    pub fn require_record_constructor<H>(&self, host: &H) -> Result<(), H::Failure>
    where
        H: HostEnv<TypeRef = T>,
    {
        if host.has_constructor(&self.record, self.record_schema)? {
            Ok(())
        } else {
            Err(host.raise(&self.exception, "no valid constructor found."))
        }
    }

    /// Turns a bridge failure into a host failure: resource exhaustion uses the
    /// out-of-memory type, everything else the bridge's exception type.
    pub fn raise<H>(&self, host: &H, err: &BridgeError) -> H::Failure
    where
        H: HostEnv<TypeRef = T>,
    {
        let exception_type = if err.is_resource_exhaustion() {
            &self.out_of_memory
        } else {
            &self.exception
        };
        host.raise(exception_type, &err.to_string())
    }
}

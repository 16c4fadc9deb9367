// In: src/ffi/host_adapter.rs

//! `HostEnv` over CPython.
//!
//! Type names are `module.attr` paths resolved by importing the module. String
//! views are owned `CString` copies of the UTF-8 text, so a view never pins a
//! Python object. Numeric columns are `array.array('d')` built from one bulk
//! byte copy.

use std::borrow::Cow;
use std::ffi::{CStr, CString};

use pyo3::exceptions::PyMemoryError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyList, PyString, PyType};

use crate::error::BridgeError;
use crate::traits::HostEnv;
use crate::types::RecordSchema;

pub struct PyHost<'py> {
    py: Python<'py>,
}

impl<'py> PyHost<'py> {
    pub fn new(py: Python<'py>) -> Self {
        Self { py }
    }

    /// Maps a Python error raised while marshaling: `MemoryError` stays an
    /// exhaustion signal, anything else becomes an FFI failure.
    fn marshal_error(&self, err: PyErr, context: &str) -> BridgeError {
        if err.is_instance_of::<PyMemoryError>(self.py) {
            BridgeError::ResourceExhausted(format!("failed to allocate memory for {}", context))
        } else {
            BridgeError::FfiError(format!("{}: {}", context, err))
        }
    }
}

impl<'py> HostEnv for PyHost<'py> {
    type TypeRef = Bound<'py, PyType>;
    type Str = Bound<'py, PyString>;
    type StrSeq = Bound<'py, PyAny>;
    type Utf = CString;
    type Object = Bound<'py, PyAny>;
    type Failure = PyErr;

    fn find_type(&self, name: &'static str) -> PyResult<Bound<'py, PyType>> {
        let (module, attr) = name.rsplit_once('.').unwrap_or(("builtins", name));
        let ty = PyModule::import_bound(self.py, module)?
            .getattr(attr)?
            .downcast_into::<PyType>()?;
        Ok(ty)
    }

    fn has_constructor(&self, record_type: &Bound<'py, PyType>, schema: &RecordSchema) -> PyResult<bool> {
        if !record_type.is_callable() {
            return Ok(false);
        }
        // Types without an introspectable signature are taken on trust.
        match record_type.getattr("__text_signature__") {
            Ok(sig) if !sig.is_none() => Ok(sig.extract::<String>()? == schema.text_signature()),
            _ => Ok(true),
        }
    }

    fn raise(&self, exception_type: &Bound<'py, PyType>, message: &str) -> PyErr {
        PyErr::from_type_bound(exception_type.clone(), message.to_string())
    }

    fn seq_len(&self, seq: &Bound<'py, PyAny>) -> Result<usize, BridgeError> {
        let not_a_sequence = || BridgeError::InvalidArgument {
            argument: "argv",
            message: "argv must be a sequence of str.".to_string(),
        };
        // A bare str has a length but is not an argument list.
        if seq.is_instance_of::<PyString>() {
            return Err(not_a_sequence());
        }
        seq.len().map_err(|_| not_a_sequence())
    }

    fn seq_item(
        &self,
        seq: &Bound<'py, PyAny>,
        index: usize,
        argument: &'static str,
    ) -> Result<Bound<'py, PyString>, BridgeError> {
        let item = seq
            .get_item(index)
            .map_err(|e| self.marshal_error(e, "argument list item"))?;
        item.downcast_into::<PyString>()
            .map_err(|_| BridgeError::InvalidArgument {
                argument,
                message: format!("{}[{}] must be a str.", argument, index),
            })
    }

    fn acquire_utf(&self, value: &Bound<'py, PyString>, argument: &'static str) -> Result<CString, BridgeError> {
        let text: Cow<'_, str> = value.to_cow().map_err(|e| {
            if e.is_instance_of::<PyMemoryError>(self.py) {
                BridgeError::ResourceExhausted("failed to allocate memory for string".to_string())
            } else {
                BridgeError::InvalidArgument {
                    argument,
                    message: format!("{} is not valid UTF-8.", argument),
                }
            }
        })?;
        CString::new(text.into_owned()).map_err(|_| BridgeError::InvalidArgument {
            argument,
            message: format!("{} contains an embedded NUL byte.", argument),
        })
    }

    fn release_utf(&self, _value: &Bound<'py, PyString>, view: CString) {
        drop(view);
    }

    fn new_object_array(&self, _element_type: &Bound<'py, PyType>, len: usize) -> Option<Bound<'py, PyAny>> {
        let list = PyList::new_bound(self.py, (0..len).map(|_| self.py.None()));
        Some(list.into_any())
    }

    fn new_string(&self, value: &CStr) -> Option<Bound<'py, PyAny>> {
        Some(PyString::new_bound(self.py, &value.to_string_lossy()).into_any())
    }

    fn new_double_array(&self, array_type: &Bound<'py, PyType>, values: &[f64]) -> Result<Bound<'py, PyAny>, BridgeError> {
        // array('d', bytes) goes through frombytes(): one memcpy, native endianness.
        let bytes = PyBytes::new_bound(self.py, bytemuck::cast_slice(values));
        array_type
            .call1(("d", bytes))
            .map_err(|e| self.marshal_error(e, "double array"))
    }

    fn set_element(&self, array: &Bound<'py, PyAny>, index: usize, value: Bound<'py, PyAny>) -> Result<(), BridgeError> {
        array
            .set_item(index, value)
            .map_err(|e| self.marshal_error(e, "result element"))
    }

    fn new_record(
        &self,
        record_type: &Bound<'py, PyType>,
        start: i64,
        end: i64,
        step: i64,
        columns: Bound<'py, PyAny>,
        values: Bound<'py, PyAny>,
    ) -> Result<Bound<'py, PyAny>, BridgeError> {
        record_type
            .call1((start, end, step, columns, values))
            .map_err(|e| self.marshal_error(e, "the result record"))
    }
}

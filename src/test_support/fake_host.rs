//! An allocation-tracking host used by the unit tests.
//!
//! Type references are the stable type names themselves; host strings are
//! `String`s and views are `CString`s. Every acquisition, release and
//! allocation is counted so tests can assert exact balance, and individual
//! calls can be made to fail by ordinal.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString};
use std::rc::Rc;

use crate::error::BridgeError;
use crate::traits::HostEnv;
use crate::types::RecordSchema;

/// Test code run from inside `seq_item`, before the element is returned.
pub struct SeqItemHook(Box<dyn Fn(usize)>);

impl std::fmt::Debug for SeqItemHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SeqItemHook")
    }
}

/// A failure "raised" into the fake host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub type_name: String,
    pub message: String,
}

/// A record built through `new_record`.
#[derive(Debug, Clone)]
pub struct FakeRecord {
    pub record_type: &'static str,
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub columns: FakeObject,
    pub values: FakeObject,
}

#[derive(Debug, Clone)]
pub enum FakeObject {
    Str(String),
    Array {
        element_type: &'static str,
        slots: Rc<RefCell<Vec<Option<FakeObject>>>>,
    },
    Doubles(Vec<f64>),
    Record(Rc<FakeRecord>),
}

impl FakeObject {
    /// The elements of a string array. Panics on any other shape.
    pub fn strings(&self) -> Vec<String> {
        match self {
            FakeObject::Array { slots, .. } => slots
                .borrow()
                .iter()
                .map(|slot| match slot {
                    Some(FakeObject::Str(s)) => s.clone(),
                    other => panic!("expected a string slot, found {:?}", other),
                })
                .collect(),
            other => panic!("expected an array, found {:?}", other),
        }
    }

    /// The columns of an array of double arrays. Panics on any other shape.
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        match self {
            FakeObject::Array { slots, .. } => slots
                .borrow()
                .iter()
                .map(|slot| match slot {
                    Some(FakeObject::Doubles(values)) => values.clone(),
                    other => panic!("expected a double array slot, found {:?}", other),
                })
                .collect(),
            other => panic!("expected an array, found {:?}", other),
        }
    }

    pub fn record(&self) -> Rc<FakeRecord> {
        match self {
            FakeObject::Record(record) => Rc::clone(record),
            other => panic!("expected a record, found {:?}", other),
        }
    }
}

/// Builds a host string sequence in which every element is a string.
pub fn seq(items: &[&str]) -> Vec<Option<String>> {
    items.iter().map(|s| Some(s.to_string())).collect()
}

#[derive(Debug, Default)]
pub struct FakeHost {
    missing_types: Vec<&'static str>,
    constructor_signature: Option<String>,
    looked_up: RefCell<Vec<&'static str>>,

    fail_acquire_on: Option<usize>,
    acquire_calls: Cell<usize>,
    acquired: Cell<usize>,
    released: RefCell<Vec<String>>,

    fail_new_string_on: Option<usize>,
    new_string_calls: Cell<usize>,
    fail_object_array_on: Option<usize>,
    object_array_calls: Cell<usize>,
    fail_double_array_on: Option<usize>,
    reject_double_array_on: Option<usize>,
    double_array_calls: Cell<usize>,
    fail_record: bool,
    records_built: Cell<usize>,
    seq_item_hook: Option<SeqItemHook>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Configuration ---

    pub fn without_type(mut self, name: &'static str) -> Self {
        self.missing_types.push(name);
        self
    }

    /// Makes the record type report this constructor signature.
    pub fn with_constructor_signature(mut self, signature: &str) -> Self {
        self.constructor_signature = Some(signature.to_string());
        self
    }

    /// The `k`-th (1-based) call to `acquire_utf` reports exhaustion.
    pub fn fail_acquire_on(mut self, k: usize) -> Self {
        self.fail_acquire_on = Some(k);
        self
    }

    pub fn fail_new_string_on(mut self, k: usize) -> Self {
        self.fail_new_string_on = Some(k);
        self
    }

    pub fn fail_object_array_on(mut self, k: usize) -> Self {
        self.fail_object_array_on = Some(k);
        self
    }

    pub fn fail_double_array_on(mut self, k: usize) -> Self {
        self.fail_double_array_on = Some(k);
        self
    }

    /// The `k`-th call to `new_double_array` fails for a reason other than
    /// memory, the way a broken `array` type would.
    pub fn reject_double_array_on(mut self, k: usize) -> Self {
        self.reject_double_array_on = Some(k);
        self
    }

    /// Runs `hook(index)` every time an argument element is read.
    pub fn on_seq_item(mut self, hook: impl Fn(usize) + 'static) -> Self {
        self.seq_item_hook = Some(SeqItemHook(Box::new(hook)));
        self
    }

    pub fn fail_record(mut self) -> Self {
        self.fail_record = true;
        self
    }

    // --- Observation ---

    pub fn looked_up_types(&self) -> Vec<&'static str> {
        self.looked_up.borrow().clone()
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.get()
    }

    pub fn released_count(&self) -> usize {
        self.released.borrow().len()
    }

    /// Views acquired but not yet released.
    pub fn outstanding_views(&self) -> usize {
        self.acquired_count() - self.released_count()
    }

    /// The released values, in release order.
    pub fn released_values(&self) -> Vec<String> {
        self.released.borrow().clone()
    }

    pub fn double_arrays_requested(&self) -> usize {
        self.double_array_calls.get()
    }

    pub fn records_built(&self) -> usize {
        self.records_built.get()
    }

    fn tick(counter: &Cell<usize>, fail_on: Option<usize>) -> bool {
        let n = counter.get() + 1;
        counter.set(n);
        fail_on == Some(n)
    }
}

impl HostEnv for FakeHost {
    type TypeRef = &'static str;
    type Str = String;
    type StrSeq = Vec<Option<String>>;
    type Utf = CString;
    type Object = FakeObject;
    type Failure = Failure;

    fn find_type(&self, name: &'static str) -> Result<&'static str, Failure> {
        self.looked_up.borrow_mut().push(name);
        if self.missing_types.contains(&name) {
            return Err(Failure {
                type_name: "builtins.LookupError".to_string(),
                message: format!("no type named {}", name),
            });
        }
        Ok(name)
    }

    fn has_constructor(&self, _record_type: &&'static str, schema: &RecordSchema) -> Result<bool, Failure> {
        Ok(self
            .constructor_signature
            .as_deref()
            .map_or(true, |sig| sig == schema.text_signature()))
    }

    fn raise(&self, exception_type: &&'static str, message: &str) -> Failure {
        Failure {
            type_name: exception_type.to_string(),
            message: message.to_string(),
        }
    }

    fn seq_len(&self, seq: &Vec<Option<String>>) -> Result<usize, BridgeError> {
        Ok(seq.len())
    }

    fn seq_item(
        &self,
        seq: &Vec<Option<String>>,
        index: usize,
        argument: &'static str,
    ) -> Result<String, BridgeError> {
        if let Some(SeqItemHook(hook)) = &self.seq_item_hook {
            hook(index);
        }
        seq.get(index)
            .cloned()
            .flatten()
            .ok_or_else(|| BridgeError::InvalidArgument {
                argument,
                message: format!("{}[{}] must be a str.", argument, index),
            })
    }

    fn acquire_utf(&self, value: &String, argument: &'static str) -> Result<CString, BridgeError> {
        if Self::tick(&self.acquire_calls, self.fail_acquire_on) {
            return Err(BridgeError::ResourceExhausted("fake host refused a string view".to_string()));
        }
        let view = CString::new(value.as_str()).map_err(|_| BridgeError::InvalidArgument {
            argument,
            message: format!("{} contains an embedded NUL byte.", argument),
        })?;
        self.acquired.set(self.acquired.get() + 1);
        Ok(view)
    }

    fn release_utf(&self, value: &String, view: CString) {
        assert_eq!(view.as_bytes(), value.as_bytes(), "view released against the wrong string");
        assert!(self.outstanding_views() > 0, "released more views than were acquired");
        self.released.borrow_mut().push(value.clone());
    }

    fn new_object_array(&self, element_type: &&'static str, len: usize) -> Option<FakeObject> {
        if Self::tick(&self.object_array_calls, self.fail_object_array_on) {
            return None;
        }
        Some(FakeObject::Array {
            element_type: *element_type,
            slots: Rc::new(RefCell::new(vec![None; len])),
        })
    }

    fn new_string(&self, value: &CStr) -> Option<FakeObject> {
        if Self::tick(&self.new_string_calls, self.fail_new_string_on) {
            return None;
        }
        Some(FakeObject::Str(value.to_string_lossy().into_owned()))
    }

    fn new_double_array(&self, _array_type: &&'static str, values: &[f64]) -> Result<FakeObject, BridgeError> {
        let call = self.double_array_calls.get() + 1;
        if Self::tick(&self.double_array_calls, self.fail_double_array_on) {
            return Err(BridgeError::ResourceExhausted(
                "failed to allocate memory for double array".to_string(),
            ));
        }
        if self.reject_double_array_on == Some(call) {
            return Err(BridgeError::FfiError("double array: TypeError: bad typecode".to_string()));
        }
        Ok(FakeObject::Doubles(values.to_vec()))
    }

    fn set_element(&self, array: &FakeObject, index: usize, value: FakeObject) -> Result<(), BridgeError> {
        match array {
            FakeObject::Array { slots, .. } => {
                let mut slots = slots.borrow_mut();
                let slot = slots
                    .get_mut(index)
                    .ok_or_else(|| BridgeError::FfiError(format!("index {} out of range", index)))?;
                *slot = Some(value);
                Ok(())
            }
            other => Err(BridgeError::FfiError(format!("not an array: {:?}", other))),
        }
    }

    fn new_record(
        &self,
        record_type: &&'static str,
        start: i64,
        end: i64,
        step: i64,
        columns: FakeObject,
        values: FakeObject,
    ) -> Result<FakeObject, BridgeError> {
        if self.fail_record {
            return Err(BridgeError::ResourceExhausted("fake host refused the record".to_string()));
        }
        self.records_built.set(self.records_built.get() + 1);
        Ok(FakeObject::Record(Rc::new(FakeRecord {
            record_type: *record_type,
            start,
            end,
            step,
            columns,
            values,
        })))
    }
}

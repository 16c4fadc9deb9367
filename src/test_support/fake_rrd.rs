//! A call-counting stand-in for librrd.
//!
//! It emulates the thread-global error channel, records every argument it is
//! handed, and returns fetch/export buffers allocated with `libc::malloc`
//! exactly like librrd does. Every buffer is tracked; freeing an unknown
//! pointer or freeing twice panics.

use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_ulong, c_void};
use std::ptr;

use hashbrown::HashSet;

use crate::native::{NativeTime, RawFetchOutput, RrdApi};

/// What the next fetch/export call hands back.
#[derive(Debug, Clone)]
pub struct ScriptedSeries {
    pub start: NativeTime,
    pub end: NativeTime,
    pub step: c_ulong,
    pub legends: Vec<String>,
    /// Row-major, `legends.len()` values per row.
    pub values: Vec<f64>,
}

impl ScriptedSeries {
    /// One series, `(end - start) / step` rows of `0.0, 1.0, ...`.
    pub fn single(start: NativeTime, end: NativeTime, step: c_ulong, legend: &str) -> Self {
        let rows = ((end - start) as c_ulong / step) as usize;
        Self {
            start,
            end,
            step,
            legends: vec![legend.to_string()],
            values: (0..rows).map(|i| i as f64).collect(),
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Succeed,
    /// Return -1 with the error flag set to this text.
    Fail(String),
    /// Return -1 without touching the error flag.
    FailSilently,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedCall {
    pub entry_point: &'static str,
    pub filename: Option<String>,
    pub template: Option<String>,
    pub cf: Option<String>,
    pub argv: Vec<String>,
    pub pdp_step: c_ulong,
    pub last_up: NativeTime,
    pub request: Option<(NativeTime, NativeTime, c_ulong)>,
    /// Whether the error flag was already clear when the call started.
    pub error_clear_on_entry: bool,
}

#[derive(Debug)]
pub struct FakeRrd {
    outcome: RefCell<Outcome>,
    series: RefCell<Option<ScriptedSeries>>,
    reverse_argv: bool,

    error: RefCell<Option<String>>,
    context_inits: Cell<usize>,
    clear_calls: Cell<usize>,
    calls: RefCell<Vec<RecordedCall>>,

    live: RefCell<HashSet<usize>>,
    freed: Cell<usize>,
}

impl Default for FakeRrd {
    fn default() -> Self {
        Self {
            outcome: RefCell::new(Outcome::Succeed),
            series: RefCell::new(None),
            reverse_argv: false,
            error: RefCell::new(None),
            context_inits: Cell::new(0),
            clear_calls: Cell::new(0),
            calls: RefCell::new(Vec::new()),
            live: RefCell::new(HashSet::new()),
            freed: Cell::new(0),
        }
    }
}

impl FakeRrd {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Scripting ---

    pub fn with_series(self, series: ScriptedSeries) -> Self {
        *self.series.borrow_mut() = Some(series);
        self
    }

    /// The next entry-point call fails and leaves `message` in the error state.
    pub fn failing_with(self, message: &str) -> Self {
        *self.outcome.borrow_mut() = Outcome::Fail(message.to_string());
        self
    }

    /// The next entry-point call fails without setting the error state.
    pub fn failing_silently(self) -> Self {
        *self.outcome.borrow_mut() = Outcome::FailSilently;
        self
    }

    /// Leaves an error from some earlier, unrelated call in the error state.
    pub fn with_stale_error(self, message: &str) -> Self {
        *self.error.borrow_mut() = Some(message.to_string());
        self
    }

    /// `xport` reverses its argv in place, the way getopt may permute it.
    pub fn permuting_argv(mut self) -> Self {
        self.reverse_argv = true;
        self
    }

    // --- Observation ---

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Number of entry-point calls (create/update/fetch/xport).
    pub fn native_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("no entry point was called"))
    }

    pub fn context_inits(&self) -> usize {
        self.context_inits.get()
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.get()
    }

    pub fn error_is_set(&self) -> bool {
        self.error.borrow().is_some()
    }

    /// Buffers handed out and not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn freed_count(&self) -> usize {
        self.freed.get()
    }

    // --- Internals ---

    fn begin(&self, entry_point: &'static str) -> RecordedCall {
        RecordedCall {
            entry_point,
            error_clear_on_entry: self.error.borrow().is_none(),
            ..RecordedCall::default()
        }
    }

    fn finish(&self, call: RecordedCall) -> c_int {
        self.calls.borrow_mut().push(call);
        let outcome = self.outcome.replace(Outcome::Succeed);
        match outcome {
            Outcome::Succeed => 0,
            Outcome::Fail(message) => {
                *self.error.borrow_mut() = Some(message);
                -1
            }
            Outcome::FailSilently => -1,
        }
    }

    fn malloc(&self, size: usize) -> *mut c_void {
        let ptr = unsafe { libc::malloc(size.max(1)) };
        assert!(!ptr.is_null(), "malloc failed in the fake");
        self.live.borrow_mut().insert(ptr as usize);
        ptr
    }

    fn fill_output(&self, output: &mut RawFetchOutput) {
        let series = self
            .series
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("fetch/xport succeeded without a scripted series"));

        let legends = self.malloc(series.legends.len() * std::mem::size_of::<*mut c_char>()) as *mut *mut c_char;
        for (i, legend) in series.legends.iter().enumerate() {
            let bytes = legend.as_bytes();
            let text = self.malloc(bytes.len() + 1) as *mut u8;
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), text, bytes.len());
                *text.add(bytes.len()) = 0;
                *legends.add(i) = text as *mut c_char;
            }
        }

        let data = self.malloc(series.values.len() * std::mem::size_of::<f64>()) as *mut f64;
        unsafe { ptr::copy_nonoverlapping(series.values.as_ptr(), data, series.values.len()) };

        output.start = series.start;
        output.end = series.end;
        output.step = series.step;
        output.column_count = series.legends.len() as c_ulong;
        output.legends = legends;
        output.data = data;
    }
}

unsafe fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

unsafe fn read_argv(argc: c_int, argv: *const *const c_char) -> Vec<String> {
    (0..argc as usize)
        .map(|i| read_str(*argv.add(i)).unwrap_or_else(|| panic!("argv[{}] is null", i)))
        .collect()
}

impl RrdApi for FakeRrd {
    fn get_context(&self) {
        self.context_inits.set(self.context_inits.get() + 1);
    }

    unsafe fn create(
        &self,
        filename: *const c_char,
        pdp_step: c_ulong,
        last_up: NativeTime,
        argc: c_int,
        argv: *const *const c_char,
    ) -> c_int {
        let mut call = self.begin("rrd_create_r");
        call.filename = read_str(filename);
        call.pdp_step = pdp_step;
        call.last_up = last_up;
        call.argv = read_argv(argc, argv);
        self.finish(call)
    }

    unsafe fn update(
        &self,
        filename: *const c_char,
        template: *const c_char,
        argc: c_int,
        argv: *const *const c_char,
    ) -> c_int {
        let mut call = self.begin("rrd_update_r");
        call.filename = read_str(filename);
        call.template = read_str(template);
        call.argv = read_argv(argc, argv);
        self.finish(call)
    }

    unsafe fn fetch(&self, filename: *const c_char, cf: *const c_char, output: &mut RawFetchOutput) -> c_int {
        let mut call = self.begin("rrd_fetch_r");
        call.filename = read_str(filename);
        call.cf = read_str(cf);
        call.request = Some((output.start, output.end, output.step));
        let rc = self.finish(call);
        if rc == 0 {
            self.fill_output(output);
        }
        rc
    }

    unsafe fn xport(&self, argc: c_int, argv: *mut *mut c_char, output: &mut RawFetchOutput) -> c_int {
        let mut call = self.begin("rrd_xport");
        call.argv = read_argv(argc, argv as *const *const c_char);
        if self.reverse_argv && argc > 1 {
            std::slice::from_raw_parts_mut(argv, argc as usize).reverse();
        }
        let rc = self.finish(call);
        if rc == 0 {
            self.fill_output(output);
        }
        rc
    }

    fn test_error(&self) -> bool {
        self.error.borrow().is_some()
    }

    fn error_message(&self) -> String {
        self.error.borrow().clone().unwrap_or_default()
    }

    fn clear_error(&self) {
        self.clear_calls.set(self.clear_calls.get() + 1);
        *self.error.borrow_mut() = None;
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        if ptr.is_null() {
            return;
        }
        let known = self.live.borrow_mut().remove(&(ptr as usize));
        assert!(known, "free of a pointer the fake never handed out (or a double free)");
        self.freed.set(self.freed.get() + 1);
        libc::free(ptr);
    }
}

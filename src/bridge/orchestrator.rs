// In: src/bridge/orchestrator.rs

//! The four boundary operations.
//!
//! Every operation runs the same phases: resolve host types, reject absent
//! inputs, marshal inputs into guards, clear stale native error state, call
//! librrd, then either translate the failure or marshal the outputs. Guards
//! release everything they hold on every path out of these functions.

use log::{debug, trace};

use crate::bridge::error_translator::translate_failure;
use crate::bridge::output::NativeFetchOutput;
use crate::config::TimeConversion;
use crate::error::BridgeError;
use crate::kernels::narrowing::{fetch_step_to_native, pdp_step_to_native, to_native_time};
use crate::marshal::{strings_to_host, values_to_matrix, NativeString, NativeStringArray};
use crate::native::{RawFetchOutput, RrdApi};
use crate::traits::HostEnv;
use crate::types::TypeHandleSet;

/// Binds a librrd implementation to a host runtime for one caller.
pub struct Bridge<'a, R: RrdApi + ?Sized, H: HostEnv> {
    rrd: &'a R,
    host: &'a H,
    time_conversion: TimeConversion,
}

impl<'a, R: RrdApi + ?Sized, H: HostEnv> Bridge<'a, R, H> {
    pub fn new(rrd: &'a R, host: &'a H, time_conversion: TimeConversion) -> Self {
        Self {
            rrd,
            host,
            time_conversion,
        }
    }

    //==============================================================================
    // 1. Public Operations
    //==============================================================================

    /// Runs librrd's per-thread context initializer for the calling thread.
    pub fn init_thread_context(&self) {
        self.rrd.get_context();
        debug!("initialized rrd context for thread {:?}", std::thread::current().id());
    }

    /// `rrd_create_r(filename, pdp_step, last_up, argc, argv)`.
    pub fn create(
        &self,
        filename: Option<&H::Str>,
        pdp_step: i64,
        last_up: i64,
        argv: Option<&H::StrSeq>,
    ) -> Result<(), H::Failure> {
        let types = TypeHandleSet::resolve(self.host)?;
        self.create_inner(filename, pdp_step, last_up, argv)
            .map_err(|err| types.raise(self.host, &err))
    }

    /// `rrd_update_r(filename, template, argc, argv)`. `template` may be absent.
    pub fn update(
        &self,
        filename: Option<&H::Str>,
        template: Option<&H::Str>,
        argv: Option<&H::StrSeq>,
    ) -> Result<(), H::Failure> {
        let types = TypeHandleSet::resolve(self.host)?;
        self.update_inner(filename, template, argv)
            .map_err(|err| types.raise(self.host, &err))
    }

    /// `rrd_fetch_r` over `[start, end]` at resolution `step`, returned as a
    /// result record.
    pub fn fetch(
        &self,
        filename: Option<&H::Str>,
        cf: Option<&H::Str>,
        start: i64,
        end: i64,
        step: i64,
    ) -> Result<H::Object, H::Failure> {
        let types = TypeHandleSet::resolve(self.host)?;
        types.require_record_constructor(self.host)?;
        self.fetch_inner(&types, filename, cf, start, end, step)
            .map_err(|err| types.raise(self.host, &err))
    }

    /// `rrd_xport(argc, argv, ...)`, returned as a result record.
    pub fn xport(&self, argv: Option<&H::StrSeq>) -> Result<H::Object, H::Failure> {
        let types = TypeHandleSet::resolve(self.host)?;
        types.require_record_constructor(self.host)?;
        self.xport_inner(&types, argv)
            .map_err(|err| types.raise(self.host, &err))
    }

    //==============================================================================
    // 2. Operation Bodies
    //==============================================================================

    fn create_inner(
        &self,
        filename: Option<&H::Str>,
        pdp_step: i64,
        last_up: i64,
        argv: Option<&H::StrSeq>,
    ) -> Result<(), BridgeError> {
        let filename = filename.ok_or_else(|| BridgeError::null_argument("filename"))?;
        let argv = argv.ok_or_else(|| BridgeError::null_argument("argv"))?;
        let pdp_step = pdp_step_to_native(pdp_step)?;
        let last_up = to_native_time(last_up, self.time_conversion, "start")?;

        let filename = NativeString::acquire(self.host, filename, "filename")?;
        let mut args = NativeStringArray::from_host(self.host, argv, "argv")?;
        let argc = args.argc()?;

        self.rrd.clear_error();
        // SAFETY: both guards keep their strings alive across the call and
        // `args` holds exactly `argc` pointers.
        let rc = unsafe {
            self.rrd
                .create(filename.as_ptr(), pdp_step, last_up, argc, args.as_ptr())
        };
        args.release();
        drop(filename);

        if rc != 0 {
            return Err(translate_failure(self.rrd, "rrd_create_r"));
        }
        Ok(())
    }

    fn update_inner(
        &self,
        filename: Option<&H::Str>,
        template: Option<&H::Str>,
        argv: Option<&H::StrSeq>,
    ) -> Result<(), BridgeError> {
        let filename = filename.ok_or_else(|| BridgeError::null_argument("filename"))?;
        let argv = argv.ok_or_else(|| BridgeError::null_argument("argv"))?;

        let filename = NativeString::acquire(self.host, filename, "filename")?;
        let template = template
            .map(|t| NativeString::acquire(self.host, t, "template"))
            .transpose()?;
        let mut args = NativeStringArray::from_host(self.host, argv, "argv")?;
        let argc = args.argc()?;

        let template_ptr = template.as_ref().map_or(std::ptr::null(), |t| t.as_ptr());

        self.rrd.clear_error();
        // SAFETY: as in `create_inner`; a null template is allowed.
        let rc = unsafe {
            self.rrd
                .update(filename.as_ptr(), template_ptr, argc, args.as_ptr())
        };
        args.release();
        drop(template);
        drop(filename);

        if rc != 0 {
            return Err(translate_failure(self.rrd, "rrd_update_r"));
        }
        Ok(())
    }

    fn fetch_inner(
        &self,
        types: &TypeHandleSet<H::TypeRef>,
        filename: Option<&H::Str>,
        cf: Option<&H::Str>,
        start: i64,
        end: i64,
        step: i64,
    ) -> Result<H::Object, BridgeError> {
        let filename = filename.ok_or_else(|| BridgeError::null_argument("filename"))?;
        let cf = cf.ok_or_else(|| BridgeError::null_argument("cf"))?;
        let start = to_native_time(start, self.time_conversion, "start")?;
        let end = to_native_time(end, self.time_conversion, "end")?;
        let step = fetch_step_to_native(step)?;

        let filename = NativeString::acquire(self.host, filename, "filename")?;
        let cf = NativeString::acquire(self.host, cf, "cf")?;
        let mut raw = RawFetchOutput::request(start, end, step);

        self.rrd.clear_error();
        // SAFETY: both strings outlive the call; `raw` is a valid out-struct.
        let rc = unsafe { self.rrd.fetch(filename.as_ptr(), cf.as_ptr(), &mut raw) };
        drop(cf);
        drop(filename);

        if rc != 0 {
            return Err(translate_failure(self.rrd, "rrd_fetch_r"));
        }

        let output = NativeFetchOutput::new(self.rrd, raw);
        self.build_record(types, &output, "rrd_fetch_r")
    }

    fn xport_inner(
        &self,
        types: &TypeHandleSet<H::TypeRef>,
        argv: Option<&H::StrSeq>,
    ) -> Result<H::Object, BridgeError> {
        let argv = argv.ok_or_else(|| BridgeError::null_argument("argv"))?;

        let mut args = NativeStringArray::from_host(self.host, argv, "argv")?;
        let argc = args.argc()?;
        let mut raw = RawFetchOutput::default();

        self.rrd.clear_error();
        // SAFETY: `args` holds exactly `argc` pointers to live strings. librrd
        // may permute the pointer array; release goes through the guard's own
        // record of what it acquired.
        let rc = unsafe { self.rrd.xport(argc, args.as_mut_ptr(), &mut raw) };
        args.release();

        if rc != 0 {
            return Err(translate_failure(self.rrd, "rrd_xport"));
        }

        let output = NativeFetchOutput::new(self.rrd, raw);
        self.build_record(types, &output, "rrd_xport")
    }

    //==============================================================================
    // 3. Result Assembly
    //==============================================================================

    /// Marshals a successful output into a result record. `output` is freed by
    /// the caller's guard whether or not this succeeds.
    fn build_record(
        &self,
        types: &TypeHandleSet<H::TypeRef>,
        output: &NativeFetchOutput<'_, R>,
        operation: &'static str,
    ) -> Result<H::Object, BridgeError> {
        let (columns, rows) = output.shape(operation)?;
        let start = output.adjusted_start(operation)?;
        let step = output.step(operation)?;
        trace!(
            "{}: {} columns x {} rows, start={} end={} step={}",
            operation,
            columns,
            rows,
            start,
            output.end(),
            step
        );

        let legends = strings_to_host(self.host, types, output.legends(columns, operation)?)?;
        let values = values_to_matrix(
            self.host,
            types,
            output.values(columns, rows, operation)?,
            columns,
            rows,
        )?;

        self.host
            .new_record(&types.record, start, output.end(), step, legends, values)
    }
}

// In: src/bridge/output.rs

//! Ownership of the buffers `rrd_fetch_r` and `rrd_xport` hand back.

use std::ffi::CStr;
use std::os::raw::c_void;

use crate::error::BridgeError;
use crate::kernels::narrowing::from_native_time;
use crate::kernels::transpose::matrix_len;
use crate::native::{RawFetchOutput, RrdApi};

/// Owns a successful fetch/export output until dropped.
///
/// Dropping frees every legend string, the legend array and the value buffer,
/// each exactly once, through librrd's allocator. This runs whether or not
/// marshaling the output into host objects succeeded.
pub struct NativeFetchOutput<'r, R: RrdApi + ?Sized> {
    rrd: &'r R,
    raw: RawFetchOutput,
}

impl<'r, R: RrdApi + ?Sized> NativeFetchOutput<'r, R> {
    /// Takes ownership of the buffers in `raw`. Only call after the entry
    /// point reported success.
    pub fn new(rrd: &'r R, raw: RawFetchOutput) -> Self {
        Self { rrd, raw }
    }

    fn invalid(operation: &'static str, what: &str) -> BridgeError {
        BridgeError::NativeOperation {
            operation,
            message: format!("{}() returned {}.", operation, what),
        }
    }

    pub fn start(&self) -> i64 {
        from_native_time(self.raw.start)
    }

    pub fn end(&self) -> i64 {
        from_native_time(self.raw.end)
    }

    pub fn step(&self, operation: &'static str) -> Result<i64, BridgeError> {
        i64::try_from(self.raw.step).map_err(|_| Self::invalid(operation, "a step too large to represent"))
    }

    /// `start + step`: librrd reports the timestamp *before* the first row.
    pub fn adjusted_start(&self, operation: &'static str) -> Result<i64, BridgeError> {
        self.start()
            .checked_add(self.step(operation)?)
            .ok_or_else(|| Self::invalid(operation, "a start time too large to adjust"))
    }

    /// `(columns, rows)` of the value buffer, with `rows = (end - start) / step`.
    ///
    /// Bounds that cannot describe a matrix are a native failure, never an
    /// out-of-range read.
    pub fn shape(&self, operation: &'static str) -> Result<(usize, usize), BridgeError> {
        let step = u64::from(self.raw.step);
        if step == 0 {
            return Err(Self::invalid(operation, "a zero step"));
        }
        let span = self
            .end()
            .checked_sub(self.start())
            .filter(|span| *span >= 0)
            .ok_or_else(|| Self::invalid(operation, "an end time before its start time"))?;

        let rows = usize::try_from(span as u64 / step)
            .map_err(|_| Self::invalid(operation, "more rows than can be addressed"))?;
        let columns = usize::try_from(self.raw.column_count)
            .map_err(|_| Self::invalid(operation, "more columns than can be addressed"))?;
        matrix_len(columns, rows).ok_or_else(|| Self::invalid(operation, "more values than can be addressed"))?;

        Ok((columns, rows))
    }

    /// The first `columns` legends, in order. A null legend reads as empty.
    pub fn legends(
        &self,
        columns: usize,
        operation: &'static str,
    ) -> Result<impl ExactSizeIterator<Item = &CStr> + '_, BridgeError> {
        let slots: &[*mut std::os::raw::c_char] = if columns == 0 {
            &[]
        } else if self.raw.legends.is_null() {
            return Err(Self::invalid(operation, "no legends"));
        } else {
            // SAFETY: librrd returned `column_count` legend slots, and
            // `shape` bounds `columns` by that count.
            unsafe { std::slice::from_raw_parts(self.raw.legends, columns) }
        };

        Ok(slots.iter().map(|&ptr| {
            if ptr.is_null() {
                <&CStr>::default()
            } else {
                // SAFETY: each non-null legend is a NUL-terminated string
                // owned by `self` until drop.
                unsafe { CStr::from_ptr(ptr) }
            }
        }))
    }

    /// The row-major value buffer, `columns * rows` long.
    pub fn values(&self, columns: usize, rows: usize, operation: &'static str) -> Result<&[f64], BridgeError> {
        let len = matrix_len(columns, rows)
            .ok_or_else(|| Self::invalid(operation, "more values than can be addressed"))?;
        if len == 0 {
            return Ok(&[]);
        }
        if self.raw.data.is_null() {
            return Err(Self::invalid(operation, "no data"));
        }
        // SAFETY: librrd sizes `data` as column_count * rows doubles for the
        // bounds it returned, which is what `shape` derived `len` from.
        Ok(unsafe { std::slice::from_raw_parts(self.raw.data, len) })
    }
}

impl<R: RrdApi + ?Sized> Drop for NativeFetchOutput<'_, R> {
    fn drop(&mut self) {
        let legends = std::mem::replace(&mut self.raw.legends, std::ptr::null_mut());
        if !legends.is_null() {
            for i in 0..self.raw.column_count as usize {
                // SAFETY: `legends` holds `column_count` slots owned by us.
                unsafe {
                    let legend = *legends.add(i);
                    self.rrd.free(legend as *mut c_void);
                }
            }
            unsafe { self.rrd.free(legends as *mut c_void) };
        }

        let data = std::mem::replace(&mut self.raw.data, std::ptr::null_mut());
        // `free` ignores null.
        unsafe { self.rrd.free(data as *mut c_void) };
    }
}

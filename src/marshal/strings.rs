// In: src/marshal/strings.rs

//! Host strings <-> native NUL-terminated byte strings.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::error::BridgeError;
use crate::traits::HostEnv;
use crate::types::TypeHandleSet;

//==================================================================================
// I. Single String Views
//==================================================================================

/// A native view of one host string, released on drop.
pub struct NativeString<'a, H: HostEnv> {
    host: &'a H,
    source: &'a H::Str,
    view: Option<H::Utf>,
}

impl<'a, H: HostEnv> NativeString<'a, H> {
    pub fn acquire(host: &'a H, source: &'a H::Str, argument: &'static str) -> Result<Self, BridgeError> {
        let view = host.acquire_utf(source, argument)?;
        Ok(Self {
            host,
            source,
            view: Some(view),
        })
    }

    /// Valid until `self` is dropped.
    pub fn as_ptr(&self) -> *const c_char {
        self.view
            .as_ref()
            .map_or(std::ptr::null(), |view| view.as_ref().as_ptr())
    }
}

impl<H: HostEnv> Drop for NativeString<'_, H> {
    fn drop(&mut self) {
        if let Some(view) = self.view.take() {
            self.host.release_utf(self.source, view);
        }
    }
}

//==================================================================================
// II. String Arrays (host -> native)
//==================================================================================

/// A native `const char **` built from a host string sequence.
///
/// Either every slot holds a view acquired from the host, or construction
/// failed and every view acquired so far was released before the error was
/// returned. `acquired` is the explicit record of what must be released.
pub struct NativeStringArray<'a, H: HostEnv> {
    host: &'a H,
    acquired: Vec<(H::Str, H::Utf)>,
    pointers: Vec<*const c_char>,
}

impl<'a, H: HostEnv> NativeStringArray<'a, H> {
    /// Marshals `seq` element by element. An empty sequence yields a valid,
    /// empty array.
    pub fn from_host(host: &'a H, seq: &H::StrSeq, argument: &'static str) -> Result<Self, BridgeError> {
        let len = host.seq_len(seq)?;
        let mut array = Self::with_capacity(host, len)?;

        for index in 0..len {
            // On any error `array` drops here and releases the prefix it holds.
            let item = host.seq_item(seq, index, argument)?;
            let view = host
                .acquire_utf(&item, argument)
                .map_err(|e| match e {
                    BridgeError::ResourceExhausted(_) => BridgeError::ResourceExhausted(
                        "failed to allocate memory for string".to_string(),
                    ),
                    other => other,
                })?;
            array.push(item, view);
        }

        Ok(array)
    }

    fn with_capacity(host: &'a H, len: usize) -> Result<Self, BridgeError> {
        let exhausted = |_| BridgeError::ResourceExhausted("failed to allocate memory for array".to_string());

        let mut acquired = Vec::new();
        acquired.try_reserve_exact(len).map_err(exhausted)?;
        let mut pointers = Vec::new();
        pointers.try_reserve_exact(len).map_err(exhausted)?;

        Ok(Self {
            host,
            acquired,
            pointers,
        })
    }

    fn push(&mut self, item: H::Str, view: H::Utf) {
        // Capacity was reserved exactly, so neither vector reallocates here.
        self.pointers.push(view.as_ref().as_ptr());
        self.acquired.push((item, view));
    }

    /// Number of views currently held.
    pub fn len(&self) -> usize {
        self.acquired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acquired.is_empty()
    }

    /// The element count as librrd's `argc`.
    pub fn argc(&self) -> Result<c_int, BridgeError> {
        c_int::try_from(self.len()).map_err(|_| BridgeError::out_of_bounds("argv"))
    }

    pub fn as_ptr(&self) -> *const *const c_char {
        self.pointers.as_ptr()
    }

    /// For `rrd_xport`, which takes a mutable `char **` and may reorder it.
    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.pointers.as_mut_ptr() as *mut *mut c_char
    }

    /// Releases every acquired view, then the pointer array. Safe to call more
    /// than once; later calls find nothing left to release.
    pub fn release(&mut self) {
        self.pointers.clear();
        // Release goes through `acquired`, never `pointers`, which librrd may
        // have permuted.
        for (item, view) in self.acquired.drain(..) {
            self.host.release_utf(&item, view);
        }
        self.pointers.shrink_to(0);
        self.acquired.shrink_to(0);
    }
}

impl<H: HostEnv> Drop for NativeStringArray<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

//==================================================================================
// III. String Arrays (native -> host)
//==================================================================================

/// Builds a host string array from native strings. The native strings stay
/// owned by the caller.
pub fn strings_to_host<'s, H, I>(
    host: &H,
    types: &TypeHandleSet<H::TypeRef>,
    strings: I,
) -> Result<H::Object, BridgeError>
where
    H: HostEnv,
    I: ExactSizeIterator<Item = &'s CStr>,
{
    let array = host.new_object_array(&types.string, strings.len()).ok_or_else(|| {
        BridgeError::ResourceExhausted("failed to allocate memory for string array".to_string())
    })?;

    for (index, value) in strings.enumerate() {
        let host_string = host.new_string(value).ok_or_else(|| {
            BridgeError::ResourceExhausted("failed to allocate memory for string reference".to_string())
        })?;
        host.set_element(&array, index, host_string)?;
    }

    Ok(array)
}

//==================================================================================
// IV. Unit Tests
//==================================================================================

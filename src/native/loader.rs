// In: src/native/loader.rs

//! Runtime loading of librrd.
//!
//! The library is opened with `libloading` and every entry point is resolved
//! up front, so a missing symbol fails the load instead of the first call.
//! Search order: the configured `library_path`, then each search directory
//! crossed with each library name and file-name pattern, then the platform's
//! own loader as a last resort.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_ulong, c_void};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use hashbrown::HashSet;
use libloading::Library;
use log::{debug, info, trace};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::native::sys::{
    ClearErrorFn, CreateFn, FetchFn, GetContextFn, GetErrorFn, NativeTime, TestErrorFn, UpdateFn,
    XportFn,
};
use crate::native::{RawFetchOutput, RrdApi};

/// File-name prefixes tried for every library name, most specific first.
const PREFIXES: [&str; 2] = ["lib", ""];
/// File-name suffixes; the versioned sonames cover installs without a dev symlink.
const SUFFIXES: [&str; 4] = [".so", ".so.8", ".so.4", ".dylib"];

/// A loaded librrd with all entry points resolved.
pub struct LibRrd {
    path: PathBuf,
    get_context: GetContextFn,
    create_r: CreateFn,
    update_r: UpdateFn,
    fetch_r: FetchFn,
    xport: XportFn,
    test_error: TestErrorFn,
    get_error: GetErrorFn,
    clear_error: ClearErrorFn,
    // Keeps the function pointers above valid; must outlive them.
    _library: Library,
}

impl std::fmt::Debug for LibRrd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibRrd").field("path", &self.path).finish()
    }
}

impl LibRrd {
    /// Opens the library at `path` and resolves every entry point.
    pub fn open(path: &Path) -> Result<Self, BridgeError> {
        // SAFETY: loading librrd runs its initializers, which have no
        // preconditions beyond a sane process environment.
        let library = unsafe { Library::new(path) }?;
        Self::from_library(library, path.to_path_buf())
    }

    fn from_library(library: Library, path: PathBuf) -> Result<Self, BridgeError> {
        // SAFETY: each symbol is cast to the signature declared in librrd's rrd.h.
        let (get_context, create_r, update_r, fetch_r, xport, test_error, get_error, clear_error) = unsafe {
            (
                *library.get::<GetContextFn>(b"rrd_get_context\0")?,
                *library.get::<CreateFn>(b"rrd_create_r\0")?,
                *library.get::<UpdateFn>(b"rrd_update_r\0")?,
                *library.get::<FetchFn>(b"rrd_fetch_r\0")?,
                *library.get::<XportFn>(b"rrd_xport\0")?,
                *library.get::<TestErrorFn>(b"rrd_test_error\0")?,
                *library.get::<GetErrorFn>(b"rrd_get_error\0")?,
                *library.get::<ClearErrorFn>(b"rrd_clear_error\0")?,
            )
        };

        Ok(Self {
            path,
            get_context,
            create_r,
            update_r,
            fetch_r,
            xport,
            test_error,
            get_error,
            clear_error,
            _library: library,
        })
    }

    /// Finds and opens librrd according to `config`.
    pub fn load(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let mut last_error: Option<BridgeError> = None;

        if let Some(path) = &config.library_path {
            debug!(
                "library_path set to '{}'. Attempting to load rrd library from this location.",
                path.display()
            );
            match Self::open(path) {
                Ok(lib) => {
                    info!("Successfully loaded rrd library from {}.", path.display());
                    return Ok(lib);
                }
                Err(e) => {
                    debug!("Failed to load {}: {}. Searching library paths.", path.display(), e);
                    last_error = Some(e);
                }
            }
        }

        for candidate in candidate_paths(config) {
            if !candidate.is_file() {
                continue;
            }
            match Self::open(&candidate) {
                Ok(lib) => {
                    info!("Successfully loaded rrd library from {}.", candidate.display());
                    return Ok(lib);
                }
                Err(e) => {
                    trace!("Failed to load rrd library from file {}: {}", candidate.display(), e);
                    last_error = Some(e);
                }
            }
        }

        debug!("Unable to locate librrd in common paths. Falling back to the system loader.");
        for name in &config.library_names {
            let file_name = libloading::library_filename(name);
            // SAFETY: as in `open`.
            match unsafe { Library::new(&file_name) } {
                Ok(library) => {
                    let lib = Self::from_library(library, PathBuf::from(&file_name))?;
                    info!("Successfully loaded rrd library {:?} via the system loader.", file_name);
                    return Ok(lib);
                }
                Err(e) => last_error = Some(e.into()),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::LibraryLoad("no candidate library names configured".to_string())
        }))
    }

    /// The process-wide library, loaded on first use with `config`.
    ///
    /// Later calls return the already loaded library whatever config they pass.
    pub fn shared(config: &BridgeConfig) -> Result<&'static LibRrd, BridgeError> {
        static LIBRARY: OnceLock<LibRrd> = OnceLock::new();
        static LOAD_LOCK: Mutex<()> = Mutex::new(());

        if let Some(lib) = LIBRARY.get() {
            return Ok(lib);
        }
        let _guard = LOAD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(lib) = LIBRARY.get() {
            return Ok(lib);
        }
        let lib = Self::load(config)?;
        Ok(LIBRARY.get_or_init(|| lib))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Every file the directory search would try, in order, without duplicates.
/// Existence is not checked here.
pub fn candidate_paths(config: &BridgeConfig) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut candidates = Vec::new();

    for dir in &config.search_paths {
        for name in &config.library_names {
            for prefix in PREFIXES {
                for suffix in SUFFIXES {
                    let candidate = dir.join(format!("{}{}{}", prefix, name, suffix));
                    if seen.insert(candidate.clone()) {
                        candidates.push(candidate);
                    }
                }
            }
        }
    }
    candidates
}

impl RrdApi for LibRrd {
    fn get_context(&self) {
        // SAFETY: no arguments; allocates the calling thread's context.
        unsafe {
            (self.get_context)();
        }
    }

    unsafe fn create(
        &self,
        filename: *const c_char,
        pdp_step: c_ulong,
        last_up: NativeTime,
        argc: c_int,
        argv: *const *const c_char,
    ) -> c_int {
        (self.create_r)(filename, pdp_step, last_up, argc, argv)
    }

    unsafe fn update(
        &self,
        filename: *const c_char,
        template: *const c_char,
        argc: c_int,
        argv: *const *const c_char,
    ) -> c_int {
        (self.update_r)(filename, template, argc, argv)
    }

    unsafe fn fetch(
        &self,
        filename: *const c_char,
        cf: *const c_char,
        output: &mut RawFetchOutput,
    ) -> c_int {
        (self.fetch_r)(
            filename,
            cf,
            &mut output.start,
            &mut output.end,
            &mut output.step,
            &mut output.column_count,
            &mut output.legends,
            &mut output.data,
        )
    }

    unsafe fn xport(
        &self,
        argc: c_int,
        argv: *mut *mut c_char,
        output: &mut RawFetchOutput,
    ) -> c_int {
        // Unused by librrd, but the out-parameter must be valid.
        let mut xsize: c_int = 0;
        (self.xport)(
            argc,
            argv,
            &mut xsize,
            &mut output.start,
            &mut output.end,
            &mut output.step,
            &mut output.column_count,
            &mut output.legends,
            &mut output.data,
        )
    }

    fn test_error(&self) -> bool {
        // SAFETY: reads the calling thread's context.
        unsafe { (self.test_error)() != 0 }
    }

    fn error_message(&self) -> String {
        // SAFETY: librrd returns a pointer into the thread context's error
        // buffer, NUL-terminated; it is copied and never freed here.
        unsafe {
            let message = (self.get_error)();
            if message.is_null() {
                String::new()
            } else {
                CStr::from_ptr(message).to_string_lossy().into_owned()
            }
        }
    }

    fn clear_error(&self) {
        // SAFETY: resets the calling thread's context.
        unsafe { (self.clear_error)() }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        // librrd allocates its results with the C allocator.
        libc::free(ptr)
    }
}

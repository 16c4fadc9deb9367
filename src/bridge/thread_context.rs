// In: src/bridge/thread_context.rs

//! Per-thread record of which librrd instances have had `rrd_get_context`
//! run on the current thread.
//!
//! librrd keeps its error buffer in thread-local storage that each library
//! instance sets up on its own, so the record is keyed by the library file.

use hashbrown::HashSet;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

thread_local! {
    static READY: RefCell<HashSet<PathBuf>> = RefCell::new(HashSet::new());
}

/// Runs `init` unless `library` is already initialized on this thread.
/// Returns whether `init` ran.
pub fn ensure_thread_context(library: &Path, init: impl FnOnce()) -> bool {
    if is_thread_context_ready(library) {
        return false;
    }
    init();
    mark_thread_context_ready(library);
    true
}

/// Records that `library` was initialized on this thread by an explicit call.
pub fn mark_thread_context_ready(library: &Path) {
    READY.with(|ready| {
        ready.borrow_mut().insert(library.to_path_buf());
    });
}

pub fn is_thread_context_ready(library: &Path) -> bool {
    READY.with(|ready| ready.borrow().contains(library))
}

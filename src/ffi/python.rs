// In: src/ffi/python.rs

use log::{info, LevelFilter};
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyIOError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyString};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;

use crate::bridge::thread_context::{ensure_thread_context, mark_thread_context_ready};
use crate::bridge::{xport_argv, Bridge};
use crate::config::{BridgeConfig, TimeConversion};
use crate::ffi::host_adapter::PyHost;
use crate::native::LibRrd;

create_exception!(
    rrd_bridge,
    RrdError,
    PyException,
    "Raised when an rrd operation fails or is given invalid arguments."
);

// Exports hold the GIL from argument marshaling to record construction and
// nothing here releases it, so librrd's export path never runs twice at once.

fn init_context_for(library: &LibRrd, bridge: &Bridge<'_, LibRrd, PyHost<'_>>) {
    ensure_thread_context(library.path(), || bridge.init_thread_context());
}

fn shared_library() -> PyResult<(&'static LibRrd, TimeConversion)> {
    let config = BridgeConfig::from_env()?;
    Ok((LibRrd::shared(&config)?, config.time_conversion))
}

//==================================================================================
// I. Result Record
//==================================================================================

/// The result of a fetch or export: `values[i]` is the series named
/// `columns[i]`, sampled every `step` seconds from `start` to `end`.
#[pyclass(name = "FetchResults", module = "rrd_bridge", frozen)]
pub struct PyFetchResults {
    start: i64,
    end: i64,
    step: i64,
    columns: PyObject,
    values: PyObject,
}

#[pymethods]
impl PyFetchResults {
    #[new]
    #[pyo3(
        signature = (start, end, step, columns, values),
        text_signature = "(start, end, step, columns, values)"
    )]
    fn new(start: i64, end: i64, step: i64, columns: PyObject, values: PyObject) -> Self {
        Self {
            start,
            end,
            step,
            columns,
            values,
        }
    }

    #[getter]
    fn start(&self) -> i64 {
        self.start
    }

    #[getter]
    fn end(&self) -> i64 {
        self.end
    }

    #[getter]
    fn step(&self) -> i64 {
        self.step
    }

    #[getter]
    fn columns(&self, py: Python<'_>) -> PyObject {
        self.columns.clone_ref(py)
    }

    #[getter]
    fn values(&self, py: Python<'_>) -> PyObject {
        self.values.clone_ref(py)
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        Ok(format!(
            "FetchResults(start={}, end={}, step={}, columns={})",
            self.start,
            self.end,
            self.step,
            self.columns.bind(py).repr()?
        ))
    }
}

//==================================================================================
// II. Stateful Client (The recommended approach)
//==================================================================================

enum LoadedLibrary {
    Shared(&'static LibRrd),
    Owned(LibRrd),
}

impl LoadedLibrary {
    fn get(&self) -> &LibRrd {
        match self {
            LoadedLibrary::Shared(lib) => lib,
            LoadedLibrary::Owned(lib) => lib,
        }
    }
}

#[pyclass(name = "Rrd", module = "rrd_bridge")]
pub struct PyRrd {
    library: LoadedLibrary,
    time_conversion: TimeConversion,
}

#[pymethods]
impl PyRrd {
    /// Opens librrd.
    ///
    /// Without `library_path` the process-wide library located through
    /// `BridgeConfig::from_env` is used. `time_conversion` is `"checked"`
    /// (reject timestamps the native `time_t` cannot hold) or `"truncate"`.
    #[new]
    #[pyo3(signature = (library_path = None, time_conversion = "checked"))]
    fn new(library_path: Option<PathBuf>, time_conversion: &str) -> PyResult<Self> {
        let time_conversion = TimeConversion::parse(time_conversion)?;
        let library = match library_path {
            Some(path) => LoadedLibrary::Owned(LibRrd::open(&path)?),
            None => LoadedLibrary::Shared(LibRrd::shared(&BridgeConfig::from_env()?)?),
        };
        info!("rrd client using {}", library.get().path().display());
        Ok(Self {
            library,
            time_conversion,
        })
    }

    #[getter]
    fn library_path(&self) -> PathBuf {
        self.library.get().path().to_path_buf()
    }

    #[pyo3(signature = (filename, step, start, argv))]
    fn create(
        &self,
        py: Python<'_>,
        filename: Option<Bound<'_, PyString>>,
        step: i64,
        start: i64,
        argv: Option<Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        let host = PyHost::new(py);
        let bridge = Bridge::new(self.library.get(), &host, self.time_conversion);
        init_context_for(self.library.get(), &bridge);
        bridge.create(filename.as_ref(), step, start, argv.as_ref())
    }

    #[pyo3(signature = (filename, template, argv))]
    fn update(
        &self,
        py: Python<'_>,
        filename: Option<Bound<'_, PyString>>,
        template: Option<Bound<'_, PyString>>,
        argv: Option<Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        let host = PyHost::new(py);
        let bridge = Bridge::new(self.library.get(), &host, self.time_conversion);
        init_context_for(self.library.get(), &bridge);
        bridge.update(filename.as_ref(), template.as_ref(), argv.as_ref())
    }

    #[pyo3(signature = (filename, cf, start, end, step = 1))]
    fn fetch(
        &self,
        py: Python<'_>,
        filename: Option<Bound<'_, PyString>>,
        cf: Option<Bound<'_, PyString>>,
        start: i64,
        end: i64,
        step: i64,
    ) -> PyResult<PyObject> {
        let host = PyHost::new(py);
        let bridge = Bridge::new(self.library.get(), &host, self.time_conversion);
        init_context_for(self.library.get(), &bridge);
        bridge
            .fetch(filename.as_ref(), cf.as_ref(), start, end, step)
            .map(Bound::unbind)
    }

    /// Exports `defs` (DEF/CDEF/XPORT statements) over `[start, end]`.
    /// `maxrows <= 0` leaves the row count to librrd.
    #[pyo3(signature = (start, end, step, maxrows, argv))]
    fn xport(
        &self,
        py: Python<'_>,
        start: i64,
        end: i64,
        step: i64,
        maxrows: i64,
        argv: Vec<String>,
    ) -> PyResult<PyObject> {
        let full = xport_argv(start, end, step, maxrows, &argv);
        let seq = pyo3::types::PyList::new_bound(py, full).into_any();
        self.xport_raw(py, Some(seq))
    }

    /// Exports with a caller-built argument vector, `argv[0]` included.
    #[pyo3(signature = (argv))]
    fn xport_raw(&self, py: Python<'_>, argv: Option<Bound<'_, PyAny>>) -> PyResult<PyObject> {
        let host = PyHost::new(py);
        let bridge = Bridge::new(self.library.get(), &host, self.time_conversion);
        init_context_for(self.library.get(), &bridge);
        bridge.xport(argv.as_ref()).map(Bound::unbind)
    }

    fn __repr__(&self) -> String {
        format!(
            "Rrd(library_path={:?}, time_conversion={:?})",
            self.library.get().path(),
            self.time_conversion
        )
    }
}

//==================================================================================
// III. Stateless Module Functions
//==================================================================================

/// Initializes librrd's context for the calling thread.
#[pyfunction]
#[pyo3(name = "init_thread_context")]
pub fn init_thread_context_py(py: Python<'_>) -> PyResult<()> {
    let (lib, time_conversion) = shared_library()?;
    let host = PyHost::new(py);
    Bridge::new(lib, &host, time_conversion).init_thread_context();
    mark_thread_context_ready(lib.path());
    Ok(())
}

#[pyfunction]
#[pyo3(name = "create", signature = (filename, step, start, argv))]
pub fn create_py(
    py: Python<'_>,
    filename: Option<Bound<'_, PyString>>,
    step: i64,
    start: i64,
    argv: Option<Bound<'_, PyAny>>,
) -> PyResult<()> {
    let (lib, time_conversion) = shared_library()?;
    let host = PyHost::new(py);
    Bridge::new(lib, &host, time_conversion).create(filename.as_ref(), step, start, argv.as_ref())
}

#[pyfunction]
#[pyo3(name = "update", signature = (filename, template, argv))]
pub fn update_py(
    py: Python<'_>,
    filename: Option<Bound<'_, PyString>>,
    template: Option<Bound<'_, PyString>>,
    argv: Option<Bound<'_, PyAny>>,
) -> PyResult<()> {
    let (lib, time_conversion) = shared_library()?;
    let host = PyHost::new(py);
    Bridge::new(lib, &host, time_conversion).update(filename.as_ref(), template.as_ref(), argv.as_ref())
}

#[pyfunction]
#[pyo3(name = "fetch", signature = (filename, cf, start, end, step))]
pub fn fetch_py(
    py: Python<'_>,
    filename: Option<Bound<'_, PyString>>,
    cf: Option<Bound<'_, PyString>>,
    start: i64,
    end: i64,
    step: i64,
) -> PyResult<PyObject> {
    let (lib, time_conversion) = shared_library()?;
    let host = PyHost::new(py);
    Bridge::new(lib, &host, time_conversion)
        .fetch(filename.as_ref(), cf.as_ref(), start, end, step)
        .map(Bound::unbind)
}

#[pyfunction]
#[pyo3(name = "xport", signature = (argv))]
pub fn xport_py(py: Python<'_>, argv: Option<Bound<'_, PyAny>>) -> PyResult<PyObject> {
    let (lib, time_conversion) = shared_library()?;
    let host = PyHost::new(py);
    Bridge::new(lib, &host, time_conversion)
        .xport(argv.as_ref())
        .map(Bound::unbind)
}

//==================================================================================
// IV. Logging
//==================================================================================

static INIT_LOGGER: Once = Once::new();

/// Routes the crate's `log` output through env_logger. Only the first call
/// takes effect.
#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    let file = match log_file {
        Some(filename) => Some(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&filename)
                .map_err(|e| PyIOError::new_err(format!("Could not open log file {}: {}", filename, e)))?,
        ),
        None => None,
    };
    let level = BridgeConfig::from_env()
        .ok()
        .and_then(|config| config.log_level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}

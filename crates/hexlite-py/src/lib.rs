use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use hexlite::{ColumnInfo, OpenOptions, Params, Row, RunResult, TransactionMode, Value};
use pyo3::exceptions::{PyMemoryError, PyOverflowError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{
	PyAny, PyBool, PyByteArray, PyBytes, PyDict, PyFloat, PyInt, PyList, PyMemoryView, PyString,
	PyTuple,
};

mod convert;
mod database;
mod errors;
mod statement;
mod transaction;

pub(crate) use convert::*;
pub(crate) use database::Database;
pub(crate) use errors::*;
pub(crate) use statement::Statement;
pub(crate) use transaction::TransactionFunction;

static ERROR_CONSTRUCTOR: OnceLock<Mutex<Option<Py<PyAny>>>> = OnceLock::new();

fn error_constructor() -> &'static Mutex<Option<Py<PyAny>>> {
	ERROR_CONSTRUCTOR.get_or_init(|| Mutex::new(None))
}

/// Registers the host's error class. It is stored for later use and never
/// consulted while executing statements.
#[pyfunction]
fn set_error_constructor(constructor: &Bound<'_, PyAny>) -> PyResult<()> {
	if !constructor.is_callable() {
		return Err(PyTypeError::new_err("Expected a constructor function"));
	}
	*error_constructor().lock().unwrap_or_else(PoisonError::into_inner) = Some(constructor.clone().unbind());
	Ok(())
}

#[pyfunction]
#[pyo3(signature = (filename, *, readonly = false, file_must_exist = false, timeout = 5000, buffer = None))]
fn open_database(
	py: Python<'_>,
	filename: &str,
	readonly: bool,
	file_must_exist: bool,
	timeout: u64,
	buffer: Option<&Bound<'_, PyAny>>,
) -> PyResult<Database> {
	let mut options = OpenOptions::new()
		.readonly(readonly)
		.file_must_exist(file_must_exist)
		.timeout(Duration::from_millis(timeout));
	if let Some(buffer) = buffer {
		options = options.buffer(bytes_from_py(buffer)?);
	}
	Database::open(py, filename, &options)
}

#[pyfunction]
fn sqlite_lib_version() -> String {
	hexlite::sqlite_lib_version()
}

#[pyfunction]
fn sqlite_source_id() -> String {
	hexlite::sqlite_source_id()
}

#[pymodule]
fn hexcore_sqlite3(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
	m.add_function(wrap_pyfunction!(set_error_constructor, m)?)?;
	m.add_function(wrap_pyfunction!(open_database, m)?)?;
	m.add_function(wrap_pyfunction!(sqlite_lib_version, m)?)?;
	m.add_function(wrap_pyfunction!(sqlite_source_id, m)?)?;

	m.add_class::<Database>()?;
	m.add_class::<Statement>()?;
	m.add_class::<TransactionFunction>()?;
	m.add("SqliteError", py.get_type::<SqliteError>())?;

	m.add("is_initialized", false)?;
	m.add("isInitialized", false)?;
	m.add("setErrorConstructor", m.getattr("set_error_constructor")?)?;
	m.add("openDatabase", m.getattr("open_database")?)?;
	m.add("SQLITE_VERSION", hexlite::sqlite_lib_version())?;
	Ok(())
}

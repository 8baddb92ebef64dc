use super::*;

pyo3::create_exception!(hexcore_sqlite3, SqliteError, pyo3::exceptions::PyException);

/// Converts a core failure into the matching Python exception. Engine
/// failures become `SqliteError` carrying the symbolic `code` and the
/// numeric `extended_code`.
pub(crate) fn to_py_err(py: Python<'_>, err: hexlite::Error) -> PyErr {
	match err {
		hexlite::Error::Type(message) => PyTypeError::new_err(message),
		hexlite::Error::Range(message) => PyOverflowError::new_err(message),
		hexlite::Error::OutOfMemory => PyMemoryError::new_err(hexlite::Error::OutOfMemory.to_string()),
		hexlite::Error::Sqlite { code, extended, message } => {
			sqlite_error(py, &code, extended, &message).unwrap_or_else(|failure| failure)
		}
	}
}

fn sqlite_error(py: Python<'_>, code: &str, extended: i32, message: &str) -> PyResult<PyErr> {
	let instance = py.get_type::<SqliteError>().call1((message,))?;
	instance.setattr("code", code)?;
	instance.setattr("extended_code", extended)?;
	Ok(PyErr::from_value(instance))
}

pub(crate) trait EngineResultExt<T> {
	fn into_py_result(self, py: Python<'_>) -> PyResult<T>;
}

impl<T> EngineResultExt<T> for hexlite::Result<T> {
	fn into_py_result(self, py: Python<'_>) -> PyResult<T> {
		self.map_err(|err| to_py_err(py, err))
	}
}

use super::*;

enum Failure {
	Engine(hexlite::Error),
	Host(PyErr),
}

impl From<hexlite::Error> for Failure {
	fn from(err: hexlite::Error) -> Self {
		Self::Engine(err)
	}
}

/// Callable returned by `Database.transaction(fn)`. Calling it runs `fn`
/// between `BEGIN` and `COMMIT`, rolling back if `fn` raises. Nested calls
/// use a savepoint.
#[pyclass(module = "hexcore_sqlite3", name = "TransactionFunction")]
pub(crate) struct TransactionFunction {
	database: Py<Database>,
	function: Py<PyAny>,
	mode: TransactionMode,
}

impl TransactionFunction {
	pub(crate) fn new(
		database: Py<Database>,
		function: &Bound<'_, PyAny>,
		mode: TransactionMode,
	) -> PyResult<Self> {
		if !function.is_callable() {
			return Err(PyTypeError::new_err("Expected a callable"));
		}
		Ok(Self { database, function: function.clone().unbind(), mode })
	}

	fn with_mode(&self, py: Python<'_>, mode: TransactionMode) -> Self {
		Self { database: self.database.clone_ref(py), function: self.function.clone_ref(py), mode }
	}
}

#[pymethods]
impl TransactionFunction {
	#[pyo3(signature = (*args, **kwargs))]
	fn __call__(
		&self,
		py: Python<'_>,
		args: &Bound<'_, PyTuple>,
		kwargs: Option<&Bound<'_, PyDict>>,
	) -> PyResult<Py<PyAny>> {
		let database = self.database.borrow(py);
		let function = self.function.bind(py);
		let outcome = database.inner().transaction(self.mode, |_| {
			function.call(args.clone(), kwargs).map(Bound::unbind).map_err(Failure::Host)
		});
		match outcome {
			Ok(value) => Ok(value),
			Err(Failure::Engine(err)) => Err(to_py_err(py, err)),
			Err(Failure::Host(err)) => Err(err),
		}
	}

	#[getter(deferred)]
	fn deferred(&self, py: Python<'_>) -> Self {
		self.with_mode(py, TransactionMode::Deferred)
	}

	#[getter(immediate)]
	fn immediate(&self, py: Python<'_>) -> Self {
		self.with_mode(py, TransactionMode::Immediate)
	}

	#[getter(exclusive)]
	fn exclusive(&self, py: Python<'_>) -> Self {
		self.with_mode(py, TransactionMode::Exclusive)
	}

	#[getter(database)]
	fn database(&self, py: Python<'_>) -> Py<Database> {
		self.database.clone_ref(py)
	}
}

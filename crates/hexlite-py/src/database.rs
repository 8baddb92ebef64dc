use super::*;

#[pyclass(module = "hexcore_sqlite3", name = "Database")]
pub(crate) struct Database {
	inner: hexlite::Database,
}

impl Database {
	pub(crate) fn open(py: Python<'_>, filename: &str, options: &OpenOptions) -> PyResult<Self> {
		let inner = py.detach(|| hexlite::Database::open_with(filename, options)).into_py_result(py)?;
		Ok(Self { inner })
	}

	pub(crate) const fn inner(&self) -> &hexlite::Database {
		&self.inner
	}
}

#[pymethods]
impl Database {
	#[new]
	#[pyo3(signature = (
		filename,
		filename_given = true,
		anonymous = false,
		readonly = false,
		file_must_exist = false,
		timeout = 5000,
		verbose = None,
		buffer = None
	))]
	#[expect(
		clippy::too_many_arguments,
		clippy::fn_params_excessive_bools,
		reason = "positional constructor shared with the host package"
	)]
	fn new(
		py: Python<'_>,
		filename: &str,
		filename_given: bool,
		anonymous: bool,
		readonly: bool,
		file_must_exist: bool,
		timeout: u64,
		verbose: Option<&Bound<'_, PyAny>>,
		buffer: Option<&Bound<'_, PyAny>>,
	) -> PyResult<Self> {
		let mut options = OpenOptions::new()
			.filename_given(filename_given)
			.anonymous(anonymous)
			.readonly(readonly)
			.file_must_exist(file_must_exist)
			.timeout(Duration::from_millis(timeout))
			.verbose(verbose.is_some_and(|verbose| !verbose.is_none()));
		if let Some(buffer) = buffer.filter(|buffer| !buffer.is_none()) {
			options = options.buffer(bytes_from_py(buffer)?);
		}
		Self::open(py, filename, &options)
	}

	fn prepare(&self, py: Python<'_>, sql: &str) -> PyResult<Statement> {
		let statement = self.inner.prepare(sql).into_py_result(py)?;
		Ok(Statement::from_inner(statement))
	}

	fn exec(slf: PyRef<'_, Self>, py: Python<'_>, sql: &str) -> PyResult<Py<Self>> {
		let db = &slf.inner;
		py.detach(|| db.exec(sql).map(|_| ())).into_py_result(py)?;
		Ok(slf.into())
	}

	fn close(slf: PyRef<'_, Self>) -> Py<Self> {
		slf.inner.close();
		slf.into()
	}

	/// Runs `PRAGMA <source>`. With `simple` set, returns the first column of
	/// the first row (`None` when there is no row), otherwise every row.
	#[pyo3(signature = (source, options = None, *, simple = false))]
	fn pragma(
		&self,
		py: Python<'_>,
		source: &str,
		options: Option<&Bound<'_, PyDict>>,
		simple: bool,
	) -> PyResult<Py<PyAny>> {
		let flag = options.map(|options| options.get_item("simple")).transpose()?.flatten();
		let simple = match flag {
			Some(flag) => simple || flag.is_truthy()?,
			None => simple,
		};

		if simple {
			return match self.inner.pragma_simple(source).into_py_result(py)? {
				Some(value) => value_to_py(py, &value),
				None => Ok(py.None()),
			};
		}
		let rows = self.inner.pragma(source).into_py_result(py)?;
		Ok(rows_to_py(py, &rows)?.unbind().into_any())
	}

	#[pyo3(signature = (path, entry_point = None))]
	fn load_extension(
		slf: PyRef<'_, Self>,
		py: Python<'_>,
		path: &str,
		entry_point: Option<&str>,
	) -> PyResult<Py<Self>> {
		slf.inner.load_extension(path, entry_point).into_py_result(py)?;
		Ok(slf.into())
	}

	#[pyo3(name = "loadExtension", signature = (path, entry_point = None))]
	fn load_extension_camel(
		slf: PyRef<'_, Self>,
		py: Python<'_>,
		path: &str,
		entry_point: Option<&str>,
	) -> PyResult<Py<Self>> {
		Self::load_extension(slf, py, path, entry_point)
	}

	#[pyo3(signature = (enabled = true))]
	fn default_safe_integers(slf: PyRef<'_, Self>, enabled: bool) -> Py<Self> {
		slf.inner.default_safe_integers(enabled);
		slf.into()
	}

	#[pyo3(name = "defaultSafeIntegers", signature = (enabled = true))]
	fn default_safe_integers_camel(slf: PyRef<'_, Self>, enabled: bool) -> Py<Self> {
		Self::default_safe_integers(slf, enabled)
	}

	/// Wraps `function` so each call runs inside a transaction.
	fn transaction(slf: PyRef<'_, Self>, function: &Bound<'_, PyAny>) -> PyResult<TransactionFunction> {
		TransactionFunction::new(slf.into(), function, TransactionMode::Deferred)
	}

	#[getter(name)]
	fn name(&self) -> String {
		self.inner.name().to_string()
	}

	#[getter(open)]
	fn open_state(&self) -> bool {
		self.inner.is_open()
	}

	#[getter(in_transaction)]
	fn in_transaction(&self) -> bool {
		self.inner.in_transaction()
	}

	#[getter(inTransaction)]
	fn in_transaction_camel(&self) -> bool {
		self.inner.in_transaction()
	}

	#[getter(readonly)]
	fn readonly(&self) -> bool {
		self.inner.readonly()
	}

	#[getter(memory)]
	fn memory(&self) -> bool {
		self.inner.memory()
	}

	fn __enter__(slf: PyRef<'_, Self>) -> Py<Self> {
		slf.into()
	}

	fn __exit__(
		&self,
		_etype: Option<&Bound<'_, PyAny>>,
		_evalue: Option<&Bound<'_, PyAny>>,
		_etraceback: Option<&Bound<'_, PyAny>>,
	) -> bool {
		self.inner.close();
		false
	}

	fn __repr__(&self) -> String {
		let state = if self.inner.is_open() { "open" } else { "closed" };
		format!("<Database {:?} {state}>", self.inner.name())
	}
}

use super::*;

#[pyclass(module = "hexcore_sqlite3", name = "Statement")]
pub(crate) struct Statement {
	inner: hexlite::Statement,
}

impl Statement {
	pub(crate) const fn from_inner(inner: hexlite::Statement) -> Self {
		Self { inner }
	}
}

#[pymethods]
impl Statement {
	#[new]
	#[pyo3(signature = (sql, database, inherited_safe_integers = None))]
	fn new(
		py: Python<'_>,
		sql: &str,
		database: PyRef<'_, Database>,
		inherited_safe_integers: Option<bool>,
	) -> PyResult<Self> {
		let mut inner = database.inner().prepare(sql).into_py_result(py)?;
		if let Some(enabled) = inherited_safe_integers {
			inner.safe_integers(enabled);
		}
		Ok(Self { inner })
	}

	#[pyo3(signature = (*args))]
	fn run(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<Py<PyDict>> {
		let params = params_from_args(args)?;
		let stmt = &self.inner;
		let result = py.detach(|| stmt.run(&params)).into_py_result(py)?;
		run_result_to_py(py, &result)
	}

	#[pyo3(signature = (*args))]
	fn get(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<Py<PyAny>> {
		let params = params_from_args(args)?;
		let stmt = &self.inner;
		match py.detach(|| stmt.get(&params)).into_py_result(py)? {
			Some(row) => row_to_py(py, &row),
			None => Ok(py.None()),
		}
	}

	#[pyo3(signature = (*args))]
	fn all(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<Py<PyList>> {
		let params = params_from_args(args)?;
		let stmt = &self.inner;
		let rows = py.detach(|| stmt.all(&params)).into_py_result(py)?;
		Ok(rows_to_py(py, &rows)?.unbind())
	}

	/// Collects every row up front and returns an iterator over them.
	#[pyo3(signature = (*args))]
	fn iterate(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<Py<PyAny>> {
		let params = params_from_args(args)?;
		let stmt = &self.inner;
		let rows = py.detach(|| stmt.iterate(&params)).into_py_result(py)?;
		Ok(rows_to_py(py, &rows)?.try_iter()?.unbind().into_any())
	}

	fn columns(&self, py: Python<'_>) -> PyResult<Vec<Py<PyDict>>> {
		let columns = self.inner.columns().into_py_result(py)?;
		columns.iter().map(|column| column_to_py(py, column)).collect()
	}

	#[pyo3(signature = (*args))]
	fn bind(slf: PyRef<'_, Self>, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<Py<Self>> {
		let params = params_from_args(args)?;
		slf.inner.bind(&params).into_py_result(py)?;
		Ok(slf.into())
	}

	#[pyo3(signature = (enabled = true))]
	fn safe_integers(mut slf: PyRefMut<'_, Self>, enabled: bool) -> Py<Self> {
		slf.inner.safe_integers(enabled);
		slf.into()
	}

	#[pyo3(name = "safeIntegers", signature = (enabled = true))]
	fn safe_integers_camel(slf: PyRefMut<'_, Self>, enabled: bool) -> Py<Self> {
		Self::safe_integers(slf, enabled)
	}

	#[pyo3(signature = (enabled = true))]
	fn raw(mut slf: PyRefMut<'_, Self>, enabled: bool) -> Py<Self> {
		slf.inner.raw(enabled);
		slf.into()
	}

	#[pyo3(signature = (enabled = true))]
	fn expand(mut slf: PyRefMut<'_, Self>, enabled: bool) -> Py<Self> {
		slf.inner.expand(enabled);
		slf.into()
	}

	#[getter(source)]
	fn source(&self) -> String {
		self.inner.source().to_string()
	}

	#[getter(reader)]
	fn reader(&self) -> bool {
		self.inner.reader()
	}

	#[getter(busy)]
	fn busy(&self) -> bool {
		self.inner.busy()
	}

	#[getter(readonly)]
	fn readonly(&self) -> bool {
		self.inner.readonly()
	}

	fn finalize(&self) {
		self.inner.finalize();
	}

	fn __repr__(&self) -> String {
		format!("<Statement {:?}>", self.inner.source())
	}
}

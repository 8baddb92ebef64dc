use super::*;

/// Reads a Python value into the bindable value domain.
///
/// `bool` and `int` bind as integers, `float` as a number (integral floats
/// inside the exact range are stored as integers), `str` as text and any
/// bytes-like object as a blob.
pub(crate) fn value_from_py(value: &Bound<'_, PyAny>) -> PyResult<Value> {
	if value.is_none() {
		return Ok(Value::Null);
	}
	if value.is_instance_of::<PyBool>() || value.is_instance_of::<PyInt>() {
		let integer = value
			.extract::<i128>()
			.map_err(|_| PyOverflowError::new_err(hexlite::BIGINT_TOO_LARGE))?;
		return Ok(Value::BigInt(integer));
	}
	if let Ok(number) = value.cast::<PyFloat>() {
		return Ok(Value::Number(number.value()));
	}
	if let Ok(text) = value.cast::<PyString>() {
		return Ok(Value::Text(text.to_str()?.to_owned()));
	}
	if is_bytes_like(value) {
		return Ok(Value::Blob(bytes_from_py(value)?));
	}
	Err(PyTypeError::new_err(hexlite::BAD_BIND_TYPE))
}

fn is_bytes_like(value: &Bound<'_, PyAny>) -> bool {
	value.is_instance_of::<PyBytes>()
		|| value.is_instance_of::<PyByteArray>()
		|| value.is_instance_of::<PyMemoryView>()
}

pub(crate) fn bytes_from_py(value: &Bound<'_, PyAny>) -> PyResult<Vec<u8>> {
	if let Ok(bytes) = value.cast::<PyBytes>() {
		return Ok(bytes.as_bytes().to_vec());
	}
	if let Ok(array) = value.cast::<PyByteArray>() {
		return Ok(array.to_vec());
	}
	if value.is_instance_of::<PyMemoryView>() {
		let copied = value.call_method0("tobytes")?;
		return Ok(copied.cast::<PyBytes>()?.as_bytes().to_vec());
	}
	Err(PyTypeError::new_err("Expected a bytes-like object"))
}

/// Interprets call arguments the way the statement methods accept them: a
/// single leading `dict` supplies named parameters, anything else is bound
/// positionally.
pub(crate) fn params_from_args(args: &Bound<'_, PyTuple>) -> PyResult<Params> {
	let first = args.get_item(0).ok();
	if let Some(named) = first.as_ref().and_then(|first| first.cast::<PyDict>().ok()) {
		let mut pairs = Vec::with_capacity(named.len());
		for (key, value) in named.iter() {
			let key = key
				.cast::<PyString>()
				.map_err(|_| PyTypeError::new_err("Named parameters must use string keys"))?;
			pairs.push((key.to_str()?.to_owned(), value_from_py(&value)?));
		}
		return Ok(Params::named(pairs));
	}

	let mut values = Vec::with_capacity(args.len());
	for arg in args.iter() {
		values.push(value_from_py(&arg)?);
	}
	Ok(Params::Positional(values))
}

pub(crate) fn value_to_py(py: Python<'_>, value: &Value) -> PyResult<Py<PyAny>> {
	Ok(match value {
		Value::Null => py.None(),
		Value::Number(number) => PyFloat::new(py, *number).unbind().into_any(),
		Value::BigInt(integer) => (*integer).into_pyobject(py)?.unbind().into_any(),
		Value::Text(text) => PyString::new(py, text).unbind().into_any(),
		Value::Blob(data) => PyBytes::new(py, data).unbind().into_any(),
	})
}

fn fields_to_py<'py>(py: Python<'py>, fields: &[(String, Value)]) -> PyResult<Bound<'py, PyDict>> {
	let dict = PyDict::new(py);
	for (name, value) in fields {
		dict.set_item(name, value_to_py(py, value)?)?;
	}
	Ok(dict)
}

/// Object rows become `dict`, raw rows `list`, expanded rows a `dict` of
/// per-table `dict`s.
pub(crate) fn row_to_py(py: Python<'_>, row: &Row) -> PyResult<Py<PyAny>> {
	Ok(match row {
		Row::Object(fields) => fields_to_py(py, fields)?.unbind().into_any(),
		Row::Array(values) => {
			let items = values.iter().map(|value| value_to_py(py, value)).collect::<PyResult<Vec<_>>>()?;
			PyList::new(py, items)?.unbind().into_any()
		}
		Row::Expanded(tables) => {
			let dict = PyDict::new(py);
			for (table, fields) in tables {
				dict.set_item(table, fields_to_py(py, fields)?)?;
			}
			dict.unbind().into_any()
		}
	})
}

pub(crate) fn rows_to_py<'py>(py: Python<'py>, rows: &[Row]) -> PyResult<Bound<'py, PyList>> {
	let items = rows.iter().map(|row| row_to_py(py, row)).collect::<PyResult<Vec<_>>>()?;
	PyList::new(py, items)
}

pub(crate) fn run_result_to_py(py: Python<'_>, result: &RunResult) -> PyResult<Py<PyDict>> {
	let dict = PyDict::new(py);
	dict.set_item("changes", result.changes)?;
	dict.set_item("lastInsertRowid", value_to_py(py, &result.last_insert_rowid)?)?;
	Ok(dict.unbind())
}

pub(crate) fn column_to_py(py: Python<'_>, column: &ColumnInfo) -> PyResult<Py<PyDict>> {
	let dict = PyDict::new(py);
	dict.set_item("name", &column.name)?;
	dict.set_item("column", column.column.as_deref())?;
	dict.set_item("table", column.table.as_deref())?;
	dict.set_item("database", column.database.as_deref())?;
	dict.set_item("type", column.r#type.as_deref())?;
	Ok(dict.unbind())
}

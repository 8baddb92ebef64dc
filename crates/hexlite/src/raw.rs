use core::ffi::{c_char, c_int, c_void};
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use crate::error::{
	BIGINT_TOO_LARGE, Error, NO_STATEMENT, Result, check_ok, db_error_message, sqlite_error,
	take_engine_message,
};
use crate::ffi;
use crate::value::{MAX_SAFE_INTEGER, Value};

/// An open engine connection. Closed with `sqlite3_close_v2` on drop.
pub(crate) struct RawConnection {
	db: NonNull<ffi::Sqlite3>,
}

// The handle is only ever touched under the owning database's mutex.
unsafe impl Send for RawConnection {}

impl RawConnection {
	pub(crate) fn open(filename: &str, flags: c_int) -> Result<Self> {
		let filename_c = CString::new(filename).map_err(|_| Error::nul_byte("database path"))?;

		let mut db: *mut ffi::Sqlite3 = std::ptr::null_mut();
		let code =
			unsafe { ffi::sqlite3_open_v2(filename_c.as_ptr(), &raw mut db, flags, std::ptr::null()) };
		if code != ffi::SQLITE_OK {
			let error = if db.is_null() {
				Error::engine(code, "Failed to open database")
			} else {
				let extended = unsafe { ffi::sqlite3_extended_errcode(db) };
				let error = Error::engine(extended, db_error_message(db));
				let _ = unsafe { ffi::sqlite3_close_v2(db) };
				error
			};
			return Err(error);
		}

		let db = NonNull::new(db).ok_or_else(|| Error::engine(ffi::SQLITE_MISUSE, "Failed to open database"))?;
		Ok(Self { db })
	}

	pub(crate) const fn as_ptr(&self) -> *mut ffi::Sqlite3 {
		self.db.as_ptr()
	}

	pub(crate) fn set_busy_timeout(&self, ms: c_int) -> Result<()> {
		let code = unsafe { ffi::sqlite3_busy_timeout(self.as_ptr(), ms) };
		check_ok(self.as_ptr(), code)
	}

	pub(crate) fn enable_extended_result_codes(&self) -> Result<()> {
		let code = unsafe { ffi::sqlite3_extended_result_codes(self.as_ptr(), 1) };
		check_ok(self.as_ptr(), code)
	}

	/// Raises the maximum string/blob length to the largest the engine accepts.
	/// The engine clamps the request to its compile-time ceiling.
	pub(crate) fn raise_length_limit(&self) {
		let _ = unsafe { ffi::sqlite3_limit(self.as_ptr(), ffi::SQLITE_LIMIT_LENGTH, c_int::MAX) };
	}

	/// Replaces the `main` schema with a copy of `image`. The copy is owned by
	/// the engine from here on and may grow.
	pub(crate) fn deserialize(&self, image: &[u8]) -> Result<()> {
		let len = i64::try_from(image.len()).map_err(|_| Error::OutOfMemory)?;
		let capacity = u64::try_from(image.len().max(1)).map_err(|_| Error::OutOfMemory)?;

		let data = unsafe { ffi::sqlite3_malloc64(capacity) }.cast::<u8>();
		if data.is_null() {
			return Err(Error::OutOfMemory);
		}
		unsafe { std::ptr::copy_nonoverlapping(image.as_ptr(), data, image.len()) };

		// FREEONCLOSE hands `data` to the engine, which frees it even on failure.
		let code = unsafe {
			ffi::sqlite3_deserialize(
				self.as_ptr(),
				c"main".as_ptr(),
				data,
				len,
				len,
				ffi::SQLITE_DESERIALIZE_FREEONCLOSE | ffi::SQLITE_DESERIALIZE_RESIZEABLE,
			)
		};
		check_ok(self.as_ptr(), code)
	}

	pub(crate) fn exec(&self, sql: &str) -> Result<()> {
		let sql_c = CString::new(sql).map_err(|_| Error::nul_byte("SQL"))?;

		let mut message: *mut c_char = std::ptr::null_mut();
		let code = unsafe {
			ffi::sqlite3_exec(self.as_ptr(), sql_c.as_ptr(), None, std::ptr::null_mut(), &raw mut message)
		};
		let message = take_engine_message(message);
		if code == ffi::SQLITE_OK {
			return Ok(());
		}

		Err(Error::engine(code, message.unwrap_or_else(|| db_error_message(self.as_ptr()))))
	}

	pub(crate) fn prepare(&self, sql: &str) -> Result<RawStatement> {
		let sql_c = CString::new(sql).map_err(|_| Error::nul_byte("SQL"))?;

		let mut stmt: *mut ffi::Sqlite3Stmt = std::ptr::null_mut();
		let code = unsafe {
			ffi::sqlite3_prepare_v2(
				self.as_ptr(),
				sql_c.as_ptr(),
				-1,
				&raw mut stmt,
				std::ptr::null_mut(),
			)
		};
		if code != ffi::SQLITE_OK {
			return Err(sqlite_error(self.as_ptr(), code));
		}

		// Whitespace or comments only.
		let stmt = NonNull::new(stmt).ok_or_else(|| Error::Type(NO_STATEMENT.to_string()))?;
		Ok(RawStatement { stmt, db: self.db })
	}

	pub(crate) fn enable_load_extension(&self) -> Result<()> {
		let enable: c_int = 1;
		let code = unsafe {
			ffi::sqlite3_db_config(
				self.as_ptr(),
				ffi::SQLITE_DBCONFIG_ENABLE_LOAD_EXTENSION,
				enable,
				std::ptr::null_mut::<c_int>(),
			)
		};
		check_ok(self.as_ptr(), code)
	}

	pub(crate) fn load_extension(&self, path: &str, entry_point: Option<&str>) -> Result<()> {
		let path_c = CString::new(path).map_err(|_| Error::nul_byte("extension path"))?;
		let entry_c =
			entry_point.map(CString::new).transpose().map_err(|_| Error::nul_byte("entry point"))?;

		let mut message: *mut c_char = std::ptr::null_mut();
		let code = unsafe {
			ffi::sqlite3_load_extension(
				self.as_ptr(),
				path_c.as_ptr(),
				entry_c.as_ref().map_or(std::ptr::null(), |entry| entry.as_ptr()),
				&raw mut message,
			)
		};
		let message = take_engine_message(message);
		if code == ffi::SQLITE_OK {
			return Ok(());
		}

		Err(Error::engine(code, message.unwrap_or_else(|| db_error_message(self.as_ptr()))))
	}

	pub(crate) fn autocommit(&self) -> bool {
		unsafe { ffi::sqlite3_get_autocommit(self.as_ptr()) != 0 }
	}

	pub(crate) fn changes(&self) -> i64 {
		unsafe { ffi::sqlite3_changes64(self.as_ptr()) }
	}

	pub(crate) fn last_insert_rowid(&self) -> i64 {
		unsafe { ffi::sqlite3_last_insert_rowid(self.as_ptr()) }
	}

	/// Closes the connection, reporting the engine's verdict instead of
	/// discarding it as `Drop` does.
	pub(crate) fn close(self) -> Result<()> {
		let this = ManuallyDrop::new(self);
		let code = unsafe { ffi::sqlite3_close_v2(this.as_ptr()) };
		if code == ffi::SQLITE_OK { Ok(()) } else { Err(Error::engine(code, "Failed to close database")) }
	}
}

impl Drop for RawConnection {
	fn drop(&mut self) {
		let _ = unsafe { ffi::sqlite3_close_v2(self.db.as_ptr()) };
	}
}

/// A compiled statement. Finalized on drop, which must happen before the
/// owning connection closes.
pub(crate) struct RawStatement {
	stmt: NonNull<ffi::Sqlite3Stmt>,
	db: NonNull<ffi::Sqlite3>,
}

// Guarded by the owning statement's mutex, itself nested in the database's.
unsafe impl Send for RawStatement {}

pub(crate) enum Step {
	Row,
	Done,
}

impl RawStatement {
	const fn as_ptr(&self) -> *mut ffi::Sqlite3Stmt {
		self.stmt.as_ptr()
	}

	const fn db(&self) -> *mut ffi::Sqlite3 {
		self.db.as_ptr()
	}

	/// Steps once. Failures carry the engine message captured before any reset.
	pub(crate) fn step(&mut self) -> Result<Step> {
		match unsafe { ffi::sqlite3_step(self.as_ptr()) } {
			ffi::SQLITE_ROW => Ok(Step::Row),
			ffi::SQLITE_DONE => Ok(Step::Done),
			code => Err(sqlite_error(self.db(), code)),
		}
	}

	/// Rewinds the cursor. The return value only repeats the last step error,
	/// which callers have already seen.
	pub(crate) fn reset(&mut self) {
		let _ = unsafe { ffi::sqlite3_reset(self.as_ptr()) };
	}

	pub(crate) fn clear_bindings(&mut self) {
		let _ = unsafe { ffi::sqlite3_clear_bindings(self.as_ptr()) };
	}

	pub(crate) fn parameter_count(&self) -> c_int {
		unsafe { ffi::sqlite3_bind_parameter_count(self.as_ptr()) }
	}

	/// Parameter name including its sigil; `None` for anonymous `?` slots.
	pub(crate) fn parameter_name(&self, index: c_int) -> Option<String> {
		let ptr = unsafe { ffi::sqlite3_bind_parameter_name(self.as_ptr(), index) };
		owned_string(ptr)
	}

	pub(crate) fn bind_value(&mut self, index: c_int, value: &Value) -> Result<()> {
		match value {
			Value::Null => self.bind_null(index),
			Value::Number(v) => bind_number(self, index, *v),
			Value::BigInt(v) => {
				let v = i64::try_from(*v).map_err(|_| Error::Range(BIGINT_TOO_LARGE.to_string()))?;
				self.bind_i64(index, v)
			}
			Value::Text(v) => self.bind_text(index, v),
			Value::Blob(v) => self.bind_blob(index, v),
		}
	}

	fn bind_null(&mut self, index: c_int) -> Result<()> {
		let code = unsafe { ffi::sqlite3_bind_null(self.as_ptr(), index) };
		check_ok(self.db(), code)
	}

	fn bind_i64(&mut self, index: c_int, value: i64) -> Result<()> {
		let code = unsafe { ffi::sqlite3_bind_int64(self.as_ptr(), index, value) };
		check_ok(self.db(), code)
	}

	fn bind_f64(&mut self, index: c_int, value: f64) -> Result<()> {
		let code = unsafe { ffi::sqlite3_bind_double(self.as_ptr(), index, value) };
		check_ok(self.db(), code)
	}

	fn bind_text(&mut self, index: c_int, value: &str) -> Result<()> {
		let len = u64::try_from(value.len()).map_err(|_| Error::Range("text parameter is too large".to_string()))?;

		let code = unsafe {
			ffi::sqlite3_bind_text64(
				self.as_ptr(),
				index,
				value.as_ptr().cast(),
				len,
				Some(sqlite_transient()),
				ffi::SQLITE_UTF8,
			)
		};
		check_ok(self.db(), code)
	}

	fn bind_blob(&mut self, index: c_int, value: &[u8]) -> Result<()> {
		let len = u64::try_from(value.len()).map_err(|_| Error::Range("blob parameter is too large".to_string()))?;

		// A null pointer would bind NULL rather than an empty blob.
		let ptr: *const c_void = if value.is_empty() { c"".as_ptr().cast() } else { value.as_ptr().cast() };
		let code = unsafe {
			ffi::sqlite3_bind_blob64(self.as_ptr(), index, ptr, len, Some(sqlite_transient()))
		};
		check_ok(self.db(), code)
	}

	pub(crate) fn column_count(&self) -> c_int {
		unsafe { ffi::sqlite3_column_count(self.as_ptr()) }
	}

	pub(crate) fn column_name(&self, index: c_int) -> String {
		let ptr = unsafe { ffi::sqlite3_column_name(self.as_ptr(), index) };
		owned_string(ptr).unwrap_or_default()
	}

	pub(crate) fn column_origin_name(&self, index: c_int) -> Option<String> {
		owned_string(unsafe { ffi::sqlite3_column_origin_name(self.as_ptr(), index) })
	}

	pub(crate) fn column_table_name(&self, index: c_int) -> Option<String> {
		owned_string(unsafe { ffi::sqlite3_column_table_name(self.as_ptr(), index) })
	}

	pub(crate) fn column_database_name(&self, index: c_int) -> Option<String> {
		owned_string(unsafe { ffi::sqlite3_column_database_name(self.as_ptr(), index) })
	}

	pub(crate) fn column_decltype(&self, index: c_int) -> Option<String> {
		owned_string(unsafe { ffi::sqlite3_column_decltype(self.as_ptr(), index) })
	}

	pub(crate) fn column_type(&self, index: c_int) -> c_int {
		unsafe { ffi::sqlite3_column_type(self.as_ptr(), index) }
	}

	/// Reads a column of the current row by its runtime storage class.
	pub(crate) fn column_value(&self, index: c_int, safe_integers: bool) -> Value {
		match self.column_type(index) {
			ffi::SQLITE_INTEGER => {
				let v = unsafe { ffi::sqlite3_column_int64(self.as_ptr(), index) };
				Value::from_integer(v, safe_integers)
			}
			ffi::SQLITE_FLOAT => Value::Number(unsafe { ffi::sqlite3_column_double(self.as_ptr(), index) }),
			ffi::SQLITE_TEXT => {
				let ptr = unsafe { ffi::sqlite3_column_text(self.as_ptr(), index) };
				let bytes = self.column_bytes(ptr.cast(), index);
				Value::Text(String::from_utf8_lossy(bytes).into_owned())
			}
			ffi::SQLITE_BLOB => {
				let ptr = unsafe { ffi::sqlite3_column_blob(self.as_ptr(), index) };
				Value::Blob(self.column_bytes(ptr.cast(), index).to_vec())
			}
			_ => Value::Null,
		}
	}

	/// Borrows `sqlite3_column_bytes` bytes at `ptr`. Must be called after the
	/// text/blob accessor that produced `ptr`.
	fn column_bytes(&self, ptr: *const u8, index: c_int) -> &[u8] {
		let len = unsafe { ffi::sqlite3_column_bytes(self.as_ptr(), index) };
		let len = usize::try_from(len).unwrap_or_default();
		if ptr.is_null() || len == 0 {
			return &[];
		}
		unsafe { std::slice::from_raw_parts(ptr, len) }
	}

	pub(crate) fn busy(&self) -> bool {
		unsafe { ffi::sqlite3_stmt_busy(self.as_ptr()) != 0 }
	}

	pub(crate) fn readonly(&self) -> bool {
		unsafe { ffi::sqlite3_stmt_readonly(self.as_ptr()) != 0 }
	}
}

impl Drop for RawStatement {
	fn drop(&mut self) {
		let _ = unsafe { ffi::sqlite3_finalize(self.stmt.as_ptr()) };
	}
}

/// Integral numbers inside the exact-double range bind as integers, anything
/// else as a double.
#[expect(
	clippy::float_cmp,
	clippy::cast_possible_truncation,
	clippy::cast_precision_loss,
	reason = "the truncation is checked against the original value"
)]
fn bind_number(stmt: &mut RawStatement, index: c_int, value: f64) -> Result<()> {
	let limit = MAX_SAFE_INTEGER as f64;
	if value.is_finite() && value.trunc() == value && (-limit..=limit).contains(&value) {
		stmt.bind_i64(index, value as i64)
	} else {
		stmt.bind_f64(index, value)
	}
}

fn owned_string(ptr: *const c_char) -> Option<String> {
	if ptr.is_null() {
		None
	} else {
		Some(unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() })
	}
}

fn sqlite_transient() -> unsafe extern "C" fn(*mut c_void) {
	unsafe { std::mem::transmute::<isize, unsafe extern "C" fn(*mut c_void)>(-1_isize) }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn memory() -> RawConnection {
		RawConnection::open(":memory:", ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE)
			.expect("open in-memory db")
	}

	#[test]
	fn blank_sql_has_no_statement() {
		let conn = memory();
		let Err(err) = conn.prepare("  -- nothing here\n") else {
			panic!("blank SQL must not prepare");
		};
		assert_eq!(err, Error::Type(NO_STATEMENT.to_string()));
	}

	#[test]
	fn integral_numbers_bind_as_integers() {
		let conn = memory();
		let mut stmt = conn.prepare("SELECT typeof(?), typeof(?), typeof(?)").expect("prepare");
		stmt.bind_value(1, &Value::Number(42.0)).expect("bind integral");
		stmt.bind_value(2, &Value::Number(1.5)).expect("bind fractional");
		stmt.bind_value(3, &Value::Number(1e300)).expect("bind huge");
		assert!(matches!(stmt.step().expect("step"), Step::Row));
		assert_eq!(stmt.column_value(0, false), Value::Text("integer".into()));
		assert_eq!(stmt.column_value(1, false), Value::Text("real".into()));
		assert_eq!(stmt.column_value(2, false), Value::Text("real".into()));
	}

	#[test]
	fn wide_bigint_is_a_range_error() {
		let conn = memory();
		let mut stmt = conn.prepare("SELECT ?").expect("prepare");
		let err = stmt.bind_value(1, &Value::BigInt(i128::from(i64::MAX) + 1)).expect_err("must not bind");
		assert_eq!(err, Error::Range(BIGINT_TOO_LARGE.to_string()));
	}

	#[test]
	fn empty_blob_is_not_null() {
		let conn = memory();
		let mut stmt = conn.prepare("SELECT typeof(?)").expect("prepare");
		stmt.bind_value(1, &Value::Blob(Vec::new())).expect("bind");
		assert!(matches!(stmt.step().expect("step"), Step::Row));
		assert_eq!(stmt.column_value(0, false), Value::Text("blob".into()));
	}

	#[test]
	fn text_with_interior_nul_round_trips() {
		let conn = memory();
		let mut stmt = conn.prepare("SELECT ?").expect("prepare");
		stmt.bind_value(1, &Value::Text("a\0b".into())).expect("bind");
		assert!(matches!(stmt.step().expect("step"), Step::Row));
		assert_eq!(stmt.column_value(0, false), Value::Text("a\0b".into()));
	}

	#[test]
	fn exec_reports_engine_message() {
		let conn = memory();
		let err = conn.exec("SELEKT 1").expect_err("syntax error");
		assert_eq!(err.code(), Some("SQLITE_ERROR"));
		assert!(err.to_string().contains("syntax error"));
	}

	#[test]
	fn close_reports_success() {
		memory().close().expect("close");
	}
}

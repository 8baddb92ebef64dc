use core::ffi::{c_char, c_int};
use std::ffi::CStr;

use crate::codes::code_string;
use crate::ffi;

pub const NOT_OPEN: &str = "The database connection is not open";
pub const FINALIZED: &str = "This statement has been finalized";
pub const BAD_BIND_TYPE: &str = "SQLite3 can only bind numbers, strings, bigints, buffers, and null";
pub const NO_STATEMENT: &str = "The supplied SQL string contains no statements";
pub const BIGINT_TOO_LARGE: &str = "BigInt value is too large to be represented as a 64-bit integer";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// Argument or state validation failed before the engine was involved.
	#[error("{0}")]
	Type(String),
	#[error("{0}")]
	Range(String),
	#[error("{message}")]
	Sqlite { code: String, extended: c_int, message: String },
	#[error("Out of memory")]
	OutOfMemory,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	pub(crate) fn not_open() -> Self {
		Self::Type(NOT_OPEN.to_string())
	}

	pub(crate) fn finalized() -> Self {
		Self::Type(FINALIZED.to_string())
	}

	pub(crate) fn nul_byte(what: &str) -> Self {
		Self::Type(format!("{what} contains a NUL byte"))
	}

	pub(crate) fn engine(code: c_int, message: impl Into<String>) -> Self {
		Self::Sqlite { code: code_string(code), extended: code, message: message.into() }
	}

	/// Symbolic engine code such as `SQLITE_CONSTRAINT_UNIQUE`, when the
	/// failure came from the engine.
	pub fn code(&self) -> Option<&str> {
		match self {
			Self::Sqlite { code, .. } => Some(code),
			_ => None,
		}
	}

	pub const fn extended_code(&self) -> Option<c_int> {
		match self {
			Self::Sqlite { extended, .. } => Some(*extended),
			_ => None,
		}
	}
}

pub(crate) fn check_ok(db: *mut ffi::Sqlite3, code: c_int) -> Result<()> {
	if code == ffi::SQLITE_OK { Ok(()) } else { Err(sqlite_error(db, code)) }
}

pub(crate) fn sqlite_error(db: *mut ffi::Sqlite3, code: c_int) -> Error {
	Error::engine(code, db_error_message(db))
}

pub(crate) fn db_error_message(db: *mut ffi::Sqlite3) -> String {
	if db.is_null() {
		return "SQLite error".to_string();
	}

	let message_ptr = unsafe { ffi::sqlite3_errmsg(db) };
	if message_ptr.is_null() {
		return "SQLite error".to_string();
	}

	unsafe { CStr::from_ptr(message_ptr).to_string_lossy().into_owned() }
}

/// Takes ownership of an engine-allocated message (from `exec` or
/// `load_extension`) and frees it.
pub(crate) fn take_engine_message(message: *mut c_char) -> Option<String> {
	if message.is_null() {
		return None;
	}

	let text = unsafe { CStr::from_ptr(message).to_string_lossy().into_owned() };
	unsafe { ffi::sqlite3_free(message.cast()) };
	Some(text)
}

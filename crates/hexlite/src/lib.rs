//! Synchronous SQLite bindings built around a `Database` that owns its
//! prepared `Statement`s: closing the database finalizes them, and values
//! cross the boundary in a host-shaped [`Value`] domain.

mod codes;
mod database;
mod error;
mod options;
mod raw;
mod statement;
mod transaction;
mod value;

pub use codes::{code_name, code_string};
pub use database::Database;
pub use error::{
	BAD_BIND_TYPE, BIGINT_TOO_LARGE, Error, FINALIZED, NO_STATEMENT, NOT_OPEN, Result,
};
pub use hexlite_sqlite_ffi::ffi;
pub use options::{DEFAULT_TIMEOUT, OpenOptions};
pub use statement::{EXPANDED_NO_TABLE, Statement};
pub use transaction::{Transaction, TransactionMode};
pub use value::{ColumnInfo, Fields, MAX_SAFE_INTEGER, Params, Row, RunResult, Value};

pub fn sqlite_lib_version() -> String {
	hexlite_sqlite_ffi::sqlite_lib_version()
}

pub fn sqlite_lib_version_number() -> i32 {
	hexlite_sqlite_ffi::sqlite_lib_version_number()
}

pub fn sqlite_source_id() -> String {
	hexlite_sqlite_ffi::sqlite_source_id()
}

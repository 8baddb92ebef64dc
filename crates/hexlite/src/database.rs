use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::ffi;
use crate::options::{OpenOptions, is_memory_name};
use crate::raw::{RawConnection, Step};
use crate::statement::{RowMode, Statement, StatementCell};
use crate::value::{Row, Value};

/// One connection plus the registry of statements prepared on it.
///
/// Closing (explicitly or by drop) finalizes every live statement before the
/// connection itself is released.
pub struct Database {
	shared: Arc<Shared>,
}

pub(crate) struct Shared {
	name: String,
	readonly: bool,
	memory: bool,
	default_safe_integers: AtomicBool,
	next_statement_id: AtomicU64,
	state: Mutex<DbState>,
}

pub(crate) struct DbState {
	pub(crate) conn: Option<RawConnection>,
	pub(crate) statements: HashMap<u64, Weak<StatementCell>>,
}

impl Shared {
	pub(crate) fn lock(&self) -> MutexGuard<'_, DbState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn default_safe_integers(&self) -> bool {
		self.default_safe_integers.load(Ordering::Relaxed)
	}

	/// Finalizes tracked statements, then closes the connection. Safe to call
	/// any number of times.
	fn shutdown(&self) {
		let mut state = self.lock();
		let Some(conn) = state.conn.take() else {
			return;
		};

		let statements: Vec<_> = state.statements.drain().map(|(_, cell)| cell).collect();
		debug!(name = %self.name, statements = statements.len(), "closing database");
		for cell in statements.iter().filter_map(Weak::upgrade) {
			cell.finalize_detached();
		}

		if let Err(err) = conn.close() {
			warn!(name = %self.name, code = err.code(), error = %err, "close reported an error");
		}
	}
}

impl Drop for Shared {
	fn drop(&mut self) {
		self.shutdown();
	}
}

impl Database {
	/// Opens `filename` with default options. `""` and `":memory:"` open a
	/// private in-memory database.
	pub fn open(filename: &str) -> Result<Self> {
		Self::open_with(filename, &OpenOptions::default())
	}

	pub fn open_with(filename: &str, options: &OpenOptions) -> Result<Self> {
		let conn = RawConnection::open(filename, options.open_flags(filename))?;
		conn.set_busy_timeout(options.timeout_ms())?;
		conn.enable_extended_result_codes()?;
		conn.raise_length_limit();
		if let Some(image) = &options.buffer {
			conn.deserialize(image)?;
		}

		debug!(
			name = filename,
			readonly = options.readonly,
			deserialized = options.buffer.is_some(),
			"opened database"
		);

		Ok(Self {
			shared: Arc::new(Shared {
				name: filename.to_string(),
				readonly: options.readonly,
				memory: is_memory_name(filename),
				default_safe_integers: AtomicBool::new(false),
				next_statement_id: AtomicU64::new(0),
				state: Mutex::new(DbState { conn: Some(conn), statements: HashMap::new() }),
			}),
		})
	}

	/// Compiles the first statement in `sql`. Text after it is ignored.
	pub fn prepare(&self, sql: &str) -> Result<Statement> {
		let mut state = self.shared.lock();
		let conn = state.conn.as_ref().ok_or_else(Error::not_open)?;
		let handle = conn.prepare(sql)?;

		let id = self.shared.next_statement_id.fetch_add(1, Ordering::Relaxed);
		let cell = Arc::new(StatementCell::new(id, handle, Arc::downgrade(&self.shared)));
		state.statements.insert(id, Arc::downgrade(&cell));
		trace!(id, sql, "prepared statement");

		Ok(Statement::new(cell, sql, self.shared.default_safe_integers()))
	}

	/// Runs every statement in `sql`, discarding rows.
	pub fn exec(&self, sql: &str) -> Result<&Self> {
		let state = self.shared.lock();
		let conn = state.conn.as_ref().ok_or_else(Error::not_open)?;
		conn.exec(sql)?;
		Ok(self)
	}

	/// Finalizes every live statement and closes the connection. Never fails;
	/// engine errors during close are logged and dropped.
	pub fn close(&self) -> &Self {
		self.shared.shutdown();
		self
	}

	/// Runs `PRAGMA {body}` and returns every row as an object.
	pub fn pragma(&self, body: &str) -> Result<Vec<Row>> {
		let state = self.shared.lock();
		let conn = state.conn.as_ref().ok_or_else(Error::not_open)?;
		let mut handle = conn.prepare(&format!("PRAGMA {body}"))?;

		let mode = RowMode::object(self.shared.default_safe_integers());
		let mut rows = Vec::new();
		while let Step::Row = handle.step()? {
			rows.push(mode.read(&handle));
		}
		Ok(rows)
	}

	/// Runs `PRAGMA {body}` and returns the first column of the first row.
	///
	/// Only integers and text come back as values; any other storage class is
	/// `Value::Null`. `None` means the pragma produced no row.
	pub fn pragma_simple(&self, body: &str) -> Result<Option<Value>> {
		let state = self.shared.lock();
		let conn = state.conn.as_ref().ok_or_else(Error::not_open)?;
		let mut handle = conn.prepare(&format!("PRAGMA {body}"))?;

		match handle.step()? {
			Step::Done => Ok(None),
			Step::Row => Ok(Some(match handle.column_type(0) {
				ffi::SQLITE_INTEGER | ffi::SQLITE_TEXT => handle.column_value(0, false),
				_ => Value::Null,
			})),
		}
	}

	/// Enables extension loading on this connection, then loads `path`.
	pub fn load_extension(&self, path: &str, entry_point: Option<&str>) -> Result<&Self> {
		let state = self.shared.lock();
		let conn = state.conn.as_ref().ok_or_else(Error::not_open)?;
		conn.enable_load_extension()?;
		conn.load_extension(path, entry_point)?;
		debug!(name = %self.shared.name, path, entry_point, "loaded extension");
		Ok(self)
	}

	/// Sets the safe-integer mode inherited by statements prepared from now on.
	pub fn default_safe_integers(&self, enabled: bool) -> &Self {
		self.shared.default_safe_integers.store(enabled, Ordering::Relaxed);
		self
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	pub fn is_open(&self) -> bool {
		self.shared.lock().conn.is_some()
	}

	/// Whether a transaction is open, read live from the engine.
	pub fn in_transaction(&self) -> bool {
		self.shared.lock().conn.as_ref().is_some_and(|conn| !conn.autocommit())
	}

	pub fn readonly(&self) -> bool {
		self.shared.readonly
	}

	pub fn memory(&self) -> bool {
		self.shared.memory
	}

	/// Number of statements prepared on this connection that are not yet
	/// finalized.
	pub fn live_statements(&self) -> usize {
		self.shared.lock().statements.len()
	}
}

impl fmt::Debug for Database {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Database")
			.field("name", &self.shared.name)
			.field("open", &self.is_open())
			.field("readonly", &self.shared.readonly)
			.field("memory", &self.shared.memory)
			.finish_non_exhaustive()
	}
}

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

use crate::database::Shared;
use crate::error::{Error, Result};
use crate::raw::{RawConnection, RawStatement, Step};
use crate::value::{ColumnInfo, Fields, Params, Row, RunResult, Value, set_field};

/// Key that groups columns with no originating table in expanded rows.
pub const EXPANDED_NO_TABLE: &str = "$";

/// A prepared statement.
///
/// The compiled handle is released exactly once: when this value drops, when
/// [`Statement::finalize`] is called, or when the parent database closes,
/// whichever comes first. Afterwards every operation fails with a
/// "finalized" error.
pub struct Statement {
	cell: Arc<StatementCell>,
	source: String,
	safe_integers: bool,
	raw: bool,
	expand: bool,
}

/// The part of a statement the parent's registry can reach.
pub(crate) struct StatementCell {
	id: u64,
	state: Mutex<StatementState>,
}

struct StatementState {
	handle: Option<RawStatement>,
	parent: Option<Weak<Shared>>,
}

impl StatementCell {
	pub(crate) fn new(id: u64, handle: RawStatement, parent: Weak<Shared>) -> Self {
		Self { id, state: Mutex::new(StatementState { handle: Some(handle), parent: Some(parent) }) }
	}

	fn lock(&self) -> MutexGuard<'_, StatementState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Releases the handle and leaves the parent's registry.
	fn finalize(&self) {
		let parent = {
			let mut state = self.lock();
			let Some(handle) = state.handle.take() else {
				return;
			};
			drop(handle);
			state.parent.take()
		};
		trace!(id = self.id, "finalized statement");

		if let Some(shared) = parent.as_ref().and_then(Weak::upgrade) {
			shared.lock().statements.remove(&self.id);
		}
	}

	/// Releases the handle on behalf of a closing parent, which has already
	/// dropped this cell from its registry and holds the database lock.
	pub(crate) fn finalize_detached(&self) {
		let mut state = self.lock();
		state.parent = None;
		if state.handle.take().is_some() {
			trace!(id = self.id, "finalized statement with its database");
		}
	}

	fn parent(&self) -> Result<Weak<Shared>> {
		let state = self.lock();
		match (&state.handle, &state.parent) {
			(Some(_), Some(parent)) => Ok(parent.clone()),
			_ => Err(Error::finalized()),
		}
	}

	fn with_handle<T>(&self, f: impl FnOnce(&RawStatement) -> T) -> Option<T> {
		self.lock().handle.as_ref().map(f)
	}
}

/// How rows are materialized.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowMode {
	safe_integers: bool,
	raw: bool,
	expand: bool,
}

impl RowMode {
	pub(crate) const fn object(safe_integers: bool) -> Self {
		Self { safe_integers, raw: false, expand: false }
	}

	/// Raw takes precedence over expand.
	pub(crate) fn read(self, handle: &RawStatement) -> Row {
		let columns = 0..handle.column_count();
		if self.raw {
			return Row::Array(columns.map(|i| handle.column_value(i, self.safe_integers)).collect());
		}

		if self.expand {
			let mut tables: Vec<(String, Fields)> = Vec::new();
			for i in columns {
				let table = handle.column_table_name(i).unwrap_or_else(|| EXPANDED_NO_TABLE.to_string());
				let name = handle.column_name(i);
				let value = handle.column_value(i, self.safe_integers);
				if let Some((_, fields)) = tables.iter_mut().find(|(key, _)| *key == table) {
					set_field(fields, name, value);
				} else {
					tables.push((table, vec![(name, value)]));
				}
			}
			return Row::Expanded(tables);
		}

		let mut fields = Fields::with_capacity(columns.len());
		for i in columns {
			set_field(&mut fields, handle.column_name(i), handle.column_value(i, self.safe_integers));
		}
		Row::Object(fields)
	}
}

impl Statement {
	pub(crate) fn new(cell: Arc<StatementCell>, source: &str, safe_integers: bool) -> Self {
		Self { cell, source: source.to_string(), safe_integers, raw: false, expand: false }
	}

	const fn mode(&self) -> RowMode {
		RowMode { safe_integers: self.safe_integers, raw: self.raw, expand: self.expand }
	}

	/// Runs `f` with the parent connection and this statement's handle, both
	/// locked, parent first.
	fn execute<T>(&self, f: impl FnOnce(&RawConnection, &mut RawStatement) -> Result<T>) -> Result<T> {
		let parent = self.cell.parent()?.upgrade().ok_or_else(Error::finalized)?;
		let db = parent.lock();
		let conn = db.conn.as_ref().ok_or_else(Error::finalized)?;
		let mut state = self.cell.lock();
		let handle = state.handle.as_mut().ok_or_else(Error::finalized)?;
		f(conn, handle)
	}

	/// Executes once, ignoring any row produced.
	pub fn run(&self, params: &Params) -> Result<RunResult> {
		let safe_integers = self.safe_integers;
		self.execute(|conn, handle| {
			bind_params(handle, params)?;
			let result = handle.step().map(|_| RunResult {
				changes: conn.changes(),
				last_insert_rowid: Value::from_integer(conn.last_insert_rowid(), safe_integers),
			});
			handle.reset();
			result
		})
	}

	/// First row, or `None` when the statement produced none.
	pub fn get(&self, params: &Params) -> Result<Option<Row>> {
		let mode = self.mode();
		self.execute(|_, handle| {
			bind_params(handle, params)?;
			let result = handle.step().map(|step| match step {
				Step::Row => Some(mode.read(handle)),
				Step::Done => None,
			});
			handle.reset();
			result
		})
	}

	pub fn all(&self, params: &Params) -> Result<Vec<Row>> {
		let mode = self.mode();
		self.execute(|_, handle| {
			bind_params(handle, params)?;
			let mut rows = Vec::new();
			let result = loop {
				match handle.step() {
					Ok(Step::Row) => rows.push(mode.read(handle)),
					Ok(Step::Done) => break Ok(rows),
					Err(err) => break Err(err),
				}
			};
			handle.reset();
			result
		})
	}

	/// Same as [`Statement::all`]; rows are materialized up front.
	pub fn iterate(&self, params: &Params) -> Result<Vec<Row>> {
		self.all(params)
	}

	/// Describes each result column. Names the engine cannot attribute (for
	/// expressions) are `None`.
	pub fn columns(&self) -> Result<Vec<ColumnInfo>> {
		self.execute(|_, handle| {
			Ok((0..handle.column_count())
				.map(|i| ColumnInfo {
					name: handle.column_name(i),
					column: handle.column_origin_name(i),
					table: handle.column_table_name(i),
					database: handle.column_database_name(i),
					r#type: handle.column_decltype(i),
				})
				.collect())
		})
	}

	/// Binds `params` without executing. The next execution rebinds from
	/// scratch, so this only validates the values against the statement.
	pub fn bind(&self, params: &Params) -> Result<&Self> {
		self.execute(|_, handle| bind_params(handle, params))?;
		Ok(self)
	}

	pub const fn safe_integers(&mut self, enabled: bool) -> &mut Self {
		self.safe_integers = enabled;
		self
	}

	/// Return rows as arrays. Takes precedence over [`Statement::expand`].
	pub const fn raw(&mut self, enabled: bool) -> &mut Self {
		self.raw = enabled;
		self
	}

	/// Return rows grouped by originating table.
	pub const fn expand(&mut self, enabled: bool) -> &mut Self {
		self.expand = enabled;
		self
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	/// Whether the statement returns data. False once finalized.
	pub fn reader(&self) -> bool {
		self.cell.with_handle(|handle| handle.column_count() > 0).unwrap_or(false)
	}

	/// Whether the statement is mid-execution. False once finalized.
	pub fn busy(&self) -> bool {
		self.cell.with_handle(RawStatement::busy).unwrap_or(false)
	}

	/// Whether the statement leaves the database unchanged. False once
	/// finalized.
	pub fn readonly(&self) -> bool {
		self.cell.with_handle(RawStatement::readonly).unwrap_or(false)
	}

	pub fn is_safe_integers(&self) -> bool {
		self.safe_integers
	}

	pub fn is_finalized(&self) -> bool {
		self.cell.lock().handle.is_none()
	}

	/// Releases the compiled handle now. Later calls do nothing.
	pub fn finalize(&self) {
		self.cell.finalize();
	}
}

impl Drop for Statement {
	fn drop(&mut self) {
		self.cell.finalize();
	}
}

impl fmt::Debug for Statement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Statement")
			.field("source", &self.source)
			.field("finalized", &self.is_finalized())
			.field("safe_integers", &self.safe_integers)
			.field("raw", &self.raw)
			.field("expand", &self.expand)
			.finish_non_exhaustive()
	}
}

/// Starts every execution from a clean cursor with no bindings, then binds
/// `params`. A failed bind leaves the statement reset and cleared.
fn bind_params(handle: &mut RawStatement, params: &Params) -> Result<()> {
	handle.reset();
	handle.clear_bindings();

	let count = handle.parameter_count();
	if count == 0 {
		return Ok(());
	}

	let result = match params {
		Params::Named(values) => (1..=count).try_for_each(|i| {
			let Some(name) = handle.parameter_name(i) else {
				return Ok(());
			};
			match values.get(strip_sigil(&name)) {
				Some(value) => handle.bind_value(i, value),
				None => Ok(()),
			}
		}),
		Params::Positional(values) => {
			(1..=count).zip(values).try_for_each(|(i, value)| handle.bind_value(i, value))
		}
	};

	if result.is_err() {
		handle.reset();
		handle.clear_bindings();
	}
	result
}

fn strip_sigil(name: &str) -> &str {
	let mut chars = name.chars();
	chars.next();
	chars.as_str()
}

use tracing::debug;

use crate::database::Database;
use crate::error::{Error, Result};

const SAVEPOINT: &str = "hexlite_savepoint";

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TransactionMode {
	#[default]
	Deferred,
	Immediate,
	Exclusive,
}

impl TransactionMode {
	const fn begin_sql(self) -> &'static str {
		match self {
			Self::Deferred => "BEGIN DEFERRED",
			Self::Immediate => "BEGIN IMMEDIATE",
			Self::Exclusive => "BEGIN EXCLUSIVE",
		}
	}
}

/// An open transaction, or a savepoint when one was already open. Rolled back
/// on drop unless committed.
#[derive(Debug)]
pub struct Transaction<'db> {
	db: &'db Database,
	nested: bool,
	active: bool,
}

impl Transaction<'_> {
	pub fn commit(mut self) -> Result<()> {
		if !self.active {
			return Ok(());
		}

		let sql = if self.nested { format!("RELEASE \"{SAVEPOINT}\"") } else { "COMMIT".to_string() };
		self.db.exec(&sql)?;
		self.active = false;
		Ok(())
	}

	pub fn rollback(mut self) -> Result<()> {
		self.rollback_in_place()
	}

	fn rollback_in_place(&mut self) -> Result<()> {
		if !self.active {
			return Ok(());
		}
		self.active = false;

		if self.nested {
			self.db.exec(&format!("ROLLBACK TO \"{SAVEPOINT}\"; RELEASE \"{SAVEPOINT}\""))?;
		} else if self.db.in_transaction() {
			// Some errors make the engine roll back on its own.
			self.db.exec("ROLLBACK")?;
		}
		Ok(())
	}

	pub const fn is_nested(&self) -> bool {
		self.nested
	}

	pub const fn is_active(&self) -> bool {
		self.active
	}
}

impl Drop for Transaction<'_> {
	fn drop(&mut self) {
		if let Err(err) = self.rollback_in_place() {
			debug!(error = %err, "rollback on drop failed");
		}
	}
}

impl Database {
	/// Starts a transaction in `mode`, or a savepoint inside the one already
	/// open (the mode is then irrelevant).
	pub fn begin(&self, mode: TransactionMode) -> Result<Transaction<'_>> {
		let nested = self.in_transaction();
		if nested {
			self.exec(&format!("SAVEPOINT \"{SAVEPOINT}\""))?;
		} else {
			self.exec(mode.begin_sql())?;
		}
		Ok(Transaction { db: self, nested, active: true })
	}

	/// Runs `f` inside [`Database::begin`]. Commits when `f` succeeds and rolls
	/// back when it fails or when the commit does.
	pub fn transaction<T, E, F>(&self, mode: TransactionMode, f: F) -> std::result::Result<T, E>
	where
		F: FnOnce(&Self) -> std::result::Result<T, E>,
		E: From<Error>,
	{
		let tx = self.begin(mode)?;
		let value = f(self)?;
		tx.commit()?;
		Ok(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::{Params, Value};

	fn count(db: &Database) -> Value {
		let mut stmt = db.prepare("SELECT count(*) FROM log").expect("prepare count");
		stmt.raw(true);
		stmt.get(&Params::none()).expect("count").and_then(|row| row.at(0).cloned()).unwrap_or(Value::Null)
	}

	fn setup() -> Database {
		let db = Database::open(":memory:").expect("open");
		db.exec("CREATE TABLE log(v TEXT)").expect("create table");
		db
	}

	#[test]
	fn rolls_back_on_drop_and_can_commit() {
		let db = setup();
		{
			let _tx = db.begin(TransactionMode::Deferred).expect("begin");
			db.exec("INSERT INTO log VALUES ('rolled')").expect("insert");
			assert!(db.in_transaction());
		}
		assert!(!db.in_transaction());
		assert_eq!(count(&db), Value::Number(0.0));

		let tx = db.begin(TransactionMode::Immediate).expect("begin");
		db.exec("INSERT INTO log VALUES ('kept')").expect("insert");
		tx.commit().expect("commit");
		assert_eq!(count(&db), Value::Number(1.0));
	}

	#[test]
	fn nested_transaction_uses_savepoint() {
		let db = setup();
		let outer = db.begin(TransactionMode::Exclusive).expect("begin outer");
		db.exec("INSERT INTO log VALUES ('outer')").expect("insert outer");

		let inner = db.begin(TransactionMode::Deferred).expect("begin inner");
		assert!(inner.is_nested());
		db.exec("INSERT INTO log VALUES ('inner')").expect("insert inner");
		inner.rollback().expect("rollback inner");

		assert!(db.in_transaction());
		outer.commit().expect("commit outer");
		assert_eq!(count(&db), Value::Number(1.0));
	}

	#[test]
	fn closure_errors_roll_back() {
		let db = setup();
		let result: Result<()> = db.transaction(TransactionMode::Deferred, |db| {
			db.exec("INSERT INTO log VALUES ('x')")?;
			db.exec("INSERT INTO missing VALUES ('y')")?;
			Ok(())
		});
		let err = result.expect_err("missing table");
		assert_eq!(err.code(), Some("SQLITE_ERROR"));
		assert!(!db.in_transaction());
		assert_eq!(count(&db), Value::Number(0.0));
	}

	#[test]
	fn closure_value_is_returned_after_commit() {
		let db = setup();
		let value = db
			.transaction(TransactionMode::Immediate, |db| -> Result<i32> {
				db.exec("INSERT INTO log VALUES ('x')")?;
				Ok(7)
			})
			.expect("transaction");
		assert_eq!(value, 7);
		assert_eq!(count(&db), Value::Number(1.0));
	}
}

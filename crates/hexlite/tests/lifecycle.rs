use std::sync::Arc;
use std::thread;

use hexlite::{Database, Error, FINALIZED, NOT_OPEN, Params, Value};

fn finalized() -> Error {
	Error::Type(FINALIZED.to_string())
}

#[test]
fn close_finalizes_every_statement() {
	let db = Database::open(":memory:").expect("open memory database");
	db.exec("CREATE TABLE t(v)").expect("create table");

	let select = db.prepare("SELECT v FROM t").expect("prepare select");
	let insert = db.prepare("INSERT INTO t VALUES (?)").expect("prepare insert");
	assert_eq!(db.live_statements(), 2);

	db.close();
	assert!(select.is_finalized());
	assert!(insert.is_finalized());
	assert_eq!(db.live_statements(), 0);

	assert_eq!(select.all(&Params::none()).expect_err("finalized"), finalized());
	assert_eq!(select.get(&Params::none()).expect_err("finalized"), finalized());
	assert_eq!(insert.run(&Params::from(vec![Value::Null])).expect_err("finalized"), finalized());
	assert_eq!(select.columns().expect_err("finalized"), finalized());
	assert_eq!(insert.bind(&Params::none()).expect_err("finalized"), finalized());
	assert!(!select.reader());
	assert!(!select.busy());
}

#[test]
fn finalize_is_idempotent() {
	let db = Database::open(":memory:").expect("open memory database");
	let stmt = db.prepare("SELECT 1").expect("prepare");

	stmt.finalize();
	stmt.finalize();
	assert!(stmt.is_finalized());
	assert_eq!(db.live_statements(), 0);

	db.close();
	db.close();
	drop(stmt);
}

#[test]
fn dropping_database_finalizes_statements() {
	let db = Database::open(":memory:").expect("open memory database");
	let stmt = db.prepare("SELECT 1").expect("prepare");
	drop(db);

	assert!(stmt.is_finalized());
	assert_eq!(stmt.get(&Params::none()).expect_err("finalized"), finalized());
}

#[test]
fn operations_after_close_fail() {
	let db = Database::open(":memory:").expect("open memory database");
	db.close();

	let not_open = Error::Type(NOT_OPEN.to_string());
	assert_eq!(db.prepare("SELECT 1").expect_err("closed"), not_open);
	assert_eq!(db.exec("SELECT 1").expect_err("closed"), not_open);
	assert_eq!(db.pragma("user_version").expect_err("closed"), not_open);
	assert_eq!(db.pragma_simple("user_version").expect_err("closed"), not_open);
	assert_eq!(db.load_extension("nowhere", None).expect_err("closed"), not_open);

	assert_eq!(db.name(), ":memory:");
	assert!(db.memory());
	assert!(!db.in_transaction());
}

#[test]
fn statements_finalize_from_other_threads() {
	let db = Arc::new(Database::open(":memory:").expect("open memory database"));
	db.exec("CREATE TABLE t(v)").expect("create table");

	let handles: Vec<_> = (0..8)
		.map(|i| {
			let db = Arc::clone(&db);
			thread::spawn(move || {
				// Another thread may already have closed the database.
				if let Ok(stmt) = db.prepare("INSERT INTO t VALUES (?)") {
					let _ = stmt.run(&Params::from(vec![Value::from(i64::from(i))]));
				}
				if i % 2 == 1 {
					db.close();
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().expect("worker thread");
	}

	db.close();
	assert_eq!(db.live_statements(), 0);
}

#[test]
fn busy_is_false_after_every_execution() {
	let db = Database::open(":memory:").expect("open memory database");
	db.exec("CREATE TABLE t(v INTEGER CHECK (v > 0)); INSERT INTO t VALUES (1), (2)").expect("setup");

	let select = db.prepare("SELECT v FROM t").expect("prepare select");
	let _ = select.get(&Params::none()).expect("get");
	assert!(!select.busy());
	let _ = select.all(&Params::none()).expect("all");
	assert!(!select.busy());

	let insert = db.prepare("INSERT INTO t VALUES (?)").expect("prepare insert");
	let err = insert.run(&Params::from(vec![Value::Number(-1.0)])).expect_err("check fails");
	assert_eq!(err.code(), Some("SQLITE_CONSTRAINT_CHECK"));
	assert!(!insert.busy());

	let failing = db.prepare("SELECT v / 0, abs(-9223372036854775808) FROM t").expect("prepare");
	assert!(failing.all(&Params::none()).is_err());
	assert!(!failing.busy());
}

#[test]
fn reader_reflects_output_columns() {
	let db = Database::open(":memory:").expect("open memory database");
	db.exec("CREATE TABLE t(v)").expect("create table");
	assert!(db.prepare("SELECT v FROM t").expect("prepare").reader());
	assert!(!db.prepare("INSERT INTO t VALUES (1)").expect("prepare").reader());
	assert!(db.prepare("SELECT v FROM t").expect("prepare").readonly());
}

#[test]
fn source_is_kept_verbatim() {
	let db = Database::open(":memory:").expect("open memory database");
	let sql = "SELECT 1; SELECT 2";
	let stmt = db.prepare(sql).expect("prepare");
	assert_eq!(stmt.source(), sql);
	assert_eq!(stmt.all(&Params::none()).expect("all").len(), 1);
}

#[test]
fn prepare_rejects_empty_sql_and_reports_compile_errors() {
	let db = Database::open(":memory:").expect("open memory database");
	assert_eq!(
		db.prepare("   ").expect_err("no statement"),
		Error::Type(hexlite::NO_STATEMENT.to_string())
	);

	let err = db.prepare("SELECT * FROM missing").expect_err("no such table");
	assert_eq!(err.code(), Some("SQLITE_ERROR"));
	assert_eq!(err.to_string(), "no such table: missing");
}

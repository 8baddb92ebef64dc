use std::time::{Duration, Instant};

use hexlite::{Database, OpenOptions, Params, Row, Value};

fn temp_db(dir: &tempfile::TempDir, name: &str) -> String {
	dir.path().join(name).to_str().expect("utf-8 temp path").to_string()
}

#[test]
fn file_must_exist_refuses_to_create() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let path = temp_db(&dir, "missing.sqlite");

	let err = Database::open_with(&path, &OpenOptions::new().file_must_exist(true)).expect_err("missing file");
	assert!(err.code().is_some_and(|code| code.starts_with("SQLITE_CANTOPEN")), "{err:?}");
	assert!(!std::path::Path::new(&path).exists());

	Database::open(&path).expect("create file");
	let db = Database::open_with(&path, &OpenOptions::new().file_must_exist(true)).expect("reopen");
	assert!(!db.readonly());
	assert!(!db.memory());
}

#[test]
fn readonly_open_of_missing_file_fails() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let path = temp_db(&dir, "absent.sqlite");
	let err = Database::open_with(&path, &OpenOptions::new().readonly(true)).expect_err("missing file");
	assert!(err.code().is_some_and(|code| code.starts_with("SQLITE_CANTOPEN")), "{err:?}");
}

#[test]
fn deserialized_image_is_queryable_and_writable() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let path = temp_db(&dir, "image.sqlite");
	{
		let db = Database::open(&path).expect("create source database");
		db.exec("CREATE TABLE t(v TEXT); INSERT INTO t VALUES ('from disk')").expect("seed");
	}
	let image = std::fs::read(&path).expect("read image");

	let db = Database::open_with(":memory:", &OpenOptions::new().buffer(image)).expect("deserialize");
	let mut select = db.prepare("SELECT v FROM t").expect("prepare");
	select.raw(true);
	assert_eq!(
		select.all(&Params::none()).expect("all"),
		vec![Row::Array(vec![Value::from("from disk")])]
	);

	db.exec("INSERT INTO t VALUES ('grown')").expect("write to resizeable image");
	assert_eq!(select.all(&Params::none()).expect("all").len(), 2);
}

#[test]
fn garbage_image_fails_on_first_use() {
	let image = b"definitely not a database file, just some bytes".to_vec();
	let db = Database::open_with(":memory:", &OpenOptions::new().buffer(image)).expect("deserialize");
	let err = db.exec("SELECT * FROM sqlite_master").expect_err("not a database");
	assert!(
		err.code().is_some_and(|code| code.starts_with("SQLITE_NOTADB") || code.starts_with("SQLITE_CORRUPT")),
		"{err:?}"
	);
}

#[test]
fn busy_timeout_bounds_lock_waits() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let path = temp_db(&dir, "busy.sqlite");

	let holder = Database::open(&path).expect("open holder");
	holder.exec("CREATE TABLE t(v)").expect("create table");
	holder.exec("BEGIN EXCLUSIVE").expect("take lock");

	let waiter =
		Database::open_with(&path, &OpenOptions::new().timeout(Duration::from_millis(50))).expect("open waiter");
	let started = Instant::now();
	let err = waiter.exec("INSERT INTO t VALUES (1)").expect_err("locked");
	assert!(err.code().is_some_and(|code| code.starts_with("SQLITE_BUSY")), "{err:?}");
	assert!(started.elapsed() >= Duration::from_millis(40));

	holder.exec("COMMIT").expect("release lock");
	waiter.exec("INSERT INTO t VALUES (1)").expect("insert after release");
}

#[test]
fn pragma_rows_and_simple_values() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let path = temp_db(&dir, "pragma.sqlite");
	let db = Database::open(&path).expect("open");
	db.exec("CREATE TABLE t(a INTEGER, b TEXT)").expect("create table");

	let rows = db.pragma("table_info(t)").expect("table_info");
	assert_eq!(rows.len(), 2);
	assert_eq!(rows.first().and_then(|row| row.get("name")), Some(&Value::from("a")));
	assert_eq!(rows.get(1).and_then(|row| row.get("type")), Some(&Value::from("TEXT")));

	assert_eq!(db.pragma_simple("journal_mode").expect("journal_mode"), Some(Value::from("delete")));
	db.pragma("user_version = 12").expect("set user_version");
	assert_eq!(db.pragma_simple("user_version").expect("user_version"), Some(Value::Number(12.0)));
}

#[test]
fn pragma_rows_follow_default_safe_integers() {
	let db = Database::open(":memory:").expect("open");
	db.pragma("user_version = 5").expect("set user_version");
	db.default_safe_integers(true);
	let rows = db.pragma("user_version").expect("user_version");
	assert_eq!(rows, vec![Row::Object(vec![("user_version".to_string(), Value::BigInt(5))])]);
}

#[test]
fn load_extension_reports_missing_library() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let missing = temp_db(&dir, "no_such_extension");
	let db = Database::open(":memory:").expect("open");

	let err = db.load_extension(&missing, None).expect_err("missing library");
	assert_eq!(err.code(), Some("SQLITE_ERROR"));
	assert!(!err.to_string().is_empty());

	let err = db.load_extension(&missing, Some("sqlite3_custom_init")).expect_err("missing library");
	assert_eq!(err.code(), Some("SQLITE_ERROR"));
	assert!(db.is_open());
}

use hexlite::{Database, OpenOptions, Params, Row, RunResult, Value};

fn object(fields: &[(&str, Value)]) -> Row {
	Row::Object(fields.iter().map(|(name, value)| ((*name).to_string(), value.clone())).collect())
}

#[test]
fn open_insert_read_close() {
	let db = Database::open(":memory:").expect("open memory database");
	assert!(db.memory());
	assert!(!db.readonly());

	db.exec("CREATE TABLE t(id INTEGER PRIMARY KEY, v TEXT)").expect("create table");
	let result = db
		.prepare("INSERT INTO t(v) VALUES (?)")
		.expect("prepare insert")
		.run(&Params::from(vec![Value::from("hi")]))
		.expect("run insert");
	assert_eq!(result, RunResult { changes: 1, last_insert_rowid: Value::Number(1.0) });

	let rows = db.prepare("SELECT * FROM t").expect("prepare select").all(&Params::none()).expect("all");
	assert_eq!(rows, vec![object(&[("id", Value::Number(1.0)), ("v", Value::from("hi"))])]);

	db.close();
	assert!(!db.is_open());
}

#[test]
fn named_binding() {
	let db = Database::open(":memory:").expect("open memory database");
	let stmt = db.prepare("SELECT :x + :y AS s").expect("prepare");
	let row = stmt.get(&Params::named([("x", 2.0), ("y", 3.0)])).expect("get");
	assert_eq!(row, Some(object(&[("s", Value::Number(5.0))])));
}

#[test]
fn named_binding_accepts_every_sigil() {
	let db = Database::open(":memory:").expect("open memory database");
	let stmt = db.prepare("SELECT :a || @b || $c AS s").expect("prepare");
	let row = stmt.get(&Params::named([("a", "x"), ("b", "y"), ("c", "z")])).expect("get");
	assert_eq!(row, Some(object(&[("s", Value::from("xyz"))])));
}

#[test]
fn raw_shape() {
	let db = Database::open(":memory:").expect("open memory database");
	let mut stmt = db.prepare("SELECT :x + :y AS s").expect("prepare");
	let row = stmt.raw(true).get(&Params::named([("x", 2.0), ("y", 3.0)])).expect("get");
	assert_eq!(row, Some(Row::Array(vec![Value::Number(5.0)])));
}

#[test]
fn safe_integers() {
	let db = Database::open(":memory:").expect("open memory database");
	db.exec("CREATE TABLE n(v INTEGER); INSERT INTO n VALUES (9007199254740993)").expect("setup");

	let mut stmt = db.prepare("SELECT v FROM n").expect("prepare");
	assert_eq!(
		stmt.get(&Params::none()).expect("get"),
		Some(object(&[("v", Value::Number(9_007_199_254_740_992.0))]))
	);

	stmt.safe_integers(true);
	assert_eq!(
		stmt.get(&Params::none()).expect("get"),
		Some(object(&[("v", Value::BigInt(9_007_199_254_740_993))]))
	);
}

#[test]
fn readonly_enforcement() {
	let dir = tempfile::tempdir().expect("create temp dir");
	let path = dir.path().join("db.sqlite");
	let path = path.to_str().expect("utf-8 temp path");

	Database::open(path).expect("create database").exec("CREATE TABLE t(v)").expect("create table");

	let db = Database::open_with(path, &OpenOptions::new().readonly(true)).expect("open readonly");
	assert!(db.readonly());
	let err = db.exec("INSERT INTO t VALUES (1)").expect_err("write must fail");
	assert!(err.code().is_some_and(|code| code.starts_with("SQLITE_READONLY")), "{err:?}");
}

#[test]
fn error_code_shape() {
	let db = Database::open(":memory:").expect("open memory database");
	db.exec("CREATE TABLE u(v TEXT UNIQUE); INSERT INTO u VALUES ('a')").expect("setup");

	let stmt = db.prepare("INSERT INTO u VALUES (?)").expect("prepare");
	let err = stmt.run(&Params::from(vec![Value::from("a")])).expect_err("duplicate");
	assert_eq!(err.code(), Some("SQLITE_CONSTRAINT_UNIQUE"));
	assert_eq!(err.extended_code(), Some(2067));
	assert!(err.to_string().contains("UNIQUE constraint failed"), "{err}");
	assert!(!stmt.busy());
}

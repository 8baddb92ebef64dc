use hexlite::{Database, Params, Row, TransactionMode, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexlite=debug"));
	tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

	let db = Database::open(":memory:")?;
	db.exec("create table inventory(sku text primary key, qty integer not null)")?;

	let insert = db.prepare("insert into inventory(sku, qty) values (:sku, :qty)")?;
	db.transaction(TransactionMode::Immediate, |_| -> hexlite::Result<()> {
		for (sku, qty) in [("A100", 8_i64), ("B205", 14), ("C330", 3)] {
			insert.run(&Params::named([("sku", Value::from(sku)), ("qty", Value::from(qty))]))?;
		}
		Ok(())
	})?;

	let mut select = db.prepare("select sku, qty from inventory order by sku")?;
	for row in select.raw(true).all(&Params::none())? {
		match row {
			Row::Array(values) => match values.as_slice() {
				[Value::Text(sku), Value::Number(qty)] => println!("{sku}: {qty}"),
				_ => return Err("unexpected row shape".into()),
			},
			_ => return Err("expected array rows".into()),
		}
	}

	println!("journal mode: {:?}", db.pragma_simple("journal_mode")?);
	db.close();
	Ok(())
}

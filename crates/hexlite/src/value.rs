use std::collections::BTreeMap;

/// Largest integer a host number holds exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// A value in the host's value system.
///
/// `Number` is the host's double-precision number and `BigInt` its
/// arbitrary-width integer. Binding a `BigInt` outside the signed 64-bit
/// range fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Number(f64),
	BigInt(i128),
	Text(String),
	Blob(Vec<u8>),
}

impl Value {
	/// Host representation of an engine integer under the given mode.
	#[expect(clippy::cast_precision_loss, reason = "unsafe-integer mode rounds to the nearest double")]
	pub(crate) fn from_integer(value: i64, safe_integers: bool) -> Self {
		if safe_integers { Self::BigInt(i128::from(value)) } else { Self::Number(value as f64) }
	}

	pub const fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::BigInt(i128::from(value))
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<Vec<u8>> for Value {
	fn from(value: Vec<u8>) -> Self {
		Self::Blob(value)
	}
}

impl<T: Into<Self>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Bindings for one execution.
///
/// Named keys carry no sigil: `{"foo": ..}` binds `:foo`, `@foo` and `$foo`.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
	Positional(Vec<Value>),
	Named(BTreeMap<String, Value>),
}

impl Params {
	pub const fn none() -> Self {
		Self::Positional(Vec::new())
	}

	pub fn named<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		Self::Named(pairs.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}
}

impl Default for Params {
	fn default() -> Self {
		Self::none()
	}
}

impl From<Vec<Value>> for Params {
	fn from(values: Vec<Value>) -> Self {
		Self::Positional(values)
	}
}

impl From<BTreeMap<String, Value>> for Params {
	fn from(values: BTreeMap<String, Value>) -> Self {
		Self::Named(values)
	}
}

pub type Fields = Vec<(String, Value)>;

/// One result row in the statement's current shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
	/// Column name to value, in column order.
	Object(Fields),
	/// Column values in column order.
	Array(Vec<Value>),
	/// Originating table to (column name to value). Columns without a table
	/// are grouped under `"$"`.
	Expanded(Vec<(String, Fields)>),
}

impl Row {
	/// Looks up a column by name in an object row.
	pub fn get(&self, name: &str) -> Option<&Value> {
		match self {
			Self::Object(fields) => field(fields, name),
			_ => None,
		}
	}

	/// Looks up a column by position in an array row.
	pub fn at(&self, index: usize) -> Option<&Value> {
		match self {
			Self::Array(values) => values.get(index),
			_ => None,
		}
	}

	/// Looks up `table.column` in an expanded row.
	pub fn get_in(&self, table: &str, name: &str) -> Option<&Value> {
		match self {
			Self::Expanded(tables) => {
				tables.iter().find(|(key, _)| key == table).and_then(|(_, fields)| field(fields, name))
			}
			_ => None,
		}
	}
}

fn field<'a>(fields: &'a Fields, name: &str) -> Option<&'a Value> {
	fields.iter().find_map(|(key, value)| (key == name).then_some(value))
}

/// Sets `name` in `fields`; a repeated name overwrites in place.
pub(crate) fn set_field(fields: &mut Fields, name: String, value: Value) {
	if let Some((_, slot)) = fields.iter_mut().find(|(key, _)| *key == name) {
		*slot = value;
	} else {
		fields.push((name, value));
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
	pub changes: i64,
	/// `BigInt` in safe-integer mode, `Number` otherwise.
	pub last_insert_rowid: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
	pub name: String,
	pub column: Option<String>,
	pub table: Option<String>,
	pub database: Option<String>,
	pub r#type: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unsafe_integers_round_to_doubles() {
		assert_eq!(Value::from_integer(9_007_199_254_740_993, false), Value::Number(9_007_199_254_740_992.0));
		assert_eq!(Value::from_integer(9_007_199_254_740_993, true), Value::BigInt(9_007_199_254_740_993));
	}

	#[test]
	fn repeated_field_overwrites_in_place() {
		let mut fields = Fields::new();
		set_field(&mut fields, "a".to_string(), Value::Number(1.0));
		set_field(&mut fields, "b".to_string(), Value::Number(2.0));
		set_field(&mut fields, "a".to_string(), Value::Number(3.0));
		assert_eq!(
			fields,
			vec![("a".to_string(), Value::Number(3.0)), ("b".to_string(), Value::Number(2.0))]
		);
	}

	#[test]
	fn row_accessors_match_shape() {
		let object = Row::Object(vec![("s".to_string(), Value::Number(5.0))]);
		assert_eq!(object.get("s"), Some(&Value::Number(5.0)));
		assert_eq!(object.at(0), None);

		let array = Row::Array(vec![Value::Number(5.0)]);
		assert_eq!(array.at(0), Some(&Value::Number(5.0)));
		assert_eq!(array.get("s"), None);

		let expanded =
			Row::Expanded(vec![("t".to_string(), vec![("a".to_string(), Value::Text("x".into()))])]);
		assert_eq!(expanded.get_in("t", "a"), Some(&Value::Text("x".into())));
		assert_eq!(expanded.get_in("$", "a"), None);
	}

	#[test]
	fn named_params_collect_from_pairs() {
		let params = Params::named([("x", 2.0), ("y", 3.0)]);
		let Params::Named(map) = params else {
			panic!("expected named params");
		};
		assert_eq!(map.get("x"), Some(&Value::Number(2.0)));
		assert_eq!(map.len(), 2);
	}
}

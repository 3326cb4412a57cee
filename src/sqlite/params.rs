use rusqlite::types::Value as SqliteValue;

use crate::coercion;
use crate::params::ParamType;
use crate::types::Value;

/// Convert a bound value to the `SQLite` value its type tag asks for.
///
/// NULL stays NULL whatever the tag.
#[must_use]
pub fn to_sqlite_value(param_type: ParamType, value: &Value) -> SqliteValue {
    if value.is_null() {
        return SqliteValue::Null;
    }
    match param_type {
        ParamType::Int => SqliteValue::Integer(coercion::to_int(value)),
        ParamType::Double => SqliteValue::Real(coercion::to_float(value)),
        ParamType::Str => SqliteValue::Text(coercion::to_text(value)),
        ParamType::Blob => match value {
            Value::Blob(bytes) => SqliteValue::Blob(bytes.clone()),
            other => SqliteValue::Blob(coercion::to_text(other).into_bytes()),
        },
    }
}

/// Convert a column value read back from `SQLite`.
#[must_use]
pub fn from_sqlite_value(value: SqliteValue) -> Value {
    match value {
        SqliteValue::Null => Value::Null,
        SqliteValue::Integer(i) => Value::Int(i),
        SqliteValue::Real(f) => Value::Float(f),
        SqliteValue::Text(s) => Value::Text(s),
        SqliteValue::Blob(b) => Value::Blob(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_coerce_values_at_bind_time() {
        assert_eq!(
            to_sqlite_value(ParamType::Int, &Value::Text("42abc".into())),
            SqliteValue::Integer(42)
        );
        assert_eq!(
            to_sqlite_value(ParamType::Double, &Value::Int(2)),
            SqliteValue::Real(2.0)
        );
        assert_eq!(
            to_sqlite_value(ParamType::Str, &Value::Float(1.5)),
            SqliteValue::Text("1.5".into())
        );
        assert_eq!(
            to_sqlite_value(ParamType::Blob, &Value::Text("raw".into())),
            SqliteValue::Blob(b"raw".to_vec())
        );
        assert_eq!(
            to_sqlite_value(ParamType::Int, &Value::Bool(true)),
            SqliteValue::Integer(1)
        );
    }

    #[test]
    fn null_ignores_the_tag() {
        for tag in [ParamType::Int, ParamType::Str, ParamType::Double, ParamType::Blob] {
            assert_eq!(to_sqlite_value(tag, &Value::Null), SqliteValue::Null);
        }
    }
}

//! MySQL column value → JSON conversion
//!
//! Dispatches on the column's reported SQL type. Aggregates matter here:
//! MySQL returns `SUM`, `AVG` and `ROUND` results as DECIMAL.

use serde_json::{json, Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Convert one column of a row to JSON; undecodable values become null
pub fn column_value(row: &MySqlRow, index: usize) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) => raw,
        Err(_) => return Value::Null,
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).ok().map(|v| json!(v))
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).ok().map(|v| json!(v)),
        "FLOAT" => row.try_get::<f32, _>(index).ok().map(|v| float_to_json(v as f64)),
        "DOUBLE" => row.try_get::<f64, _>(index).ok().map(float_to_json),
        // DECIMAL travels as text on the wire
        "DECIMAL" => row
            .try_get_unchecked::<String, _>(index)
            .ok()
            .map(|text| decimal_to_json(&text)),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(index)
            .ok()
            .map(|t| Value::String(t.format("%H:%M:%S").to_string())),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .ok()
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        _ => row
            .try_get::<String, _>(index)
            .ok()
            .or_else(|| {
                row.try_get::<Vec<u8>, _>(index)
                    .ok()
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            })
            .map(Value::String),
    };

    value.unwrap_or(Value::Null)
}

/// Integral decimals become JSON integers, others JSON floats
pub(crate) fn decimal_to_json(text: &str) -> Value {
    if let Ok(v) = text.parse::<i64>() {
        return json!(v);
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_integral() {
        assert_eq!(decimal_to_json("15"), json!(15));
        assert_eq!(decimal_to_json("-3"), json!(-3));
    }

    #[test]
    fn test_decimal_fractional() {
        assert_eq!(decimal_to_json("26.67"), json!(26.67));
        assert_eq!(decimal_to_json("33.3333"), json!(33.3333));
    }

    #[test]
    fn test_decimal_trailing_zeros_become_float() {
        // "40.00" is not an i64 literal
        assert_eq!(decimal_to_json("40.00"), json!(40.0));
    }

    #[test]
    fn test_decimal_unparseable_kept_as_text() {
        assert_eq!(decimal_to_json("n/a"), json!("n/a"));
    }

    #[test]
    fn test_float_non_finite_is_null() {
        assert_eq!(float_to_json(f64::NAN), Value::Null);
        assert_eq!(float_to_json(1.5), json!(1.5));
    }
}

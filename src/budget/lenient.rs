//! Field readers for documents written by loosely typed clients.
//!
//! Values with one obvious meaning are coerced: numeric strings and floats
//! for integers, numbers for text, null for an absent value. Anything else
//! is an error, which leaves the whole document unreadable rather than
//! silently dropping the field on the next write.

use serde::{de::Error, Deserialize, Deserializer};
use serde_json::Value;

fn integer_from(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number.trunc() as i64)
}

fn text_from(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Epoch milliseconds; null reads as 0.
pub fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        value => integer_from(&value)
            .ok_or_else(|| D::Error::custom(format!("expected a timestamp, found {value}"))),
    }
}

pub fn opt_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => integer_from(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a timestamp, found {value}"))),
    }
}

pub fn day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    integer_from(&value)
        .and_then(|day| u32::try_from(day).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a day number, found {value}")))
}

pub fn opt_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => integer_from(&value)
            .and_then(|day| u32::try_from(day).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a day number, found {value}"))),
    }
}

/// Text; null reads as empty and numbers as their decimal form.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        value => {
            let shown = value.to_string();
            text_from(value).ok_or_else(|| D::Error::custom(format!("expected text, found {shown}")))
        }
    }
}

pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => {
            let shown = value.to_string();
            text_from(value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected text, found {shown}")))
        }
    }
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(D::Error::custom(format!("expected a flag, found {value}"))),
        },
        Value::Number(_) => match integer_from(&value) {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(D::Error::custom(format!("expected a flag, found {value}"))),
        },
        _ => Err(D::Error::custom(format!("expected a flag, found {value}"))),
    }
}

/// A list; null reads as empty.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        #[serde(default, deserialize_with = "super::millis")]
        ts: i64,
        #[serde(default, deserialize_with = "super::opt_day")]
        pay_day: Option<u32>,
        #[serde(default, deserialize_with = "super::text")]
        id: String,
        #[serde(default, deserialize_with = "super::flag")]
        on: bool,
        #[serde(default, deserialize_with = "super::list")]
        tags: Vec<String>,
    }

    fn row(value: serde_json::Value) -> Result<Row, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn coerces_unambiguous_values() {
        let parsed = row(json!({
            "ts": 1700000000123.0,
            "payDay": " 5 ",
            "id": 42,
            "on": "true",
            "tags": null
        }))
        .unwrap();
        assert_eq!(parsed.ts, 1_700_000_000_123);
        assert_eq!(parsed.pay_day, Some(5));
        assert_eq!(parsed.id, "42");
        assert!(parsed.on);
        assert!(parsed.tags.is_empty());

        let parsed = row(json!({"ts": null, "payDay": null, "id": null})).unwrap();
        assert_eq!((parsed.ts, parsed.pay_day, parsed.id.as_str()), (0, None, ""));
    }

    #[test]
    fn rejects_values_without_a_clear_meaning() {
        assert!(row(json!({"payDay": "friday"})).is_err());
        assert!(row(json!({"payDay": -1})).is_err());
        assert!(row(json!({"ts": [1]})).is_err());
        assert!(row(json!({"id": {"a": 1}})).is_err());
        assert!(row(json!({"on": "yes"})).is_err());
        assert!(row(json!({"tags": "a"})).is_err());
    }
}

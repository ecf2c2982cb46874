use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::expression;

/// A stored money amount.
///
/// Documents may hold numbers, numeric strings, null, or garbage in amount
/// fields. Reading coerces the way a loosely typed client would: numbers as
/// is, trimmed numeric strings parsed, empty strings and null as zero,
/// booleans as 0/1, and anything else as NaN. A non-finite amount keeps
/// the JSON it was read from and writes it back unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amount {
    value: f64,
    raw: Option<Value>,
}

impl Amount {
    pub const ZERO: Amount = Amount {
        value: 0.0,
        raw: None,
    };

    pub fn new(value: f64) -> Self {
        Amount { value, raw: None }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// The value, with non-finite amounts counted as zero.
    pub fn or_zero(&self) -> f64 {
        if self.value.is_finite() {
            self.value
        } else {
            0.0
        }
    }

    /// Stored JSON behind a non-finite amount.
    pub fn raw(&self) -> Option<&Value> {
        self.raw.as_ref()
    }

    pub fn from_json(value: &Value) -> Self {
        let coerced = coerce_number(value);
        Amount {
            value: coerced,
            raw: (!coerced.is_finite()).then(|| value.clone()),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_finite() {
            write!(f, "{:.2}", self.value)
        } else {
            f.write_str("-")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.raw, self.value.is_finite()) {
            (_, true) => serializer.serialize_f64(self.value),
            (Some(raw), false) => raw.serialize(serializer),
            (None, false) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Amount::from_json(&raw))
    }
}

pub(crate) fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => parse_numeric_text(text),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Rounds to cents.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses plain money text (`"12.50"`), rounded to cents.
pub fn to_money(input: &str) -> Option<f64> {
    let value = parse_numeric_text(input);
    if input.trim().is_empty() || !value.is_finite() {
        return None;
    }
    Some(round_money(value))
}

/// Applies user money entry to `prior`.
///
/// Accepts plain numbers, arithmetic (`12*3`), and edits relative to the
/// prior value (`+10`, `*1.1`). When the entry does not evaluate to a finite
/// number the prior value is kept.
pub fn apply_money_input(input: &str, prior: f64) -> f64 {
    match expression::evaluate(input, prior) {
        Some(value) => round_money(value),
        None => prior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_loose_values() {
        let cases = [
            (json!(10), 10.0),
            (json!(" 12.5 "), 12.5),
            (json!(""), 0.0),
            (json!(null), 0.0),
            (json!(true), 1.0),
        ];
        for (raw, expected) in cases {
            let amount: Amount = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(amount.value(), expected, "{raw}");
        }
    }

    #[test]
    fn garbage_becomes_non_finite() {
        let amount: Amount = serde_json::from_value(json!("bad")).unwrap();
        assert!(!amount.is_finite());
        assert_eq!(amount.or_zero(), 0.0);
        let amount: Amount = serde_json::from_value(json!({"nested": 1})).unwrap();
        assert!(!amount.is_finite());
    }

    #[test]
    fn computed_non_finite_serializes_as_null() {
        let json = serde_json::to_value(Amount::new(f64::NAN)).unwrap();
        assert_eq!(json, Value::Null);
    }

    #[test]
    fn unreadable_amounts_write_back_unchanged() {
        for raw in [json!("bad"), json!({"nested": 1}), json!("Infinity")] {
            let amount: Amount = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(amount.raw(), Some(&raw));
            assert_eq!(serde_json::to_value(&amount).unwrap(), raw);
        }
        let amount: Amount = serde_json::from_value(json!("12")).unwrap();
        assert_eq!(amount.raw(), None);
        assert_eq!(serde_json::to_value(&amount).unwrap(), json!(12.0));
    }

    #[test]
    fn to_money_rounds_to_cents() {
        assert_eq!(to_money("19.999"), Some(20.0));
        assert_eq!(to_money(" 4.125 "), Some(4.13));
        assert_eq!(to_money("abc"), None);
        assert_eq!(to_money(""), None);
    }

    #[test]
    fn invalid_input_keeps_prior_value() {
        assert_eq!(apply_money_input("lots", 42.0), 42.0);
        assert_eq!(apply_money_input("", 42.0), 42.0);
        assert_eq!(apply_money_input("/0", 42.0), 42.0);
        assert_eq!(apply_money_input("+8", 42.0), 50.0);
        assert_eq!(apply_money_input("15", 42.0), 15.0);
    }
}

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Declared type of an audited attribute. Values are cast to this type
/// before two states are compared, so `"0"` and `0` are the same integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Boolean,
    Integer,
    Float,
    Text,
    Timestamp,
}

impl AttributeType {
    /// Cast a raw value into this type's canonical form.
    ///
    /// Values that cannot be cast are returned untouched so they still
    /// compare structurally instead of being lost.
    pub fn cast(self, value: &Value) -> Value {
        self.try_cast(value).unwrap_or_else(|| value.clone())
    }

    /// Cast a raw value, or `None` when it has no meaning for this type.
    pub fn try_cast(self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match self {
            AttributeType::Boolean => cast_bool(value),
            AttributeType::Integer => cast_integer(value),
            AttributeType::Float => cast_float(value),
            AttributeType::Text => cast_text(value),
            AttributeType::Timestamp => cast_timestamp(value),
        }
    }

    /// The zero value a freshly built record carries for this type.
    pub fn default_value(self) -> Value {
        match self {
            AttributeType::Boolean => Value::Bool(false),
            AttributeType::Integer => Value::from(0),
            AttributeType::Float => Value::from(0.0),
            AttributeType::Text => Value::String(String::new()),
            AttributeType::Timestamp => Value::Null,
        }
    }
}

fn cast_bool(value: &Value) -> Option<Value> {
    let flag = match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64()? != 0.0,
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "" => return Some(Value::Null),
            "1" | "t" | "true" | "yes" | "on" => true,
            "0" | "f" | "false" | "no" | "off" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Value::Bool(flag))
}

/// Whole floats are accepted only inside the `i64` range; anything wider
/// stays uncast so distinct values never collapse onto the same bound.
fn cast_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Value::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Some(Value::from(u));
            }
            let f = n.as_f64()?;
            let in_range = (-I64_BOUND..I64_BOUND).contains(&f);
            (f.fract() == 0.0 && in_range).then(|| Value::from(f as i64))
        }
        Value::String(s) if s.trim().is_empty() => Some(Value::Null),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<u64>().map(Value::from))
                .ok()
        }
        Value::Bool(b) => Some(Value::from(i64::from(*b))),
        _ => None,
    }
}

/// 2^63 as a float: the first value `i64` cannot hold.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn cast_float(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.trim().is_empty() => return Some(Value::Null),
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Number::from_f64(f).map(Value::Number)
}

fn cast_text(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn cast_timestamp(value: &Value) -> Option<Value> {
    let Value::String(s) = value else {
        return None;
    };
    if s.trim().is_empty() {
        return Some(Value::Null);
    }
    let parsed = DateTime::parse_from_rfc3339(s.trim()).ok()?;
    Some(Value::String(
        parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ))
}

/// What the host declares about one entity type: attribute types and any
/// attributes that must never reach the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySchema {
    pub entity_type: String,
    pub attributes: BTreeMap<String, AttributeType>,
    pub excluded: BTreeSet<String>,
}

impl EntitySchema {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, kind: AttributeType) -> Self {
        self.attributes.insert(name.into(), kind);
        self
    }

    pub fn with_excluded(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }

    /// Cast `value` by the declared type of `attribute`, or return it as-is
    /// when the attribute is untyped.
    pub fn normalize(&self, attribute: &str, value: &Value) -> Value {
        match self.attributes.get(attribute) {
            Some(kind) => kind.cast(value),
            None => value.clone(),
        }
    }

    /// True when `value` is what a new record would hold anyway.
    pub fn is_default(&self, attribute: &str, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        self.attributes
            .get(attribute)
            .is_some_and(|kind| kind.cast(value) == kind.default_value())
    }

    /// Whether the live schema still has this attribute. A schema with no
    /// declared attributes is open and accepts everything.
    pub fn knows(&self, attribute: &str) -> bool {
        self.attributes.is_empty() || self.attributes.contains_key(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_cast_ignores_representation() {
        let t = AttributeType::Integer;
        assert_eq!(t.cast(&json!("0")), json!(0));
        assert_eq!(t.cast(&json!(" 12 ")), json!(12));
        assert_eq!(t.cast(&json!(3.0)), json!(3));
        assert_eq!(t.cast(&json!("")), Value::Null);
        assert_eq!(t.cast(&json!("abc")), json!("abc"));
        assert_eq!(t.try_cast(&json!("abc")), None);
    }

    #[test]
    fn integer_cast_keeps_values_beyond_i64() {
        let t = AttributeType::Integer;
        let above = json!(9_223_372_036_854_775_808u64);
        let max = json!(u64::MAX);

        assert_eq!(t.cast(&above), above);
        assert_eq!(t.cast(&max), max);
        assert_ne!(t.cast(&above), t.cast(&max));
        assert_eq!(t.cast(&json!("18446744073709551615")), max);

        assert_eq!(t.try_cast(&json!(1e19)), None);
        assert_ne!(t.cast(&json!(1e19)), t.cast(&json!(1e20)));
        assert_eq!(t.cast(&json!(-4.0)), json!(-4));
    }

    #[test]
    fn boolean_cast_accepts_common_spellings() {
        let t = AttributeType::Boolean;
        for truthy in [json!(1), json!("1"), json!("t"), json!("true"), json!(true)] {
            assert_eq!(t.cast(&truthy), json!(true), "{truthy}");
        }
        for falsy in [json!(0), json!("0"), json!("f"), json!("false"), json!(false)] {
            assert_eq!(t.cast(&falsy), json!(false), "{falsy}");
        }
    }

    #[test]
    fn timestamp_cast_normalizes_offsets() {
        let t = AttributeType::Timestamp;
        assert_eq!(
            t.cast(&json!("2026-01-01T02:00:00+02:00")),
            json!("2026-01-01T00:00:00Z")
        );
    }

    #[test]
    fn text_and_float_casts() {
        assert_eq!(AttributeType::Text.cast(&json!(5)), json!("5"));
        assert_eq!(AttributeType::Float.cast(&json!("1.5")), json!(1.5));
        assert_eq!(AttributeType::Float.cast(&json!(2)), json!(2.0));
    }

    #[test]
    fn defaults_follow_declared_types() {
        let schema = EntitySchema::new("User")
            .with_attribute("logins", AttributeType::Integer)
            .with_attribute("activated", AttributeType::Boolean);

        assert!(schema.is_default("logins", &json!("0")));
        assert!(schema.is_default("activated", &json!(false)));
        assert!(schema.is_default("anything", &Value::Null));
        assert!(!schema.is_default("logins", &json!(1)));
        assert!(!schema.is_default("untyped", &json!(0)));
    }

    #[test]
    fn open_schema_knows_everything() {
        assert!(EntitySchema::new("Note").knows("whatever"));
        let closed = EntitySchema::new("User").with_attribute("name", AttributeType::Text);
        assert!(closed.knows("name"));
        assert!(!closed.knows("old_attribute"));
    }
}

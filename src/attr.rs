use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::keys::LABEL_KEY;

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Duration(Duration),
    Time(DateTime<Utc>),
    Group(Vec<Attr>),
    /// Opaque structured payload, emitted as-is.
    Json(serde_json::Value),
}

impl Value {
    pub fn as_group(&self) -> Option<&[Attr]> {
        match self {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// A key paired with a [`Value`].
///
/// Keys need not be unique within a record; when two attributes with the
/// same key land in the same JSON object the later one wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::Str(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::I64(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, Value::U64(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::F64(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Time(value))
    }

    pub fn group(key: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) -> Self {
        Self::new(key, Value::Group(attrs.into_iter().collect()))
    }

    pub fn json(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(key, Value::Json(value))
    }

    /// Serialize `value` into an opaque payload attribute.
    pub fn any<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::json(key, serde_json::to_value(value)?))
    }
}

/// Build an inline label group. Its members end up in the entry's
/// `logging.googleapis.com/labels` map instead of the payload.
///
/// The label map is flat. A nested group member becomes one label per
/// leaf, keyed `outer.inner`, and a JSON object, array or null member is
/// written as its compact JSON text.
pub fn labels(attrs: impl IntoIterator<Item = Attr>) -> Attr {
    Attr::group(LABEL_KEY, attrs)
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U64(v as u64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(v: Vec<Attr>) -> Self {
        Value::Group(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

/// Split attributes into inline labels and everything else.
///
/// Members of every label group are flattened into the first vector in
/// order. A labels-keyed attribute that is not a group stays in the
/// second vector.
pub(crate) fn split_labels(attrs: &[Attr]) -> (Vec<Attr>, Vec<Attr>) {
    let mut labels = Vec::new();
    let mut rest = Vec::with_capacity(attrs.len());
    for attr in attrs {
        match &attr.value {
            Value::Group(members) if attr.key == LABEL_KEY => labels.extend(members.iter().cloned()),
            _ => rest.push(attr.clone()),
        }
    }
    (labels, rest)
}

/// Flatten label values into scalar labels, in order.
pub(crate) fn flatten_labels(labels: &[Attr]) -> Vec<Attr> {
    let mut out = Vec::with_capacity(labels.len());
    flatten_into(&mut out, "", labels);
    out
}

fn flatten_into(out: &mut Vec<Attr>, prefix: &str, labels: &[Attr]) {
    for label in labels {
        let key = match (prefix.is_empty(), label.key.is_empty()) {
            (true, _) => label.key.clone(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}.{}", prefix, label.key),
        };
        match &label.value {
            Value::Group(members) => flatten_into(out, &key, members),
            Value::Json(json) if json.is_object() || json.is_array() || json.is_null() => {
                out.push(Attr::string(key, json.to_string()))
            }
            value => out.push(Attr::new(key, value.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_labels_flattens_label_groups() {
        let attrs = vec![
            Attr::string("a", "1"),
            labels([Attr::string("team", "x")]),
            Attr::int("b", 2),
            labels([Attr::string("req", "123")]),
        ];
        let (labels, rest) = split_labels(&attrs);
        assert_eq!(labels, vec![Attr::string("team", "x"), Attr::string("req", "123")]);
        assert_eq!(rest, vec![Attr::string("a", "1"), Attr::int("b", 2)]);
    }

    #[test]
    fn scalar_labels_key_is_not_a_label_group() {
        let attr = Attr::string(LABEL_KEY, "oops");
        let (labels, rest) = split_labels(std::slice::from_ref(&attr));
        assert!(labels.is_empty());
        assert_eq!(rest, vec![attr]);
    }

    #[test]
    fn nested_label_values_are_flattened() {
        let flat = flatten_labels(&[
            Attr::string("env", "prod"),
            Attr::group("svc", [Attr::string("name", "api"), Attr::int("port", 80)]),
            Attr::group("", [Attr::bool("canary", true)]),
            Attr::json("tags", serde_json::json!(["a", "b"])),
            Attr::json("count", serde_json::json!(3)),
        ]);
        assert_eq!(
            flat,
            vec![
                Attr::string("env", "prod"),
                Attr::string("svc.name", "api"),
                Attr::int("svc.port", 80),
                Attr::bool("canary", true),
                Attr::string("tags", r#"["a","b"]"#),
                Attr::json("count", serde_json::json!(3)),
            ]
        );
    }

    #[test]
    fn any_serializes_payload() {
        #[derive(Serialize)]
        struct Payload {
            id: u32,
        }
        let attr = Attr::any("p", &Payload { id: 7 }).unwrap();
        assert_eq!(attr.value, Value::Json(serde_json::json!({"id": 7})));
    }
}

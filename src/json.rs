//! JSON encoding of a rendered entry: one object per line.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

use crate::attr::{Attr, Value};
use crate::keys::{is_reserved, TIME_KEY};

/// The final attribute set of one record, in output order.
///
/// `head` holds the fields the handler always writes first (time,
/// severity, message). `payload` is the user fields, already wrapped in
/// their groups. `tail` holds labels, the other reserved fields, source
/// location and trace correlation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub head: Vec<Attr>,
    pub payload: Vec<Attr>,
    pub tail: Vec<Attr>,
}

impl Entry {
    /// All attributes in output order.
    pub fn attrs(&self) -> impl DoubleEndedIterator<Item = &Attr> {
        self.head.iter().chain(&self.payload).chain(&self.tail)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs().rev().find(|a| a.key == key).map(|a| &a.value)
    }

    /// Encode as a single JSON line, trailing newline included.
    pub fn encode_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(&self.to_json())?;
        line.push(b'\n');
        Ok(line)
    }

    /// Build the JSON object. A top-level payload field never replaces
    /// the timestamp or a reserved field from `head`; `tail` fields overwrite anything
    /// written before them.
    pub fn to_json(&self) -> Json {
        let mut object = Map::new();
        append(&mut object, &self.head);
        for attr in &self.payload {
            insert_payload(&mut object, attr);
        }
        append(&mut object, &self.tail);
        Json::Object(object)
    }
}

/// Convert a single value to JSON.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Str(s) => Json::String(s.clone()),
        Value::I64(n) => Json::from(*n),
        Value::U64(n) => Json::from(*n),
        Value::F64(f) => Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(f.to_string())),
        Value::Bool(b) => Json::Bool(*b),
        Value::Duration(d) => Json::from(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)),
        Value::Time(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Group(attrs) => {
            let mut object = Map::new();
            append(&mut object, attrs);
            Json::Object(object)
        }
        Value::Json(v) => v.clone(),
    }
}

fn insert_payload(object: &mut Map<String, Json>, attr: &Attr) {
    match &attr.value {
        Value::Group(members) if attr.key.is_empty() => {
            for member in members {
                insert_payload(object, member);
            }
        }
        _ if (attr.key == TIME_KEY || is_reserved(&attr.key))
            && object.contains_key(&attr.key) => {}
        _ => insert(object, attr),
    }
}

fn append(object: &mut Map<String, Json>, attrs: &[Attr]) {
    for attr in attrs {
        insert(object, attr);
    }
}

fn insert(object: &mut Map<String, Json>, attr: &Attr) {
    match &attr.value {
        Value::Group(members) if attr.key.is_empty() => append(object, members),
        Value::Group(members) => {
            let mut nested = Map::new();
            append(&mut nested, members);
            if !nested.is_empty() {
                object.insert(attr.key.clone(), Json::Object(nested));
            }
        }
        _ if attr.key.is_empty() => {}
        value => {
            object.insert(attr.key.clone(), to_json(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn encode(payload: Vec<Attr>) -> Json {
        Entry {
            payload,
            ..Entry::default()
        }
        .to_json()
    }

    #[test]
    fn scalar_values() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let got = encode(vec![
            Attr::string("s", "x"),
            Attr::int("i", -3),
            Attr::uint("u", 3),
            Attr::float("f", 1.5),
            Attr::float("nan", f64::NAN),
            Attr::bool("b", true),
            Attr::duration("d", Duration::from_millis(2)),
            Attr::time("t", t),
            Attr::json("j", json!({"a": [1, 2]})),
        ]);
        assert_eq!(
            got,
            json!({
                "s": "x",
                "i": -3,
                "u": 3,
                "f": 1.5,
                "nan": "NaN",
                "b": true,
                "d": 2_000_000,
                "t": "2024-01-02T03:04:05Z",
                "j": {"a": [1, 2]},
            })
        );
    }

    #[test]
    fn empty_groups_are_omitted_and_empty_keys_inlined() {
        let got = encode(vec![
            Attr::group("empty", []),
            Attr::group("only_empty", [Attr::group("inner", [])]),
            Attr::group("", [Attr::int("inlined", 1)]),
            Attr::group("g", [Attr::group("", [Attr::int("x", 2)])]),
            Attr::string("", "dropped"),
        ]);
        assert_eq!(got, json!({"inlined": 1, "g": {"x": 2}}));
    }

    #[test]
    fn later_keys_overwrite_but_keep_position() {
        let got = encode(vec![
            Attr::int("a", 1),
            Attr::int("b", 2),
            Attr::int("a", 3),
        ]);
        let keys: Vec<_> = got.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(got["a"], 3);
    }

    #[test]
    fn payload_does_not_replace_head_reserved_fields() {
        let entry = Entry {
            head: vec![Attr::string("severity", "INFO")],
            payload: vec![Attr::string("severity", "spoofed"), Attr::string("k", "v")],
            tail: vec![],
        };
        assert_eq!(entry.to_json(), json!({"severity": "INFO", "k": "v"}));
    }

    #[test]
    fn payload_does_not_replace_timestamp() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let entry = Entry {
            head: vec![Attr::time("time", t)],
            payload: vec![
                Attr::string("time", "spoofed"),
                Attr::group("", [Attr::string("time", "inlined")]),
                Attr::group("g", [Attr::string("time", "nested")]),
            ],
            tail: vec![],
        };
        assert_eq!(
            entry.to_json(),
            json!({"time": "2024-01-02T03:04:05Z", "g": {"time": "nested"}})
        );
    }

    #[test]
    fn tail_overwrites_payload() {
        let entry = Entry {
            head: vec![],
            payload: vec![Attr::string("httpRequest", "user")],
            tail: vec![Attr::json("httpRequest", json!({"status": 200}))],
        };
        assert_eq!(entry.to_json(), json!({"httpRequest": {"status": 200}}));
    }

    #[test]
    fn line_is_newline_terminated() {
        let line = encode_entry_line();
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);
    }

    fn encode_entry_line() -> Vec<u8> {
        Entry {
            payload: vec![Attr::string("multi", "a\nb")],
            ..Entry::default()
        }
        .encode_line()
        .unwrap()
    }
}

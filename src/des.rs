//! Deserializers for the loosely typed replies.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Error;

pub fn des_null_to_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let v = Option::<T>::deserialize(de)?;
    Ok(v.unwrap_or_default())
}

// The same field comes as `"0"` from one endpoint and as `0` from another.
pub fn des_any_to_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    Ok(value_to_string(&v))
}

pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Turns a decoded reply into a typed one.
pub fn from_reply<T>(v: Value) -> crate::Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(v).map_err(|e| Error::MalformedResponse(e.to_string()))
}

// Takes a nested member out of a reply, `None` if a step is missing or null.
pub fn take_path(mut v: Value, path: &[&str]) -> Option<Value> {
    for key in path {
        v = match v {
            Value::Object(mut m) => m.remove(*key)?,
            _ => return None,
        };
    }

    match v {
        Value::Null => None,
        v => Some(v),
    }
}

pub fn take_list(v: Value, path: &[&str]) -> Vec<Value> {
    match take_path(v, path) {
        Some(Value::Array(a)) => a,
        _ => vec![],
    }
}

pub fn take_object(v: Value, path: &[&str]) -> Value {
    match take_path(v, path) {
        Some(o @ Value::Object(_)) => o,
        _ => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::{des_any_to_string, des_null_to_default, take_list, take_object, take_path};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, Debug)]
    struct Reply {
        #[serde(default, deserialize_with = "des_any_to_string")]
        code: String,

        #[serde(default, deserialize_with = "des_null_to_default")]
        name: String,
    }

    #[test]
    fn loose_fields_test() {
        let r: Reply = serde_json::from_str(r#"{"code": 0, "name": null}"#).unwrap();
        assert_eq!(r.code, "0");
        assert_eq!(r.name, "");

        let r: Reply = serde_json::from_str(r#"{"code": "2", "name": "otn"}"#).unwrap();
        assert_eq!(r.code, "2");
        assert_eq!(r.name, "otn");

        let r: Reply = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(r.code, "");
    }

    #[test]
    fn take_path_test() {
        let reply = json!({"status": true, "data": {"data": [1, 2], "flag": null}});

        assert_eq!(take_path(reply.clone(), &["data", "data"]), Some(json!([1, 2])));
        assert_eq!(take_path(reply.clone(), &["data", "flag"]), None);
        assert_eq!(take_path(reply.clone(), &["data", "data", "x"]), None);
        assert_eq!(take_list(reply.clone(), &["data", "missing"]), Vec::<serde_json::Value>::new());
        assert_eq!(take_object(reply.clone(), &["data", "data"]), json!({}));
        assert_eq!(take_object(reply, &["data"]), json!({"data": [1, 2], "flag": null}));
    }
}

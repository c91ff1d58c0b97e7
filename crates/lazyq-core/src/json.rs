//! Conversion between `Value` and JSON.

use std::rc::Rc;

use serde_json::{Map, Number as JsonNumber, Value as Json};

use crate::error::{Error, Result};
use crate::value::{Array, Key, Value};

impl Value {
    /// Sequential `0..n` arrays become JSON arrays, any other array an object.
    pub fn to_json(&self) -> Result<Json> {
        match self {
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Int(i) => Ok(Json::Number((*i).into())),
            Value::Float(f) => JsonNumber::from_f64(*f).map(Json::Number).ok_or_else(|| {
                Error::Serialization(format!("cannot encode non-finite float {}", f))
            }),
            Value::Str(s) => Ok(Json::String(s.clone())),
            Value::Array(a) => array_to_json(a),
            Value::Object(o) => {
                if let Some(replacement) = o.to_json() {
                    return replacement?.to_json();
                }
                if let Some(iter) = o.traverse() {
                    let mut arr = Array::new();
                    for entry in iter? {
                        let entry = entry?;
                        arr.insert(Key::from_value(&entry.key)?, entry.value);
                    }
                    return array_to_json(&arr);
                }
                match o.to_string_repr() {
                    Some(s) => Ok(Json::String(s)),
                    None => Ok(Json::Object(Map::new())),
                }
            }
            Value::Func(f) => Err(Error::Serialization(format!(
                "cannot encode callable {}",
                f.label()
            ))),
        }
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = self.to_json()?;
        let out = if pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(out)
    }
}

fn array_to_json(a: &Array) -> Result<Json> {
    if a.is_list() {
        return Ok(Json::Array(
            a.values().map(Value::to_json).collect::<Result<Vec<_>>>()?,
        ));
    }
    let mut map = Map::with_capacity(a.len());
    for (k, v) in a.iter() {
        map.insert(k.to_string(), v.to_json()?);
    }
    Ok(Json::Object(map))
}

impl From<Json> for Value {
    fn from(j: Json) -> Self {
        match j {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::list(items),
            Json::Object(map) => Value::Array(Rc::new(
                map.into_iter()
                    .map(|(k, v)| (Key::from(k), Value::from(v)))
                    .collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_vs_object_encoding() {
        let list = Value::list(vec![1, 2]);
        assert_eq!(list.to_json_string(false).unwrap(), "[1,2]");

        let mut sparse = Array::new();
        sparse.insert(Key::Int(1), Value::from("a"));
        sparse.insert(Key::Int(0), Value::from("b"));
        assert_eq!(
            Value::from(sparse).to_json_string(false).unwrap(),
            r#"{"1":"a","0":"b"}"#
        );
    }

    #[test]
    fn test_non_finite_float_fails() {
        let err = Value::Float(f64::INFINITY).to_json().unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_json() {
        let v = Value::from(serde_json::json!({"a": [1, 2.5, null]}));
        assert_eq!(v.to_json_string(false).unwrap(), r#"{"a":[1,2.5,null]}"#);
    }
}

//! `of_type` and `cast`: filtering and coercion by type name.

use std::rc::Rc;

use lazyq_core::{Array, Entry, Error, Key, Number, Result, Value};

use crate::enumerable::Enumerable;

/// Type names understood by `of_type` and `cast`. Anything else is treated as
/// a class name and matched with `Object::is_instance_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    Array,
    Int,
    Float,
    String,
    Bool,
    Null,
    Numeric,
    Scalar,
    Object,
    Callable,
    Iterable,
    Class(String),
}

impl TypeName {
    pub fn parse(name: &str) -> TypeName {
        match name.trim().to_ascii_lowercase().as_str() {
            "array" => TypeName::Array,
            "int" | "integer" | "long" => TypeName::Int,
            "float" | "double" | "real" => TypeName::Float,
            "string" => TypeName::String,
            "bool" | "boolean" => TypeName::Bool,
            "null" | "unset" => TypeName::Null,
            "numeric" => TypeName::Numeric,
            "scalar" => TypeName::Scalar,
            "object" => TypeName::Object,
            "callable" => TypeName::Callable,
            "iterable" => TypeName::Iterable,
            _ => TypeName::Class(name.trim().to_string()),
        }
    }

    pub fn matches(&self, v: &Value) -> bool {
        match self {
            TypeName::Array => matches!(v, Value::Array(_)),
            TypeName::Int => matches!(v, Value::Int(_)),
            TypeName::Float => matches!(v, Value::Float(_)),
            TypeName::String => matches!(v, Value::Str(_)),
            TypeName::Bool => matches!(v, Value::Bool(_)),
            TypeName::Null => v.is_null(),
            TypeName::Numeric => v.is_numeric(),
            TypeName::Scalar => matches!(
                v,
                Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
            ),
            TypeName::Object => matches!(v, Value::Object(_)),
            TypeName::Callable => match v {
                Value::Func(_) => true,
                Value::Object(o) => o.invoke_arity().is_some(),
                _ => false,
            },
            TypeName::Iterable => match v {
                Value::Array(_) => true,
                Value::Object(o) => o.traverse().is_some(),
                _ => false,
            },
            TypeName::Class(class) => match v {
                Value::Object(o) => o.is_instance_of(class),
                _ => false,
            },
        }
    }

    fn label(&self) -> &str {
        match self {
            TypeName::Array => "array",
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::String => "string",
            TypeName::Bool => "bool",
            TypeName::Null => "null",
            TypeName::Numeric => "numeric",
            TypeName::Scalar => "scalar",
            TypeName::Object => "object",
            TypeName::Callable => "callable",
            TypeName::Iterable => "iterable",
            TypeName::Class(c) => c,
        }
    }

    /// Coerce `v` to this type, or fail with `Conversion`.
    pub fn coerce(&self, v: Value) -> Result<Value> {
        if self.matches(&v) {
            return Ok(v);
        }
        let fail = |v: &Value, to: &str| Error::conversion(v.type_name(), to);
        match self {
            TypeName::Array => match &v {
                Value::Null => Ok(Value::Array(Rc::new(Array::new()))),
                Value::Object(o) => match o.traverse() {
                    Some(iter) => {
                        let mut arr = Array::new();
                        for e in iter? {
                            let e = e?;
                            arr.insert(Key::from_value(&e.key)?, e.value);
                        }
                        Ok(Value::Array(Rc::new(arr)))
                    }
                    None => Err(fail(&v, "array")),
                },
                Value::Func(_) => Err(fail(&v, "array")),
                _ => Ok(Value::list([v])),
            },
            TypeName::Int => match &v {
                Value::Null | Value::Bool(_) | Value::Float(_) | Value::Str(_) => {
                    v.to_i64().map(Value::Int)
                }
                _ => Err(fail(&v, "int")),
            },
            TypeName::Float => match v.to_number() {
                Some(n) => Ok(Value::Float(n.as_f64())),
                _ => Err(fail(&v, "float")),
            },
            TypeName::Numeric => match v.to_number() {
                Some(Number::Int(i)) => Ok(Value::Int(i)),
                Some(Number::Float(f)) => Ok(Value::Float(f)),
                None => Err(fail(&v, "numeric")),
            },
            TypeName::String => v
                .to_display_string()
                .map(Value::Str)
                .map_err(|_| fail(&v, "string")),
            TypeName::Bool => Ok(Value::Bool(v.is_truthy())),
            TypeName::Null => Ok(Value::Null),
            other => Err(fail(&v, other.label())),
        }
    }
}

impl Enumerable {
    /// Elements whose value is of the named type. Keys are preserved.
    pub fn of_type(&self, type_name: &str) -> Enumerable {
        let ty = TypeName::parse(type_name);
        self.pipe(move |up| {
            let ty = ty.clone();
            Ok(Box::new(up.filter(move |r| match r {
                Ok(e) => ty.matches(&e.value),
                Err(_) => true,
            })))
        })
    }

    /// Every element coerced to the named type; an element without a
    /// meaningful coercion fails the enumeration with `Conversion`.
    pub fn cast(&self, type_name: &str) -> Enumerable {
        let ty = TypeName::parse(type_name);
        self.pipe(move |up| {
            let ty = ty.clone();
            Ok(Box::new(up.map(move |r| {
                let e = r?;
                Ok(Entry {
                    key: e.key,
                    value: ty.coerce(e.value)?,
                })
            })))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(e: &Enumerable) -> Result<Vec<Value>> {
        e.open()?.map(|r| r.map(|e| e.value)).collect()
    }

    #[test]
    fn test_of_type_filters_silently() {
        let src = Enumerable::from_values(vec![
            Value::Int(1),
            Value::from("2"),
            Value::Float(3.5),
            Value::Null,
            Value::Bool(true),
        ]);
        assert_eq!(vals(&src.of_type("int")).unwrap(), vec![Value::Int(1)]);
        assert_eq!(vals(&src.of_type("numeric")).unwrap().len(), 3);
        assert_eq!(vals(&src.of_type("scalar")).unwrap().len(), 4);
        assert_eq!(vals(&src.of_type("null")).unwrap(), vec![Value::Null]);
        assert!(vals(&src.of_type("Dictionary")).unwrap().is_empty());
    }

    #[test]
    fn test_cast_coerces_or_fails() {
        let src = Enumerable::from_values(vec![Value::from("12"), Value::Float(2.9), Value::Bool(true)]);
        assert_eq!(
            vals(&src.cast("int")).unwrap(),
            vec![Value::Int(12), Value::Int(2), Value::Int(1)]
        );
        let bad = Enumerable::from_values(vec![Value::from("abc")]);
        let err = vals(&bad.cast("int")).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert_eq!(
            vals(&Enumerable::from_values(vec![1]).cast("string")).unwrap(),
            vec![Value::from("1")]
        );
        assert!(vals(&Enumerable::from_values(vec![1]).cast("object")).is_err());
    }
}

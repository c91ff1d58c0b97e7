//! Capability trait for host objects carried inside a `Value`.
//!
//! Every capability has a default that reports "not supported", so an
//! implementor only overrides what it actually offers.

use std::any::Any;
use std::fmt;

use crate::error::{Error, Result};
use crate::value::{EntryIter, Value};

pub trait Object: fmt::Debug {
    fn class_name(&self) -> &str;

    /// Exact or inheritance-compatible class match. Case-insensitive.
    fn is_instance_of(&self, class: &str) -> bool {
        self.class_name().eq_ignore_ascii_case(class)
    }

    fn property(&self, name: &str) -> Result<Value> {
        Err(Error::Evaluation(format!(
            "undefined property {}::${}",
            self.class_name(),
            name
        )))
    }

    /// Declared arity of a method, `None` if the method does not exist.
    fn method_arity(&self, _name: &str) -> Option<usize> {
        None
    }

    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value> {
        Err(Error::Evaluation(format!(
            "call to undefined method {}::{}()",
            self.class_name(),
            name
        )))
    }

    /// Declared arity when the object itself can be called.
    fn invoke_arity(&self) -> Option<usize> {
        None
    }

    fn invoke(&self, _args: &[Value]) -> Result<Value> {
        Err(Error::Unsupported(format!(
            "{} object is not invokable",
            self.class_name()
        )))
    }

    /// Keyed iteration, for objects that can act as a sequence source.
    fn traverse(&self) -> Option<Result<EntryIter>> {
        None
    }

    fn is_disposable(&self) -> bool {
        false
    }

    fn dispose(&self) -> Result<()> {
        Ok(())
    }

    /// Replacement value used when encoding to JSON.
    fn to_json(&self) -> Option<Result<Value>> {
        None
    }

    fn to_string_repr(&self) -> Option<String> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

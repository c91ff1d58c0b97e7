//! Validator plumbing shared by the containers.

use lazyq_core::{Error, Invocable, Result, Value};

pub(crate) fn describe(v: &Value) -> String {
    match v {
        Value::Str(s) => format!("{:?}", s),
        Value::Array(_) | Value::Object(_) | Value::Func(_) => v.type_name().to_string(),
        other => other.to_display_string().unwrap_or_else(|_| other.type_name().to_string()),
    }
}

pub(crate) fn check_key(validator: Option<&Invocable>, key: &Value) -> Result<()> {
    match validator {
        Some(f) if !f.call1(key)?.is_truthy() => Err(Error::InvalidKey(format!(
            "{} rejected by key validator",
            describe(key)
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn check_item(validator: Option<&Invocable>, item: &Value) -> Result<()> {
    match validator {
        Some(f) if !f.call1(item)?.is_truthy() => Err(Error::InvalidItem(format!(
            "{} rejected by validator",
            describe(item)
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn check_writable(read_only: bool, what: &str) -> Result<()> {
    if read_only {
        Err(Error::Unsupported(format!("{} is read-only", what)))
    } else {
        Ok(())
    }
}

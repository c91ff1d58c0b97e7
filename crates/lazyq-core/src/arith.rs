//! Arithmetic over dynamic values. Integer overflow promotes to float.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::{Number, Value};

fn operand(v: &Value, op: &str) -> Result<Number> {
    v.to_number().ok_or_else(|| {
        Error::Evaluation(format!(
            "unsupported operand type {} for `{}`",
            v.type_name(),
            op
        ))
    })
}

fn binary_numeric(
    a: &Value,
    b: &Value,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (operand(a, op)?, operand(b, op)?) {
        (Number::Int(x), Number::Int(y)) => Ok(match int_op(x, y) {
            Some(r) => Value::Int(r),
            None => Value::Float(float_op(x as f64, y as f64)),
        }),
        (x, y) => Ok(Value::Float(float_op(x.as_f64(), y.as_f64()))),
    }
}

/// `a + b`. Two arrays combine as a key union with the left side winning.
pub fn add(a: &Value, b: &Value) -> Result<Value> {
    if let (Value::Array(x), Value::Array(y)) = (a, b) {
        let mut out = (**x).clone();
        for (k, v) in y.iter() {
            if !out.contains_key(k) {
                out.insert(k.clone(), v.clone());
            }
        }
        return Ok(Value::Array(Rc::new(out)));
    }
    binary_numeric(a, b, "+", i64::checked_add, |x, y| x + y)
}

pub fn sub(a: &Value, b: &Value) -> Result<Value> {
    binary_numeric(a, b, "-", i64::checked_sub, |x, y| x - y)
}

pub fn mul(a: &Value, b: &Value) -> Result<Value> {
    binary_numeric(a, b, "*", i64::checked_mul, |x, y| x * y)
}

/// `a / b`: integer result only when the division is exact.
pub fn div(a: &Value, b: &Value) -> Result<Value> {
    let (x, y) = (operand(a, "/")?, operand(b, "/")?);
    if y.as_f64() == 0.0 {
        return Err(Error::Evaluation("division by zero".into()));
    }
    match (x, y) {
        (Number::Int(x), Number::Int(y)) => match (x.checked_rem(y), x.checked_div(y)) {
            (Some(0), Some(q)) => Ok(Value::Int(q)),
            _ => Ok(Value::Float(x as f64 / y as f64)),
        },
        (x, y) => Ok(Value::Float(x.as_f64() / y.as_f64())),
    }
}

/// `a % b` on integer operands (floats are truncated).
pub fn rem(a: &Value, b: &Value) -> Result<Value> {
    let x = operand(a, "%")?;
    let y = operand(b, "%")?;
    let (x, y) = (truncate(x)?, truncate(y)?);
    if y == 0 {
        return Err(Error::Evaluation("modulo by zero".into()));
    }
    Ok(Value::Int(x.checked_rem(y).unwrap_or(0)))
}

fn truncate(n: Number) -> Result<i64> {
    match n {
        Number::Int(i) => Ok(i),
        Number::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
        Number::Float(_) => Err(Error::Evaluation("modulo of non-finite value".into())),
    }
}

pub fn neg(a: &Value) -> Result<Value> {
    match operand(a, "-")? {
        Number::Int(i) => Ok(i
            .checked_neg()
            .map(Value::Int)
            .unwrap_or(Value::Float(-(i as f64)))),
        Number::Float(f) => Ok(Value::Float(-f)),
    }
}

/// `a . b`
pub fn concat(a: &Value, b: &Value) -> Result<Value> {
    let mut s = a.to_display_string()?;
    s.push_str(&b.to_display_string()?);
    Ok(Value::Str(s))
}

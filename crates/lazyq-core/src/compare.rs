//! Loose three-way comparison used as the default ordering.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::invocable::Invocable;
use crate::value::{parse_numeric, Number, Value};

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Str(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
        Value::Func(_) => 6,
    }
}

pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        _ => Ordering::Less,
    })
}

pub fn cmp_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (x, y) => cmp_f64(x.as_f64(), y.as_f64()),
    }
}

/// Default comparison between arbitrary values.
///
/// - `null` sorts before everything except the empty string and `false`.
/// - Booleans compare by truthiness against any other value.
/// - Numbers and numeric strings compare numerically.
/// - Other strings compare bytewise.
/// - Arrays compare by length, then element by element.
/// - Remaining mixed pairs fall back to a fixed type rank.
pub fn loose_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, Value::Str(s)) => "".cmp(s.as_str()),
        (Value::Str(s), Value::Null) => s.as_str().cmp(""),
        (Value::Bool(_), _) | (_, Value::Bool(_)) | (Value::Null, _) | (_, Value::Null) => {
            a.is_truthy().cmp(&b.is_truthy())
        }
        (Value::Str(x), Value::Str(y)) => match (parse_numeric(x), parse_numeric(y)) {
            (Some(nx), Some(ny)) => cmp_numbers(nx, ny),
            _ => x.as_bytes().cmp(y.as_bytes()),
        },
        (Value::Int(_) | Value::Float(_), Value::Str(s)) => match parse_numeric(s) {
            Some(n) => cmp_numbers(number_of(a), n),
            None => a.to_display_string().unwrap_or_default().as_str().cmp(s.as_str()),
        },
        (Value::Str(s), Value::Int(_) | Value::Float(_)) => match parse_numeric(s) {
            Some(n) => cmp_numbers(n, number_of(b)),
            None => s.as_str().cmp(b.to_display_string().unwrap_or_default().as_str()),
        },
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            cmp_numbers(number_of(a), number_of(b))
        }
        (Value::Array(x), Value::Array(y)) => {
            let by_len = x.len().cmp(&y.len());
            if by_len != Ordering::Equal {
                return by_len;
            }
            for (k, xv) in x.iter() {
                match y.get(k) {
                    Some(yv) => {
                        let ord = loose_compare(xv, yv);
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    None => return Ordering::Greater,
                }
            }
            Ordering::Equal
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn number_of(v: &Value) -> Number {
    v.to_number().unwrap_or(Number::Int(0))
}

/// Interpret the result of a user comparer: negative, zero or positive.
pub fn ordering_from_value(v: &Value) -> Result<Ordering> {
    match v {
        Value::Null => Ok(Ordering::Equal),
        Value::Bool(b) => Ok(if *b {
            Ordering::Greater
        } else {
            Ordering::Equal
        }),
        Value::Int(i) => Ok(i.cmp(&0)),
        Value::Float(f) => Ok(cmp_f64(*f, 0.0)),
        Value::Str(s) => match parse_numeric(s) {
            Some(n) => Ok(cmp_numbers(n, Number::Int(0))),
            None => Err(Error::Evaluation(format!(
                "comparer returned non-numeric string {:?}",
                s
            ))),
        },
        other => Err(Error::Evaluation(format!(
            "comparer returned {}",
            other.type_name()
        ))),
    }
}

/// Compare with an explicit comparer when given, the loose default otherwise.
pub fn compare_with(comparer: Option<&Invocable>, a: &Value, b: &Value) -> Result<Ordering> {
    match comparer {
        Some(c) => ordering_from_value(&c.call2(a, b)?),
        None => Ok(loose_compare(a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_string_comparison() {
        assert_eq!(
            loose_compare(&Value::from("10"), &Value::from("9")),
            Ordering::Greater
        );
        assert_eq!(
            loose_compare(&Value::from("10"), &Value::from("9a")),
            Ordering::Less
        );
        assert_eq!(loose_compare(&Value::Int(2), &Value::Float(2.0)), Ordering::Equal);
    }

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(loose_compare(&Value::Null, &Value::Int(-5)), Ordering::Less);
        assert_eq!(loose_compare(&Value::Null, &Value::from("a")), Ordering::Less);
    }

    #[test]
    fn test_comparer_results() {
        assert_eq!(ordering_from_value(&Value::Int(-3)).unwrap(), Ordering::Less);
        assert_eq!(ordering_from_value(&Value::Float(0.5)).unwrap(), Ordering::Greater);
        assert!(ordering_from_value(&Value::list(vec![1])).is_err());
    }
}

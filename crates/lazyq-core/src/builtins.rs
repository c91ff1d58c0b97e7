//! Builtin functions available to lambdas and function-name callables.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::arith;
use crate::compare::loose_compare;
use crate::error::{Error, Result};
use crate::invocable::Invocable;
use crate::registry::FunctionRegistry;
use crate::value::{format_float, Array, Number, Value};

fn text(v: &Value) -> Result<String> {
    v.to_display_string()
}

fn eval_err(msg: impl Into<String>) -> Error {
    Error::Evaluation(msg.into())
}

/// Values of an array or a traversable object.
fn collection_values(v: &Value, func: &str) -> Result<Vec<Value>> {
    match v {
        Value::Array(a) => Ok(a.values().cloned().collect()),
        Value::Object(o) => match o.traverse() {
            Some(iter) => iter?.map(|e| e.map(|e| e.value)).collect(),
            None => Err(eval_err(format!(
                "{}(): {} is not traversable",
                func,
                o.class_name()
            ))),
        },
        other => Err(eval_err(format!(
            "{}(): expected array, got {}",
            func,
            other.type_name()
        ))),
    }
}

fn str_fn(reg: &mut FunctionRegistry, name: &str, f: fn(&str) -> Value) {
    reg.register(name, Invocable::unary(name, move |v| Ok(f(&text(v)?))));
}

fn is_fn(reg: &mut FunctionRegistry, name: &str, f: fn(&Value) -> bool) {
    reg.register(name, Invocable::unary(name, move |v| Ok(Value::Bool(f(v)))));
}

fn extremum(args: &[Value], want: Ordering, name: &str) -> Result<Value> {
    let items = match args {
        [single] => collection_values(single, name)?,
        many => many.to_vec(),
    };
    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| eval_err(format!("{}(): empty input", name)))?;
    for v in iter {
        if loose_compare(&v, &best) == want {
            best = v;
        }
    }
    Ok(best)
}

fn round_half_away(f: f64, precision: i64) -> f64 {
    let factor = 10f64.powi(precision.clamp(-15, 15) as i32);
    (f * factor).round() / factor
}

fn char_slice(s: &str, start: i64, len: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;
    let from = if start < 0 { (n + start).max(0) } else { start.min(n) };
    let to = match len {
        None => n,
        Some(l) if l < 0 => (n + l).max(from),
        Some(l) => from.saturating_add(l).min(n),
    };
    if to <= from {
        return String::new();
    }
    chars[from as usize..to as usize].iter().collect()
}

pub(crate) fn install(reg: &mut FunctionRegistry) {
    // strings
    reg.register(
        "strlen",
        Invocable::unary("strlen", |v| Ok(Value::from(text(v)?.len()))),
    );
    str_fn(reg, "strtoupper", |s| Value::from(s.to_ascii_uppercase()));
    str_fn(reg, "strtolower", |s| Value::from(s.to_ascii_lowercase()));
    str_fn(reg, "ucfirst", |s| {
        let mut c = s.chars();
        match c.next() {
            Some(first) => Value::from(format!("{}{}", first.to_ascii_uppercase(), c.as_str())),
            None => Value::from(""),
        }
    });
    str_fn(reg, "strrev", |s| Value::from(s.chars().rev().collect::<String>()));
    reg.register(
        "trim",
        Invocable::binary("trim", |v, chars| {
            let s = text(v)?;
            Ok(Value::from(match chars {
                Value::Null => s
                    .trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
                    .to_string(),
                other => {
                    let set = text(other)?;
                    s.trim_matches(|c: char| set.contains(c)).to_string()
                }
            }))
        }),
    );
    reg.register(
        "str_repeat",
        Invocable::binary("str_repeat", |v, n| {
            let n = n.to_i64()?;
            if n < 0 {
                return Err(eval_err("str_repeat(): negative count"));
            }
            let s = text(v)?;
            let fits = usize::try_from(n)
                .ok()
                .and_then(|n| s.len().checked_mul(n))
                .map_or(false, |total| total <= isize::MAX as usize);
            if !fits {
                return Err(eval_err("str_repeat(): result too large"));
            }
            Ok(Value::from(s.repeat(n as usize)))
        }),
    );
    reg.register(
        "substr",
        Invocable::ternary("substr", |v, start, len| {
            let len = if len.is_null() { None } else { Some(len.to_i64()?) };
            Ok(Value::from(char_slice(&text(v)?, start.to_i64()?, len)))
        }),
    );
    reg.register(
        "strpos",
        Invocable::binary("strpos", |h, n| {
            let needle = text(n)?;
            Ok(match text(h)?.find(&needle) {
                Some(pos) => Value::from(pos),
                None => Value::Bool(false),
            })
        }),
    );
    reg.register(
        "str_contains",
        Invocable::binary("str_contains", |h, n| {
            Ok(Value::Bool(text(h)?.contains(&text(n)?)))
        }),
    );
    reg.register(
        "str_starts_with",
        Invocable::binary("str_starts_with", |h, n| {
            Ok(Value::Bool(text(h)?.starts_with(&text(n)?)))
        }),
    );
    reg.register(
        "str_ends_with",
        Invocable::binary("str_ends_with", |h, n| {
            Ok(Value::Bool(text(h)?.ends_with(&text(n)?)))
        }),
    );
    reg.register(
        "strcmp",
        Invocable::binary("strcmp", |a, b| {
            Ok(Value::Int(text(a)?.cmp(&text(b)?) as i64))
        }),
    );
    reg.register(
        "strcasecmp",
        Invocable::binary("strcasecmp", |a, b| {
            let (a, b) = (text(a)?.to_ascii_lowercase(), text(b)?.to_ascii_lowercase());
            Ok(Value::Int(a.cmp(&b) as i64))
        }),
    );
    reg.register(
        "implode",
        Invocable::binary("implode", |sep, pieces| {
            let (sep, pieces) = match (sep, pieces) {
                (Value::Array(_) | Value::Object(_), Value::Null) => (Value::from(""), sep),
                _ => (sep.clone(), pieces),
            };
            let sep = text(&sep)?;
            let parts = collection_values(pieces, "implode")?
                .iter()
                .map(text)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::from(parts.join(&sep)))
        }),
    );
    reg.register(
        "explode",
        Invocable::binary("explode", |sep, s| {
            let sep = text(sep)?;
            if sep.is_empty() {
                return Err(eval_err("explode(): empty separator"));
            }
            Ok(Value::list(text(s)?.split(sep.as_str()).map(Value::from)))
        }),
    );

    // math
    reg.register(
        "abs",
        Invocable::unary("abs", |v| match v.to_number() {
            Some(Number::Int(i)) => Ok(i
                .checked_abs()
                .map(Value::Int)
                .unwrap_or(Value::Float((i as f64).abs()))),
            Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
            None => Err(eval_err(format!("abs(): {} given", v.type_name()))),
        }),
    );
    reg.register(
        "floor",
        Invocable::unary("floor", |v| Ok(Value::Float(v.to_f64()?.floor()))),
    );
    reg.register(
        "ceil",
        Invocable::unary("ceil", |v| Ok(Value::Float(v.to_f64()?.ceil()))),
    );
    reg.register(
        "round",
        Invocable::binary("round", |v, p| {
            let p = if p.is_null() { 0 } else { p.to_i64()? };
            Ok(Value::Float(round_half_away(v.to_f64()?, p)))
        }),
    );
    reg.register(
        "sqrt",
        Invocable::unary("sqrt", |v| Ok(Value::Float(v.to_f64()?.sqrt()))),
    );
    reg.register(
        "pow",
        Invocable::binary("pow", |b, e| match (b.to_number(), e.to_number()) {
            (Some(Number::Int(b)), Some(Number::Int(e))) if (0..=u32::MAX as i64).contains(&e) => {
                Ok(b.checked_pow(e as u32)
                    .map(Value::Int)
                    .unwrap_or(Value::Float((b as f64).powf(e as f64))))
            }
            (Some(b), Some(e)) => Ok(Value::Float(b.as_f64().powf(e.as_f64()))),
            _ => Err(eval_err("pow(): non-numeric operand")),
        }),
    );
    reg.register(
        "intdiv",
        Invocable::binary("intdiv", |a, b| {
            let (a, b) = (a.to_i64()?, b.to_i64()?);
            a.checked_div(b)
                .map(Value::Int)
                .ok_or_else(|| eval_err("intdiv(): division by zero or overflow"))
        }),
    );
    reg.register(
        "max",
        Invocable::variadic("max", 1, |args| extremum(args, Ordering::Greater, "max")),
    );
    reg.register(
        "min",
        Invocable::variadic("min", 1, |args| extremum(args, Ordering::Less, "min")),
    );

    // arrays
    reg.register(
        "count",
        Invocable::unary("count", |v| Ok(Value::from(collection_values(v, "count")?.len()))),
    );
    reg.register(
        "array_sum",
        Invocable::unary("array_sum", |v| {
            collection_values(v, "array_sum")?
                .iter()
                .try_fold(Value::Int(0), |acc, x| arith::add(&acc, x))
        }),
    );
    reg.register(
        "array_keys",
        Invocable::unary("array_keys", |v| match v {
            Value::Array(a) => Ok(Value::list(a.keys().map(|k| k.to_value()))),
            other => Err(eval_err(format!("array_keys(): {} given", other.type_name()))),
        }),
    );
    reg.register(
        "array_values",
        Invocable::unary("array_values", |v| {
            Ok(Value::list(collection_values(v, "array_values")?))
        }),
    );
    reg.register(
        "in_array",
        Invocable::ternary("in_array", |needle, hay, strict| {
            let strict = strict.is_truthy();
            for v in collection_values(hay, "in_array")? {
                let hit = if strict {
                    v.strict_eq(needle)
                } else {
                    loose_compare(&v, needle) == Ordering::Equal
                };
                if hit {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }),
    );
    reg.register(
        "array_reverse",
        Invocable::unary("array_reverse", |v| {
            let mut items = collection_values(v, "array_reverse")?;
            items.reverse();
            Ok(Value::Array(Rc::new(items.into_iter().collect::<Array>())))
        }),
    );

    // conversions
    reg.register(
        "intval",
        Invocable::unary("intval", |v| Ok(Value::Int(v.to_i64().unwrap_or(0)))),
    );
    reg.register(
        "floatval",
        Invocable::unary("floatval", |v| Ok(Value::Float(v.to_f64().unwrap_or(0.0)))),
    );
    reg.register(
        "strval",
        Invocable::unary("strval", |v| Ok(Value::from(text(v)?))),
    );
    reg.register(
        "boolval",
        Invocable::unary("boolval", |v| Ok(Value::Bool(v.is_truthy()))),
    );
    reg.register(
        "number_format",
        Invocable::binary("number_format", |v, d| {
            let d = if d.is_null() { 0 } else { d.to_i64()?.clamp(0, 15) as usize };
            Ok(Value::from(format!("{:.*}", d, v.to_f64()?)))
        }),
    );
    reg.register(
        "format_float",
        Invocable::unary("format_float", |v| Ok(Value::from(format_float(v.to_f64()?)))),
    );

    // type checks
    is_fn(reg, "is_int", |v| matches!(v, Value::Int(_)));
    is_fn(reg, "is_float", |v| matches!(v, Value::Float(_)));
    is_fn(reg, "is_string", |v| matches!(v, Value::Str(_)));
    is_fn(reg, "is_bool", |v| matches!(v, Value::Bool(_)));
    is_fn(reg, "is_array", |v| matches!(v, Value::Array(_)));
    is_fn(reg, "is_null", Value::is_null);
    is_fn(reg, "is_numeric", Value::is_numeric);
    is_fn(reg, "is_object", |v| matches!(v, Value::Object(_)));
    is_fn(reg, "is_callable", |v| match v {
        Value::Func(_) => true,
        Value::Object(o) => o.invoke_arity().is_some(),
        _ => false,
    });
    is_fn(reg, "is_scalar", |v| {
        matches!(v, Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_))
    });
    is_fn(reg, "is_iterable", |v| match v {
        Value::Array(_) => true,
        Value::Object(o) => o.traverse().is_some(),
        _ => false,
    });
    reg.register(
        "gettype",
        Invocable::unary("gettype", |v| {
            Ok(Value::from(match v {
                Value::Null => "NULL",
                Value::Bool(_) => "boolean",
                Value::Int(_) => "integer",
                Value::Float(_) => "double",
                Value::Str(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) | Value::Func(_) => "object",
            }))
        }),
    );
}

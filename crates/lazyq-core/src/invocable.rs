//! Canonical callable form used by every predicate, selector, comparer and
//! accumulator.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::value::Value;

pub type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// A callable with a fixed arity.
///
/// `invoke` pads missing arguments with `Null` and drops extra ones, so the
/// wrapped function always sees exactly `arity` arguments. Variadic
/// invocables receive the arguments unchanged.
#[derive(Clone)]
pub struct Invocable {
    arity: usize,
    variadic: bool,
    label: Rc<str>,
    func: Rc<NativeFn>,
}

impl Invocable {
    pub fn new<F>(label: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self {
            arity,
            variadic: false,
            label: Rc::from(label),
            func: Rc::new(func),
        }
    }

    /// Accepts any number of arguments; `min_arity` is what arity checks see.
    pub fn variadic<F>(label: &str, min_arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self {
            arity: min_arity,
            variadic: true,
            label: Rc::from(label),
            func: Rc::new(func),
        }
    }

    pub fn unary<F>(label: &str, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + 'static,
    {
        Self::new(label, 1, move |args| func(&args[0]))
    }

    pub fn binary<F>(label: &str, func: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value> + 'static,
    {
        Self::new(label, 2, move |args| func(&args[0], &args[1]))
    }

    pub fn ternary<F>(label: &str, func: F) -> Self
    where
        F: Fn(&Value, &Value, &Value) -> Result<Value> + 'static,
    {
        Self::new(label, 3, move |args| func(&args[0], &args[1], &args[2]))
    }

    pub fn identity() -> Self {
        Self::unary("identity", |v| Ok(v.clone()))
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        if self.variadic || args.len() == self.arity {
            return (self.func)(args);
        }
        let mut buf: Vec<Value> = args.iter().take(self.arity).cloned().collect();
        buf.resize(self.arity, Value::Null);
        (self.func)(&buf)
    }

    pub fn call1(&self, a: &Value) -> Result<Value> {
        self.invoke(std::slice::from_ref(a))
    }

    pub fn call2(&self, a: &Value, b: &Value) -> Result<Value> {
        if self.arity < 2 && !self.variadic {
            return self.call1(a);
        }
        self.invoke(&[a.clone(), b.clone()])
    }

    pub fn call3(&self, a: &Value, b: &Value, c: &Value) -> Result<Value> {
        if self.arity < 3 && !self.variadic {
            return self.call2(a, b);
        }
        self.invoke(&[a.clone(), b.clone(), c.clone()])
    }

    pub fn ptr_eq(&self, other: &Invocable) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.func), Rc::as_ptr(&other.func))
    }

    /// Address of the wrapped function, stable for the invocable's lifetime.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.func) as *const () as usize
    }
}

impl fmt::Debug for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocable")
            .field("label", &self.label)
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_args_are_padded() {
        let f = Invocable::binary("pair", |a, b| Ok(Value::list(vec![a.clone(), b.clone()])));
        let out = f.invoke(&[Value::Int(1)]).unwrap();
        assert_eq!(out, Value::list(vec![Value::Int(1), Value::Null]));
    }

    #[test]
    fn test_extra_args_are_dropped() {
        let f = Invocable::unary("id", |a| Ok(a.clone()));
        let out = f.call3(&Value::Int(1), &Value::Int(2), &Value::Int(3)).unwrap();
        assert_eq!(out, Value::Int(1));
    }

    #[test]
    fn test_variadic_sees_all_args() {
        let f = Invocable::variadic("n", 0, |args| Ok(Value::from(args.len())));
        assert_eq!(f.invoke(&vec![Value::Null; 4]).unwrap(), Value::Int(4));
    }
}

//! Normalization of callable-like inputs into `Invocable`s.
//!
//! Every operator that takes a predicate, selector, comparer or accumulator
//! resolves it once, when the operator is configured. Per-element calls then
//! go straight to the resolved `Invocable`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use lazyq_core::{Error, FunctionRegistry, Invocable, Object, QueryConfig, Result, Value};
use lazyq_lambda::{compile, looks_like_lambda};

/// Selectors and predicates receive `(value, key)`.
pub const SELECTOR_ARITY: usize = 2;
pub const COMPARER_ARITY: usize = 2;
/// Accumulators receive `(acc, value, key)`.
pub const ACCUMULATOR_ARITY: usize = 3;
/// Zip/join result selectors receive `(left, right, key)`.
pub const RESULT_ARITY: usize = 3;
/// `select_many` result selectors receive `(outer, inner, outer_key, inner_key)`.
pub const MANY_RESULT_ARITY: usize = 4;
pub const ACTION_ARITY: usize = 2;

/// A callable-like input before resolution.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Invocable),
    /// Arrow-lambda text or a registered function name.
    Text(String),
    /// Bound method on an object.
    Method(Rc<dyn Object>, String),
    /// `Class::method` from the registry.
    Static(String, String),
    /// Object callable through `Object::invoke`.
    Invokable(Rc<dyn Object>),
    /// Any value: callables, strings, invokable objects or `[target, method]` pairs.
    Value(Value),
}

impl From<&str> for Callable {
    fn from(s: &str) -> Self {
        Callable::Text(s.to_string())
    }
}

impl From<String> for Callable {
    fn from(s: String) -> Self {
        Callable::Text(s)
    }
}

impl From<&String> for Callable {
    fn from(s: &String) -> Self {
        Callable::Text(s.clone())
    }
}

impl From<Invocable> for Callable {
    fn from(f: Invocable) -> Self {
        Callable::Native(f)
    }
}

impl From<&Invocable> for Callable {
    fn from(f: &Invocable) -> Self {
        Callable::Native(f.clone())
    }
}

impl From<Value> for Callable {
    fn from(v: Value) -> Self {
        Callable::Value(v)
    }
}

impl From<&Callable> for Callable {
    fn from(c: &Callable) -> Self {
        c.clone()
    }
}

struct LambdaCache {
    entries: HashMap<String, Invocable>,
    order: VecDeque<String>,
    capacity: usize,
}

impl LambdaCache {
    fn get(&self, src: &str) -> Option<Invocable> {
        self.entries.get(src).cloned()
    }

    fn put(&mut self, src: &str, f: &Invocable) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(old) => {
                    self.entries.remove(&old);
                }
                None => break,
            }
        }
        self.order.push_back(src.to_string());
        self.entries.insert(src.to_string(), f.clone());
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Resolves callables against a function registry, caching compiled lambdas.
pub struct Resolver {
    registry: RefCell<Rc<FunctionRegistry>>,
    cache: RefCell<LambdaCache>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&QueryConfig::default())
    }
}

impl Resolver {
    pub fn new(cfg: &QueryConfig) -> Self {
        Self::with_registry(FunctionRegistry::with_builtins(), cfg)
    }

    pub fn with_registry(registry: FunctionRegistry, cfg: &QueryConfig) -> Self {
        Self {
            registry: RefCell::new(Rc::new(registry)),
            cache: RefCell::new(LambdaCache {
                entries: HashMap::new(),
                order: VecDeque::new(),
                capacity: cfg.lambda_cache_capacity,
            }),
        }
    }

    pub fn registry(&self) -> Rc<FunctionRegistry> {
        Rc::clone(&self.registry.borrow())
    }

    /// Add or replace a named function. Cached lambdas are dropped because
    /// they were checked against the old registry.
    pub fn register_function(&self, name: &str, f: Invocable) {
        Rc::make_mut(&mut self.registry.borrow_mut()).register(name, f);
        self.cache.borrow_mut().clear();
    }

    pub fn register_static(&self, class: &str, method: &str, f: Invocable) {
        Rc::make_mut(&mut self.registry.borrow_mut()).register_static(class, method, f);
        self.cache.borrow_mut().clear();
    }

    /// Resolve `callable` into an invocable taking at most `max_arity`
    /// arguments.
    pub fn resolve(&self, callable: &Callable, max_arity: usize) -> Result<Invocable> {
        match self.try_resolve(callable, max_arity)? {
            Some(f) => Ok(f),
            None => Err(Error::InvalidExpression(describe(callable))),
        }
    }

    /// Like `resolve`, but text that is neither a lambda nor a known function
    /// name yields `Ok(None)` instead of an error.
    pub fn try_resolve(&self, callable: &Callable, max_arity: usize) -> Result<Option<Invocable>> {
        let f = match callable {
            Callable::Native(f) => f.clone(),
            Callable::Text(src) => match self.resolve_text(src)? {
                Some(f) => f,
                None => return Ok(None),
            },
            Callable::Method(obj, name) => bind_method(Rc::clone(obj), name)?,
            Callable::Static(class, method) => self.bind_static(class, method)?,
            Callable::Invokable(obj) => bind_invokable(Rc::clone(obj))?,
            Callable::Value(v) => match self.resolve_value(v)? {
                Some(f) => f,
                None => return Ok(None),
            },
        };
        check_arity(&f, max_arity)?;
        Ok(Some(f))
    }

    fn resolve_text(&self, src: &str) -> Result<Option<Invocable>> {
        let src = src.trim();
        if looks_like_lambda(src) {
            return self.compile_cached(src).map(Some);
        }
        if let Some((class, method)) = src.split_once("::") {
            return self.bind_static(class, method).map(Some);
        }
        Ok(self.registry.borrow().get(src).cloned())
    }

    fn compile_cached(&self, src: &str) -> Result<Invocable> {
        if let Some(f) = self.cache.borrow().get(src) {
            #[cfg(feature = "tracing")]
            tracing::trace!(source = src, "lambda cache hit");
            return Ok(f);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(source = src, "lambda cache miss");
        let registry = self.registry();
        let f = compile(src, &registry)?;
        self.cache.borrow_mut().put(src, &f);
        Ok(f)
    }

    fn bind_static(&self, class: &str, method: &str) -> Result<Invocable> {
        self.registry
            .borrow()
            .get_static(class, method)
            .cloned()
            .ok_or_else(|| Error::InvalidBind(format!("{}::{}", class, method)))
    }

    fn resolve_value(&self, v: &Value) -> Result<Option<Invocable>> {
        match v {
            Value::Func(f) => Ok(Some(f.clone())),
            Value::Str(s) => self.resolve_text(s),
            Value::Object(o) if o.invoke_arity().is_some() => bind_invokable(Rc::clone(o)).map(Some),
            Value::Array(pair) if pair.len() == 2 && pair.is_list() => {
                let target = pair.values().next().cloned().unwrap_or(Value::Null);
                let method = match pair.values().nth(1) {
                    Some(Value::Str(m)) => m.clone(),
                    _ => return Err(Error::InvalidBind("method name must be a string".into())),
                };
                match target {
                    Value::Object(o) => bind_method(o, &method).map(Some),
                    Value::Str(class) => self.bind_static(&class, &method).map(Some),
                    other => Err(Error::InvalidBind(format!(
                        "cannot bind a method to {}",
                        other.type_name()
                    ))),
                }
            }
            other => Err(Error::InvalidExpression(format!(
                "{} is not callable",
                other.type_name()
            ))),
        }
    }
}

fn describe(callable: &Callable) -> String {
    match callable {
        Callable::Text(s) => format!("`{}` is neither a lambda nor a known function", s),
        Callable::Value(Value::Str(s)) => {
            format!("`{}` is neither a lambda nor a known function", s)
        }
        other => format!("{:?} is not callable", other),
    }
}

fn check_arity(f: &Invocable, max_arity: usize) -> Result<()> {
    if !f.is_variadic() && f.arity() > max_arity {
        return Err(Error::Arity {
            callable: f.label().to_string(),
            declared: f.arity(),
            supported: max_arity,
        });
    }
    Ok(())
}

fn bind_method(obj: Rc<dyn Object>, method: &str) -> Result<Invocable> {
    let arity = obj.method_arity(method).ok_or_else(|| {
        Error::InvalidBind(format!("{}::{} does not exist", obj.class_name(), method))
    })?;
    let label = format!("{}::{}", obj.class_name(), method);
    let method = method.to_string();
    Ok(Invocable::new(&label, arity, move |args| {
        obj.call_method(&method, args)
    }))
}

fn bind_invokable(obj: Rc<dyn Object>) -> Result<Invocable> {
    let arity = obj
        .invoke_arity()
        .ok_or_else(|| Error::InvalidBind(format!("{} is not invokable", obj.class_name())))?;
    let label = format!("{}::__invoke", obj.class_name());
    Ok(Invocable::new(&label, arity, move |args| obj.invoke(args)))
}

thread_local! {
    static DEFAULT: Resolver = Resolver::new(&QueryConfig::from_env());
}

/// Resolve through the thread's default resolver.
pub fn resolve(callable: impl Into<Callable>, max_arity: usize) -> Result<Invocable> {
    let callable = callable.into();
    DEFAULT.with(|r| r.resolve(&callable, max_arity))
}

pub fn try_resolve(callable: impl Into<Callable>, max_arity: usize) -> Result<Option<Invocable>> {
    let callable = callable.into();
    DEFAULT.with(|r| r.try_resolve(&callable, max_arity))
}

/// Make `name` callable from lambda text and by name on this thread.
pub fn register_function(name: &str, f: Invocable) {
    DEFAULT.with(|r| r.register_function(name, f));
}

pub fn register_static(class: &str, method: &str, f: Invocable) {
    DEFAULT.with(|r| r.register_static(class, method, f));
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyq_core::ErrorKind;
    use std::any::Any;

    #[derive(Debug)]
    struct Doubler;

    impl Object for Doubler {
        fn class_name(&self) -> &str {
            "Doubler"
        }

        fn method_arity(&self, name: &str) -> Option<usize> {
            (name == "twice").then_some(1)
        }

        fn call_method(&self, _name: &str, args: &[Value]) -> Result<Value> {
            Ok(Value::Int(args[0].to_i64()? * 2))
        }

        fn invoke_arity(&self) -> Option<usize> {
            Some(1)
        }

        fn invoke(&self, args: &[Value]) -> Result<Value> {
            Ok(Value::Int(args[0].to_i64()? + 100))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_lambda_text() {
        let f = resolve("$x => $x * 3", SELECTOR_ARITY).unwrap();
        assert_eq!(f.call1(&Value::Int(2)).unwrap(), Value::Int(6));
    }

    #[test]
    fn test_function_name() {
        let f = resolve("strtoupper", SELECTOR_ARITY).unwrap();
        assert_eq!(f.call1(&Value::from("ab")).unwrap(), Value::from("AB"));
    }

    #[test]
    fn test_unknown_text() {
        let err = resolve("no such thing", SELECTOR_ARITY).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression(_)));
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(try_resolve("no such thing", SELECTOR_ARITY).unwrap().is_none());
    }

    #[test]
    fn test_arity_limit() {
        let err = resolve("($a, $b, $c) => $a", COMPARER_ARITY).unwrap_err();
        assert!(matches!(err, Error::Arity { declared: 3, supported: 2, .. }));
    }

    #[test]
    fn test_bound_method_and_invokable() {
        let obj: Rc<dyn Object> = Rc::new(Doubler);
        let pair = Value::list([Value::Object(Rc::clone(&obj)), Value::from("twice")]);
        let f = resolve(pair, SELECTOR_ARITY).unwrap();
        assert_eq!(f.call1(&Value::Int(4)).unwrap(), Value::Int(8));

        let g = resolve(Callable::Invokable(Rc::clone(&obj)), SELECTOR_ARITY).unwrap();
        assert_eq!(g.call1(&Value::Int(1)).unwrap(), Value::Int(101));

        let err = resolve(Callable::Method(obj, "nope".into()), SELECTOR_ARITY).unwrap_err();
        assert!(matches!(err, Error::InvalidBind(_)));
    }

    #[test]
    fn test_registered_function_and_static() {
        let r = Resolver::default();
        r.register_function("triple", Invocable::unary("triple", |v| Ok(Value::Int(v.to_i64()? * 3))));
        r.register_static("Math", "neg", Invocable::unary("neg", |v| Ok(Value::Int(-v.to_i64()?))));
        let f = r.resolve(&Callable::from("$x => triple($x) + 1"), 1).unwrap();
        assert_eq!(f.call1(&Value::Int(2)).unwrap(), Value::Int(7));
        let g = r.resolve(&Callable::from("Math::neg"), 1).unwrap();
        assert_eq!(g.call1(&Value::Int(2)).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let r = Resolver::default();
        let a = r.resolve(&Callable::from("$x => $x . '!'"), 1).unwrap();
        let b = r.resolve(&Callable::from("$x => $x . '!'"), 1).unwrap();
        let v = Value::from("hi");
        assert_eq!(a.call1(&v).unwrap(), b.call1(&v).unwrap());
    }
}

//! Callable resolution: every accepted shape ends up as one invocable.

use std::any::Any;
use std::rc::Rc;

use lazyq::operators::{register_function, register_static, resolve, try_resolve};
use lazyq::{Array, Callable, Enumerable, Error, Invocable, Object, Result, Value};

#[derive(Debug)]
struct Multiplier {
    factor: i64,
}

impl Object for Multiplier {
    fn class_name(&self) -> &str {
        "Multiplier"
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        (name == "apply").then_some(1)
    }

    fn call_method(&self, _name: &str, args: &[Value]) -> Result<Value> {
        Ok(Value::Int(args[0].to_i64()? * self.factor))
    }

    fn invoke_arity(&self) -> Option<usize> {
        Some(1)
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Int(args[0].to_i64()? + self.factor))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn doubled(c: impl Into<Callable>) -> Vec<Value> {
    Enumerable::from_values(vec![1, 2, 3])
        .select(c)
        .unwrap()
        .to_vec()
        .unwrap()
}

#[test]
fn test_every_callable_shape_resolves() {
    let expected = vec![Value::Int(2), Value::Int(4), Value::Int(6)];

    let native = Invocable::unary("double", |v| Ok(Value::Int(v.to_i64()? * 2)));
    assert_eq!(doubled(native.clone()), expected);
    assert_eq!(doubled("$x => $x * 2"), expected);
    assert_eq!(doubled("($x) => { $y = $x * 2; return $y; }"), expected);

    register_function("test_double", native.clone());
    assert_eq!(doubled("test_double"), expected);

    register_static("Math", "twice", native);
    assert_eq!(doubled("Math::twice"), expected);
    assert_eq!(doubled(Value::list(vec!["Math", "twice"])), expected);

    let obj: Rc<dyn Object> = Rc::new(Multiplier { factor: 2 });
    assert_eq!(doubled(Callable::Method(Rc::clone(&obj), "apply".into())), expected);
    assert_eq!(
        doubled(Value::list(vec![Value::Object(Rc::clone(&obj)), Value::from("apply")])),
        expected
    );
    // invoking the object adds instead of multiplying
    assert_eq!(
        doubled(Callable::Invokable(obj)),
        vec![Value::Int(3), Value::Int(4), Value::Int(5)]
    );
}

#[test]
fn test_resolution_errors() {
    assert!(matches!(
        resolve("no_such_function_anywhere", 1),
        Err(Error::InvalidExpression(_))
    ));
    assert!(try_resolve("no_such_function_anywhere", 1).unwrap().is_none());
    assert!(matches!(resolve("Nope::missing", 1), Err(Error::InvalidBind(_))));

    let obj: Rc<dyn Object> = Rc::new(Multiplier { factor: 1 });
    assert!(matches!(
        resolve(Callable::Method(obj, "missing".into()), 1),
        Err(Error::InvalidBind(_))
    ));

    let err = resolve("($a, $b, $c) => $a", 2).unwrap_err();
    assert!(matches!(err, Error::Arity { declared: 3, supported: 2, .. }));
    assert!(matches!(resolve(Value::Int(4), 1), Err(Error::InvalidExpression(_))));
}

#[test]
fn test_lambda_expression_forms() {
    let f = resolve(r#"$p => $p["name"] ?? "anonymous""#, 1).unwrap();
    assert_eq!(f.call1(&Value::from(Array::new())).unwrap(), Value::from("anonymous"));

    let f = resolve("$x => $x > 2 ? 'big' : 'small'", 1).unwrap();
    assert_eq!(f.call1(&Value::Int(3)).unwrap(), Value::from("big"));

    let f = resolve("$x => [$x, $x + 1]", 1).unwrap();
    assert_eq!(f.call1(&Value::Int(1)).unwrap(), Value::list(vec![1, 2]));

    let noop = resolve("() => {}", 0).unwrap();
    assert_eq!(noop.invoke(&[]).unwrap(), Value::Null);
}

#[test]
fn test_key_is_an_optional_trailing_argument() {
    let out = Enumerable::from_values(vec!["a", "b"])
        .select("($v, $k) => $k . '=' . $v")
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(out, vec![Value::from("0=a"), Value::from("1=b")]);
}

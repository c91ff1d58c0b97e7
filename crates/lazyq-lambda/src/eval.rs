//! Tree-walking evaluator that turns a parsed lambda into an `Invocable`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use lazyq_core::arith;
use lazyq_core::compare::loose_compare;
use lazyq_core::{
    Array, EqualityComparer, Error, FunctionRegistry, Invocable, Key, LooseEquality, Result,
    Value,
};

use crate::ast::{BinaryOp, Expr, Lambda, Literal, Stmt, UnaryOp};
use crate::error::ParseError;
use crate::parser::parse_lambda;

/// Parse and compile lambda text against `registry`. Calls to functions the
/// registry does not know fail here, not at evaluation time.
pub fn compile(src: &str, registry: &Rc<FunctionRegistry>) -> Result<Invocable> {
    let lambda = parse_lambda(src)?;
    check_functions(&lambda, registry)?;
    #[cfg(feature = "tracing")]
    tracing::trace!(source = src, params = lambda.params.len(), "compiled lambda");
    Ok(into_invocable(lambda, Rc::clone(registry)))
}

fn check_functions(
    lambda: &Lambda,
    registry: &FunctionRegistry,
) -> std::result::Result<(), ParseError> {
    let mut missing: Option<String> = None;
    for stmt in &lambda.body {
        stmt.walk_exprs(&mut |e| {
            if missing.is_some() {
                return;
            }
            match e {
                Expr::Call { name, .. } if !registry.contains(name) => {
                    missing = Some(name.clone());
                }
                Expr::StaticCall { class, method, .. }
                    if registry.get_static(class, method).is_none() =>
                {
                    missing = Some(format!("{}::{}", class, method));
                }
                _ => {}
            }
        });
    }
    match missing {
        Some(name) => Err(ParseError::UnknownFunction(name)),
        None => Ok(()),
    }
}

pub fn into_invocable(lambda: Lambda, registry: Rc<FunctionRegistry>) -> Invocable {
    let arity = lambda.params.len();
    let label = lambda.source.clone();
    let lambda = Rc::new(lambda);
    Invocable::new(&label, arity, move |args| {
        let mut scope = Scope {
            vars: HashMap::with_capacity(lambda.params.len()),
            registry: &registry,
        };
        for (name, v) in lambda.params.iter().zip(args) {
            scope.vars.insert(name.clone(), v.clone());
        }
        match scope.exec_block(&lambda.body)? {
            Flow::Return(v) => Ok(v),
            Flow::Normal => Ok(Value::Null),
        }
    })
}

enum Flow {
    Normal,
    Return(Value),
}

struct Scope<'r> {
    vars: HashMap<String, Value>,
    registry: &'r FunctionRegistry,
}

impl Scope<'_> {
    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            match stmt {
                Stmt::Return(e) => {
                    let v = match e {
                        Some(e) => self.eval(e)?,
                        None => Value::Null,
                    };
                    return Ok(Flow::Return(v));
                }
                Stmt::Assign { target, value } => {
                    let v = self.eval(value)?;
                    self.vars.insert(target.clone(), v);
                }
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let branch = if self.eval(cond)?.is_truthy() {
                        then
                    } else {
                        otherwise
                    };
                    if let Flow::Return(v) = self.exec_block(branch)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Stmt::Expr(e) => {
                    self.eval(e)?;
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Value>> {
        args.iter().map(|a| self.eval(a)).collect()
    }

    fn eval(&self, e: &Expr) -> Result<Value> {
        match e {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Var(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| Error::Evaluation(format!("undefined variable ${}", name))),
            Expr::Array(items) => {
                let mut arr = Array::with_capacity(items.len());
                for (k, v) in items {
                    let value = self.eval(v)?;
                    match k {
                        Some(k) => {
                            arr.insert(Key::from_value(&self.eval(k)?)?, value);
                        }
                        None => {
                            arr.push(value);
                        }
                    }
                }
                Ok(Value::from(arr))
            }
            Expr::Index { target, index } => index_value(&self.eval(target)?, &self.eval(index)?),
            Expr::Property { target, name } => match self.eval(target)? {
                Value::Object(o) => o.property(name),
                other => Err(Error::Evaluation(format!(
                    "cannot read property `{}` of {}",
                    name,
                    other.type_name()
                ))),
            },
            Expr::MethodCall {
                target,
                method,
                args,
            } => match self.eval(target)? {
                Value::Object(o) => o.call_method(method, &self.eval_args(args)?),
                other => Err(Error::Evaluation(format!(
                    "call to method {}() on {}",
                    method,
                    other.type_name()
                ))),
            },
            Expr::Call { name, args } => {
                let f = self
                    .registry
                    .get(name)
                    .ok_or_else(|| Error::Evaluation(format!("unknown function {}()", name)))?;
                f.invoke(&self.eval_args(args)?)
            }
            Expr::StaticCall {
                class,
                method,
                args,
            } => {
                let f = self.registry.get_static(class, method).ok_or_else(|| {
                    Error::Evaluation(format!("unknown method {}::{}()", class, method))
                })?;
                f.invoke(&self.eval_args(args)?)
            }
            Expr::Invoke { callee, args } => {
                let callee = self.eval(callee)?;
                let args = self.eval_args(args)?;
                self.call_value(&callee, &args)
            }
            Expr::Unary { op, expr } => {
                let v = self.eval(expr)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnaryOp::Neg => arith::neg(&v),
                    UnaryOp::Plus => v.to_number().map(Value::from).ok_or_else(|| {
                        Error::Evaluation(format!("unsupported operand type {}", v.type_name()))
                    }),
                }
            }
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => Ok(Value::Bool(
                    self.eval(lhs)?.is_truthy() && self.eval(rhs)?.is_truthy(),
                )),
                BinaryOp::Or => Ok(Value::Bool(
                    self.eval(lhs)?.is_truthy() || self.eval(rhs)?.is_truthy(),
                )),
                _ => apply_binary(*op, &self.eval(lhs)?, &self.eval(rhs)?),
            },
            Expr::Coalesce { lhs, rhs } => match self.eval_quiet(lhs)? {
                Value::Null => self.eval(rhs),
                v => Ok(v),
            },
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                let c = self.eval(cond)?;
                if c.is_truthy() {
                    match then {
                        Some(t) => self.eval(t),
                        None => Ok(c),
                    }
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    /// Evaluation for the left side of `??`: missing variables, keys and
    /// properties read as null instead of failing.
    fn eval_quiet(&self, e: &Expr) -> Result<Value> {
        match e {
            Expr::Var(name) => Ok(self.vars.get(name).cloned().unwrap_or(Value::Null)),
            Expr::Index { target, index } => match self.eval_quiet(target)? {
                Value::Null => Ok(Value::Null),
                t => index_value(&t, &self.eval(index)?),
            },
            Expr::Property { target, name } => match self.eval_quiet(target)? {
                Value::Object(o) => Ok(o.property(name).unwrap_or(Value::Null)),
                _ => Ok(Value::Null),
            },
            other => self.eval(other),
        }
    }

    fn call_value(&self, callee: &Value, args: &[Value]) -> Result<Value> {
        match callee {
            Value::Func(f) => f.invoke(args),
            Value::Object(o) if o.invoke_arity().is_some() => o.invoke(args),
            Value::Str(name) => match self.registry.get(name) {
                Some(f) => f.invoke(args),
                None => Err(Error::Evaluation(format!("unknown function {}()", name))),
            },
            other => Err(Error::Evaluation(format!(
                "value of type {} is not callable",
                other.type_name()
            ))),
        }
    }
}

fn index_value(target: &Value, index: &Value) -> Result<Value> {
    match target {
        Value::Array(a) => Ok(a
            .get(&Key::from_value(index)?)
            .cloned()
            .unwrap_or(Value::Null)),
        Value::Str(s) => {
            let n = s.chars().count() as i64;
            let i = index.to_i64()?;
            let i = if i < 0 { n + i } else { i };
            if i < 0 || i >= n {
                return Ok(Value::Null);
            }
            Ok(s.chars()
                .nth(i as usize)
                .map(|c| Value::from(c.to_string()))
                .unwrap_or(Value::Null))
        }
        Value::Null => Ok(Value::Null),
        Value::Object(o) if o.method_arity("offsetGet").is_some() => {
            o.call_method("offsetGet", std::slice::from_ref(index))
        }
        other => Err(Error::Evaluation(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn apply_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value> {
    match op {
        BinaryOp::Add => arith::add(l, r),
        BinaryOp::Sub => arith::sub(l, r),
        BinaryOp::Mul => arith::mul(l, r),
        BinaryOp::Div => arith::div(l, r),
        BinaryOp::Mod => arith::rem(l, r),
        BinaryOp::Concat => arith::concat(l, r),
        BinaryOp::Eq => Ok(Value::Bool(LooseEquality.equals(l, r)?)),
        BinaryOp::NotEq => Ok(Value::Bool(!LooseEquality.equals(l, r)?)),
        BinaryOp::Identical => Ok(Value::Bool(l.strict_eq(r))),
        BinaryOp::NotIdentical => Ok(Value::Bool(!l.strict_eq(r))),
        BinaryOp::Lt => Ok(Value::Bool(loose_compare(l, r) == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(loose_compare(l, r) != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(loose_compare(l, r) == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(loose_compare(l, r) != Ordering::Less)),
        BinaryOp::And => Ok(Value::Bool(l.is_truthy() && r.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(l.is_truthy() || r.is_truthy())),
    }
}

//! Bulk disposal of disposable elements.

use std::any::Any;
use std::collections::HashSet;
use std::rc::Rc;

use lazyq_core::{Entry, Error, Object, Result, Value};

use crate::enumerable::Enumerable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeOptions {
    /// Replace each disposed element with a `Disposed` marker.
    pub wrap: bool,
    /// Leave disposed elements out of the returned sequence.
    pub skip_disposed: bool,
}

/// Marker around an element whose `dispose` hook has run.
#[derive(Debug)]
pub struct Disposed {
    inner: Rc<dyn Object>,
}

impl Disposed {
    pub fn inner(&self) -> &Rc<dyn Object> {
        &self.inner
    }
}

impl Object for Disposed {
    fn class_name(&self) -> &str {
        "Disposed"
    }

    fn property(&self, name: &str) -> Result<Value> {
        match name {
            "disposed" => Ok(Value::Bool(true)),
            "inner" => Ok(Value::Object(Rc::clone(&self.inner))),
            _ => Err(Error::Evaluation(format!(
                "undefined property Disposed::${}",
                name
            ))),
        }
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match name.to_ascii_lowercase().as_str() {
            "isdisposed" | "getinner" => Some(0),
            _ => None,
        }
    }

    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value> {
        match name.to_ascii_lowercase().as_str() {
            "isdisposed" => Ok(Value::Bool(true)),
            "getinner" => Ok(Value::Object(Rc::clone(&self.inner))),
            _ => Err(Error::Evaluation(format!(
                "call to undefined method Disposed::{}()",
                name
            ))),
        }
    }

    fn to_string_repr(&self) -> Option<String> {
        Some(format!("Disposed({})", self.inner.class_name()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn address(o: &Rc<dyn Object>) -> usize {
    Rc::as_ptr(o) as *const () as usize
}

impl Enumerable {
    /// Drain the sequence and run `dispose` on every disposable element,
    /// each object at most once. Returns the drained elements, shaped by
    /// `options`.
    pub fn dispose_all(&self, options: DisposeOptions) -> Result<Enumerable> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut out = Vec::new();
        for r in self.open()? {
            let e = r?;
            let obj = match &e.value {
                Value::Object(o) if o.is_disposable() => Rc::clone(o),
                _ => {
                    out.push(e);
                    continue;
                }
            };
            if seen.insert(address(&obj)) {
                obj.dispose()?;
            }
            if options.skip_disposed {
                continue;
            }
            if options.wrap {
                out.push(Entry {
                    key: e.key,
                    value: Value::object(Disposed { inner: obj }),
                });
            } else {
                out.push(e);
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(disposed = seen.len(), "disposed elements");
        Ok(Enumerable::from_entries(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct Handle {
        closed: Cell<u32>,
    }

    impl Object for Handle {
        fn class_name(&self) -> &str {
            "Handle"
        }

        fn is_disposable(&self) -> bool {
            true
        }

        fn dispose(&self) -> Result<()> {
            self.closed.set(self.closed.get() + 1);
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_dispose_each_once_and_wrap() {
        let h: Rc<dyn Object> = Rc::new(Handle::default());
        let seq = Enumerable::from_values(vec![
            Value::Object(Rc::clone(&h)),
            Value::Int(1),
            Value::Object(Rc::clone(&h)),
        ]);
        let out = seq
            .dispose_all(DisposeOptions {
                wrap: true,
                skip_disposed: false,
            })
            .unwrap();
        let handle = h.as_any().downcast_ref::<Handle>().unwrap();
        assert_eq!(handle.closed.get(), 1);
        let values = out.to_vec().unwrap();
        assert_eq!(values.len(), 3);
        assert!(values[0].downcast_ref::<Disposed>().is_some());
        assert_eq!(values[1], Value::Int(1));
    }

    #[test]
    fn test_skip_disposed() {
        let h: Rc<dyn Object> = Rc::new(Handle::default());
        let seq = Enumerable::from_values(vec![Value::Object(h), Value::Int(2)]);
        let out = seq
            .dispose_all(DisposeOptions {
                wrap: false,
                skip_disposed: true,
            })
            .unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![Value::Int(2)]);
    }
}

//! Element-wise and structural transforms. Each returns a new lazy sequence
//! over the receiver; nothing is pulled until the result is enumerated.

use lazyq_core::{Entry, EntryIter, Error, Invocable, Result, Value};

use crate::enumerable::{deferred, drain, Enumerable};
use crate::resolve::{
    resolve, Callable, ACTION_ARITY, MANY_RESULT_ARITY, RESULT_ARITY, SELECTOR_ARITY,
};

fn is_match(f: &Invocable, e: &Entry) -> Result<bool> {
    Ok(f.call2(&e.value, &e.key)?.is_truthy())
}

impl Enumerable {
    /// Elements for which `predicate(value, key)` is truthy. Keys are preserved.
    pub fn where_(&self, predicate: impl Into<Callable>) -> Result<Enumerable> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        Ok(self.pipe(move |up| {
            let f = f.clone();
            Ok(Box::new(up.filter_map(move |r| match r {
                Ok(e) => match is_match(&f, &e) {
                    Ok(true) => Some(Ok(e)),
                    Ok(false) => None,
                    Err(err) => Some(Err(err)),
                },
                Err(err) => Some(Err(err)),
            })))
        }))
    }

    /// `selector(value, key)` for every element. Keys are preserved.
    pub fn select(&self, selector: impl Into<Callable>) -> Result<Enumerable> {
        let f = resolve(selector, SELECTOR_ARITY)?;
        Ok(self.pipe(move |up| {
            let f = f.clone();
            Ok(Box::new(up.map(move |r| {
                let e = r?;
                let value = f.call2(&e.value, &e.key)?;
                Ok(Entry { key: e.key, value })
            })))
        }))
    }

    /// Project both value and key.
    pub fn select_with_key(
        &self,
        value_selector: impl Into<Callable>,
        key_selector: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let fv = resolve(value_selector, SELECTOR_ARITY)?;
        let fk = resolve(key_selector, SELECTOR_ARITY)?;
        Ok(self.pipe(move |up| {
            let fv = fv.clone();
            let fk = fk.clone();
            Ok(Box::new(up.map(move |r| {
                let e = r?;
                Ok(Entry {
                    key: fk.call2(&e.value, &e.key)?,
                    value: fv.call2(&e.value, &e.key)?,
                })
            })))
        }))
    }

    /// Flatten the sequence each element's `collection_selector(value, key)`
    /// produces, one level deep. Inner keys are kept.
    pub fn select_many(&self, collection_selector: impl Into<Callable>) -> Result<Enumerable> {
        let fc = resolve(collection_selector, SELECTOR_ARITY)?;
        Ok(self.flatten_with(fc, None))
    }

    /// Like `select_many`, mapping each pair through
    /// `result_selector(outer, inner, outer_key, inner_key)`.
    pub fn select_many_with(
        &self,
        collection_selector: impl Into<Callable>,
        result_selector: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let fc = resolve(collection_selector, SELECTOR_ARITY)?;
        let fr = resolve(result_selector, MANY_RESULT_ARITY)?;
        Ok(self.flatten_with(fc, Some(fr)))
    }

    fn flatten_with(&self, fc: Invocable, fr: Option<Invocable>) -> Enumerable {
        self.pipe(move |mut up| {
            let fc = fc.clone();
            let fr = fr.clone();
            let mut inner: Option<(Entry, EntryIter)> = None;
            Ok(Box::new(std::iter::from_fn(move || loop {
                if let Some((outer, it)) = &mut inner {
                    if let Some(r) = it.next() {
                        return Some(r.and_then(|ie| match &fr {
                            Some(fr) => Ok(Entry {
                                value: fr.invoke(&[
                                    outer.value.clone(),
                                    ie.value,
                                    outer.key.clone(),
                                    ie.key.clone(),
                                ])?,
                                key: ie.key,
                            }),
                            None => Ok(ie),
                        }));
                    }
                }
                inner = None;
                let outer = match up.next()? {
                    Ok(e) => e,
                    Err(err) => return Some(Err(err)),
                };
                let opened = fc
                    .call2(&outer.value, &outer.key)
                    .and_then(Enumerable::from_value)
                    .and_then(|seq| seq.open());
                match opened {
                    Ok(it) => inner = Some((outer, it)),
                    Err(err) => return Some(Err(err)),
                }
            })))
        })
    }

    /// Bypass the first `count` elements.
    pub fn skip(&self, count: usize) -> Enumerable {
        self.pipe(move |up| {
            let mut skipped = 0;
            Ok(Box::new(up.filter(move |r| {
                if r.is_err() || skipped >= count {
                    return true;
                }
                skipped += 1;
                false
            })))
        })
    }

    /// At most the first `count` elements.
    pub fn take(&self, count: usize) -> Enumerable {
        self.pipe(move |up| Ok(Box::new(up.take(count))))
    }

    /// Bypass elements while `predicate(value, key)` holds, then yield the rest.
    pub fn skip_while(&self, predicate: impl Into<Callable>) -> Result<Enumerable> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        Ok(self.pipe(move |up| {
            let f = f.clone();
            let mut skipping = true;
            Ok(Box::new(up.filter_map(move |r| {
                let e = match r {
                    Ok(e) => e,
                    Err(err) => return Some(Err(err)),
                };
                if skipping {
                    match is_match(&f, &e) {
                        Ok(true) => return None,
                        Ok(false) => skipping = false,
                        Err(err) => return Some(Err(err)),
                    }
                }
                Some(Ok(e))
            })))
        }))
    }

    /// Elements up to the first one failing `predicate(value, key)`.
    pub fn take_while(&self, predicate: impl Into<Callable>) -> Result<Enumerable> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        Ok(self.pipe(move |mut up| {
            let f = f.clone();
            let mut done = false;
            Ok(Box::new(std::iter::from_fn(move || {
                if done {
                    return None;
                }
                let r = up.next()?;
                let keep = r.as_ref().map_err(Clone::clone).and_then(|e| is_match(&f, e));
                match keep {
                    Ok(true) => Some(r),
                    Ok(false) => {
                        done = true;
                        None
                    }
                    Err(err) => {
                        done = true;
                        Some(Err(err))
                    }
                }
            })))
        }))
    }

    /// The sequence itself, or a single `default` keyed 0 when it is empty.
    pub fn default_if_empty(&self, default: impl Into<Value>) -> Enumerable {
        let default = default.into();
        self.pipe(move |mut up| {
            let default = default.clone();
            let mut seen = false;
            let mut done = false;
            Ok(Box::new(std::iter::from_fn(move || {
                if done {
                    return None;
                }
                match up.next() {
                    Some(r) => {
                        seen = true;
                        Some(r)
                    }
                    None => {
                        done = true;
                        (!seen).then(|| Ok(Entry::new(0, default.clone())))
                    }
                }
            })))
        })
    }

    /// Elements back-to-front. The upstream is drained on the first pull.
    pub fn reverse(&self) -> Enumerable {
        self.pipe(|up| {
            Ok(deferred(move || {
                let mut items = drain(up)?;
                items.reverse();
                Ok(Box::new(items.into_iter().map(Ok)))
            }))
        })
    }

    /// Keys as values, keyed `0..n`.
    pub fn keys(&self) -> Enumerable {
        self.pipe(|up| {
            Ok(Box::new(
                up.enumerate().map(|(i, r)| r.map(|e| Entry::new(i, e.key))),
            ))
        })
    }

    /// Values re-keyed `0..n`.
    pub fn values(&self) -> Enumerable {
        self.pipe(|up| {
            Ok(Box::new(
                up.enumerate().map(|(i, r)| r.map(|e| Entry::new(i, e.value))),
            ))
        })
    }

    /// Receiver followed by `other`, both with their own keys.
    pub fn concat(&self, other: impl Into<Enumerable>) -> Enumerable {
        let first = self.clone();
        let second: Enumerable = other.into();
        let resettable = first.is_resettable() && second.is_resettable();
        Enumerable::from_fn(resettable, move || {
            let second = second.clone();
            Ok(Box::new(first.open()?.chain(deferred(move || second.open()))))
        })
    }

    /// Receiver followed by one more element. Without an explicit key the
    /// element gets one past the largest integer key seen (0 if none).
    pub fn append(&self, value: impl Into<Value>, key: Option<Value>) -> Enumerable {
        let value = value.into();
        self.pipe(move |mut up| {
            let value = value.clone();
            let key = key.clone();
            let mut next_key: i64 = 0;
            let mut done = false;
            Ok(Box::new(std::iter::from_fn(move || {
                if done {
                    return None;
                }
                match up.next() {
                    Some(r) => {
                        if let Ok(Entry {
                            key: Value::Int(k), ..
                        }) = &r
                        {
                            next_key = next_key.max(k.saturating_add(1));
                        }
                        Some(r)
                    }
                    None => {
                        done = true;
                        let k = key.clone().unwrap_or(Value::Int(next_key));
                        Some(Ok(Entry {
                            key: k,
                            value: value.clone(),
                        }))
                    }
                }
            })))
        })
    }

    /// One element (keyed 0 unless given) followed by the receiver.
    pub fn prepend(&self, value: impl Into<Value>, key: Option<Value>) -> Enumerable {
        let head = Entry {
            key: key.unwrap_or(Value::Int(0)),
            value: value.into(),
        };
        self.pipe(move |up| Ok(Box::new(std::iter::once(Ok(head.clone())).chain(up))))
    }

    /// Pairwise `result_selector(left, right, left_key)`, keyed `0..n`,
    /// stopping at the end of the shorter sequence.
    pub fn zip(
        &self,
        other: impl Into<Enumerable>,
        result_selector: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let f = resolve(result_selector, RESULT_ARITY)?;
        Ok(self.zip_impl(other.into(), f, false))
    }

    /// Like `zip`, but sequences of different lengths fail with
    /// `LengthMismatch` once the difference is observed.
    pub fn zip_strict(
        &self,
        other: impl Into<Enumerable>,
        result_selector: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let f = resolve(result_selector, RESULT_ARITY)?;
        Ok(self.zip_impl(other.into(), f, true))
    }

    fn zip_impl(&self, other: Enumerable, f: Invocable, strict: bool) -> Enumerable {
        let left = self.clone();
        let resettable = left.is_resettable() && other.is_resettable();
        Enumerable::from_fn(resettable, move || {
            let mut a = left.open()?;
            let mut b: Option<EntryIter> = None;
            let other = other.clone();
            let f = f.clone();
            let mut index = 0usize;
            let mut done = false;
            Ok(Box::new(std::iter::from_fn(move || {
                if done {
                    return None;
                }
                let x = match a.next() {
                    Some(Ok(x)) => Some(x),
                    Some(Err(err)) => return Some(Err(err)),
                    None if !strict => {
                        done = true;
                        return None;
                    }
                    None => None,
                };
                if b.is_none() {
                    match other.open() {
                        Ok(it) => b = Some(it),
                        Err(err) => return Some(Err(err)),
                    }
                }
                let y = match b.as_mut()?.next() {
                    Some(Ok(y)) => Some(y),
                    Some(Err(err)) => return Some(Err(err)),
                    None => None,
                };
                match (x, y) {
                    (Some(x), Some(y)) => {
                        let key = index;
                        index += 1;
                        Some(
                            f.call3(&x.value, &y.value, &x.key)
                                .map(|v| Entry::new(key, v)),
                        )
                    }
                    (None, None) => {
                        done = true;
                        None
                    }
                    _ => {
                        done = true;
                        if strict {
                            Some(Err(Error::LengthMismatch(format!(
                                "zipped sequences differ in length after {} pairs",
                                index
                            ))))
                        } else {
                            None
                        }
                    }
                }
            })))
        })
    }

    /// Call `action(value, key)` for each element as it passes through.
    pub fn inspect(&self, action: impl Into<Callable>) -> Result<Enumerable> {
        let f = resolve(action, ACTION_ARITY)?;
        Ok(self.pipe(move |up| {
            let f = f.clone();
            Ok(Box::new(up.map(move |r| {
                let e = r?;
                f.call2(&e.value, &e.key)?;
                Ok(e)
            })))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn vals(e: &Enumerable) -> Vec<Value> {
        e.open().unwrap().map(|r| r.unwrap().value).collect()
    }

    fn keys(e: &Enumerable) -> Vec<Value> {
        e.open().unwrap().map(|r| r.unwrap().key).collect()
    }

    fn ints(v: &[i64]) -> Vec<Value> {
        v.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_where_select_preserve_keys() {
        let e = Enumerable::from_values(vec![1, 2, 3, 4]);
        let w = e.where_("$x => $x % 2 == 0").unwrap();
        assert_eq!(vals(&w), ints(&[2, 4]));
        assert_eq!(keys(&w), ints(&[1, 3]));
        let s = w.select("($v, $k) => $v * 10 + $k").unwrap();
        assert_eq!(vals(&s), ints(&[21, 43]));
    }

    #[test]
    fn test_laziness() {
        let pulled = Rc::new(Cell::new(0));
        let counter = Rc::clone(&pulled);
        let src = Enumerable::from_factory(move || {
            let counter = Rc::clone(&counter);
            (1..=5).map(move |i| {
                counter.set(counter.get() + 1);
                Value::Int(i)
            })
        });
        let chain = src.select("$x => $x + 1").unwrap().take(2);
        assert_eq!(pulled.get(), 0);
        assert_eq!(vals(&chain), ints(&[2, 3]));
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn test_select_many() {
        let e = Enumerable::from_values(vec![Value::list([1, 2]), Value::list([3])]);
        assert_eq!(vals(&e.select_many("$a => $a").unwrap()), ints(&[1, 2, 3]));
        let with = e
            .select_many_with("$a => $a", "($o, $i, $ok, $ik) => $ok * 100 + $i")
            .unwrap();
        assert_eq!(vals(&with), ints(&[1, 2, 103]));
    }

    #[test]
    fn test_skip_take_while() {
        let e = Enumerable::from_values(vec![1, 2, 3, 4, 1]);
        assert_eq!(vals(&e.skip(3)), ints(&[4, 1]));
        assert_eq!(vals(&e.take(2)), ints(&[1, 2]));
        assert_eq!(vals(&e.skip_while("$x => $x < 3").unwrap()), ints(&[3, 4, 1]));
        assert_eq!(vals(&e.take_while("$x => $x < 3").unwrap()), ints(&[1, 2]));
    }

    #[test]
    fn test_default_if_empty_and_reverse() {
        assert_eq!(vals(&Enumerable::empty().default_if_empty(9)), ints(&[9]));
        let e = Enumerable::from_values(vec![1, 2, 3]);
        assert_eq!(vals(&e.default_if_empty(9)), ints(&[1, 2, 3]));
        let r = e.reverse();
        assert_eq!(vals(&r), ints(&[3, 2, 1]));
        assert_eq!(keys(&r), ints(&[2, 1, 0]));
    }

    #[test]
    fn test_append_prepend_concat() {
        let e = Enumerable::from_values(vec![1, 2]);
        let a = e.append(3, None);
        assert_eq!(keys(&a), ints(&[0, 1, 2]));
        let p = e.prepend(0, Some(Value::from("first")));
        assert_eq!(vals(&p), ints(&[0, 1, 2]));
        assert_eq!(keys(&p)[0], Value::from("first"));
        assert_eq!(vals(&e.concat(&a)), ints(&[1, 2, 1, 2, 3]));
    }

    #[test]
    fn test_zip_stops_at_shorter() {
        let e = Enumerable::from_values(vec![1, 2, 3]);
        let z = e
            .zip(Enumerable::from_values(vec!["A", "B"]), "($a, $b) => $a . $b")
            .unwrap();
        assert_eq!(vals(&z), vec![Value::from("1A"), Value::from("2B")]);
        let strict = e
            .zip_strict(Enumerable::from_values(vec!["A"]), "($a, $b) => $a . $b")
            .unwrap();
        let res: Result<Vec<Entry>> = strict.open().unwrap().collect();
        assert!(matches!(res, Err(Error::LengthMismatch(_))));
    }

    #[test]
    fn test_zip_leaves_longer_side_unread() {
        let left = Enumerable::from_values(vec![1, 2]);
        let failing = Enumerable::from_values(vec![1, 2, 0])
            .select("$x => 10 / $x")
            .unwrap();
        let z = left.zip(failing, "($a, $b) => $a + $b").unwrap();
        assert_eq!(vals(&z), ints(&[11, 7]));

        let letters = Enumerable::from_iterator(
            ["A", "B", "C", "D"].into_iter().map(Value::from).collect::<Vec<_>>(),
        );
        let z = left.zip(letters.clone(), "($a, $b) => $a . $b").unwrap();
        assert_eq!(vals(&z), vec![Value::from("1A"), Value::from("2B")]);
        assert_eq!(vals(&letters), vec![Value::from("C"), Value::from("D")]);
    }

    #[test]
    fn test_keys_values_inspect() {
        let arr = Value::record([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let e = Enumerable::from_value(arr).unwrap();
        assert_eq!(vals(&e.keys()), vec![Value::from("a"), Value::from("b")]);
        assert_eq!(keys(&e.values()), ints(&[0, 1]));
        let seen = Rc::new(Cell::new(0));
        let s2 = Rc::clone(&seen);
        let probe = Invocable::unary("probe", move |_| {
            s2.set(s2.get() + 1);
            Ok(Value::Null)
        });
        let i = e.inspect(probe).unwrap();
        assert_eq!(vals(&i).len(), 2);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_bad_lambda_fails_at_configuration() {
        let e = Enumerable::from_values(vec![1]);
        let err = e.where_("$x => (").unwrap_err();
        assert!(matches!(err, Error::InvalidExpression(_)));
    }
}

//! The `Enumerable` handle and its source constructors.
//!
//! An `Enumerable` is a cheap-to-clone reference to a `Source`. Operators
//! wrap the upstream handle in a new source whose `open` opens the upstream
//! and adapts its iterator, so nothing runs until a consumer pulls.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lazyq_collections::{Dictionary, List, Set};
use lazyq_core::{Array, Entry, EntryIter, Error, Key, Object, Result, Value};

use crate::enumerator::Enumerator;
use crate::lookup::{Grouping, Lookup};
use crate::sort::OrderedEnumerable;
use crate::traits::{Cursor, CursorIter, Source};

#[derive(Clone)]
pub struct Enumerable {
    source: Rc<dyn Source>,
}

/// Source backed by a closure that builds a fresh iterator per `open`.
struct FnSource<F> {
    open: F,
    resettable: bool,
}

impl<F> Source for FnSource<F>
where
    F: Fn() -> Result<EntryIter>,
{
    fn open(&self) -> Result<EntryIter> {
        (self.open)()
    }

    fn is_resettable(&self) -> bool {
        self.resettable
    }
}

/// Materialized entries; replays on every open.
struct EntriesSource(Rc<Vec<Entry>>);

impl Source for EntriesSource {
    fn open(&self) -> Result<EntryIter> {
        let data = Rc::clone(&self.0);
        Ok(Box::new((0..data.len()).map(move |i| Ok(data[i].clone()))))
    }
}

/// A single underlying iterator shared by every `open`. Consumption is
/// destructive: reopening continues where the previous consumer stopped.
struct SinglePass {
    inner: Rc<RefCell<Option<EntryIter>>>,
}

impl Source for SinglePass {
    fn open(&self) -> Result<EntryIter> {
        let inner = Rc::clone(&self.inner);
        Ok(Box::new(std::iter::from_fn(move || {
            let mut slot = match inner.try_borrow_mut() {
                Ok(slot) => slot,
                Err(_) => {
                    return Some(Err(Error::Unsupported(
                        "single-pass sequence advanced while already being advanced".into(),
                    )))
                }
            };
            let next = slot.as_mut()?.next();
            if next.is_none() {
                *slot = None;
            }
            next
        })))
    }

    fn is_resettable(&self) -> bool {
        false
    }
}

impl Enumerable {
    pub fn from_source<S: Source + 'static>(source: S) -> Self {
        Self {
            source: Rc::new(source),
        }
    }

    pub(crate) fn from_fn<F>(resettable: bool, open: F) -> Self
    where
        F: Fn() -> Result<EntryIter> + 'static,
    {
        Self::from_source(FnSource { open, resettable })
    }

    /// Derive a sequence whose iterator is `transform` applied to a freshly
    /// opened upstream iterator.
    pub(crate) fn pipe<F>(&self, transform: F) -> Self
    where
        F: Fn(EntryIter) -> Result<EntryIter> + 'static,
    {
        let up = self.clone();
        Self::from_fn(up.is_resettable(), move || transform(up.open()?))
    }

    pub fn open(&self) -> Result<EntryIter> {
        self.source.open()
    }

    pub fn is_resettable(&self) -> bool {
        self.source.is_resettable()
    }

    /// A fresh cursor over this sequence.
    pub fn enumerator(&self) -> Enumerator {
        Enumerator::new(self.clone())
    }

    /// Same as `enumerator`; reads naturally in `for` loops.
    pub fn iter(&self) -> Enumerator {
        self.enumerator()
    }

    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Values keyed `0..n`.
    pub fn from_values<V: Into<Value>>(values: Vec<V>) -> Self {
        Self::from_entries(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| Entry::new(i, v))
                .collect(),
        )
    }

    pub fn from_shared(values: Rc<Vec<Value>>) -> Self {
        Self::from_fn(true, move || {
            let data = Rc::clone(&values);
            Ok(Box::new(
                (0..data.len()).map(move |i| Ok(Entry::new(i, data[i].clone()))),
            ))
        })
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self::from_source(EntriesSource(Rc::new(entries)))
    }

    /// Keys and values of an ordered array, keys preserved.
    pub fn from_array(array: Rc<Array>) -> Self {
        Self::from_fn(true, move || {
            let data = Rc::clone(&array);
            Ok(Box::new((0..data.len()).filter_map(move |i| {
                data.get_index(i)
                    .map(|(k, v)| Ok(Entry::new(k.to_value(), v.clone())))
            })))
        })
    }

    /// Characters of a string keyed by character offset.
    pub fn from_chars(text: &str) -> Self {
        Self::from_values(text.chars().map(|c| c.to_string()).collect())
    }

    /// Single-pass sequence over an iterator of values keyed `0..n`.
    pub fn from_iterator<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::from_generator(
            iter.into_iter()
                .enumerate()
                .map(|(i, v)| Ok(Entry::new(i, v))),
        )
    }

    /// Single-pass sequence over an already keyed, fallible iterator.
    pub fn from_generator<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<Entry>> + 'static,
    {
        Self::from_source(SinglePass {
            inner: Rc::new(RefCell::new(Some(Box::new(iter)))),
        })
    }

    /// Single-pass sequence over an external cursor. The cursor is closed on
    /// exhaustion or when the sequence is dropped.
    pub fn from_cursor<C: Cursor + 'static>(cursor: C) -> Self {
        Self::from_generator(CursorIter::new(cursor))
    }

    /// Resettable sequence that re-runs `factory` for every enumeration.
    pub fn from_factory<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::from_fn(true, move || {
            Ok(Box::new(
                factory()
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Ok(Entry::new(i, v))),
            ))
        })
    }

    /// Normalize any supported source value into a sequence.
    ///
    /// Accepts null (empty), arrays, strings (characters), enumerables,
    /// groupings, lookups, traversable objects and callables producing one of
    /// those. Anything else is an `InvalidArgument`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::Array(a) => Ok(Self::from_array(a)),
            Value::Str(s) => Ok(Self::from_chars(&s)),
            Value::Object(o) => Self::from_object(o),
            Value::Func(f) => Ok(Self::from_fn(true, move || {
                Enumerable::from_value(f.invoke(&[])?)?.open()
            })),
            other => Err(Error::InvalidArgument(format!(
                "{} cannot be used as a sequence source",
                other.type_name()
            ))),
        }
    }

    fn from_object(o: Rc<dyn Object>) -> Result<Self> {
        let any = o.as_any();
        if let Some(e) = any.downcast_ref::<Enumerable>() {
            return Ok(e.clone());
        }
        if let Some(o) = any.downcast_ref::<OrderedEnumerable>() {
            return Ok(o.as_enumerable().clone());
        }
        if let Some(g) = any.downcast_ref::<Grouping>() {
            return Ok(g.enumerable());
        }
        if let Some(l) = any.downcast_ref::<Lookup>() {
            return Ok(l.to_enumerable());
        }
        if o.traverse().is_none() {
            return Err(Error::InvalidArgument(format!(
                "{} object is not traversable",
                o.class_name()
            )));
        }
        Ok(Self::from_fn(true, move || match o.traverse() {
            Some(iter) => iter,
            None => Ok(Box::new(std::iter::empty())),
        }))
    }

    /// Materialize into a resettable sequence that can be enumerated any
    /// number of times.
    pub fn snapshot(&self) -> Result<Enumerable> {
        let entries = self.open()?.collect::<Result<Vec<_>>>()?;
        Ok(Self::from_entries(entries))
    }
}

impl fmt::Debug for Enumerable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerable")
            .field("resettable", &self.is_resettable())
            .finish()
    }
}

impl TryFrom<Value> for Enumerable {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Enumerable::from_value(value)
    }
}

impl From<&Enumerable> for Enumerable {
    fn from(e: &Enumerable) -> Self {
        e.clone()
    }
}

impl From<Array> for Enumerable {
    fn from(a: Array) -> Self {
        Enumerable::from_array(Rc::new(a))
    }
}

impl From<Vec<Value>> for Enumerable {
    fn from(values: Vec<Value>) -> Self {
        Enumerable::from_values(values)
    }
}

impl From<&Dictionary> for Enumerable {
    fn from(d: &Dictionary) -> Self {
        Enumerable::from_entries(d.entries())
    }
}

impl From<&Set> for Enumerable {
    fn from(s: &Set) -> Self {
        Enumerable::from_entries(s.entries())
    }
}

impl From<&List> for Enumerable {
    fn from(l: &List) -> Self {
        Enumerable::from_entries(l.entries())
    }
}

impl From<&Lookup> for Enumerable {
    fn from(l: &Lookup) -> Self {
        l.to_enumerable()
    }
}

impl From<Enumerable> for Value {
    fn from(e: Enumerable) -> Self {
        Value::object(e)
    }
}

/// Iterator that runs `build` on its first `next` and then drains the
/// result. Used by operators that must see the whole upstream first.
pub(crate) fn deferred<F>(build: F) -> EntryIter
where
    F: FnOnce() -> Result<EntryIter> + 'static,
{
    let mut build = Some(build);
    let mut inner: Option<EntryIter> = None;
    Box::new(std::iter::from_fn(move || {
        if let Some(build) = build.take() {
            match build() {
                Ok(it) => inner = Some(it),
                Err(e) => return Some(Err(e)),
            }
        }
        inner.as_mut()?.next()
    }))
}

/// Drain an iterator into a vector, stopping at the first error.
pub(crate) fn drain(iter: EntryIter) -> Result<Vec<Entry>> {
    iter.collect()
}

/// Keys of materialized entries as array keys; later duplicates overwrite.
pub(crate) fn entries_to_array(entries: impl Iterator<Item = Result<Entry>>) -> Result<Array> {
    let mut arr = Array::new();
    for e in entries {
        let e = e?;
        arr.insert(Key::from_value(&e.key)?, e.value);
    }
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(e: &Enumerable) -> Vec<Value> {
        e.open().unwrap().map(|r| r.unwrap().value).collect()
    }

    #[test]
    fn test_materialized_sources_replay() {
        let e = Enumerable::from_values(vec![1, 2, 3]);
        assert!(e.is_resettable());
        assert_eq!(values(&e), values(&e));
    }

    #[test]
    fn test_single_pass_does_not_rewind() {
        let e = Enumerable::from_iterator((1..=4).map(Value::Int));
        assert!(!e.is_resettable());
        let mut first = e.open().unwrap();
        assert_eq!(first.next().unwrap().unwrap().value, Value::Int(1));
        // a second consumer continues from the shared position
        assert_eq!(values(&e), vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
        assert!(values(&e).is_empty());
    }

    #[test]
    fn test_from_value_shapes() {
        assert!(values(&Enumerable::from_value(Value::Null).unwrap()).is_empty());
        assert_eq!(
            values(&Enumerable::from_value(Value::from("ab")).unwrap()),
            vec![Value::from("a"), Value::from("b")]
        );
        let err = Enumerable::from_value(Value::Int(3)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_array_keys_preserved() {
        let arr = Value::record([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let e = Enumerable::from_value(arr).unwrap();
        let keys: Vec<Value> = e.open().unwrap().map(|r| r.unwrap().key).collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
    }
}

//! Grouping: `Lookup`, `Grouping`, `group_by` and `to_lookup`.

use std::rc::Rc;

use lazyq_core::{
    default_equality, Entry, EntryIter, Invocable, KeyIndex, Result, SharedEquality, Value,
};

use crate::enumerable::{deferred, Enumerable};
use crate::resolve::{resolve, Callable, RESULT_ARITY, SELECTOR_ARITY};
use crate::set::custom_equality;

/// A key with the elements that share it, in encounter order and keyed
/// `0..n`.
#[derive(Debug, Clone)]
pub struct Grouping {
    key: Value,
    items: Rc<Vec<Value>>,
}

impl Grouping {
    pub fn new(key: Value, items: Vec<Value>) -> Self {
        Self {
            key,
            items: Rc::new(items),
        }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn enumerable(&self) -> Enumerable {
        Enumerable::from_shared(Rc::clone(&self.items))
    }
}

struct LookupInner {
    index: KeyIndex,
    groups: Vec<Rc<Vec<Value>>>,
}

/// Keyed multi-map in first-seen key order. Cheap to clone.
#[derive(Clone)]
pub struct Lookup {
    inner: Rc<LookupInner>,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.inner.index.keys().iter().zip(self.inner.groups.iter()))
            .finish()
    }
}

impl Lookup {
    pub(crate) fn build(
        iter: EntryIter,
        key_selector: &Invocable,
        element_selector: Option<&Invocable>,
        eq: SharedEquality,
    ) -> Result<Lookup> {
        let mut index = KeyIndex::new(eq);
        let mut groups: Vec<Vec<Value>> = Vec::new();
        for r in iter {
            let e = r?;
            let k = key_selector.call2(&e.value, &e.key)?;
            let v = match element_selector {
                Some(f) => f.call2(&e.value, &e.key)?,
                None => e.value,
            };
            let (pos, inserted) = index.insert(k)?;
            if inserted {
                groups.push(Vec::new());
            }
            groups[pos].push(v);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(groups = groups.len(), "built lookup");
        Ok(Lookup {
            inner: Rc::new(LookupInner {
                index,
                groups: groups.into_iter().map(Rc::new).collect(),
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.groups.is_empty()
    }

    pub fn keys(&self) -> &[Value] {
        self.inner.index.keys()
    }

    pub fn contains(&self, key: &Value) -> Result<bool> {
        Ok(self.inner.index.position(key)?.is_some())
    }

    pub(crate) fn members(&self, key: &Value) -> Result<Option<Rc<Vec<Value>>>> {
        Ok(self
            .inner
            .index
            .position(key)?
            .map(|pos| Rc::clone(&self.inner.groups[pos])))
    }

    /// Elements under `key`; an unknown key yields an empty sequence.
    pub fn get(&self, key: &Value) -> Result<Enumerable> {
        Ok(match self.inner.index.position(key)? {
            Some(pos) => Enumerable::from_shared(Rc::clone(&self.inner.groups[pos])),
            None => Enumerable::empty(),
        })
    }

    pub fn grouping_at(&self, pos: usize) -> Option<Grouping> {
        let key = self.inner.index.keys().get(pos)?.clone();
        let items = Rc::clone(self.inner.groups.get(pos)?);
        Some(Grouping { key, items })
    }

    pub fn groupings(&self) -> Vec<Grouping> {
        (0..self.len()).filter_map(|i| self.grouping_at(i)).collect()
    }

    /// The groupings as a sequence keyed by group key.
    pub fn to_enumerable(&self) -> Enumerable {
        let lookup = self.clone();
        Enumerable::from_fn(true, move || {
            let lookup = lookup.clone();
            Ok(Box::new((0..lookup.len()).filter_map(move |i| {
                lookup
                    .grouping_at(i)
                    .map(|g| Ok(Entry::new(g.key.clone(), Value::object(g))))
            })))
        })
    }
}

fn optional(c: Option<Callable>, arity: usize) -> Result<Option<Invocable>> {
    c.map(|c| resolve(c, arity)).transpose()
}

fn equality(comparer: Option<Callable>) -> Result<SharedEquality> {
    match comparer {
        Some(c) => custom_equality(c),
        None => Ok(default_equality()),
    }
}

impl Enumerable {
    /// Groupings by `key_selector(value, key)`, in first-seen key order.
    /// Each element of the result is a `Grouping` keyed by its group key.
    pub fn group_by(&self, key_selector: impl Into<Callable>) -> Result<Enumerable> {
        self.group_by_with(key_selector, None, None, None)
    }

    /// `group_by` with an optional `element_selector(value, key)` applied to
    /// members, a `result_selector(grouping, group_key)` applied to each group
    /// and a key `comparer(a, b)`.
    pub fn group_by_with(
        &self,
        key_selector: impl Into<Callable>,
        element_selector: Option<Callable>,
        result_selector: Option<Callable>,
        comparer: Option<Callable>,
    ) -> Result<Enumerable> {
        let fk = resolve(key_selector, SELECTOR_ARITY)?;
        let fe = optional(element_selector, SELECTOR_ARITY)?;
        let fr = optional(result_selector, RESULT_ARITY)?;
        let eq = equality(comparer)?;
        Ok(self.pipe(move |up| {
            let fk = fk.clone();
            let fe = fe.clone();
            let fr = fr.clone();
            let eq = Rc::clone(&eq);
            Ok(deferred(move || {
                let lookup = Lookup::build(up, &fk, fe.as_ref(), eq)?;
                let groups = lookup.to_enumerable().open()?;
                let out: EntryIter = match fr {
                    Some(fr) => Box::new(groups.map(move |r| {
                        let e = r?;
                        let value = fr.call2(&e.value, &e.key)?;
                        Ok(Entry { key: e.key, value })
                    })),
                    None => groups,
                };
                Ok(out)
            }))
        }))
    }

    /// Eagerly group into a `Lookup`.
    pub fn to_lookup(&self, key_selector: impl Into<Callable>) -> Result<Lookup> {
        self.to_lookup_with(key_selector, None, None)
    }

    pub fn to_lookup_with(
        &self,
        key_selector: impl Into<Callable>,
        element_selector: Option<Callable>,
        comparer: Option<Callable>,
    ) -> Result<Lookup> {
        let fk = resolve(key_selector, SELECTOR_ARITY)?;
        let fe = optional(element_selector, SELECTOR_ARITY)?;
        Lookup::build(self.open()?, &fk, fe.as_ref(), equality(comparer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_first_seen_order() {
        let e = Enumerable::from_values(vec![1, 2, 3, 4, 5, 6, 7]);
        let groups: Vec<Entry> = e
            .group_by("$x => $x % 3")
            .unwrap()
            .open()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let keys: Vec<Value> = groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Int(0)]);
        let first = groups[0].value.downcast_ref::<Grouping>().unwrap();
        assert_eq!(first.items(), &[Value::Int(1), Value::Int(4), Value::Int(7)]);
    }

    #[test]
    fn test_group_by_with_selectors() {
        let e = Enumerable::from_values(vec!["apple", "avocado", "banana"]);
        let counts: Vec<Value> = e
            .group_by_with(
                "$s => substr($s, 0, 1)",
                Some(Callable::from("$s => strtoupper($s)")),
                Some(Callable::from("($g, $k) => $k . count($g->toArray())")),
                None,
            )
            .unwrap()
            .open()
            .unwrap()
            .map(|r| r.unwrap().value)
            .collect();
        assert_eq!(counts, vec![Value::from("a2"), Value::from("b1")]);
    }

    #[test]
    fn test_lookup_unknown_key_is_empty() {
        let e = Enumerable::from_values(vec!["x", "yy", "zz"]);
        let lookup = e.to_lookup("$s => strlen($s)").unwrap();
        assert_eq!(lookup.len(), 2);
        assert!(lookup.contains(&Value::from("2")).unwrap());
        let twos: Vec<Value> = lookup
            .get(&Value::Int(2))
            .unwrap()
            .open()
            .unwrap()
            .map(|r| r.unwrap().value)
            .collect();
        assert_eq!(twos, vec![Value::from("yy"), Value::from("zz")]);
        assert!(lookup.get(&Value::Int(9)).unwrap().open().unwrap().next().is_none());
    }
}

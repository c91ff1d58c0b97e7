//! Set operators. All of them keep first-seen order and the receiver's keys,
//! and compare under `LooseEquality` unless a comparer is supplied.

use std::rc::Rc;

use lazyq_core::{
    default_equality, CustomEquality, Entry, EqualitySet, Invocable, Result, SharedEquality,
};

use crate::enumerable::{deferred, Enumerable};
use crate::resolve::{resolve, Callable, COMPARER_ARITY, SELECTOR_ARITY};

pub(crate) fn custom_equality(comparer: impl Into<Callable>) -> Result<SharedEquality> {
    Ok(Rc::new(CustomEquality(resolve(comparer, COMPARER_ARITY)?)))
}

impl Enumerable {
    /// First occurrence of each distinct value.
    pub fn distinct(&self) -> Enumerable {
        self.distinct_using(default_equality())
    }

    /// Distinct under `comparer(a, b)`, which must be symmetric.
    pub fn distinct_with(&self, comparer: impl Into<Callable>) -> Result<Enumerable> {
        Ok(self.distinct_using(custom_equality(comparer)?))
    }

    /// First element for each distinct `key_selector(value, key)`.
    pub fn distinct_by(&self, key_selector: impl Into<Callable>) -> Result<Enumerable> {
        let f = resolve(key_selector, SELECTOR_ARITY)?;
        Ok(self.dedupe(Some(f), default_equality()))
    }

    pub fn distinct_using(&self, eq: SharedEquality) -> Enumerable {
        self.dedupe(None, eq)
    }

    fn dedupe(&self, key: Option<Invocable>, eq: SharedEquality) -> Enumerable {
        self.pipe(move |up| {
            let key = key.clone();
            let mut seen = EqualitySet::new(Rc::clone(&eq));
            Ok(Box::new(up.filter_map(move |r| {
                let admit = r.as_ref().map_err(Clone::clone).and_then(|e| {
                    let probe = match &key {
                        Some(f) => f.call2(&e.value, &e.key)?,
                        None => e.value.clone(),
                    };
                    seen.insert(probe)
                });
                match admit {
                    Ok(true) => Some(r),
                    Ok(false) => None,
                    Err(err) => Some(Err(err)),
                }
            })))
        })
    }

    /// Distinct elements of the receiver, then distinct elements of `other`
    /// not already produced.
    pub fn union(&self, other: impl Into<Enumerable>) -> Enumerable {
        self.union_using(other, default_equality())
    }

    pub fn union_with(
        &self,
        other: impl Into<Enumerable>,
        comparer: impl Into<Callable>,
    ) -> Result<Enumerable> {
        Ok(self.union_using(other, custom_equality(comparer)?))
    }

    pub fn union_using(&self, other: impl Into<Enumerable>, eq: SharedEquality) -> Enumerable {
        self.concat(other).distinct_using(eq)
    }

    /// Receiver elements equal to no element of `other`, repeats included.
    /// `other` is drained once, on the first pull.
    pub fn except(&self, other: impl Into<Enumerable>) -> Enumerable {
        self.except_using(other, default_equality())
    }

    pub fn except_with(
        &self,
        other: impl Into<Enumerable>,
        comparer: impl Into<Callable>,
    ) -> Result<Enumerable> {
        Ok(self.except_using(other, custom_equality(comparer)?))
    }

    pub fn except_using(&self, other: impl Into<Enumerable>, eq: SharedEquality) -> Enumerable {
        self.filter_against(other.into(), eq, false)
    }

    /// Distinct receiver elements equal to some element of `other`.
    pub fn intersect(&self, other: impl Into<Enumerable>) -> Enumerable {
        self.intersect_using(other, default_equality())
    }

    pub fn intersect_with(
        &self,
        other: impl Into<Enumerable>,
        comparer: impl Into<Callable>,
    ) -> Result<Enumerable> {
        Ok(self.intersect_using(other, custom_equality(comparer)?))
    }

    pub fn intersect_using(&self, other: impl Into<Enumerable>, eq: SharedEquality) -> Enumerable {
        self.filter_against(other.into(), eq, true)
    }

    fn filter_against(&self, other: Enumerable, eq: SharedEquality, keep_common: bool) -> Enumerable {
        let up = self.clone();
        let resettable = up.is_resettable() && other.is_resettable();
        Enumerable::from_fn(resettable, move || {
            let up = up.open()?;
            let other = other.clone();
            let eq = Rc::clone(&eq);
            Ok(deferred(move || {
                let mut set = EqualitySet::new(Rc::clone(&eq));
                for e in other.open()? {
                    set.insert(e?.value)?;
                }
                let mut emitted = EqualitySet::new(eq);
                Ok(Box::new(up.filter_map(move |r| {
                    let admit = r.as_ref().map_err(Clone::clone).and_then(|e: &Entry| {
                        if set.contains(&e.value)? != keep_common {
                            return Ok(false);
                        }
                        if !keep_common {
                            return Ok(true);
                        }
                        emitted.insert(e.value.clone())
                    });
                    match admit {
                        Ok(true) => Some(r),
                        Ok(false) => None,
                        Err(err) => Some(Err(err)),
                    }
                })))
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyq_core::Value;

    fn vals(e: &Enumerable) -> Vec<Value> {
        e.open().unwrap().map(|r| r.unwrap().value).collect()
    }

    fn ints(v: &[i64]) -> Vec<Value> {
        v.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_distinct_loose_by_default() {
        let e = Enumerable::from_values(vec![
            Value::Int(2),
            Value::from("2"),
            Value::Float(2.0),
            Value::Int(3),
            Value::Int(2),
        ]);
        assert_eq!(vals(&e.distinct()), ints(&[2, 3]));
        let twice = e.distinct().distinct();
        assert_eq!(vals(&twice), vals(&e.distinct()));
    }

    #[test]
    fn test_distinct_with_comparer_is_authoritative() {
        let e = Enumerable::from_values(vec![Value::Int(2), Value::from("2"), Value::Int(2)]);
        let strict = e.distinct_with("($a, $b) => $a === $b").unwrap();
        assert_eq!(vals(&strict), vec![Value::Int(2), Value::from("2")]);
    }

    #[test]
    fn test_distinct_by() {
        let e = Enumerable::from_values(vec!["apple", "avocado", "banana", "blueberry", "cherry"]);
        let firsts = e.distinct_by("$s => substr($s, 0, 1)").unwrap();
        assert_eq!(
            vals(&firsts),
            vec![Value::from("apple"), Value::from("banana"), Value::from("cherry")]
        );
    }

    #[test]
    fn test_union_except_intersect() {
        let a = Enumerable::from_values(vec![1, 2, 3, 4, 5]);
        let b = Enumerable::from_values(vec![2, 5]);
        assert_eq!(vals(&a.except(&b)), ints(&[1, 3, 4]));
        assert_eq!(vals(&a.intersect(&b)), ints(&[2, 5]));
        let c = Enumerable::from_values(vec![5, 6, 6, 1]);
        assert_eq!(vals(&a.union(&c)), ints(&[1, 2, 3, 4, 5, 6]));
        let dup = Enumerable::from_values(vec![1, 1, 3]);
        assert_eq!(vals(&dup.except(&b)), ints(&[1, 1, 3]));
    }

    #[test]
    fn test_except_drains_single_pass_other_once() {
        let a = Enumerable::from_values(vec![1, 2, 3]);
        let other = Enumerable::from_iterator(vec![Value::Int(2)]);
        let e = a.except(&other);
        assert_eq!(vals(&e), ints(&[1, 3]));
    }

    #[test]
    fn test_keys_preserved() {
        let a = Enumerable::from_values(vec![1, 2, 3]);
        let keys: Vec<Value> = a
            .except(Enumerable::from_values(vec![1]))
            .open()
            .unwrap()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(keys, ints(&[1, 2]));
    }
}

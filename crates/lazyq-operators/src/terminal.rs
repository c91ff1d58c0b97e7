//! Terminal operators: they drain (part of) the sequence and return a
//! concrete result.

use std::cmp::Ordering;
use std::rc::Rc;

use lazyq_collections::{Dictionary, DictionaryOptions, List, ListOptions, Set, SetOptions};
use lazyq_core::compare::loose_compare;
use lazyq_core::{
    arith, default_equality, Array, Entry, EqualityComparer, Error, Invocable, Key, LooseEquality,
    QueryConfig, Result, Value,
};

use crate::enumerable::{entries_to_array, Enumerable};
use crate::resolve::{
    resolve, Callable, ACCUMULATOR_ARITY, ACTION_ARITY, SELECTOR_ARITY,
};
use crate::set::custom_equality;

fn no_elements() -> Error {
    Error::NotFound("sequence contains no elements".into())
}

fn no_match() -> Error {
    Error::NotFound("sequence contains no matching element".into())
}

fn optional(c: Option<Callable>, arity: usize) -> Result<Option<Invocable>> {
    c.map(|c| resolve(c, arity)).transpose()
}

fn matches(pred: Option<&Invocable>, e: &Entry) -> Result<bool> {
    match pred {
        Some(f) => Ok(f.call2(&e.value, &e.key)?.is_truthy()),
        None => Ok(true),
    }
}

impl Enumerable {
    /// Left fold with `accumulator(acc, value, key)`. An empty sequence
    /// returns `seed` without calling the accumulator.
    pub fn aggregate(&self, accumulator: impl Into<Callable>, seed: impl Into<Value>) -> Result<Value> {
        let f = resolve(accumulator, ACCUMULATOR_ARITY)?;
        let mut acc = seed.into();
        for r in self.open()? {
            let e = r?;
            acc = f.call3(&acc, &e.value, &e.key)?;
        }
        Ok(acc)
    }

    /// Left fold seeded with the first element; fails on an empty sequence.
    pub fn reduce(&self, accumulator: impl Into<Callable>) -> Result<Value> {
        let f = resolve(accumulator, ACCUMULATOR_ARITY)?;
        let mut it = self.open()?;
        let mut acc = match it.next() {
            Some(r) => r?.value,
            None => return Err(no_elements()),
        };
        for r in it {
            let e = r?;
            acc = f.call3(&acc, &e.value, &e.key)?;
        }
        Ok(acc)
    }

    pub fn count(&self) -> Result<usize> {
        let mut n = 0;
        for r in self.open()? {
            r?;
            n += 1;
        }
        Ok(n)
    }

    pub fn count_where(&self, predicate: impl Into<Callable>) -> Result<usize> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        let mut n = 0;
        for r in self.open()? {
            if matches(Some(&f), &r?)? {
                n += 1;
            }
        }
        Ok(n)
    }

    fn fold_values(
        &self,
        selector: Option<&Invocable>,
        seed: Value,
        op: fn(&Value, &Value) -> Result<Value>,
    ) -> Result<(Value, usize)> {
        let mut acc = seed;
        let mut n = 0;
        for r in self.open()? {
            let e = r?;
            let v = match selector {
                Some(f) => f.call2(&e.value, &e.key)?,
                None => e.value,
            };
            acc = op(&acc, &v)?;
            n += 1;
        }
        Ok((acc, n))
    }

    /// Sum of the values; 0 for an empty sequence.
    pub fn sum(&self) -> Result<Value> {
        Ok(self.fold_values(None, Value::Int(0), arith::add)?.0)
    }

    pub fn sum_by(&self, selector: impl Into<Callable>) -> Result<Value> {
        let f = resolve(selector, SELECTOR_ARITY)?;
        Ok(self.fold_values(Some(&f), Value::Int(0), arith::add)?.0)
    }

    /// Product of the values; 1 for an empty sequence.
    pub fn product(&self) -> Result<Value> {
        Ok(self.fold_values(None, Value::Int(1), arith::mul)?.0)
    }

    pub fn product_by(&self, selector: impl Into<Callable>) -> Result<Value> {
        let f = resolve(selector, SELECTOR_ARITY)?;
        Ok(self.fold_values(Some(&f), Value::Int(1), arith::mul)?.0)
    }

    /// Arithmetic mean; fails on an empty sequence.
    pub fn average(&self) -> Result<Value> {
        let (sum, n) = self.fold_values(None, Value::Int(0), arith::add)?;
        if n == 0 {
            return Err(no_elements());
        }
        arith::div(&sum, &Value::from(n))
    }

    fn extreme(&self, selector: Option<&Invocable>, want: Ordering) -> Result<Value> {
        let mut best: Option<(Value, Value)> = None;
        for r in self.open()? {
            let e = r?;
            let k = match selector {
                Some(f) => f.call2(&e.value, &e.key)?,
                None => e.value.clone(),
            };
            let better = match &best {
                None => true,
                Some((bk, _)) => loose_compare(&k, bk) == want,
            };
            if better {
                best = Some((k, e.value));
            }
        }
        best.map(|(_, v)| v).ok_or_else(no_elements)
    }

    /// Smallest value under loose comparison; fails on an empty sequence.
    pub fn min(&self) -> Result<Value> {
        self.extreme(None, Ordering::Less)
    }

    pub fn max(&self) -> Result<Value> {
        self.extreme(None, Ordering::Greater)
    }

    /// Element with the smallest `selector(value, key)`; the first one wins
    /// ties.
    pub fn min_by(&self, selector: impl Into<Callable>) -> Result<Value> {
        let f = resolve(selector, SELECTOR_ARITY)?;
        self.extreme(Some(&f), Ordering::Less)
    }

    pub fn max_by(&self, selector: impl Into<Callable>) -> Result<Value> {
        let f = resolve(selector, SELECTOR_ARITY)?;
        self.extreme(Some(&f), Ordering::Greater)
    }

    /// Whether every element satisfies `predicate`; true for an empty sequence.
    pub fn all(&self, predicate: impl Into<Callable>) -> Result<bool> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        for r in self.open()? {
            if !matches(Some(&f), &r?)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn any(&self) -> Result<bool> {
        match self.open()?.next() {
            Some(r) => r.map(|_| true),
            None => Ok(false),
        }
    }

    pub fn any_where(&self, predicate: impl Into<Callable>) -> Result<bool> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        for r in self.open()? {
            if matches(Some(&f), &r?)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether some value loosely equals `value`.
    pub fn contains(&self, value: &Value) -> Result<bool> {
        Ok(self.find_key(|v| LooseEquality.equals(v, value), false)?.is_some())
    }

    fn find_entry(&self, pred: Option<&Invocable>, last: bool) -> Result<Option<Entry>> {
        let mut found = None;
        for r in self.open()? {
            let e = r?;
            if matches(pred, &e)? {
                if !last {
                    return Ok(Some(e));
                }
                found = Some(e);
            }
        }
        Ok(found)
    }

    fn find_single(&self, pred: Option<&Invocable>) -> Result<Option<Entry>> {
        let mut found = None;
        for r in self.open()? {
            let e = r?;
            if matches(pred, &e)? {
                if found.is_some() {
                    return Err(Error::MultipleMatches);
                }
                found = Some(e);
            }
        }
        Ok(found)
    }

    pub fn first(&self) -> Result<Value> {
        Ok(self.find_entry(None, false)?.ok_or_else(no_elements)?.value)
    }

    pub fn first_where(&self, predicate: impl Into<Callable>) -> Result<Value> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        Ok(self.find_entry(Some(&f), false)?.ok_or_else(no_match)?.value)
    }

    /// First (matching) value, or `default` when there is none.
    pub fn first_or_default(
        &self,
        default: impl Into<Value>,
        predicate: Option<Callable>,
    ) -> Result<Value> {
        let f = optional(predicate, SELECTOR_ARITY)?;
        Ok(self
            .find_entry(f.as_ref(), false)?
            .map(|e| e.value)
            .unwrap_or_else(|| default.into()))
    }

    pub fn last(&self) -> Result<Value> {
        Ok(self.find_entry(None, true)?.ok_or_else(no_elements)?.value)
    }

    pub fn last_where(&self, predicate: impl Into<Callable>) -> Result<Value> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        Ok(self.find_entry(Some(&f), true)?.ok_or_else(no_match)?.value)
    }

    pub fn last_or_default(
        &self,
        default: impl Into<Value>,
        predicate: Option<Callable>,
    ) -> Result<Value> {
        let f = optional(predicate, SELECTOR_ARITY)?;
        Ok(self
            .find_entry(f.as_ref(), true)?
            .map(|e| e.value)
            .unwrap_or_else(|| default.into()))
    }

    /// The only element; fails when there are none or more than one.
    pub fn single(&self) -> Result<Value> {
        Ok(self.find_single(None)?.ok_or_else(no_elements)?.value)
    }

    pub fn single_where(&self, predicate: impl Into<Callable>) -> Result<Value> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        Ok(self.find_single(Some(&f))?.ok_or_else(no_match)?.value)
    }

    /// Like `single`, substituting `default` for zero matches. More than one
    /// match still fails.
    pub fn single_or_default(
        &self,
        default: impl Into<Value>,
        predicate: Option<Callable>,
    ) -> Result<Value> {
        let f = optional(predicate, SELECTOR_ARITY)?;
        Ok(self
            .find_single(f.as_ref())?
            .map(|e| e.value)
            .unwrap_or_else(|| default.into()))
    }

    /// Value at a zero-based position.
    pub fn element_at(&self, index: usize) -> Result<Value> {
        match self.open()?.nth(index) {
            Some(r) => Ok(r?.value),
            None => Err(Error::NotFound(format!("no element at position {}", index))),
        }
    }

    pub fn element_at_or_default(&self, index: usize, default: impl Into<Value>) -> Result<Value> {
        match self.open()?.nth(index) {
            Some(r) => Ok(r?.value),
            None => Ok(default.into()),
        }
    }

    fn find_key<F>(&self, mut test: F, last: bool) -> Result<Option<Value>>
    where
        F: FnMut(&Value) -> Result<bool>,
    {
        let mut found = None;
        for r in self.open()? {
            let e = r?;
            if test(&e.value)? {
                if !last {
                    return Ok(Some(e.key));
                }
                found = Some(e.key);
            }
        }
        Ok(found)
    }

    /// Key of the first value loosely equal to `value`.
    pub fn index_of(&self, value: &Value) -> Result<Option<Value>> {
        self.find_key(|v| LooseEquality.equals(v, value), false)
    }

    pub fn last_index_of(&self, value: &Value) -> Result<Option<Value>> {
        self.find_key(|v| LooseEquality.equals(v, value), true)
    }

    /// Key of the first element satisfying `predicate(value, key)`.
    pub fn find_index(&self, predicate: impl Into<Callable>) -> Result<Option<Value>> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        self.find_entry(Some(&f), false).map(|e| e.map(|e| e.key))
    }

    pub fn find_last_index(&self, predicate: impl Into<Callable>) -> Result<Option<Value>> {
        let f = resolve(predicate, SELECTOR_ARITY)?;
        self.find_entry(Some(&f), true).map(|e| e.map(|e| e.key))
    }

    /// Same length and pairwise equal values, in order.
    pub fn sequence_equal(&self, other: impl Into<Enumerable>) -> Result<bool> {
        self.sequence_equal_by(other.into(), &*default_equality())
    }

    pub fn sequence_equal_with(
        &self,
        other: impl Into<Enumerable>,
        comparer: impl Into<Callable>,
    ) -> Result<bool> {
        let eq = custom_equality(comparer)?;
        self.sequence_equal_by(other.into(), &*eq)
    }

    fn sequence_equal_by(&self, other: Enumerable, eq: &dyn EqualityComparer) -> Result<bool> {
        let mut a = self.open()?;
        let mut b = other.open()?;
        loop {
            match (a.next(), b.next()) {
                (None, None) => return Ok(true),
                (Some(x), Some(y)) => {
                    if !eq.equals(&x?.value, &y?.value)? {
                        return Ok(false);
                    }
                }
                _ => return Ok(false),
            }
        }
    }

    /// Keyed array of the elements; a repeated key overwrites the earlier
    /// value in place.
    pub fn to_array(&self) -> Result<Array> {
        entries_to_array(self.open()?)
    }

    /// `to_array`, also converting nested sequences and arrays recursively.
    pub fn to_array_deep(&self) -> Result<Array> {
        let mut arr = Array::new();
        for r in self.open()? {
            let e = r?;
            arr.insert(Key::from_value(&e.key)?, deep(e.value)?);
        }
        Ok(arr)
    }

    /// Values in order, keys dropped.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        self.open()?.map(|r| r.map(|e| e.value)).collect()
    }

    pub fn to_list(&self) -> Result<List> {
        self.to_list_with(ListOptions::default())
    }

    pub fn to_list_with(&self, options: ListOptions) -> Result<List> {
        let mut list = List::with_options(options);
        for r in self.open()? {
            list.push(r?.value)?;
        }
        Ok(list)
    }

    /// Dictionary of the entries as they are keyed. Duplicate keys fail with
    /// `AlreadyExists` unless `LAZYQ_ALLOW_DUPLICATE_KEYS` turns on
    /// overwriting.
    pub fn to_dictionary(&self) -> Result<Dictionary> {
        let options = DictionaryOptions::from_config(&QueryConfig::from_env());
        self.to_dictionary_with(None, None, options)
    }

    /// Dictionary keyed by `key_selector(value, key)` holding
    /// `value_selector(value, key)`, under the given options. Nothing is
    /// returned when any element is rejected.
    pub fn to_dictionary_with(
        &self,
        key_selector: Option<Callable>,
        value_selector: Option<Callable>,
        options: DictionaryOptions,
    ) -> Result<Dictionary> {
        let fk = optional(key_selector, SELECTOR_ARITY)?;
        let fv = optional(value_selector, SELECTOR_ARITY)?;
        let mut dict = Dictionary::with_options(options);
        for r in self.open()? {
            let e = r?;
            let k = match &fk {
                Some(f) => f.call2(&e.value, &e.key)?,
                None => e.key.clone(),
            };
            let v = match &fv {
                Some(f) => f.call2(&e.value, &e.key)?,
                None => e.value,
            };
            dict.add(k, v)?;
        }
        Ok(dict)
    }

    /// Set of the values. Duplicates fail with `AlreadyExists`.
    pub fn to_set(&self) -> Result<Set> {
        self.to_set_with(SetOptions::default())
    }

    pub fn to_set_with(&self, options: SetOptions) -> Result<Set> {
        let mut set = Set::with_options(options);
        for r in self.open()? {
            set.add(r?.value)?;
        }
        Ok(set)
    }

    /// JSON document of the keyed contents: a JSON array when keys run
    /// `0..n`, an object otherwise.
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(None, false)
    }

    /// `to_json` with keys remapped by `key_selector(value, key)`.
    pub fn to_json_with(&self, key_selector: Option<Callable>, pretty: bool) -> Result<String> {
        let fk = optional(key_selector, SELECTOR_ARITY)?;
        let mut arr = Array::new();
        for r in self.open()? {
            let e = r?;
            let k = match &fk {
                Some(f) => f.call2(&e.value, &e.key)?,
                None => e.key.clone(),
            };
            arr.insert(Key::from_value(&k)?, e.value);
        }
        Value::Array(Rc::new(arr)).to_json_string(pretty)
    }

    /// Values joined with `separator`.
    pub fn implode(&self, separator: &str) -> Result<String> {
        let parts = self
            .open()?
            .map(|r| r.and_then(|e| e.value.to_display_string()))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(separator))
    }

    /// `implode` over `selector(value, key)`.
    pub fn implode_by(&self, separator: &str, selector: impl Into<Callable>) -> Result<String> {
        self.select(selector)?.implode(separator)
    }

    /// Call `action(value, key)` for every element.
    pub fn for_each(&self, action: impl Into<Callable>) -> Result<()> {
        let f = resolve(action, ACTION_ARITY)?;
        for r in self.open()? {
            let e = r?;
            f.call2(&e.value, &e.key)?;
        }
        Ok(())
    }
}

fn deep(v: Value) -> Result<Value> {
    match v {
        Value::Array(a) => {
            let mut out = Array::with_capacity(a.len());
            for (k, v) in a.iter() {
                out.insert(k.clone(), deep(v.clone())?);
            }
            Ok(Value::Array(Rc::new(out)))
        }
        Value::Object(o) => match o.traverse() {
            Some(iter) => {
                let mut out = Array::new();
                for r in iter? {
                    let e = r?;
                    out.insert(Key::from_value(&e.key)?, deep(e.value)?);
                }
                Ok(Value::Array(Rc::new(out)))
            }
            None => Ok(Value::Object(o)),
        },
        other => Ok(other),
    }
}

//! Equality strategies used by set operators, joins, grouping and containers.
//!
//! A comparer that can produce a `Fingerprint` gets hashed lookups; one that
//! cannot (a user callable) is probed linearly.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::hash::{Fingerprint, FingerprintBuilder};
use crate::invocable::Invocable;
use crate::value::{parse_numeric, Key, Number, Value};

pub trait EqualityComparer {
    fn equals(&self, a: &Value, b: &Value) -> Result<bool>;

    /// Must agree with `equals`: equal fingerprints iff equal values.
    fn fingerprint(&self, _v: &Value) -> Option<Fingerprint> {
        None
    }
}

pub type SharedEquality = Rc<dyn EqualityComparer>;

pub fn default_equality() -> SharedEquality {
    Rc::new(LooseEquality)
}

const TAG_NULL: u8 = 0;
const TAG_TRUE: u8 = 1;
const TAG_FALSE: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_ARRAY: u8 = 6;
const TAG_OBJECT: u8 = 7;
const TAG_FUNC: u8 = 8;
const TAG_KEY_INT: u8 = 9;
const TAG_KEY_STR: u8 = 10;

/// Cross-type equality: `2 == "2" == 2.0`, `true == 1`, `null == ""`.
///
/// Values are reduced to a canonical form (numbers collapse to one
/// representation, numeric strings become numbers) so the relation stays
/// transitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooseEquality;

impl LooseEquality {
    fn write(b: &mut FingerprintBuilder, v: &Value) {
        match v {
            Value::Null => {
                b.bytes(TAG_STR, b"");
            }
            Value::Bool(x) => write_number(b, Number::Int(*x as i64)),
            Value::Int(i) => write_number(b, Number::Int(*i)),
            Value::Float(f) => write_number(b, Number::Float(*f)),
            Value::Str(s) => match parse_numeric(s) {
                Some(n) => write_number(b, n),
                None => {
                    b.bytes(TAG_STR, s.as_bytes());
                }
            },
            Value::Array(a) => {
                b.u64(TAG_ARRAY, a.len() as u64);
                for (k, v) in a.iter() {
                    write_key(b, k);
                    Self::write(b, v);
                }
            }
            Value::Object(o) => {
                b.u64(TAG_OBJECT, Rc::as_ptr(o) as *const () as usize as u64);
            }
            Value::Func(f) => {
                b.u64(TAG_FUNC, f.addr() as u64);
            }
        }
    }
}

fn write_number(b: &mut FingerprintBuilder, n: Number) {
    match n {
        Number::Int(i) => {
            b.u64(TAG_INT, i as u64);
        }
        Number::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18 {
                b.u64(TAG_INT, (f as i64) as u64);
            } else if f.is_nan() {
                b.tag(TAG_FLOAT).tag(TAG_NULL);
            } else {
                b.u64(TAG_FLOAT, f.to_bits());
            }
        }
    }
}

fn write_key(b: &mut FingerprintBuilder, k: &Key) {
    match k {
        Key::Int(i) => {
            b.u64(TAG_KEY_INT, *i as u64);
        }
        Key::Str(s) => {
            b.bytes(TAG_KEY_STR, s.as_bytes());
        }
    }
}

impl EqualityComparer for LooseEquality {
    fn equals(&self, a: &Value, b: &Value) -> Result<bool> {
        Ok(self.fingerprint(a) == self.fingerprint(b))
    }

    fn fingerprint(&self, v: &Value) -> Option<Fingerprint> {
        let mut b = FingerprintBuilder::new();
        Self::write(&mut b, v);
        Some(b.finish())
    }
}

/// Same type and same value; objects and callables by identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictEquality;

impl StrictEquality {
    fn write(b: &mut FingerprintBuilder, v: &Value) {
        match v {
            Value::Null => {
                b.tag(TAG_NULL);
            }
            Value::Bool(true) => {
                b.tag(TAG_TRUE);
            }
            Value::Bool(false) => {
                b.tag(TAG_FALSE);
            }
            Value::Int(i) => {
                b.u64(TAG_INT, *i as u64);
            }
            Value::Float(f) => {
                // -0.0 and 0.0 are identical values
                let bits = if *f == 0.0 { 0 } else { f.to_bits() };
                b.u64(TAG_FLOAT, bits);
            }
            Value::Str(s) => {
                b.bytes(TAG_STR, s.as_bytes());
            }
            Value::Array(a) => {
                b.u64(TAG_ARRAY, a.len() as u64);
                for (k, v) in a.iter() {
                    write_key(b, k);
                    Self::write(b, v);
                }
            }
            Value::Object(o) => {
                b.u64(TAG_OBJECT, Rc::as_ptr(o) as *const () as usize as u64);
            }
            Value::Func(f) => {
                b.u64(TAG_FUNC, f.addr() as u64);
            }
        }
    }
}

impl EqualityComparer for StrictEquality {
    fn equals(&self, a: &Value, b: &Value) -> Result<bool> {
        Ok(self.fingerprint(a) == self.fingerprint(b))
    }

    fn fingerprint(&self, v: &Value) -> Option<Fingerprint> {
        let mut b = FingerprintBuilder::new();
        Self::write(&mut b, v);
        Some(b.finish())
    }
}

/// User-supplied two-argument comparer. Authoritative: no coercion applied.
#[derive(Debug, Clone)]
pub struct CustomEquality(pub Invocable);

impl EqualityComparer for CustomEquality {
    fn equals(&self, a: &Value, b: &Value) -> Result<bool> {
        Ok(self.0.call2(a, b)?.is_truthy())
    }
}

/// Set of values under a given equality.
pub struct EqualitySet {
    comparer: SharedEquality,
    hashed: HashMap<Fingerprint, Value>,
    linear: Vec<Value>,
}

impl EqualitySet {
    pub fn new(comparer: SharedEquality) -> Self {
        Self {
            comparer,
            hashed: HashMap::new(),
            linear: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.hashed.len() + self.linear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn linear_position(&self, v: &Value) -> Result<Option<usize>> {
        for (i, item) in self.linear.iter().enumerate() {
            if self.comparer.equals(item, v)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    pub fn contains(&self, v: &Value) -> Result<bool> {
        match self.comparer.fingerprint(v) {
            Some(fp) => Ok(self.hashed.contains_key(&fp)),
            None => Ok(self.linear_position(v)?.is_some()),
        }
    }

    /// Returns `true` when the value was not yet present.
    pub fn insert(&mut self, v: Value) -> Result<bool> {
        match self.comparer.fingerprint(&v) {
            Some(fp) => {
                if self.hashed.contains_key(&fp) {
                    return Ok(false);
                }
                self.hashed.insert(fp, v);
                Ok(true)
            }
            None => {
                if self.linear_position(&v)?.is_some() {
                    return Ok(false);
                }
                self.linear.push(v);
                Ok(true)
            }
        }
    }

    /// Returns `true` when a matching value was present.
    pub fn remove(&mut self, v: &Value) -> Result<bool> {
        match self.comparer.fingerprint(v) {
            Some(fp) => Ok(self.hashed.remove(&fp).is_some()),
            None => match self.linear_position(v)? {
                Some(i) => {
                    self.linear.remove(i);
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }
}

/// Maps keys (under an equality) to dense positions `0..n` in first-seen order.
pub struct KeyIndex {
    comparer: SharedEquality,
    hashed: HashMap<Fingerprint, usize>,
    keys: Vec<Value>,
}

impl KeyIndex {
    pub fn new(comparer: SharedEquality) -> Self {
        Self {
            comparer,
            hashed: HashMap::new(),
            keys: Vec::new(),
        }
    }

    pub fn comparer(&self) -> &SharedEquality {
        &self.comparer
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    pub fn position(&self, key: &Value) -> Result<Option<usize>> {
        if let Some(fp) = self.comparer.fingerprint(key) {
            return Ok(self.hashed.get(&fp).copied());
        }
        for (i, k) in self.keys.iter().enumerate() {
            if self.comparer.equals(k, key)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Position of `key`, inserting it at the end if new. The flag tells
    /// whether an insertion happened.
    pub fn insert(&mut self, key: Value) -> Result<(usize, bool)> {
        if let Some(pos) = self.position(&key)? {
            return Ok((pos, false));
        }
        let pos = self.keys.len();
        if let Some(fp) = self.comparer.fingerprint(&key) {
            self.hashed.insert(fp, pos);
        }
        self.keys.push(key);
        Ok((pos, true))
    }

    /// Remove the key at `pos`; later positions shift down by one.
    pub fn remove_at(&mut self, pos: usize) -> Value {
        let key = self.keys.remove(pos);
        self.hashed.clear();
        for (i, k) in self.keys.iter().enumerate() {
            if let Some(fp) = self.comparer.fingerprint(k) {
                self.hashed.insert(fp, i);
            }
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_equality_crosses_types() {
        let eq = LooseEquality;
        assert!(eq.equals(&Value::Int(2), &Value::from("2")).unwrap());
        assert!(eq.equals(&Value::Float(2.0), &Value::from("2")).unwrap());
        assert!(eq.equals(&Value::Bool(true), &Value::Int(1)).unwrap());
        assert!(eq.equals(&Value::Null, &Value::from("")).unwrap());
        assert!(!eq.equals(&Value::from("a"), &Value::from("A")).unwrap());
        assert!(!eq.equals(&Value::Int(2), &Value::Float(2.5)).unwrap());
    }

    #[test]
    fn test_strict_equality_keeps_types() {
        let eq = StrictEquality;
        assert!(!eq.equals(&Value::Int(2), &Value::from("2")).unwrap());
        assert!(eq.equals(&Value::Float(0.0), &Value::Float(-0.0)).unwrap());
        assert!(eq
            .equals(&Value::list(vec![1, 2]), &Value::list(vec![1, 2]))
            .unwrap());
    }

    #[test]
    fn test_custom_equality_set_is_linear() {
        let ci = Invocable::binary("ci", |a, b| {
            Ok(Value::Bool(
                a.to_display_string()?.to_lowercase() == b.to_display_string()?.to_lowercase(),
            ))
        });
        let mut set = EqualitySet::new(Rc::new(CustomEquality(ci)));
        assert!(set.insert(Value::from("Apple")).unwrap());
        assert!(!set.insert(Value::from("APPLE")).unwrap());
        assert!(set.remove(&Value::from("apple")).unwrap());
        assert!(set.is_empty());
    }

    #[test]
    fn test_key_index_positions() {
        let mut idx = KeyIndex::new(default_equality());
        assert_eq!(idx.insert(Value::from("a")).unwrap(), (0, true));
        assert_eq!(idx.insert(Value::Int(1)).unwrap(), (1, true));
        assert_eq!(idx.insert(Value::from("1")).unwrap(), (1, false));
        idx.remove_at(0);
        assert_eq!(idx.position(&Value::Int(1)).unwrap(), Some(0));
    }
}

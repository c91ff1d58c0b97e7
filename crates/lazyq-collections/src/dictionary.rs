//! Insertion-ordered dictionary keyed under an equality comparer.

use std::any::Any;

use lazyq_core::{
    default_equality, Entry, EntryIter, Error, Invocable, KeyIndex, Object, QueryConfig, Result,
    SharedEquality, Value,
};

use crate::validate::{check_item, check_key, check_writable, describe};

#[derive(Clone)]
pub struct DictionaryOptions {
    pub comparer: SharedEquality,
    pub key_validator: Option<Invocable>,
    pub value_validator: Option<Invocable>,
    /// `add` of an existing key overwrites instead of failing.
    pub allow_overwrite: bool,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            comparer: default_equality(),
            key_validator: None,
            value_validator: None,
            allow_overwrite: false,
        }
    }
}

impl DictionaryOptions {
    pub fn from_config(cfg: &QueryConfig) -> Self {
        Self {
            allow_overwrite: cfg.allow_duplicate_keys,
            ..Self::default()
        }
    }

    pub fn with_comparer(mut self, comparer: SharedEquality) -> Self {
        self.comparer = comparer;
        self
    }

    pub fn with_key_validator(mut self, f: Invocable) -> Self {
        self.key_validator = Some(f);
        self
    }

    pub fn with_value_validator(mut self, f: Invocable) -> Self {
        self.value_validator = Some(f);
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }
}

pub struct Dictionary {
    index: KeyIndex,
    values: Vec<Value>,
    key_validator: Option<Invocable>,
    value_validator: Option<Invocable>,
    allow_overwrite: bool,
    read_only: bool,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::with_options(DictionaryOptions::default())
    }

    pub fn with_options(opts: DictionaryOptions) -> Self {
        Self {
            index: KeyIndex::new(opts.comparer),
            values: Vec::new(),
            key_validator: opts.key_validator,
            value_validator: opts.value_validator,
            allow_overwrite: opts.allow_overwrite,
            read_only: false,
        }
    }

    /// Freeze: every later mutation fails with `Unsupported`.
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validate(&self, key: &Value, value: &Value) -> Result<()> {
        check_writable(self.read_only, "dictionary")?;
        check_key(self.key_validator.as_ref(), key)?;
        check_item(self.value_validator.as_ref(), value)
    }

    /// Insert a new key. Fails with `AlreadyExists` for a key that is equal
    /// to an existing one, unless overwriting is allowed.
    pub fn add(&mut self, key: Value, value: Value) -> Result<()> {
        self.validate(&key, &value)?;
        if let Some(pos) = self.index.position(&key)? {
            if !self.allow_overwrite {
                return Err(Error::AlreadyExists(describe(&key)));
            }
            self.values[pos] = value;
            return Ok(());
        }
        self.index.insert(key)?;
        self.values.push(value);
        Ok(())
    }

    /// Insert or overwrite.
    pub fn set(&mut self, key: Value, value: Value) -> Result<()> {
        self.validate(&key, &value)?;
        let (pos, inserted) = self.index.insert(key)?;
        if inserted {
            self.values.push(value);
        } else {
            self.values[pos] = value;
        }
        Ok(())
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>> {
        Ok(self.index.position(key)?.map(|pos| &self.values[pos]))
    }

    pub fn contains_key(&self, key: &Value) -> Result<bool> {
        Ok(self.index.position(key)?.is_some())
    }

    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>> {
        check_writable(self.read_only, "dictionary")?;
        match self.index.position(key)? {
            Some(pos) => {
                self.index.remove_at(pos);
                Ok(Some(self.values.remove(pos)))
            }
            None => Ok(None),
        }
    }

    pub fn keys(&self) -> &[Value] {
        self.index.keys()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> + '_ {
        self.index.keys().iter().zip(self.values.iter())
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.iter()
            .map(|(k, v)| Entry::new(k.clone(), v.clone()))
            .collect()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Object for Dictionary {
    fn class_name(&self) -> &str {
        "Dictionary"
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(0),
            "offsetget" | "get" | "containskey" | "offsetexists" => Some(1),
            _ => None,
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        let arg = args.first().cloned().unwrap_or(Value::Null);
        match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Value::from(self.len())),
            "offsetget" | "get" => Ok(self.get(&arg)?.cloned().unwrap_or(Value::Null)),
            "containskey" | "offsetexists" => Ok(Value::Bool(self.contains_key(&arg)?)),
            _ => Err(Error::Evaluation(format!(
                "call to undefined method Dictionary::{}()",
                name
            ))),
        }
    }

    fn traverse(&self) -> Option<Result<EntryIter>> {
        Some(Ok(Box::new(self.entries().into_iter().map(Ok))))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyq_core::{ErrorKind, StrictEquality};
    use std::rc::Rc;

    #[test]
    fn test_add_rejects_duplicate_under_loose_equality() {
        let mut d = Dictionary::new();
        d.add(Value::Int(1), Value::from("a")).unwrap();
        let err = d.add(Value::from("1"), Value::from("b")).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(d.get(&Value::Int(1)).unwrap(), Some(&Value::from("a")));
    }

    #[test]
    fn test_strict_comparer_keeps_types_apart() {
        let mut d =
            Dictionary::with_options(DictionaryOptions::default().with_comparer(Rc::new(StrictEquality)));
        d.add(Value::Int(1), Value::from("a")).unwrap();
        d.add(Value::from("1"), Value::from("b")).unwrap();
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut d = Dictionary::with_options(DictionaryOptions::default().allow_overwrite(true));
        d.add(Value::from("x"), Value::Int(1)).unwrap();
        d.add(Value::from("y"), Value::Int(2)).unwrap();
        d.add(Value::from("x"), Value::Int(3)).unwrap();
        let pairs: Vec<(Value, Value)> = d.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![
                (Value::from("x"), Value::Int(3)),
                (Value::from("y"), Value::Int(2))
            ]
        );
    }

    #[test]
    fn test_config_allows_duplicate_keys() {
        let mut cfg = QueryConfig::default();
        let mut d = Dictionary::with_options(DictionaryOptions::from_config(&cfg));
        d.add(Value::Int(2), Value::from("bb")).unwrap();
        assert!(d.add(Value::Int(2), Value::from("cc")).is_err());

        cfg.allow_duplicate_keys = true;
        let mut d = Dictionary::with_options(DictionaryOptions::from_config(&cfg));
        d.add(Value::Int(2), Value::from("bb")).unwrap();
        d.add(Value::Int(2), Value::from("cc")).unwrap();
        assert_eq!(d.get(&Value::Int(2)).unwrap(), Some(&Value::from("cc")));
    }

    #[test]
    fn test_validators() {
        let only_strings = Invocable::unary("is_string", |v| Ok(Value::Bool(matches!(v, Value::Str(_)))));
        let positive = Invocable::unary("positive", |v| Ok(Value::Bool(v.to_f64()? > 0.0)));
        let mut d = Dictionary::with_options(
            DictionaryOptions::default()
                .with_key_validator(only_strings)
                .with_value_validator(positive),
        );
        assert!(matches!(
            d.add(Value::Int(1), Value::Int(1)),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            d.add(Value::from("a"), Value::Int(-1)),
            Err(Error::InvalidItem(_))
        ));
        assert!(d.is_empty());
    }

    #[test]
    fn test_remove_and_read_only() {
        let mut d = Dictionary::new();
        d.add(Value::from("a"), Value::Int(1)).unwrap();
        d.add(Value::from("b"), Value::Int(2)).unwrap();
        assert_eq!(d.remove(&Value::from("a")).unwrap(), Some(Value::Int(1)));
        assert_eq!(d.get(&Value::from("b")).unwrap(), Some(&Value::Int(2)));
        let mut frozen = d.into_read_only();
        assert!(matches!(
            frozen.set(Value::from("c"), Value::Int(3)),
            Err(Error::Unsupported(_))
        ));
    }
}

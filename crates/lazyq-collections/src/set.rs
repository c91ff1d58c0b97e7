//! Insertion-ordered set under an equality comparer.

use std::any::Any;

use lazyq_core::{
    default_equality, Entry, EntryIter, Error, Invocable, KeyIndex, Object, Result,
    SharedEquality, Value,
};

use crate::validate::{check_item, check_writable, describe};

#[derive(Clone)]
pub struct SetOptions {
    pub comparer: SharedEquality,
    pub item_validator: Option<Invocable>,
    /// Adding an existing item is a silent no-op instead of an error.
    pub skip_duplicates: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            comparer: default_equality(),
            item_validator: None,
            skip_duplicates: false,
        }
    }
}

impl SetOptions {
    pub fn with_comparer(mut self, comparer: SharedEquality) -> Self {
        self.comparer = comparer;
        self
    }

    pub fn with_item_validator(mut self, f: Invocable) -> Self {
        self.item_validator = Some(f);
        self
    }

    pub fn skip_duplicates(mut self, skip: bool) -> Self {
        self.skip_duplicates = skip;
        self
    }
}

pub struct Set {
    index: KeyIndex,
    validator: Option<Invocable>,
    skip_duplicates: bool,
    read_only: bool,
}

impl Set {
    pub fn new() -> Self {
        Self::with_options(SetOptions::default())
    }

    pub fn with_options(opts: SetOptions) -> Self {
        Self {
            index: KeyIndex::new(opts.comparer),
            validator: opts.item_validator,
            skip_duplicates: opts.skip_duplicates,
            read_only: false,
        }
    }

    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` when the item was added.
    pub fn add(&mut self, item: Value) -> Result<bool> {
        check_writable(self.read_only, "set")?;
        check_item(self.validator.as_ref(), &item)?;
        if self.index.position(&item)?.is_some() {
            if self.skip_duplicates {
                return Ok(false);
            }
            return Err(Error::AlreadyExists(describe(&item)));
        }
        self.index.insert(item)?;
        Ok(true)
    }

    pub fn remove(&mut self, item: &Value) -> Result<bool> {
        check_writable(self.read_only, "set")?;
        match self.index.position(item)? {
            Some(pos) => {
                self.index.remove_at(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn contains(&self, item: &Value) -> Result<bool> {
        Ok(self.index.position(item)?.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        self.index.keys().iter()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.iter()
            .enumerate()
            .map(|(i, v)| Entry::new(i, v.clone()))
            .collect()
    }
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Set {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Object for Set {
    fn class_name(&self) -> &str {
        "Set"
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(0),
            "contains" => Some(1),
            _ => None,
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Value::from(self.len())),
            "contains" => Ok(Value::Bool(
                self.contains(args.first().unwrap_or(&Value::Null))?,
            )),
            _ => Err(Error::Evaluation(format!(
                "call to undefined method Set::{}()",
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

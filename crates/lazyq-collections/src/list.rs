//! Growable list with optional item validation and pluggable equality for
//! searches.

use std::any::Any;

use lazyq_core::{
    default_equality, Entry, EntryIter, Error, Invocable, Object, Result, SharedEquality, Value,
};

use crate::validate::{check_item, check_writable};

#[derive(Clone)]
pub struct ListOptions {
    pub comparer: SharedEquality,
    pub item_validator: Option<Invocable>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            comparer: default_equality(),
            item_validator: None,
        }
    }
}

impl ListOptions {
    pub fn with_comparer(mut self, comparer: SharedEquality) -> Self {
        self.comparer = comparer;
        self
    }

    pub fn with_item_validator(mut self, f: Invocable) -> Self {
        self.item_validator = Some(f);
        self
    }
}

pub struct List {
    items: Vec<Value>,
    comparer: SharedEquality,
    validator: Option<Invocable>,
    read_only: bool,
}

impl List {
    pub fn new() -> Self {
        Self::with_options(ListOptions::default())
    }

    pub fn with_options(opts: ListOptions) -> Self {
        Self {
            items: Vec::new(),
            comparer: opts.comparer,
            validator: opts.item_validator,
            read_only: false,
        }
    }

    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: Value) -> Result<()> {
        check_writable(self.read_only, "list")?;
        check_item(self.validator.as_ref(), &item)?;
        self.items.push(item);
        Ok(())
    }

    pub fn insert(&mut self, index: usize, item: Value) -> Result<()> {
        check_writable(self.read_only, "list")?;
        if index > self.items.len() {
            return Err(Error::InvalidArgument(format!(
                "insert index {} out of range 0..={}",
                index,
                self.items.len()
            )));
        }
        check_item(self.validator.as_ref(), &item)?;
        self.items.insert(index, item);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn set(&mut self, index: usize, item: Value) -> Result<()> {
        check_writable(self.read_only, "list")?;
        check_item(self.validator.as_ref(), &item)?;
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(Error::NotFound(format!("list index {}", index))),
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Value> {
        check_writable(self.read_only, "list")?;
        if index >= self.items.len() {
            return Err(Error::NotFound(format!("list index {}", index)));
        }
        Ok(self.items.remove(index))
    }

    /// Remove the first item equal to `item`.
    pub fn remove(&mut self, item: &Value) -> Result<bool> {
        check_writable(self.read_only, "list")?;
        match self.index_of(item)? {
            Some(i) => {
                self.items.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn index_of(&self, item: &Value) -> Result<Option<usize>> {
        for (i, v) in self.items.iter().enumerate() {
            if self.comparer.equals(v, item)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    pub fn contains(&self, item: &Value) -> Result<bool> {
        Ok(self.index_of(item)?.is_some())
    }

    pub fn clear(&mut self) -> Result<()> {
        check_writable(self.read_only, "list")?;
        self.items.clear();
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| Entry::new(i, v.clone()))
            .collect()
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for List {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl Object for List {
    fn class_name(&self) -> &str {
        "List"
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(0),
            "offsetget" | "contains" | "indexof" => Some(1),
            _ => None,
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        let arg = args.first().cloned().unwrap_or(Value::Null);
        match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Value::from(self.len())),
            "offsetget" => {
                let i = arg.to_i64()?;
                Ok(usize::try_from(i)
                    .ok()
                    .and_then(|i| self.get(i).cloned())
                    .unwrap_or(Value::Null))
            }
            "contains" => Ok(Value::Bool(self.contains(&arg)?)),
            "indexof" => Ok(self
                .index_of(&arg)?
                .map(Value::from)
                .unwrap_or(Value::Int(-1))),
            _ => Err(Error::Evaluation(format!(
                "call to undefined method List::{}()",
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

    #[test]
    fn test_index_of_uses_loose_equality() {
        let mut l = List::new();
        l.push(Value::Int(1)).unwrap();
        l.push(Value::from("2")).unwrap();
        assert_eq!(l.index_of(&Value::Float(2.0)).unwrap(), Some(1));
        assert!(l.remove(&Value::Int(1)).unwrap());
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_validator_and_bounds() {
        let ints = Invocable::unary("is_int", |v| Ok(Value::Bool(matches!(v, Value::Int(_)))));
        let mut l = List::with_options(ListOptions::default().with_item_validator(ints));
        assert!(matches!(l.push(Value::from("x")), Err(Error::InvalidItem(_))));
        l.push(Value::Int(1)).unwrap();
        assert!(matches!(l.insert(5, Value::Int(2)), Err(Error::InvalidArgument(_))));
        assert!(matches!(l.remove_at(3), Err(Error::NotFound(_))));
    }
}

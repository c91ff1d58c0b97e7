//! Sort keys and the stable multi-key comparison.

use std::cmp::Ordering;

use lazyq_core::compare::compare_with;
use lazyq_core::{Entry, Invocable, Result, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// One level of an ordering chain.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub selector: Invocable,
    pub comparer: Option<Invocable>,
    pub direction: SortDirection,
}

/// A materialized element with its evaluated key chain.
struct Row {
    keys: Vec<Value>,
    entry: Entry,
}

/// Stable sort of `entries` by the key chain. Every key is evaluated once per
/// element before any comparison; the first comparer failure aborts the sort.
pub(crate) fn sort_entries(entries: Vec<Entry>, chain: &[SortKey]) -> Result<Vec<Entry>> {
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let keys = chain
            .iter()
            .map(|k| k.selector.call2(&entry.value, &entry.key))
            .collect::<Result<Vec<_>>>()?;
        rows.push(Row { keys, entry });
    }

    let mut failure = None;
    rows.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        for (i, k) in chain.iter().enumerate() {
            match compare_with(k.comparer.as_ref(), &a.keys[i], &b.keys[i]) {
                Ok(Ordering::Equal) => continue,
                Ok(ord) => return k.direction.apply(ord),
                Err(e) => {
                    failure = Some(e);
                    return Ordering::Equal;
                }
            }
        }
        Ordering::Equal
    });
    if let Some(e) = failure {
        return Err(e);
    }
    Ok(rows.into_iter().map(|r| r.entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(f: Invocable, direction: SortDirection) -> SortKey {
        SortKey {
            selector: f,
            comparer: None,
            direction,
        }
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let entries: Vec<Entry> = ["b1", "a1", "b2", "a2", "b3"]
            .iter()
            .enumerate()
            .map(|(i, s)| Entry::new(i, *s))
            .collect();
        let first_char = Invocable::unary("first", |v| {
            Ok(Value::from(&v.as_str().unwrap_or_default()[..1]))
        });
        let sorted = sort_entries(entries, &[key(first_char, SortDirection::Ascending)]).unwrap();
        let order: Vec<String> = sorted.iter().map(|e| e.value.to_string()).collect();
        assert_eq!(order, vec!["a1", "a2", "b1", "b2", "b3"]);
    }

    #[test]
    fn test_comparer_error_aborts() {
        let entries = vec![Entry::new(0, 1), Entry::new(1, 2)];
        let bad = SortKey {
            selector: Invocable::identity(),
            comparer: Some(Invocable::binary("bad", |_, _| Ok(Value::from("x")))),
            direction: SortDirection::Ascending,
        };
        assert!(sort_entries(entries, &[bad]).is_err());
    }
}

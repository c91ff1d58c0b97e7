//! Build/probe helpers shared by `join` and `group_join`.
//!
//! Build: the inner sequence is drained once into a `Lookup` keyed by the
//! inner key selector. Probe: outer elements stream through and look up
//! their key.

use std::rc::Rc;

use lazyq_core::{Entry, EntryIter, Invocable, Result, SharedEquality, Value};

use crate::enumerable::Enumerable;
use crate::lookup::Lookup;

pub(crate) struct JoinSpec {
    pub inner: Enumerable,
    pub outer_key: Invocable,
    pub inner_key: Invocable,
    pub result: Invocable,
    pub eq: SharedEquality,
}

pub(crate) fn build(spec: &JoinSpec) -> Result<Lookup> {
    Lookup::build(spec.inner.open()?, &spec.inner_key, None, Rc::clone(&spec.eq))
}

/// Inner equi-join: every matching (outer, inner) pair in outer order, then
/// inner order. Results are keyed `0..n`.
pub(crate) fn probe_inner(outer: EntryIter, table: Lookup, spec: &JoinSpec) -> EntryIter {
    let outer_key = spec.outer_key.clone();
    let result = spec.result.clone();
    let mut outer = outer;
    let mut pending: Option<(Entry, Rc<Vec<Value>>, usize)> = None;
    let mut produced = 0usize;
    Box::new(std::iter::from_fn(move || loop {
        if let Some((o, matches, pos)) = &mut pending {
            if let Some(m) = matches.get(*pos) {
                *pos += 1;
                let key = produced;
                produced += 1;
                return Some(
                    result
                        .call3(&o.value, m, &o.key)
                        .map(|v| Entry::new(key, v)),
                );
            }
        }
        pending = None;
        let o = match outer.next()? {
            Ok(o) => o,
            Err(e) => return Some(Err(e)),
        };
        let found = outer_key
            .call2(&o.value, &o.key)
            .and_then(|k| table.members(&k));
        match found {
            Ok(Some(matches)) => pending = Some((o, matches, 0)),
            Ok(None) => {}
            Err(e) => return Some(Err(e)),
        }
    }))
}

/// Grouped join: one result per outer element, with the (possibly empty)
/// matching inner elements passed as a sequence. Outer keys are kept.
pub(crate) fn probe_grouped(outer: EntryIter, table: Lookup, spec: &JoinSpec) -> EntryIter {
    let outer_key = spec.outer_key.clone();
    let result = spec.result.clone();
    Box::new(outer.map(move |r| {
        let o = r?;
        let k = outer_key.call2(&o.value, &o.key)?;
        let matches = match table.members(&k)? {
            Some(m) => Enumerable::from_shared(m),
            None => Enumerable::empty(),
        };
        let value = result.call3(&o.value, &Value::from(matches), &o.key)?;
        Ok(Entry { key: o.key, value })
    }))
}

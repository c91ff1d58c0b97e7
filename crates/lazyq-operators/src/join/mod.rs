//! `join` and `group_join` over an inner sequence.
//!
//! The inner side is drained and indexed on the first pull; the outer side
//! streams. Keys compare under `LooseEquality` unless a comparer is given.

mod hash;

use lazyq_core::{default_equality, Result, SharedEquality};

use crate::enumerable::{deferred, Enumerable};
use crate::resolve::{resolve, Callable, RESULT_ARITY, SELECTOR_ARITY};
use crate::set::custom_equality;

use hash::JoinSpec;

fn spec(
    inner: Enumerable,
    outer_key: Callable,
    inner_key: Callable,
    result: Callable,
    eq: SharedEquality,
) -> Result<JoinSpec> {
    Ok(JoinSpec {
        inner,
        outer_key: resolve(outer_key, SELECTOR_ARITY)?,
        inner_key: resolve(inner_key, SELECTOR_ARITY)?,
        result: resolve(result, RESULT_ARITY)?,
        eq,
    })
}

impl Enumerable {
    /// Inner equi-join. `result_selector(outer, inner, outer_key)` runs for
    /// every pair whose keys are equal; outer elements without a match
    /// produce nothing.
    pub fn join(
        &self,
        inner: impl Into<Enumerable>,
        outer_key_selector: impl Into<Callable>,
        inner_key_selector: impl Into<Callable>,
        result_selector: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let spec = spec(
            inner.into(),
            outer_key_selector.into(),
            inner_key_selector.into(),
            result_selector.into(),
            default_equality(),
        )?;
        Ok(self.run_join(spec, false))
    }

    pub fn join_with(
        &self,
        inner: impl Into<Enumerable>,
        outer_key_selector: impl Into<Callable>,
        inner_key_selector: impl Into<Callable>,
        result_selector: impl Into<Callable>,
        comparer: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let spec = spec(
            inner.into(),
            outer_key_selector.into(),
            inner_key_selector.into(),
            result_selector.into(),
            custom_equality(comparer)?,
        )?;
        Ok(self.run_join(spec, false))
    }

    /// One result per outer element: `result_selector(outer, matches,
    /// outer_key)` where `matches` is the sequence of equal-keyed inner
    /// elements, possibly empty.
    pub fn group_join(
        &self,
        inner: impl Into<Enumerable>,
        outer_key_selector: impl Into<Callable>,
        inner_key_selector: impl Into<Callable>,
        result_selector: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let spec = spec(
            inner.into(),
            outer_key_selector.into(),
            inner_key_selector.into(),
            result_selector.into(),
            default_equality(),
        )?;
        Ok(self.run_join(spec, true))
    }

    pub fn group_join_with(
        &self,
        inner: impl Into<Enumerable>,
        outer_key_selector: impl Into<Callable>,
        inner_key_selector: impl Into<Callable>,
        result_selector: impl Into<Callable>,
        comparer: impl Into<Callable>,
    ) -> Result<Enumerable> {
        let spec = spec(
            inner.into(),
            outer_key_selector.into(),
            inner_key_selector.into(),
            result_selector.into(),
            custom_equality(comparer)?,
        )?;
        Ok(self.run_join(spec, true))
    }

    fn run_join(&self, spec: JoinSpec, grouped: bool) -> Enumerable {
        let outer = self.clone();
        let resettable = outer.is_resettable() && spec.inner.is_resettable();
        let spec = std::rc::Rc::new(spec);
        Enumerable::from_fn(resettable, move || {
            let up = outer.open()?;
            let spec = std::rc::Rc::clone(&spec);
            Ok(deferred(move || {
                let table = hash::build(&spec)?;
                Ok(if grouped {
                    hash::probe_grouped(up, table, &spec)
                } else {
                    hash::probe_inner(up, table, &spec)
                })
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyq_core::Value;

    fn person(name: &str) -> Value {
        Value::record([("name", Value::from(name))])
    }

    fn pet(name: &str, owner: &str) -> Value {
        Value::record([("name", Value::from(name)), ("owner", Value::from(owner))])
    }

    fn people() -> Enumerable {
        Enumerable::from_values(vec![
            person("Magnus Hedlund"),
            person("Terry Adams"),
            person("Charlotte Weiss"),
            person("Arlene Huff"),
        ])
    }

    fn pets() -> Enumerable {
        Enumerable::from_values(vec![
            pet("Barley", "Terry Adams"),
            pet("Boots", "Terry Adams"),
            pet("Whiskers", "Charlotte Weiss"),
            pet("Daisy", "Magnus Hedlund"),
            pet("Fluffy", "Charlotte Weiss"),
            pet("Rex", "Magnus Hedlund"),
            pet("Spot", "Terry Adams"),
        ])
    }

    fn strings(e: &Enumerable) -> Vec<String> {
        e.open()
            .unwrap()
            .map(|r| r.unwrap().value.to_string())
            .collect()
    }

    #[test]
    fn test_inner_join_order() {
        let joined = people()
            .join(
                pets(),
                r#"$p => $p["name"]"#,
                r#"$q => $q["owner"]"#,
                r#"($p, $q) => $p["name"] . ":" . $q["name"]"#,
            )
            .unwrap();
        assert_eq!(
            strings(&joined),
            vec![
                "Magnus Hedlund:Daisy",
                "Magnus Hedlund:Rex",
                "Terry Adams:Barley",
                "Terry Adams:Boots",
                "Terry Adams:Spot",
                "Charlotte Weiss:Whiskers",
                "Charlotte Weiss:Fluffy",
            ]
        );
        let keys: Vec<Value> = joined.open().unwrap().map(|r| r.unwrap().key).collect();
        assert_eq!(keys.first(), Some(&Value::Int(0)));
        assert_eq!(keys.last(), Some(&Value::Int(6)));
    }

    #[test]
    fn test_group_join_keeps_owners_without_pets() {
        let joined = people()
            .group_join(
                pets(),
                r#"$p => $p["name"]"#,
                r#"$q => $q["owner"]"#,
                r#"($person, $pets) => "Owner: " . $person["name"] . "; Pets: " . $pets->select('$pet => $pet["name"]')->implode(", ")"#,
            )
            .unwrap();
        assert_eq!(
            strings(&joined),
            vec![
                "Owner: Magnus Hedlund; Pets: Daisy, Rex",
                "Owner: Terry Adams; Pets: Barley, Boots, Spot",
                "Owner: Charlotte Weiss; Pets: Whiskers, Fluffy",
                "Owner: Arlene Huff; Pets: ",
            ]
        );
    }

    #[test]
    fn test_join_with_comparer() {
        let left = Enumerable::from_values(vec!["A", "b"]);
        let right = Enumerable::from_values(vec!["a", "B", "c"]);
        let joined = left
            .join_with(
                right,
                "$x => $x",
                "$y => $y",
                "($x, $y) => $x . $y",
                "($a, $b) => strcasecmp($a, $b) == 0",
            )
            .unwrap();
        assert_eq!(strings(&joined), vec!["Aa", "bB"]);
    }

    #[test]
    fn test_inner_is_not_pulled_until_iteration() {
        let inner = Enumerable::from_iterator(vec![Value::Int(1)]);
        let joined = Enumerable::from_values(vec![1])
            .join(&inner, "$x => $x", "$y => $y", "($x, $y) => $x + $y")
            .unwrap();
        assert!(!joined.is_resettable());
        let out: Vec<Value> = joined.open().unwrap().map(|r| r.unwrap().value).collect();
        assert_eq!(out, vec![Value::Int(2)]);
    }
}

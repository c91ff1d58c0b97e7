//! Generator constructors: ranges, repetition, unfolding and splitting.
//!
//! All of these are resettable: every enumeration starts over.

use lazyq_core::{arith, Entry, EntryIter, Error, Invocable, Result, Value};

use crate::enumerable::Enumerable;
use crate::resolve::{resolve, Callable, SELECTOR_ARITY};

fn counter(start: i64, step: i64) -> impl Iterator<Item = i64> {
    std::iter::successors(Some(start), move |v| v.checked_add(step))
}

fn keyed(values: impl Iterator<Item = Value>) -> impl Iterator<Item = Result<Entry>> {
    values.enumerate().map(|(i, v)| Ok(Entry::new(i, v)))
}

impl Enumerable {
    /// `count` integers starting at `start`, `step` apart.
    pub fn range(start: i64, count: i64, step: i64) -> Enumerable {
        let count = count.max(0) as usize;
        Enumerable::from_fn(true, move || {
            Ok(Box::new(keyed(counter(start, step).take(count).map(Value::Int))))
        })
    }

    /// Integers from `start` towards `end` (exclusive). Direction follows the
    /// bounds; `step` must be positive.
    pub fn range_to(start: i64, end: i64, step: i64) -> Result<Enumerable> {
        if step <= 0 {
            return Err(Error::InvalidArgument(format!(
                "step must be positive, got {}",
                step
            )));
        }
        Ok(Enumerable::from_fn(true, move || {
            let it: Box<dyn Iterator<Item = i64>> = if start <= end {
                Box::new(counter(start, step).take_while(move |v| *v < end))
            } else {
                Box::new(counter(start, -step).take_while(move |v| *v > end))
            };
            Ok(Box::new(keyed(it.map(Value::Int))))
        }))
    }

    /// `count` integers counting down from `start`.
    pub fn range_down(start: i64, count: i64, step: i64) -> Enumerable {
        Enumerable::range(start, count, step.saturating_neg())
    }

    /// `value` repeated `count` times, or forever when `count` is `None`.
    pub fn repeat(value: impl Into<Value>, count: Option<usize>) -> Enumerable {
        let value = value.into();
        Enumerable::from_fn(true, move || {
            let it = std::iter::repeat(value.clone());
            let out: EntryIter = match count {
                Some(n) => Box::new(keyed(it.take(n))),
                None => Box::new(keyed(it)),
            };
            Ok(out)
        })
    }

    /// Unfold an infinite sequence. Each next value is `next_value(value, key)`
    /// and each next key `next_key(value, key)` or the previous key plus one.
    /// A null seed value is replaced by `next_value(null, seed_key)`.
    pub fn generate(
        next_value: impl Into<Callable>,
        seed_value: Value,
        next_key: Option<Callable>,
        seed_key: Value,
    ) -> Result<Enumerable> {
        let fv = resolve(next_value, SELECTOR_ARITY)?;
        let fk = match next_key {
            Some(c) => Some(resolve(c, SELECTOR_ARITY)?),
            None => None,
        };
        Ok(Enumerable::from_fn(true, move || {
            let fv = fv.clone();
            let fk = fk.clone();
            let mut state: Option<(Value, Value)> = None;
            let mut failed = false;
            let seed_value = seed_value.clone();
            let seed_key = seed_key.clone();
            Ok(Box::new(std::iter::from_fn(move || {
                if failed {
                    return None;
                }
                let step = match state.take() {
                    None => first_generated(&fv, fk.as_ref(), &seed_value, &seed_key),
                    Some((v, k)) => {
                        let nv = fv.call2(&v, &k);
                        let nk = match &fk {
                            Some(fk) => fk.call2(&v, &k),
                            None => arith::add(&k, &Value::Int(1)),
                        };
                        nv.and_then(|nv| Ok((nv, nk?)))
                    }
                };
                match step {
                    Ok((v, k)) => {
                        state = Some((v.clone(), k.clone()));
                        Some(Ok(Entry { key: k, value: v }))
                    }
                    Err(e) => {
                        failed = true;
                        Some(Err(e))
                    }
                }
            })))
        }))
    }

    /// `start, start + step, ...` without end.
    pub fn to_infinity(start: i64, step: i64) -> Enumerable {
        Enumerable::from_fn(true, move || {
            Ok(Box::new(keyed(counter(start, step).map(Value::Int))))
        })
    }

    /// `start, start - step, ...` without end.
    pub fn to_negative_infinity(start: i64, step: i64) -> Enumerable {
        Enumerable::to_infinity(start, step.saturating_neg())
    }

    /// Repeat `source` endlessly, keeping its keys. An empty source yields
    /// an empty sequence.
    pub fn cycle(source: &Enumerable) -> Enumerable {
        let source = source.clone();
        Enumerable::from_fn(true, move || {
            let source = source.clone();
            let mut current = None;
            let mut produced = false;
            Ok(Box::new(std::iter::from_fn(move || loop {
                if current.is_none() {
                    match source.open() {
                        Ok(it) => current = Some(it),
                        Err(e) => return Some(Err(e)),
                    }
                }
                match current.as_mut().and_then(|it| it.next()) {
                    Some(item) => {
                        produced = true;
                        return Some(item);
                    }
                    None if produced => {
                        produced = false;
                        current = None;
                    }
                    None => return None,
                }
            })))
        })
    }

    /// Pieces of `text` around `separator`, keyed `0..n`. An empty separator
    /// splits into characters.
    pub fn split(text: &str, separator: &str) -> Enumerable {
        if separator.is_empty() {
            return Enumerable::from_chars(text);
        }
        Enumerable::from_values(text.split(separator).map(Value::from).collect())
    }

    /// One element keyed 0.
    pub fn from_single(value: impl Into<Value>) -> Enumerable {
        Enumerable::from_values(vec![value.into()])
    }
}

fn first_generated(
    fv: &Invocable,
    fk: Option<&Invocable>,
    seed_value: &Value,
    seed_key: &Value,
) -> Result<(Value, Value)> {
    let key = match (seed_key, fk) {
        (Value::Null, Some(fk)) => fk.call2(seed_value, seed_key)?,
        (Value::Null, None) => Value::Int(0),
        (k, _) => k.clone(),
    };
    let value = match seed_value {
        Value::Null => fv.call2(seed_value, seed_key)?,
        v => v.clone(),
    };
    Ok((value, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(e: &Enumerable, n: usize) -> Vec<i64> {
        e.open()
            .unwrap()
            .take(n)
            .map(|r| r.unwrap().value.to_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_ranges() {
        assert_eq!(ints(&Enumerable::range(3, 4, 1), 10), vec![3, 4, 5, 6]);
        assert_eq!(ints(&Enumerable::range(0, 3, 5), 10), vec![0, 5, 10]);
        assert!(ints(&Enumerable::range(0, -2, 1), 10).is_empty());
        assert_eq!(ints(&Enumerable::range_to(1, 4, 1).unwrap(), 10), vec![1, 2, 3]);
        assert_eq!(ints(&Enumerable::range_to(4, 1, 1).unwrap(), 10), vec![4, 3, 2]);
        assert!(Enumerable::range_to(1, 4, 0).is_err());
        assert_eq!(ints(&Enumerable::range_down(5, 3, 2), 10), vec![5, 3, 1]);
    }

    #[test]
    fn test_infinite_generators_are_lazy() {
        assert_eq!(ints(&Enumerable::to_infinity(1, 2), 3), vec![1, 3, 5]);
        assert_eq!(ints(&Enumerable::to_negative_infinity(0, 1), 3), vec![0, -1, -2]);
        assert_eq!(ints(&Enumerable::repeat(7, None), 2), vec![7, 7]);
        assert_eq!(ints(&Enumerable::repeat(7, Some(1)), 5), vec![7]);
    }

    #[test]
    fn test_generate_fibonacci_style() {
        let powers = Enumerable::generate("$v => $v * 2", Value::Int(1), None, Value::Null).unwrap();
        assert_eq!(ints(&powers, 5), vec![1, 2, 4, 8, 16]);
        let keys: Vec<Value> = powers.open().unwrap().take(3).map(|r| r.unwrap().key).collect();
        assert_eq!(keys, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_cycle() {
        let c = Enumerable::cycle(&Enumerable::from_values(vec![1, 2]));
        assert_eq!(ints(&c, 5), vec![1, 2, 1, 2, 1]);
        assert!(ints(&Enumerable::cycle(&Enumerable::empty()), 5).is_empty());
    }

    #[test]
    fn test_split() {
        let parts: Vec<Value> = Enumerable::split("a,b,,c", ",")
            .open()
            .unwrap()
            .map(|r| r.unwrap().value)
            .collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[2], Value::from(""));
    }
}

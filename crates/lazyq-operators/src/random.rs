//! Random reordering.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::enumerable::{deferred, drain, Enumerable};

impl Enumerable {
    /// Elements in a random order, reshuffled on every enumeration. Keys
    /// travel with their elements.
    pub fn randomize(&self) -> Enumerable {
        self.pipe(|up| {
            Ok(deferred(move || {
                let mut items = drain(up)?;
                items.shuffle(&mut rand::thread_rng());
                Ok(Box::new(items.into_iter().map(Ok)))
            }))
        })
    }

    /// Like `randomize`, but every enumeration produces the same order for
    /// the same `seed` and input.
    pub fn randomize_seeded(&self, seed: u64) -> Enumerable {
        self.pipe(move |up| {
            Ok(deferred(move || {
                let mut items = drain(up)?;
                items.shuffle(&mut StdRng::seed_from_u64(seed));
                Ok(Box::new(items.into_iter().map(Ok)))
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyq_core::Value;

    fn sorted_ints(e: &Enumerable) -> Vec<i64> {
        let mut v: Vec<i64> = e
            .open()
            .unwrap()
            .map(|r| r.unwrap().value.to_i64().unwrap())
            .collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_randomize_is_a_permutation() {
        let e = Enumerable::range(0, 50, 1);
        assert_eq!(sorted_ints(&e.randomize()), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let e = Enumerable::range(0, 50, 1);
        let a: Vec<Value> = e.randomize_seeded(7).to_vec().unwrap();
        let b: Vec<Value> = e.randomize_seeded(7).to_vec().unwrap();
        assert_eq!(a, b);
        assert_eq!(sorted_ints(&e.randomize_seeded(7)), (0..50).collect::<Vec<_>>());
    }
}

//! Algebraic laws of the operators over random integer inputs.

use lazyq::{Enumerable, Value};
use proptest::prelude::*;

fn seq(v: &[i64]) -> Enumerable {
    Enumerable::from_values(v.to_vec())
}

fn ints(e: &Enumerable) -> Vec<i64> {
    e.to_vec()
        .unwrap()
        .iter()
        .map(|v| v.to_i64().unwrap())
        .collect()
}

proptest! {
    #[test]
    fn where_chains_like_conjunction(v in prop::collection::vec(-50i64..50, 0..40)) {
        let chained = seq(&v).where_("$x => $x % 2 == 0").unwrap().where_("$x => $x > 0").unwrap();
        let combined = seq(&v).where_("$x => $x % 2 == 0 && $x > 0").unwrap();
        prop_assert_eq!(ints(&chained), ints(&combined));
    }

    #[test]
    fn select_composes(v in prop::collection::vec(-1000i64..1000, 0..40)) {
        let twice = seq(&v).select("$x => $x + 1").unwrap().select("$x => $x * 3").unwrap();
        let once = seq(&v).select("$x => ($x + 1) * 3").unwrap();
        prop_assert_eq!(ints(&twice), ints(&once));
    }

    #[test]
    fn order_matches_stable_sort(v in prop::collection::vec(-20i64..20, 0..60)) {
        let mut expected = v.clone();
        expected.sort();
        prop_assert_eq!(ints(&seq(&v).order()), expected);
    }

    #[test]
    fn skip_take_partition(v in prop::collection::vec(any::<i64>(), 0..30), n in 0usize..35) {
        let mut rebuilt = ints(&seq(&v).take(n));
        rebuilt.extend(ints(&seq(&v).skip(n)));
        prop_assert_eq!(rebuilt, v);
    }

    #[test]
    fn distinct_keeps_first_occurrences(v in prop::collection::vec(0i64..10, 0..40)) {
        let mut expected: Vec<i64> = Vec::new();
        for x in &v {
            if !expected.contains(x) {
                expected.push(*x);
            }
        }
        prop_assert_eq!(ints(&seq(&v).distinct()), expected);
    }

    #[test]
    fn except_and_intersect_split_the_input(
        a in prop::collection::vec(0i64..15, 0..30),
        b in prop::collection::vec(0i64..15, 0..30),
    ) {
        let other: Vec<Value> = b.iter().copied().map(Value::Int).collect();
        let outside = ints(&seq(&a).except(other.clone()));
        let inside = ints(&seq(&a).intersect(other));
        let expected: Vec<i64> = a.iter().copied().filter(|x| !b.contains(x)).collect();
        prop_assert_eq!(&outside, &expected);
        prop_assert_eq!(
            ints(&seq(&outside).distinct()).len() + inside.len(),
            ints(&seq(&a).distinct()).len()
        );
        prop_assert!(inside.iter().all(|x| b.contains(x)));
    }

    #[test]
    fn reverse_twice_is_identity(v in prop::collection::vec(any::<i64>(), 0..30)) {
        prop_assert_eq!(ints(&seq(&v).reverse().reverse()), v);
    }

    #[test]
    fn count_and_sum_agree_with_std(v in prop::collection::vec(-1000i64..1000, 0..50)) {
        prop_assert_eq!(seq(&v).count().unwrap(), v.len());
        prop_assert_eq!(seq(&v).sum().unwrap(), Value::Int(v.iter().sum()));
    }
}

//! Terminal operators: folds, element access, conversions.

mod test_data_gen;

use lazyq::{Enumerable, Error, ErrorKind, Key, Value};
use test_data_gen::{ints, pets, strs, vals};

#[test]
fn test_aggregate_and_reduce() {
    let src = Enumerable::range(1, 36, 1);
    assert_eq!(src.aggregate("($a, $x) => $a + $x", 0).unwrap(), Value::Int(666));
    assert_eq!(src.reduce("($a, $x) => $a + $x").unwrap(), Value::Int(666));

    let empty = Enumerable::empty();
    assert_eq!(empty.aggregate("($a, $x) => $a + $x", 5).unwrap(), Value::Int(5));
    assert!(matches!(
        empty.reduce("($a, $x) => $a + $x"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_numeric_folds() {
    let src = Enumerable::from_values(vec![1, 2, 3, 4]);
    assert_eq!(src.sum().unwrap(), Value::Int(10));
    assert_eq!(src.product().unwrap(), Value::Int(24));
    assert_eq!(src.average().unwrap(), Value::Float(2.5));
    assert_eq!(
        Enumerable::from_values(vec![2, 4]).average().unwrap(),
        Value::Int(3)
    );
    assert_eq!(src.min().unwrap(), Value::Int(1));
    assert_eq!(src.max().unwrap(), Value::Int(4));
    assert_eq!(src.sum_by("$x => $x * 10").unwrap(), Value::Int(100));
    assert!(Enumerable::empty().average().is_err());
}

#[test]
fn test_min_by_returns_element() {
    let shortest = pets().min_by(r#"$p => strlen($p["name"])"#).unwrap();
    assert_eq!(
        shortest.as_array().and_then(|a| a.get(&Key::from("name"))),
        Some(&Value::from("Rex"))
    );
    let longest = pets().max_by(r#"$p => strlen($p["name"])"#).unwrap();
    assert_eq!(
        longest.as_array().and_then(|a| a.get(&Key::from("name"))),
        Some(&Value::from("Whiskers"))
    );
}

#[test]
fn test_first_last_single() {
    let src = Enumerable::from_values(vec![5, 8, 13, 21]);
    assert_eq!(src.first().unwrap(), Value::Int(5));
    assert_eq!(src.last_where("$x => $x % 2 == 1").unwrap(), Value::Int(21));
    assert_eq!(src.single_where("$x => $x == 8").unwrap(), Value::Int(8));

    let err = src.single_where("$x => $x > 10").unwrap_err();
    assert!(matches!(err, Error::MultipleMatches));
    assert_eq!(err.kind(), ErrorKind::Enumeration);

    assert_eq!(
        src.first_or_default(Value::from("none"), Some("$x => $x > 100".into()))
            .unwrap(),
        Value::from("none")
    );
    assert!(src
        .single_or_default(Value::Null, Some("$x => $x > 10".into()))
        .is_err());
    assert!(matches!(Enumerable::empty().first(), Err(Error::NotFound(_))));
}

#[test]
fn test_element_at_is_positional() {
    let src = Enumerable::from_values(vec!["a", "b", "c"]).reverse();
    assert_eq!(src.element_at(0).unwrap(), Value::from("c"));
    assert!(matches!(src.element_at(3), Err(Error::NotFound(_))));
    assert_eq!(src.element_at_or_default(3, "z").unwrap(), Value::from("z"));
}

#[test]
fn test_index_of_returns_key() {
    let src = Enumerable::from_values(vec![10, 20, 30, 20]).where_("$x => $x >= 20").unwrap();
    assert_eq!(src.index_of(&Value::Int(20)).unwrap(), Some(Value::Int(1)));
    assert_eq!(src.last_index_of(&Value::Int(20)).unwrap(), Some(Value::Int(3)));
    assert_eq!(src.find_index("$x => $x > 25").unwrap(), Some(Value::Int(2)));
    assert_eq!(src.index_of(&Value::Int(99)).unwrap(), None);
}

#[test]
fn test_predicates() {
    let src = Enumerable::from_values(vec![2, 4, 6]);
    assert!(src.all("$x => $x % 2 == 0").unwrap());
    assert!(src.any().unwrap());
    assert!(!src.any_where("$x => $x > 6").unwrap());
    assert!(src.contains(&Value::from("4")).unwrap());
    assert!(Enumerable::empty().all("$x => false").unwrap());
    assert!(src.sequence_equal(vec![Value::Int(2), Value::Int(4), Value::Int(6)]).unwrap());
    assert!(!src.sequence_equal(vec![Value::Int(2), Value::Int(4)]).unwrap());
}

#[test]
fn test_to_array_overwrites_but_dictionary_rejects() {
    let src = Enumerable::from_values(vec![1, 2, 3])
        .concat(Enumerable::from_values(vec![9]));
    let arr = src.to_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr.get(&Key::Int(0)), Some(&Value::Int(9)));

    let err = src.to_dictionary().unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    assert!(src.values().to_dictionary().is_ok());
}

#[test]
fn test_json_output() {
    let list = Enumerable::from_values(vec![1, 2, 3]);
    assert_eq!(list.to_json().unwrap(), "[1,2,3]");

    let filtered = list.where_("$x => $x > 1").unwrap();
    assert_eq!(filtered.to_json().unwrap(), r#"{"1":2,"2":3}"#);

    let by_name = Enumerable::from_values(vec!["x", "y"])
        .to_json_with(Some("($v, $k) => $v".into()), false)
        .unwrap();
    assert_eq!(by_name, r#"{"x":"x","y":"y"}"#);
}

#[test]
fn test_implode_and_for_each() {
    let src = Enumerable::from_values(vec![3, 1, 4]);
    assert_eq!(src.implode(", ").unwrap(), "3, 1, 4");
    assert_eq!(src.implode_by("", "$x => $x * 2").unwrap(), "628");
    src.for_each("($v, $k) => $v").unwrap();
}

#[test]
fn test_seeded_randomize_is_a_permutation() {
    let src = Enumerable::range(0, 50, 1);
    let a = src.randomize_seeded(9);
    assert_eq!(vals(&a), vals(&a));
    let mut sorted = vals(&a);
    sorted.sort_by_key(|v| v.to_i64().unwrap());
    assert_eq!(sorted, vals(&src));
    assert_eq!(src.randomize().count().unwrap(), 50);
}

#[test]
fn test_default_if_empty() {
    let empty = Enumerable::empty().default_if_empty("fallback");
    assert_eq!(vals(&empty), strs(&["fallback"]));
    let full = Enumerable::from_values(vec![1]).default_if_empty(0);
    assert_eq!(vals(&full), ints(&[1]));
}

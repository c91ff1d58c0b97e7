//! Containers as query sinks and sources.

use std::rc::Rc;

use lazyq::core::StrictEquality;
use lazyq::{
    Dictionary, DictionaryOptions, Enumerable, Error, Invocable, List, ListOptions, Set,
    SetOptions, Value,
};

#[test]
fn test_dictionary_round_trip_through_query() {
    let dict = Enumerable::from_values(vec!["apple", "kiwi", "banana"])
        .to_dictionary_with(
            Some("$s => $s".into()),
            Some("$s => strlen($s)".into()),
            DictionaryOptions::default(),
        )
        .unwrap();
    assert_eq!(dict.get(&Value::from("kiwi")).unwrap(), Some(&Value::Int(4)));

    let long = Enumerable::from(&dict)
        .where_("$len => $len > 4")
        .unwrap()
        .keys()
        .to_vec()
        .unwrap();
    assert_eq!(long, vec![Value::from("apple"), Value::from("banana")]);
}

#[test]
fn test_dictionary_overwrite_option() {
    let src = Enumerable::from_values(vec!["a", "bb", "cc"]);
    let strict = src.to_dictionary_with(Some("$s => strlen($s)".into()), None, DictionaryOptions::default());
    assert!(matches!(strict, Err(Error::AlreadyExists(_))));

    let dict = src
        .to_dictionary_with(
            Some("$s => strlen($s)".into()),
            None,
            DictionaryOptions::default().allow_overwrite(true),
        )
        .unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get(&Value::Int(2)).unwrap(), Some(&Value::from("cc")));
}

#[test]
fn test_set_with_strict_comparer() {
    let src = Enumerable::from_values(vec![Value::Int(1), Value::from("1")]);
    assert!(matches!(src.to_set(), Err(Error::AlreadyExists(_))));

    let set = src
        .to_set_with(SetOptions::default().with_comparer(Rc::new(StrictEquality)))
        .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(Enumerable::from(&set).count().unwrap(), 2);
}

#[test]
fn test_list_validator_rejects_items() {
    let only_ints = Invocable::unary("is_int", |v| Ok(Value::Bool(matches!(v, Value::Int(_)))));
    let src = Enumerable::from_values(vec![Value::Int(1), Value::from("two")]);
    let err = src
        .to_list_with(ListOptions::default().with_item_validator(only_ints))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidItem(_)));

    let mut list = List::new();
    list.push(Value::Int(3)).unwrap();
    list.push(Value::Int(1)).unwrap();
    let sorted = Enumerable::from(&list).order().to_vec().unwrap();
    assert_eq!(sorted, vec![Value::Int(1), Value::Int(3)]);
}

#[test]
fn test_containers_travel_inside_values() {
    let mut set = Set::new();
    set.add(Value::from("x")).unwrap();
    let v = Value::object(set);
    assert_eq!(Enumerable::from_value(v).unwrap().count().unwrap(), 1);

    let mut dict = Dictionary::new();
    dict.add(Value::from("k"), Value::Int(1)).unwrap();
    let seq = Enumerable::from_value(Value::object(dict)).unwrap();
    assert_eq!(seq.keys().to_vec().unwrap(), vec![Value::from("k")]);
}

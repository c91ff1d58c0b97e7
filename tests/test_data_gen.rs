//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use lazyq::{Enumerable, Value};

pub const FRUITS: [&str; 8] = [
    "grape",
    "passionfruit",
    "banana",
    "mango",
    "orange",
    "raspberry",
    "apple",
    "blueberry",
];

pub fn person(name: &str) -> Value {
    Value::record([("name", Value::from(name))])
}

pub fn pet(name: &str, owner: &str) -> Value {
    Value::record([("name", Value::from(name)), ("owner", Value::from(owner))])
}

pub fn people() -> Enumerable {
    Enumerable::from_values(vec![
        person("Magnus Hedlund"),
        person("Terry Adams"),
        person("Charlotte Weiss"),
        person("Arlene Huff"),
    ])
}

pub fn pets() -> Enumerable {
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

/// Values of a full enumeration, panicking on the first error.
pub fn vals(e: &Enumerable) -> Vec<Value> {
    e.open()
        .expect("open")
        .map(|r| r.expect("element").value)
        .collect()
}

pub fn keys(e: &Enumerable) -> Vec<Value> {
    e.open()
        .expect("open")
        .map(|r| r.expect("element").key)
        .collect()
}

pub fn ints(v: &[i64]) -> Vec<Value> {
    v.iter().map(|i| Value::Int(*i)).collect()
}

pub fn strs(v: &[&str]) -> Vec<Value> {
    v.iter().map(|s| Value::from(*s)).collect()
}

/// Write `lines` into a fresh temp dir; the dir must outlive the path.
pub fn write_lines(name: &str, lines: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(name);
    fs::write(&path, lines.join("\n")).expect("write fixture");
    (dir, path)
}

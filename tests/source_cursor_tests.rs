//! Source ingestion and the move-next / current / key cursor contract.

mod test_data_gen;

use std::cell::Cell;
use std::rc::Rc;

use lazyq::{Cursor, CursorState, Enumerable, Error, Result, Value};
use test_data_gen::{ints, keys, strs, vals};

/// Counts down from `n`, keyed by letters.
struct Countdown {
    n: i64,
    current: Option<i64>,
    closed: Rc<Cell<bool>>,
}

impl Cursor for Countdown {
    fn move_next(&mut self) -> Result<bool> {
        let next = match self.current {
            None => self.n,
            Some(c) => c - 1,
        };
        if next <= 0 {
            return Ok(false);
        }
        self.current = Some(next);
        Ok(true)
    }

    fn current(&self) -> Result<Value> {
        self.current.map(Value::Int).ok_or(Error::NoCurrent)
    }

    fn key(&self) -> Result<Value> {
        let c = self.current.ok_or(Error::NoCurrent)?;
        Ok(Value::from(((b'a' + c as u8 - 1) as char).to_string()))
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

#[test]
fn test_external_cursor_source() {
    let closed = Rc::new(Cell::new(false));
    let seq = Enumerable::from_cursor(Countdown {
        n: 3,
        current: None,
        closed: Rc::clone(&closed),
    });
    assert!(!closed.get());
    let entries: Vec<(Value, Value)> = seq
        .open()
        .unwrap()
        .map(|r| r.map(|e| (e.key, e.value)).unwrap())
        .collect();
    assert_eq!(
        entries,
        vec![
            (Value::from("c"), Value::Int(3)),
            (Value::from("b"), Value::Int(2)),
            (Value::from("a"), Value::Int(1)),
        ]
    );
    assert!(closed.get());
}

#[test]
fn test_enumerator_state_machine() {
    let mut cursor = Enumerable::from_values(vec![10, 20]).enumerator();
    assert_eq!(cursor.state(), CursorState::Unstarted);
    assert!(matches!(cursor.current(), Err(Error::NoCurrent)));

    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.state(), CursorState::Iterating);
    assert_eq!(cursor.key().unwrap(), Value::Int(0));
    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), Value::Int(20));
    assert!(!cursor.move_next().unwrap());
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(matches!(cursor.current(), Err(Error::NoCurrent)));

    cursor.reset().unwrap();
    assert_eq!(cursor.state(), CursorState::Unstarted);
    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), Value::Int(10));
}

#[test]
fn test_generators() {
    let powers = Enumerable::generate("$x => $x * 2", Value::Int(1), None, Value::Int(0))
        .unwrap()
        .take(5);
    assert_eq!(vals(&powers), ints(&[1, 2, 4, 8, 16]));
    assert_eq!(keys(&powers), ints(&[0, 1, 2, 3, 4]));

    let fib = Enumerable::generate(
        "$pair => [$pair[1], $pair[0] + $pair[1]]",
        Value::list(vec![0, 1]),
        None,
        Value::Int(0),
    )
    .unwrap()
    .select("$pair => $pair[0]")
    .unwrap()
    .take(7);
    assert_eq!(vals(&fib), ints(&[0, 1, 1, 2, 3, 5, 8]));

    let cycled = Enumerable::cycle(&Enumerable::from_values(vec!["x", "y"])).take(5);
    assert_eq!(vals(&cycled), strs(&["x", "y", "x", "y", "x"]));
    assert!(vals(&Enumerable::cycle(&Enumerable::empty()).take(3)).is_empty());

    assert_eq!(vals(&Enumerable::range_to(5, 0, 2).unwrap()), ints(&[5, 3, 1]));
    assert!(matches!(
        Enumerable::range_to(0, 5, 0),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(vals(&Enumerable::repeat("z", Some(2))), strs(&["z", "z"]));
}

#[test]
fn test_factory_source_replays() {
    let made = Rc::new(Cell::new(0));
    let counter = Rc::clone(&made);
    let seq = Enumerable::from_factory(move || {
        counter.set(counter.get() + 1);
        vec![Value::Int(1), Value::Int(2)]
    });
    assert_eq!(made.get(), 0);
    assert_eq!(seq.count().unwrap(), 2);
    assert_eq!(seq.sum().unwrap(), Value::Int(3));
    assert_eq!(made.get(), 2);
}

#[test]
fn test_errors_surface_at_the_failing_element() {
    let seq = Enumerable::from_values(vec![Value::Int(1), Value::from("x"), Value::Int(3)])
        .cast("int");
    let mut it = seq.open().unwrap();
    assert_eq!(it.next().unwrap().unwrap().value, Value::Int(1));
    assert!(matches!(
        it.next().unwrap(),
        Err(Error::Conversion { .. })
    ));
}

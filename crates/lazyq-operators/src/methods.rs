//! `Object` implementations so sequences, groupings and lookups can travel
//! inside a `Value` and be driven from lambda text
//! (`$pets->select('$p => $p["name"]')->implode(", ")`).
//!
//! Method names are matched case-insensitively with underscores ignored, so
//! `orderBy`, `order_by` and `ORDERBY` are the same method.

use std::any::Any;
use std::rc::Rc;

use lazyq_collections::DictionaryOptions;
use lazyq_core::{EntryIter, Error, Object, QueryConfig, Result, Value};

use crate::enumerable::Enumerable;
use crate::lookup::{Grouping, Lookup};
use crate::resolve::Callable;
use crate::sort::{OrderedEnumerable, SortDirection};

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Null)
}

fn callable(args: &[Value], i: usize) -> Option<Callable> {
    match args.get(i) {
        None | Some(Value::Null) => None,
        Some(v) => Some(Callable::Value(v.clone())),
    }
}

fn required(args: &[Value], i: usize, method: &str) -> Result<Callable> {
    callable(args, i).ok_or_else(|| {
        Error::InvalidArgument(format!("{}() expects a callable argument", method))
    })
}

fn sequence(args: &[Value], i: usize) -> Result<Enumerable> {
    Enumerable::from_value(arg(args, i))
}

fn count_arg(args: &[Value], i: usize) -> Result<usize> {
    let n = arg(args, i).to_i64()?;
    Ok(n.max(0) as usize)
}

fn separator(args: &[Value], i: usize) -> Result<String> {
    match args.get(i) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(v) => v.to_display_string(),
    }
}

fn opt_value(v: Option<Value>) -> Value {
    v.unwrap_or(Value::Null)
}

fn ordered(o: OrderedEnumerable) -> Value {
    Value::object(o)
}

/// Declared arity of the query methods reachable from lambda text.
fn sequence_method_arity(method: &str) -> Option<usize> {
    let arity = match method {
        "reverse" | "keys" | "values" | "distinct" | "order" | "orderdescending" | "average"
        | "toarray" | "toarraydeep" | "tolist" | "tojson" | "tovec" | "randomize" | "product"
        | "getiterator" => 0,
        "where" | "select" | "skip" | "take" | "skipwhile" | "takewhile" | "defaultifempty"
        | "groupby" | "tolookup" | "oftype" | "cast" | "count" | "sum" | "min" | "max"
        | "minby" | "maxby" | "all" | "any" | "contains" | "first" | "last" | "single"
        | "elementat" | "indexof" | "lastindexof" | "findindex" | "findlastindex" | "foreach"
        | "concat" | "distinctby" | "reduce" => 1,
        "selectmany" | "orderby" | "orderbydescending" | "union" | "except" | "intersect"
        | "zip" | "append" | "prepend" | "aggregate" | "implode" | "firstordefault"
        | "lastordefault" | "singleordefault" | "elementatordefault" | "sequenceequal"
        | "todictionary" => 2,
        "join" | "groupjoin" => 4,
        _ => return None,
    };
    Some(arity)
}

/// Run query method `method` (already normalized) against `seq`.
fn call_sequence_method(seq: &Enumerable, method: &str, args: &[Value]) -> Result<Value> {
    let a = |i| arg(args, i);
    let f = |i| required(args, i, method);
    Ok(match method {
        "where" => seq.where_(f(0)?)?.into(),
        "select" => seq.select(f(0)?)?.into(),
        "selectmany" => match callable(args, 1) {
            Some(r) => seq.select_many_with(f(0)?, r)?.into(),
            None => seq.select_many(f(0)?)?.into(),
        },
        "skip" => seq.skip(count_arg(args, 0)?).into(),
        "take" => seq.take(count_arg(args, 0)?).into(),
        "skipwhile" => seq.skip_while(f(0)?)?.into(),
        "takewhile" => seq.take_while(f(0)?)?.into(),
        "defaultifempty" => seq.default_if_empty(a(0)).into(),
        "reverse" => seq.reverse().into(),
        "keys" => seq.keys().into(),
        "values" => seq.values().into(),
        "concat" => seq.concat(sequence(args, 0)?).into(),
        "append" => seq.append(a(0), args.get(1).cloned()).into(),
        "prepend" => seq.prepend(a(0), args.get(1).cloned()).into(),
        "zip" => seq.zip(sequence(args, 0)?, f(1)?)?.into(),
        "oftype" => seq.of_type(&a(0).to_display_string()?).into(),
        "cast" => seq.cast(&a(0).to_display_string()?).into(),
        "distinct" => match callable(args, 0) {
            Some(c) => seq.distinct_with(c)?.into(),
            None => seq.distinct().into(),
        },
        "distinctby" => seq.distinct_by(f(0)?)?.into(),
        "union" => match callable(args, 1) {
            Some(c) => seq.union_with(sequence(args, 0)?, c)?.into(),
            None => seq.union(sequence(args, 0)?).into(),
        },
        "except" => match callable(args, 1) {
            Some(c) => seq.except_with(sequence(args, 0)?, c)?.into(),
            None => seq.except(sequence(args, 0)?).into(),
        },
        "intersect" => match callable(args, 1) {
            Some(c) => seq.intersect_with(sequence(args, 0)?, c)?.into(),
            None => seq.intersect(sequence(args, 0)?).into(),
        },
        "orderby" | "orderbydescending" => {
            let direction = SortDirection::from_descending(method == "orderbydescending");
            ordered(seq.order_by_with(f(0)?, callable(args, 1), direction)?)
        }
        "order" => ordered(seq.order()),
        "orderdescending" => ordered(seq.order_descending()),
        "join" => seq.join(sequence(args, 0)?, f(1)?, f(2)?, f(3)?)?.into(),
        "groupjoin" => seq.group_join(sequence(args, 0)?, f(1)?, f(2)?, f(3)?)?.into(),
        "groupby" => seq.group_by(f(0)?)?.into(),
        "tolookup" => Value::object(seq.to_lookup(f(0)?)?),
        "randomize" => seq.randomize().into(),
        "count" => match callable(args, 0) {
            Some(c) => Value::from(seq.count_where(c)?),
            None => Value::from(seq.count()?),
        },
        "sum" => match callable(args, 0) {
            Some(c) => seq.sum_by(c)?,
            None => seq.sum()?,
        },
        "product" => seq.product()?,
        "average" => seq.average()?,
        "min" => match callable(args, 0) {
            Some(c) => seq.select(c)?.min()?,
            None => seq.min()?,
        },
        "max" => match callable(args, 0) {
            Some(c) => seq.select(c)?.max()?,
            None => seq.max()?,
        },
        "minby" => seq.min_by(f(0)?)?,
        "maxby" => seq.max_by(f(0)?)?,
        "aggregate" => match args.len() {
            0 | 1 => seq.reduce(f(0)?)?,
            _ => seq.aggregate(f(0)?, a(1))?,
        },
        "reduce" => seq.reduce(f(0)?)?,
        "all" => Value::Bool(seq.all(f(0)?)?),
        "any" => match callable(args, 0) {
            Some(c) => Value::Bool(seq.any_where(c)?),
            None => Value::Bool(seq.any()?),
        },
        "contains" => Value::Bool(seq.contains(&a(0))?),
        "first" => match callable(args, 0) {
            Some(c) => seq.first_where(c)?,
            None => seq.first()?,
        },
        "last" => match callable(args, 0) {
            Some(c) => seq.last_where(c)?,
            None => seq.last()?,
        },
        "single" => match callable(args, 0) {
            Some(c) => seq.single_where(c)?,
            None => seq.single()?,
        },
        "firstordefault" => seq.first_or_default(a(0), callable(args, 1))?,
        "lastordefault" => seq.last_or_default(a(0), callable(args, 1))?,
        "singleordefault" => seq.single_or_default(a(0), callable(args, 1))?,
        "elementat" => seq.element_at(count_arg(args, 0)?)?,
        "elementatordefault" => seq.element_at_or_default(count_arg(args, 0)?, a(1))?,
        "indexof" => opt_value(seq.index_of(&a(0))?),
        "lastindexof" => opt_value(seq.last_index_of(&a(0))?),
        "findindex" => opt_value(seq.find_index(f(0)?)?),
        "findlastindex" => opt_value(seq.find_last_index(f(0)?)?),
        "sequenceequal" => match callable(args, 1) {
            Some(c) => Value::Bool(seq.sequence_equal_with(sequence(args, 0)?, c)?),
            None => Value::Bool(seq.sequence_equal(sequence(args, 0)?)?),
        },
        "implode" => match callable(args, 1) {
            Some(c) => Value::from(seq.implode_by(&separator(args, 0)?, c)?),
            None => Value::from(seq.implode(&separator(args, 0)?)?),
        },
        "toarray" => Value::Array(Rc::new(seq.to_array()?)),
        "toarraydeep" => Value::Array(Rc::new(seq.to_array_deep()?)),
        "tovec" => Value::list(seq.to_vec()?),
        "tolist" => Value::object(seq.to_list()?),
        "todictionary" => Value::object(seq.to_dictionary_with(
            callable(args, 0),
            callable(args, 1),
            DictionaryOptions::from_config(&QueryConfig::from_env()),
        )?),
        "tojson" => Value::from(seq.to_json()?),
        "foreach" => {
            seq.for_each(f(0)?)?;
            Value::Null
        }
        "getiterator" => seq.clone().into(),
        _ => {
            return Err(Error::Evaluation(format!(
                "call to undefined method Enumerable::{}()",
                method
            )))
        }
    })
}

impl Object for Enumerable {
    fn class_name(&self) -> &str {
        "Enumerable"
    }

    fn is_instance_of(&self, class: &str) -> bool {
        matches!(
            class.to_ascii_lowercase().as_str(),
            "enumerable" | "traversable" | "iteratoraggregate"
        )
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        sequence_method_arity(&normalize(name))
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        call_sequence_method(self, &normalize(name), args)
    }

    fn traverse(&self) -> Option<Result<EntryIter>> {
        Some(self.open())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Object for OrderedEnumerable {
    fn class_name(&self) -> &str {
        "OrderedEnumerable"
    }

    fn is_instance_of(&self, class: &str) -> bool {
        class.eq_ignore_ascii_case("orderedenumerable") || self.as_enumerable().is_instance_of(class)
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match normalize(name).as_str() {
            "thenby" | "thenbydescending" => Some(2),
            "thendescending" => Some(0),
            other => sequence_method_arity(other),
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        let method = normalize(name);
        match method.as_str() {
            "thenby" | "thenbydescending" => {
                let selector = required(args, 0, &method)?;
                let direction = SortDirection::from_descending(method == "thenbydescending");
                Ok(ordered(self.then_by_with(selector, callable(args, 1), direction)?))
            }
            "thendescending" => Ok(ordered(self.then_descending())),
            other => call_sequence_method(self.as_enumerable(), other, args),
        }
    }

    fn traverse(&self) -> Option<Result<EntryIter>> {
        Some(self.open())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Object for Grouping {
    fn class_name(&self) -> &str {
        "Grouping"
    }

    fn is_instance_of(&self, class: &str) -> bool {
        class.eq_ignore_ascii_case("grouping") || self.enumerable().is_instance_of(class)
    }

    fn property(&self, name: &str) -> Result<Value> {
        match name {
            "key" => Ok(self.key().clone()),
            _ => Err(Error::Evaluation(format!(
                "undefined property Grouping::${}",
                name
            ))),
        }
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match normalize(name).as_str() {
            "key" | "getkey" => Some(0),
            other => sequence_method_arity(other),
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match normalize(name).as_str() {
            "key" | "getkey" => Ok(self.key().clone()),
            other => call_sequence_method(&self.enumerable(), other, args),
        }
    }

    fn traverse(&self) -> Option<Result<EntryIter>> {
        Some(self.enumerable().open())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Object for Lookup {
    fn class_name(&self) -> &str {
        "Lookup"
    }

    fn method_arity(&self, name: &str) -> Option<usize> {
        match normalize(name).as_str() {
            "get" | "offsetget" | "containskey" | "offsetexists" => Some(1),
            "count" => Some(0),
            other => sequence_method_arity(other),
        }
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        let key = arg(args, 0);
        match normalize(name).as_str() {
            "get" | "offsetget" => Ok(self.get(&key)?.into()),
            "containskey" | "offsetexists" => Ok(Value::Bool(self.contains(&key)?)),
            "count" if args.is_empty() => Ok(Value::from(self.len())),
            other => call_sequence_method(&self.to_enumerable(), other, args),
        }
    }

    fn traverse(&self) -> Option<Result<EntryIter>> {
        Some(self.to_enumerable().open())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#![forbid(unsafe_code)]
//! lazyq-core: values, keys, equality and comparison strategies, invocables,
//! the function registry, configuration and fingerprint hashing.
//!
//! Design intent:
//! - No I/O and no iteration machinery here; sequences live in `lazyq-operators`.
//! - Host objects plug in through the `Object` capability trait so that higher
//!   crates (enumerables, groupings, containers) can travel inside a `Value`.

pub mod arith;
mod builtins;
pub mod compare;
pub mod config;
pub mod equality;
pub mod error;
pub mod hash;
pub mod invocable;
pub mod json;
pub mod object;
pub mod prelude;
pub mod registry;
pub mod value;

pub use config::QueryConfig;
pub use equality::{
    default_equality, CustomEquality, EqualityComparer, EqualitySet, KeyIndex, LooseEquality,
    SharedEquality, StrictEquality,
};
pub use error::{Error, ErrorKind, Result};
pub use hash::Fingerprint;
pub use invocable::Invocable;
pub use object::Object;
pub use registry::FunctionRegistry;
pub use value::{Array, Entry, EntryIter, Key, Number, Value};

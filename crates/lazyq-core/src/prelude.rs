//! Convenient re-exports for downstream crates.

pub use crate::compare::{compare_with, loose_compare};
pub use crate::config::QueryConfig;
pub use crate::equality::{
    default_equality, CustomEquality, EqualityComparer, LooseEquality, SharedEquality,
    StrictEquality,
};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::invocable::Invocable;
pub use crate::object::Object;
pub use crate::registry::FunctionRegistry;
pub use crate::value::{Array, Entry, EntryIter, Key, Value};

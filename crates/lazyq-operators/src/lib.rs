#![forbid(unsafe_code)]
//! lazyq-operators: lazy sequences and the query operators over them.
//!
//! Design intent:
//! - An `Enumerable` is a recipe, not a buffer. Building a chain runs no user
//!   code and reads no element; work starts on the first pull and happens once
//!   per enumeration.
//! - Callables (native `Invocable`s, lambda text, registry names, bound
//!   methods) are resolved when the operator is built, so malformed lambdas
//!   fail at construction rather than mid-iteration.
//! - Operators that need the whole upstream (sorting, grouping, joins,
//!   reverse, set filters) drain it on the first pull, not on `open`.
//! - Element errors travel through the stream as `Err` items.

mod dispose;
mod enumerable;
mod enumerator;
mod generate;
mod join;
mod lookup;
mod methods;
mod random;
pub mod resolve;
mod set;
mod sort;
mod terminal;
mod traits;
mod transform;
mod typing;

pub use dispose::{DisposeOptions, Disposed};
pub use enumerable::Enumerable;
pub use enumerator::{CursorState, Enumerator};
pub use lookup::{Grouping, Lookup};
pub use resolve::{
    register_function, register_static, resolve, try_resolve, Callable, Resolver,
    ACCUMULATOR_ARITY, ACTION_ARITY, COMPARER_ARITY, MANY_RESULT_ARITY, RESULT_ARITY,
    SELECTOR_ARITY,
};
pub use sort::{OrderedEnumerable, SortDirection, SortKey};
pub use traits::{Cursor, Source};
pub use typing::TypeName;

/// Shorthand for `Enumerable::from_value`, accepting anything convertible
/// into a `Value` (arrays, strings, containers, sequences, factories).
pub fn from(value: impl Into<lazyq_core::Value>) -> lazyq_core::Result<Enumerable> {
    Enumerable::from_value(value.into())
}

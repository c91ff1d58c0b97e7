#![forbid(unsafe_code)]
//! lazyq: deferred-execution queries over values, containers and generators.
//!
//! Design intent:
//! - Chains are built from `Enumerable` values; nothing runs until a consumer
//!   pulls the first element.
//! - Callables may be native closures (`Invocable`), lambda text
//!   (`"$x => $x * 2"`), registered function names or bound methods.
//! - This crate only re-exports; the layers live in `lazyq-core`,
//!   `lazyq-lambda`, `lazyq-collections`, `lazyq-operators` and
//!   `lazyq-pipeline`.
//!
//! ```ignore
//! use lazyq::prelude::*;
//!
//! let evens = Enumerable::range(1, 10, 1)
//!     .where_("$x => $x % 2 == 0")?
//!     .select("$x => $x * $x")?
//!     .to_vec()?;
//! ```

pub use lazyq_collections as collections;
pub use lazyq_core as core;
pub use lazyq_lambda as lambda;
pub use lazyq_operators as operators;
pub use lazyq_pipeline as pipeline;

pub use lazyq_collections::{Dictionary, DictionaryOptions, List, ListOptions, Set, SetOptions};
pub use lazyq_core::{
    Array, Entry, Error, ErrorKind, FunctionRegistry, Invocable, Key, Object, QueryConfig,
    Result, Value,
};
pub use lazyq_operators::{
    from, Callable, Cursor, CursorState, DisposeOptions, Enumerable, Enumerator, Grouping, Lookup,
    OrderedEnumerable, SortDirection, Source,
};

pub mod prelude {
    pub use lazyq_collections::{Dictionary, List, Set};
    pub use lazyq_core::prelude::*;
    pub use lazyq_operators::{
        from, Callable, Cursor, Enumerable, Enumerator, Grouping, Lookup, OrderedEnumerable,
        SortDirection, Source,
    };
}

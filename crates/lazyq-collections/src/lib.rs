#![forbid(unsafe_code)]
//! lazyq-collections: keyed containers used as both sources and sinks of
//! query chains.
//!
//! All three containers accept the same shapes the operators use: a
//! `SharedEquality` for key/item identity and `Invocable` validators that
//! return a truthy value for accepted input.

pub mod dictionary;
pub mod list;
pub mod set;
mod validate;

pub use dictionary::{Dictionary, DictionaryOptions};
pub use list::{List, ListOptions};
pub use set::{Set, SetOptions};

#![forbid(unsafe_code)]
//! lazyq-lambda: compiles arrow-lambda text (`$x => $x * 2`,
//! `($a, $b) => { return $a . $b; }`) into native `Invocable`s.
//!
//! The parser is self-contained; the only coupling to the rest of lazyq is
//! the `FunctionRegistry` used to resolve function calls and the `Object`
//! trait used for property and method access.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use error::ParseError;
pub use eval::{compile, into_invocable};
pub use parser::{find_arrow, looks_like_lambda, parse_lambda};

#![forbid(unsafe_code)]
//! lazyq-pipeline: linear query pipelines described in YAML.
//!
//! Design:
//! - `dsl::yaml` is the document model (source, steps, output) plus the
//!   structural checks that do not need to run anything.
//! - `build` turns a parsed document into an `Enumerable` chain. Building
//!   compiles every lambda, so `validate` can report bad expressions without
//!   reading the source.
//! - `explain` renders the chain as text.

pub mod build;
pub mod dsl;
pub mod error;
pub mod explain;

pub use build::{build_query, collect_output, execute, open_source, validate};
pub use dsl::yaml::{
    parse_yaml_pipeline, OutputDef, ParsedPipeline, Pipeline, PipelineConfig, SourceDef, Step,
};
pub use error::{PipelineError, Result};
pub use explain::explain;

//! YAML document model for linear query pipelines.
//!
//! Example:
//! ```yaml
//! config: { seed: 7, pretty: true }
//! source: { kind: values, values: [3, 1, 2] }
//! steps:
//!   - op: where
//!     predicate: "$x => $x > 1"
//!   - op: order_by
//!     selector: "$x => $x"
//!     descending: true
//! output: { kind: list }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use lazyq_core::QueryConfig;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    pub source: SourceDef,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub output: OutputDef,
}

/// Per-document overrides applied on top of `QueryConfig::from_env()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: Option<u64>,
    pub pretty: Option<bool>,
    pub allow_duplicate_keys: Option<bool>,
    pub lambda_cache_capacity: Option<usize>,
}

impl PipelineConfig {
    pub fn apply_to(&self, cfg: &mut QueryConfig) {
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        if let Some(pretty) = self.pretty {
            cfg.json_pretty = pretty;
        }
        if let Some(allow) = self.allow_duplicate_keys {
            cfg.allow_duplicate_keys = allow;
        }
        if let Some(capacity) = self.lambda_cache_capacity {
            cfg.lambda_cache_capacity = capacity;
        }
    }
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SourceDef {
    Values {
        values: Vec<Json>,
    },

    Range {
        start: i64,
        count: i64,
        #[serde(default = "one")]
        step: i64,
    },

    /// Inline text, one element per line unless a separator is given.
    Text {
        text: String,
        #[serde(default)]
        separator: Option<String>,
    },

    /// One element per line.
    File {
        path: PathBuf,
    },

    /// One element per line of the run's input.
    Stdin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Where {
        predicate: String,
    },

    Select {
        selector: String,
    },

    OrderBy {
        selector: String,
        #[serde(default)]
        descending: bool,
    },

    ThenBy {
        selector: String,
        #[serde(default)]
        descending: bool,
    },

    Distinct {
        #[serde(default)]
        selector: Option<String>,
    },

    Skip {
        count: usize,
    },

    Take {
        count: usize,
    },

    Reverse,

    /// Groups keyed by `selector`; `result` receives `(group, key)`.
    GroupBy {
        selector: String,
        #[serde(default)]
        result: Option<String>,
    },

    OfType {
        #[serde(rename = "type")]
        type_name: String,
    },

    Cast {
        #[serde(rename = "type")]
        type_name: String,
    },

    Randomize {
        #[serde(default)]
        seed: Option<u64>,
    },

    Concat {
        values: Vec<Json>,
    },

    Except {
        values: Vec<Json>,
    },

    Union {
        values: Vec<Json>,
    },

    Intersect {
        values: Vec<Json>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Where { .. } => "where",
            Step::Select { .. } => "select",
            Step::OrderBy { .. } => "order_by",
            Step::ThenBy { .. } => "then_by",
            Step::Distinct { .. } => "distinct",
            Step::Skip { .. } => "skip",
            Step::Take { .. } => "take",
            Step::Reverse => "reverse",
            Step::GroupBy { .. } => "group_by",
            Step::OfType { .. } => "of_type",
            Step::Cast { .. } => "cast",
            Step::Randomize { .. } => "randomize",
            Step::Concat { .. } => "concat",
            Step::Except { .. } => "except",
            Step::Union { .. } => "union",
            Step::Intersect { .. } => "intersect",
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(self, Step::OrderBy { .. } | Step::ThenBy { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutputDef {
    /// Values only, as a JSON array.
    #[default]
    List,
    /// Keys preserved: a JSON array for `0..n` keys, an object otherwise.
    Array,
    Count,
    Sum,
    Average,
    Min,
    Max,
    First,
    Last,
    /// Keyed by `key(value, key)` or the entry keys. Duplicate keys fail
    /// unless `allow_duplicate_keys` is set.
    Dictionary {
        #[serde(default)]
        key: Option<String>,
    },
    Implode {
        #[serde(default)]
        separator: String,
    },
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub pipeline: Pipeline,
    pub config: PipelineConfig,
}

impl ParsedPipeline {
    pub fn reads_stdin(&self) -> bool {
        matches!(self.pipeline.source, SourceDef::Stdin)
    }
}

/// Parse a YAML document and run the structural checks.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    check_steps(&doc.steps)?;
    if let SourceDef::Range { step, .. } = &doc.source {
        if *step <= 0 {
            return Err(PipelineError::Invalid(format!(
                "range step must be positive, got {}",
                step
            )));
        }
    }
    let config = doc.config.clone().unwrap_or_default();
    Ok(ParsedPipeline {
        pipeline: doc,
        config,
    })
}

fn check_steps(steps: &[Step]) -> Result<()> {
    let mut prev: Option<&Step> = None;
    for (i, step) in steps.iter().enumerate() {
        if let Step::ThenBy { .. } = step {
            if !prev.map(Step::is_ordering).unwrap_or(false) {
                return Err(PipelineError::Invalid(format!(
                    "step {} (then_by) must follow order_by or then_by",
                    i + 1
                )));
            }
        }
        prev = Some(step);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let parsed = parse_yaml_pipeline(
            r#"
config: { seed: 7, pretty: true }
source: { kind: values, values: [3, 1, 2] }
steps:
  - op: where
    predicate: "$x => $x > 1"
  - op: order_by
    selector: "$x => $x"
    descending: true
  - op: reverse
output: { kind: implode, separator: "," }
"#,
        )
        .unwrap();
        assert_eq!(parsed.config.seed, Some(7));
        assert_eq!(parsed.pipeline.steps.len(), 3);
        assert_eq!(parsed.pipeline.steps[2].name(), "reverse");
        assert_eq!(
            parsed.pipeline.output,
            OutputDef::Implode {
                separator: ",".into()
            }
        );
    }

    #[test]
    fn test_defaults() {
        let parsed = parse_yaml_pipeline("source: { kind: range, start: 1, count: 3 }").unwrap();
        assert!(parsed.pipeline.steps.is_empty());
        assert_eq!(parsed.pipeline.output, OutputDef::List);
        assert_eq!(parsed.config, PipelineConfig::default());
        assert!(matches!(
            parsed.pipeline.source,
            SourceDef::Range { step: 1, .. }
        ));
    }

    #[test]
    fn test_then_by_needs_ordering() {
        let err = parse_yaml_pipeline(
            r#"
source: { kind: values, values: [1] }
steps:
  - op: where
    predicate: "$x => true"
  - op: then_by
    selector: "$x => $x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Invalid(_)));
    }

    #[test]
    fn test_unknown_op_is_yaml_error() {
        let err = parse_yaml_pipeline(
            r#"
source: { kind: stdin }
steps:
  - op: explode
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Yaml(_)));
    }

    #[test]
    fn test_config_overrides() {
        let mut cfg = QueryConfig::default();
        PipelineConfig {
            seed: Some(3),
            pretty: Some(true),
            ..Default::default()
        }
        .apply_to(&mut cfg);
        assert_eq!(cfg.seed, Some(3));
        assert!(cfg.json_pretty);
        assert!(!cfg.allow_duplicate_keys);
    }
}

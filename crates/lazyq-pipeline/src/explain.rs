//! Human-readable rendering of a parsed pipeline.

use std::fmt::Write;

use crate::dsl::yaml::{OutputDef, ParsedPipeline, SourceDef, Step};

fn describe_source(source: &SourceDef) -> String {
    match source {
        SourceDef::Values { values } => format!("values ({} items)", values.len()),
        SourceDef::Range { start, count, step } => {
            format!("range start={} count={} step={}", start, count, step)
        }
        SourceDef::Text { text, separator } => match separator {
            Some(sep) => format!("text ({} bytes) split on {:?}", text.len(), sep),
            None => format!("text ({} bytes) by line", text.len()),
        },
        SourceDef::File { path } => format!("file {} by line", path.display()),
        SourceDef::Stdin => "stdin by line".to_string(),
    }
}

fn describe_step(step: &Step) -> String {
    let detail = match step {
        Step::Where { predicate } => predicate.clone(),
        Step::Select { selector } => selector.clone(),
        Step::OrderBy {
            selector,
            descending,
        }
        | Step::ThenBy {
            selector,
            descending,
        } => format!(
            "{} {}",
            selector,
            if *descending { "desc" } else { "asc" }
        ),
        Step::Distinct { selector } => selector.clone().unwrap_or_default(),
        Step::Skip { count } | Step::Take { count } => count.to_string(),
        Step::Reverse => String::new(),
        Step::GroupBy { selector, result } => match result {
            Some(r) => format!("{} -> {}", selector, r),
            None => selector.clone(),
        },
        Step::OfType { type_name } | Step::Cast { type_name } => type_name.clone(),
        Step::Randomize { seed } => seed.map(|s| format!("seed={}", s)).unwrap_or_default(),
        Step::Concat { values }
        | Step::Except { values }
        | Step::Union { values }
        | Step::Intersect { values } => format!("{} values", values.len()),
    };
    let materializes = matches!(
        step,
        Step::OrderBy { .. }
            | Step::ThenBy { .. }
            | Step::Reverse
            | Step::GroupBy { .. }
            | Step::Randomize { .. }
    );
    let mut line = step.name().to_string();
    if !detail.is_empty() {
        line.push(' ');
        line.push_str(&detail);
    }
    if materializes {
        line.push_str("  [buffers input]");
    }
    line
}

fn describe_output(output: &OutputDef) -> String {
    match output {
        OutputDef::List => "list".into(),
        OutputDef::Array => "array (keys kept)".into(),
        OutputDef::Count => "count".into(),
        OutputDef::Sum => "sum".into(),
        OutputDef::Average => "average".into(),
        OutputDef::Min => "min".into(),
        OutputDef::Max => "max".into(),
        OutputDef::First => "first".into(),
        OutputDef::Last => "last".into(),
        OutputDef::Dictionary { key: Some(key) } => format!("dictionary keyed by {}", key),
        OutputDef::Dictionary { key: None } => "dictionary".into(),
        OutputDef::Implode { separator } => format!("implode {:?}", separator),
    }
}

/// Render the source, step chain and output, one line each.
pub fn explain(parsed: &ParsedPipeline) -> String {
    let doc = &parsed.pipeline;
    let mut out = String::new();
    let _ = writeln!(out, "Query Pipeline");
    let _ = writeln!(out, "==============");
    let _ = writeln!(out);
    let _ = writeln!(out, "Source: {}", describe_source(&doc.source));
    if let Some(seed) = parsed.config.seed {
        let _ = writeln!(out, "Seed: {}", seed);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Steps:");
    if doc.steps.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (i, step) in doc.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, describe_step(step));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Output: {}", describe_output(&doc.output));
    out
}

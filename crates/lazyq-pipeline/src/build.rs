//! Turn a parsed pipeline into a lazy query chain and run it.

use std::fs;
use std::rc::Rc;

use serde_json::Value as Json;

use lazyq_collections::DictionaryOptions;
use lazyq_core::{QueryConfig, Value};
use lazyq_operators::{
    Callable, Enumerable, OrderedEnumerable, Resolver, SortDirection, RESULT_ARITY,
    SELECTOR_ARITY,
};

use crate::dsl::yaml::{OutputDef, ParsedPipeline, SourceDef, Step};
use crate::error::{PipelineError, Result};

/// The chain under construction. Ordering steps keep the ordered form so a
/// following `then_by` can refine it.
enum Stage {
    Plain(Enumerable),
    Ordered(OrderedEnumerable),
}

impl Stage {
    fn seq(&self) -> &Enumerable {
        match self {
            Stage::Plain(e) => e,
            Stage::Ordered(o) => o.as_enumerable(),
        }
    }
}

fn json_values(values: &[Json]) -> Enumerable {
    Enumerable::from_values(values.iter().cloned().map(Value::from).collect::<Vec<_>>())
}

fn lines(text: &str) -> Enumerable {
    Enumerable::from_values(text.lines().map(str::to_owned).collect::<Vec<_>>())
}

/// Build the source sequence. `input` feeds a `stdin` source.
pub fn open_source(source: &SourceDef, input: Option<&str>) -> Result<Enumerable> {
    Ok(match source {
        SourceDef::Values { values } => json_values(values),
        SourceDef::Range { start, count, step } => Enumerable::range(*start, *count, *step),
        SourceDef::Text { text, separator } => match separator {
            Some(sep) => Enumerable::split(text, sep),
            None => lines(text),
        },
        SourceDef::File { path } => lines(&fs::read_to_string(path)?),
        SourceDef::Stdin => match input {
            Some(text) => lines(text),
            None => {
                return Err(PipelineError::Invalid(
                    "stdin source needs input text".into(),
                ))
            }
        },
    })
}

/// Append every step to `source`. Lambdas are compiled here; nothing is read
/// from `source`.
pub fn build_query(source: Enumerable, steps: &[Step], cfg: &QueryConfig) -> Result<Enumerable> {
    let resolver = Resolver::new(cfg);
    let lambda = |text: &str, arity: usize| -> Result<Callable> {
        Ok(Callable::Native(resolver.resolve(&Callable::from(text), arity)?))
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(steps = steps.len(), "building pipeline");

    let mut stage = Stage::Plain(source);
    for step in steps {
        stage = match step {
            Step::OrderBy {
                selector,
                descending,
            } => Stage::Ordered(stage.seq().order_by_with(
                lambda(selector, SELECTOR_ARITY)?,
                None,
                SortDirection::from_descending(*descending),
            )?),
            Step::ThenBy {
                selector,
                descending,
            } => match &stage {
                Stage::Ordered(o) => Stage::Ordered(o.then_by_with(
                    lambda(selector, SELECTOR_ARITY)?,
                    None,
                    SortDirection::from_descending(*descending),
                )?),
                Stage::Plain(_) => {
                    return Err(PipelineError::Invalid(
                        "then_by must follow order_by or then_by".into(),
                    ))
                }
            },
            other => Stage::Plain(apply_step(stage.seq(), other, cfg, &lambda)?),
        };
    }
    Ok(match stage {
        Stage::Plain(e) => e,
        Stage::Ordered(o) => o.into_enumerable(),
    })
}

fn apply_step<F>(seq: &Enumerable, step: &Step, cfg: &QueryConfig, lambda: &F) -> Result<Enumerable>
where
    F: Fn(&str, usize) -> Result<Callable>,
{
    Ok(match step {
        Step::Where { predicate } => seq.where_(lambda(predicate, SELECTOR_ARITY)?)?,
        Step::Select { selector } => seq.select(lambda(selector, SELECTOR_ARITY)?)?,
        Step::Distinct { selector } => match selector {
            Some(s) => seq.distinct_by(lambda(s, SELECTOR_ARITY)?)?,
            None => seq.distinct(),
        },
        Step::Skip { count } => seq.skip(*count),
        Step::Take { count } => seq.take(*count),
        Step::Reverse => seq.reverse(),
        Step::GroupBy { selector, result } => {
            let result = match result {
                Some(r) => Some(lambda(r, RESULT_ARITY)?),
                None => None,
            };
            seq.group_by_with(lambda(selector, SELECTOR_ARITY)?, None, result, None)?
        }
        Step::OfType { type_name } => seq.of_type(type_name),
        Step::Cast { type_name } => seq.cast(type_name),
        Step::Randomize { seed } => match seed.or(cfg.seed) {
            Some(seed) => seq.randomize_seeded(seed),
            None => seq.randomize(),
        },
        Step::Concat { values } => seq.concat(json_values(values)),
        Step::Except { values } => seq.except(json_values(values)),
        Step::Union { values } => seq.union(json_values(values)),
        Step::Intersect { values } => seq.intersect(json_values(values)),
        Step::OrderBy { .. } | Step::ThenBy { .. } => {
            return Err(PipelineError::Invalid(format!(
                "{} is handled by the ordering stage",
                step.name()
            )))
        }
    })
}

/// Reduce the finished chain to the requested output value.
pub fn collect_output(seq: &Enumerable, output: &OutputDef, cfg: &QueryConfig) -> Result<Value> {
    Ok(match output {
        OutputDef::List => Value::list(seq.to_vec()?),
        OutputDef::Array => Value::Array(Rc::new(seq.to_array()?)),
        OutputDef::Count => Value::from(seq.count()?),
        OutputDef::Sum => seq.sum()?,
        OutputDef::Average => seq.average()?,
        OutputDef::Min => seq.min()?,
        OutputDef::Max => seq.max()?,
        OutputDef::First => seq.first()?,
        OutputDef::Last => seq.last()?,
        OutputDef::Dictionary { key } => Value::object(seq.to_dictionary_with(
            key.as_deref().map(Callable::from),
            None,
            DictionaryOptions::from_config(cfg),
        )?),
        OutputDef::Implode { separator } => Value::from(seq.implode(separator)?),
    })
}

/// Run a parsed pipeline end to end.
pub fn execute(parsed: &ParsedPipeline, cfg: &QueryConfig, input: Option<&str>) -> Result<Value> {
    let doc = &parsed.pipeline;
    let source = open_source(&doc.source, input)?;
    let query = build_query(source, &doc.steps, cfg)?;
    let out = collect_output(&query, &doc.output, cfg)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(output = ?doc.output, "pipeline finished");

    Ok(out)
}

/// Compile every step against an empty source without touching the real one.
pub fn validate(parsed: &ParsedPipeline, cfg: &QueryConfig) -> Result<()> {
    build_query(Enumerable::empty(), &parsed.pipeline.steps, cfg).map(|_| ())
}

//! YAML pipeline parsing, validation and execution.

mod test_data_gen;

use lazyq::pipeline::{execute, explain, parse_yaml_pipeline, validate, PipelineError};
use lazyq::{QueryConfig, Value};
use test_data_gen::write_lines;

fn run(yaml: &str) -> Result<Value, PipelineError> {
    let parsed = parse_yaml_pipeline(yaml)?;
    let mut cfg = QueryConfig::default();
    parsed.config.apply_to(&mut cfg);
    execute(&parsed, &cfg, None)
}

#[test]
fn test_parse_simple_pipeline() {
    let yaml = r#"
source: { kind: values, values: [3, 1, 2] }
steps:
  - op: where
    predicate: "$x => $x > 1"
  - op: order_by
    selector: "$x => $x"
    descending: true
output: { kind: list }
"#;
    let result = parse_yaml_pipeline(yaml);
    assert!(result.is_ok());
    let out = run(yaml).unwrap();
    assert_eq!(out.to_json_string(false).unwrap(), "[3,2]");
}

#[test]
fn test_parse_pipeline_with_unknown_step() {
    let yaml = r#"
source: { kind: values, values: [1] }
steps:
  - op: aggregate
    seed: 0
"#;
    assert!(matches!(
        parse_yaml_pipeline(yaml),
        Err(PipelineError::Yaml(_))
    ));
}

#[test]
fn test_missing_source_fails() {
    let yaml = r#"
steps:
  - op: reverse
"#;
    assert!(parse_yaml_pipeline(yaml).is_err());
}

#[test]
fn test_file_source_one_element_per_line() {
    let (_dir, path) = write_lines(
        "fruits.txt",
        &["grape", "passionfruit", "banana", "mango", "orange"],
    );
    let yaml = format!(
        r#"
source: {{ kind: file, path: "{}" }}
steps:
  - op: where
    predicate: "$s => strlen($s) > 5"
  - op: select
    selector: "$s => strlen($s)"
output: {{ kind: sum }}
"#,
        path.display()
    );
    assert_eq!(run(&yaml).unwrap(), Value::Int(24));
}

#[test]
fn test_missing_file_is_io_error() {
    let yaml = r#"
source: { kind: file, path: "/definitely/not/here.txt" }
"#;
    assert!(matches!(run(yaml), Err(PipelineError::Io(_))));
}

#[test]
fn test_array_output_keeps_keys() {
    let yaml = r#"
source: { kind: values, values: [5, 6, 7, 8] }
steps:
  - op: skip
    count: 2
output: { kind: array }
"#;
    let out = run(yaml).unwrap();
    assert_eq!(out.to_json_string(false).unwrap(), r#"{"2":7,"3":8}"#);
}

#[test]
fn test_group_by_output_as_array() {
    let yaml = r#"
source: { kind: values, values: ["ant", "bee", "ape"] }
steps:
  - op: group_by
    selector: "$s => substr($s, 0, 1)"
output: { kind: array }
"#;
    let out = run(yaml).unwrap();
    assert_eq!(
        out.to_json_string(false).unwrap(),
        r#"{"a":["ant","ape"],"b":["bee"]}"#
    );
}

#[test]
fn test_validate_and_explain() {
    let good = parse_yaml_pipeline(
        r#"
source: { kind: stdin }
steps:
  - op: distinct
  - op: take
    count: 3
output: { kind: implode, separator: "|" }
"#,
    )
    .unwrap();
    assert!(validate(&good, &QueryConfig::default()).is_ok());
    let text = explain(&good);
    assert!(text.contains("Source: stdin by line"));
    assert!(text.contains("  2. take 3"));
    assert!(text.contains("Output: implode \"|\""));

    let bad = parse_yaml_pipeline(
        r#"
source: { kind: stdin }
steps:
  - op: where
    predicate: "$x => $x >"
"#,
    )
    .unwrap();
    assert!(matches!(
        validate(&bad, &QueryConfig::default()),
        Err(PipelineError::Query(_))
    ));
}

#[test]
fn test_then_by_without_order_by_is_invalid() {
    let yaml = r#"
source: { kind: values, values: [1, 2] }
steps:
  - op: then_by
    selector: "$x => $x"
"#;
    assert!(matches!(
        parse_yaml_pipeline(yaml),
        Err(PipelineError::Invalid(_))
    ));
}

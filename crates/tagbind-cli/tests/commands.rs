use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tagbind_cli::commands::{BindOptions, build_request, parse_field, run_bind, run_canonical};
use tempfile::TempDir;

const QUERY_SHAPE: &str = r#"{
  "kind": "struct",
  "of": {
    "name": "Query",
    "fields": [
      {"name": "Page", "shape": {"kind": "int", "of": "size"}, "tag": "form:\"page,default=1\" json:\"page\""},
      {"name": "Tags", "shape": {"kind": "slice", "of": {"kind": "string"}}, "tag": "form:\"tag\" json:\"tags\""},
      {"name": "Name", "shape": {"kind": "string"}, "tag": "form:\"name\" json:\"name\" binding:\"required\""}
    ]
  }
}"#;

const TRACE_SHAPE: &str = r#"{
  "kind": "struct",
  "of": {
    "name": "Trace",
    "fields": [
      {"name": "RequestId", "shape": {"kind": "string"}, "tag": "header:\"x-request-id\" json:\"request_id\""}
    ]
  }
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn options(shape: PathBuf, binding: &str, fields: &[&str]) -> BindOptions {
    BindOptions {
        shape,
        binding: binding.to_string(),
        fields: fields.iter().map(ToString::to_string).collect(),
        body: None,
        config: None,
    }
}

#[test]
fn form_fields_bind_into_the_shape() {
    let dir = TempDir::new().expect("temp dir");
    let shape = write(&dir, "query.json", QUERY_SHAPE);
    let out = run_bind(&options(shape, "form", &["name=zoe", "tag=a", "tag=b", "page=3"]))
        .expect("bind");
    assert_eq!(out, json!({"page": 3, "tags": ["a", "b"], "name": "zoe"}));
}

#[test]
fn defaults_apply_and_validation_runs() {
    let dir = TempDir::new().expect("temp dir");
    let shape = write(&dir, "query.json", QUERY_SHAPE);

    let out = run_bind(&options(shape.clone(), "query", &["name=x"])).expect("bind");
    assert_eq!(out["page"], 1);

    let err = run_bind(&options(shape, "query", &[])).expect_err("name is required");
    let message = format!("{err:#}");
    assert!(message.starts_with("query binding failed"), "{message}");
    assert!(message.contains("failed on the 'required' tag"), "{message}");
}

#[test]
fn header_fields_are_canonicalized() {
    let dir = TempDir::new().expect("temp dir");
    let shape = write(&dir, "trace.json", TRACE_SHAPE);
    let out = run_bind(&options(shape, "header", &["x-REQUEST-id=abc"])).expect("bind");
    assert_eq!(out, json!({"request_id": "abc"}));
}

#[test]
fn json_body_respects_config() {
    let dir = TempDir::new().expect("temp dir");
    let shape = write(&dir, "query.json", QUERY_SHAPE);
    let body = write(&dir, "body.json", r#"{"name":"n","page":2,"extra":1}"#);

    let mut opts = options(shape, "json", &[]);
    opts.body = Some(body);
    let out = run_bind(&opts).expect("lenient decode");
    assert_eq!(out["name"], "n");
    assert_eq!(out["page"], 2);

    opts.config = Some(write(
        &dir,
        "strict.toml",
        "[decode]\ndisallow_unknown_fields = true\n",
    ));
    let err = run_bind(&opts).expect_err("unknown field");
    assert!(format!("{err:#}").contains(r#"unknown field "extra""#));

    opts.config = Some(write(&dir, "small.toml", "max_memory = 4\n"));
    let err = run_bind(&opts).expect_err("body too large");
    assert!(format!("{err:#}").contains("over the 4 byte limit"));
}

#[test]
fn json_binding_without_body_is_invalid() {
    let dir = TempDir::new().expect("temp dir");
    let shape = write(&dir, "query.json", QUERY_SHAPE);
    let err = run_bind(&options(shape, "json", &[])).expect_err("no body");
    assert_eq!(format!("{err:#}"), "json binding failed: invalid request");
}

#[test]
fn bad_inputs_are_reported() {
    let dir = TempDir::new().expect("temp dir");
    let shape = write(&dir, "query.json", QUERY_SHAPE);

    let err = run_bind(&options(shape.clone(), "cookie", &[])).expect_err("unknown binding");
    assert_eq!(err.to_string(), "unknown binding `cookie`");

    let err = run_bind(&options(shape, "form", &["novalue"])).expect_err("bad field");
    assert_eq!(err.to_string(), "field `novalue` is not KEY=VALUE");

    let broken = write(&dir, "broken.json", "{");
    let err = run_bind(&options(broken, "form", &[])).expect_err("bad shape");
    assert!(err.to_string().starts_with("parse shape file"));
}

#[test]
fn field_parsing_splits_at_first_equals() {
    assert_eq!(
        parse_field("q=a=b").expect("field"),
        ("q".to_string(), "a=b".to_string())
    );
    assert_eq!(
        parse_field("empty=").expect("field"),
        ("empty".to_string(), String::new())
    );
    assert!(parse_field("=v").is_err());
}

#[test]
fn requests_route_fields_by_binding() {
    let fields = vec![("id".to_string(), "7".to_string())];
    assert_eq!(build_request("uri", &fields, None).params.get("id"), Some("7"));
    assert_eq!(build_request("form", &fields, None).query.get("id"), Some("7"));
    assert_eq!(build_request("header", &fields, None).headers.get("Id"), Some("7"));
}

#[test]
fn canonical_keys() {
    assert_eq!(run_canonical("content-type"), "Content-Type");
    assert_eq!(run_canonical("x-forwarded-FOR"), "X-Forwarded-For");
    assert_eq!(run_canonical("bad key"), "bad key");
}

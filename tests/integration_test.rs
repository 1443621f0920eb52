use openapi_from_routes::{
    aggregator::{AutoDoc, AutoDocConfig},
    manifest::ManifestLoader,
    openapi_builder::SpecDocument,
    routes::HttpMethod,
    serializer::{serialize_json, serialize_yaml},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture and run one aggregation pass with the manifest's own configuration
fn document_for(name: &str) -> SpecDocument {
    let loaded = ManifestLoader::load_path(&fixture(name)).expect("Failed to load fixture");
    let config = loaded.app.apply(AutoDocConfig::new("Fixture"));
    AutoDoc::new(config).aggregate(&loaded.table)
}

fn operation_json(spec: &SpecDocument, path: &str, method: &str) -> Value {
    spec.to_dict().unwrap()["paths"][path][method].clone()
}

#[test]
fn test_math_add_operation() {
    let spec = document_for("math_app.yaml");

    assert_eq!(
        operation_json(&spec, "/math/add", "get"),
        json!({
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": {
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "value": {"type": "number", "description": "Float response field"}
                                },
                                "required": ["value"]
                            }
                        }
                    }
                }
            },
            "parameters": [{
                "name": "query",
                "in": "query",
                "schema": {
                    "type": "object",
                    "properties": {
                        "first_number": {"type": "number", "x-location": "query"},
                        "second_number": {"type": "number", "x-location": "query"}
                    },
                    "required": ["first_number", "second_number"]
                }
            }],
            "summary": "Add Endpoint",
            "description": "Adds two numbers together",
            "tags": [{"name": "Math"}]
        })
    );

    let path_item = &spec.paths()["/math/add"];
    assert_eq!(path_item.len(), 1);
}

#[test]
fn test_inferred_parameters_and_dict_response() {
    let spec = document_for("math_app.yaml");
    let op = operation_json(&spec, "/math/search", "get");

    assert_eq!(
        op["parameters"][0]["schema"],
        json!({
            "type": "object",
            "properties": {
                "foo": {"type": "array", "items": {"type": "integer"}},
                "bar": {"type": "object", "additionalProperties": {}}
            },
            "required": ["bar", "foo"]
        })
    );

    let content = &op["responses"]["200"]["content"];
    assert!(content["application/json"].is_object());
    assert!(content["text/plain"].is_null());
    assert_eq!(
        content["application/json"]["schema"]["properties"]["response"]["type"],
        json!("object")
    );
}

#[test]
fn test_tuple_response_and_path_conversion() {
    let spec = document_for("math_app.yaml");
    let op = operation_json(&spec, "/math/pair/{left}/{right}", "get");

    assert_eq!(op["tags"], json!([{"name": "Tuples"}]));
    assert_eq!(
        op["parameters"][0]["schema"]["properties"]["right"],
        json!({"type": "integer", "default": 0})
    );
    assert_eq!(op["parameters"][0]["schema"]["required"], json!(["left"]));
    assert_eq!(
        op["responses"]["200"]["content"]["text/plain"]["schema"]["properties"]["value"],
        json!({"type": "array", "items": {}, "description": "Tuple response field"})
    );

    // The POST handler carries no documentation
    assert!(spec
        .operation("/math/pair/{left}/{right}", HttpMethod::Post)
        .is_none());
}

#[test]
fn test_undocumented_resources_are_skipped() {
    let spec = document_for("math_app.yaml");

    assert!(!spec.paths().contains_key("/math/unlisted"));
    assert!(!spec.paths().contains_key("/math/secret"));
    assert_eq!(spec.operation_count(), 3);
    assert_eq!(spec.info().title, "Math App");
    assert_eq!(spec.info().version, "1.2.0");
    assert_eq!(spec.info().extra["description"], json!("Arithmetic over HTTP"));
}

#[test]
fn test_always_document_includes_bare_handlers() {
    let loaded = ManifestLoader::load_path(&fixture("math_app.yaml")).unwrap();
    let config = loaded.app.apply(AutoDocConfig::new("Fixture")).always_document(true);
    let spec = AutoDoc::new(config).aggregate(&loaded.table);

    assert_eq!(spec.operation_count(), 5);
    // Hidden handlers stay out even when bare handlers are documented
    assert!(!spec.paths().contains_key("/math/secret"));
    let bare = operation_json(&spec, "/math/unlisted", "get");
    assert_eq!(
        bare,
        json!({
            "parameters": [{"name": "query", "in": "query", "schema": {"type": "object", "properties": {}}}],
            "tags": [{"name": "Math"}]
        })
    );
}

#[test]
fn test_status_app_content_types() {
    let spec = document_for("status_app.json");
    let dict = spec.to_dict().unwrap();
    let status = &dict["paths"]["/status"];

    assert_eq!(dict["openapi"], json!("3.0.2"));
    assert!(status["get"]["responses"]["200"]["content"]["application/json"].is_object());
    assert!(status["post"]["responses"]["200"]["content"]["application/json"].is_object());
    assert!(status["put"]["responses"]["200"]["content"]["application/json"].is_object());
    // No return annotation, no response entry
    assert!(status["delete"]["responses"].is_null());
    assert!(status["head"].is_null());

    let by_code = &dict["paths"]["/status/{code}"]["get"];
    assert!(by_code["responses"]["200"]["content"]["text/plain"].is_object());
    assert_eq!(
        by_code["tags"],
        json!([{"name": "Codes", "description": "Status codes"}])
    );
    assert_eq!(
        by_code["parameters"][0]["schema"]["properties"]["verbose"],
        json!({"type": "boolean", "default": false})
    );
}

#[test]
fn test_explicit_parameter_locations() {
    let spec = document_for("status_app.json");
    let op = operation_json(&spec, "/status", "post");

    assert_eq!(
        op["parameters"][0]["schema"],
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "integer", "x-location": "form"},
                "json_text": {
                    "type": "string",
                    "description": "Text to store",
                    "default": "Hello",
                    "x-location": "json"
                }
            },
            "required": ["code"]
        })
    );
    // Operations fall back to the title when no default tag is configured
    assert_eq!(op["tags"], json!([{"name": "Status App"}]));
}

#[test]
fn test_aggregation_is_idempotent() {
    let loaded = ManifestLoader::load_path(&fixture("math_app.yaml")).unwrap();
    let auto_doc = AutoDoc::new(loaded.app.apply(AutoDocConfig::new("Fixture")));

    let first = auto_doc.aggregate(&loaded.table);
    let second = auto_doc.aggregate(&loaded.table);

    assert_eq!(first.to_dict().unwrap(), second.to_dict().unwrap());
    assert_eq!(first.to_yaml().unwrap(), second.to_yaml().unwrap());
}

#[test]
fn test_directory_of_manifests() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir(root.join("v1")).unwrap();
    std::fs::copy(fixture("math_app.yaml"), root.join("v1").join("math.yaml")).unwrap();
    std::fs::copy(fixture("status_app.json"), root.join("status.json")).unwrap();
    std::fs::write(root.join("notes.md"), "# not a manifest").unwrap();

    let loaded = ManifestLoader::load_path(root).unwrap();
    assert_eq!(loaded.files.len(), 2);
    assert!(loaded.warnings.is_empty());

    let spec = AutoDoc::new(loaded.app.apply(AutoDocConfig::new("Fixture"))).aggregate(&loaded.table);
    assert!(spec.paths().contains_key("/math/add"));
    assert!(spec.paths().contains_key("/status"));
}

#[test]
fn test_serialized_formats_agree() {
    let document = document_for("status_app.json").build();

    let yaml = serialize_yaml(&document).unwrap();
    let json_text = serialize_json(&document).unwrap();

    let from_yaml: Value = serde_yaml::from_str(&yaml).unwrap();
    let from_json: Value = serde_json::from_str(&json_text).unwrap();
    assert_eq!(from_yaml, from_json);
    assert!(yaml.contains("/status/{code}"));
}

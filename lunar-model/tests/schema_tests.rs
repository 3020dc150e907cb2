use lunar_model::{
    AttributeField, AttributeSchema, FieldType, LocalFileAttributes, ModelError, PostgresqlAttributes,
    to_camel_case, to_snake_case,
};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn field_of(err: ModelError) -> String {
    match err {
        ModelError::Validation { field, .. } => field,
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ── AttributeField constructors ──────────────────────────────────

#[test]
fn required_field() {
    let f = AttributeField::required("host", FieldType::Text);
    assert_eq!(f.name, "host");
    assert_eq!(f.field_type, FieldType::Text);
    assert!(f.required);
}

#[test]
fn optional_field() {
    let f = AttributeField::optional("port", FieldType::Integer);
    assert!(!f.required);
}

#[test]
fn required_fields_in_declaration_order() {
    let schema = PostgresqlAttributes::schema();
    let required: Vec<&str> = schema.required_fields().collect();
    assert_eq!(required, vec!["host", "database", "user", "password"]);
}

#[test]
fn local_file_requires_only_file_name() {
    let schema = LocalFileAttributes::schema();
    let required: Vec<&str> = schema.required_fields().collect();
    assert_eq!(required, vec!["file_name"]);
}

// ── Case conversion ──────────────────────────────────────────────

#[test]
fn snake_case_conversion() {
    assert_eq!(to_snake_case("fileName"), "file_name");
    assert_eq!(to_snake_case("file_name"), "file_name");
    assert_eq!(to_snake_case("host"), "host");
}

#[test]
fn camel_case_conversion() {
    assert_eq!(to_camel_case("file_name"), "fileName");
    assert_eq!(to_camel_case("connection_attributes"), "connectionAttributes");
    assert_eq!(to_camel_case("fileName"), "fileName");
}

// ── check ────────────────────────────────────────────────────────

#[test]
fn check_normalizes_camel_case_keys() {
    let schema = LocalFileAttributes::schema();
    let checked = schema
        .check("attrs", &object(json!({"fileName": "a.txt"})))
        .unwrap();
    assert_eq!(checked.get("file_name"), Some(&json!("a.txt")));
}

#[test]
fn check_reports_missing_required_field_path() {
    let schema = LocalFileAttributes::schema();
    let err = schema.check("attrs", &Map::new()).unwrap_err();
    assert_eq!(
        err,
        ModelError::Validation {
            field: "attrs.file_name".into(),
            expected: "text (required)".into(),
        }
    );
}

#[test]
fn check_reports_wrong_type_with_expected() {
    let schema = LocalFileAttributes::schema();
    let err = schema
        .check("attrs", &object(json!({"file_name": 42})))
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::Validation {
            field: "attrs.file_name".into(),
            expected: "text".into(),
        }
    );
}

#[test]
fn check_rejects_undeclared_attribute() {
    let schema = LocalFileAttributes::schema();
    let err = schema
        .check("attrs", &object(json!({"file_name": "a.txt", "host": "db"})))
        .unwrap_err();
    assert_eq!(field_of(err), "attrs.host");
}

#[test]
fn check_rejects_same_attribute_twice() {
    let schema = LocalFileAttributes::schema();
    let err = schema
        .check("attrs", &object(json!({"file_name": "a.txt", "fileName": "b.txt"})))
        .unwrap_err();
    assert!(matches!(err, ModelError::Validation { .. }));
}

#[test]
fn check_treats_null_as_absent() {
    let schema = PostgresqlAttributes::schema();
    let checked = schema
        .check(
            "attrs",
            &object(json!({
                "host": "localhost", "port": null, "database": "d", "user": "u", "password": "p"
            })),
        )
        .unwrap();
    assert!(!checked.contains_key("port"));
}

#[test]
fn integer_rejects_floats_and_strings() {
    let schema = AttributeSchema::new(vec![AttributeField::required("n", FieldType::Integer)]);
    assert!(schema.check("x", &object(json!({"n": 1.5}))).is_err());
    assert!(schema.check("x", &object(json!({"n": "1"}))).is_err());
    assert!(schema.check("x", &object(json!({"n": 1}))).is_ok());
}

#[test]
fn text_rejects_non_strings() {
    let schema = AttributeSchema::new(vec![AttributeField::required("host", FieldType::Text)]);
    assert!(schema.check("x", &object(json!({"host": "db"}))).is_ok());
    let err = schema.check("x", &object(json!({"host": true}))).unwrap_err();
    assert_eq!(
        err,
        ModelError::Validation {
            field: "x.host".into(),
            expected: "text".into(),
        }
    );
}

// ── Schema serde ─────────────────────────────────────────────────

#[test]
fn schema_serializes_snake_case_field_types() {
    let json = serde_json::to_value(LocalFileAttributes::schema()).unwrap();
    assert_eq!(json["fields"][0]["field_type"], "text");
    assert_eq!(json["fields"][0]["name"], "file_name");
}

#[test]
fn schema_json_roundtrip() {
    let schema = PostgresqlAttributes::schema();
    let json = serde_json::to_string(&schema).unwrap();
    let back: AttributeSchema = serde_json::from_str(&json).unwrap();
    assert_eq!(back, schema);
}

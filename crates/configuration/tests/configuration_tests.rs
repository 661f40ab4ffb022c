mod common;

use std::time::Duration;

use query_engine_configuration::error::{MakeRuntimeConfigurationError, ParseConfigurationError};
use query_engine_configuration::{
    make_runtime_configuration, parse_configuration, write_parsed_configuration,
    ParsedConfiguration,
};
use query_engine_sql::sql::string::PlaceholderStyle;
use serde_json::json;

#[tokio::test]
async fn parse_a_complete_configuration() {
    let dir = tempfile::tempdir().unwrap();
    common::write_configuration(dir.path(), &common::bookshop_configuration().to_string()).await;

    let parsed = parse_configuration(dir.path()).await.unwrap();
    assert_eq!(parsed.version, 1);
    assert_eq!(parsed.metadata.entities.0.len(), 2);
    assert_eq!(
        parsed.settings.translation.default_schema.as_deref(),
        Some("bookshop")
    );
    assert_eq!(
        parsed.settings.translation.placeholder,
        PlaceholderStyle::Numbered
    );
    // untouched settings keep their defaults
    assert_eq!(parsed.settings.translation.max_expand_depth, 5);

    let configuration = make_runtime_configuration(parsed).unwrap();
    assert_eq!(
        configuration.execution_settings.query_timeout(),
        Duration::from_secs(5)
    );
}

#[tokio::test]
async fn only_the_version_is_required() {
    let dir = tempfile::tempdir().unwrap();
    common::write_configuration(dir.path(), r#"{"version": 1}"#).await;

    let parsed = parse_configuration(dir.path()).await.unwrap();
    similar_asserts::assert_eq!(parsed, ParsedConfiguration::empty());
}

#[tokio::test]
async fn written_configuration_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("nested").join("config");
    let parsed: ParsedConfiguration =
        serde_json::from_value(common::bookshop_configuration()).unwrap();

    write_parsed_configuration(&parsed, &out_dir).await.unwrap();

    similar_asserts::assert_eq!(parse_configuration(&out_dir).await.unwrap(), parsed);
    assert!(out_dir.join("schema.json").exists());
}

#[tokio::test]
async fn written_schema_validates_the_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let parsed: ParsedConfiguration =
        serde_json::from_value(common::bookshop_configuration()).unwrap();
    write_parsed_configuration(&parsed, dir.path()).await.unwrap();

    let read = |name: &str| -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
    };
    let schema = jsonschema::JSONSchema::compile(&read("schema.json")).unwrap();

    assert!(schema.is_valid(&read("configuration.json")));
    assert!(!schema.is_valid(&json!({"metadata": {}})));
    assert!(!schema.is_valid(&json!({"version": "one"})));
}

#[tokio::test]
async fn newer_versions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    common::write_configuration(dir.path(), r#"{"version": 2, "somethingNew": true}"#).await;

    match parse_configuration(dir.path()).await {
        Err(ParseConfigurationError::UnsupportedVersion {
            version, expected, ..
        }) => {
            assert_eq!(version, 2);
            assert_eq!(expected, 1);
        }
        other => panic!("expected an unsupported version, got {other:?}"),
    }
}

#[tokio::test]
async fn the_version_tag_is_required() {
    let dir = tempfile::tempdir().unwrap();
    common::write_configuration(dir.path(), r#"{"metadata": {"entities": {}}}"#).await;

    assert!(matches!(
        parse_configuration(dir.path()).await,
        Err(ParseConfigurationError::DidNotFindExpectedVersionTag(file_path))
            if file_path.ends_with("configuration.json")
    ));
}

#[tokio::test]
async fn parse_errors_point_at_the_offending_line() {
    let dir = tempfile::tempdir().unwrap();
    common::write_configuration(dir.path(), "{\n  \"version\": 1,\n  oops\n}\n").await;

    match parse_configuration(dir.path()).await {
        Err(ParseConfigurationError::ParseError { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_metadata_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    common::write_configuration(
        dir.path(),
        r#"{"version": 1, "metadata": {"entities": {"Books": {"keys": ["ID"]}}}}"#,
    )
    .await;

    assert!(matches!(
        parse_configuration(dir.path()).await,
        Err(ParseConfigurationError::ParseError { .. })
    ));
}

#[tokio::test]
async fn a_missing_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();

    match parse_configuration(dir.path()).await {
        Err(ParseConfigurationError::IoErrorButStringified(message)) => {
            assert!(message.contains("configuration.json"));
        }
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

fn runtime(configuration: serde_json::Value) -> Result<(), MakeRuntimeConfigurationError> {
    let parsed: ParsedConfiguration = serde_json::from_value(configuration).unwrap();
    make_runtime_configuration(parsed).map(|_| ())
}

#[test]
fn associations_must_target_known_entities() {
    let mut configuration = common::bookshop_configuration();
    configuration["metadata"]["entities"]["Books"]["associations"]["author"]["target"] =
        json!("Writers");

    assert_eq!(
        runtime(configuration),
        Err(MakeRuntimeConfigurationError::UnknownAssociationTarget {
            entity: "Books".to_string(),
            association: "author".to_string(),
            target: "Writers".to_string(),
        })
    );
}

#[test]
fn foreign_keys_live_on_the_right_side() {
    let mut configuration = common::bookshop_configuration();
    configuration["metadata"]["entities"]["Authors"]["associations"]["books"]["managed"]
        ["foreignKey"] = json!("writer_ID");

    assert_eq!(
        runtime(configuration),
        Err(MakeRuntimeConfigurationError::UnknownColumn {
            entity: "Books".to_string(),
            column: "writer_ID".to_string(),
        })
    );
}

#[test]
fn keys_and_localized_columns_must_exist() {
    let mut configuration = common::bookshop_configuration();
    configuration["metadata"]["entities"]["Books"]["localized"] = json!(["subtitle"]);

    assert_eq!(
        runtime(configuration),
        Err(MakeRuntimeConfigurationError::UnknownColumn {
            entity: "Books".to_string(),
            column: "subtitle".to_string(),
        })
    );
}

#[test]
fn entities_without_columns_are_not_checked() {
    let configuration = json!({
        "version": 1,
        "metadata": {"entities": {"Archive": {"tableName": "ARCHIVE", "keys": ["ID"]}}}
    });
    assert_eq!(runtime(configuration), Ok(()));
}

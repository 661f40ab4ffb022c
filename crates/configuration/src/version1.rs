//! Version 1 of the configuration format.

use std::path::Path;

use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_execution::settings::ExecutionSettings;
use query_engine_metadata::metadata;
use query_engine_translation::translation::settings::TranslationSettings;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};

pub const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration as it is stored on disk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    #[serde(default)]
    pub metadata: metadata::Metadata,
    #[serde(default, skip_serializing_if = "Settings::is_default")]
    pub settings: Settings,
}

/// Everything which influences how statements are compiled and run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub translation: TranslationSettings,
    #[serde(default)]
    pub execution: ExecutionSettings,
}

impl Settings {
    fn is_default(&self) -> bool {
        *self == Settings::default()
    }
}

impl ParsedConfiguration {
    pub fn empty() -> Self {
        ParsedConfiguration {
            version: CURRENT_VERSION,
            metadata: metadata::Metadata::empty(),
            settings: Settings::default(),
        }
    }
}

/// The JSON schema of the current configuration format.
pub fn generate_latest_schema() -> RootSchema {
    schemars::schema_for!(ParsedConfiguration)
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parse_error = |error: serde_json::Error| ParseConfigurationError::ParseError {
        file_path: configuration_file.clone(),
        line: error.line(),
        column: error.column(),
        message: error.to_string(),
    };

    // check the version tag first, so that newer formats fail with a useful message
    let untyped: serde_json::Value =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;
    match untyped.get("version").and_then(serde_json::Value::as_u64) {
        None => {
            return Err(ParseConfigurationError::DidNotFindExpectedVersionTag(
                configuration_file.clone(),
            ))
        }
        Some(version) if version != u64::from(CURRENT_VERSION) => {
            return Err(ParseConfigurationError::UnsupportedVersion {
                file_path: configuration_file.clone(),
                version,
                expected: CURRENT_VERSION,
            })
        }
        Some(_) => {}
    }

    let parsed_config: ParsedConfiguration =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;

    tracing::debug!(
        entities = parsed_config.metadata.entities.0.len(),
        "parsed configuration"
    );
    Ok(parsed_config)
}

/// Write the parsed configuration and its JSON schema into a directory.
pub async fn write_parsed_configuration(
    parsed_config: &ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(parsed_config)? + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path =
        out_dir.as_ref().join(CONFIGURATION_JSONSCHEMA_FILENAME);

    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&generate_latest_schema())? + "\n",
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_every_section() {
        let schema = serde_json::to_value(generate_latest_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("version"));
        assert!(properties.contains_key("metadata"));
        assert!(properties.contains_key("settings"));
        assert_eq!(schema["required"], serde_json::json!(["version"]));
    }

    #[test]
    fn default_settings_are_not_written() {
        let written = serde_json::to_value(ParsedConfiguration::empty()).unwrap();
        similar_asserts::assert_eq!(
            written,
            serde_json::json!({"version": 1, "metadata": {"entities": {}}})
        );
    }
}

//! The runtime configuration.

use query_engine_execution::settings::ExecutionSettings;
use query_engine_metadata::metadata::{self, Cardinality, EntityInfo, JoinCondition};
use query_engine_translation::translation::settings::TranslationSettings;

use crate::error::MakeRuntimeConfigurationError;
use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to compile and run
/// statements at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which checks that the metadata hangs together so that
/// translation can rely on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub metadata: metadata::Metadata,
    pub translation_settings: TranslationSettings,
    pub execution_settings: ExecutionSettings,
}

/// Turn a parsed configuration into a runtime one.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    validate_metadata(&parsed_config.metadata)?;
    Ok(Configuration {
        metadata: parsed_config.metadata,
        translation_settings: parsed_config.settings.translation,
        execution_settings: parsed_config.settings.execution,
    })
}

/// Every column and entity the metadata refers to must exist.
/// Entities which declare no columns are not checked for columns.
fn validate_metadata(metadata: &metadata::Metadata) -> Result<(), MakeRuntimeConfigurationError> {
    for (entity_name, entity) in &metadata.entities.0 {
        for column in entity.keys.iter().chain(&entity.localized) {
            check_column(entity_name, entity, column)?;
        }

        for (association_name, association) in &entity.associations {
            let target = metadata.lookup_entity(&association.target).ok_or_else(|| {
                MakeRuntimeConfigurationError::UnknownAssociationTarget {
                    entity: entity_name.clone(),
                    association: association_name.clone(),
                    target: association.target.clone(),
                }
            })?;

            if let JoinCondition::Managed { foreign_key } = &association.condition {
                match association.cardinality {
                    Cardinality::ToOne => check_column(entity_name, entity, foreign_key)?,
                    Cardinality::ToMany => check_column(&association.target, target, foreign_key)?,
                }
            }
        }
    }
    Ok(())
}

fn check_column(
    entity_name: &str,
    entity: &EntityInfo,
    column: &str,
) -> Result<(), MakeRuntimeConfigurationError> {
    if entity.columns.is_empty() || entity.columns.contains_key(column) {
        Ok(())
    } else {
        Err(MakeRuntimeConfigurationError::UnknownColumn {
            entity: entity_name.to_string(),
            column: column.to_string(),
        })
    }
}

//! Metadata information regarding the entities, their columns and their associations.

use std::collections::BTreeMap;

use enum_iterator::Sequence;
use query_engine_models::Token;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Refers to the row on the referencing side of an unmanaged association.
pub const SELF_PLACEHOLDER: &str = "$self";

/// The column types entities can declare.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    Boolean,
    Integer,
    Integer64,
    Decimal,
    Double,
    String,
    LargeString,
    Date,
    Time,
    DateTime,
    Timestamp,
    Uuid,
    Binary,
}

impl ScalarType {
    /// The SQL type used in generated DDL.
    pub fn sql_type(self, length: Option<u32>) -> String {
        match self {
            ScalarType::Boolean => "BOOLEAN".to_string(),
            ScalarType::Integer => "INTEGER".to_string(),
            ScalarType::Integer64 => "BIGINT".to_string(),
            ScalarType::Decimal => "DECIMAL".to_string(),
            ScalarType::Double => "DOUBLE".to_string(),
            ScalarType::String => format!("NVARCHAR({})", length.unwrap_or(5000)),
            ScalarType::LargeString => "NCLOB".to_string(),
            ScalarType::Date => "DATE".to_string(),
            ScalarType::Time => "TIME".to_string(),
            ScalarType::DateTime => "SECONDDATE".to_string(),
            ScalarType::Timestamp => "TIMESTAMP".to_string(),
            ScalarType::Uuid => "NVARCHAR(36)".to_string(),
            ScalarType::Binary => format!("VARBINARY({})", length.unwrap_or(5000)),
        }
    }
}

/// Mapping from an entity name to its information.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesInfo(pub BTreeMap<String, EntityInfo>);

impl EntitiesInfo {
    pub fn empty() -> Self {
        EntitiesInfo(BTreeMap::new())
    }
}

/// Information about an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    /// The table backing the entity, possibly qualified with a schema and catalog.
    pub table_name: String,
    /// Primary key columns.
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnInfo>,
    #[serde(default)]
    pub associations: BTreeMap<String, Association>,
    /// Present if the entity is sliced in time.
    #[serde(default)]
    pub temporal: Option<TemporalDescriptor>,
    /// Columns with per-locale texts.
    #[serde(default)]
    pub localized: Vec<String>,
}

impl EntityInfo {
    /// An entity backed by a table, with nothing else known about it.
    pub fn new(table_name: &str) -> Self {
        EntityInfo {
            table_name: table_name.to_string(),
            keys: vec![],
            columns: BTreeMap::new(),
            associations: BTreeMap::new(),
            temporal: None,
            localized: vec![],
        }
    }

    pub fn lookup_association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }

    /// The key column, if the entity has exactly one.
    pub fn single_key(&self) -> Option<&str> {
        match self.keys.as_slice() {
            [key] => Some(key.as_str()),
            _ => None,
        }
    }

    /// Is this column one of the localized ones?
    pub fn is_localized(&self, column: &str) -> bool {
        self.localized.iter().any(|c| c == column)
    }
}

/// Can this column contain null values
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

/// Information about a database column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub r#type: ScalarType,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub nullable: Nullable,
}

/// A named relationship from one entity to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    /// The target entity.
    pub target: String,
    pub cardinality: Cardinality,
    #[serde(flatten)]
    pub condition: JoinCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// How the rows of an association are found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum JoinCondition {
    /// Through a foreign key column.
    /// For to-one associations it lives on the referencing entity and points at the target's key,
    /// for to-many associations it lives on the target and points at the referencing entity's key.
    #[serde(rename_all = "camelCase")]
    Managed { foreign_key: String },
    /// Through an explicit condition. References starting with `$self` or consisting of a single
    /// column refer to the referencing row, references starting with the association name refer
    /// to the target.
    Unmanaged { on: Vec<Token> },
}

/// The two columns bounding the half-open validity interval `[from, to)` of a time slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemporalDescriptor {
    pub from: String,
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_scalar_type_has_a_sql_type() {
        for scalar_type in enum_iterator::all::<ScalarType>() {
            assert!(
                !scalar_type.sql_type(None).is_empty(),
                "The type {scalar_type:?} has no SQL type."
            );
        }
    }

    #[test]
    fn test_associations_deserialize() {
        let entity: EntityInfo = serde_json::from_value(json!({
            "tableName": "BOOKS",
            "keys": ["ID"],
            "associations": {
                "author": {
                    "target": "Authors",
                    "cardinality": "toOne",
                    "managed": {"foreignKey": "AUTHOR_ID"}
                },
                "reviews": {
                    "target": "Reviews",
                    "cardinality": "toMany",
                    "unmanaged": {"on": [{"ref": ["reviews", "BOOK_ID"]}, "=", {"ref": ["$self", "ID"]}]}
                }
            },
            "temporal": {"from": "VALID_FROM", "to": "VALID_TO"}
        }))
        .unwrap();

        similar_asserts::assert_eq!(
            entity.lookup_association("author"),
            Some(&Association {
                target: "Authors".to_string(),
                cardinality: Cardinality::ToOne,
                condition: JoinCondition::Managed {
                    foreign_key: "AUTHOR_ID".to_string()
                },
            })
        );
        assert!(matches!(
            entity.lookup_association("reviews").map(|a| &a.condition),
            Some(JoinCondition::Unmanaged { on }) if on.len() == 3
        ));
        assert_eq!(entity.single_key(), Some("ID"));
        assert!(entity.temporal.is_some());
    }
}

//! Metadata information regarding the modelled entities and how they relate.

pub mod database;

// re-export without modules
pub use database::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata information.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    pub entities: EntitiesInfo,
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata {
            entities: EntitiesInfo::empty(),
        }
    }

    /// Lookup an entity by name.
    pub fn lookup_entity(&self, name: &str) -> Option<&EntityInfo> {
        self.entities.0.get(name)
    }
}

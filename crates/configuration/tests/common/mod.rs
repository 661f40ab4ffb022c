use std::path::Path;

use serde_json::json;

/// A small but complete configuration.
pub fn bookshop_configuration() -> serde_json::Value {
    json!({
        "version": 1,
        "metadata": {
            "entities": {
                "Books": {
                    "tableName": "BOOKS",
                    "keys": ["ID"],
                    "columns": {
                        "ID": { "name": "ID", "type": "integer", "nullable": "NonNullable" },
                        "title": { "name": "TITLE", "type": "string", "length": 111 },
                        "author_ID": { "name": "AUTHOR_ID", "type": "integer" }
                    },
                    "associations": {
                        "author": {
                            "target": "Authors",
                            "cardinality": "toOne",
                            "managed": { "foreignKey": "author_ID" }
                        }
                    },
                    "localized": ["title"]
                },
                "Authors": {
                    "tableName": "AUTHORS",
                    "keys": ["ID"],
                    "columns": {
                        "ID": { "name": "ID", "type": "integer", "nullable": "NonNullable" },
                        "name": { "name": "NAME", "type": "string" }
                    },
                    "associations": {
                        "books": {
                            "target": "Books",
                            "cardinality": "toMany",
                            "managed": { "foreignKey": "author_ID" }
                        }
                    }
                }
            }
        },
        "settings": {
            "translation": { "defaultSchema": "bookshop", "placeholder": "numbered" },
            "execution": { "queryTimeoutSeconds": 5 }
        }
    })
}

/// Write `configuration.json` into a directory.
pub async fn write_configuration(dir: &Path, contents: &str) {
    tokio::fs::write(dir.join("configuration.json"), contents)
        .await
        .unwrap();
}

//! Settings of query execution.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How statements are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSettings {
    /// How long a single statement may run before it is abandoned.
    #[serde(default = "default_query_timeout_seconds")]
    pub query_timeout_seconds: u64,
}

fn default_query_timeout_seconds() -> u64 {
    30
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        ExecutionSettings {
            query_timeout_seconds: default_query_timeout_seconds(),
        }
    }
}

impl ExecutionSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }
}

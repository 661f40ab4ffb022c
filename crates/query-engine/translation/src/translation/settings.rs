//! Settings which influence the generated SQL.

use query_engine_sql::sql::string::PlaceholderStyle;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How statements are translated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSettings {
    /// Catalog used for tables which do not name one.
    #[serde(default)]
    pub default_catalog: Option<String>,
    /// Schema used for tables which do not name one.
    #[serde(default)]
    pub default_schema: Option<String>,
    /// How deep expansions and path expressions may nest.
    #[serde(default = "default_max_expand_depth")]
    pub max_expand_depth: u32,
    /// Locale of the texts used when the session has none.
    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: String,
    /// SQL expression producing the locale of the current session.
    #[serde(default = "default_session_locale")]
    pub session_locale: String,
    #[serde(default)]
    pub placeholder: PlaceholderStyle,
}

fn default_max_expand_depth() -> u32 {
    5
}

fn default_fallback_locale() -> String {
    "en".to_string()
}

fn default_session_locale() -> String {
    "SESSION_CONTEXT('LOCALE')".to_string()
}

impl Default for TranslationSettings {
    fn default() -> Self {
        TranslationSettings {
            default_catalog: None,
            default_schema: None,
            max_expand_depth: default_max_expand_depth(),
            fallback_locale: default_fallback_locale(),
            session_locale: default_session_locale(),
            placeholder: PlaceholderStyle::default(),
        }
    }
}

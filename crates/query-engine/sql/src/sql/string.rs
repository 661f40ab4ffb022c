//! Type definitions of a low-level SQL string representation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::identifier;

/// How positional parameters are written in the SQL text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    QuestionMark,
    /// `$1`, `$2`, ...
    Numbered,
}

/// A SQL query text with its parameters, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    /// for internal use and tests only
    pub param_index: u64,
    pub placeholder: PlaceholderStyle,
}

impl Default for SQL {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Param {
    /// A string generated during translation, for example a like pattern.
    String(String),
    /// A literal value supplied by the caller.
    Value(serde_json::Value),
}

impl Param {
    /// The parameter as a json value, ready to be bound by a driver.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Param::String(s) => serde_json::Value::String(s.clone()),
            Param::Value(v) => v.clone(),
        }
    }
}

/// A DDL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DDL(pub SQL);

impl SQL {
    pub fn new() -> SQL {
        SQL::with_placeholder(PlaceholderStyle::default())
    }
    pub fn with_placeholder(placeholder: PlaceholderStyle) -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            param_index: 0,
            placeholder,
        }
    }
    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }
    /// Append an identifier, quoting it only if it needs to be.
    pub fn append_identifier(&mut self, sql: &str) {
        self.sql.push_str(&identifier::normalize(sql));
    }
    /// Append a string literal inline. Only for strings the translation itself produced.
    pub fn append_string_literal(&mut self, literal: &str) {
        self.sql.push('\'');
        self.sql.push_str(&literal.replace('\'', "''"));
        self.sql.push('\'');
    }
    pub fn append_param(&mut self, param: Param) {
        self.param_index += 1;
        match self.placeholder {
            PlaceholderStyle::QuestionMark => self.sql.push('?'),
            PlaceholderStyle::Numbered => self.sql.push_str(&format!("${}", self.param_index)),
        }
        self.params.push(param);
    }
}

//! Describe the output of translation: the SQL to run and how to reshape what it returns.

use indexmap::IndexMap;

use super::string::SQL;

/// A single result row, keyed by output column name in select list order.
pub type Row = IndexMap<String, serde_json::Value>;

/// Everything needed to run a translated SELECT and hand back nested results.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    /// The query itself.
    pub query: SQL,
    /// The total count of the query without pagination, when it was requested.
    pub count_query: Option<SQL>,
    /// How to turn flat rows back into the requested shape.
    pub expansions: ExpansionPlan,
}

/// Maps `(association path, leaf column)` to the flat alias the column was selected as.
///
/// Association paths of nested expansions are dotted, e.g. `author.publisher`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAliasMap(IndexMap<(String, String), String>);

impl ColumnAliasMap {
    pub fn new() -> Self {
        ColumnAliasMap(IndexMap::new())
    }

    /// Record that a leaf of an association was selected under an alias.
    pub fn insert(&mut self, association: &str, leaf: &str, alias: &str) {
        self.0.insert(
            (association.to_string(), leaf.to_string()),
            alias.to_string(),
        );
    }

    /// Look up the alias of a leaf.
    pub fn get(&self, association: &str, leaf: &str) -> Option<&str> {
        self.0
            .get(&(association.to_string(), leaf.to_string()))
            .map(String::as_str)
    }

    /// All `(leaf, alias)` pairs of an association, in the order they were selected.
    pub fn leaves<'a>(&'a self, association: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0
            .iter()
            .filter(move |((path, _), _)| path == association)
            .map(|((_, leaf), alias)| (leaf.as_str(), alias.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The expansions of a statement, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionPlan {
    pub expansions: Vec<Expansion>,
    pub aliases: ColumnAliasMap,
}

/// A single requested expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// The key the nested value is installed under.
    pub name: String,
    /// The dotted association path, used to look up leaves in the alias map.
    pub path: String,
    pub kind: ExpansionKind,
    /// Expansions requested inside this one.
    pub nested: Vec<Expansion>,
}

/// How an expansion comes back from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionKind {
    /// Flattened leaf columns, to be nested under the expansion name.
    ToOne,
    /// A single aggregated column already holding an array of records.
    ToMany { column: String },
    /// Flattened leaf columns which stay flat.
    Inline,
}

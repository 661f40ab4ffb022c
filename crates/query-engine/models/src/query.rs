//! Statements of the query tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::expression::Token;

/// A record of column values, in the order the caller supplied them.
pub type Record = IndexMap<String, serde_json::Value>;

/// One database operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryTree {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

/// The entity a statement reads from, with an optional alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub entity: String,
    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Select {
    pub from: Source,
    /// The requested columns. Empty means `*`.
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, rename = "where")]
    pub where_: Option<Vec<Token>>,
    #[serde(default)]
    pub group_by: Vec<Token>,
    #[serde(default)]
    pub having: Option<Vec<Token>>,
    #[serde(default)]
    pub order_by: Vec<OrderByItem>,
    #[serde(default)]
    pub limit: Option<Pagination>,
    #[serde(default)]
    pub distinct: bool,
    /// Also compute the total count, ignoring pagination.
    #[serde(default)]
    pub count: bool,
    /// Only a single row is wanted.
    #[serde(default)]
    pub one: bool,
    /// Read localized texts, falling back to the base values.
    #[serde(default)]
    pub localized: bool,
    /// Which time slices to read for temporal entities. Defaults to "as of now".
    #[serde(default)]
    pub temporal: Option<TemporalMode>,
}

impl Select {
    /// A `SELECT *` from an entity, with every clause empty.
    pub fn new(entity: &str) -> Select {
        Select {
            from: Source {
                entity: entity.to_string(),
                alias: None,
            },
            columns: vec![],
            where_: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
            distinct: false,
            count: false,
            one: false,
            localized: false,
            temporal: None,
        }
    }
}

/// `*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wildcard {
    #[serde(rename = "*")]
    All,
}

/// A requested column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    /// All columns of the source.
    Star(Wildcard),
    /// Nest the columns of an associated entity under the association name.
    Expand {
        #[serde(rename = "ref")]
        association: Vec<String>,
        expand: Vec<Column>,
        #[serde(default, rename = "as")]
        alias: Option<String>,
    },
    /// Flatten the columns of an associated entity into the row.
    Inline {
        #[serde(rename = "ref")]
        association: Vec<String>,
        inline: Vec<Column>,
    },
    /// A column, possibly reached through a to-one association.
    Reference {
        #[serde(rename = "ref")]
        path: Vec<String>,
        #[serde(default, rename = "as")]
        alias: Option<String>,
    },
    /// A function call.
    Function {
        func: String,
        #[serde(default)]
        args: Vec<Token>,
        #[serde(default, rename = "as")]
        alias: Option<String>,
    },
    /// A literal value.
    Literal {
        val: serde_json::Value,
        #[serde(default, rename = "as")]
        alias: Option<String>,
    },
}

impl Column {
    pub fn star() -> Column {
        Column::Star(Wildcard::All)
    }

    pub fn reference(name: &str) -> Column {
        Column::Reference {
            path: vec![name.to_string()],
            alias: None,
        }
    }

    pub fn aliased(name: &str, alias: &str) -> Column {
        Column::Reference {
            path: vec![name.to_string()],
            alias: Some(alias.to_string()),
        }
    }

    pub fn expand(association: &str, expand: Vec<Column>) -> Column {
        Column::Expand {
            association: vec![association.to_string()],
            expand,
            alias: None,
        }
    }

    pub fn inline(association: &str, inline: Vec<Column>) -> Column {
        Column::Inline {
            association: vec![association.to_string()],
            inline,
        }
    }
}

/// A single element of an ORDER BY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    #[serde(rename = "ref")]
    pub path: Vec<String>,
    #[serde(default)]
    pub sort: Option<SortDirection>,
    #[serde(default)]
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
}

/// Row limit and offset. Negative limits and non-positive offsets are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub rows: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Which time slices of a temporal entity to read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum TemporalMode {
    /// Slices valid right now.
    #[default]
    AsOfNow,
    /// Slices valid at the given instant.
    AsOf { at: serde_json::Value },
    /// Slices overlapping the half-open range `[start, end)`.
    Overlaps {
        start: serde_json::Value,
        end: serde_json::Value,
    },
    /// Every slice.
    Unrestricted,
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub into: String,
    #[serde(flatten)]
    pub data: InsertData,
}

/// The different ways of supplying the data of an INSERT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertData {
    /// A batch of records sharing the same keys.
    Entries { entries: Vec<Record> },
    /// Explicit columns, with one or more rows of values.
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    },
    /// Explicit columns, with a single row of values.
    Values {
        columns: Vec<String>,
        values: Vec<serde_json::Value>,
    },
    /// Explicit columns, filled from a query.
    Select {
        columns: Vec<String>,
        #[serde(rename = "as")]
        select: Box<Select>,
    },
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub entity: String,
    /// Columns set to plain values.
    #[serde(default)]
    pub data: Record,
    /// Columns set to expressions, such as `stock - 1`.
    #[serde(default)]
    pub with: IndexMap<String, Vec<Token>>,
    #[serde(default, rename = "where")]
    pub where_: Option<Vec<Token>>,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub from: String,
    #[serde(default, rename = "where")]
    pub where_: Option<Vec<Token>>,
}

/// Insert a record, or update it if a row with the same keys exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upsert {
    pub into: String,
    pub keys: Vec<String>,
    pub entry: Record,
}

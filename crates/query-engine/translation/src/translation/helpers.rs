//! Helpers for processing the query tree and building SQL.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::{EntityInfo, Metadata};
use query_engine_models::TemporalMode;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::ColumnAliasMap;

use super::error::Error;
use super::settings::TranslationSettings;

/// Static information from the query and metadata.
#[derive(Debug)]
pub struct Env<'a> {
    metadata: &'a Metadata,
    pub settings: &'a TranslationSettings,
    /// The time slices read from temporal entities, for the whole statement.
    pub temporal: TemporalMode,
}

/// Stateful information changed throughout the translation process.
/// One `State` covers exactly one statement.
#[derive(Debug, Default)]
pub struct State {
    /// The joins of the statement, in the order they are emitted.
    joins: Vec<sql::ast::Join>,
    /// Joins made for path expressions, so repeated paths share them.
    path_joins: BTreeMap<(String, String, JoinKind), PathJoin>,
    /// Where the leaves of each expansion ended up.
    pub aliases: ColumnAliasMap,
    /// The to-many expansion of the statement, if any.
    to_many: Option<String>,
}

/// The kind of join created for a path expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JoinKind {
    /// Rows without a related row are dropped. Used for filtering.
    Inner,
    /// Rows without a related row are kept. Used for projection and sorting.
    Left,
}

/// A join made for a path expression.
#[derive(Debug, Clone)]
pub struct PathJoin {
    pub alias: sql::ast::TableAlias,
    pub entity: String,
}

/// A table we can address columns of: which entity it holds, and how to refer to it.
#[derive(Debug, Clone)]
pub struct TableScope<'a> {
    pub entity_name: String,
    /// `None` when we have no metadata about the entity.
    pub info: Option<&'a EntityInfo>,
    /// How columns are qualified. `None` renders bare column names.
    pub reference: Option<sql::ast::TableReference>,
}

impl<'a> Env<'a> {
    /// Create a new Env by supplying the metadata and settings.
    pub fn new(metadata: &'a Metadata, settings: &'a TranslationSettings) -> Env<'a> {
        Env {
            metadata,
            settings,
            temporal: TemporalMode::default(),
        }
    }

    /// Read the given time slices instead of the current ones.
    pub fn with_temporal(mut self, temporal: Option<&TemporalMode>) -> Env<'a> {
        self.temporal = temporal.cloned().unwrap_or_default();
        self
    }

    /// Lookup an entity in the metadata.
    pub fn lookup_entity(&self, name: &str) -> Result<&'a EntityInfo, Error> {
        self.metadata
            .lookup_entity(name)
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))
    }

    /// Lookup an entity, falling back to a table of the same name when it is not modelled.
    pub fn resolve_entity(&self, name: &str) -> (Option<&'a EntityInfo>, String) {
        match self.metadata.lookup_entity(name) {
            Some(info) => (Some(info), info.table_name.clone()),
            None => {
                tracing::debug!(entity = name, "no metadata for entity, using it as a table");
                (None, name.to_string())
            }
        }
    }

    /// Qualify a table name with the default catalog and schema.
    pub fn table_reference(&self, table_name: &str) -> sql::ast::TableReference {
        self.derived_table_reference(table_name, "", "")
    }

    /// Refer to a table or view named after another one, in the same schema.
    /// `localized_` + `BOOKS` gives `localized_BOOKS`.
    pub fn derived_table_reference(
        &self,
        table_name: &str,
        prefix: &str,
        suffix: &str,
    ) -> sql::ast::TableReference {
        let (catalog, schema, table) = sql::identifier::qualified_segments(
            table_name,
            self.settings.default_catalog.as_deref(),
            self.settings.default_schema.as_deref(),
        );
        let table = if prefix.is_empty() && suffix.is_empty() {
            table
        } else {
            format!("{prefix}{}{suffix}", sql::identifier::unquote(&table))
        };
        sql::ast::TableReference::DBTable {
            catalog: catalog.map(sql::ast::CatalogName),
            schema: schema.map(sql::ast::SchemaName),
            table: sql::ast::TableName(table),
        }
    }
}

impl State {
    /// Build a new state.
    pub fn new() -> State {
        State::default()
    }

    /// The alias the next join will get: the association name and its position.
    pub fn make_join_alias(&self, association: &str) -> sql::ast::TableAlias {
        sql::helpers::make_table_alias(self.joins.len() as u64 + 1, association.to_string())
    }

    pub fn push_join(&mut self, join: sql::ast::Join) {
        self.joins.push(join);
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Take the joins collected so far, in order.
    pub fn take_joins(&mut self) -> Vec<sql::ast::Join> {
        std::mem::take(&mut self.joins)
    }

    /// Find the join previously made for this association of this table.
    pub fn lookup_path_join(
        &self,
        parent: &str,
        association: &str,
        kind: JoinKind,
    ) -> Option<&PathJoin> {
        self.path_joins
            .get(&(parent.to_string(), association.to_string(), kind))
    }

    pub fn insert_path_join(
        &mut self,
        parent: &str,
        association: &str,
        kind: JoinKind,
        join: PathJoin,
    ) {
        self.path_joins
            .insert((parent.to_string(), association.to_string(), kind), join);
    }

    /// Record a to-many expansion. Each one joins the child rows in, so a second one
    /// would multiply the rows of the first.
    pub fn register_to_many(&mut self, path: &str) -> Result<(), Error> {
        match &self.to_many {
            Some(existing) => Err(Error::NotSupported(format!(
                "more than one to-many expansion ('{existing}' and '{path}')"
            ))),
            None => {
                self.to_many = Some(path.to_string());
                Ok(())
            }
        }
    }
}

impl<'a> TableScope<'a> {
    /// A table addressed through an alias.
    pub fn aliased(
        entity_name: &str,
        info: Option<&'a EntityInfo>,
        alias: sql::ast::TableAlias,
    ) -> TableScope<'a> {
        TableScope {
            entity_name: entity_name.to_string(),
            info,
            reference: Some(sql::ast::TableReference::AliasedTable(alias)),
        }
    }

    /// A table whose columns are referenced without qualification.
    pub fn unqualified(entity_name: &str, info: Option<&'a EntityInfo>) -> TableScope<'a> {
        TableScope {
            entity_name: entity_name.to_string(),
            info,
            reference: None,
        }
    }

    /// The alias of the table, if it has one.
    pub fn alias_name(&self) -> Option<String> {
        match &self.reference {
            Some(sql::ast::TableReference::AliasedTable(alias)) => Some(alias.to_string()),
            _ => None,
        }
    }

    /// Drop a leading segment naming this table, as in `b.title` for `Books as b`.
    pub fn strip_own_alias<'p>(&self, path: &'p [String]) -> &'p [String] {
        match (path, self.alias_name()) {
            ([head, rest @ ..], Some(alias)) if !rest.is_empty() && *head == alias => rest,
            _ => path,
        }
    }

    /// The database column of an element. Elements without column metadata are used as is.
    pub fn column_name(&self, element: &str) -> sql::ast::ColumnName {
        let name = self
            .info
            .and_then(|info| info.columns.get(element))
            .map_or(element, |column| column.name.as_str());
        sql::ast::ColumnName(name.to_string())
    }

    /// Refer to a column of this table.
    pub fn column(&self, element: &str) -> sql::ast::Expression {
        let name = self.column_name(element);
        match &self.reference {
            Some(table) => sql::helpers::make_column(table.clone(), name),
            None => sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::Column(name)),
        }
    }

    /// The single key column of the entity.
    pub fn single_key(&self) -> Option<&'a str> {
        self.info.and_then(EntityInfo::single_key)
    }
}

//! Translate query trees to parameterized SQL, and the results back to nested rows.

pub mod decorators;
pub mod error;
pub mod helpers;
pub mod mutation;
pub mod query;
pub mod reshape;
pub mod settings;

use query_engine_metadata::metadata::Metadata;
use query_engine_models as models;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::ExecutionPlan;

use error::Error;
use helpers::{Env, State};
use query::filtering::{self, Resolver};
use settings::TranslationSettings;

pub use query::sorting::wrap_with_count;
pub use reshape::{reshape_row, reshape_rows};

/// A compiled statement of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledStatement {
    /// A SELECT, with what is needed to reshape its rows.
    Query(ExecutionPlan),
    /// An INSERT, UPDATE or DELETE.
    Mutation(sql::string::SQL),
}

/// Compile any statement of the query tree.
pub fn compile(
    metadata: &Metadata,
    settings: &TranslationSettings,
    tree: &models::QueryTree,
) -> Result<CompiledStatement, Error> {
    match tree {
        models::QueryTree::Select(select) => {
            compile_select(metadata, settings, select).map(CompiledStatement::Query)
        }
        models::QueryTree::Insert(insert) => {
            compile_insert(metadata, settings, insert).map(CompiledStatement::Mutation)
        }
        models::QueryTree::Update(update) => {
            compile_update(metadata, settings, update).map(CompiledStatement::Mutation)
        }
        models::QueryTree::Delete(delete) => {
            compile_delete(metadata, settings, delete).map(CompiledStatement::Mutation)
        }
    }
}

/// Compile a SELECT to an execution plan: the query, the count query if the count was
/// requested, and how to reshape the rows.
pub fn compile_select(
    metadata: &Metadata,
    settings: &TranslationSettings,
    select: &models::Select,
) -> Result<ExecutionPlan, Error> {
    let env = Env::new(metadata, settings).with_temporal(select.temporal.as_ref());
    let mut state = State::new();
    let translated = query::translate_select(&env, &mut state, select)?;

    // log and return
    tracing::debug!("SQL AST: {:?}", translated.select);
    Ok(ExecutionPlan {
        query: render(settings, |sql| translated.select.to_sql(sql)),
        count_query: translated
            .count
            .map(|count| render(settings, |sql| count.to_sql(sql))),
        expansions: translated.expansions,
    })
}

pub fn compile_insert(
    metadata: &Metadata,
    settings: &TranslationSettings,
    insert: &models::Insert,
) -> Result<sql::string::SQL, Error> {
    let statement = mutation::insert::translate(&Env::new(metadata, settings), insert)?;
    tracing::debug!("SQL AST: {:?}", statement);
    Ok(render(settings, |sql| statement.to_sql(sql)))
}

pub fn compile_update(
    metadata: &Metadata,
    settings: &TranslationSettings,
    update: &models::Update,
) -> Result<sql::string::SQL, Error> {
    let statement = mutation::update::translate(&Env::new(metadata, settings), update)?;
    tracing::debug!("SQL AST: {:?}", statement);
    Ok(render(settings, |sql| statement.to_sql(sql)))
}

pub fn compile_delete(
    metadata: &Metadata,
    settings: &TranslationSettings,
    delete: &models::Delete,
) -> Result<sql::string::SQL, Error> {
    let statement = mutation::delete::translate(&Env::new(metadata, settings), delete)?;
    tracing::debug!("SQL AST: {:?}", statement);
    Ok(render(settings, |sql| statement.to_sql(sql)))
}

/// Compile an insert-or-update of a single record.
pub fn compile_merge(
    metadata: &Metadata,
    settings: &TranslationSettings,
    upsert: &models::Upsert,
) -> Result<sql::string::SQL, Error> {
    let statement = mutation::merge::translate(&Env::new(metadata, settings), upsert)?;
    tracing::debug!("SQL AST: {:?}", statement);
    Ok(render(settings, |sql| statement.to_sql(sql)))
}

/// Compile a predicate on its own. References are not resolved against any entity.
pub fn compile_predicate(
    tokens: &[models::Token],
    settings: &TranslationSettings,
) -> Result<sql::string::SQL, Error> {
    let metadata = Metadata::empty();
    let env = Env::new(&metadata, settings);
    let expression =
        filtering::translate_expression(&env, &mut State::new(), &Resolver::Plain, tokens)?;
    Ok(render(settings, |sql| expression.to_sql(sql)))
}

/// Compile an ORDER BY clause on its own. Empty when there is nothing to sort by.
pub fn compile_order_by(
    order_by: &[models::OrderByItem],
    settings: &TranslationSettings,
) -> Result<sql::string::SQL, Error> {
    let metadata = Metadata::empty();
    let env = Env::new(&metadata, settings);
    let order_by =
        query::sorting::translate_order_by(&env, &mut State::new(), &Resolver::Plain, order_by)?;
    let mut sql = render(settings, |sql| order_by.to_sql(sql));
    sql.sql = sql.sql.trim_start().to_string();
    Ok(sql)
}

/// Compile LIMIT and OFFSET on their own. Empty when neither applies.
pub fn compile_pagination(pagination: Option<&models::Pagination>) -> String {
    let mut sql = sql::string::SQL::new();
    query::sorting::translate_pagination(pagination, false).to_sql(&mut sql);
    sql.sql.trim_start().to_string()
}

/// `CREATE VIEW current_<table>` for a temporal entity.
pub fn compile_current_view(
    metadata: &Metadata,
    settings: &TranslationSettings,
    entity: &str,
) -> Result<sql::string::DDL, Error> {
    decorators::temporal::current_view_ddl(&Env::new(metadata, settings), entity)
}

/// `CREATE TABLE <table>_texts` for an entity with localized columns.
pub fn compile_texts_table(
    metadata: &Metadata,
    settings: &TranslationSettings,
    entity: &str,
) -> Result<sql::string::DDL, Error> {
    decorators::localization::texts_table_ddl(&Env::new(metadata, settings), entity)
}

/// `CREATE VIEW localized_<table>` for an entity with localized columns.
pub fn compile_localized_view(
    metadata: &Metadata,
    settings: &TranslationSettings,
    entity: &str,
) -> Result<sql::string::DDL, Error> {
    decorators::localization::localized_view_ddl(&Env::new(metadata, settings), entity)
}

fn render(
    settings: &TranslationSettings,
    to_sql: impl FnOnce(&mut sql::string::SQL),
) -> sql::string::SQL {
    let mut sql = sql::string::SQL::with_placeholder(settings.placeholder);
    to_sql(&mut sql);
    sql
}

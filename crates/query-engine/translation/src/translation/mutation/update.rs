//! UPDATE.

use query_engine_models::Update;
use query_engine_sql::sql;

use super::bind;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, JoinKind, State, TableScope};
use crate::translation::query::filtering::{self, Resolver};

/// Translate an UPDATE. Plain values are assigned first, then expressions.
pub fn translate(env: &Env, update: &Update) -> Result<sql::ast::Update, Error> {
    let entity = &update.entity;
    let (info, table_name) = env.resolve_entity(entity);
    let scope = TableScope::unqualified(entity, info);
    let resolver = Resolver::Table {
        scope: &scope,
        join: JoinKind::Inner,
    };
    // columns are never qualified here, so nothing can be joined
    let mut state = State::new();

    let mut set: Vec<(sql::ast::ColumnName, sql::ast::Expression)> = update
        .data
        .iter()
        .map(|(column, value)| (scope.column_name(column), bind(value)))
        .collect();
    for (column, tokens) in &update.with {
        let expression = filtering::translate_expression(env, &mut state, &resolver, tokens)?;
        set.push((scope.column_name(column), expression));
    }
    if set.is_empty() {
        return Err(Error::EmptyUpdate(entity.clone()));
    }

    let where_ = match &update.where_ {
        Some(tokens) => filtering::translate_expression(env, &mut state, &resolver, tokens)?,
        None => sql::helpers::true_expr(),
    };

    Ok(sql::ast::Update {
        table: env.table_reference(&table_name),
        set,
        where_: sql::ast::Where(where_),
    })
}

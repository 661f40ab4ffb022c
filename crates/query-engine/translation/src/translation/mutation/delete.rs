//! DELETE.

use query_engine_models::Delete;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, JoinKind, State, TableScope};
use crate::translation::query::filtering::{self, Resolver};

pub fn translate(env: &Env, delete: &Delete) -> Result<sql::ast::Delete, Error> {
    let entity = &delete.from;
    let (info, table_name) = env.resolve_entity(entity);
    let scope = TableScope::unqualified(entity, info);

    let where_ = match &delete.where_ {
        Some(tokens) => filtering::translate_expression(
            env,
            &mut State::new(),
            &Resolver::Table {
                scope: &scope,
                join: JoinKind::Inner,
            },
            tokens,
        )?,
        None => sql::helpers::true_expr(),
    };

    Ok(sql::ast::Delete {
        table: env.table_reference(&table_name),
        where_: sql::ast::Where(where_),
    })
}

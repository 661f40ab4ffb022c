//! Translate ORDER BY, LIMIT and OFFSET, and counting the rows of a query.

use query_engine_models::{NullsOrder, OrderByItem, Pagination, SortDirection};
use query_engine_sql::sql;

use super::filtering::{self, Resolver};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State};

/// Convert the order by items of a statement to an ORDER BY clause.
/// Paths through associations are joined with LEFT JOINs, so no row is lost by sorting.
pub fn translate_order_by(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    order_by: &[OrderByItem],
) -> Result<sql::ast::OrderBy, Error> {
    let elements = order_by
        .iter()
        .map(|item| -> Result<sql::ast::OrderByElement, Error> {
            Ok(sql::ast::OrderByElement {
                target: filtering::translate_reference(env, state, resolver, &item.path)?,
                direction: item.sort.map(|sort| match sort {
                    SortDirection::Asc => sql::ast::OrderByDirection::Asc,
                    SortDirection::Desc => sql::ast::OrderByDirection::Desc,
                }),
                nulls: item.nulls.map(|nulls| match nulls {
                    NullsOrder::First => sql::ast::NullsOrder::First,
                    NullsOrder::Last => sql::ast::NullsOrder::Last,
                }),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(sql::ast::OrderBy { elements })
}

/// A non-negative limit is kept, and a positive offset. Asking for a single row limits to one.
pub fn translate_pagination(limit: Option<&Pagination>, one: bool) -> sql::ast::Limit {
    let rows = limit.and_then(|limit| limit.rows);
    let offset = limit.and_then(|limit| limit.offset);
    sql::ast::Limit {
        limit: if one {
            Some(1)
        } else {
            rows.and_then(|rows| u64::try_from(rows).ok())
        },
        offset: offset
            .filter(|offset| *offset > 0)
            .and_then(|offset| u64::try_from(offset).ok()),
    }
}

/// Wrap an already translated SELECT as a subquery and count its rows.
/// The parameters of the inner query carry over as they are.
pub fn wrap_with_count(inner: sql::string::SQL) -> sql::string::SQL {
    let mut sql = sql::string::SQL::with_placeholder(inner.placeholder);
    sql.append_syntax("SELECT COUNT(*) AS ");
    sql.append_identifier("$count");
    sql.append_syntax(" FROM (");
    sql.append_syntax(&inner.sql);
    sql.append_syntax(") AS ");
    sql.append_identifier("counted");
    sql.params = inner.params;
    sql.param_index = inner.param_index;
    sql
}

//! Translate a SELECT of the query tree.

pub mod fields;
pub mod filtering;
pub mod relationships;
pub mod sorting;

use query_engine_models as models;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::ExpansionPlan;

use self::filtering::Resolver;
use super::decorators::{localization, temporal};
use super::error::Error;
use super::helpers::{Env, JoinKind, State, TableScope};

/// A translated SELECT, before it is rendered.
#[derive(Debug)]
pub struct TranslatedSelect {
    pub select: sql::ast::Select,
    /// The same SELECT counting its rows, when the count was requested.
    pub count: Option<sql::ast::Select>,
    pub expansions: ExpansionPlan,
}

/// Translate a SELECT. The clauses are translated in a fixed order, so joins are numbered
/// in the order the columns, then the filter, then the sort order need them.
pub fn translate_select(
    env: &Env,
    state: &mut State,
    query: &models::Select,
) -> Result<TranslatedSelect, Error> {
    let entity = &query.from.entity;
    let (info, table_name) = env.resolve_entity(entity);

    let table = if query.localized {
        match info {
            Some(info) if !info.localized.is_empty() => {
                localization::localized_view_reference(env, info)
            }
            _ => return Err(Error::NotLocalized(entity.clone())),
        }
    } else {
        env.table_reference(&table_name)
    };

    let alias = sql::helpers::make_table_alias(
        0,
        query.from.alias.clone().unwrap_or_else(|| entity.clone()),
    );
    let scope = TableScope::aliased(entity, info, alias.clone());

    // columns
    let mut fields = if query.columns.is_empty() {
        fields::Fields {
            items: vec![sql::ast::SelectItem::Star(scope.reference.clone())],
            star: true,
            ..fields::Fields::default()
        }
    } else {
        fields::translate_columns(env, state, &scope, &query.columns)?
    };

    // where
    let filter = match &query.where_ {
        Some(tokens) => filtering::translate_expression(
            env,
            state,
            &Resolver::Table {
                scope: &scope,
                join: JoinKind::Inner,
            },
            tokens,
        )?,
        None => sql::helpers::true_expr(),
    };
    let filter = match info.and_then(|info| info.temporal.as_ref()) {
        Some(descriptor) => {
            temporal::decorate(filter, scope.reference.as_ref(), descriptor, &env.temporal)
        }
        None => filter,
    };

    // group by, having, order by
    let sorting_resolver = Resolver::Table {
        scope: &scope,
        join: JoinKind::Left,
    };
    let mut group_by = query
        .group_by
        .iter()
        .map(|token| filtering::translate_token(env, state, &sorting_resolver, token))
        .collect::<Result<Vec<_>, Error>>()?;
    let having = match &query.having {
        Some(tokens) => filtering::translate_expression(env, state, &sorting_resolver, tokens)?,
        None => sql::helpers::true_expr(),
    };
    let order_by = sorting::translate_order_by(env, state, &sorting_resolver, &query.order_by)?;

    // aggregating the rows of a to-many expansion groups by everything else,
    // or by the key when the other columns cannot be listed
    if fields.to_many {
        let mut grouping = std::mem::take(&mut fields.grouping);
        if fields.star || fields.computed || grouping.is_empty() {
            let keys = info
                .map(|info| info.keys.as_slice())
                .filter(|keys| !keys.is_empty())
                .ok_or_else(|| Error::NoKeyColumns(entity.clone()))?;
            grouping.splice(0..0, keys.iter().map(|key| scope.column(key)));
        }
        for expression in grouping {
            if !group_by.contains(&expression) {
                group_by.push(expression);
            }
        }
    }

    // `*` only stays unqualified while nothing is joined
    if !state.has_joins() {
        for item in &mut fields.items {
            if let sql::ast::SelectItem::Star(reference) = item {
                *reference = None;
            }
        }
    }

    let select = sql::ast::Select {
        distinct: query.distinct,
        select_list: sql::ast::SelectList(fields.items),
        from: Some(sql::ast::From::Table {
            reference: table,
            alias,
        }),
        joins: state.take_joins(),
        where_: sql::ast::Where(filter),
        group_by: sql::ast::GroupBy { elements: group_by },
        having: sql::ast::Where(having),
        order_by,
        limit: sorting::translate_pagination(query.limit.as_ref(), query.one),
    };

    let count = query.count.then(|| {
        let mut inner = select.clone();
        inner.order_by = sql::helpers::empty_order_by();
        inner.limit = sql::helpers::empty_limit();
        sql::helpers::count_select(inner)
    });

    Ok(TranslatedSelect {
        select,
        count,
        expansions: ExpansionPlan {
            expansions: fields.expansions,
            aliases: std::mem::take(&mut state.aliases),
        },
    })
}

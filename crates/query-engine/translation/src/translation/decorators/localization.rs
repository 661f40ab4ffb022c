//! Texts tables and fallback views for entities with localized columns.

use query_engine_metadata::metadata::{EntityInfo, Nullable, ScalarType};
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, TableScope};

/// The locale column of a texts table.
pub const LOCALE_COLUMN: &str = "LOCALE";

const LOCALE_TYPE: &str = "NVARCHAR(14)";

/// The table holding the texts of an entity, per locale.
pub fn texts_table_reference(env: &Env, info: &EntityInfo) -> sql::ast::TableReference {
    env.derived_table_reference(&info.table_name, "", "_texts")
}

/// The view reading an entity with its texts in the session locale.
pub fn localized_view_reference(env: &Env, info: &EntityInfo) -> sql::ast::TableReference {
    env.derived_table_reference(&info.table_name, "localized_", "")
}

fn lookup_localized<'a>(env: &Env<'a>, entity: &str) -> Result<&'a EntityInfo, Error> {
    let info = env.lookup_entity(entity)?;
    if info.localized.is_empty() {
        return Err(Error::NotLocalized(entity.to_string()));
    }
    Ok(info)
}

/// `CREATE TABLE <table>_texts (LOCALE, <keys>, <localized columns>)`, keyed on the locale
/// and the keys of the entity.
pub fn texts_table_ddl(env: &Env, entity: &str) -> Result<sql::string::DDL, Error> {
    let info = lookup_localized(env, entity)?;
    if info.keys.is_empty() {
        return Err(Error::NoKeyColumns(entity.to_string()));
    }
    let scope = TableScope::unqualified(entity, Some(info));

    let definition = |element: &str, not_null: bool| {
        let column = info.columns.get(element);
        sql::ast::ColumnDefinition {
            name: scope.column_name(element),
            r#type: column.map_or_else(
                || ScalarType::String.sql_type(None),
                |column| column.r#type.sql_type(column.length),
            ),
            not_null: not_null
                || column.is_some_and(|column| column.nullable == Nullable::NonNullable),
        }
    };

    let mut columns = vec![sql::ast::ColumnDefinition {
        name: sql::ast::ColumnName(LOCALE_COLUMN.to_string()),
        r#type: LOCALE_TYPE.to_string(),
        not_null: true,
    }];
    columns.extend(info.keys.iter().map(|key| definition(key, true)));
    columns.extend(
        info.localized
            .iter()
            .filter(|element| !info.keys.contains(element))
            .map(|element| definition(element, false)),
    );

    let mut primary_key = vec![sql::ast::ColumnName(LOCALE_COLUMN.to_string())];
    primary_key.extend(info.keys.iter().map(|key| scope.column_name(key)));

    let table = sql::ast::CreateTable {
        table: texts_table_reference(env, info),
        columns,
        primary_key,
    };
    let mut sql = sql::string::SQL::with_placeholder(env.settings.placeholder);
    table.to_sql(&mut sql);
    Ok(sql::string::DDL(sql))
}

/// `CREATE VIEW localized_<table> AS SELECT ...` reading the texts of the session locale,
/// falling back to the configured locale and then to the base columns.
pub fn localized_view_ddl(env: &Env, entity: &str) -> Result<sql::string::DDL, Error> {
    let info = lookup_localized(env, entity)?;
    if info.keys.is_empty() {
        return Err(Error::NoKeyColumns(entity.to_string()));
    }

    let base_alias = sql::helpers::make_table_alias(0, "base".to_string());
    let texts_alias = sql::helpers::make_table_alias(0, "texts".to_string());
    let base = TableScope::aliased(entity, Some(info), base_alias.clone());
    let texts = TableScope::aliased(entity, Some(info), texts_alias.clone());

    // keys first, then the other modelled columns, then unmodelled localized columns
    let mut elements: Vec<&str> = info.keys.iter().map(String::as_str).collect();
    for element in info.columns.keys().chain(info.localized.iter()) {
        if !elements.contains(&element.as_str()) {
            elements.push(element);
        }
    }

    let select_list = elements
        .into_iter()
        .map(|element| {
            if info.is_localized(element) {
                sql::ast::SelectItem::Expression {
                    expression: sql::ast::Expression::FunctionCall {
                        function: sql::ast::Function::Coalesce,
                        args: vec![texts.column(element), base.column(element)],
                    },
                    alias: Some(sql::helpers::make_column_alias(
                        base.column_name(element).0,
                    )),
                }
            } else {
                sql::ast::SelectItem::Expression {
                    expression: base.column(element),
                    alias: None,
                }
            }
        })
        .collect();

    let locale = sql::ast::Expression::FunctionCall {
        function: sql::ast::Function::Coalesce,
        args: vec![
            sql::ast::Expression::Raw(env.settings.session_locale.clone()),
            sql::ast::Expression::Value(sql::ast::Value::Character(
                env.settings.fallback_locale.clone(),
            )),
        ],
    };
    let on = info
        .keys
        .iter()
        .map(|key| sql::helpers::equals(base.column(key), texts.column(key)))
        .fold(sql::helpers::true_expr(), sql::helpers::and);
    let on = sql::helpers::and(
        on,
        sql::helpers::equals(
            sql::helpers::make_column(
                sql::ast::TableReference::AliasedTable(texts_alias.clone()),
                sql::ast::ColumnName(LOCALE_COLUMN.to_string()),
            ),
            locale,
        ),
    );

    let mut select = sql::helpers::simple_select(select_list);
    select.from = Some(sql::ast::From::Table {
        reference: env.table_reference(&info.table_name),
        alias: base_alias,
    });
    select.joins = vec![sql::ast::Join::LeftOuterJoin(sql::ast::LeftOuterJoin {
        table: texts_table_reference(env, info),
        alias: texts_alias,
        on,
    })];

    let view = sql::ast::CreateView {
        name: localized_view_reference(env, info),
        select: Box::new(select),
    };
    let mut sql = sql::string::SQL::with_placeholder(env.settings.placeholder);
    view.to_sql(&mut sql);
    Ok(sql::string::DDL(sql))
}

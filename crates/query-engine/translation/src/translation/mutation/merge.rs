//! Insert-or-update of a single record, as a MERGE.

use query_engine_models::Upsert;
use query_engine_sql::sql;

use super::bind;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, TableScope};

/// Translate an upsert into
///
/// ```sql
/// MERGE INTO <table> AS tgt
/// USING (SELECT ? AS <column>, ...) AS src
/// ON tgt.<key> = src.<key> AND ...
/// WHEN MATCHED THEN UPDATE SET <non-key column> = src.<non-key column>, ...
/// WHEN NOT MATCHED THEN INSERT (<column>, ...) VALUES (src.<column>, ...)
/// ```
///
/// The keys default to the keys of the entity. A record made only of keys has nothing to
/// update, so the `WHEN MATCHED` branch is left out.
pub fn translate(env: &Env, upsert: &Upsert) -> Result<sql::ast::Merge, Error> {
    let entity = &upsert.into;
    let (info, table_name) = env.resolve_entity(entity);

    let keys = if upsert.keys.is_empty() {
        info.map(|info| info.keys.as_slice()).unwrap_or_default()
    } else {
        upsert.keys.as_slice()
    };
    if keys.is_empty() {
        return Err(Error::NoKeyColumns(entity.clone()));
    }
    if upsert.entry.is_empty() {
        return Err(Error::EmptyInsert(entity.clone()));
    }
    if let Some(missing) = keys.iter().find(|key| !upsert.entry.contains_key(*key)) {
        return Err(Error::KeyColumnNotInRecord {
            entity: entity.clone(),
            column: missing.clone(),
        });
    }

    let target_alias = sql::helpers::make_table_alias(0, "tgt".to_string());
    let source_alias = sql::helpers::make_table_alias(0, "src".to_string());
    let target = TableScope::aliased(entity, info, target_alias.clone());
    let source = TableScope::aliased(entity, info, source_alias.clone());

    let on = keys
        .iter()
        .map(|key| sql::helpers::equals(target.column(key), source.column(key)))
        .fold(sql::helpers::true_expr(), sql::helpers::and);

    let updates: Vec<_> = upsert
        .entry
        .keys()
        .filter(|column| !keys.contains(column))
        .map(|column| (target.column_name(column), source.column(column)))
        .collect();

    Ok(sql::ast::Merge {
        target: env.table_reference(&table_name),
        target_alias,
        source: upsert
            .entry
            .iter()
            .map(|(column, value)| {
                (
                    sql::helpers::make_column_alias(target.column_name(column).0),
                    bind(value),
                )
            })
            .collect(),
        source_alias,
        on,
        when_matched_update: if updates.is_empty() {
            None
        } else {
            Some(updates)
        },
        when_not_matched_insert: (
            upsert
                .entry
                .keys()
                .map(|column| target.column_name(column))
                .collect(),
            upsert
                .entry
                .keys()
                .map(|column| source.column(column))
                .collect(),
        ),
    })
}

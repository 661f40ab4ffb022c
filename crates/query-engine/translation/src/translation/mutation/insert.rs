//! INSERT, from records, rows of values, or a query.

use query_engine_models::{Insert, InsertData};
use query_engine_sql::sql;

use super::bind;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableScope};
use crate::translation::query;

/// Translate an INSERT.
///
/// A batch of records takes its columns from the first record, and every other record must
/// have exactly the same columns. Columns given explicitly must be matched by every row.
pub fn translate(env: &Env, insert: &Insert) -> Result<sql::ast::Insert, Error> {
    let entity = &insert.into;
    let (info, table_name) = env.resolve_entity(entity);
    let scope = TableScope::unqualified(entity, info);

    let (columns, from) = match &insert.data {
        InsertData::Entries { entries } => {
            let first = entries
                .first()
                .filter(|record| !record.is_empty())
                .ok_or_else(|| Error::EmptyInsert(entity.clone()))?;
            let columns: Vec<String> = first.keys().cloned().collect();

            let rows = entries
                .iter()
                .enumerate()
                .map(|(index, record)| {
                    let same_keys = record.len() == columns.len()
                        && columns.iter().all(|column| record.contains_key(column));
                    if !same_keys {
                        return Err(Error::MismatchedRecordKeys {
                            entity: entity.clone(),
                            index,
                            expected: columns.clone(),
                            got: record.keys().cloned().collect(),
                        });
                    }
                    Ok(columns
                        .iter()
                        .filter_map(|column| record.get(column))
                        .map(bind)
                        .collect())
                })
                .collect::<Result<Vec<_>, Error>>()?;
            (columns, sql::ast::InsertFrom::Values(rows))
        }
        InsertData::Rows { columns, rows } => {
            if rows.is_empty() {
                return Err(Error::EmptyInsert(entity.clone()));
            }
            (columns.clone(), values(entity, columns, rows)?)
        }
        InsertData::Values { columns, values: row } => (
            columns.clone(),
            values(entity, columns, std::slice::from_ref(row))?,
        ),
        InsertData::Select { columns, select } => {
            let mut state = State::new();
            let translated = query::translate_select(env, &mut state, select)?;
            if !translated.expansions.expansions.is_empty() {
                return Err(Error::NotSupported(format!(
                    "expansions in the query of an insert into '{entity}'"
                )));
            }
            (
                columns.clone(),
                sql::ast::InsertFrom::Select(Box::new(translated.select)),
            )
        }
    };

    if columns.is_empty() {
        return Err(Error::EmptyInsert(entity.clone()));
    }

    Ok(sql::ast::Insert {
        table: env.table_reference(&table_name),
        columns: columns
            .iter()
            .map(|column| scope.column_name(column))
            .collect(),
        from,
    })
}

fn values(
    entity: &str,
    columns: &[String],
    rows: &[Vec<serde_json::Value>],
) -> Result<sql::ast::InsertFrom, Error> {
    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() == columns.len() {
                Ok(row.iter().map(bind).collect())
            } else {
                Err(Error::ValuesLengthMismatch {
                    entity: entity.to_string(),
                    index,
                    expected: columns.len(),
                    got: row.len(),
                })
            }
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::ast::InsertFrom::Values(rows))
}

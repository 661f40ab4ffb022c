//! Nest flat result rows again, following the expansion plan of the query.
//!
//! To-one expansions come back as flat aliased columns, which are collected into an object
//! under the expansion name, at the position of the first of them. An object whose columns
//! are all null stands for a missing related row and becomes `null`. To-many expansions come
//! back already aggregated into one column, and inline expansions stay flat.

use std::collections::BTreeSet;

use query_engine_sql::sql::execution_plan::{
    ColumnAliasMap, Expansion, ExpansionKind, ExpansionPlan, Row,
};
use serde_json::Value;

/// A nested value and where it goes in the row.
struct Placed {
    index: usize,
    name: String,
    value: Value,
}

/// Reshape every row of a result.
pub fn reshape_rows(rows: Vec<Row>, plan: &ExpansionPlan) -> Vec<Row> {
    if plan.expansions.is_empty() {
        return rows;
    }
    rows.into_iter().map(|row| reshape_row(row, plan)).collect()
}

/// Reshape a single row.
pub fn reshape_row(row: Row, plan: &ExpansionPlan) -> Row {
    let mut consumed = BTreeSet::new();
    let mut placed: Vec<Placed> = plan
        .expansions
        .iter()
        .filter_map(|expansion| collect(&row, expansion, &plan.aliases, &mut consumed))
        .collect();
    placed.sort_by_key(|placed| placed.index);

    let mut placed = placed.into_iter().peekable();
    let mut reshaped = Row::with_capacity(row.len());
    for (index, (key, value)) in row.into_iter().enumerate() {
        while let Some(nested) = placed.next_if(|placed| placed.index == index) {
            reshaped.insert(nested.name, nested.value);
        }
        if !consumed.contains(&key) {
            reshaped.insert(key, value);
        }
    }
    reshaped
}

/// Gather the value of an expansion from a flat row, noting the columns it used up.
fn collect(
    row: &Row,
    expansion: &Expansion,
    aliases: &ColumnAliasMap,
    consumed: &mut BTreeSet<String>,
) -> Option<Placed> {
    match &expansion.kind {
        ExpansionKind::Inline => None,
        ExpansionKind::ToMany { column } => {
            let (index, _, value) = row.get_full(column)?;
            consumed.insert(column.clone());
            Some(Placed {
                index,
                name: expansion.name.clone(),
                value: records(value.clone(), &expansion.nested),
            })
        }
        ExpansionKind::ToOne => {
            let mut fields: Vec<(usize, String, Value)> = vec![];
            for (leaf, alias) in aliases.leaves(&expansion.path) {
                if let Some((index, _, value)) = row.get_full(alias) {
                    consumed.insert(alias.to_string());
                    fields.push((index, leaf.to_string(), value.clone()));
                }
            }
            for nested in &expansion.nested {
                if let Some(placed) = collect(row, nested, aliases, consumed) {
                    fields.push((placed.index, placed.name, placed.value));
                }
            }
            fields.sort_by_key(|(index, _, _)| *index);

            let index = fields.first()?.0;
            let value = if fields.iter().all(|(_, _, value)| is_empty(value)) {
                Value::Null
            } else {
                Value::Object(
                    fields
                        .into_iter()
                        .map(|(_, name, value)| (name, value))
                        .collect(),
                )
            };
            Some(Placed {
                index,
                name: expansion.name.clone(),
                value,
            })
        }
    }
}

/// The aggregated records of a to-many expansion. Some drivers hand json back as text.
fn records(value: Value, nested: &[Expansion]) -> Value {
    let value = match value {
        Value::Null => Value::Array(vec![]),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ Value::Array(_)) => parsed,
            _ => Value::String(text),
        },
        other => other,
    };
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| tidy_children(item, nested))
                .collect(),
        ),
        other => other,
    }
}

/// Replace the nested to-one objects of a record which matched no row with `null`.
fn tidy_children(record: Value, nested: &[Expansion]) -> Value {
    let Value::Object(mut object) = record else {
        return record;
    };
    for expansion in nested {
        if expansion.kind != ExpansionKind::ToOne {
            continue;
        }
        if let Some(child) = object.get_mut(&expansion.name) {
            let tidied = tidy_children(child.take(), &expansion.nested);
            *child = match tidied {
                Value::Object(fields) if fields.values().all(is_empty) => Value::Null,
                other => other,
            };
        }
    }
    Value::Object(object)
}

/// A value which says nothing about a related row.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

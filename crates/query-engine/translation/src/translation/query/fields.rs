//! Handle the requested columns, and the expansions of associations among them.
//!
//! To-one and inline expansions join their target and select its columns under flat aliases,
//! recorded in the column alias map so results can be nested again. A to-many expansion joins
//! the child rows and aggregates them into one array of records per parent row.

use query_engine_metadata::metadata::{Association, Cardinality, JoinCondition};
use query_engine_models::Column;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{Expansion, ExpansionKind};

use super::filtering::{self, Resolver};
use super::relationships;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, JoinKind, State, TableScope};

/// The select list produced by the requested columns.
#[derive(Debug, Default)]
pub struct Fields {
    pub items: Vec<sql::ast::SelectItem>,
    /// Parent side expressions, which a GROUP BY must list once rows are aggregated.
    pub grouping: Vec<sql::ast::Expression>,
    /// Was `*` requested at the top level.
    pub star: bool,
    /// Was a function other than an aggregate requested. Its arguments may be any column.
    pub computed: bool,
    /// Was a to-many expansion requested.
    pub to_many: bool,
    pub expansions: Vec<Expansion>,
}

/// Where the leaves of the columns being translated end up.
#[derive(Debug, Clone, Default)]
struct Place {
    /// The dotted path of the enclosing expansion, empty at the top level.
    map_path: String,
    /// Prefix turning a key of the enclosing object into a flat alias, e.g. `author_`.
    object_prefix: String,
    /// Prefix of default key names, added by inline expansions, e.g. `genre_`.
    default_prefix: String,
}

impl Place {
    /// Directly in the select list, not inside any expansion.
    fn is_top_level(&self) -> bool {
        self.map_path.is_empty() && self.default_prefix.is_empty()
    }

    fn child_path(&self, key: &str) -> String {
        if self.map_path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.map_path)
        }
    }
}

/// Translate the requested columns of a table.
pub fn translate_columns<'a>(
    env: &Env<'a>,
    state: &mut State,
    scope: &TableScope<'a>,
    columns: &[Column],
) -> Result<Fields, Error> {
    let mut fields = Fields::default();
    fields.expansions = translate_place(
        env,
        state,
        scope,
        columns,
        &Place::default(),
        0,
        &mut fields,
    )?;
    Ok(fields)
}

#[allow(clippy::too_many_arguments)]
fn translate_place<'a>(
    env: &Env<'a>,
    state: &mut State,
    scope: &TableScope<'a>,
    columns: &[Column],
    place: &Place,
    depth: u32,
    fields: &mut Fields,
) -> Result<Vec<Expansion>, Error> {
    let resolver = Resolver::Table {
        scope,
        join: JoinKind::Left,
    };
    let mut expansions = vec![];

    for column in columns {
        match column {
            Column::Star(_) if place.is_top_level() => {
                fields.star = true;
                fields
                    .items
                    .push(sql::ast::SelectItem::Star(scope.reference.clone()));
            }
            Column::Star(_) => {
                for element in star_elements(scope)? {
                    let key = format!("{}{element}", place.default_prefix);
                    let column_name = scope.column_name(element);
                    push_leaf(
                        state,
                        fields,
                        place,
                        &key,
                        Some(&column_name),
                        scope.column(element),
                        true,
                    );
                }
            }
            Column::Reference { path, alias } => {
                let path = scope.strip_own_alias(path);
                let expression = filtering::translate_reference(env, state, &resolver, path)?;
                let key = alias
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", place.default_prefix, path.join("_")));
                let column_name = match path {
                    [element] => Some(scope.column_name(element)),
                    _ => None,
                };
                push_leaf(state, fields, place, &key, column_name.as_ref(), expression, true);
            }
            Column::Function { func, args, alias } => {
                let expression = filtering::translate_function(env, state, &resolver, func, args)?;
                let key = alias.clone().unwrap_or_else(|| {
                    format!("{}{}", place.default_prefix, func.to_ascii_lowercase())
                });
                if !is_aggregate(func) {
                    fields.computed = true;
                }
                push_leaf(state, fields, place, &key, None, expression, false);
            }
            Column::Literal { val, alias } => {
                let key = alias
                    .clone()
                    .unwrap_or_else(|| format!("{}val", place.default_prefix));
                let expression = filtering::translate_literal(val);
                push_leaf(state, fields, place, &key, None, expression, false);
            }
            Column::Expand {
                association,
                expand,
                alias,
            } => {
                let name = association_name(association)?;
                let key = alias
                    .clone()
                    .unwrap_or_else(|| format!("{}{name}", place.default_prefix));
                let path = place.child_path(&key);
                check_depth(env, &path, depth + 1)?;
                let association = lookup_association(scope, name)?;

                match association.cardinality {
                    Cardinality::ToOne => {
                        let target = relationships::translate_association_join(
                            env,
                            state,
                            scope,
                            name,
                            association,
                            JoinKind::Left,
                        )?;
                        let child = Place {
                            map_path: path.clone(),
                            object_prefix: format!("{}{key}_", place.object_prefix),
                            default_prefix: String::new(),
                        };
                        let nested = translate_place(
                            env,
                            state,
                            &target,
                            expand,
                            &child,
                            depth + 1,
                            fields,
                        )?;
                        expansions.push(Expansion {
                            name: key,
                            path,
                            kind: ExpansionKind::ToOne,
                            nested,
                        });
                    }
                    Cardinality::ToMany => {
                        state.register_to_many(&path)?;
                        let target = relationships::translate_association_join(
                            env,
                            state,
                            scope,
                            name,
                            association,
                            JoinKind::Left,
                        )?;
                        let (record, nested) =
                            translate_record(env, state, &target, expand, "", &path, depth + 1)?;
                        let column = format!("{}{key}", place.object_prefix);
                        fields.items.push(sql::ast::SelectItem::Expression {
                            expression: aggregate_records(
                                record,
                                child_row_marker(&target, association)?,
                            ),
                            alias: Some(sql::helpers::make_column_alias(column.clone())),
                        });
                        fields.to_many = true;
                        expansions.push(Expansion {
                            name: key,
                            path,
                            kind: ExpansionKind::ToMany { column },
                            nested,
                        });
                    }
                }
            }
            Column::Inline {
                association,
                inline,
            } => {
                let name = association_name(association)?;
                check_depth(env, &place.child_path(name), depth + 1)?;
                let association = lookup_association(scope, name)?;
                if association.cardinality == Cardinality::ToMany {
                    return Err(Error::NotSupported(format!(
                        "inlining the to-many association '{name}'"
                    )));
                }
                let target = relationships::translate_association_join(
                    env,
                    state,
                    scope,
                    name,
                    association,
                    JoinKind::Left,
                )?;
                let child = Place {
                    map_path: place.map_path.clone(),
                    object_prefix: place.object_prefix.clone(),
                    default_prefix: format!("{}{name}_", place.default_prefix),
                };
                let nested =
                    translate_place(env, state, &target, inline, &child, depth + 1, fields)?;
                expansions.push(Expansion {
                    name: name.to_string(),
                    path: place.map_path.clone(),
                    kind: ExpansionKind::Inline,
                    nested: vec![],
                });
                // inlined columns belong to the enclosing object, and so do their expansions
                expansions.extend(nested);
            }
        }
    }

    Ok(expansions)
}

fn is_aggregate(func: &str) -> bool {
    matches!(
        func.to_ascii_lowercase().as_str(),
        "count" | "sum" | "min" | "max" | "avg"
    )
}

/// Select a leaf under its flat alias and record where it went.
/// The alias is left out when the column would get that name anyway.
fn push_leaf(
    state: &mut State,
    fields: &mut Fields,
    place: &Place,
    key: &str,
    column_name: Option<&sql::ast::ColumnName>,
    expression: sql::ast::Expression,
    grouped: bool,
) {
    let flat = format!("{}{key}", place.object_prefix);
    let alias = match column_name {
        Some(sql::ast::ColumnName(name)) if *name == flat => None,
        _ => Some(sql::helpers::make_column_alias(flat.clone())),
    };
    if grouped {
        fields.grouping.push(expression.clone());
    }
    fields
        .items
        .push(sql::ast::SelectItem::Expression { expression, alias });
    if !place.map_path.is_empty() {
        state.aliases.insert(&place.map_path, key, &flat);
    }
}

/// Translate the columns of a to-many expansion into the fields of one json record.
#[allow(clippy::too_many_arguments)]
fn translate_record<'a>(
    env: &Env<'a>,
    state: &mut State,
    scope: &TableScope<'a>,
    columns: &[Column],
    default_prefix: &str,
    path: &str,
    depth: u32,
) -> Result<(Vec<(String, sql::ast::Expression)>, Vec<Expansion>), Error> {
    let resolver = Resolver::Table {
        scope,
        join: JoinKind::Left,
    };
    let mut record = vec![];
    let mut expansions = vec![];

    for column in columns {
        match column {
            Column::Star(_) => {
                for element in star_elements(scope)? {
                    record.push((format!("{default_prefix}{element}"), scope.column(element)));
                }
            }
            Column::Reference { path: reference, alias } => {
                let reference = scope.strip_own_alias(reference);
                let key = alias
                    .clone()
                    .unwrap_or_else(|| format!("{default_prefix}{}", reference.join("_")));
                let expression =
                    filtering::translate_reference(env, state, &resolver, reference)?;
                record.push((key, expression));
            }
            Column::Function { func, args, alias } => {
                let key = alias
                    .clone()
                    .unwrap_or_else(|| format!("{default_prefix}{}", func.to_ascii_lowercase()));
                let expression = filtering::translate_function(env, state, &resolver, func, args)?;
                record.push((key, expression));
            }
            Column::Literal { val, alias } => {
                let key = alias.clone().unwrap_or_else(|| format!("{default_prefix}val"));
                record.push((key, filtering::translate_literal(val)));
            }
            Column::Expand {
                association,
                expand,
                alias,
            } => {
                let name = association_name(association)?;
                let key = alias
                    .clone()
                    .unwrap_or_else(|| format!("{default_prefix}{name}"));
                let nested_path = format!("{path}.{key}");
                check_depth(env, &nested_path, depth + 1)?;
                let association = lookup_association(scope, name)?;
                if association.cardinality == Cardinality::ToMany {
                    return Err(Error::NotSupported(format!(
                        "the to-many expansion '{nested_path}' inside a to-many expansion"
                    )));
                }
                let target = relationships::translate_association_join(
                    env,
                    state,
                    scope,
                    name,
                    association,
                    JoinKind::Left,
                )?;
                let (fields, nested) =
                    translate_record(env, state, &target, expand, "", &nested_path, depth + 1)?;
                record.push((key.clone(), sql::ast::Expression::JsonBuildObject(fields)));
                expansions.push(Expansion {
                    name: key,
                    path: nested_path,
                    kind: ExpansionKind::ToOne,
                    nested,
                });
            }
            Column::Inline {
                association,
                inline,
            } => {
                let name = association_name(association)?;
                check_depth(env, &format!("{path}.{name}"), depth + 1)?;
                let association = lookup_association(scope, name)?;
                if association.cardinality == Cardinality::ToMany {
                    return Err(Error::NotSupported(format!(
                        "inlining the to-many association '{name}'"
                    )));
                }
                let target = relationships::translate_association_join(
                    env,
                    state,
                    scope,
                    name,
                    association,
                    JoinKind::Left,
                )?;
                let (fields, nested) = translate_record(
                    env,
                    state,
                    &target,
                    inline,
                    &format!("{default_prefix}{name}_"),
                    path,
                    depth + 1,
                )?;
                record.extend(fields);
                expansions.extend(nested);
            }
        }
    }

    Ok((record, expansions))
}

/// `COALESCE(JSON_AGG(JSON_BUILD_OBJECT(...)) FILTER (WHERE <marker> IS NOT NULL), '[]')`
///
/// Parents without children still get one joined row, full of nulls, which the filter drops.
fn aggregate_records(
    record: Vec<(String, sql::ast::Expression)>,
    marker: sql::ast::Expression,
) -> sql::ast::Expression {
    sql::ast::Expression::FunctionCall {
        function: sql::ast::Function::Coalesce,
        args: vec![
            sql::ast::Expression::FilteredAggregate {
                aggregate: Box::new(sql::ast::Expression::FunctionCall {
                    function: sql::ast::Function::JsonAgg,
                    args: vec![sql::ast::Expression::JsonBuildObject(record)],
                }),
                filter: Box::new(sql::ast::Expression::UnaryOperation {
                    expression: Box::new(marker),
                    operator: sql::ast::UnaryOperator::IsNotNull,
                }),
            },
            sql::ast::Expression::Value(sql::ast::Value::EmptyJsonArray),
        ],
    }
}

/// A column of the child which is never null on a joined row: its key, or the foreign key.
fn child_row_marker(
    target: &TableScope,
    association: &Association,
) -> Result<sql::ast::Expression, Error> {
    match (target.info.and_then(|info| info.keys.first()), &association.condition) {
        (Some(key), _) => Ok(target.column(key)),
        (None, JoinCondition::Managed { foreign_key }) => Ok(target.column(foreign_key)),
        (None, JoinCondition::Unmanaged { .. }) => {
            Err(Error::NoKeyColumns(target.entity_name.clone()))
        }
    }
}

/// The modelled columns of an entity, for `*` inside an expansion.
fn star_elements<'a>(scope: &TableScope<'a>) -> Result<Vec<&'a str>, Error> {
    match scope.info {
        Some(info) if !info.columns.is_empty() => {
            Ok(info.columns.keys().map(String::as_str).collect())
        }
        _ => Err(Error::NotSupported(format!(
            "'*' in an expansion of '{}', which has no column metadata",
            scope.entity_name
        ))),
    }
}

/// Expansions name a single association.
fn association_name(path: &[String]) -> Result<&str, Error> {
    match path {
        [] => Err(Error::EmptyReference),
        [name] => Ok(name.as_str()),
        _ => Err(Error::NotSupported(format!(
            "expanding the path '{}'",
            path.join(".")
        ))),
    }
}

fn lookup_association<'a>(scope: &TableScope<'a>, name: &str) -> Result<&'a Association, Error> {
    scope
        .info
        .and_then(|info| info.lookup_association(name))
        .ok_or_else(|| Error::AssociationNotFound {
            entity: scope.entity_name.clone(),
            association: name.to_string(),
        })
}

fn check_depth(env: &Env, path: &str, depth: u32) -> Result<(), Error> {
    let max_depth = env.settings.max_expand_depth;
    if depth > max_depth {
        Err(Error::ExpansionTooDeep {
            path: path.to_string(),
            max_depth,
        })
    } else {
        Ok(())
    }
}

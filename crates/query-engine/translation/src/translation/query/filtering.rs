//! Handle filtering/where clauses translation.

use query_engine_metadata::metadata::{Cardinality, SELF_PLACEHOLDER};
use query_engine_models::Token;
use query_engine_sql::sql;

use super::relationships;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, JoinKind, PathJoin, State, TableScope};

/// How references in a token sequence are resolved.
pub enum Resolver<'s, 'a> {
    /// No table context: references render as dotted, quoted paths.
    Plain,
    /// References are columns of a table, or paths through its to-one associations.
    Table {
        scope: &'s TableScope<'a>,
        join: JoinKind,
    },
    /// The condition of an unmanaged association. `$self.x` and bare `x` are columns of the
    /// referencing row, `<association>.x` are columns of the target.
    OnCondition {
        association: &'s str,
        parent: &'s TableScope<'a>,
        target: &'s TableScope<'a>,
    },
}

/// Operators which are rendered as they are, upper-cased.
const KNOWN_OPERATORS: &[&str] = &[
    "=", "<>", "<", "<=", ">", ">=", "+", "-", "*", "/", "%", "||", "AND", "OR", "NOT", "IN",
    "NOT IN", "LIKE", "NOT LIKE", "BETWEEN", "NOT BETWEEN", "IS", "IS NOT", "EXISTS",
    "NOT EXISTS",
];

/// Translate a flat token sequence into a boolean expression.
/// An empty sequence is trivially true.
pub fn translate_expression(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    tokens: &[Token],
) -> Result<sql::ast::Expression, Error> {
    let mut expressions = tokens
        .iter()
        .map(|token| translate_token(env, state, resolver, token))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(match expressions.len() {
        0 => sql::helpers::true_expr(),
        1 => expressions.remove(0),
        _ => sql::ast::Expression::Sequence(expressions),
    })
}

/// Translate a single token.
pub fn translate_token(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    token: &Token,
) -> Result<sql::ast::Expression, Error> {
    match token {
        Token::Operator(operator) => translate_operator(operator),
        Token::Reference { path } => translate_reference(env, state, resolver, path),
        Token::Literal { val } => Ok(translate_literal(val)),
        Token::Function { func, args } => translate_function(env, state, resolver, func, args),
        Token::Expression { xpr } => {
            if xpr.is_empty() {
                return Err(Error::NotSupported("empty sub-expressions".to_string()));
            }
            Ok(sql::ast::Expression::Nested(Box::new(translate_expression(
                env, state, resolver, xpr,
            )?)))
        }
        Token::List { list } => Ok(sql::ast::Expression::List(
            list.iter()
                .map(|token| translate_token(env, state, resolver, token))
                .collect::<Result<Vec<_>, Error>>()?,
        )),
    }
}

/// Unrecognized function names end up in the SQL text verbatim, so they must be plain,
/// possibly dotted, identifiers.
fn is_function_name(name: &str) -> bool {
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Literals are bound as parameters, except `null`.
pub fn translate_literal(value: &serde_json::Value) -> sql::ast::Expression {
    match value {
        serde_json::Value::Null => sql::ast::Expression::Value(sql::ast::Value::Null),
        value => sql::ast::Expression::Value(sql::ast::Value::Param(value.clone())),
    }
}

/// Operators end up in the SQL text verbatim, so only a fixed alphabet is accepted.
fn translate_operator(operator: &str) -> Result<sql::ast::Expression, Error> {
    let trimmed = operator.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ' || "=<>!|+-*/%".contains(c));
    if !valid {
        return Err(Error::InvalidOperator(operator.to_string()));
    }

    let normalized = match trimmed {
        "==" => "=".to_string(),
        "!=" => "<>".to_string(),
        other => other
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase(),
    };
    if !KNOWN_OPERATORS.contains(&normalized.as_str()) {
        tracing::warn!(operator = normalized, "unrecognized operator, passing it through");
    }
    Ok(sql::ast::Expression::Operator(normalized))
}

/// Translate a column reference, joining associations on the way when it is a path.
pub fn translate_reference(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    path: &[String],
) -> Result<sql::ast::Expression, Error> {
    if path.is_empty() {
        return Err(Error::EmptyReference);
    }
    match resolver {
        Resolver::Plain => Ok(plain_reference(path)),
        Resolver::Table { scope, join } => {
            let path = scope.strip_own_alias(path);
            match path {
                [column] => Ok(scope.column(column)),
                _ if scope.info.is_none() => Ok(plain_reference(path)),
                [associations @ .., leaf] => {
                    let target = resolve_path(env, state, scope, associations, *join)?;
                    Ok(target.column(leaf))
                }
                [] => Err(Error::EmptyReference),
            }
        }
        Resolver::OnCondition {
            association,
            parent,
            target,
        } => match path {
            [column] => Ok(parent.column(column)),
            [head, column] if head == SELF_PLACEHOLDER => Ok(parent.column(column)),
            [head, column] if head == association => Ok(target.column(column)),
            [head, ..] if head == SELF_PLACEHOLDER || head == association => {
                Err(Error::NotSupported(format!(
                    "the reference '{}' in a join condition",
                    path.join(".")
                )))
            }
            [head, ..] => Err(Error::AssociationNotFound {
                entity: parent.entity_name.clone(),
                association: head.clone(),
            }),
            [] => Err(Error::EmptyReference),
        },
    }
}

/// A dotted path, each segment quoted on its own.
fn plain_reference(path: &[String]) -> sql::ast::Expression {
    let segments: Vec<sql::ast::ColumnName> = path
        .iter()
        .map(|segment| sql::ast::ColumnName(segment.clone()))
        .collect();
    match segments.as_slice() {
        [column] => sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::Column(
            column.clone(),
        )),
        _ => sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::Path(segments)),
    }
}

/// Walk a path of to-one associations from a table, joining each one once per join kind.
pub fn resolve_path<'a>(
    env: &Env<'a>,
    state: &mut State,
    scope: &TableScope<'a>,
    associations: &[String],
    kind: JoinKind,
) -> Result<TableScope<'a>, Error> {
    let max_depth = env.settings.max_expand_depth;
    if associations.len() > max_depth as usize {
        return Err(Error::ExpansionTooDeep {
            path: associations.join("."),
            max_depth,
        });
    }
    if scope.reference.is_none() {
        return Err(Error::NotSupported(format!(
            "the path '{}' outside of a query",
            associations.join(".")
        )));
    }

    let mut current = scope.clone();
    for name in associations {
        let association = current
            .info
            .and_then(|info| info.lookup_association(name))
            .ok_or_else(|| Error::AssociationNotFound {
                entity: current.entity_name.clone(),
                association: name.clone(),
            })?;
        if association.cardinality == Cardinality::ToMany {
            return Err(Error::ToManyPathNotSupported(name.clone()));
        }

        let parent_alias = current.alias_name().unwrap_or_default();
        current = match state.lookup_path_join(&parent_alias, name, kind) {
            Some(PathJoin { alias, entity }) => {
                let (alias, entity) = (alias.clone(), entity.clone());
                TableScope::aliased(&entity, Some(env.lookup_entity(&entity)?), alias)
            }
            None => {
                let target = relationships::translate_association_join(
                    env,
                    state,
                    &current,
                    name,
                    association,
                    kind,
                )?;
                if let Some(sql::ast::TableReference::AliasedTable(alias)) = &target.reference {
                    state.insert_path_join(
                        &parent_alias,
                        name,
                        kind,
                        PathJoin {
                            alias: alias.clone(),
                            entity: target.entity_name.clone(),
                        },
                    );
                }
                target
            }
        };
    }
    Ok(current)
}

/// Translate a function call. Pattern functions become a `LIKE`, a few others map to their
/// SQL names, and anything else is passed through upper-cased.
pub fn translate_function(
    env: &Env,
    state: &mut State,
    resolver: &Resolver,
    func: &str,
    args: &[Token],
) -> Result<sql::ast::Expression, Error> {
    let name = func.to_ascii_lowercase();
    match name.as_str() {
        "contains" | "startswith" | "endswith" => {
            let [target, pattern] = args else {
                return Err(Error::MissingFunctionArguments {
                    function: func.to_string(),
                    expected: 2,
                    got: args.len(),
                });
            };
            let target = translate_token(env, state, resolver, target)?;
            let pattern = match pattern {
                Token::Literal {
                    val: serde_json::Value::String(value),
                } => sql::ast::Expression::Value(sql::ast::Value::String(like_pattern(
                    &name,
                    &escape_like(value),
                ))),
                other => {
                    let value = translate_token(env, state, resolver, other)?;
                    let percent = || {
                        sql::ast::Expression::Value(sql::ast::Value::Character("%".to_string()))
                    };
                    let args = match name.as_str() {
                        "startswith" => vec![value, percent()],
                        "endswith" => vec![percent(), value],
                        _ => vec![percent(), value, percent()],
                    };
                    sql::ast::Expression::FunctionCall {
                        function: sql::ast::Function::Concat,
                        args,
                    }
                }
            };
            Ok(sql::ast::Expression::BinaryOperation {
                left: Box::new(target),
                operator: sql::ast::BinaryOperator::Like,
                right: Box::new(sql::ast::Expression::Sequence(vec![
                    pattern,
                    sql::ast::Expression::Operator("ESCAPE".to_string()),
                    sql::ast::Expression::Value(sql::ast::Value::Character("\\".to_string())),
                ])),
            })
        }
        "count" => match args {
            [] => Ok(sql::ast::Expression::Count(sql::ast::CountType::Star)),
            [arg] => Ok(sql::ast::Expression::Count(sql::ast::CountType::Simple(
                Box::new(translate_token(env, state, resolver, arg)?),
            ))),
            _ => Err(Error::MissingFunctionArguments {
                function: func.to_string(),
                expected: 1,
                got: args.len(),
            }),
        },
        _ => {
            let (function, arity) = match name.as_str() {
                "tolower" | "lower" => (sql::ast::Function::Lower, Some(1)),
                "toupper" | "upper" => (sql::ast::Function::Upper, Some(1)),
                "length" => (sql::ast::Function::Length, Some(1)),
                "trim" => (sql::ast::Function::Trim, Some(1)),
                "now" => (sql::ast::Function::Now, Some(0)),
                "concat" => (sql::ast::Function::Concat, None),
                "coalesce" => (sql::ast::Function::Coalesce, None),
                _ => {
                    if !is_function_name(func) {
                        return Err(Error::InvalidFunctionName(func.to_string()));
                    }
                    tracing::warn!(function = func, "unrecognized function, passing it through");
                    (sql::ast::Function::Unknown(func.to_ascii_uppercase()), None)
                }
            };
            if let Some(expected) = arity {
                if args.len() != expected {
                    return Err(Error::MissingFunctionArguments {
                        function: func.to_string(),
                        expected,
                        got: args.len(),
                    });
                }
            }
            let args = args
                .iter()
                .map(|arg| translate_token(env, state, resolver, arg))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(sql::ast::Expression::FunctionCall { function, args })
        }
    }
}

/// Escape the wildcards of a like pattern, and the escape character itself.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn like_pattern(function: &str, escaped: &str) -> String {
    match function {
        "startswith" => format!("{escaped}%"),
        "endswith" => format!("%{escaped}"),
        _ => format!("%{escaped}%"),
    }
}

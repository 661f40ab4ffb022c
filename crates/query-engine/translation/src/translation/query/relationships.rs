//! Joining the target of an association.

use query_engine_metadata::metadata::{Association, Cardinality, JoinCondition};
use query_engine_sql::sql;

use super::filtering::{self, Resolver};
use crate::translation::decorators::temporal;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, JoinKind, State, TableScope};

/// Join the target of an association to a table, and return the target as a new table scope.
///
/// The join gets the next alias of the statement, so joins are numbered in the order they are
/// made. Temporal targets only join the time slices the statement reads.
pub fn translate_association_join<'a>(
    env: &Env<'a>,
    state: &mut State,
    parent: &TableScope<'a>,
    name: &str,
    association: &Association,
    kind: JoinKind,
) -> Result<TableScope<'a>, Error> {
    let target_info = env.lookup_entity(&association.target)?;
    let alias = state.make_join_alias(name);
    let target = TableScope::aliased(&association.target, Some(target_info), alias.clone());

    let on = match &association.condition {
        JoinCondition::Managed { foreign_key } => match association.cardinality {
            Cardinality::ToOne => {
                let key = target.single_key().ok_or_else(|| Error::ManagedAssociationKeys {
                    entity: association.target.clone(),
                    association: name.to_string(),
                })?;
                sql::helpers::equals(parent.column(foreign_key), target.column(key))
            }
            Cardinality::ToMany => {
                let key = parent.single_key().ok_or_else(|| Error::ManagedAssociationKeys {
                    entity: parent.entity_name.clone(),
                    association: name.to_string(),
                })?;
                sql::helpers::equals(target.column(foreign_key), parent.column(key))
            }
        },
        JoinCondition::Unmanaged { on } => filtering::translate_expression(
            env,
            state,
            &Resolver::OnCondition {
                association: name,
                parent,
                target: &target,
            },
            on,
        )?,
    };

    let predicate = target_info.temporal.as_ref().and_then(|descriptor| {
        temporal::temporal_predicate(target.reference.as_ref(), descriptor, &env.temporal)
    });
    let on = match (predicate, &association.condition) {
        (None, _) => on,
        (Some(predicate), JoinCondition::Managed { .. }) => sql::helpers::and(on, predicate),
        // the caller's condition may contain an OR
        (Some(predicate), JoinCondition::Unmanaged { .. }) => {
            sql::helpers::and_nested(on, predicate)
        }
    };

    let table = env.table_reference(&target_info.table_name);
    state.push_join(match kind {
        JoinKind::Left => {
            sql::ast::Join::LeftOuterJoin(sql::ast::LeftOuterJoin { table, alias, on })
        }
        JoinKind::Inner => sql::ast::Join::InnerJoin(sql::ast::InnerJoin { table, alias, on }),
    });

    Ok(target)
}

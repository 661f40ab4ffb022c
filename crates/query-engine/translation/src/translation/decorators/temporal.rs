//! Restrict time-sliced entities to the slices a statement reads.

use query_engine_metadata::metadata::TemporalDescriptor;
use query_engine_models::TemporalMode;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::Env;

/// The predicate selecting the requested slices of a table, if any.
/// Slices are valid in the half-open interval `[from, to)`.
pub fn temporal_predicate(
    table: Option<&sql::ast::TableReference>,
    descriptor: &TemporalDescriptor,
    mode: &TemporalMode,
) -> Option<sql::ast::Expression> {
    let column = |name: &str| {
        let name = sql::ast::ColumnName(name.to_string());
        match table {
            Some(table) => sql::helpers::make_column(table.clone(), name),
            None => sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::Column(name)),
        }
    };
    let from = column(&descriptor.from);
    let to = column(&descriptor.to);

    let within = |instant: sql::ast::Expression| {
        sql::helpers::and(
            compare(from.clone(), sql::ast::BinaryOperator::LessThanOrEqualTo, instant.clone()),
            compare(instant, sql::ast::BinaryOperator::LessThan, to.clone()),
        )
    };

    match mode {
        TemporalMode::AsOfNow => Some(within(sql::ast::Expression::FunctionCall {
            function: sql::ast::Function::Now,
            args: vec![],
        })),
        TemporalMode::AsOf { at } => Some(within(sql::ast::Expression::Value(
            sql::ast::Value::Param(at.clone()),
        ))),
        TemporalMode::Overlaps { start, end } => Some(sql::helpers::and(
            compare(
                to.clone(),
                sql::ast::BinaryOperator::GreaterThan,
                sql::ast::Expression::Value(sql::ast::Value::Param(start.clone())),
            ),
            compare(
                from.clone(),
                sql::ast::BinaryOperator::LessThan,
                sql::ast::Expression::Value(sql::ast::Value::Param(end.clone())),
            ),
        )),
        TemporalMode::Unrestricted => None,
    }
}

/// Add the temporal predicate to an existing one. The existing predicate is parenthesized.
pub fn decorate(
    base: sql::ast::Expression,
    table: Option<&sql::ast::TableReference>,
    descriptor: &TemporalDescriptor,
    mode: &TemporalMode,
) -> sql::ast::Expression {
    match temporal_predicate(table, descriptor, mode) {
        Some(predicate) => sql::helpers::and_nested(base, predicate),
        None => base,
    }
}

/// `CREATE VIEW current_<table> AS SELECT * FROM <table> WHERE <valid now>`
pub fn current_view_ddl(env: &Env, entity: &str) -> Result<sql::string::DDL, Error> {
    let info = env.lookup_entity(entity)?;
    let descriptor = info.temporal.as_ref().ok_or_else(|| {
        Error::NotSupported(format!("a current view of '{entity}', which is not temporal"))
    })?;

    let mut select = sql::helpers::simple_select(vec![sql::ast::SelectItem::Star(None)]);
    select.from = Some(sql::ast::From::Table {
        reference: env.table_reference(&info.table_name),
        alias: sql::helpers::make_table_alias(
            0,
            sql::identifier::unquote(&table_segment(&info.table_name)),
        ),
    });
    select.where_ = sql::ast::Where(decorate(
        sql::helpers::true_expr(),
        None,
        descriptor,
        &TemporalMode::AsOfNow,
    ));

    let view = sql::ast::CreateView {
        name: env.derived_table_reference(&info.table_name, "current_", ""),
        select: Box::new(select),
    };
    let mut sql = sql::string::SQL::with_placeholder(env.settings.placeholder);
    view.to_sql(&mut sql);
    Ok(sql::string::DDL(sql))
}

/// The last segment of a possibly qualified table name.
fn table_segment(table_name: &str) -> String {
    sql::identifier::split_qualified(table_name)
        .pop()
        .unwrap_or_default()
}

fn compare(
    left: sql::ast::Expression,
    operator: sql::ast::BinaryOperator,
    right: sql::ast::Expression,
) -> sql::ast::Expression {
    sql::ast::Expression::BinaryOperation {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

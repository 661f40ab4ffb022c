//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// An empty `GROUP BY` clause.
pub fn empty_group_by() -> GroupBy {
    GroupBy { elements: vec![] }
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// Conjunction of two expressions, dropping trivially true sides.
pub fn and(left: Expression, right: Expression) -> Expression {
    if left == true_expr() {
        right
    } else if right == true_expr() {
        left
    } else {
        Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Conjunction of an expression the caller wrote with one we generated.
/// The caller's expression is parenthesized since we cannot know its precedence.
pub fn and_nested(existing: Expression, generated: Expression) -> Expression {
    if existing == true_expr() {
        generated
    } else {
        and(Expression::Nested(Box::new(existing)), generated)
    }
}

/// A binary equality.
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator::Equals,
        right: Box::new(right),
    }
}

// Aliasing //

/// Generate a column expression refering to a specific table.
pub fn make_column(table: TableReference, name: ColumnName) -> Expression {
    Expression::ColumnReference(ColumnReference::TableColumn { table, name })
}

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Create table aliases using this function so we build everything in one place.
/// An index of zero means the name is used as is.
pub fn make_table_alias(unique_index: u64, name: String) -> TableAlias {
    TableAlias { unique_index, name }
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<SelectItem>) -> Select {
    Select {
        distinct: false,
        select_list: SelectList(select_list),
        from: None,
        joins: vec![],
        where_: Where(empty_where()),
        group_by: empty_group_by(),
        having: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Wrap a select as a subquery and count its rows.
pub fn count_select(inner: Select) -> Select {
    let mut select = simple_select(vec![SelectItem::Expression {
        expression: Expression::Count(CountType::Star),
        alias: Some(make_column_alias("$count".to_string())),
    }]);
    select.from = Some(From::Select {
        select: Box::new(inner),
        alias: make_table_alias(0, "counted".to_string()),
    });
    select
}

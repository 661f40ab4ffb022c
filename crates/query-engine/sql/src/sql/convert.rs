//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::helpers;
use super::string::*;

// Convert to SQL strings

/// Append items separated by a comma.
fn append_comma_separated<T>(sql: &mut SQL, items: &[T], mut append: impl FnMut(&T, &mut SQL)) {
    for (index, item) in items.iter().enumerate() {
        append(item, sql);
        if index < (items.len() - 1) {
            sql.append_syntax(", ");
        }
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");
        if self.distinct {
            sql.append_syntax("DISTINCT ");
        }

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" FROM ");
            from.to_sql(sql);
        }

        for join in &self.joins {
            join.to_sql(sql);
        }

        self.where_.to_sql(sql, " WHERE ");

        self.group_by.to_sql(sql);

        self.having.to_sql(sql, " HAVING ");

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl Insert {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("INSERT INTO ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        append_comma_separated(sql, &self.columns, ColumnName::to_sql);
        sql.append_syntax(")");

        match &self.from {
            InsertFrom::Values(rows) => {
                sql.append_syntax(" VALUES ");
                append_comma_separated(sql, rows, |row, sql| {
                    sql.append_syntax("(");
                    append_comma_separated(sql, row, Expression::to_sql);
                    sql.append_syntax(")");
                });
            }
            InsertFrom::Select(select) => {
                sql.append_syntax(" ");
                select.to_sql(sql);
            }
        }
    }
}

impl Update {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("UPDATE ");
        self.table.to_sql(sql);
        sql.append_syntax(" SET ");
        append_assignments(sql, &self.set);
        self.where_.to_sql(sql, " WHERE ");
    }
}

impl Delete {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("DELETE FROM ");
        self.table.to_sql(sql);
        self.where_.to_sql(sql, " WHERE ");
    }
}

fn append_assignments(sql: &mut SQL, assignments: &[(ColumnName, Expression)]) {
    append_comma_separated(sql, assignments, |(column, expression), sql| {
        column.to_sql(sql);
        sql.append_syntax(" = ");
        expression.to_sql(sql);
    });
}

impl Merge {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("MERGE INTO ");
        self.target.to_sql(sql);
        sql.append_syntax(" AS ");
        self.target_alias.to_sql(sql);

        sql.append_syntax(" USING (SELECT ");
        append_comma_separated(sql, &self.source, |(alias, expression), sql| {
            expression.to_sql(sql);
            sql.append_syntax(" AS ");
            alias.to_sql(sql);
        });
        sql.append_syntax(") AS ");
        self.source_alias.to_sql(sql);

        sql.append_syntax(" ON ");
        self.on.to_sql(sql);

        if let Some(assignments) = &self.when_matched_update {
            sql.append_syntax(" WHEN MATCHED THEN UPDATE SET ");
            append_assignments(sql, assignments);
        }

        let (columns, values) = &self.when_not_matched_insert;
        sql.append_syntax(" WHEN NOT MATCHED THEN INSERT (");
        append_comma_separated(sql, columns, ColumnName::to_sql);
        sql.append_syntax(") VALUES (");
        append_comma_separated(sql, values, Expression::to_sql);
        sql.append_syntax(")");
    }
}

impl CreateTable {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("CREATE TABLE ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        append_comma_separated(sql, &self.columns, |column, sql| {
            column.name.to_sql(sql);
            sql.append_syntax(" ");
            sql.append_syntax(&column.r#type);
            if column.not_null {
                sql.append_syntax(" NOT NULL");
            }
        });
        if !self.primary_key.is_empty() {
            sql.append_syntax(", PRIMARY KEY (");
            append_comma_separated(sql, &self.primary_key, ColumnName::to_sql);
            sql.append_syntax(")");
        }
        sql.append_syntax(")");
    }
}

impl CreateView {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("CREATE VIEW ");
        self.name.to_sql(sql);
        sql.append_syntax(" AS ");
        self.select.to_sql(sql);
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        let SelectList(items) = self;
        append_comma_separated(sql, items, |item, sql| match item {
            SelectItem::Star(None) => sql.append_syntax("*"),
            SelectItem::Star(Some(table)) => {
                table.to_sql(sql);
                sql.append_syntax(".*");
            }
            SelectItem::Expression { expression, alias } => {
                expression.to_sql(sql);
                if let Some(alias) = alias {
                    sql.append_syntax(" AS ");
                    alias.to_sql(sql);
                }
            }
        });
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Select { select, alias } => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        let (keyword, table, alias, on) = match self {
            Join::LeftOuterJoin(LeftOuterJoin { table, alias, on }) => {
                (" LEFT JOIN ", table, alias, on)
            }
            Join::InnerJoin(InnerJoin { table, alias, on }) => (" INNER JOIN ", table, alias, on),
        };
        sql.append_syntax(keyword);
        table.to_sql(sql);
        sql.append_syntax(" AS ");
        alias.to_sql(sql);
        sql.append_syntax(" ON ");
        on.to_sql(sql);
    }
}

impl Where {
    /// Emit the clause with the given keyword, unless it is trivially true.
    pub fn to_sql(&self, sql: &mut SQL, keyword: &str) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(keyword);
            expression.to_sql(sql);
        }
    }
}

impl GroupBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" GROUP BY ");
            append_comma_separated(sql, &self.elements, Expression::to_sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                expression.to_sql(sql);
                operator.to_sql(sql);
            }
            Expression::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(" ");
                    }
                    item.to_sql(sql);
                }
            }
            Expression::Operator(operator) => sql.append_syntax(operator),
            Expression::Nested(expression) => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::List(items) => {
                sql.append_syntax("(");
                append_comma_separated(sql, items, Expression::to_sql);
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                append_comma_separated(sql, args, Expression::to_sql);
                sql.append_syntax(")");
            }
            Expression::FilteredAggregate { aggregate, filter } => {
                aggregate.to_sql(sql);
                sql.append_syntax(" FILTER (WHERE ");
                filter.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::JsonBuildObject(fields) => {
                sql.append_syntax("JSON_BUILD_OBJECT(");
                append_comma_separated(sql, fields, |(label, item), sql| {
                    sql.append_string_literal(label);
                    sql.append_syntax(", ");
                    item.to_sql(sql);
                });
                sql.append_syntax(")");
            }
            Expression::Count(count_type) => {
                sql.append_syntax("COUNT(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Raw(text) => sql.append_syntax(text),
        }
    }
}

impl UnaryOperator {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            UnaryOperator::IsNull => sql.append_syntax(" IS NULL"),
            UnaryOperator::IsNotNull => sql.append_syntax(" IS NOT NULL"),
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
            BinaryOperator::LessThan => sql.append_syntax(" < "),
            BinaryOperator::LessThanOrEqualTo => sql.append_syntax(" <= "),
            BinaryOperator::GreaterThan => sql.append_syntax(" > "),
            BinaryOperator::Like => sql.append_syntax(" LIKE "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Function::Coalesce => sql.append_syntax("COALESCE"),
            Function::Concat => sql.append_syntax("CONCAT"),
            Function::JsonAgg => sql.append_syntax("JSON_AGG"),
            Function::Lower => sql.append_syntax("LOWER"),
            Function::Upper => sql.append_syntax("UPPER"),
            Function::Length => sql.append_syntax("LENGTH"),
            Function::Trim => sql.append_syntax("TRIM"),
            Function::Now => sql.append_syntax("NOW"),
            Function::Unknown(name) => sql.append_syntax(name),
        }
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("*"),
            CountType::Simple(expression) => expression.to_sql(sql),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Null => sql.append_syntax("NULL"),
            Value::Bool(true) => sql.append_syntax("TRUE"),
            Value::Bool(false) => sql.append_syntax("FALSE"),
            Value::Param(value) => sql.append_param(Param::Value(value.clone())),
            Value::String(s) => sql.append_param(Param::String(s.clone())),
            Value::Character(s) => sql.append_string_literal(s),
            Value::EmptyJsonArray => sql.append_syntax("'[]'"),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        if let Some(limit) = self.limit {
            sql.append_syntax(" LIMIT ");
            sql.append_syntax(&limit.to_string());
        }
        if let Some(offset) = self.offset {
            sql.append_syntax(" OFFSET ");
            sql.append_syntax(&offset.to_string());
        }
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable {
                catalog,
                schema,
                table,
            } => {
                if let Some(SchemaName(schema)) = schema {
                    if let Some(CatalogName(catalog)) = catalog {
                        sql.append_identifier(catalog);
                        sql.append_syntax(".");
                    }
                    sql.append_identifier(schema);
                    sql.append_syntax(".");
                }
                let TableName(table) = table;
                sql.append_identifier(table);
            }
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        };
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.to_string());
    }
}

impl std::fmt::Display for TableAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.unique_index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}_{}", self.name, self.unique_index)
        }
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ColumnName(name) = self;
        sql.append_identifier(name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
            ColumnReference::Column(name) => name.to_sql(sql),
            ColumnReference::Path(segments) => {
                for (index, segment) in segments.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(".");
                    }
                    segment.to_sql(sql);
                }
            }
        }
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            append_comma_separated(sql, &self.elements, OrderByElement::to_sql);
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        match self.direction {
            None => {}
            Some(OrderByDirection::Asc) => sql.append_syntax(" ASC"),
            Some(OrderByDirection::Desc) => sql.append_syntax(" DESC"),
        }
        match self.nulls {
            None => {}
            Some(NullsOrder::First) => sql.append_syntax(" NULLS FIRST"),
            Some(NullsOrder::Last) => sql.append_syntax(" NULLS LAST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(expression: &Expression) -> SQL {
        let mut sql = SQL::new();
        expression.to_sql(&mut sql);
        sql
    }

    #[test]
    fn counts_wrap_any_expression() {
        let star = Expression::Count(CountType::Star);
        insta::assert_snapshot!(render(&star).sql, @"COUNT(*)");

        let price = ColumnReference::Column(ColumnName("price".to_string()));
        let column = Expression::Count(CountType::Simple(Box::new(
            Expression::ColumnReference(price),
        )));
        insta::assert_snapshot!(render(&column).sql, @r#"COUNT("price")"#);

        let literal = Expression::Count(CountType::Simple(Box::new(Expression::Value(
            Value::Param(serde_json::json!(1.5)),
        ))));
        let sql = render(&literal);
        insta::assert_snapshot!(sql.sql, @"COUNT(?)");
        assert_eq!(sql.params.len(), 1);
    }
}

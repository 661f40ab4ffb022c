//! Type definitions of a SQL AST representation.

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub select_list: SelectList,
    pub from: Option<From>,
    pub joins: Vec<Join>,
    pub where_: Where,
    pub group_by: GroupBy,
    pub having: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// An INSERT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableReference,
    pub columns: Vec<ColumnName>,
    pub from: InsertFrom,
}

/// Source from which values would be inserted.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertFrom {
    Values(Vec<Vec<Expression>>),
    Select(Box<Select>),
}

/// A DELETE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: TableReference,
    pub where_: Where,
}

/// An UPDATE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableReference,
    pub set: Vec<(ColumnName, Expression)>,
    pub where_: Where,
}

/// A MERGE statement of a single synthetic source row into a target table.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub target: TableReference,
    pub target_alias: TableAlias,
    /// The source row, one aliased expression per column.
    pub source: Vec<(ColumnAlias, Expression)>,
    pub source_alias: TableAlias,
    pub on: Expression,
    /// Omitted entirely when there is nothing to update.
    pub when_matched_update: Option<Vec<(ColumnName, Expression)>>,
    pub when_not_matched_insert: (Vec<ColumnName>, Vec<Expression>),
}

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: TableReference,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<ColumnName>,
}

/// A column in a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: ColumnName,
    /// The SQL type, emitted verbatim.
    pub r#type: String,
    pub not_null: bool,
}

/// A CREATE VIEW statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub name: TableReference,
    pub select: Box<Select>,
}

/// A single item of a select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*` or `table.*`
    Star(Option<TableReference>),
    /// An expression, optionally aliased
    Expression {
        expression: Expression,
        alias: Option<ColumnAlias>,
    },
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectList(pub Vec<SelectItem>);

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    /// Select from a table reference
    Table {
        reference: TableReference,
        alias: TableAlias,
    },
    /// Select from a subquery
    Select {
        select: Box<Select>,
        alias: TableAlias,
    },
}

/// A JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// LEFT OUTER JOIN
    LeftOuterJoin(LeftOuterJoin),
    /// INNER JOIN
    InnerJoin(InnerJoin),
}

impl Join {
    /// Get the joined table alias regardless of the join type.
    pub fn alias(&self) -> &TableAlias {
        match self {
            Join::LeftOuterJoin(LeftOuterJoin { alias, .. })
            | Join::InnerJoin(InnerJoin { alias, .. }) => alias,
        }
    }
}

/// A LEFT OUTER JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct LeftOuterJoin {
    pub table: TableReference,
    pub alias: TableAlias,
    pub on: Expression,
}

/// An INNER JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct InnerJoin {
    pub table: TableReference,
    pub alias: TableAlias,
    pub on: Expression,
}

/// A WHERE (or HAVING) clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// A GROUP BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub elements: Vec<Expression>,
}

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: Option<OrderByDirection>,
    pub nulls: Option<NullsOrder>,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// Explicit placement of nulls in an ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// LIMIT and OFFSET clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `left AND right`, without surrounding parentheses
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// An unary operation on a scalar expression
    UnaryOperation {
        expression: Box<Expression>,
        operator: UnaryOperator,
    },
    /// A flat, space separated run of expressions and operators, as written by the caller.
    Sequence(Vec<Expression>),
    /// An operator keyword inside a `Sequence`. Emitted verbatim.
    Operator(String),
    /// A parenthesized expression
    Nested(Box<Expression>),
    /// A parenthesized, comma separated list
    List(Vec<Expression>),
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// An aggregate restricted by `FILTER (WHERE ...)`
    FilteredAggregate {
        aggregate: Box<Expression>,
        filter: Box<Expression>,
    },
    /// A json_build_object function call
    JsonBuildObject(Vec<(String, Expression)>),
    /// A column reference
    ColumnReference(ColumnReference),
    /// An irreducible value
    Value(Value),
    /// A COUNT clause
    Count(CountType),
    /// Trusted SQL text from configuration, emitted verbatim.
    Raw(String),
}

/// An unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    IsNull,
    IsNotNull,
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    Like,
}

/// A scalar function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Coalesce,
    Concat,
    JsonAgg,
    Lower,
    Upper,
    Length,
    Trim,
    Now,
    Unknown(String),
}

/// COUNT clause
#[derive(Debug, Clone, PartialEq)]
pub enum CountType {
    Star,
    Simple(Box<Expression>),
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `NULL`, never bound as a parameter.
    Null,
    /// `TRUE` or `FALSE`.
    Bool(bool),
    /// A value supplied by the caller. Always bound as a parameter.
    Param(serde_json::Value),
    /// A string produced by the translation, such as a like pattern. Always bound as a parameter.
    String(String),
    /// A string literal produced by the translation and emitted inline, quoted.
    /// Never use this for caller supplied values.
    Character(String),
    EmptyJsonArray,
}

/// A database catalog name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogName(pub String);

/// A database schema name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(pub String);

/// A database table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// A reference to a table. Used when we want to query it,
/// for example in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableReference {
    /// refers to a db table object name
    DBTable {
        catalog: Option<CatalogName>,
        schema: Option<SchemaName>,
        table: TableName,
    },
    /// refers to an alias we created
    AliasedTable(TableAlias),
}

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column. Used when we want to query it,
/// for example in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnReference {
    /// A column of a table
    TableColumn {
        table: TableReference,
        name: ColumnName,
    },
    /// A column without a table qualifier
    Column(ColumnName),
    /// A dotted path we could not resolve against metadata, emitted segment by segment
    Path(Vec<ColumnName>),
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub unique_index: u64,
    pub name: String,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}

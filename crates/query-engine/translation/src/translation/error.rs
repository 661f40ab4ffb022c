//! Errors for translation.

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Entity '{0}' not found.")]
    EntityNotFound(String),
    #[error("Association '{association}' not found in entity '{entity}'.")]
    AssociationNotFound { entity: String, association: String },
    #[error("A reference must have at least one path segment.")]
    EmptyReference,
    #[error("Function '{function}' expects {expected} argument(s), got {got}.")]
    MissingFunctionArguments {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("Invalid operator '{0}'.")]
    InvalidOperator(String),
    #[error("Invalid function name '{0}'.")]
    InvalidFunctionName(String),
    #[error(
        "Record {index} of the insert into '{entity}' has columns {got:?}, expected {expected:?}."
    )]
    MismatchedRecordKeys {
        entity: String,
        index: usize,
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("Nothing to insert into '{0}'.")]
    EmptyInsert(String),
    #[error("Row {index} of the insert into '{entity}' has {got} value(s), expected {expected}.")]
    ValuesLengthMismatch {
        entity: String,
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("Nothing to update in '{0}'.")]
    EmptyUpdate(String),
    #[error("No key columns given for '{0}'.")]
    NoKeyColumns(String),
    #[error("Key column '{column}' of '{entity}' is missing from the record.")]
    KeyColumnNotInRecord { entity: String, column: String },
    #[error("Expanding '{path}' exceeds the maximum expansion depth of {max_depth}.")]
    ExpansionTooDeep { path: String, max_depth: u32 },
    #[error("Managed association '{association}' needs exactly one key column in '{entity}'.")]
    ManagedAssociationKeys { entity: String, association: String },
    #[error("Path expressions cannot navigate through to-many association '{0}'.")]
    ToManyPathNotSupported(String),
    #[error("Queries containing {0} are not supported.")]
    NotSupported(String),
    #[error("Entity '{0}' has no localized columns.")]
    NotLocalized(String),
}

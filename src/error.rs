use crate::data_type::DataType;

pub type TableResult<T> = Result<T, Error>;

/// Errors surfaced by table operations.
///
/// Positions are 1-based and refer to the argument list of the failing
/// operation (sort key number, input table number).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{operation}: {subject} has incorrect size ({actual}), expecting {expected}")]
    SizeMismatch {
        operation: &'static str,
        subject: String,
        expected: usize,
        actual: usize,
    },

    #[error("{operation}: {subject} has unsupported type '{data_type}'")]
    UnsupportedType {
        operation: &'static str,
        subject: String,
        data_type: DataType,
    },

    #[error(
        "incompatible type (data index: {position}, column: '{column}', was collecting: {collecting}, incompatible with data of type: {incoming})"
    )]
    IncompatibleTypes {
        position: usize,
        column: String,
        collecting: String,
        incoming: DataType,
    },

    #[error("incompatible number of rows for table {position} ({actual}), expecting {expected}")]
    RowCountMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{operation}: argument {position} is a {found}, expected a table")]
    TypeMismatch {
        operation: &'static str,
        position: usize,
        found: &'static str,
    },

    #[error("value {value} does not fit column '{column}' of type {data_type}")]
    ValueType {
        column: String,
        data_type: DataType,
        value: String,
    },

    #[error("row index {index} out of range for column of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("duplicate column: {name}")]
    DuplicateColumn { name: String },

    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("invalid grouping: {0}")]
    InvalidGrouping(String),

    #[error("{operation}: interrupted before input {position}")]
    Interrupted {
        operation: &'static str,
        position: usize,
    },
}

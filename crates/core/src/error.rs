//! Error types for notekeep.

use crate::row::RowId;
use crate::types::DataType;
use alloc::string::String;
use core::fmt;

/// Result type alias for notekeep operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for store and cache operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Type mismatch error.
    TypeMismatch {
        column: String,
        expected: DataType,
        got: DataType,
    },
    /// Row not found.
    NotFound {
        table: String,
        row_id: RowId,
    },
    /// Invalid schema definition.
    InvalidSchema {
        message: String,
    },
    /// Column not found.
    ColumnNotFound {
        table: String,
        column: String,
    },
    /// Table not found.
    TableNotFound {
        name: String,
    },
    /// Table already exists.
    TableExists {
        name: String,
    },
    /// The operation is not allowed while a write transaction is open.
    InTransaction {
        operation: String,
    },
    /// The operation requires an open write transaction.
    NoTransaction {
        operation: String,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch {
                column,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Type mismatch on column {}: expected {:?}, got {:?}",
                    column, expected, got
                )
            }
            Error::NotFound { table, row_id } => {
                write!(f, "Row {} not found in table {}", row_id, table)
            }
            Error::InvalidSchema { message } => {
                write!(f, "Invalid schema: {}", message)
            }
            Error::ColumnNotFound { table, column } => {
                write!(f, "Column {} not found in table {}", column, table)
            }
            Error::TableNotFound { name } => {
                write!(f, "Table not found: {}", name)
            }
            Error::TableExists { name } => {
                write!(f, "Table already exists: {}", name)
            }
            Error::InTransaction { operation } => {
                write!(f, "Cannot {} inside a write transaction", operation)
            }
            Error::NoTransaction { operation } => {
                write!(f, "Cannot {} outside a write transaction", operation)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(column: impl Into<String>, expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got,
        }
    }

    /// Creates a not found error.
    pub fn not_found(table: impl Into<String>, row_id: RowId) -> Self {
        Error::NotFound {
            table: table.into(),
            row_id,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates a table exists error.
    pub fn table_exists(name: impl Into<String>) -> Self {
        Error::TableExists { name: name.into() }
    }

    /// Creates an error for an operation rejected inside a write transaction.
    pub fn in_transaction(operation: impl Into<String>) -> Self {
        Error::InTransaction {
            operation: operation.into(),
        }
    }

    /// Creates an error for an operation that needs a write transaction.
    pub fn no_transaction(operation: impl Into<String>) -> Self {
        Error::NoTransaction {
            operation: operation.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}

//! notekeep Core - Row, value and schema types shared by the notekeep crates.
//!
//! This crate provides the foundational types for the notekeep note store and
//! its reactive collection cache:
//!
//! - `DataType`: Supported column types (Boolean, Int64, Float64, String, DateTime)
//! - `Value`: Runtime values stored in a row
//! - `Row`: A row of values with a stable, never-reused identifier
//! - `schema`: Table and column definitions
//! - `Error`: Error types for store and cache operations
//!
//! # Example
//!
//! ```rust
//! use notekeep_core::{DataType, Value, Row};
//! use notekeep_core::schema::TableBuilder;
//!
//! let notes = TableBuilder::new("notes")
//!     .unwrap()
//!     .add_column("title", DataType::String)
//!     .unwrap()
//!     .add_column("pinned", DataType::Boolean)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let row = Row::new(1, vec![Value::String("Groceries".into()), Value::Boolean(false)]);
//!
//! assert_eq!(notes.column_index("pinned"), Some(1));
//! assert_eq!(row.id(), 1);
//! assert_eq!(row.get(0), Some(&Value::String("Groceries".into())));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::{next_row_id, set_next_row_id_if_greater, Row, RowId, DUMMY_ROW_ID};
pub use types::DataType;
pub use value::Value;

//! Schema module for notekeep.
//!
//! Table and column definitions used by the store to validate rows and to
//! resolve sort keys by column name.

mod column;
mod table;

pub use column::Column;
pub use table::{Table, TableBuilder};

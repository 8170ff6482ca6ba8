//! Relational model of an installer package under construction.
//!
//! An [`Output`] owns named [`Table`]s; each table holds [`Row`]s whose
//! [`Field`]s track their current and previous values. Typed views in
//! [`views`] give named access to the standard tables listed in
//! [`definitions`].

pub mod definitions;
mod index;
mod output;
mod row;
mod storage;
mod types;
pub mod views;

pub use index::{RowIndex, RowKey};
pub use output::{Output, OutputKind, SubStorage};
pub use row::{Field, Row, RowOperation};
pub use storage::{RowMut, RowRef, Table, TableOperation};
pub use types::{ColumnDefinition, ColumnType, SchemaError, TableDefinition, Value};

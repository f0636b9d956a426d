//! Storage backends for table data.
//!
//! Expression evaluation (`WHERE`, projection) is the executor's job; a
//! backend only ever deals in whole rows, indices into its own current row
//! order, and schema-level mutation.

mod in_memory;
mod on_disk;

pub use in_memory::InMemoryStorage;
pub use on_disk::OnDiskStorage;

use crate::ast::{
    AlterTableStatement, ColumnDef, CreateTableStatement, InsertStatement, TableOptions,
    UpdateAssignment,
};
use crate::ast::Value;
use crate::error::{EngineError, EngineResult};

/// One row of column values, ordered to match [`Schema::columns`].
pub type Row = Vec<Value>;

/// A table's structural definition.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    /// Table name.
    pub name: String,
    /// Column definitions in declared order.
    pub columns: Vec<ColumnDef>,
    /// Table-level options.
    pub options: TableOptions,
}

impl Schema {
    /// Finds a column's position by name. Column names are data
    /// identifiers, so the match is case-sensitive (unlike reserved words).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Finds the primary key column's position, if the table has one.
    #[must_use]
    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.primary_key)
    }
}

/// Storage contract implemented by the in-memory and on-disk backends.
pub trait Storage: Send {
    /// Creates a new, empty table.
    fn create_table(&mut self, stmt: &CreateTableStatement) -> EngineResult<()>;
    /// Drops a table, tolerating a missing one when `if_exists` is set.
    fn drop_table(&mut self, table: &str, if_exists: bool) -> EngineResult<()>;
    /// Applies a single schema-change action.
    fn alter_table(&mut self, stmt: &AlterTableStatement) -> EngineResult<()>;
    /// Appends one or more rows, returning the number inserted.
    fn insert(&mut self, stmt: &InsertStatement) -> EngineResult<u64>;
    /// Returns a table's current schema.
    fn schema(&self, table: &str) -> EngineResult<&Schema>;
    /// Returns every row currently in the table, in storage order.
    fn scan(&self, table: &str) -> EngineResult<&[Row]>;
    /// Applies `assignments` to the rows at `indices` (positions from the
    /// most recent [`Storage::scan`] of the same table), returning the
    /// number of rows actually updated (a row whose assignment violates a
    /// constraint is skipped, not counted).
    fn update_rows(
        &mut self,
        table: &str,
        indices: &[usize],
        assignments: &[UpdateAssignment],
    ) -> EngineResult<u64>;
    /// Removes the rows at `indices`.
    fn delete_rows(&mut self, table: &str, indices: &[usize]) -> EngineResult<()>;
    /// Lists every table currently defined, sorted by name.
    fn table_names(&self) -> Vec<String>;
}

pub(crate) fn missing_table(table: &str) -> EngineError {
    EngineError::NameError(format!("no such table: {table}"))
}

pub(crate) fn missing_column(column: &str) -> EngineError {
    EngineError::NameError(format!("no such column: {column}"))
}

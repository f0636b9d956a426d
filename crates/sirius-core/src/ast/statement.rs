//! Statement AST types.

use super::expression::{Expr, Literal};
use super::types::{ColumnDef, TableOptions};
use crate::lexer::Span;

/// `SELECT col-list | * FROM name [WHERE expr]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Projected column names; empty means `*`.
    pub columns: Vec<String>,
    /// Source table name.
    pub from: String,
    /// Optional filter predicate.
    pub where_clause: Option<Expr>,
    /// Location of the whole statement.
    pub span: Span,
}

/// `INSERT INTO name [(col-list)] VALUES (value-list), …`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table name.
    pub table: String,
    /// Explicit column list; empty means "all columns in schema order".
    pub columns: Vec<String>,
    /// One row of literals per `VALUES (...)` group.
    pub rows: Vec<Vec<Literal>>,
    /// Location of the whole statement.
    pub span: Span,
}

/// A single `col = literal` assignment inside `SET`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    /// Target column name.
    pub column: String,
    /// The new literal value.
    pub value: Literal,
}

/// `UPDATE name SET col = literal, … [WHERE expr]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table name.
    pub table: String,
    /// Column assignments, applied in order.
    pub assignments: Vec<UpdateAssignment>,
    /// Optional filter predicate.
    pub where_clause: Option<Expr>,
    /// Location of the whole statement.
    pub span: Span,
}

/// `DELETE FROM name [WHERE expr]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table name.
    pub table: String,
    /// Optional filter predicate.
    pub where_clause: Option<Expr>,
    /// Location of the whole statement.
    pub span: Span,
}

/// `CREATE TABLE name (col-def, …) [WITH OPTIONS (opt = value, …)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// New table name.
    pub table: String,
    /// Column definitions, in declared order.
    pub columns: Vec<ColumnDef>,
    /// Table-level options, defaulted where not given in `WITH OPTIONS`.
    pub options: TableOptions,
    /// Location of the whole statement.
    pub span: Span,
}

/// `DROP TABLE [IF EXISTS] name`.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Target table name.
    pub table: String,
    /// Whether a missing table is tolerated.
    pub if_exists: bool,
    /// Location of the whole statement.
    pub span: Span,
}

/// The specific schema-change an `ALTER TABLE` performs.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    /// `RENAME TO new_name`.
    RenameTable {
        /// The table's new name.
        new_name: String,
    },
    /// `RENAME COLUMN old TO new`.
    RenameColumn {
        /// Existing column name.
        old_name: String,
        /// New column name.
        new_name: String,
    },
    /// `ALTER COLUMN name TYPE data_type`.
    AlterColumnType {
        /// Column to retype.
        column: String,
        /// New declared type name, resolved by the executor.
        new_type: String,
    },
    /// `DROP COLUMN name`.
    DropColumn {
        /// Column to remove.
        column: String,
    },
    /// `ADD COLUMN col-def`.
    AddColumn {
        /// New column definition.
        column: ColumnDef,
    },
}

/// `ALTER TABLE name <action>`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    /// Target table name.
    pub table: String,
    /// The action to perform.
    pub action: AlterAction,
    /// Location of the whole statement.
    pub span: Span,
}

/// The root AST node: one parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `SELECT`.
    Select(SelectStatement),
    /// `INSERT`.
    Insert(InsertStatement),
    /// `UPDATE`.
    Update(UpdateStatement),
    /// `DELETE`.
    Delete(DeleteStatement),
    /// `CREATE TABLE`.
    CreateTable(CreateTableStatement),
    /// `DROP TABLE`.
    DropTable(DropTableStatement),
    /// `ALTER TABLE`.
    AlterTable(AlterTableStatement),
}

impl Statement {
    /// Returns the source span covering the whole statement.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Select(s) => s.span,
            Self::Insert(s) => s.span,
            Self::Update(s) => s.span,
            Self::Delete(s) => s.span,
            Self::CreateTable(s) => s.span,
            Self::DropTable(s) => s.span,
            Self::AlterTable(s) => s.span,
        }
    }

    /// Returns a short name for diagnostics and tracing spans.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::CreateTable(_) => "CREATE TABLE",
            Self::DropTable(_) => "DROP TABLE",
            Self::AlterTable(_) => "ALTER TABLE",
        }
    }
}

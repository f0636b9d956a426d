//! Abstract Syntax Tree (AST) types for the query language.

mod expression;
mod statement;
mod types;

pub use expression::{BinaryOp, Expr, Literal};
pub use statement::{
    AlterAction, AlterTableStatement, CreateTableStatement, DeleteStatement, DropTableStatement,
    InsertStatement, SelectStatement, Statement, UpdateAssignment, UpdateStatement,
};
pub use types::{ColumnDef, DataType, TableOptions, Value};

//! # sirius-core
//!
//! An embeddable relational database engine: a hand-written SQL lexer and
//! parser, a small executor, and a choice of in-memory or on-disk storage,
//! all reachable through one [`execute`] entry point that takes raw SQL
//! text and returns JSON-serializable responses.
//!
//! ```rust
//! use sirius_core::{execute, DatabaseManager, EngineConfig, DEFAULT_DATABASE};
//!
//! let manager = DatabaseManager::new(EngineConfig::default()).unwrap();
//! let responses = execute(&manager, DEFAULT_DATABASE, "CREATE TABLE t (id INT PRIMARY KEY);");
//! assert_eq!(responses.len(), 1);
//! ```

pub mod ast;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod storage;

pub use ast::{Statement, Value};
pub use config::{BackendKind, EngineConfig};
pub use database::{DatabaseManager, DEFAULT_DATABASE};
pub use error::{EngineError, EngineResult};
pub use executor::ExecutionOutcome;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse_statements, ParseError};
pub use result::EngineResponse;

/// Parses and runs a `;`-separated batch of SQL statements against one
/// database, returning one [`EngineResponse`] per statement that parsed
/// (plus a leading error response if any statement in the batch failed to
/// parse).
#[must_use]
pub fn execute(manager: &DatabaseManager, database: &str, sql: &str) -> Vec<EngineResponse> {
    let (statements, parse_errors) = parser::parse_statements(sql);

    let mut responses = Vec::new();
    if !parse_errors.is_empty() {
        responses.push(EngineResponse::from_parse_errors(
            parse_errors.iter().map(ToString::to_string).collect(),
        ));
    }

    for statement in &statements {
        let table_name = statement_table_name(statement);
        match manager.execute(database, statement) {
            Ok(outcome) => {
                let column_types = match &outcome {
                    ExecutionOutcome::Rows { columns, .. } => manager
                        .column_types(database, table_name, columns)
                        .unwrap_or_default(),
                    _ => Vec::new(),
                };
                responses.push(EngineResponse::from_outcome(table_name, &column_types, outcome));
            }
            Err(err) => responses.push(EngineResponse::from_error(&err)),
        }
    }

    responses
}

fn statement_table_name(statement: &Statement) -> &str {
    match statement {
        Statement::Select(s) => &s.from,
        Statement::Insert(s) => &s.table,
        Statement::Update(s) => &s.table,
        Statement::Delete(s) => &s.table,
        Statement::CreateTable(s) => &s.table,
        Statement::DropTable(s) => &s.table,
        Statement::AlterTable(s) => &s.table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_runs_a_batch_end_to_end() {
        let manager = DatabaseManager::new(EngineConfig::default()).unwrap();
        let responses = execute(
            &manager,
            DEFAULT_DATABASE,
            "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(16) NOT NULL); \
             INSERT INTO t VALUES (1, 'Ann'); \
             SELECT * FROM t;",
        );
        assert_eq!(responses.len(), 3);
        let json = serde_json::to_value(&responses[2]).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cells"][0][1]["content"], "Ann");
    }

    #[test]
    fn test_execute_surfaces_parse_errors_without_aborting_batch() {
        let manager = DatabaseManager::new(EngineConfig::default()).unwrap();
        let responses = execute(
            &manager,
            DEFAULT_DATABASE,
            "SELECT FROM; CREATE TABLE ok (id INT);",
        );
        assert_eq!(responses.len(), 2);
        let json = serde_json::to_value(&responses[0]).unwrap();
        assert_eq!(json["status"], "error");
    }
}

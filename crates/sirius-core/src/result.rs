//! Assembles an [`ExecutionOutcome`] into the engine's wire response shape.

use serde::Serialize;

use crate::ast::Value;
use crate::error::EngineError;
use crate::executor::ExecutionOutcome;

/// One header cell of a `SELECT` response.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnHeader {
    /// The column name.
    pub content: String,
    /// A stable per-column identifier (`col_<index>`).
    pub id: String,
    /// The declared type name, or `"UNKNOWN"` when it can't be resolved.
    #[serde(rename = "type")]
    pub data_type: String,
}

/// One cell of a `SELECT` response body.
#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    /// The cell's value.
    pub content: Value,
    /// A stable per-cell identifier (`cell_<row>_<col>`).
    pub id: String,
}

/// The full JSON-serializable response returned for one executed statement.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EngineResponse {
    /// A successful `SELECT`.
    Ok {
        /// The table that was queried.
        table_name: String,
        /// Column headers, in projection order.
        header: Vec<ColumnHeader>,
        /// Row-major cell grid.
        cells: Vec<Vec<Cell>>,
    },
    /// A successful `INSERT`/`UPDATE`/`DELETE`.
    Affected {
        /// Number of rows touched.
        rows_affected: u64,
    },
    /// A successful DDL statement.
    Done {
        /// Human-readable confirmation.
        message: String,
    },
    /// A failed statement.
    Error {
        /// The primary error message.
        message: String,
        /// Every distinct error collected for this statement, when more
        /// than one was recorded (e.g. multiple parse errors).
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },
}

impl EngineResponse {
    /// Builds the response for a query given the table that was read, its
    /// column type names, and the raw outcome.
    #[must_use]
    pub fn from_outcome(table_name: &str, column_types: &[String], outcome: ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Rows { columns, rows } => {
                let header = columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| ColumnHeader {
                        content: name.clone(),
                        id: format!("col_{i}"),
                        data_type: column_types.get(i).cloned().unwrap_or_else(|| "UNKNOWN".into()),
                    })
                    .collect();
                let cells = rows
                    .iter()
                    .enumerate()
                    .map(|(r, row)| {
                        row.iter()
                            .enumerate()
                            .map(|(c, value)| Cell {
                                content: value.clone(),
                                id: format!("cell_{r}_{c}"),
                            })
                            .collect()
                    })
                    .collect();
                Self::Ok {
                    table_name: table_name.to_string(),
                    header,
                    cells,
                }
            }
            ExecutionOutcome::RowsAffected(rows_affected) => Self::Affected { rows_affected },
            ExecutionOutcome::Ddl(message) => Self::Done { message },
        }
    }

    /// Builds the response for a statement that failed to parse or execute.
    #[must_use]
    pub fn from_error(err: &EngineError) -> Self {
        Self::Error {
            message: err.to_string(),
            errors: Vec::new(),
        }
    }

    /// Builds the response for a batch that failed to parse, carrying every
    /// distinct parse error collected.
    #[must_use]
    pub fn from_parse_errors(messages: Vec<String>) -> Self {
        let message = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "parse error".to_string());
        Self::Error {
            message,
            errors: messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_response_shape() {
        let outcome = ExecutionOutcome::Rows {
            columns: vec!["id".into()],
            rows: vec![vec![Value::Integer(1)]],
        };
        let response = EngineResponse::from_outcome("t", &["INT".into()], outcome);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["header"][0]["content"], "id");
        assert_eq!(json["cells"][0][0]["content"], 1);
    }

    #[test]
    fn test_error_response_omits_empty_errors_list() {
        let response = EngineResponse::from_error(&EngineError::NameError("no such table: t".into()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("errors").is_none());
    }
}

//! Statement execution: evaluates a parsed [`Statement`] against a
//! [`Storage`] backend.
//!
//! Expression evaluation walks the AST directly rather than compiling to
//! bytecode; the one thing worth caching is a `LIKE` pattern's compiled
//! [`Regex`], which would otherwise be rebuilt on every row of a scan. The
//! cache is keyed by the pattern expression's address and cleared at the
//! start of every [`Executor::execute`] call, since an address is only
//! stable for the lifetime of the statement that owns it.

use std::collections::HashMap;

use regex::Regex;
use tracing::{info, info_span};

use crate::ast::{
    BinaryOp, DeleteStatement, Expr, SelectStatement, Statement, UpdateStatement, Value,
};
use crate::error::{EngineError, EngineResult};
use crate::storage::{Row, Schema, Storage};

/// What running a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// A `SELECT`'s projected column names and matching rows.
    Rows {
        /// Projected column names, in order.
        columns: Vec<String>,
        /// Matching rows, projected to `columns`.
        rows: Vec<Row>,
    },
    /// How many rows an `INSERT`/`UPDATE`/`DELETE` touched.
    RowsAffected(u64),
    /// A human-readable confirmation for a DDL statement.
    Ddl(String),
}

/// Executes statements against one storage backend.
pub struct Executor<'s, S: Storage> {
    storage: &'s mut S,
    like_cache: HashMap<usize, Regex>,
}

impl<'s, S: Storage> Executor<'s, S> {
    /// Creates an executor over the given backend.
    #[must_use]
    pub fn new(storage: &'s mut S) -> Self {
        Self {
            storage,
            like_cache: HashMap::new(),
        }
    }

    /// Runs one statement to completion.
    pub fn execute(&mut self, statement: &Statement) -> EngineResult<ExecutionOutcome> {
        self.like_cache.clear();
        let span = info_span!("execute", statement = statement.kind_name());
        let _enter = span.enter();

        let result = match statement {
            Statement::Select(s) => self.execute_select(s).map(|(columns, rows)| {
                ExecutionOutcome::Rows { columns, rows }
            }),
            Statement::Insert(s) => self
                .storage
                .insert(s)
                .map(ExecutionOutcome::RowsAffected),
            Statement::Update(s) => self
                .execute_update(s)
                .map(ExecutionOutcome::RowsAffected),
            Statement::Delete(s) => self
                .execute_delete(s)
                .map(ExecutionOutcome::RowsAffected),
            Statement::CreateTable(s) => self.storage.create_table(s).map(|()| {
                ExecutionOutcome::Ddl(format!("table {} created", s.table))
            }),
            Statement::DropTable(s) => self
                .storage
                .drop_table(&s.table, s.if_exists)
                .map(|()| ExecutionOutcome::Ddl(format!("table {} dropped", s.table))),
            Statement::AlterTable(s) => self.storage.alter_table(s).map(|()| {
                ExecutionOutcome::Ddl(format!("table {} altered", s.table))
            }),
        };

        match &result {
            Ok(_) => info!("statement succeeded"),
            Err(err) => info!(%err, "statement failed"),
        }
        result
    }

    fn execute_select(&mut self, stmt: &SelectStatement) -> EngineResult<(Vec<String>, Vec<Row>)> {
        let schema = self.storage.schema(&stmt.from)?.clone();
        let columns = self.resolve_projection(stmt, &schema)?;

        let rows = self.storage.scan(&stmt.from)?.to_vec();
        let mut projected = Vec::new();
        for row in &rows {
            if self.row_matches(&stmt.where_clause, row, &schema)? {
                projected.push(self.project(row, &columns, &schema));
            }
        }
        Ok((columns, projected))
    }

    fn resolve_projection(
        &self,
        stmt: &SelectStatement,
        schema: &Schema,
    ) -> EngineResult<Vec<String>> {
        if stmt.columns.is_empty() {
            return Ok(schema.columns.iter().map(|c| c.name.clone()).collect());
        }
        for name in &stmt.columns {
            if schema.column_index(name).is_none() {
                return Err(EngineError::NameError(format!("no such column: {name}")));
            }
        }
        Ok(stmt.columns.clone())
    }

    fn project(&self, row: &Row, columns: &[String], schema: &Schema) -> Row {
        columns
            .iter()
            .map(|name| {
                let idx = schema
                    .column_index(name)
                    .expect("projection column already validated against schema");
                row[idx].clone()
            })
            .collect()
    }

    fn matching_indices(
        &mut self,
        table: &str,
        where_clause: &Option<Expr>,
    ) -> EngineResult<Vec<usize>> {
        let schema = self.storage.schema(table)?.clone();
        let rows = self.storage.scan(table)?.to_vec();
        let mut indices = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if self.row_matches(where_clause, row, &schema)? {
                indices.push(i);
            }
        }
        Ok(indices)
    }

    fn row_matches(
        &mut self,
        where_clause: &Option<Expr>,
        row: &Row,
        schema: &Schema,
    ) -> EngineResult<bool> {
        match where_clause {
            Some(expr) => Ok(truthy(&self.evaluate(expr, row, schema)?)),
            None => Ok(true),
        }
    }

    fn execute_update(&mut self, stmt: &UpdateStatement) -> EngineResult<u64> {
        let indices = self.matching_indices(&stmt.table, &stmt.where_clause)?;
        self.storage
            .update_rows(&stmt.table, &indices, &stmt.assignments)
    }

    fn execute_delete(&mut self, stmt: &DeleteStatement) -> EngineResult<u64> {
        let indices = self.matching_indices(&stmt.table, &stmt.where_clause)?;
        self.storage.delete_rows(&stmt.table, &indices)?;
        Ok(indices.len() as u64)
    }

    fn evaluate(&mut self, expr: &Expr, row: &Row, schema: &Schema) -> EngineResult<Value> {
        match expr {
            Expr::Literal(lit, _) => Ok(lit.clone().into_value()),
            Expr::Column(name, _) => {
                let idx = schema
                    .column_index(name)
                    .ok_or_else(|| EngineError::NameError(format!("no such column: {name}")))?;
                Ok(row[idx].clone())
            }
            Expr::Paren(inner, _) => self.evaluate(inner, row, schema),
            Expr::Not { expr, .. } => {
                let value = self.evaluate(expr, row, schema)?;
                Ok(Value::Boolean(!truthy(&value)))
            }
            Expr::Binary {
                left, op, right, ..
            } => self.evaluate_binary(left, *op, right, row, schema),
            Expr::InList { expr, list, .. } => {
                let value = self.evaluate(expr, row, schema)?;
                if value.is_null() {
                    return Ok(Value::Boolean(false));
                }
                for candidate in list {
                    let candidate = self.evaluate(candidate, row, schema)?;
                    if value.sql_eq(&candidate) {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
            Expr::InSubquery { expr, subquery, .. } => {
                let value = self.evaluate(expr, row, schema)?;
                if value.is_null() {
                    return Ok(Value::Boolean(false));
                }
                let (_, rows) = self.execute_select(subquery)?;
                Ok(Value::Boolean(rows.iter().any(|r| {
                    r.first().is_some_and(|cell| cell.sql_eq(&value))
                })))
            }
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        row: &Row,
        schema: &Schema,
    ) -> EngineResult<Value> {
        match op {
            BinaryOp::And => {
                let l = self.evaluate(left, row, schema)?;
                if !truthy(&l) {
                    return Ok(Value::Boolean(false));
                }
                let r = self.evaluate(right, row, schema)?;
                Ok(Value::Boolean(truthy(&r)))
            }
            BinaryOp::Or => {
                let l = self.evaluate(left, row, schema)?;
                if truthy(&l) {
                    return Ok(Value::Boolean(true));
                }
                let r = self.evaluate(right, row, schema)?;
                Ok(Value::Boolean(truthy(&r)))
            }
            BinaryOp::Like => {
                let l = self.evaluate(left, row, schema)?;
                let r = self.evaluate(right, row, schema)?;
                let (Value::String(haystack), Value::String(pattern)) = (&l, &r) else {
                    return Ok(Value::Boolean(false));
                };
                let regex = self.compile_like(right, pattern)?;
                Ok(Value::Boolean(regex.is_match(haystack)))
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq
            | BinaryOp::GtEq => {
                let l = self.evaluate(left, row, schema)?;
                let r = self.evaluate(right, row, schema)?;
                Ok(Value::Boolean(compare(op, &l, &r)))
            }
        }
    }

    fn compile_like(&mut self, pattern_expr: &Expr, pattern: &str) -> EngineResult<Regex> {
        let key = (pattern_expr as *const Expr).cast::<()>() as usize;
        if let Some(regex) = self.like_cache.get(&key) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&like_pattern_to_regex(pattern))
            .map_err(|e| EngineError::InternalError(format!("invalid LIKE pattern: {e}")))?;
        self.like_cache.insert(key, regex.clone());
        Ok(regex)
    }
}

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Boolean(true))
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> bool {
    match op {
        BinaryOp::Eq => l.sql_eq(r),
        BinaryOp::NotEq => !l.is_null() && !r.is_null() && !l.sql_eq(r),
        BinaryOp::Lt => l.sql_partial_cmp(r) == Some(std::cmp::Ordering::Less),
        BinaryOp::Gt => l.sql_partial_cmp(r) == Some(std::cmp::Ordering::Greater),
        BinaryOp::LtEq => matches!(
            l.sql_partial_cmp(r),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        BinaryOp::GtEq => matches!(
            l.sql_partial_cmp(r),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Like => unreachable!("handled separately"),
    }
}

/// Translates a SQL `LIKE` pattern (`%` = any run, `_` = any one character)
/// into an anchored regex, escaping every other character literally.
fn like_pattern_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnDef, CreateTableStatement, DataType, InsertStatement, Literal,
        TableOptions};
    use crate::lexer::Span;
    use crate::parser::parse_statements;
    use crate::storage::InMemoryStorage;

    fn seeded_storage() -> InMemoryStorage {
        let mut storage = InMemoryStorage::new();
        let mut id = ColumnDef::new("id".into(), DataType::Int);
        id.primary_key = true;
        id.not_null = true;
        storage
            .create_table(&CreateTableStatement {
                table: "t".into(),
                columns: vec![id, ColumnDef::new("name".into(), DataType::Varchar)],
                options: TableOptions::default(),
                span: Span::default(),
            })
            .unwrap();
        storage
            .insert(&InsertStatement {
                table: "t".into(),
                columns: vec![],
                rows: vec![
                    vec![Literal::Integer(1), Literal::String("Ann".into())],
                    vec![Literal::Integer(2), Literal::String("Bob".into())],
                ],
                span: Span::default(),
            })
            .unwrap();
        storage
    }

    fn run(storage: &mut InMemoryStorage, sql: &str) -> ExecutionOutcome {
        let (stmts, errors) = parse_statements(sql);
        assert!(errors.is_empty(), "{errors:?}");
        Executor::new(storage).execute(&stmts[0]).unwrap()
    }

    #[test]
    fn test_select_with_and_or_like() {
        let mut storage = seeded_storage();
        let outcome = run(&mut storage, "SELECT name FROM t WHERE name LIKE 'A%' OR id = 2;");
        let ExecutionOutcome::Rows { rows, .. } = outcome else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_update_reports_rows_affected() {
        let mut storage = seeded_storage();
        let outcome = run(&mut storage, "UPDATE t SET name = 'Zed' WHERE id = 1;");
        assert_eq!(outcome, ExecutionOutcome::RowsAffected(1));
    }

    #[test]
    fn test_delete_all_without_where() {
        let mut storage = seeded_storage();
        let outcome = run(&mut storage, "DELETE FROM t;");
        assert_eq!(outcome, ExecutionOutcome::RowsAffected(2));
    }

    #[test]
    fn test_in_subquery() {
        let mut storage = seeded_storage();
        let outcome = run(
            &mut storage,
            "SELECT id FROM t WHERE id IN (SELECT id FROM t WHERE name = 'Ann');",
        );
        let ExecutionOutcome::Rows { rows, .. } = outcome else {
            panic!("expected rows");
        };
        assert_eq!(rows, vec![vec![Value::Integer(1)]]);
    }

    #[test]
    fn test_unknown_column_in_where_errors() {
        let mut storage = seeded_storage();
        let (stmts, _) = parse_statements("SELECT * FROM t WHERE ghost = 1;");
        let err = Executor::new(&mut storage).execute(&stmts[0]).unwrap_err();
        assert!(matches!(err, EngineError::NameError(_)));
    }
}

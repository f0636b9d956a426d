//! Pure in-process storage backend: every table is a `Vec<Row>` guarded by
//! an optional primary-key hash index.

use std::collections::HashMap;

use crate::ast::{AlterAction, DataType, Value};
use crate::ast::{AlterTableStatement, CreateTableStatement, InsertStatement, UpdateAssignment};
use crate::error::{EngineError, EngineResult};

use super::{missing_column, missing_table, Row, Schema, Storage};

struct Table {
    schema: Schema,
    rows: Vec<Row>,
    pk_index: Option<HashMap<String, usize>>,
}

impl Table {
    fn rebuild_pk_index(&mut self) {
        self.pk_index = self.schema.primary_key_index().map(|pk_col| {
            self.rows
                .iter()
                .enumerate()
                .filter_map(|(i, row)| row[pk_col].canonical_key().map(|k| (k, i)))
                .collect()
        });
    }

    fn has_duplicate_key(&self, pk_col: usize, candidate: &Value) -> bool {
        match &self.pk_index {
            Some(index) => candidate
                .canonical_key()
                .is_some_and(|k| index.contains_key(&k)),
            None => self.rows.iter().any(|row| row[pk_col].sql_eq(candidate)),
        }
    }
}

/// Keeps every table as a plain in-process vector of rows.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: HashMap<String, Table>,
}

impl InMemoryStorage {
    /// Creates an empty, all-in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table_mut(&mut self, name: &str) -> EngineResult<&mut Table> {
        self.tables.get_mut(name).ok_or_else(|| missing_table(name))
    }

    fn table(&self, name: &str) -> EngineResult<&Table> {
        self.tables.get(name).ok_or_else(|| missing_table(name))
    }

    /// Installs a fully-formed table, bypassing the usual validation. Used
    /// by the on-disk backend to repopulate its cache from persisted state,
    /// which was already valid when it was written.
    pub(super) fn load_table(&mut self, schema: Schema, rows: Vec<Row>) {
        let mut table = Table {
            schema,
            rows,
            pk_index: None,
        };
        table.rebuild_pk_index();
        self.tables.insert(table.schema.name.clone(), table);
    }
}

impl Storage for InMemoryStorage {
    fn create_table(&mut self, stmt: &CreateTableStatement) -> EngineResult<()> {
        if self.tables.contains_key(&stmt.table) {
            return Err(EngineError::SchemaError(format!(
                "table already exists: {}",
                stmt.table
            )));
        }
        if !stmt.options.validate() {
            return Err(EngineError::OptionError(format!(
                "invalid table options for {}",
                stmt.table
            )));
        }
        if stmt.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(EngineError::SchemaError(format!(
                "table {} declares more than one primary key",
                stmt.table
            )));
        }
        let max_name_len = stmt.options.max_column_name_length as usize;
        for column in &stmt.columns {
            if column.name.chars().count() > max_name_len {
                return Err(EngineError::SchemaError(format!(
                    "column name {} exceeds the maximum of {max_name_len} characters",
                    column.name
                )));
            }
            if !stmt.options.allowed_types.is_empty()
                && !stmt.options.allowed_types.contains(&column.data_type)
            {
                return Err(EngineError::OptionError(format!(
                    "column {} has a type not permitted by this table's options",
                    column.name
                )));
            }
        }
        self.tables.insert(
            stmt.table.clone(),
            Table {
                schema: Schema {
                    name: stmt.table.clone(),
                    columns: stmt.columns.clone(),
                    options: stmt.options.clone(),
                },
                rows: Vec::new(),
                pk_index: None,
            },
        );
        Ok(())
    }

    fn drop_table(&mut self, table: &str, if_exists: bool) -> EngineResult<()> {
        if self.tables.remove(table).is_none() && !if_exists {
            return Err(missing_table(table));
        }
        Ok(())
    }

    fn alter_table(&mut self, stmt: &AlterTableStatement) -> EngineResult<()> {
        if let AlterAction::RenameTable { new_name } = &stmt.action {
            if self.tables.contains_key(new_name) {
                return Err(EngineError::SchemaError(format!(
                    "table already exists: {new_name}"
                )));
            }
            let mut table = self
                .tables
                .remove(&stmt.table)
                .ok_or_else(|| missing_table(&stmt.table))?;
            table.schema.name = new_name.clone();
            self.tables.insert(new_name.clone(), table);
            return Ok(());
        }

        let table = self.table_mut(&stmt.table)?;
        match &stmt.action {
            AlterAction::RenameTable { .. } => unreachable!("handled above"),
            AlterAction::RenameColumn { old_name, new_name } => {
                let idx = table
                    .schema
                    .column_index(old_name)
                    .ok_or_else(|| missing_column(old_name))?;
                table.schema.columns[idx].name = new_name.clone();
            }
            AlterAction::AlterColumnType { column, new_type } => {
                let idx = table
                    .schema
                    .column_index(column)
                    .ok_or_else(|| missing_column(column))?;
                let target = DataType::from_name(new_type);
                if target == DataType::Unknown {
                    return Err(EngineError::SchemaError(format!(
                        "unknown data type: {new_type}"
                    )));
                }
                for row in &mut table.rows {
                    row[idx] = coerce(&row[idx], target);
                }
                table.schema.columns[idx].data_type = target;
            }
            AlterAction::DropColumn { column } => {
                let idx = table
                    .schema
                    .column_index(column)
                    .ok_or_else(|| missing_column(column))?;
                if table.schema.columns[idx].primary_key {
                    return Err(EngineError::ConstraintError(format!(
                        "cannot drop primary key column: {column}"
                    )));
                }
                if table.schema.columns.len() == 1 {
                    return Err(EngineError::ConstraintError(
                        "cannot drop the last column of a table".into(),
                    ));
                }
                table.schema.columns.remove(idx);
                for row in &mut table.rows {
                    row.remove(idx);
                }
            }
            AlterAction::AddColumn { column } => {
                if table.schema.column_index(&column.name).is_some() {
                    return Err(EngineError::SchemaError(format!(
                        "column already exists: {}",
                        column.name
                    )));
                }
                if column.primary_key && !table.rows.is_empty() {
                    return Err(EngineError::ConstraintError(format!(
                        "cannot add primary key column {} to a non-empty table",
                        column.name
                    )));
                }
                let default = if column.not_null {
                    column.data_type.zero_value()
                } else {
                    Value::Null
                };
                for row in &mut table.rows {
                    row.push(default.clone());
                }
                table.schema.columns.push(column.clone());
            }
        }
        table.rebuild_pk_index();
        Ok(())
    }

    fn insert(&mut self, stmt: &InsertStatement) -> EngineResult<u64> {
        let table = self.table_mut(&stmt.table)?;
        let column_order: Vec<usize> = if stmt.columns.is_empty() {
            (0..table.schema.columns.len()).collect()
        } else {
            stmt.columns
                .iter()
                .map(|name| table.schema.column_index(name).ok_or_else(|| missing_column(name)))
                .collect::<EngineResult<_>>()?
        };

        // Each row is validated independently: a violation skips that row
        // rather than aborting the whole statement, so a batch insert can
        // partially succeed.
        let mut inserted = 0u64;
        'rows: for values in &stmt.rows {
            if values.len() != column_order.len() {
                continue;
            }
            let mut row = vec![Value::Null; table.schema.columns.len()];
            for (slot, literal) in column_order.iter().zip(values) {
                row[*slot] = literal.clone().into_value();
            }
            let max_string_len = table.schema.options.max_string_length as usize;
            for (col, value) in table.schema.columns.iter().zip(&row) {
                if col.not_null && value.is_null() {
                    continue 'rows;
                }
                if let Value::String(s) = value {
                    if s.chars().count() > max_string_len {
                        continue 'rows;
                    }
                }
            }
            if let Some(pk) = table.schema.primary_key_index() {
                if table.has_duplicate_key(pk, &row[pk]) {
                    continue 'rows;
                }
            }
            table.rows.push(row);
            inserted += 1;
            table.rebuild_pk_index();
        }
        Ok(inserted)
    }

    fn schema(&self, table: &str) -> EngineResult<&Schema> {
        Ok(&self.table(table)?.schema)
    }

    fn scan(&self, table: &str) -> EngineResult<&[Row]> {
        Ok(&self.table(table)?.rows)
    }

    fn update_rows(
        &mut self,
        table: &str,
        indices: &[usize],
        assignments: &[UpdateAssignment],
    ) -> EngineResult<u64> {
        let table = self.table_mut(table)?;
        let mut resolved = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let idx = table
                .schema
                .column_index(&assignment.column)
                .ok_or_else(|| missing_column(&assignment.column))?;
            resolved.push((idx, assignment.value.clone().into_value()));
        }

        let pk = table.schema.primary_key_index();
        let max_string_len = table.schema.options.max_string_length as usize;
        // Per matched row, an invalid assignment skips that row rather
        // than aborting the whole statement.
        let mut updated = 0u64;
        'rows: for &i in indices {
            for (idx, value) in &resolved {
                if table.schema.columns[*idx].not_null && value.is_null() {
                    continue 'rows;
                }
                if let Value::String(s) = value {
                    if s.chars().count() > max_string_len {
                        continue 'rows;
                    }
                }
                if Some(*idx) == pk {
                    let collides = table.rows.iter().enumerate().any(|(j, row)| {
                        j != i && row[*idx].sql_eq(value)
                    });
                    if collides {
                        continue 'rows;
                    }
                }
            }
            for (idx, value) in &resolved {
                table.rows[i][*idx] = value.clone();
            }
            updated += 1;
        }
        table.rebuild_pk_index();
        Ok(updated)
    }

    fn delete_rows(&mut self, table: &str, indices: &[usize]) -> EngineResult<()> {
        let table = self.table_mut(table)?;
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for i in sorted.into_iter().rev() {
            table.rows.remove(i);
        }
        table.rebuild_pk_index();
        Ok(())
    }

    fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Converts `value` to `target`'s representation per the conversion matrix.
/// A string that can't be parsed into the target numeric type becomes null
/// rather than failing the enclosing `ALTER COLUMN TYPE` statement.
fn coerce(value: &Value, target: DataType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match (value, target) {
        (Value::Integer(i), DataType::Double) => Value::Double(*i as f64),
        (Value::Double(d), DataType::Int) => Value::Integer(*d as i64),
        (Value::Integer(i), DataType::Varchar) => Value::String(i.to_string()),
        (Value::Double(d), DataType::Varchar) => Value::String(d.to_string()),
        (Value::Boolean(b), DataType::Varchar) => Value::String(b.to_string()),
        (Value::String(s), DataType::Int) => s.parse::<i64>().map_or(Value::Null, Value::Integer),
        (Value::String(s), DataType::Double) => {
            s.parse::<f64>().map_or(Value::Null, Value::Double)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnDef, Literal, TableOptions};

    fn create_users() -> (InMemoryStorage, CreateTableStatement) {
        let mut id = ColumnDef::new("id".into(), DataType::Int);
        id.primary_key = true;
        id.not_null = true;
        let name = ColumnDef::new("name".into(), DataType::Varchar);
        let stmt = CreateTableStatement {
            table: "users".into(),
            columns: vec![id, name],
            options: TableOptions::default(),
            span: crate::lexer::Span::default(),
        };
        let mut storage = InMemoryStorage::new();
        storage.create_table(&stmt).unwrap();
        (storage, stmt)
    }

    #[test]
    fn test_insert_skips_duplicate_primary_key_row() {
        let (mut storage, _) = create_users();
        let insert = InsertStatement {
            table: "users".into(),
            columns: vec![],
            rows: vec![
                vec![Literal::Integer(1), Literal::String("a".into())],
                vec![Literal::Integer(1), Literal::String("b".into())],
            ],
            span: crate::lexer::Span::default(),
        };
        // The first row claims the key; the second is skipped, not an error.
        assert_eq!(storage.insert(&insert).unwrap(), 1);
        assert_eq!(storage.scan("users").unwrap().len(), 1);
    }

    #[test]
    fn test_alter_column_type_coerces_existing_rows() {
        let (mut storage, _) = create_users();
        storage
            .insert(&InsertStatement {
                table: "users".into(),
                columns: vec![],
                rows: vec![vec![Literal::Integer(1), Literal::String("Ann".into())]],
                span: crate::lexer::Span::default(),
            })
            .unwrap();
        storage
            .alter_table(&AlterTableStatement {
                table: "users".into(),
                action: AlterAction::AlterColumnType {
                    column: "id".into(),
                    new_type: "VARCHAR".into(),
                },
                span: crate::lexer::Span::default(),
            })
            .unwrap();
        let rows = storage.scan("users").unwrap();
        assert_eq!(rows[0][0], Value::String("1".into()));
    }

    #[test]
    fn test_drop_missing_table_without_if_exists_errors() {
        let mut storage = InMemoryStorage::new();
        assert!(storage.drop_table("ghost", false).is_err());
        assert!(storage.drop_table("ghost", true).is_ok());
    }
}

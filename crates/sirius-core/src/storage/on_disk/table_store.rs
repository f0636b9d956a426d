//! A single table's on-disk state: one [`ColumnManager`] per column plus an
//! in-memory row cache kept in lockstep with the column files, so `scan`
//! can still hand back a plain slice the way the in-memory backend does.
//!
//! Column files are keyed by a small per-table "link" assigned once when
//! the column is created and never reused for another column, so a column
//! dropped from the middle of the schema never disturbs its neighbors'
//! files — only [`TableStore::column_links`] (persisted alongside the
//! schema) ties a schema position back to its files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::ast::{AlterAction, DataType, InsertStatement, UpdateAssignment, Value};
use crate::error::{EngineError, EngineResult};

use super::column_manager::ColumnManager;
use crate::storage::{missing_column, Row, Schema};

const META_FILE: &str = "schema.meta";

#[derive(serde::Serialize, serde::Deserialize)]
struct TableMeta {
    schema: Schema,
    column_links: Vec<u16>,
    next_column_link: u16,
}

pub struct TableStore {
    dir: PathBuf,
    schema: Schema,
    column_links: Vec<u16>,
    next_column_link: u16,
    columns: Vec<ColumnManager>,
    rows: Vec<Row>,
    last_gc: SystemTime,
}

impl TableStore {
    pub fn create(dir: PathBuf, schema: Schema) -> EngineResult<Self> {
        fs::create_dir_all(&dir)?;
        let column_links: Vec<u16> = (0..schema.columns.len() as u16).collect();
        let columns = schema
            .columns
            .iter()
            .zip(&column_links)
            .map(|(c, &link)| ColumnManager::open(&dir, link, c.data_type))
            .collect::<std::io::Result<Vec<_>>>()?;
        let next_column_link = column_links.len() as u16;

        let store = Self {
            dir,
            schema,
            column_links,
            next_column_link,
            columns,
            rows: Vec::new(),
            last_gc: SystemTime::now(),
        };
        store.write_meta()?;
        Ok(store)
    }

    pub fn open(dir: PathBuf) -> EngineResult<Self> {
        let bytes = fs::read(dir.join(META_FILE))?;
        let meta: TableMeta = serde_json::from_slice(&bytes)?;

        let mut columns = Vec::with_capacity(meta.column_links.len());
        for (column, &link) in meta.schema.columns.iter().zip(&meta.column_links) {
            columns.push(ColumnManager::open(&dir, link, column.data_type)?);
        }

        let row_count = if columns.is_empty() { 0 } else { columns[0].row_count()? };
        let mut rows = Vec::with_capacity(row_count as usize);
        for r in 0..row_count {
            let mut row = Vec::with_capacity(columns.len());
            for column in &mut columns {
                row.push(column.read_value(r)?);
            }
            rows.push(row);
        }

        Ok(Self {
            dir,
            schema: meta.schema,
            column_links: meta.column_links,
            next_column_link: meta.next_column_link,
            columns,
            rows,
            last_gc: SystemTime::now(),
        })
    }

    fn write_meta(&self) -> EngineResult<()> {
        let meta = TableMeta {
            schema: self.schema.clone(),
            column_links: self.column_links.clone(),
            next_column_link: self.next_column_link,
        };
        fs::write(self.dir.join(META_FILE), serde_json::to_vec(&meta)?)?;
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Updates the in-memory schema's name after the catalog has already
    /// recorded the rename; the table's link and directory are unchanged.
    pub fn rename(&mut self, new_name: &str) {
        self.schema.name = new_name.to_string();
        let _ = self.write_meta();
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn delete_dir(dir: &Path) -> EngineResult<()> {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn has_duplicate_key(&self, pk_col: usize, candidate: &Value, except_row: Option<usize>) -> bool {
        self.rows
            .iter()
            .enumerate()
            .any(|(i, row)| Some(i) != except_row && row[pk_col].sql_eq(candidate))
    }

    /// Appends rows, skipping (not erroring on) any row that violates a
    /// per-row constraint so a batch insert can partially succeed.
    pub fn insert(&mut self, stmt: &InsertStatement) -> EngineResult<u64> {
        let column_order: Vec<usize> = if stmt.columns.is_empty() {
            (0..self.schema.columns.len()).collect()
        } else {
            stmt.columns
                .iter()
                .map(|name| self.schema.column_index(name).ok_or_else(|| missing_column(name)))
                .collect::<EngineResult<_>>()?
        };

        let max_string_len = self.schema.options.max_string_length as usize;
        let mut inserted = 0u64;
        'rows: for values in &stmt.rows {
            if values.len() != column_order.len() {
                continue;
            }
            let mut row = vec![Value::Null; self.schema.columns.len()];
            for (slot, literal) in column_order.iter().zip(values) {
                row[*slot] = literal.clone().into_value();
            }
            for (col, value) in self.schema.columns.iter().zip(&row) {
                if col.not_null && value.is_null() {
                    continue 'rows;
                }
                if let Value::String(s) = value {
                    if s.chars().count() > max_string_len {
                        continue 'rows;
                    }
                }
            }
            if let Some(pk) = self.schema.primary_key_index() {
                if self.has_duplicate_key(pk, &row[pk], None) {
                    continue 'rows;
                }
            }
            for (column, value) in self.columns.iter_mut().zip(&row) {
                column.append_value(value)?;
            }
            self.rows.push(row);
            inserted += 1;
        }
        self.maybe_collect_garbage()?;
        Ok(inserted)
    }

    pub fn update_rows(
        &mut self,
        indices: &[usize],
        assignments: &[UpdateAssignment],
    ) -> EngineResult<u64> {
        let mut resolved = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let idx = self
                .schema
                .column_index(&assignment.column)
                .ok_or_else(|| missing_column(&assignment.column))?;
            resolved.push((idx, assignment.value.clone().into_value()));
        }

        let pk = self.schema.primary_key_index();
        let max_string_len = self.schema.options.max_string_length as usize;
        let mut updated = 0u64;
        'rows: for &i in indices {
            for (idx, value) in &resolved {
                if self.schema.columns[*idx].not_null && value.is_null() {
                    continue 'rows;
                }
                if let Value::String(s) = value {
                    if s.chars().count() > max_string_len {
                        continue 'rows;
                    }
                }
                if Some(*idx) == pk && self.has_duplicate_key(*idx, value, Some(i)) {
                    continue 'rows;
                }
            }
            for (idx, value) in &resolved {
                self.columns[*idx].update_value(i as u64, value)?;
                self.rows[i][*idx] = value.clone();
            }
            updated += 1;
        }
        self.maybe_collect_garbage()?;
        Ok(updated)
    }

    pub fn delete_rows(&mut self, indices: &[usize]) -> EngineResult<()> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for i in sorted.into_iter().rev() {
            for column in &mut self.columns {
                column.swap_and_pop(i as u64)?;
            }
            let last = self.rows.len() - 1;
            self.rows.swap(i, last);
            self.rows.pop();
        }
        self.maybe_collect_garbage()?;
        Ok(())
    }

    pub fn alter(&mut self, action: &AlterAction) -> EngineResult<()> {
        match action {
            AlterAction::RenameTable { .. } => unreachable!("handled by the catalog"),
            AlterAction::RenameColumn { old_name, new_name } => {
                let idx = self.schema.column_index(old_name).ok_or_else(|| missing_column(old_name))?;
                self.schema.columns[idx].name = new_name.clone();
            }
            AlterAction::AlterColumnType { column, new_type } => {
                let idx = self.schema.column_index(column).ok_or_else(|| missing_column(column))?;
                let target = DataType::from_name(new_type);
                if target == DataType::Unknown {
                    return Err(EngineError::SchemaError(format!("unknown data type: {new_type}")));
                }
                self.retype_column(idx, target)?;
            }
            AlterAction::DropColumn { column } => {
                let idx = self.schema.column_index(column).ok_or_else(|| missing_column(column))?;
                if self.schema.columns[idx].primary_key {
                    return Err(EngineError::ConstraintError(format!(
                        "cannot drop primary key column: {column}"
                    )));
                }
                if self.schema.columns.len() == 1 {
                    return Err(EngineError::ConstraintError(
                        "cannot drop the last column of a table".into(),
                    ));
                }
                let link = self.column_links[idx];
                // Drop the in-memory manager before unlinking its files: its
                // Drop impl flushes a dirty freelist, which would otherwise
                // recreate a file we're about to delete for good.
                drop(self.columns.remove(idx));
                ColumnManager::drop_files(&self.dir, link);
                self.schema.columns.remove(idx);
                self.column_links.remove(idx);
                for row in &mut self.rows {
                    row.remove(idx);
                }
            }
            AlterAction::AddColumn { column } => {
                if self.schema.column_index(&column.name).is_some() {
                    return Err(EngineError::SchemaError(format!(
                        "column already exists: {}",
                        column.name
                    )));
                }
                if column.primary_key && !self.rows.is_empty() {
                    return Err(EngineError::ConstraintError(format!(
                        "cannot add primary key column {} to a non-empty table",
                        column.name
                    )));
                }
                let link = self.next_column_link;
                self.next_column_link += 1;
                let mut manager = ColumnManager::open(&self.dir, link, column.data_type)?;
                let default = if column.not_null { column.data_type.zero_value() } else { Value::Null };
                for row in &mut self.rows {
                    manager.append_value(&default)?;
                    row.push(default.clone());
                }
                self.columns.push(manager);
                self.column_links.push(link);
                self.schema.columns.push(column.clone());
            }
        }
        self.write_meta()
    }

    /// Rewrites every row's cell in column `idx` under its new type and
    /// swaps in a freshly-opened manager for that link, since the new
    /// type may change whether the column is fixed- or variable-width.
    fn retype_column(&mut self, idx: usize, target: DataType) -> EngineResult<()> {
        let values: Vec<Value> = self
            .rows
            .iter()
            .map(|row| coerce(&row[idx], target))
            .collect();
        let link = self.column_links[idx];
        // Flush the outgoing manager's freelist now, before its files are
        // deleted out from under it: its Drop impl would otherwise flush
        // again once we overwrite `self.columns[idx]` below, recreating a
        // stale freelist file over the new column's data.
        self.columns[idx].flush_freelist()?;
        ColumnManager::drop_files(&self.dir, link);
        let mut manager = ColumnManager::open(&self.dir, link, target)?;
        for value in &values {
            manager.append_value(value)?;
        }
        self.columns[idx] = manager;
        self.schema.columns[idx].data_type = target;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(())
    }

    /// Advisory, best-effort compaction: once more than the table's
    /// configured `gc_frequency_days` have elapsed since the last run,
    /// flush every column's dirty freelist cache to disk early instead of
    /// waiting for the column manager to be dropped. This bounds how long
    /// reclaimed heap space can stay unpersisted without affecting
    /// correctness of any read or write.
    fn maybe_collect_garbage(&mut self) -> EngineResult<()> {
        let due = self.last_gc.elapsed().map_or(true, |elapsed| {
            elapsed.as_secs() >= u64::from(self.schema.options.gc_frequency_days) * 86_400
        });
        if !due {
            return Ok(());
        }
        for column in &mut self.columns {
            column.flush_freelist()?;
        }
        self.last_gc = SystemTime::now();
        Ok(())
    }
}

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
        (Value::String(s), DataType::Double) => s.parse::<f64>().map_or(Value::Null, Value::Double),
        _ => value.clone(),
    }
}

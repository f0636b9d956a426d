//! On-disk storage backend: a database-level [`catalog::Catalog`] maps table
//! names to a small integer link, and each table's data lives in its own
//! directory named after that link's high/low bytes (`manager/HH/LL/`).
//!
//! Grounded on the reference physical storage layer's `DatabaseManager` and
//! `FileManager`: the catalog owns naming and link allocation, `FileManager`
//! owns turning a link into a directory path, and each table's actual rows
//! are owned by a [`table_store::TableStore`].

mod block_io;
mod catalog;
mod column_manager;
mod heap_io;
mod name_key;
mod space_manager;
mod table_store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ast::{AlterAction, AlterTableStatement, CreateTableStatement, InsertStatement, UpdateAssignment};
use crate::error::{EngineError, EngineResult};

use self::catalog::Catalog;
use self::table_store::TableStore;
use super::{missing_table, Row, Schema, Storage};

const TABLES_SUBDIR: &str = "manager";

fn table_dir(root: &Path, link: u16) -> PathBuf {
    let [hi, lo] = link.to_be_bytes();
    root.join(TABLES_SUBDIR).join(format!("{hi:02X}")).join(format!("{lo:02X}"))
}

/// Keeps every table's schema and rows in files under a root directory,
/// surviving process restarts.
pub struct OnDiskStorage {
    root: PathBuf,
    catalog: Catalog,
    tables: HashMap<String, TableStore>,
}

impl OnDiskStorage {
    /// Opens (creating if necessary) the store rooted at `root`, loading
    /// every table the catalog still lists.
    pub fn open(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(TABLES_SUBDIR))?;
        let catalog = Catalog::open(&root)?;

        let mut tables = HashMap::new();
        for name in catalog.table_names() {
            let link = catalog.get(&name).expect("just listed by the catalog");
            let store = TableStore::open(table_dir(&root, link))?;
            tables.insert(name, store);
        }

        Ok(Self { root, catalog, tables })
    }

    fn table_mut(&mut self, name: &str) -> EngineResult<&mut TableStore> {
        self.tables.get_mut(name).ok_or_else(|| missing_table(name))
    }

    fn table(&self, name: &str) -> EngineResult<&TableStore> {
        self.tables.get(name).ok_or_else(|| missing_table(name))
    }
}

impl Storage for OnDiskStorage {
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

        let link = self.catalog.create(&stmt.table)?;
        let schema = Schema {
            name: stmt.table.clone(),
            columns: stmt.columns.clone(),
            options: stmt.options.clone(),
        };
        let store = TableStore::create(table_dir(&self.root, link), schema)?;
        self.tables.insert(stmt.table.clone(), store);
        Ok(())
    }

    fn drop_table(&mut self, table: &str, if_exists: bool) -> EngineResult<()> {
        if !self.tables.contains_key(table) {
            return if if_exists { Ok(()) } else { Err(missing_table(table)) };
        }
        let link = self.catalog.drop(table)?;
        self.tables.remove(table);
        TableStore::delete_dir(&table_dir(&self.root, link))
    }

    fn alter_table(&mut self, stmt: &AlterTableStatement) -> EngineResult<()> {
        if let AlterAction::RenameTable { new_name } = &stmt.action {
            if self.tables.contains_key(new_name) {
                return Err(EngineError::SchemaError(format!(
                    "table already exists: {new_name}"
                )));
            }
            self.catalog.rename(&stmt.table, new_name)?;
            let mut store = self
                .tables
                .remove(&stmt.table)
                .ok_or_else(|| missing_table(&stmt.table))?;
            store.rename(new_name);
            self.tables.insert(new_name.clone(), store);
            return Ok(());
        }

        self.table_mut(&stmt.table)?.alter(&stmt.action)
    }

    fn insert(&mut self, stmt: &InsertStatement) -> EngineResult<u64> {
        self.table_mut(&stmt.table)?.insert(stmt)
    }

    fn schema(&self, table: &str) -> EngineResult<&Schema> {
        Ok(self.table(table)?.schema())
    }

    fn scan(&self, table: &str) -> EngineResult<&[Row]> {
        Ok(self.table(table)?.rows())
    }

    fn update_rows(
        &mut self,
        table: &str,
        indices: &[usize],
        assignments: &[UpdateAssignment],
    ) -> EngineResult<u64> {
        self.table_mut(table)?.update_rows(indices, assignments)
    }

    fn delete_rows(&mut self, table: &str, indices: &[usize]) -> EngineResult<()> {
        self.table_mut(table)?.delete_rows(indices)
    }

    fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnDef, DataType, InsertStatement, Literal, TableOptions, Value};

    fn create_users() -> (OnDiskStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = OnDiskStorage::open(dir.path()).unwrap();
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
        storage.create_table(&stmt).unwrap();
        (storage, dir)
    }

    #[test]
    fn test_insert_and_scan_round_trip() {
        let (mut storage, _dir) = create_users();
        storage
            .insert(&InsertStatement {
                table: "users".into(),
                columns: vec![],
                rows: vec![vec![Literal::Integer(1), Literal::String("Ann".into())]],
                span: crate::lexer::Span::default(),
            })
            .unwrap();
        let rows = storage.scan("users").unwrap();
        assert_eq!(rows, &[vec![Value::Integer(1), Value::String("Ann".into())]]);
    }

    #[test]
    fn test_reopen_reloads_table_data() {
        let (mut storage, dir) = create_users();
        storage
            .insert(&InsertStatement {
                table: "users".into(),
                columns: vec![],
                rows: vec![vec![Literal::Integer(1), Literal::String("Ann".into())]],
                span: crate::lexer::Span::default(),
            })
            .unwrap();
        drop(storage);

        let reopened = OnDiskStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.table_names(), vec!["users".to_string()]);
        assert_eq!(
            reopened.scan("users").unwrap(),
            &[vec![Value::Integer(1), Value::String("Ann".into())]]
        );
    }

    #[test]
    fn test_drop_table_removes_its_directory() {
        let (mut storage, dir) = create_users();
        let link = storage.catalog.get("users").unwrap();
        let path = table_dir(dir.path(), link);
        assert!(path.exists());
        storage.drop_table("users", false).unwrap();
        assert!(!path.exists());
    }
}

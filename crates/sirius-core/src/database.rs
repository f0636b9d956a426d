//! Database manager: a named registry of independent storage backends.
//!
//! Every database is serialized behind one mutex, matching the coarse
//! per-database locking a single-process embedded engine needs: statements
//! never interleave within a database, and different databases never
//! contend with each other.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::ast::{AlterTableStatement, CreateTableStatement, InsertStatement, Statement, UpdateAssignment};
use crate::config::{BackendKind, EngineConfig};
use crate::error::{EngineError, EngineResult};
use crate::executor::{ExecutionOutcome, Executor};
use crate::storage::{InMemoryStorage, OnDiskStorage, Row, Schema, Storage};

/// The name of the database that always exists and can never be renamed or
/// deleted.
pub const DEFAULT_DATABASE: &str = "default";

enum Backend {
    InMemory(InMemoryStorage),
    OnDisk(OnDiskStorage),
}

impl Storage for Backend {
    fn create_table(&mut self, stmt: &CreateTableStatement) -> EngineResult<()> {
        match self {
            Self::InMemory(s) => s.create_table(stmt),
            Self::OnDisk(s) => s.create_table(stmt),
        }
    }

    fn drop_table(&mut self, table: &str, if_exists: bool) -> EngineResult<()> {
        match self {
            Self::InMemory(s) => s.drop_table(table, if_exists),
            Self::OnDisk(s) => s.drop_table(table, if_exists),
        }
    }

    fn alter_table(&mut self, stmt: &AlterTableStatement) -> EngineResult<()> {
        match self {
            Self::InMemory(s) => s.alter_table(stmt),
            Self::OnDisk(s) => s.alter_table(stmt),
        }
    }

    fn insert(&mut self, stmt: &InsertStatement) -> EngineResult<u64> {
        match self {
            Self::InMemory(s) => s.insert(stmt),
            Self::OnDisk(s) => s.insert(stmt),
        }
    }

    fn schema(&self, table: &str) -> EngineResult<&Schema> {
        match self {
            Self::InMemory(s) => s.schema(table),
            Self::OnDisk(s) => s.schema(table),
        }
    }

    fn scan(&self, table: &str) -> EngineResult<&[Row]> {
        match self {
            Self::InMemory(s) => s.scan(table),
            Self::OnDisk(s) => s.scan(table),
        }
    }

    fn update_rows(
        &mut self,
        table: &str,
        indices: &[usize],
        assignments: &[UpdateAssignment],
    ) -> EngineResult<u64> {
        match self {
            Self::InMemory(s) => s.update_rows(table, indices, assignments),
            Self::OnDisk(s) => s.update_rows(table, indices, assignments),
        }
    }

    fn delete_rows(&mut self, table: &str, indices: &[usize]) -> EngineResult<()> {
        match self {
            Self::InMemory(s) => s.delete_rows(table, indices),
            Self::OnDisk(s) => s.delete_rows(table, indices),
        }
    }

    fn table_names(&self) -> Vec<String> {
        match self {
            Self::InMemory(s) => s.table_names(),
            Self::OnDisk(s) => s.table_names(),
        }
    }
}

/// Owns every database the engine knows about and routes statements to the
/// right one.
pub struct DatabaseManager {
    config: EngineConfig,
    databases: Mutex<HashMap<String, Backend>>,
}

impl DatabaseManager {
    /// Creates a manager with the `default` database already open.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let mut databases = HashMap::new();
        databases.insert(
            DEFAULT_DATABASE.to_string(),
            Self::open_backend(&config, DEFAULT_DATABASE)?,
        );
        Ok(Self {
            config,
            databases: Mutex::new(databases),
        })
    }

    fn open_backend(config: &EngineConfig, name: &str) -> EngineResult<Backend> {
        match config.default_backend {
            BackendKind::InMemory => Ok(Backend::InMemory(InMemoryStorage::new())),
            BackendKind::OnDisk => {
                Ok(Backend::OnDisk(OnDiskStorage::open(config.data_dir.join(name))?))
            }
        }
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, HashMap<String, Backend>>> {
        self.databases
            .lock()
            .map_err(|_| EngineError::InternalError("database registry lock poisoned".into()))
    }

    /// Creates a new, empty database.
    pub fn create_database(&self, name: &str) -> EngineResult<()> {
        let mut dbs = self.lock()?;
        if dbs.contains_key(name) {
            return Err(EngineError::SchemaError(format!(
                "database already exists: {name}"
            )));
        }
        let backend = Self::open_backend(&self.config, name)?;
        dbs.insert(name.to_string(), backend);
        Ok(())
    }

    /// Renames a database. The `default` database can never be renamed.
    pub fn rename_database(&self, name: &str, new_name: &str) -> EngineResult<()> {
        if name == DEFAULT_DATABASE {
            return Err(EngineError::SchemaError(
                "cannot rename the default database".into(),
            ));
        }
        let mut dbs = self.lock()?;
        if dbs.contains_key(new_name) {
            return Err(EngineError::SchemaError(format!(
                "database already exists: {new_name}"
            )));
        }
        let backend = dbs
            .remove(name)
            .ok_or_else(|| EngineError::NameError(format!("no such database: {name}")))?;
        dbs.insert(new_name.to_string(), backend);
        Ok(())
    }

    /// Deletes a database. The `default` database can never be deleted.
    pub fn delete_database(&self, name: &str) -> EngineResult<()> {
        if name == DEFAULT_DATABASE {
            return Err(EngineError::SchemaError(
                "cannot delete the default database".into(),
            ));
        }
        let mut dbs = self.lock()?;
        dbs.remove(name)
            .ok_or_else(|| EngineError::NameError(format!("no such database: {name}")))?;
        Ok(())
    }

    /// Lists every database, sorted by name.
    pub fn list_databases(&self) -> EngineResult<Vec<String>> {
        let dbs = self.lock()?;
        let mut names: Vec<String> = dbs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Executes one statement against the named database.
    pub fn execute(&self, database: &str, statement: &Statement) -> EngineResult<ExecutionOutcome> {
        let mut dbs = self.lock()?;
        let backend = dbs
            .get_mut(database)
            .ok_or_else(|| EngineError::NameError(format!("no such database: {database}")))?;
        Executor::new(backend).execute(statement)
    }

    /// Resolves the declared type name of each column in `columns`, used to
    /// fill in a `SELECT` response's header.
    pub fn column_types(
        &self,
        database: &str,
        table: &str,
        columns: &[String],
    ) -> EngineResult<Vec<String>> {
        let dbs = self.lock()?;
        let backend = dbs
            .get(database)
            .ok_or_else(|| EngineError::NameError(format!("no such database: {database}")))?;
        let schema = backend.schema(table)?;
        Ok(columns
            .iter()
            .map(|name| {
                schema
                    .column_index(name)
                    .map_or_else(|| "UNKNOWN".to_string(), |i| {
                        schema.columns[i].data_type.as_str().to_string()
                    })
            })
            .collect())
    }
}

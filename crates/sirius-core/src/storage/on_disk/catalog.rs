//! Database-level table catalog: `manager.db` (name key -> link) plus
//! `meta.mt`, a recycle log of links freed by dropped tables.
//!
//! Grounded on `Catalog`/`setLink`/`dropTable` in the reference physical
//! storage layer: an append-only record file, a tombstone-on-drop scheme,
//! and a LIFO recycle log consulted before minting a fresh link.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::name_key::{self, KEY_LEN};
use crate::error::{EngineError, EngineResult};

const RECORD_LEN: u64 = (KEY_LEN + 2) as u64;

struct Entry {
    link: u16,
    offset: u64,
}

/// Maps table names to their catalog link, backed by `manager.db`/`meta.mt`.
pub struct Catalog {
    manager_path: PathBuf,
    meta_path: PathBuf,
    entries: HashMap<[u8; KEY_LEN], Entry>,
}

fn open_rw(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).create(true).open(path)
}

impl Catalog {
    /// Opens (creating if necessary) the catalog files under `dir`, loading
    /// every live record from `manager.db`.
    pub fn open(dir: &Path) -> EngineResult<Self> {
        let manager_path = dir.join("manager.db");
        let meta_path = dir.join("meta.mt");
        // Touch both files into existence.
        open_rw(&manager_path)?;
        open_rw(&meta_path)?;

        let mut entries = HashMap::new();
        let mut file = File::open(&manager_path)?;
        let mut offset = 0u64;
        let mut buf = [0u8; RECORD_LEN as usize];
        loop {
            match file.read_exact(&mut buf) {
                Ok(()) => {
                    let mut key = [0u8; KEY_LEN];
                    key.copy_from_slice(&buf[..KEY_LEN]);
                    if key != name_key::TOMBSTONE {
                        let link = u16::from_le_bytes([buf[KEY_LEN], buf[KEY_LEN + 1]]);
                        entries.insert(key, Entry { link, offset });
                    }
                    offset += RECORD_LEN;
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Self { manager_path, meta_path, entries })
    }

    /// Looks up a table's link by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u16> {
        let key = name_key::encode(name).ok()?;
        self.entries.get(&key).map(|e| e.link)
    }

    /// Lists every live table name in the catalog.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.entries.keys().map(name_key::decode).collect()
    }

    /// Allocates a link for a new table and persists the `(name, link)`
    /// pair. Pops a recycled link from `meta.mt` when one is available,
    /// otherwise mints the next sequential link.
    pub fn create(&mut self, name: &str) -> EngineResult<u16> {
        let key = name_key::encode(name)?;
        if self.entries.contains_key(&key) {
            return Err(EngineError::SchemaError(format!(
                "table already exists: {name}"
            )));
        }

        let link = self.pop_recycled_link()?.unwrap_or(self.entries.len() as u16);

        let mut manager = OpenOptions::new().append(true).open(&self.manager_path)?;
        let offset = manager.metadata()?.len();
        manager.write_all(&key)?;
        manager.write_all(&link.to_le_bytes())?;
        manager.flush()?;

        self.entries.insert(key, Entry { link, offset });
        Ok(link)
    }

    /// Tombstones `name`'s catalog record and pushes its link onto the
    /// recycle log, returning the link so the caller can delete the
    /// table's column files.
    pub fn drop(&mut self, name: &str) -> EngineResult<u16> {
        let key = name_key::encode(name)?;
        let entry = self
            .entries
            .remove(&key)
            .ok_or_else(|| EngineError::NameError(format!("no such table: {name}")))?;

        let mut manager = open_rw(&self.manager_path)?;
        manager.seek(SeekFrom::Start(entry.offset))?;
        manager.write_all(&[0xFFu8; RECORD_LEN as usize])?;
        manager.flush()?;

        let mut meta = OpenOptions::new().append(true).open(&self.meta_path)?;
        meta.write_all(&entry.link.to_le_bytes())?;
        meta.flush()?;

        Ok(entry.link)
    }

    /// Renames a table in place: the link (and so its on-disk directory)
    /// is unchanged, only the catalog's name-key record moves.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> EngineResult<()> {
        let new_key = name_key::encode(new_name)?;
        if self.entries.contains_key(&new_key) {
            return Err(EngineError::SchemaError(format!(
                "table already exists: {new_name}"
            )));
        }
        let old_key = name_key::encode(old_name)?;
        let entry = self
            .entries
            .remove(&old_key)
            .ok_or_else(|| EngineError::NameError(format!("no such table: {old_name}")))?;

        let mut manager = open_rw(&self.manager_path)?;
        manager.seek(SeekFrom::Start(entry.offset))?;
        manager.write_all(&[0xFFu8; RECORD_LEN as usize])?;
        manager.seek(SeekFrom::End(0))?;
        let new_offset = manager.stream_position()?;
        manager.write_all(&new_key)?;
        manager.write_all(&entry.link.to_le_bytes())?;
        manager.flush()?;

        self.entries.insert(new_key, Entry { link: entry.link, offset: new_offset });
        Ok(())
    }

    fn pop_recycled_link(&self) -> io::Result<Option<u16>> {
        let len = self.meta_path.metadata().map(|m| m.len()).unwrap_or(0);
        if len < 2 {
            return Ok(None);
        }
        let mut file = open_rw(&self.meta_path)?;
        file.seek(SeekFrom::End(-2))?;
        let mut buf = [0u8; 2];
        file.read_exact(&mut buf)?;
        file.set_len(len - 2)?;
        Ok(Some(u16::from_le_bytes(buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();
        let link = catalog.create("users").unwrap();
        assert_eq!(catalog.get("users"), Some(link));
        assert_eq!(catalog.get("ghost"), None);
    }

    #[test]
    fn test_drop_recycles_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();
        let first = catalog.create("a").unwrap();
        catalog.drop("a").unwrap();
        let second = catalog.create("b").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rename_preserves_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(dir.path()).unwrap();
        let link = catalog.create("old").unwrap();
        catalog.rename("old", "new").unwrap();
        assert_eq!(catalog.get("old"), None);
        assert_eq!(catalog.get("new"), Some(link));
    }

    #[test]
    fn test_reopen_loads_live_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut catalog = Catalog::open(dir.path()).unwrap();
            catalog.create("a").unwrap();
            catalog.create("b").unwrap();
            catalog.drop("a").unwrap();
        }
        let reopened = Catalog::open(dir.path()).unwrap();
        assert_eq!(reopened.get("a"), None);
        assert!(reopened.get("b").is_some());
    }
}

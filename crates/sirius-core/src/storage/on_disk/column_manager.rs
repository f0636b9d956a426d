//! Per-column storage: orchestrates a `.dt` block file plus, for
//! variable-width columns, a `.bg` heap and a lazily-loaded `.sp` freelist.
//!
//! Grounded on `ColumnManager`: a facade over the lower-level block/heap/
//! freelist workers that knows how to turn a [`Value`] into its 8-byte
//! block-file cell and back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ast::{DataType, Value};

use super::block_io::{BlockDataIO, RECORD_SIZE};
use super::heap_io::HeapIO;
use super::space_manager::{self, FreeSpaceRecord};

/// Sentinel offset denoting "no heap reference" (null, for a variable-width
/// column).
const NULL_OFFSET: u64 = u64::MAX;
/// All-`0xFF` marks a null fixed-width cell.
const NULL_FIXED: [u8; RECORD_SIZE] = [0xFF; RECORD_SIZE];

fn is_variable_length(data_type: DataType) -> bool {
    matches!(data_type, DataType::Varchar)
}

fn file_stem(link: u16) -> String {
    format!("{link:04X}")
}

pub struct ColumnManager {
    data_type: DataType,
    block_io: BlockDataIO,
    heap_io: Option<HeapIO>,
    sp_path: Option<PathBuf>,
    freelist: Option<Vec<FreeSpaceRecord>>,
    freelist_dirty: bool,
}

impl ColumnManager {
    /// Opens (creating if necessary) the files backing `column_link` inside
    /// `table_dir`.
    pub fn open(table_dir: &Path, column_link: u16, data_type: DataType) -> io::Result<Self> {
        let stem = file_stem(column_link);
        let dt_path = table_dir.join(format!("{stem}.dt"));
        let block_io = BlockDataIO::open(dt_path)?;

        let (heap_io, sp_path) = if is_variable_length(data_type) {
            let bg_path = table_dir.join(format!("{stem}.bg"));
            (Some(HeapIO::open(bg_path)?), Some(table_dir.join(format!("{stem}.sp"))))
        } else {
            (None, None)
        };

        Ok(Self {
            data_type,
            block_io,
            heap_io,
            sp_path,
            freelist: None,
            freelist_dirty: false,
        })
    }

    /// Deletes every file a column may have created.
    pub fn drop_files(table_dir: &Path, column_link: u16) {
        let stem = file_stem(column_link);
        for ext in ["dt", "bg", "sp"] {
            let _ = fs::remove_file(table_dir.join(format!("{stem}.{ext}")));
        }
    }

    pub fn row_count(&self) -> io::Result<u64> {
        self.block_io.row_count()
    }

    pub fn append_value(&mut self, value: &Value) -> io::Result<()> {
        let block = self.serialize(value)?;
        self.block_io.append(&block)
    }

    pub fn read_value(&mut self, row_index: u64) -> io::Result<Value> {
        let block = self.block_io.read_at(row_index)?;
        self.deserialize(&block)
    }

    /// Updates the value at `row_index`, freeing the old heap payload
    /// first (for variable-width columns) so the new write can reuse it.
    pub fn update_value(&mut self, row_index: u64, new_value: &Value) -> io::Result<()> {
        if is_variable_length(self.data_type) {
            let old_block = self.block_io.read_at(row_index)?;
            let old_offset = u64::from_le_bytes(old_block);
            if old_offset != NULL_OFFSET {
                self.free_heap_chunk(old_offset)?;
            }
        }
        let block = self.serialize(new_value)?;
        self.block_io.write_at(row_index, &block)
    }

    /// Swap-and-pop deletion: frees the deleted row's heap payload (if
    /// any), overwrites its cell with the last row's, then truncates.
    pub fn swap_and_pop(&mut self, row_index: u64) -> io::Result<()> {
        let row_count = self.block_io.row_count()?;
        if row_index >= row_count {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "row index out of bounds"));
        }
        let last_index = row_count - 1;

        if is_variable_length(self.data_type) {
            let deleted_block = self.block_io.read_at(row_index)?;
            let deleted_offset = u64::from_le_bytes(deleted_block);
            if deleted_offset != NULL_OFFSET {
                self.free_heap_chunk(deleted_offset)?;
            }
        }

        if row_index != last_index {
            let last = self.block_io.read_last()?;
            self.block_io.write_at(row_index, &last)?;
        }
        self.block_io.truncate_last()
    }

    pub fn flush_freelist(&mut self) -> io::Result<()> {
        if self.freelist_dirty {
            if let (Some(records), Some(path)) = (&self.freelist, &self.sp_path) {
                space_manager::persist(path, records)?;
            }
            self.freelist_dirty = false;
        }
        Ok(())
    }

    fn ensure_freelist_loaded(&mut self) -> io::Result<()> {
        if self.freelist.is_none() {
            let path = self.sp_path.as_deref().expect("only called for variable-width columns");
            self.freelist = Some(space_manager::load(path)?);
            self.freelist_dirty = false;
        }
        Ok(())
    }

    fn free_heap_chunk(&mut self, offset: u64) -> io::Result<()> {
        let len_bytes = self.heap_io.as_mut().expect("variable-width").read(offset, 2)?;
        let payload_len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]);
        self.ensure_freelist_loaded()?;
        space_manager::add(self.freelist.as_mut().unwrap(), offset, 2 + payload_len);
        self.freelist_dirty = true;
        Ok(())
    }

    fn serialize(&mut self, value: &Value) -> io::Result<[u8; RECORD_SIZE]> {
        if is_variable_length(self.data_type) {
            return self.serialize_varchar(value);
        }
        Ok(serialize_fixed(value, self.data_type))
    }

    fn serialize_varchar(&mut self, value: &Value) -> io::Result<[u8; RECORD_SIZE]> {
        let offset = match value {
            Value::Null => NULL_OFFSET,
            Value::String(s) => {
                let len = u16::try_from(s.len()).map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        "VARCHAR payload exceeds the 65535-byte on-disk heap limit",
                    )
                })?;
                let mut payload = Vec::with_capacity(2 + s.len());
                payload.extend_from_slice(&len.to_le_bytes());
                payload.extend_from_slice(s.as_bytes());
                let payload_size = payload.len() as u16;

                self.ensure_freelist_loaded()?;
                let claimed = space_manager::claim(self.freelist.as_mut().unwrap(), payload_size);
                match claimed {
                    Some(chunk) => {
                        self.heap_io.as_mut().unwrap().write_at(chunk.offset, &payload)?;
                        self.freelist_dirty = true;
                        if chunk.length > payload_size {
                            space_manager::add(
                                self.freelist.as_mut().unwrap(),
                                chunk.offset + u64::from(payload_size),
                                chunk.length - payload_size,
                            );
                        }
                        chunk.offset
                    }
                    None => self.heap_io.as_mut().unwrap().append(&payload)?,
                }
            }
            _ => NULL_OFFSET,
        };
        Ok(offset.to_le_bytes())
    }

    fn deserialize(&mut self, block: &[u8; RECORD_SIZE]) -> io::Result<Value> {
        if is_variable_length(self.data_type) {
            let offset = u64::from_le_bytes(*block);
            if offset == NULL_OFFSET {
                return Ok(Value::Null);
            }
            let heap = self.heap_io.as_mut().expect("variable-width");
            let len_bytes = heap.read(offset, 2)?;
            let len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
            if len == 0 {
                return Ok(Value::String(String::new()));
            }
            let bytes = heap.read(offset + 2, len)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            return Ok(Value::String(s));
        }
        Ok(deserialize_fixed(block, self.data_type))
    }
}

impl Drop for ColumnManager {
    fn drop(&mut self) {
        let _ = self.flush_freelist();
    }
}

fn serialize_fixed(value: &Value, data_type: DataType) -> [u8; RECORD_SIZE] {
    if value.is_null() {
        return NULL_FIXED;
    }
    let mut block = [0u8; RECORD_SIZE];
    match (value, data_type) {
        (Value::Integer(i), DataType::Int | DataType::Date | DataType::Timestamp) => {
            block.copy_from_slice(&i.to_le_bytes());
        }
        (Value::Double(d), DataType::Double) => block.copy_from_slice(&d.to_le_bytes()),
        (Value::Boolean(b), DataType::Boolean) => block[0] = u8::from(*b),
        _ => return NULL_FIXED,
    }
    block
}

fn deserialize_fixed(block: &[u8; RECORD_SIZE], data_type: DataType) -> Value {
    if *block == NULL_FIXED {
        return Value::Null;
    }
    match data_type {
        DataType::Int | DataType::Date | DataType::Timestamp => Value::Integer(i64::from_le_bytes(*block)),
        DataType::Double => Value::Double(f64::from_le_bytes(*block)),
        DataType::Boolean => Value::Boolean(block[0] != 0),
        DataType::Varchar | DataType::Unknown => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &Path, link: u16, data_type: DataType) -> ColumnManager {
        ColumnManager::open(dir, link, data_type).unwrap()
    }

    #[test]
    fn test_fixed_width_round_trip_including_null() {
        let dir = tempfile::tempdir().unwrap();
        let mut col = open(dir.path(), 1, DataType::Int);
        col.append_value(&Value::Integer(42)).unwrap();
        col.append_value(&Value::Null).unwrap();
        assert_eq!(col.read_value(0).unwrap(), Value::Integer(42));
        assert_eq!(col.read_value(1).unwrap(), Value::Null);
    }

    #[test]
    fn test_varchar_distinguishes_null_from_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let mut col = open(dir.path(), 2, DataType::Varchar);
        col.append_value(&Value::Null).unwrap();
        col.append_value(&Value::String(String::new())).unwrap();
        col.append_value(&Value::String("hello".into())).unwrap();
        assert_eq!(col.read_value(0).unwrap(), Value::Null);
        assert_eq!(col.read_value(1).unwrap(), Value::String(String::new()));
        assert_eq!(col.read_value(2).unwrap(), Value::String("hello".into()));
    }

    #[test]
    fn test_update_reclaims_freed_heap_space() {
        let dir = tempfile::tempdir().unwrap();
        let mut col = open(dir.path(), 3, DataType::Varchar);
        col.append_value(&Value::String("a longer string".into())).unwrap();
        col.update_value(0, &Value::String("short".into())).unwrap();
        col.flush_freelist().unwrap();
        assert_eq!(col.read_value(0).unwrap(), Value::String("short".into()));

        let sp_path = dir.path().join("0003.sp");
        let freelist = space_manager::load(&sp_path).unwrap();
        assert_eq!(freelist.len(), 1);

        // A value that fits the freed chunk reuses it instead of growing the heap.
        col.append_value(&Value::String("fits!".into())).unwrap();
        let bg_len_before = dir.path().join("0003.bg").metadata().unwrap().len();
        col.update_value(1, &Value::String("fits again".into())).unwrap();
        let bg_len_after = dir.path().join("0003.bg").metadata().unwrap().len();
        assert_eq!(bg_len_before, bg_len_after);
    }

    #[test]
    fn test_swap_and_pop_moves_last_row_into_deleted_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut col = open(dir.path(), 4, DataType::Int);
        col.append_value(&Value::Integer(1)).unwrap();
        col.append_value(&Value::Integer(2)).unwrap();
        col.append_value(&Value::Integer(3)).unwrap();
        col.swap_and_pop(0).unwrap();
        assert_eq!(col.row_count().unwrap(), 2);
        assert_eq!(col.read_value(0).unwrap(), Value::Integer(3));
        assert_eq!(col.read_value(1).unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_swap_and_pop_of_last_row_just_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let mut col = open(dir.path(), 5, DataType::Int);
        col.append_value(&Value::Integer(1)).unwrap();
        col.append_value(&Value::Integer(2)).unwrap();
        col.swap_and_pop(1).unwrap();
        assert_eq!(col.row_count().unwrap(), 1);
        assert_eq!(col.read_value(0).unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_swap_and_pop_frees_deleted_varchar_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut col = open(dir.path(), 6, DataType::Varchar);
        col.append_value(&Value::String("first".into())).unwrap();
        col.append_value(&Value::String("second".into())).unwrap();
        col.swap_and_pop(0).unwrap();
        col.flush_freelist().unwrap();
        let freelist = space_manager::load(&dir.path().join("0006.sp")).unwrap();
        assert_eq!(freelist.len(), 1);
    }
}

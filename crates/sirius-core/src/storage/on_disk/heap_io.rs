//! Append-mostly variable-length payload heap (`.bg`).
//!
//! Grounded on `HeapIO`: data is appended at the current end-of-file to get
//! a fresh offset, or overwritten in place at an offset reclaimed from the
//! column's freelist.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

pub struct HeapIO {
    file: File,
}

impl HeapIO {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        Ok(Self { file })
    }

    /// Appends `data` to the end of the heap, returning its offset.
    pub fn append(&mut self, data: &[u8]) -> io::Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        if !data.is_empty() {
            self.file.write_all(data)?;
            self.file.flush()?;
        }
        Ok(offset)
    }

    /// Reads `length` bytes starting at `offset`.
    pub fn read(&mut self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrites `data` at `offset`, used when reclaiming a freelist chunk.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_returns_growing_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let mut heap = HeapIO::open(dir.path().join("t.bg")).unwrap();
        let a = heap.append(b"hello").unwrap();
        let b = heap.append(b"world!").unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 5);
        assert_eq!(heap.read(a, 5).unwrap(), b"hello");
        assert_eq!(heap.read(b, 6).unwrap(), b"world!");
    }

    #[test]
    fn test_write_at_reclaims_a_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut heap = HeapIO::open(dir.path().join("t.bg")).unwrap();
        let offset = heap.append(b"0123456789").unwrap();
        heap.write_at(offset, b"abcde").unwrap();
        assert_eq!(heap.read(offset, 10).unwrap(), b"abcde56789");
    }
}

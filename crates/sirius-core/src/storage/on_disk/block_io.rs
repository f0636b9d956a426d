//! Fixed 8-byte-record column data file (`.dt`).
//!
//! Grounded on `BlockDataIO`: a single block (512 records, 4 KiB) is kept
//! resident for reads; any write bypasses the buffer and invalidates it.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size in bytes of a single record.
pub const RECORD_SIZE: usize = 8;
/// Number of records held in the read buffer at once.
const BUFFERED_RECORDS: u64 = 512;
const READ_BUFFER_SIZE: usize = RECORD_SIZE * BUFFERED_RECORDS as usize;

pub struct BlockDataIO {
    path: PathBuf,
    file: File,
    buffer: Vec<u8>,
    buffered_block_start: Option<u64>,
}

impl BlockDataIO {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
        Ok(Self {
            path,
            file,
            buffer: vec![0u8; READ_BUFFER_SIZE],
            buffered_block_start: None,
        })
    }

    pub fn row_count(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len() / RECORD_SIZE as u64)
    }

    pub fn append(&mut self, record: &[u8; RECORD_SIZE]) -> io::Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(record)?;
        self.file.flush()?;
        self.buffered_block_start = None;
        Ok(())
    }

    pub fn write_at(&mut self, row_index: u64, record: &[u8; RECORD_SIZE]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(row_index * RECORD_SIZE as u64))?;
        self.file.write_all(record)?;
        self.file.flush()?;
        self.buffered_block_start = None;
        Ok(())
    }

    pub fn read_at(&mut self, row_index: u64) -> io::Result<[u8; RECORD_SIZE]> {
        let needs_reload = match self.buffered_block_start {
            Some(start) => row_index < start || row_index >= start + BUFFERED_RECORDS,
            None => true,
        };
        if needs_reload {
            self.load_buffer_for(row_index)?;
        }
        let start = self.buffered_block_start.expect("just loaded");
        let offset = ((row_index - start) * RECORD_SIZE as u64) as usize;
        let mut record = [0u8; RECORD_SIZE];
        record.copy_from_slice(&self.buffer[offset..offset + RECORD_SIZE]);
        Ok(record)
    }

    fn load_buffer_for(&mut self, row_index: u64) -> io::Result<()> {
        let total_rows = self.row_count()?;
        if row_index >= total_rows {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("row index {row_index} out of bounds for {}", self.path.display()),
            ));
        }
        let block_start = (row_index / BUFFERED_RECORDS) * BUFFERED_RECORDS;
        self.file.seek(SeekFrom::Start(block_start * RECORD_SIZE as u64))?;
        self.buffer.fill(0);
        let mut read = 0usize;
        while read < self.buffer.len() {
            let n = self.file.read(&mut self.buffer[read..])?;
            if n == 0 {
                break;
            }
            read += n;
        }
        self.buffered_block_start = Some(block_start);
        Ok(())
    }

    pub fn read_last(&mut self) -> io::Result<[u8; RECORD_SIZE]> {
        let rows = self.row_count()?;
        if rows == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "cannot read last record of an empty block file",
            ));
        }
        self.read_at(rows - 1)
    }

    /// Removes the last record by shrinking the file, invalidating the
    /// read buffer.
    pub fn truncate_last(&mut self) -> io::Result<()> {
        let len = self.file.metadata()?.len();
        if len >= RECORD_SIZE as u64 {
            self.file.set_len(len - RECORD_SIZE as u64)?;
        }
        self.buffered_block_start = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut io = BlockDataIO::open(dir.path().join("t.dt")).unwrap();
        io.append(&[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        io.append(&[2, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(io.row_count().unwrap(), 2);
        assert_eq!(io.read_at(0).unwrap()[0], 1);
        assert_eq!(io.read_at(1).unwrap()[0], 2);
    }

    #[test]
    fn test_write_at_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut io = BlockDataIO::open(dir.path().join("t.dt")).unwrap();
        io.append(&[1; 8]).unwrap();
        io.write_at(0, &[9; 8]).unwrap();
        assert_eq!(io.read_at(0).unwrap(), [9; 8]);
    }

    #[test]
    fn test_truncate_last_shrinks_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut io = BlockDataIO::open(dir.path().join("t.dt")).unwrap();
        io.append(&[1; 8]).unwrap();
        io.append(&[2; 8]).unwrap();
        io.truncate_last().unwrap();
        assert_eq!(io.row_count().unwrap(), 1);
    }

    #[test]
    fn test_reads_span_block_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let mut io = BlockDataIO::open(dir.path().join("t.dt")).unwrap();
        for i in 0..600u64 {
            io.append(&(i).to_le_bytes()).unwrap();
        }
        assert_eq!(u64::from_le_bytes(io.read_at(0).unwrap()), 0);
        assert_eq!(u64::from_le_bytes(io.read_at(511).unwrap()), 511);
        assert_eq!(u64::from_le_bytes(io.read_at(512).unwrap()), 512);
        assert_eq!(u64::from_le_bytes(io.read_at(599).unwrap()), 599);
    }
}

//! Best-fit freelist over a heap file's reclaimed chunks (`.sp`).
//!
//! Grounded on `SpaceManager`: a stateless set of functions over a vector
//! the caller owns, sorted by length ascending so both insertion and
//! best-fit search are a single binary-search point.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

const RECORD_SIZE: usize = 10; // 8-byte offset + 2-byte length

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSpaceRecord {
    pub offset: u64,
    pub length: u16,
}

/// Loads the freelist from `sp_path`. A missing file means nothing has
/// been freed yet, not an error.
pub fn load(sp_path: &Path) -> io::Result<Vec<FreeSpaceRecord>> {
    let mut records = Vec::new();
    let mut file = match File::open(sp_path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(records),
        Err(e) => return Err(e),
    };
    let mut buf = [0u8; RECORD_SIZE];
    loop {
        match file.read_exact(&mut buf) {
            Ok(()) => {
                let offset = u64::from_le_bytes(buf[0..8].try_into().unwrap());
                let length = u16::from_le_bytes(buf[8..10].try_into().unwrap());
                records.push(FreeSpaceRecord { offset, length });
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }
    records.sort_by_key(|r| r.length);
    Ok(records)
}

/// Overwrites `sp_path` with the current in-memory freelist.
pub fn persist(sp_path: &Path, records: &[FreeSpaceRecord]) -> io::Result<()> {
    let mut file = fs::File::create(sp_path)?;
    for record in records {
        file.write_all(&record.offset.to_le_bytes())?;
        file.write_all(&record.length.to_le_bytes())?;
    }
    file.flush()
}

/// Inserts a newly freed chunk, keeping `records` sorted by length.
pub fn add(records: &mut Vec<FreeSpaceRecord>, offset: u64, length: u16) {
    if length == 0 {
        return;
    }
    let pos = records.partition_point(|r| r.length < length);
    records.insert(pos, FreeSpaceRecord { offset, length });
}

/// Claims the smallest chunk that is at least `required_length`, removing
/// it from `records`.
pub fn claim(records: &mut Vec<FreeSpaceRecord>, required_length: u16) -> Option<FreeSpaceRecord> {
    if required_length == 0 {
        return None;
    }
    let pos = records.partition_point(|r| r.length < required_length);
    if pos == records.len() {
        return None;
    }
    Some(records.remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_picks_best_fit_not_first_fit() {
        let mut records = Vec::new();
        add(&mut records, 100, 50);
        add(&mut records, 200, 20);
        add(&mut records, 300, 30);
        let claimed = claim(&mut records, 25).unwrap();
        assert_eq!(claimed, FreeSpaceRecord { offset: 300, length: 30 });
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_claim_returns_none_when_nothing_fits() {
        let mut records = vec![FreeSpaceRecord { offset: 0, length: 5 }];
        assert!(claim(&mut records, 10).is_none());
    }

    #[test]
    fn test_persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.sp");
        let records = vec![
            FreeSpaceRecord { offset: 10, length: 4 },
            FreeSpaceRecord { offset: 50, length: 9 },
        ];
        persist(&path, &records).unwrap();
        assert_eq!(load(&path).unwrap(), records);
    }
}

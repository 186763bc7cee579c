//! Directory records and blocks. A directory block is a sequence of
//! fixed-width child records; reading stops at the block's capacity or at a
//! sentinel record whose `created` timestamp is zero.

use crate::error::{Error, Result};
use crate::layout::{DIRENT_BYTES, NAME_BYTES};

/// One child of a directory: a file or a nested directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub head: i32,
    pub created: i64,
    pub last_access: i64,
    pub last_modified: i64,
}

impl ChildRecord {
    pub fn new_file(name: &str, head: i32, now: i64) -> Self {
        ChildRecord {
            name: name.to_string(),
            is_dir: false,
            size: 0,
            head,
            created: now,
            last_access: now,
            last_modified: now,
        }
    }

    pub fn new_dir(name: &str, head: i32, now: i64) -> Self {
        ChildRecord {
            name: name.to_string(),
            is_dir: true,
            size: 0,
            head,
            created: now,
            last_access: now,
            last_modified: now,
        }
    }

    /// Encodes field order created, last-access, last-modified, size, head,
    /// is-dir, name (padded to `NAME_BYTES`).
    pub fn encode(&self) -> Result<[u8; DIRENT_BYTES as usize]> {
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > NAME_BYTES {
            return Err(Error::InvalidPath(format!(
                "name {} longer than {NAME_BYTES} bytes",
                self.name
            )));
        }
        if self.created == 0 {
            return Err(Error::Internal("created timestamp 0 collides with the sentinel".into()));
        }
        let mut buf = [0u8; DIRENT_BYTES as usize];
        let mut offset = 0usize;
        buf[offset..offset + 8].copy_from_slice(&self.created.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.last_access.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.last_modified.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.size.to_le_bytes());
        offset += 8;
        buf[offset..offset + 4].copy_from_slice(&self.head.to_le_bytes());
        offset += 4;
        buf[offset] = if self.is_dir { 1 } else { 0 };
        offset += 1;
        buf[offset..offset + name_bytes.len()].copy_from_slice(name_bytes);
        Ok(buf)
    }

    /// Decodes one record, or `None` if it is the sentinel (`created == 0`).
    pub fn decode(raw: &[u8]) -> Result<Option<Self>> {
        if raw.len() < DIRENT_BYTES as usize {
            return Err(Error::CorruptImage("directory record shorter than expected".into()));
        }
        let created = i64::from_le_bytes(raw[0..8].try_into().unwrap_or([0; 8]));
        if created == 0 {
            return Ok(None);
        }
        let last_access = i64::from_le_bytes(raw[8..16].try_into().unwrap_or([0; 8]));
        let last_modified = i64::from_le_bytes(raw[16..24].try_into().unwrap_or([0; 8]));
        let size = u64::from_le_bytes(raw[24..32].try_into().unwrap_or([0; 8]));
        let head = i32::from_le_bytes(raw[32..36].try_into().unwrap_or([0; 4]));
        let is_dir = raw[36] != 0;
        let name_bytes = &raw[37..37 + NAME_BYTES];
        let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_BYTES);
        let name = String::from_utf8(name_bytes[..nul].to_vec())
            .map_err(|e| Error::CorruptImage(format!("non-UTF-8 directory entry name: {e}")))?;
        Ok(Some(ChildRecord { name, is_dir, size, head, created, last_access, last_modified }))
    }
}

/// Reads every record out of one directory block's raw bytes, stopping at
/// capacity or at the first sentinel.
pub fn read_records(block: &[u8], records_per_block: usize) -> Result<Vec<ChildRecord>> {
    let mut out = Vec::new();
    for i in 0..records_per_block {
        let offset = i * DIRENT_BYTES as usize;
        match ChildRecord::decode(&block[offset..offset + DIRENT_BYTES as usize])? {
            Some(record) => out.push(record),
            None => break,
        }
    }
    Ok(out)
}

/// Serializes `records` into a full directory block, zero-filling the rest
/// (whose leading `created == 0` byte is the sentinel that stops a read).
pub fn write_records(records: &[ChildRecord], block_size: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; block_size as usize];
    for (i, record) in records.iter().enumerate() {
        let offset = i * DIRENT_BYTES as usize;
        let encoded = record.encode()?;
        buf[offset..offset + DIRENT_BYTES as usize].copy_from_slice(&encoded);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips_a_record() {
        let record = ChildRecord::new_file("report.txt", 42, 1_000);
        let encoded = record.encode().unwrap();
        let decoded = ChildRecord::decode(&encoded).unwrap().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_recognizes_the_zero_sentinel() {
        let buf = [0u8; DIRENT_BYTES as usize];
        assert!(ChildRecord::decode(&buf).unwrap().is_none());
    }

    #[test]
    fn read_records_stops_at_sentinel() {
        let a = ChildRecord::new_file("a", 1, 10);
        let b = ChildRecord::new_dir("b", 2, 11);
        let block = write_records(&[a.clone(), b.clone()], 4_000).unwrap();
        let records = read_records(&block, 25).unwrap();
        assert_eq!(records, vec![a, b]);
    }

    #[test]
    fn rejects_overlong_names() {
        let record = ChildRecord::new_file(&"x".repeat(NAME_BYTES + 1), 1, 1);
        assert!(record.encode().is_err());
    }
}

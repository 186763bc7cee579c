//! The backing store: a fixed-size file treated as an array of equal-sized
//! blocks, addressed by index. This is the only module that touches
//! `std::fs::File` directly; everything above it speaks in block numbers.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::layout::Layout;

pub struct BackingStore {
    file: File,
    pub layout: Layout,
}

impl BackingStore {
    /// Opens `path` in create-if-missing read/write mode. Returns whether the
    /// image was freshly created (length zero before this call) so the
    /// caller knows to initialize bitmap, FAT, and root directory rather
    /// than parse them.
    pub fn open(path: &Path, layout: Layout) -> Result<(Self, bool)> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| Error::ImageOpenError(format!("{}: {e}", path.display())))?;
        let is_new = file
            .metadata()
            .map_err(|e| Error::ImageOpenError(format!("{}: {e}", path.display())))?
            .len()
            == 0;
        if is_new {
            file.set_len(layout.image_bytes())
                .map_err(|e| Error::ImageOpenError(format!("{}: {e}", path.display())))?;
        }
        Ok((BackingStore { file, layout }, is_new))
    }

    fn offset_of(&self, block: u64) -> u64 {
        block * self.layout.block_size
    }

    pub fn read_block(&mut self, block: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.layout.block_size as usize];
        self.file.seek(SeekFrom::Start(self.offset_of(block)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn write_block(&mut self, block: u64, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len() as u64, self.layout.block_size, "block write must be exactly one block wide");
        self.file.seek(SeekFrom::Start(self.offset_of(block)))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Reads `count` consecutive blocks starting at `start` as one buffer.
    pub fn read_region(&mut self, start: u64, count: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; (count * self.layout.block_size) as usize];
        self.file.seek(SeekFrom::Start(self.offset_of(start)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Writes a buffer spanning `count` consecutive blocks starting at `start`.
    pub fn write_region(&mut self, start: u64, count: u64, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len() as u64, count * self.layout.block_size);
        self.file.seek(SeekFrom::Start(self.offset_of(start)))?;
        self.file.write_all(data)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcore_config::FilesystemSection;

    fn layout() -> Layout {
        Layout::new(&FilesystemSection { block_size: 128, capacity: 128 * 20, fill_byte: 0xFF })
    }

    #[test]
    fn fresh_image_is_zero_length_before_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.img");
        let (_store, is_new) = BackingStore::open(&path, layout()).unwrap();
        assert!(is_new);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), layout().image_bytes());
    }

    #[test]
    fn write_then_read_round_trips_a_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.img");
        let (mut store, _) = BackingStore::open(&path, layout()).unwrap();
        let data = vec![0x42u8; layout().block_size as usize];
        store.write_block(5, &data).unwrap();
        let read_back = store.read_block(5).unwrap();
        assert_eq!(read_back, data);
    }

    #[test]
    fn reopening_an_existing_image_is_not_reported_as_new() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.img");
        let (_store, is_new) = BackingStore::open(&path, layout()).unwrap();
        assert!(is_new);
        drop(_store);
        let (_store2, is_new2) = BackingStore::open(&path, layout()).unwrap();
        assert!(!is_new2);
    }
}

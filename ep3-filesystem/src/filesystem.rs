//! The mounted filesystem: owns the backing image, the in-memory bitmap and
//! FAT, and every shell-reachable operation. There is no separate
//! in-memory tree of directory nodes — every lookup walks the image block
//! by block, on demand, write-through.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use simcore_config::FilesystemSection;

use crate::bitmap::Bitmap;
use crate::dirent::{self, ChildRecord};
use crate::error::{Error, Result};
use crate::fat::Fat;
use crate::image::BackingStore;
use crate::layout::{Layout, FAT_TERMINATOR};
use crate::path;

fn now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(1)
}

fn blocks_needed(len: usize, block_size: usize) -> usize {
    if len == 0 {
        1
    } else {
        (len + block_size - 1) / block_size
    }
}

/// A mounted image: the backing store plus the in-memory bitmap and FAT
/// decoded from it. Exists only while mounted — `unmount` consumes it.
pub struct Filesystem {
    store: BackingStore,
    bitmap: Bitmap,
    fat: Fat,
    layout: Layout,
}

impl Filesystem {
    pub fn mount(image_path: &Path, cfg: &FilesystemSection) -> Result<Self> {
        let layout = Layout::new(cfg);
        let (mut store, is_new) = BackingStore::open(image_path, layout)?;

        if is_new {
            let bitmap = Bitmap::new_formatted(&layout);
            let fat = Fat::new_formatted(&layout);
            let mut fs = Filesystem { store, bitmap, fat, layout };
            fs.persist_metadata()?;
            fs.write_dir_block(layout.root_block, &[])?;
            tracing::info!(path = %image_path.display(), blocks = layout.total_blocks, "formatted new image");
            Ok(fs)
        } else {
            let bitmap_region = store.read_region(0, layout.bitmap_blocks)?;
            let bitmap = Bitmap::decode(&bitmap_region, &layout)?;
            let fat_region = store.read_region(layout.bitmap_blocks, layout.fat_blocks)?;
            let fat = Fat::decode(&fat_region, &layout)?;
            tracing::info!(path = %image_path.display(), "mounted existing image");
            Ok(Filesystem { store, bitmap, fat, layout })
        }
    }

    /// Flushes bitmap, FAT, and the underlying file, then consumes `self` so
    /// no further operation can be issued without mounting again.
    pub fn unmount(mut self) -> Result<()> {
        self.persist_metadata()?;
        self.store.flush()
    }

    pub fn df(&self) -> (u64, u64) {
        (self.bitmap.free_count() as u64, self.layout.total_blocks)
    }

    fn persist_metadata(&mut self) -> Result<()> {
        let bitmap_bytes = self.bitmap.encode(&self.layout);
        self.store.write_region(0, self.layout.bitmap_blocks, &bitmap_bytes)?;
        let fat_bytes = self.fat.encode(&self.layout);
        self.store.write_region(self.layout.bitmap_blocks, self.layout.fat_blocks, &fat_bytes)?;
        Ok(())
    }

    fn read_dir_block(&mut self, block: u64) -> Result<Vec<ChildRecord>> {
        let raw = self.store.read_block(block)?;
        dirent::read_records(&raw, self.layout.records_per_block())
    }

    fn write_dir_block(&mut self, block: u64, records: &[ChildRecord]) -> Result<()> {
        if records.len() > self.layout.records_per_block() {
            return Err(Error::DirFull);
        }
        let buf = dirent::write_records(records, self.layout.block_size)?;
        self.store.write_block(block, &buf)
    }

    /// Walks from the root down `path`'s components, requiring every one to
    /// be a directory, and returns the final directory's block index.
    fn resolve_dir_block(&mut self, dir_path: &str) -> Result<u64> {
        let components = path::split(dir_path)?;
        let mut current = self.layout.root_block;
        let mut walked = String::new();
        for component in components {
            walked.push('/');
            walked.push_str(component);
            let records = self.read_dir_block(current)?;
            let record = records
                .iter()
                .find(|r| r.name == component)
                .ok_or_else(|| Error::NoSuchDir(walked.clone()))?;
            if !record.is_dir {
                return Err(Error::NotADirectory(walked.clone()));
            }
            current = record.head as u64;
        }
        Ok(current)
    }

    fn write_chain(&mut self, data: &[u8]) -> Result<i32> {
        let block_size = self.layout.block_size as usize;
        let needed = blocks_needed(data.len(), block_size);
        let mut allocated = Vec::with_capacity(needed);
        for _ in 0..needed {
            match self.bitmap.allocate(self.layout.data_start) {
                Ok(block) => allocated.push(block),
                Err(e) => {
                    for block in &allocated {
                        self.bitmap.mark_free(*block);
                    }
                    return Err(e);
                }
            }
        }
        for (i, &block) in allocated.iter().enumerate() {
            let start = i * block_size;
            let end = std::cmp::min(start + block_size, data.len());
            let mut buf = vec![0u8; block_size];
            buf[..end - start].copy_from_slice(&data[start..end]);
            if let Err(e) = self.store.write_block(block, &buf) {
                for block in &allocated {
                    self.bitmap.mark_free(*block);
                }
                return Err(e);
            }
            let next = if i + 1 < allocated.len() { allocated[i + 1] as i32 } else { FAT_TERMINATOR };
            self.fat.set_next(block, next);
        }
        Ok(allocated[0] as i32)
    }

    fn free_chain(&mut self, head: i32) -> Result<()> {
        for block in self.fat.chain(head)? {
            self.bitmap.mark_free(block);
        }
        Ok(())
    }

    pub fn mkdir(&mut self, dir_path: &str) -> Result<()> {
        let (parent_path, name) = path::split_parent(dir_path)?;
        let parent_block = self.resolve_dir_block(&parent_path)?;
        let mut records = self.read_dir_block(parent_block)?;
        if records.iter().any(|r| r.name == name) {
            return Err(Error::AlreadyExists(dir_path.to_string()));
        }
        if records.len() >= self.layout.records_per_block() {
            return Err(Error::DirFull);
        }
        let new_block = self.bitmap.allocate(self.layout.data_start)?;
        if let Err(e) = self.write_dir_block(new_block, &[]) {
            self.bitmap.mark_free(new_block);
            return Err(e);
        }
        records.push(ChildRecord::new_dir(name, new_block as i32, now()));
        if let Err(e) = self.write_dir_block(parent_block, &records) {
            self.bitmap.mark_free(new_block);
            return Err(e);
        }
        self.persist_metadata()
    }

    pub fn touch(&mut self, file_path: &str) -> Result<()> {
        let (parent_path, name) = path::split_parent(file_path)?;
        let parent_block = self.resolve_dir_block(&parent_path)?;
        let mut records = self.read_dir_block(parent_block)?;
        if let Some(existing) = records.iter_mut().find(|r| r.name == name) {
            if existing.is_dir {
                return Err(Error::IsDirectory(file_path.to_string()));
            }
            existing.last_access = now();
            return self.write_dir_block(parent_block, &records);
        }
        if records.len() >= self.layout.records_per_block() {
            return Err(Error::DirFull);
        }
        let head = self.bitmap.allocate(self.layout.data_start)?;
        self.fat.terminate(head);
        records.push(ChildRecord::new_file(name, head as i32, now()));
        if let Err(e) = self.write_dir_block(parent_block, &records) {
            self.bitmap.mark_free(head);
            return Err(e);
        }
        self.persist_metadata()
    }

    pub fn cp(&mut self, host_path: &Path, image_path: &str) -> Result<()> {
        let content = std::fs::read(host_path)
            .map_err(|e| Error::HostOpenError(format!("{}: {e}", host_path.display())))?;

        let (parent_path, name) = path::split_parent(image_path)?;
        let parent_block = self.resolve_dir_block(&parent_path)?;
        let mut records = self.read_dir_block(parent_block)?;
        if records.iter().any(|r| r.name == name) {
            return Err(Error::AlreadyExists(image_path.to_string()));
        }
        if records.len() >= self.layout.records_per_block() {
            return Err(Error::DirFull);
        }

        let head = self.write_chain(&content)?;
        let mut record = ChildRecord::new_file(name, head, now());
        record.size = content.len() as u64;
        records.push(record);
        if let Err(e) = self.write_dir_block(parent_block, &records) {
            let _ = self.free_chain(head);
            return Err(e);
        }
        self.persist_metadata()
    }

    pub fn cat(&mut self, file_path: &str) -> Result<Vec<u8>> {
        let (parent_path, name) = path::split_parent(file_path)?;
        let parent_block = self.resolve_dir_block(&parent_path)?;
        let records = self.read_dir_block(parent_block)?;
        let record = records
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::NoSuchFile(file_path.to_string()))?;
        if record.is_dir {
            return Err(Error::IsDirectory(file_path.to_string()));
        }
        let mut out = Vec::with_capacity(record.size as usize);
        for block in self.fat.chain(record.head)? {
            out.extend_from_slice(&self.store.read_block(block)?);
        }
        out.truncate(record.size as usize);
        Ok(out)
    }

    pub fn rm(&mut self, file_path: &str) -> Result<()> {
        let (parent_path, name) = path::split_parent(file_path)?;
        let parent_block = self.resolve_dir_block(&parent_path)?;
        let mut records = self.read_dir_block(parent_block)?;
        let pos = records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::NoSuchFile(file_path.to_string()))?;
        if records[pos].is_dir {
            return Err(Error::IsDirectory(file_path.to_string()));
        }
        self.free_chain(records[pos].head)?;
        records.remove(pos);
        self.write_dir_block(parent_block, &records)?;
        self.persist_metadata()
    }

    pub fn rmdir(&mut self, dir_path: &str) -> Result<()> {
        let (parent_path, name) = path::split_parent(dir_path)?;
        let parent_block = self.resolve_dir_block(&parent_path)?;
        let mut records = self.read_dir_block(parent_block)?;
        let pos = records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::NoSuchDir(dir_path.to_string()))?;
        if !records[pos].is_dir {
            return Err(Error::NotADirectory(dir_path.to_string()));
        }
        let dir_block = records[pos].head as u64;
        self.remove_subtree(dir_block)?;
        records.remove(pos);
        self.write_dir_block(parent_block, &records)?;
        self.persist_metadata()
    }

    /// Recursively frees every descendant of `block` (files via their chain,
    /// directories via their own subtree), then `block` itself. The
    /// recursion carries its own traversal stack rather than following any
    /// stored parent pointer, since directory records hold none.
    fn remove_subtree(&mut self, block: u64) -> Result<()> {
        let children = self.read_dir_block(block)?;
        for child in children {
            if child.is_dir {
                self.remove_subtree(child.head as u64)?;
            } else {
                self.free_chain(child.head)?;
            }
        }
        self.bitmap.mark_free(block);
        Ok(())
    }

    pub fn ls(&mut self, dir_path: &str) -> Result<Vec<ChildRecord>> {
        let block = self.resolve_dir_block(dir_path)?;
        self.read_dir_block(block)
    }

    /// Depth-first; returns the full image path of every descendant of
    /// `base_dir` whose name contains `needle`.
    pub fn find(&mut self, base_dir: &str, needle: &str) -> Result<Vec<String>> {
        let block = self.resolve_dir_block(base_dir)?;
        let base_prefix = if base_dir == "/" { String::new() } else { base_dir.trim_end_matches('/').to_string() };
        let mut out = Vec::new();
        self.find_recursive(block, &base_prefix, needle, &mut out)?;
        Ok(out)
    }

    fn find_recursive(&mut self, block: u64, prefix: &str, needle: &str, out: &mut Vec<String>) -> Result<()> {
        for child in self.read_dir_block(block)? {
            let child_path = format!("{prefix}/{}", child.name);
            if child.name.contains(needle) {
                out.push(child_path.clone());
            }
            if child.is_dir {
                self.find_recursive(child.head as u64, &child_path, needle, out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> FilesystemSection {
        FilesystemSection { block_size: 256, capacity: 256 * 64, fill_byte: 0xFF }
    }

    fn mounted() -> (tempfile::TempDir, Filesystem) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.img");
        let fs = Filesystem::mount(&path, &cfg()).unwrap();
        (dir, fs)
    }

    #[test]
    fn mkdir_then_ls_shows_the_new_entry() {
        let (_dir, mut fs) = mounted();
        fs.mkdir("/docs").unwrap();
        let entries = fs.ls("/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "docs");
        assert!(entries[0].is_dir);
    }

    #[test]
    fn mkdir_rejects_duplicate_names() {
        let (_dir, mut fs) = mounted();
        fs.mkdir("/docs").unwrap();
        assert!(matches!(fs.mkdir("/docs"), Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn touch_then_rm_restores_the_bitmap() {
        let (_dir, mut fs) = mounted();
        let free_before = fs.df().0;
        fs.touch("/f").unwrap();
        assert!(fs.df().0 < free_before);
        fs.rm("/f").unwrap();
        assert_eq!(fs.df().0, free_before);
    }

    #[test]
    fn cp_then_cat_reproduces_the_bytes() {
        let (dir, mut fs) = mounted();
        let host_path = dir.path().join("source.bin");
        let content: Vec<u8> = (0..600u32).map(|b| b as u8).collect();
        std::fs::write(&host_path, &content).unwrap();

        fs.cp(&host_path, "/copied").unwrap();
        let read_back = fs.cat("/copied").unwrap();
        assert_eq!(read_back, content);
    }

    #[test]
    fn rm_on_a_directory_is_rejected() {
        let (_dir, mut fs) = mounted();
        fs.mkdir("/docs").unwrap();
        assert!(matches!(fs.rm("/docs"), Err(Error::IsDirectory(_))));
    }

    #[test]
    fn rmdir_recursively_frees_nested_content() {
        let (dir, mut fs) = mounted();
        fs.mkdir("/a").unwrap();
        fs.mkdir("/a/b").unwrap();
        let host_path = dir.path().join("leaf.bin");
        std::fs::write(&host_path, b"leaf").unwrap();
        fs.cp(&host_path, "/a/b/leaf").unwrap();

        let free_before_mkdir = {
            let (_dir2, mut fresh) = mounted();
            fresh.df().0
        };
        fs.rmdir("/a").unwrap();
        assert_eq!(fs.df().0, free_before_mkdir);
        assert!(fs.ls("/").unwrap().is_empty());
    }

    #[test]
    fn find_matches_substrings_across_the_whole_subtree() {
        let (dir, mut fs) = mounted();
        fs.mkdir("/src").unwrap();
        let host_path = dir.path().join("t");
        std::fs::write(&host_path, b"x").unwrap();
        fs.cp(&host_path, "/src/report.txt").unwrap();
        fs.cp(&host_path, "/report2.txt").unwrap();

        let mut hits = fs.find("/", "report").unwrap();
        hits.sort();
        assert_eq!(hits, vec!["/report2.txt".to_string(), "/src/report.txt".to_string()]);
    }

    #[test]
    fn cp_leaves_no_partial_allocation_on_no_space() {
        let (dir, mut fs) = mounted();
        // Fill the image to one block short of full.
        loop {
            if fs.bitmap.allocate(fs.layout.data_start).is_err() {
                break;
            }
        }
        fs.bitmap.mark_free(fs.layout.total_blocks - 1);
        let free_before = fs.df().0;

        let host_path = dir.path().join("big.bin");
        std::fs::write(&host_path, vec![0u8; (fs.layout.block_size * 2) as usize]).unwrap();
        let result = fs.cp(&host_path, "/big");
        assert!(matches!(result, Err(Error::NoSpace)));
        assert_eq!(fs.df().0, free_before);
    }

    #[test]
    fn mount_round_trip_preserves_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("test.img");
        {
            let mut fs = Filesystem::mount(&image_path, &cfg()).unwrap();
            fs.mkdir("/d").unwrap();
            let host_path = dir.path().join("f.bin");
            std::fs::write(&host_path, b"hello").unwrap();
            fs.cp(&host_path, "/d/f").unwrap();
            fs.unmount().unwrap();
        }
        let mut fs = Filesystem::mount(&image_path, &cfg()).unwrap();
        let entries = fs.ls("/d").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "f");
        assert_eq!(fs.cat("/d/f").unwrap(), b"hello");
    }
}

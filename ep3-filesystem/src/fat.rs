//! The FAT chain table: one `i32` entry per block, giving the next block in
//! the chain that contains it, or [`FAT_TERMINATOR`] to end it. Persisted as
//! packed little-endian 32-bit integers (the Open Question in the design
//! notes resolved this way over fixed-width decimal text).

use crate::error::{Error, Result};
use crate::layout::{Layout, FAT_ENTRY_BYTES, FAT_TERMINATOR};

pub struct Fat {
    next: Vec<i32>,
}

impl Fat {
    pub fn new_formatted(layout: &Layout) -> Self {
        Fat { next: vec![FAT_TERMINATOR; layout.total_blocks as usize] }
    }

    pub fn next(&self, block: u64) -> i32 {
        self.next[block as usize]
    }

    pub fn set_next(&mut self, block: u64, next: i32) {
        self.next[block as usize] = next;
    }

    pub fn terminate(&mut self, block: u64) {
        self.set_next(block, FAT_TERMINATOR);
    }

    /// Walks the chain starting at `head`, returning every block index in
    /// order. An empty chain (`head < 0`) yields no blocks.
    pub fn chain(&self, head: i32) -> Result<Vec<u64>> {
        if head < 0 {
            return Ok(Vec::new());
        }
        let mut blocks = Vec::new();
        let mut current = head;
        let mut steps = 0usize;
        while current >= 0 {
            if steps > self.next.len() {
                return Err(Error::Internal("FAT chain did not terminate".into()));
            }
            blocks.push(current as u64);
            current = self.next(current as u64);
            steps += 1;
        }
        Ok(blocks)
    }

    pub fn encode(&self, layout: &Layout) -> Vec<u8> {
        let region_bytes = (layout.fat_blocks * layout.block_size) as usize;
        let mut buf = vec![layout.fill_byte; region_bytes];
        for (i, &entry) in self.next.iter().enumerate() {
            let offset = i * FAT_ENTRY_BYTES as usize;
            buf[offset..offset + FAT_ENTRY_BYTES as usize].copy_from_slice(&entry.to_le_bytes());
        }
        buf
    }

    pub fn decode(region: &[u8], layout: &Layout) -> Result<Self> {
        let n = layout.total_blocks as usize;
        let needed = n * FAT_ENTRY_BYTES as usize;
        if region.len() < needed {
            return Err(Error::CorruptImage("FAT region shorter than block count".into()));
        }
        let mut next = Vec::with_capacity(n);
        for i in 0..n {
            let offset = i * FAT_ENTRY_BYTES as usize;
            let bytes: [u8; 4] = region[offset..offset + 4]
                .try_into()
                .map_err(|_| Error::CorruptImage("malformed FAT entry".into()))?;
            next.push(i32::from_le_bytes(bytes));
        }
        Ok(Fat { next })
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
    fn fresh_fat_terminates_every_entry() {
        let fat = Fat::new_formatted(&layout());
        assert_eq!(fat.next(0), FAT_TERMINATOR);
        assert!(fat.chain(-1).unwrap().is_empty());
    }

    #[test]
    fn chain_follows_links_to_terminator() {
        let layout = layout();
        let mut fat = Fat::new_formatted(&layout);
        fat.set_next(5, 6);
        fat.set_next(6, 7);
        fat.terminate(7);
        assert_eq!(fat.chain(5).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn encode_decode_round_trips() {
        let layout = layout();
        let mut fat = Fat::new_formatted(&layout);
        fat.set_next(2, 9);
        fat.terminate(9);
        let encoded = fat.encode(&layout);
        let decoded = Fat::decode(&encoded, &layout).unwrap();
        assert_eq!(decoded.next(2), 9);
        assert_eq!(decoded.next(9), FAT_TERMINATOR);
    }
}

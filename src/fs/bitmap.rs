//! the free-space bitmap: one bit per block of the volume, set means used
use std::ops::Range;

use bitvec::prelude::*;

use super::{FsError, Result};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Bitmap {
    /// covers whole bitmap blocks, bits past `total_blocks` stay clear
    bits: BitVec<u8, Lsb0>,
    total_blocks: u32,
}
/// for serialize and deserialize
impl Bitmap {
    /// a zeroed bitmap tracking `total_blocks` blocks,
    /// stored in `region_bytes` bytes on the device
    pub fn new(total_blocks: u32, region_bytes: usize) -> Self {
        Self::from_bytes(&vec![0u8; region_bytes], total_blocks)
    }

    /// restore a bitmap from the raw bytes of its on-disk region
    pub fn from_bytes(raw: &[u8], total_blocks: u32) -> Self {
        Bitmap {
            bits: BitVec::<u8, Lsb0>::from_slice(raw),
            total_blocks,
        }
    }

    /// the raw bytes to write back to the bitmap region
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}
/// for block allocation
impl Bitmap {
    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    /// mark a range of blocks as permanently used
    pub fn reserve(&mut self, blocks: Range<u32>) -> Result<()> {
        if blocks.end > self.total_blocks {
            return Err(FsError::out_of_range(blocks.end, self.total_blocks));
        }
        self.bits[blocks.start as usize..blocks.end as usize].fill(true);
        Ok(())
    }

    /// check if a block is in use
    /// # Params
    /// - `block`: block index, start at 0
    pub fn is_used(&self, block: u32) -> Result<bool> {
        if block >= self.total_blocks {
            return Err(FsError::out_of_range(block, self.total_blocks));
        }
        Ok(self.bits[block as usize])
    }

    /// calculate the number of free blocks
    pub fn free_blocks(&self) -> usize {
        self.tracked().count_zeros()
    }

    /// allocate the lowest free block
    pub fn allocate(&mut self) -> Option<u32> {
        let index = self.tracked().first_zero()?;
        self.bits.set(index, true);
        Some(index as u32)
    }

    /// release a block
    /// # Returns
    /// whether the block was in use, releasing a free block changes nothing
    pub fn release(&mut self, block: u32) -> Result<bool> {
        let was_used = self.is_used(block)?;
        self.bits.set(block as usize, false);
        Ok(was_used)
    }

    fn tracked(&self) -> &BitSlice<u8, Lsb0> {
        &self.bits[..self.total_blocks as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_first_fit() {
        let mut bitmap = Bitmap::new(20, 512);
        bitmap.reserve(0..14).unwrap();
        assert_eq!(bitmap.free_blocks(), 6);
        assert!(bitmap.is_used(13).unwrap());
        assert!(!bitmap.is_used(14).unwrap());

        assert_eq!(bitmap.allocate(), Some(14));
        assert_eq!(bitmap.allocate(), Some(15));
        assert_eq!(bitmap.free_blocks(), 4);
    }

    #[test]
    fn test_lowest_free_index_wins_after_release() {
        let mut bitmap = Bitmap::new(16, 512);
        bitmap.reserve(0..2).unwrap();
        let allocated: Vec<_> = (0..5).filter_map(|_| bitmap.allocate()).collect();
        assert_eq!(allocated, vec![2, 3, 4, 5, 6]);

        assert!(bitmap.release(5).unwrap());
        assert!(bitmap.release(3).unwrap());
        assert_eq!(bitmap.allocate(), Some(3));
        assert_eq!(bitmap.allocate(), Some(5));
        assert_eq!(bitmap.allocate(), Some(7));
    }

    #[test]
    fn test_never_allocates_past_total_blocks() {
        // the region has 4096 bits but only 10 of them are blocks
        let mut bitmap = Bitmap::new(10, 512);
        bitmap.reserve(0..8).unwrap();
        assert_eq!(bitmap.allocate(), Some(8));
        assert_eq!(bitmap.allocate(), Some(9));
        assert_eq!(bitmap.allocate(), None);
        assert_eq!(bitmap.free_blocks(), 0);
    }

    #[test]
    fn test_release_is_idempotent_and_bounds_checked() {
        let mut bitmap = Bitmap::new(10, 512);
        assert!(!bitmap.release(4).unwrap());
        assert!(!bitmap.release(4).unwrap());
        assert!(matches!(
            bitmap.release(10),
            Err(FsError::OutOfRange { index: 10, limit: 10 })
        ));
    }

    #[test]
    fn test_bytes_use_lsb_first_order() {
        let mut bitmap = Bitmap::new(20, 4);
        bitmap.reserve(0..3).unwrap();
        bitmap.reserve(9..10).unwrap();
        assert_eq!(bitmap.as_bytes(), &[0b0000_0111, 0b0000_0010, 0, 0]);

        let restored = Bitmap::from_bytes(bitmap.as_bytes(), 20);
        assert_eq!(restored, bitmap);
        assert_eq!(restored.free_blocks(), 16);
    }

    #[test]
    fn test_allocation_matches_model() {
        // a bit is set iff its block was allocated and not freed since
        let mut bitmap = Bitmap::new(32, 512);
        let mut model = [false; 32];
        for step in 0..200usize {
            if step % 3 == 2 {
                let victim = (step * 7) % 32;
                bitmap.release(victim as u32).unwrap();
                model[victim] = false;
            } else if let Some(block) = bitmap.allocate() {
                assert!(!model[block as usize], "block {block} handed out twice");
                model[block as usize] = true;
            }
            for (block, used) in model.iter().enumerate() {
                assert_eq!(bitmap.is_used(block as u32).unwrap(), *used);
            }
        }
    }
}

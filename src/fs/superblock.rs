use serde::{Deserialize, Serialize};

use crate::utils::{
    fs_size_calculator,
    time_util::{self, Timestamp},
    traits::FixedRecord,
};

use super::{
    FsError, Result, FS_MAGIC, FS_VERSION, MAX_BLOCK_SIZE, MAX_INODE_COUNT, MIN_BLOCK_SIZE,
    ROOT_INODE, SUPERBLOCK_SIZE,
};

/// The superblock of this filesystem, stored in block 0
///
/// Written once by `format`; only `root_inode` is touched afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct SuperBlock {
    /// magic number
    pub magic: u32,
    pub version: u32,
    pub total_blocks: u32,
    /// data block size
    pub block_size: u32,
    pub inode_table_block: u32,
    /// capacity of the inode table
    pub inode_count: u32,
    pub root_inode: u32,
    pub bitmap_block: u32,
    pub data_start_block: u32,
    pub created_at: Timestamp,
}

impl SuperBlock {
    /// lay out a volume of `total_blocks` blocks of `block_size` bytes
    /// with room for `inode_count` inodes
    ///
    /// fails with [FsError::InvalidGeometry] when the regions do not leave
    /// at least one data block for the root directory
    pub fn new(total_blocks: u32, block_size: u32, inode_count: u32) -> Result<Self> {
        if !block_size.is_power_of_two() || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size)
        {
            return Err(FsError::InvalidGeometry(format!(
                "block size {block_size} must be a power of two between {MIN_BLOCK_SIZE} and {MAX_BLOCK_SIZE}"
            )));
        }
        if !(1..=MAX_INODE_COUNT).contains(&inode_count) {
            return Err(FsError::InvalidGeometry(format!(
                "inode count {inode_count} must be between 1 and {MAX_INODE_COUNT}"
            )));
        }
        let bitmap_blocks = fs_size_calculator::bitmap_blocks(total_blocks, block_size);
        let inode_table_blocks = fs_size_calculator::inode_table_blocks(inode_count, block_size);
        let data_start_block = 1 + bitmap_blocks + inode_table_blocks;
        if data_start_block >= total_blocks {
            return Err(FsError::InvalidGeometry(format!(
                "{total_blocks} blocks leave no data region, metadata alone takes {data_start_block}"
            )));
        }

        Ok(Self {
            magic: FS_MAGIC,
            version: FS_VERSION,
            total_blocks,
            block_size,
            bitmap_block: 1,
            inode_table_block: 1 + bitmap_blocks,
            inode_count,
            root_inode: ROOT_INODE,
            data_start_block,
            created_at: time_util::now(),
        })
    }

    pub fn verify(&self) -> Result<()> {
        if self.magic != FS_MAGIC {
            return Err(FsError::InvalidFormat);
        }
        Ok(())
    }

    /// Check that the regions are the ones `format` lays out for this
    /// geometry, so the region arithmetic below cannot go out of bounds.
    pub fn check_layout(&self) -> Result<()> {
        let expected = SuperBlock::new(self.total_blocks, self.block_size, self.inode_count)
            .map_err(|e| FsError::Corrupted(format!("superblock geometry: {e}")))?;
        if self.bitmap_block != expected.bitmap_block
            || self.inode_table_block != expected.inode_table_block
            || self.data_start_block != expected.data_start_block
            || self.root_inode >= self.inode_count
        {
            return Err(FsError::Corrupted(format!(
                "superblock layout does not add up: {self:?}"
            )));
        }
        Ok(())
    }

    pub fn bitmap_blocks(&self) -> u32 {
        self.inode_table_block - self.bitmap_block
    }

    pub fn inode_table_blocks(&self) -> u32 {
        self.data_start_block - self.inode_table_block
    }

    pub fn data_blocks(&self) -> u32 {
        self.total_blocks - self.data_start_block
    }
}

impl FixedRecord for SuperBlock {
    const RECORD_SIZE: usize = SUPERBLOCK_SIZE;
}

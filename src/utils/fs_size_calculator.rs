//! This module contains functions to calculate the size of different fs components,
//! all results are in blocks unless noted otherwise

use crate::fs::{DIR_ENTRY_SIZE, INODE_SIZE};

/// calculate how many blocks the free-space bitmap needs
/// # Arguments
/// - `total_blocks`: the number of blocks in the volume, one bit each
/// - `block_size`: the size of a block in bytes
/// # Return
/// the number of bitmap blocks
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::bitmap_blocks;
/// assert_eq!(bitmap_blocks(20, 512), 1);
/// assert_eq!(bitmap_blocks(4096, 512), 1);
/// assert_eq!(bitmap_blocks(4097, 512), 2);
/// ```
pub const fn bitmap_blocks(total_blocks: u32, block_size: u32) -> u32 {
    total_blocks.div_ceil(8).div_ceil(block_size)
}

/// calculate how many blocks the inode table needs
/// # Arguments
/// - `inode_count`: the number of inodes
/// - `block_size`: the size of a block in bytes
/// # Return
/// the number of inode table blocks
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::inode_table_blocks;
/// use tinyfs::INODE_SIZE;
/// assert_eq!(INODE_SIZE, 96);
/// assert_eq!(inode_table_blocks(64, 512), 12);
/// assert_eq!(inode_table_blocks(1, 512), 1);
/// ```
pub const fn inode_table_blocks(inode_count: u32, block_size: u32) -> u32 {
    (inode_count as u64 * INODE_SIZE as u64).div_ceil(block_size as u64) as u32
}

/// calculate the first block of the data region
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::data_start_block;
/// // superblock + 1 bitmap block + 12 inode table blocks
/// assert_eq!(data_start_block(20, 512, 64), 14);
/// ```
pub const fn data_start_block(total_blocks: u32, block_size: u32, inode_count: u32) -> u32 {
    1 + bitmap_blocks(total_blocks, block_size) + inode_table_blocks(inode_count, block_size)
}

/// calculate how many entries fit into a directory's single data block
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::dir_entries_per_block;
/// assert_eq!(dir_entries_per_block(512), 12);
/// assert_eq!(dir_entries_per_block(256), 6);
/// ```
pub const fn dir_entries_per_block(block_size: u32) -> usize {
    block_size as usize / DIR_ENTRY_SIZE
}

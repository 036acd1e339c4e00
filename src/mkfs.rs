//! create our filesystem
use std::path::Path;

use anyhow::{bail, Context};
use byte_unit::{Byte, ByteUnit};
use log::info;

use crate::{
    device::ImageDisk,
    fs::{FormatOptions, Volume, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE},
    utils::fs_size_calculator,
};

/// create a new filesystem in a new image file
/// # Params
/// - `image_file_path`: the path of the image file, it must not exist yet
/// - `total_blocks`: the size of the volume, in blocks
/// - `block_size`: the block size of the filesystem
/// - `inode_count`: the number of inodes
///
/// # Return
/// an [anyhow::Result] type to indicate whether the operation is successful
pub fn mkfs<P>(
    image_file_path: P,
    total_blocks: u32,
    block_size: u32,
    inode_count: u32,
) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let image_file_path = image_file_path.as_ref();
    info!(
        "mkfs() called with path: {}, blocks: {total_blocks}, block size: {block_size}, inodes: {inode_count}",
        image_file_path.display()
    );
    if !block_size.is_power_of_two() || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
        bail!(
            "Block size must be a power of two between {} and {}",
            Byte::from_bytes(MIN_BLOCK_SIZE as _).get_adjusted_unit(ByteUnit::B),
            Byte::from_bytes(MAX_BLOCK_SIZE as _).get_appropriate_unit(true)
        );
    }
    // the superblock, bitmap and inode table come first, the root directory needs one more block
    let blocks_needed =
        fs_size_calculator::data_start_block(total_blocks, block_size, inode_count) + 1;
    if total_blocks < blocks_needed {
        bail!(
            "Volume must be at least {blocks_needed} blocks ({}) for block size {} and inode count {inode_count}",
            Byte::from_bytes(blocks_needed as u128 * block_size as u128).get_appropriate_unit(true),
            Byte::from_bytes(block_size as _).get_adjusted_unit(ByteUnit::B),
        );
    }

    let disk = ImageDisk::create(image_file_path, block_size as usize)
        .with_context(|| format!("can't create image file {}", image_file_path.display()))?;
    let options = FormatOptions {
        total_blocks,
        inode_count,
    };
    let mut volume = Volume::format_with(disk, &options)?;
    volume.sync()?;
    Ok(())
}

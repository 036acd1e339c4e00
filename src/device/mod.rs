//! block devices the filesystem can live on
//!
//! A device is a contiguous array of equally sized blocks, addressed by index.
mod image_disk;
mod mem_disk;
pub use image_disk::ImageDisk;
pub use mem_disk::MemDisk;

use crate::fs::{FsError, Result, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};

pub trait BlockDevice {
    /// Returns the size of each block in bytes.
    fn block_size(&self) -> usize;

    /// Returns the number of blocks, 0 before [BlockDevice::init].
    fn total_blocks(&self) -> u32;

    /// (Re)sizes the device to `total_blocks` zeroed blocks.
    fn init(&mut self, total_blocks: u32) -> Result<()>;

    /// Reads a block of data from the block device.
    /// buf.len() must be equal to block_size().
    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()>;

    /// Writes a block of data to the block device.
    /// buf.len() must be equal to block_size().
    fn write_block(&mut self, block_id: u32, buf: &[u8]) -> Result<()>;

    /// Flushes any cached data to the backing storage.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<D: BlockDevice + ?Sized> BlockDevice for Box<D> {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn total_blocks(&self) -> u32 {
        (**self).total_blocks()
    }

    fn init(&mut self, total_blocks: u32) -> Result<()> {
        (**self).init(total_blocks)
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read_block(block_id, buf)
    }

    fn write_block(&mut self, block_id: u32, buf: &[u8]) -> Result<()> {
        (**self).write_block(block_id, buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// shared bounds and buffer checks, returns the byte range of the block
pub(crate) fn block_range(
    block_id: u32,
    buf_len: usize,
    block_size: usize,
    total_blocks: u32,
) -> Result<std::ops::Range<usize>> {
    if block_id >= total_blocks {
        return Err(FsError::out_of_range(block_id, total_blocks));
    }
    if buf_len != block_size {
        return Err(FsError::InvalidGeometry(format!(
            "buffer of {buf_len} bytes for {block_size} byte blocks"
        )));
    }
    let start = block_id as usize * block_size;
    Ok(start..start + block_size)
}

/// block sizes a device accepts, the same range a volume can be formatted with
pub(crate) fn check_block_size(block_size: usize) -> Result<()> {
    let valid = block_size.is_power_of_two()
        && (MIN_BLOCK_SIZE as usize..=MAX_BLOCK_SIZE as usize).contains(&block_size);
    if !valid {
        return Err(FsError::InvalidGeometry(format!(
            "block size {block_size} must be a power of two between {MIN_BLOCK_SIZE} and {MAX_BLOCK_SIZE}"
        )));
    }
    Ok(())
}

use std::path::Path;

use log::debug;

use super::{block_range, check_block_size, BlockDevice};
use crate::fs::{FsError, Result};

/// a RAM disk, optionally snapshotted to a flat image file
#[derive(Debug, Clone)]
pub struct MemDisk {
    /// `None` until the disk is sized
    data: Option<Vec<u8>>,
    block_size: usize,
}

impl MemDisk {
    /// Creates an unsized disk, every access fails until [BlockDevice::init].
    pub fn new(block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        Ok(MemDisk {
            data: None,
            block_size,
        })
    }

    /// Creates a disk of `total_blocks` zeroed blocks.
    pub fn with_blocks(block_size: usize, total_blocks: u32) -> Result<Self> {
        let mut disk = MemDisk::new(block_size)?;
        disk.init(total_blocks)?;
        Ok(disk)
    }

    /// read a whole image file into memory
    pub fn load_image<P: AsRef<Path>>(image_path: P, block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        let data = std::fs::read(image_path.as_ref())?;
        if data.is_empty() || data.len() % block_size != 0 {
            return Err(FsError::InvalidGeometry(format!(
                "image of {} bytes is not a whole number of {block_size} byte blocks",
                data.len()
            )));
        }
        debug!(
            "loaded {} blocks from {}",
            data.len() / block_size,
            image_path.as_ref().display()
        );
        Ok(MemDisk {
            data: Some(data),
            block_size,
        })
    }

    /// write every block to `image_path`, replacing its content
    pub fn save_image<P: AsRef<Path>>(&self, image_path: P) -> Result<()> {
        let data = self.data.as_ref().ok_or(FsError::Uninitialized)?;
        std::fs::write(image_path.as_ref(), data)?;
        debug!(
            "saved {} blocks to {}",
            self.total_blocks(),
            image_path.as_ref().display()
        );
        Ok(())
    }
}

impl BlockDevice for MemDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn total_blocks(&self) -> u32 {
        self.data
            .as_ref()
            .map_or(0, |data| (data.len() / self.block_size) as u32)
    }

    fn init(&mut self, total_blocks: u32) -> Result<()> {
        let bytes = (self.block_size as u64)
            .checked_mul(total_blocks as u64)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(|| {
                FsError::InvalidGeometry(format!("{total_blocks} blocks do not fit in memory"))
            })?;
        self.data = Some(vec![0u8; bytes]);
        Ok(())
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()> {
        let data = self.data.as_ref().ok_or(FsError::Uninitialized)?;
        let range = block_range(block_id, buf.len(), self.block_size, self.total_blocks())?;
        buf.copy_from_slice(&data[range]);
        Ok(())
    }

    fn write_block(&mut self, block_id: u32, buf: &[u8]) -> Result<()> {
        let total_blocks = self.total_blocks();
        let data = self.data.as_mut().ok_or(FsError::Uninitialized)?;
        let range = block_range(block_id, buf.len(), self.block_size, total_blocks)?;
        data[range].copy_from_slice(buf);
        Ok(())
    }
}

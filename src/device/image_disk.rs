use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use log::debug;
use memmap2::MmapMut;

use super::{block_range, check_block_size, BlockDevice};
use crate::fs::{FsError, Result};

/// a flat image file, something like a **/dev/sda1**, mapped into memory
#[derive(Debug)]
pub struct ImageDisk {
    file: File,
    /// empty images have no mapping
    mmap: Option<MmapMut>,
    block_size: usize,
}

impl ImageDisk {
    /// create a new, empty image file, an existing file is never overwritten
    pub fn create<P: AsRef<Path>>(image_path: P, block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(image_path.as_ref())?;
        Ok(ImageDisk {
            file,
            mmap: None,
            block_size,
        })
    }

    /// open the "device" for read and write
    pub fn open<P: AsRef<Path>>(image_path: P, block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path.as_ref())?;
        let len = file.metadata()?.len();
        if len % block_size as u64 != 0 {
            return Err(FsError::InvalidGeometry(format!(
                "image of {len} bytes is not a whole number of {block_size} byte blocks"
            )));
        }
        let mmap = if len == 0 { None } else { Some(map(&file)?) };
        Ok(ImageDisk {
            file,
            mmap,
            block_size,
        })
    }
}

fn map(file: &File) -> Result<MmapMut> {
    // Safety
    // This method returns an error when the underlying system call fails,
    // such as when the file is not open with read and write permissions.
    // The image must not be resized by anyone else while it is mapped.
    Ok(unsafe { MmapMut::map_mut(file)? })
}

impl BlockDevice for ImageDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn total_blocks(&self) -> u32 {
        self.mmap
            .as_ref()
            .map_or(0, |mmap| (mmap.len() / self.block_size) as u32)
    }

    fn init(&mut self, total_blocks: u32) -> Result<()> {
        let file_len = self.block_size as u64 * total_blocks as u64;
        // unmap before resizing the file underneath
        self.mmap = None;
        // shrinking to zero first gets every block zeroed by `set_len`
        self.file.set_len(0)?;
        self.file.set_len(file_len)?;
        if total_blocks > 0 {
            self.mmap = Some(map(&self.file)?);
        }
        debug!("image sized to {total_blocks} blocks ({file_len} bytes)");
        Ok(())
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()> {
        let mmap = self.mmap.as_ref().ok_or(FsError::Uninitialized)?;
        let range = block_range(block_id, buf.len(), self.block_size, self.total_blocks())?;
        buf.copy_from_slice(&mmap[range]);
        Ok(())
    }

    fn write_block(&mut self, block_id: u32, buf: &[u8]) -> Result<()> {
        let total_blocks = self.total_blocks();
        let mmap = self.mmap.as_mut().ok_or(FsError::Uninitialized)?;
        let range = block_range(block_id, buf.len(), self.block_size, total_blocks)?;
        mmap[range].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(mmap) = self.mmap.as_ref() {
            mmap.flush()?;
        }
        Ok(())
    }
}

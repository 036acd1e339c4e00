use std::ops::Range;

use crate::{
    device::{BlockDevice, MemDisk},
    fs::{FsError, Result, Volume, DEFAULT_BLOCK_SIZE},
};

/// route `log` output through the test harness, safe to call from every test
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// a freshly formatted RAM volume with default block size and inode count
pub fn init_test_volume(total_blocks: u32) -> Volume<MemDisk> {
    init_test_logger();
    let disk = MemDisk::new(DEFAULT_BLOCK_SIZE as usize).expect("Failed to create test disk");
    Volume::format(disk, total_blocks).expect("Failed to format test volume")
}

/// a RAM disk refusing writes to the blocks in `refused`
#[derive(Debug)]
pub struct FlakyDisk {
    pub inner: MemDisk,
    pub refused: Range<u32>,
}

impl BlockDevice for FlakyDisk {
    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn total_blocks(&self) -> u32 {
        self.inner.total_blocks()
    }

    fn init(&mut self, total_blocks: u32) -> Result<()> {
        self.inner.init(total_blocks)
    }

    fn read_block(&self, block_id: u32, buf: &mut [u8]) -> Result<()> {
        self.inner.read_block(block_id, buf)
    }

    fn write_block(&mut self, block_id: u32, buf: &[u8]) -> Result<()> {
        if self.refused.contains(&block_id) {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("write to block {block_id} refused"),
            )));
        }
        self.inner.write_block(block_id, buf)
    }
}

/// like [init_test_volume], every write succeeds until `refused` is set
pub fn init_flaky_volume(total_blocks: u32) -> Volume<FlakyDisk> {
    init_test_logger();
    let disk = FlakyDisk {
        inner: MemDisk::new(DEFAULT_BLOCK_SIZE as usize).expect("Failed to create test disk"),
        refused: 0..0,
    };
    Volume::format(disk, total_blocks).expect("Failed to format test volume")
}

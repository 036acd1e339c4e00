//! our tiny filesystem
//!
//! It has the following layout on the block device:
//! - superblock (block 0)
//! - free-space bitmap
//! - inode table
//! - data blocks
pub mod bitmap;
pub mod directory;
pub mod error;
pub mod file_name;
pub mod filekind;
pub mod inode;
pub mod open_file;
pub mod superblock;
mod fs_api_impl;
mod fs_layout;
pub use bitmap::*;
pub use directory::*;
pub use error::*;
pub use file_name::*;
pub use filekind::*;
pub use fs_layout::*;
pub use inode::*;
pub use open_file::*;
pub use superblock::*;

/// "TINY" in ASCII
pub const FS_MAGIC: u32 = 0x5449_4E59;
pub const FS_VERSION: u32 = 1;
pub const SUPERBLOCK_ID: u32 = 0;
pub const ROOT_INODE: u32 = 0;

pub const DEFAULT_BLOCK_SIZE: u32 = 512;
pub const MIN_BLOCK_SIZE: u32 = 128;
pub const MAX_BLOCK_SIZE: u32 = 4096;
pub const DEFAULT_TOTAL_BLOCKS: u32 = 1024;
pub const DEFAULT_INODE_COUNT: u32 = 64;
pub const MAX_INODE_COUNT: u32 = 4096;

/// on-disk slot sizes, in bytes
pub const SUPERBLOCK_SIZE: usize = 64;
pub const INODE_SIZE: usize = 96;
pub const DIR_ENTRY_SIZE: usize = 40;

/// width of the zero-padded name field
pub const NAME_FIELD_LEN: usize = 32;
pub const MAX_NAME_LEN: usize = NAME_FIELD_LEN - 1;

pub const MAX_OPEN_FILES: usize = 64;

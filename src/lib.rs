//! a tiny single-volume filesystem on a block device
pub mod cli_interface;
pub mod device;
mod fs;
pub mod mkfs;
pub mod mount;
pub mod shell;
pub mod utils;
pub use fs::*;

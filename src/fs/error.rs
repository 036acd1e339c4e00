//! error types shared by every layer of the filesystem core
use std::fmt;

use thiserror::Error;

/// which pool ran dry when an allocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// free blocks in the bitmap
    Blocks,
    /// unused slots in the inode table
    Inodes,
    /// slots in the open file table
    Handles,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Blocks => f.write_str("data blocks"),
            Resource::Inodes => f.write_str("inodes"),
            Resource::Handles => f.write_str("file handles"),
        }
    }
}

/// Everything a filesystem operation can fail with.
///
/// Reading past the end of a file is not an error, it yields zero bytes.
#[derive(Error, Debug)]
pub enum FsError {
    /// the superblock magic does not match, or the superblock disagrees with the device
    #[error("volume is not formatted or has an unrecognised format")]
    InvalidFormat,

    /// a block or inode index is outside the table it indexes
    #[error("index {index} is out of range (limit {limit})")]
    OutOfRange { index: u64, limit: u64 },

    /// the block device was used before it was sized
    #[error("block device has not been initialised")]
    Uninitialized,

    #[error("no free {0} left")]
    Exhausted(Resource),

    #[error("no such file or directory")]
    NotFound,

    #[error("an entry with this name already exists")]
    AlreadyExists,

    #[error("not a regular file")]
    NotAFile,

    #[error("not a directory")]
    NotADirectory,

    #[error("directory is not empty")]
    NotEmpty,

    #[error("the root directory cannot be removed")]
    IsRoot,

    /// every entry slot of the directory block is taken
    #[error("directory has no free entry slots")]
    Full,

    #[error("file handle {0} is not open")]
    InvalidHandle(usize),

    /// a handle was used for an access its open mode does not grant
    #[error("file handle was not opened for {0}")]
    ModeMismatch(&'static str),

    #[error("invalid file name {0:?}")]
    InvalidName(String),

    #[error("invalid volume geometry: {0}")]
    InvalidGeometry(String),

    /// an on-disk record could not be decoded or contradicts the rest of the metadata
    #[error("corrupted metadata: {0}")]
    Corrupted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub(crate) fn out_of_range(index: impl Into<u64>, limit: impl Into<u64>) -> Self {
        FsError::OutOfRange {
            index: index.into(),
            limit: limit.into(),
        }
    }
}

impl From<bincode::error::EncodeError> for FsError {
    fn from(err: bincode::error::EncodeError) -> Self {
        FsError::Corrupted(format!("encode failed: {err}"))
    }
}

impl From<bincode::error::DecodeError> for FsError {
    fn from(err: bincode::error::DecodeError) -> Self {
        FsError::Corrupted(format!("decode failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, FsError>;

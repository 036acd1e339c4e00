use std::fmt;

use serde::{Deserialize, Serialize};

/// an enum to describe the type of a file,
/// stored on disk as a one-byte tag
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[serde(into = "u8", try_from = "u8")]
pub enum FileKind {
    /// an regular file
    File,
    /// a directory
    Directory,
    /// an unused inode slot or an empty directory slot
    #[default]
    Unknown,
}

impl From<FileKind> for u8 {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Unknown => 0,
            FileKind::File => 1,
            FileKind::Directory => 2,
        }
    }
}

impl TryFrom<u8> for FileKind {
    type Error = String;
    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(FileKind::Unknown),
            1 => Ok(FileKind::File),
            2 => Ok(FileKind::Directory),
            other => Err(format!("unknown file kind tag {other}")),
        }
    }
}

/// the labels used by directory listings
impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::File => f.write_str("FILE"),
            FileKind::Directory => f.write_str("DIR"),
            FileKind::Unknown => f.write_str("?"),
        }
    }
}

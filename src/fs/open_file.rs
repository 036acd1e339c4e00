//! the process-local table of open files, nothing here reaches the device
use std::fmt;
use std::ops::BitOr;

use super::{FsError, Resource, Result, MAX_OPEN_FILES};

/// access flags of an open file, combine them with `|`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode(u8);

impl OpenMode {
    pub const READ: OpenMode = OpenMode(1);
    pub const WRITE: OpenMode = OpenMode(2);
    /// every write lands at the current end of the file
    pub const APPEND: OpenMode = OpenMode(4);

    pub fn readable(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    pub fn writable(self) -> bool {
        self.0 & (Self::WRITE.0 | Self::APPEND.0) != 0
    }

    pub fn appends(self) -> bool {
        self.0 & Self::APPEND.0 != 0
    }
}

impl BitOr for OpenMode {
    type Output = OpenMode;
    fn bitor(self, rhs: OpenMode) -> OpenMode {
        OpenMode(self.0 | rhs.0)
    }
}

/// handle returned by `open`, valid until `close`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(usize);

impl FileHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    pub inode_number: u32,
    /// byte offset of the next read or write
    pub position: u32,
    pub mode: OpenMode,
}

#[derive(Debug, Clone)]
pub struct OpenFileTable {
    slots: Vec<Option<OpenFile>>,
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::with_capacity(MAX_OPEN_FILES)
    }
}

impl OpenFileTable {
    pub fn with_capacity(capacity: usize) -> Self {
        OpenFileTable {
            slots: vec![None; capacity],
        }
    }

    /// take the lowest free slot, the cursor starts at 0
    pub fn open(&mut self, inode_number: u32, mode: OpenMode) -> Result<FileHandle> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::Exhausted(Resource::Handles))?;
        self.slots[index] = Some(OpenFile {
            inode_number,
            position: 0,
            mode,
        });
        Ok(FileHandle(index))
    }

    pub fn get(&self, handle: FileHandle) -> Result<&OpenFile> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(FsError::InvalidHandle(handle.0))
    }

    pub fn get_mut(&mut self, handle: FileHandle) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(FsError::InvalidHandle(handle.0))
    }

    /// release the slot
    /// # Returns
    /// what the handle referred to
    pub fn close(&mut self, handle: FileHandle) -> Result<OpenFile> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::take)
            .ok_or(FsError::InvalidHandle(handle.0))
    }

    /// drop every handle on `inode_number`
    /// # Returns
    /// how many handles were dropped
    pub fn close_all_for(&mut self, inode_number: u32) -> usize {
        let mut dropped = 0;
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some(file) if file.inode_number == inode_number) {
                *slot = None;
                dropped += 1;
            }
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        assert!(OpenMode::READ.readable());
        assert!(!OpenMode::READ.writable());
        assert!(OpenMode::WRITE.writable());
        assert!(!OpenMode::WRITE.appends());
        assert!(OpenMode::APPEND.writable());
        let both = OpenMode::READ | OpenMode::WRITE;
        assert!(both.readable() && both.writable());
    }

    #[test]
    fn test_open_and_close() {
        let mut table = OpenFileTable::with_capacity(2);
        let first = table.open(5, OpenMode::READ).unwrap();
        let second = table.open(6, OpenMode::WRITE).unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert!(matches!(
            table.open(7, OpenMode::READ),
            Err(FsError::Exhausted(Resource::Handles))
        ));

        assert_eq!(table.close(first).unwrap().inode_number, 5);
        assert!(matches!(table.close(first), Err(FsError::InvalidHandle(0))));
        assert!(matches!(table.get(FileHandle(9)), Err(FsError::InvalidHandle(9))));

        // the freed slot is handed out again
        assert_eq!(table.open(7, OpenMode::READ).unwrap(), first);
    }

    #[test]
    fn test_close_all_for_inode() {
        let mut table = OpenFileTable::default();
        let a = table.open(3, OpenMode::READ).unwrap();
        let b = table.open(4, OpenMode::READ).unwrap();
        let c = table.open(3, OpenMode::WRITE).unwrap();
        assert_eq!(table.close_all_for(3), 2);
        assert!(table.get(a).is_err());
        assert!(table.get(c).is_err());
        assert!(table.get(b).is_ok());
        assert_eq!(table.open_count(), 1);
    }
}

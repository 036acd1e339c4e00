use serde::{Deserialize, Serialize};

use crate::utils::{fs_size_calculator, traits::FixedRecord};

use super::{FileKind, FileName, FsError, Result, DIR_ENTRY_SIZE};

/// one slot of a directory block, an empty name marks a free slot
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct DirEntry {
    pub name: FileName,
    pub inode_number: u32,
    pub file_kind: FileKind,
}

impl FixedRecord for DirEntry {
    const RECORD_SIZE: usize = DIR_ENTRY_SIZE;
}

impl DirEntry {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// the decoded content of a directory's single data block:
/// a fixed array of entry slots, unordered, never resized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    slots: Vec<DirEntry>,
}

impl Directory {
    /// an empty directory for blocks of `block_size` bytes
    pub fn new(block_size: usize) -> Self {
        Directory {
            slots: vec![
                DirEntry::default();
                fs_size_calculator::dir_entries_per_block(block_size as u32)
            ],
        }
    }

    pub fn decode(block: &[u8]) -> Result<Self> {
        let slots = block
            .chunks_exact(DIR_ENTRY_SIZE)
            .map(DirEntry::decode_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Directory { slots })
    }

    /// encode into a full block, the tail that holds no whole slot stays zero
    pub fn encode(&self, block_size: usize) -> Result<Vec<u8>> {
        let mut block = vec![0u8; block_size];
        for (entry, slot) in self.slots.iter().zip(block.chunks_exact_mut(DIR_ENTRY_SIZE)) {
            entry.encode_into(slot)?;
        }
        Ok(block)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// live entries in slot order
    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.slots.iter().filter(|entry| !entry.is_empty())
    }

    pub fn entry(&self, name: &str) -> Option<&DirEntry> {
        self.slots.iter().find(|entry| entry.name.matches(name))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// put a new entry into the first free slot
    /// # Returns
    /// the slot index used
    pub fn insert(&mut self, name: FileName, inode_number: u32, file_kind: FileKind) -> Result<usize> {
        if self.slots.iter().any(|entry| !entry.is_empty() && entry.name == name) {
            return Err(FsError::AlreadyExists);
        }
        let index = self
            .slots
            .iter()
            .position(DirEntry::is_empty)
            .ok_or(FsError::Full)?;
        self.slots[index] = DirEntry {
            name,
            inode_number,
            file_kind,
        };
        Ok(index)
    }

    /// zero the slot holding `name`
    /// # Returns
    /// the removed entry
    pub fn remove(&mut self, name: &str) -> Result<DirEntry> {
        let slot = self
            .slots
            .iter_mut()
            .find(|entry| entry.name.matches(name))
            .ok_or(FsError::NotFound)?;
        Ok(std::mem::take(slot))
    }
}

use serde::{Deserialize, Serialize};

use crate::utils::{
    time_util::{self, Timestamp},
    traits::FixedRecord,
};

use super::{FileKind, FileName, FsError, Resource, Result, INODE_SIZE};

/// one slot of the inode table
///
/// `inode_number` always equals the slot index.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Inode {
    pub inode_number: u32,
    pub file_kind: FileKind,
    pub used: bool,
    pub name: FileName,
    pub file_size: u32,
    /// the single data block of this object, block 0 is the superblock
    /// and therefore doubles as "none" on disk
    #[serde(with = "block_pointer")]
    pub data_block: Option<u32>,
    pub parent: u32,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    pub accessed_at: Timestamp,
}

mod block_pointer {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(block: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(block.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let raw = u32::deserialize(d)?;
        Ok((raw != 0).then_some(raw))
    }
}

impl FixedRecord for Inode {
    const RECORD_SIZE: usize = INODE_SIZE;
}

impl Inode {
    /// a freshly allocated slot: in use, stamped with the current time,
    /// every other field cleared
    pub fn new(index: u32) -> Self {
        let now = time_util::now();
        Inode {
            inode_number: index,
            used: true,
            created_at: now,
            modified_at: now,
            accessed_at: now,
            ..Inode::default()
        }
    }
}

/// This block is about file metadata operations
impl Inode {
    pub fn is_regular_file(&self) -> bool {
        self.file_kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.file_kind == FileKind::Directory
    }

    pub fn update_modified_at(&mut self) {
        let now = time_util::now();
        self.modified_at = now;
        self.accessed_at = now;
    }

    pub fn update_accessed_at(&mut self) {
        self.accessed_at = time_util::now();
    }

    /// grow the recorded size if a write ended past it
    pub fn adjust_size(&mut self, end: u32) {
        self.file_size = self.file_size.max(end);
    }
}

/// the in-memory copy of the whole inode table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InodeTable {
    inodes: Vec<Inode>,
}

impl InodeTable {
    /// a table of `capacity` unused slots
    pub fn new(capacity: u32) -> Self {
        let inodes = (0..capacity)
            .map(|index| Inode {
                inode_number: index,
                ..Inode::default()
            })
            .collect();
        InodeTable { inodes }
    }

    /// decode `capacity` consecutive records from the raw inode table region
    pub fn from_bytes(raw: &[u8], capacity: u32) -> Result<Self> {
        let needed = capacity as usize * INODE_SIZE;
        if raw.len() < needed {
            return Err(FsError::Corrupted(format!(
                "inode table region holds {} bytes, {capacity} inodes need {needed}",
                raw.len()
            )));
        }
        let inodes = raw[..needed]
            .chunks_exact(INODE_SIZE)
            .map(Inode::decode_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(InodeTable { inodes })
    }

    /// encode every slot back to back, zero padded to `region_bytes`
    pub fn to_bytes(&self, region_bytes: usize) -> Result<Vec<u8>> {
        let mut raw = vec![0u8; region_bytes.max(self.inodes.len() * INODE_SIZE)];
        for (inode, slot) in self.inodes.iter().zip(raw.chunks_exact_mut(INODE_SIZE)) {
            inode.encode_into(slot)?;
        }
        Ok(raw)
    }

    pub fn capacity(&self) -> u32 {
        self.inodes.len() as u32
    }

    pub fn get(&self, index: u32) -> Result<&Inode> {
        self.inodes
            .get(index as usize)
            .ok_or_else(|| FsError::out_of_range(index, self.capacity()))
    }

    /// store `inode` in the slot named by its `inode_number`
    /// # Returns
    /// the previous content of the slot
    pub fn put(&mut self, inode: Inode) -> Result<Inode> {
        let capacity = self.capacity();
        let slot = self
            .inodes
            .get_mut(inode.inode_number as usize)
            .ok_or_else(|| FsError::out_of_range(inode.inode_number, capacity))?;
        Ok(std::mem::replace(slot, inode))
    }

    /// take the lowest unused slot
    pub fn allocate(&mut self) -> Result<u32> {
        let index = self
            .inodes
            .iter()
            .position(|inode| !inode.used)
            .ok_or(FsError::Exhausted(Resource::Inodes))?;
        self.inodes[index] = Inode::new(index as u32);
        Ok(index as u32)
    }

    /// mark a slot unused, the rest of its content is left behind
    pub fn release(&mut self, index: u32) -> Result<()> {
        let capacity = self.capacity();
        let inode = self
            .inodes
            .get_mut(index as usize)
            .ok_or_else(|| FsError::out_of_range(index, capacity))?;
        inode.used = false;
        Ok(())
    }

    /// calculate the number of unused slots
    pub fn free_inodes(&self) -> usize {
        self.inodes.iter().filter(|inode| !inode.used).count()
    }
}

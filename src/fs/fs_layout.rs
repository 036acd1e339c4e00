//! what does our filesystem look like in the memory

use log::{debug, info, warn};

use crate::{
    device::BlockDevice,
    fs::{Directory, DirEntry, FileKind, FileName, Inode},
    utils::traits::FixedRecord,
};

use super::{
    Bitmap, FsError, InodeTable, OpenFileTable, Resource, Result, SuperBlock,
    DEFAULT_INODE_COUNT, DEFAULT_TOTAL_BLOCKS, ROOT_INODE, SUPERBLOCK_ID,
};

/// parameters of `format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub total_blocks: u32,
    pub inode_count: u32,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            total_blocks: DEFAULT_TOTAL_BLOCKS,
            inode_count: DEFAULT_INODE_COUNT,
        }
    }
}

/// space accounting, as reported by `df`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeUsage {
    pub block_size: u32,
    pub total_blocks: u32,
    /// blocks past the metadata regions
    pub data_blocks: u32,
    pub free_blocks: u32,
    pub inode_count: u32,
    pub free_inodes: u32,
}

/// A mounted volume: the block device plus cached copies of its metadata.
///
/// The superblock, bitmap and inode table are read from the device the
/// first time they are needed and written back in full after every change.
#[derive(Debug)]
pub struct Volume<D: BlockDevice> {
    device: D,
    superblock: Option<SuperBlock>,
    bitmap: Option<Bitmap>,
    inode_table: Option<InodeTable>,
    pub(crate) open_files: OpenFileTable,
}

impl<D: BlockDevice> Volume<D> {
    /// wrap a device, nothing is read until the first operation
    pub fn new(device: D) -> Self {
        Volume {
            device,
            superblock: None,
            bitmap: None,
            inode_table: None,
            open_files: OpenFileTable::default(),
        }
    }

    /// wrap a device and load its superblock right away
    pub fn mount(device: D) -> Result<Self> {
        let mut volume = Volume::new(device);
        volume.load_superblock()?;
        Ok(volume)
    }

    /// size `device` to `total_blocks` and lay out a fresh, empty volume on it
    pub fn format(device: D, total_blocks: u32) -> Result<Self> {
        Self::format_with(
            device,
            &FormatOptions {
                total_blocks,
                ..FormatOptions::default()
            },
        )
    }

    pub fn format_with(device: D, options: &FormatOptions) -> Result<Self> {
        let mut volume = Volume::new(device);
        volume.reformat(options)?;
        Ok(volume)
    }

    /// wipe this volume and format it again, every open handle is dropped
    ///
    /// a failure part way leaves the device in an indeterminate state
    pub fn reformat(&mut self, options: &FormatOptions) -> Result<()> {
        info!("reformat() called with {options:?}");
        let block_size = u32::try_from(self.device.block_size()).map_err(|_| {
            FsError::InvalidGeometry(format!("block size {}", self.device.block_size()))
        })?;
        let mut superblock =
            SuperBlock::new(options.total_blocks, block_size, options.inode_count)?;

        self.invalidate_caches();
        self.open_files.clear();
        self.device.init(options.total_blocks)?;
        self.save_superblock(superblock)?;

        self.inode_table = Some(InodeTable::new(superblock.inode_count));
        self.save_inode_table()?;
        self.initialize_bitmap(&superblock)?;

        superblock.root_inode = self.create_root()?;
        self.save_superblock(superblock)?;
        self.device.flush()
    }

    /// create root directory "/", its own parent
    fn create_root(&mut self) -> Result<u32> {
        let index = self.allocate_inode()?;
        if index != ROOT_INODE {
            return Err(FsError::Corrupted(format!(
                "root inode index must be {ROOT_INODE}, not {index}"
            )));
        }
        let block = self.allocate_block()?;
        self.write_dir(block, &Directory::new(self.device.block_size()))?;

        let mut inode = self.load_inode(index)?;
        inode.file_kind = FileKind::Directory;
        inode.name = FileName::root();
        inode.parent = index;
        inode.data_block = Some(block);
        self.save_inode(&inode)?;
        Ok(index)
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[cfg(test)]
    pub(crate) fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// flush the device to its backing storage
    pub fn sync(&mut self) -> Result<()> {
        self.device.flush()
    }

    /// forget every cached region, the next access re-reads the device
    pub fn invalidate_caches(&mut self) {
        self.superblock = None;
        self.bitmap = None;
        self.inode_table = None;
    }

    pub fn usage(&mut self) -> Result<VolumeUsage> {
        let superblock = self.superblock()?;
        Ok(VolumeUsage {
            block_size: superblock.block_size,
            total_blocks: superblock.total_blocks,
            data_blocks: superblock.data_blocks(),
            free_blocks: self.free_block_count()?,
            inode_count: superblock.inode_count,
            free_inodes: self.free_inode_count()?,
        })
    }
}

/// raw region access, a region is a run of whole blocks
fn read_region<D: BlockDevice>(device: &D, start: u32, blocks: u32) -> Result<Vec<u8>> {
    let block_size = device.block_size();
    let mut raw = vec![0u8; blocks as usize * block_size];
    for (block, buf) in (start..start + blocks).zip(raw.chunks_exact_mut(block_size)) {
        device.read_block(block, buf)?;
    }
    Ok(raw)
}

fn write_region<D: BlockDevice>(device: &mut D, start: u32, raw: &[u8]) -> Result<()> {
    let block_size = device.block_size();
    let mut buf = vec![0u8; block_size];
    for (block, chunk) in (start..).zip(raw.chunks(block_size)) {
        buf.fill(0);
        buf[..chunk.len()].copy_from_slice(chunk);
        device.write_block(block, &buf)?;
    }
    Ok(())
}

/// [SuperBlock] operations
impl<D: BlockDevice> Volume<D> {
    /// the cached superblock, loading it on first use
    pub fn superblock(&mut self) -> Result<SuperBlock> {
        match self.superblock {
            Some(superblock) => Ok(superblock),
            None => self.load_superblock(),
        }
    }

    /// read block 0 and check that it describes this device
    pub fn load_superblock(&mut self) -> Result<SuperBlock> {
        let mut buf = vec![0u8; self.device.block_size()];
        self.device.read_block(SUPERBLOCK_ID, &mut buf)?;
        let superblock = SuperBlock::decode_from(&buf[..SuperBlock::RECORD_SIZE])?;
        superblock.verify()?;

        if superblock.block_size as usize != self.device.block_size()
            || superblock.total_blocks > self.device.total_blocks()
        {
            warn!(
                "superblock describes {} blocks of {} bytes, device has {} blocks of {} bytes",
                superblock.total_blocks,
                superblock.block_size,
                self.device.total_blocks(),
                self.device.block_size()
            );
            return Err(FsError::InvalidFormat);
        }
        superblock.check_layout()?;

        debug!("superblock loaded: {superblock:?}");
        self.superblock = Some(superblock);
        Ok(superblock)
    }

    pub fn save_superblock(&mut self, superblock: SuperBlock) -> Result<()> {
        let mut buf = vec![0u8; self.device.block_size()];
        superblock.encode_into(&mut buf[..SuperBlock::RECORD_SIZE])?;
        self.device.write_block(SUPERBLOCK_ID, &buf)?;
        self.superblock = Some(superblock);
        Ok(())
    }

    pub fn root_inode(&mut self) -> Result<u32> {
        Ok(self.superblock()?.root_inode)
    }
}

/// bitmap allocator
impl<D: BlockDevice> Volume<D> {
    /// build a zeroed bitmap with the superblock, the bitmap itself
    /// and the inode table marked used, then persist it
    fn initialize_bitmap(&mut self, superblock: &SuperBlock) -> Result<()> {
        let region_bytes = superblock.bitmap_blocks() as usize * self.device.block_size();
        let mut bitmap = Bitmap::new(superblock.total_blocks, region_bytes);
        bitmap.reserve(0..superblock.data_start_block)?;
        self.bitmap = Some(bitmap);
        self.save_bitmap()
    }

    fn bitmap_mut(&mut self) -> Result<&mut Bitmap> {
        if self.bitmap.is_none() {
            self.load_bitmap()?;
        }
        self.bitmap.as_mut().ok_or(FsError::Uninitialized)
    }

    pub fn load_bitmap(&mut self) -> Result<()> {
        let superblock = self.superblock()?;
        let raw = read_region(
            &self.device,
            superblock.bitmap_block,
            superblock.bitmap_blocks(),
        )?;
        self.bitmap = Some(Bitmap::from_bytes(&raw, superblock.total_blocks));
        debug!("bitmap loaded");
        Ok(())
    }

    /// write the whole bitmap region back
    fn save_bitmap(&mut self) -> Result<()> {
        let superblock = self.superblock()?;
        let bitmap = self.bitmap.as_ref().ok_or(FsError::Uninitialized)?;
        write_region(&mut self.device, superblock.bitmap_block, bitmap.as_bytes())?;
        debug!("bitmap saved");
        Ok(())
    }

    /// take the lowest free block and persist the bitmap
    pub fn allocate_block(&mut self) -> Result<u32> {
        let block = self
            .bitmap_mut()?
            .allocate()
            .ok_or(FsError::Exhausted(Resource::Blocks))?;
        if let Err(e) = self.save_bitmap() {
            warn!("persisting allocation of block {block} failed, rolling back: {e}");
            self.bitmap_mut()?.release(block)?;
            return Err(e);
        }
        debug!("block {block} allocated");
        Ok(block)
    }

    /// release a data block, releasing a free block is a no-op
    ///
    /// blocks of the metadata regions are never released
    pub fn free_block(&mut self, block: u32) -> Result<()> {
        let superblock = self.superblock()?;
        if block < superblock.data_start_block || block >= superblock.total_blocks {
            return Err(FsError::out_of_range(block, superblock.total_blocks));
        }
        if !self.bitmap_mut()?.release(block)? {
            return Ok(());
        }
        if let Err(e) = self.save_bitmap() {
            warn!("persisting release of block {block} failed, rolling back: {e}");
            self.bitmap_mut()?.reserve(block..block + 1)?;
            return Err(e);
        }
        debug!("block {block} freed");
        Ok(())
    }

    pub fn is_block_free(&mut self, block: u32) -> Result<bool> {
        Ok(!self.bitmap_mut()?.is_used(block)?)
    }

    pub fn free_block_count(&mut self) -> Result<u32> {
        Ok(self.bitmap_mut()?.free_blocks() as u32)
    }
}

/// [Inode] operations
impl<D: BlockDevice> Volume<D> {
    fn inode_table_mut(&mut self) -> Result<&mut InodeTable> {
        if self.inode_table.is_none() {
            self.load_inode_table()?;
        }
        self.inode_table.as_mut().ok_or(FsError::Uninitialized)
    }

    pub fn load_inode_table(&mut self) -> Result<()> {
        let superblock = self.superblock()?;
        let raw = read_region(
            &self.device,
            superblock.inode_table_block,
            superblock.inode_table_blocks(),
        )?;
        self.inode_table = Some(InodeTable::from_bytes(&raw, superblock.inode_count)?);
        debug!("inode table loaded");
        Ok(())
    }

    /// drop the cached inode table and read it again,
    /// for changes another process made to the image
    pub fn reload_inode_table(&mut self) -> Result<()> {
        self.inode_table = None;
        self.load_inode_table()
    }

    /// write the whole inode table region back
    fn save_inode_table(&mut self) -> Result<()> {
        let superblock = self.superblock()?;
        let region_bytes = superblock.inode_table_blocks() as usize * self.device.block_size();
        let table = self.inode_table.as_ref().ok_or(FsError::Uninitialized)?;
        let raw = table.to_bytes(region_bytes)?;
        write_region(&mut self.device, superblock.inode_table_block, &raw)?;
        debug!("inode table saved");
        Ok(())
    }

    /// take the lowest unused slot and persist the table
    pub fn allocate_inode(&mut self) -> Result<u32> {
        let index = self.inode_table_mut()?.allocate()?;
        if let Err(e) = self.save_inode_table() {
            warn!("persisting allocation of inode {index} failed, rolling back: {e}");
            self.inode_table_mut()?.release(index)?;
            return Err(e);
        }
        debug!("inode {index} allocated");
        Ok(index)
    }

    /// mark a slot unused, its other fields stay as they were
    pub fn free_inode(&mut self, index: u32) -> Result<()> {
        let table = self.inode_table_mut()?;
        let previous = table.get(index)?.clone();
        table.release(index)?;
        if let Err(e) = self.save_inode_table() {
            warn!("persisting release of inode {index} failed, rolling back: {e}");
            self.inode_table_mut()?.put(previous)?;
            return Err(e);
        }
        debug!("inode {index} freed");
        Ok(())
    }

    /// a copy of slot `index`, used or not
    pub fn load_inode(&mut self, index: u32) -> Result<Inode> {
        Ok(self.inode_table_mut()?.get(index)?.clone())
    }

    /// store `inode` in its slot and persist the whole table
    pub fn save_inode(&mut self, inode: &Inode) -> Result<()> {
        let previous = self.inode_table_mut()?.put(inode.clone())?;
        if let Err(e) = self.save_inode_table() {
            warn!(
                "persisting inode {} failed, rolling back: {e}",
                inode.inode_number
            );
            self.inode_table_mut()?.put(previous)?;
            return Err(e);
        }
        Ok(())
    }

    pub fn free_inode_count(&mut self) -> Result<u32> {
        Ok(self.inode_table_mut()?.free_inodes() as u32)
    }
}

/// data blocks and directories
impl<D: BlockDevice> Volume<D> {
    pub(crate) fn read_data_block(&mut self, block: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.device.block_size()];
        self.device.read_block(block, &mut buf)?;
        Ok(buf)
    }

    pub(crate) fn write_data_block(&mut self, block: u32, buf: &[u8]) -> Result<()> {
        self.device.write_block(block, buf)
    }

    /// the inode of a live directory and its data block
    fn dir_inode(&mut self, index: u32) -> Result<(Inode, u32)> {
        let inode = self.load_inode(index)?;
        if !inode.used {
            return Err(FsError::NotFound);
        }
        if !inode.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let block = inode.data_block.ok_or_else(|| {
            FsError::Corrupted(format!("directory inode {index} has no data block"))
        })?;
        Ok((inode, block))
    }

    pub(crate) fn read_dir(&mut self, index: u32) -> Result<Directory> {
        let (_, block) = self.dir_inode(index)?;
        Directory::decode(&self.read_data_block(block)?)
    }

    pub(crate) fn write_dir(&mut self, block: u32, dir: &Directory) -> Result<()> {
        let raw = dir.encode(self.device.block_size())?;
        self.write_data_block(block, &raw)
    }

    /// write `dir` back and bump the directory's modified time
    fn save_dir(&mut self, index: u32, dir: &Directory) -> Result<()> {
        let (mut inode, block) = self.dir_inode(index)?;
        self.write_dir(block, dir)?;
        inode.update_modified_at();
        self.save_inode(&inode)
    }

    /// the live entries of a directory in slot order
    pub fn list_entries(&mut self, index: u32) -> Result<Vec<DirEntry>> {
        Ok(self.read_dir(index)?.entries().copied().collect())
    }

    pub fn insert_entry(
        &mut self,
        index: u32,
        name: FileName,
        child: u32,
        file_kind: FileKind,
    ) -> Result<()> {
        let mut dir = self.read_dir(index)?;
        dir.insert(name, child, file_kind)?;
        self.save_dir(index, &dir)
    }

    pub fn remove_entry(&mut self, index: u32, name: &str) -> Result<DirEntry> {
        let mut dir = self.read_dir(index)?;
        let entry = dir.remove(name)?;
        self.save_dir(index, &dir)?;
        Ok(entry)
    }

    pub fn is_dir_empty(&mut self, index: u32) -> Result<bool> {
        Ok(self.read_dir(index)?.is_empty())
    }
}

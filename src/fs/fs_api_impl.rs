//! path resolution and the file/directory operations built on it
use log::{debug, info, warn};
use smallvec::SmallVec;

use crate::{
    device::BlockDevice,
    fs::{DirEntry, Directory, FileKind, FileName, Inode},
};

use super::{FileHandle, FsError, OpenFile, OpenMode, Result, Volume};

/// path components, most paths in a tiny volume are only a few levels deep
type Components<'a> = SmallVec<[&'a str; 8]>;

/// split on `/`, ignoring leading, trailing and repeated separators
fn split_path(path: &str) -> Components<'_> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// lookups
impl<D: BlockDevice> Volume<D> {
    /// resolve a path to its inode number, walking down from the root
    ///
    /// `""` and `"/"` name the root; a regular file in the middle of a path
    /// makes the whole path unresolvable
    pub fn resolve(&mut self, path: &str) -> Result<u32> {
        self.resolve_components(&split_path(path))
    }

    fn resolve_components(&mut self, components: &[&str]) -> Result<u32> {
        let mut current = self.root_inode()?;
        for component in components {
            let dir = self.read_dir(current).map_err(|e| match e {
                FsError::NotADirectory => FsError::NotFound,
                e => e,
            })?;
            current = dir
                .entry(component)
                .ok_or(FsError::NotFound)?
                .inode_number;
        }
        Ok(current)
    }

    /// whether `path` names anything
    pub fn search(&mut self, path: &str) -> Result<bool> {
        info!("search() called with path: {path:?}");
        match self.resolve(path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// whether some entry of the directory at `path` has `pattern` in its name
    pub fn search_directory(&mut self, path: &str, pattern: &str) -> Result<bool> {
        info!("search_directory() called with path: {path:?}, pattern: {pattern:?}");
        let index = self.resolve(path)?;
        Ok(self
            .list_entries(index)?
            .iter()
            .any(|entry| entry.name.as_str().contains(pattern)))
    }

    pub fn stat(&mut self, path: &str) -> Result<Inode> {
        info!("stat() called with path: {path:?}");
        let index = self.resolve(path)?;
        self.load_inode(index)
    }

    /// the entries of the directory at `path` in slot order
    pub fn list(&mut self, path: &str) -> Result<Vec<DirEntry>> {
        info!("list() called with path: {path:?}");
        let index = self.resolve(path)?;
        let entries = self.list_entries(index)?;
        let mut inode = self.load_inode(index)?;
        inode.update_accessed_at();
        self.save_inode(&inode)?;
        Ok(entries)
    }
}

/// creating and removing objects
impl<D: BlockDevice> Volume<D> {
    /// create an empty file or directory at `path`
    ///
    /// Anything allocated before a failure is released again, so a failed
    /// create leaves the bitmap and the inode table as they were.
    pub fn create(&mut self, path: &str, file_kind: FileKind) -> Result<()> {
        info!("create() called with path: {path:?}, kind: {file_kind}");
        let mut components = split_path(path);
        let Some(leaf) = components.pop() else {
            // the root always exists
            return Err(FsError::AlreadyExists);
        };
        let name = FileName::new(leaf)?;
        let parent = self.resolve_components(&components)?;
        if self.read_dir(parent)?.entry(leaf).is_some() {
            return Err(FsError::AlreadyExists);
        }

        let index = self.allocate_inode()?;
        let mut block = None;
        if let Err(e) = self.link_new_inode(index, parent, name, file_kind, &mut block) {
            warn!("create() of {path:?} failed, releasing inode {index} and block {block:?}: {e}");
            if let Some(block) = block {
                if let Err(cleanup) = self.free_block(block) {
                    warn!("releasing block {block} failed: {cleanup}");
                }
            }
            if let Err(cleanup) = self.free_inode(index) {
                warn!("releasing inode {index} failed: {cleanup}");
            }
            return Err(e);
        }
        debug!("{path:?} created as inode {index}");
        Ok(())
    }

    /// fill in a freshly allocated inode and put it into its parent,
    /// `block` records a data block as soon as one is allocated
    fn link_new_inode(
        &mut self,
        index: u32,
        parent: u32,
        name: FileName,
        file_kind: FileKind,
        block: &mut Option<u32>,
    ) -> Result<()> {
        if file_kind == FileKind::Directory {
            let new_block = self.allocate_block()?;
            *block = Some(new_block);
            let block_size = self.superblock()?.block_size as usize;
            self.write_dir(new_block, &Directory::new(block_size))?;
        }

        let mut inode = self.load_inode(index)?;
        inode.file_kind = file_kind;
        inode.name = name;
        inode.parent = parent;
        inode.data_block = *block;
        self.save_inode(&inode)?;

        self.insert_entry(parent, name, index, file_kind)
    }

    pub fn create_file(&mut self, path: &str) -> Result<()> {
        self.create(path, FileKind::File)
    }

    pub fn make_directory(&mut self, path: &str) -> Result<()> {
        self.create(path, FileKind::Directory)
    }

    /// delete a regular file, handles still open on it become invalid
    pub fn delete(&mut self, path: &str) -> Result<()> {
        info!("delete() called with path: {path:?}");
        let index = self.resolve(path)?;
        let inode = self.load_inode(index)?;
        if !inode.is_regular_file() {
            return Err(FsError::NotAFile);
        }
        self.unlink(&inode)
    }

    /// remove an empty directory other than the root
    pub fn remove_directory(&mut self, path: &str) -> Result<()> {
        info!("remove_directory() called with path: {path:?}");
        let index = self.resolve(path)?;
        if index == self.root_inode()? {
            return Err(FsError::IsRoot);
        }
        let inode = self.load_inode(index)?;
        if !inode.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if !self.is_dir_empty(index)? {
            return Err(FsError::NotEmpty);
        }
        self.unlink(&inode)
    }

    /// drop the parent's entry, then the data block, then the inode
    ///
    /// once the entry is gone both releases are attempted, the first
    /// failure is returned
    fn unlink(&mut self, inode: &Inode) -> Result<()> {
        let index = inode.inode_number;
        self.remove_entry(inode.parent, &inode.name.as_str())?;
        let dropped = self.open_files.close_all_for(index);
        if dropped > 0 {
            debug!("{dropped} open handles on inode {index} dropped");
        }
        let mut result = Ok(());
        if let Some(block) = inode.data_block {
            if let Err(e) = self.free_block(block) {
                warn!("releasing block {block} of inode {index} failed: {e}");
                result = Err(e);
            }
        }
        if let Err(e) = self.free_inode(index) {
            warn!("releasing inode {index} failed: {e}");
            result = result.and(Err(e));
        }
        result
    }
}

/// open files
impl<D: BlockDevice> Volume<D> {
    /// open a regular file, the cursor starts at 0
    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<FileHandle> {
        info!("open() called with path: {path:?}, mode: {mode:?}");
        let index = self.resolve(path)?;
        let mut inode = self.load_inode(index)?;
        if !inode.is_regular_file() {
            return Err(FsError::NotAFile);
        }
        let handle = self.open_files.open(index, mode)?;
        inode.update_accessed_at();
        if let Err(e) = self.save_inode(&inode) {
            self.open_files.close(handle)?;
            return Err(e);
        }
        Ok(handle)
    }

    pub fn close(&mut self, handle: FileHandle) -> Result<()> {
        info!("close() called with handle: {handle}");
        let file = self.open_files.close(handle)?;
        let mut inode = self.load_inode(file.inode_number)?;
        inode.update_accessed_at();
        self.save_inode(&inode)
    }

    pub fn open_file(&self, handle: FileHandle) -> Result<&OpenFile> {
        self.open_files.get(handle)
    }

    /// read up to `max_len` bytes at the cursor and advance it
    ///
    /// yields nothing at or past the end of the file, or when the file
    /// has no data block yet
    pub fn read(&mut self, handle: FileHandle, max_len: usize) -> Result<Vec<u8>> {
        info!("read() called with handle: {handle}, max_len: {max_len}");
        let file = *self.open_files.get(handle)?;
        if !file.mode.readable() {
            return Err(FsError::ModeMismatch("reading"));
        }
        let mut inode = self.load_inode(file.inode_number)?;
        let Some(block) = inode.data_block else {
            return Ok(Vec::new());
        };
        if file.position >= inode.file_size {
            return Ok(Vec::new());
        }

        let data = self.read_data_block(block)?;
        let start = file.position as usize;
        let len = max_len.min((inode.file_size - file.position) as usize);
        let end = (start + len).min(data.len());
        let bytes = data[start..end].to_vec();

        self.open_files.get_mut(handle)?.position += bytes.len() as u32;
        inode.update_accessed_at();
        self.save_inode(&inode)?;
        Ok(bytes)
    }

    /// write at the cursor, or at the end of the file for append handles
    ///
    /// a file never outgrows its single block: the part of `data` that does
    /// not fit is dropped
    /// # Returns
    /// how many bytes were written
    pub fn write(&mut self, handle: FileHandle, data: &[u8]) -> Result<usize> {
        info!("write() called with handle: {handle}, {} bytes", data.len());
        let file = *self.open_files.get(handle)?;
        if !file.mode.writable() {
            return Err(FsError::ModeMismatch("writing"));
        }
        let mut inode = self.load_inode(file.inode_number)?;
        let block_size = self.superblock()?.block_size as usize;
        let position = match file.mode.appends() {
            true => inode.file_size as usize,
            false => file.position as usize,
        };
        let written = data.len().min(block_size.saturating_sub(position));
        if written == 0 {
            return Ok(0);
        }

        match inode.data_block {
            Some(block) => self.write_at(&mut inode, block, position, &data[..written], false)?,
            None => {
                let block = self.allocate_block()?;
                if let Err(e) = self.write_at(&mut inode, block, position, &data[..written], true)
                {
                    warn!(
                        "first write to inode {} failed, releasing block {block}: {e}",
                        inode.inode_number
                    );
                    if let Err(cleanup) = self.free_block(block) {
                        warn!("releasing block {block} failed: {cleanup}");
                    }
                    return Err(e);
                }
            }
        }

        self.open_files.get_mut(handle)?.position = (position + written) as u32;
        Ok(written)
    }

    fn write_at(
        &mut self,
        inode: &mut Inode,
        block: u32,
        position: usize,
        bytes: &[u8],
        fresh: bool,
    ) -> Result<()> {
        let mut buf = if fresh {
            vec![0u8; self.superblock()?.block_size as usize]
        } else {
            self.read_data_block(block)?
        };
        buf[position..position + bytes.len()].copy_from_slice(bytes);
        self.write_data_block(block, &buf)?;

        inode.data_block = Some(block);
        inode.adjust_size((position + bytes.len()) as u32);
        inode.update_modified_at();
        self.save_inode(inode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::MemDisk,
        fs::{FormatOptions, Resource, DEFAULT_BLOCK_SIZE, MAX_OPEN_FILES},
        utils::init_test_environment::{init_flaky_volume, init_test_volume},
    };

    const BLOCK_SIZE: usize = DEFAULT_BLOCK_SIZE as usize;

    fn counts(volume: &mut Volume<MemDisk>) -> (u32, u32) {
        (
            volume.free_block_count().unwrap(),
            volume.free_inode_count().unwrap(),
        )
    }

    fn write_file(volume: &mut Volume<MemDisk>, path: &str, data: &[u8]) -> usize {
        let handle = volume.open(path, OpenMode::WRITE).unwrap();
        let written = volume.write(handle, data).unwrap();
        volume.close(handle).unwrap();
        written
    }

    fn read_file(volume: &mut Volume<MemDisk>, path: &str) -> Vec<u8> {
        let handle = volume.open(path, OpenMode::READ).unwrap();
        let data = volume.read(handle, usize::MAX).unwrap();
        volume.close(handle).unwrap();
        data
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("").is_empty());
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/a//b/").as_slice(), &["a", "b"]);
        assert_eq!(split_path("a/b").as_slice(), &["a", "b"]);
    }

    #[test]
    fn test_small_volume_scenario() {
        let mut volume = init_test_volume(20);
        volume.create("/a.txt", FileKind::File).unwrap();

        let handle = volume.open("/a.txt", OpenMode::WRITE).unwrap();
        assert_eq!(volume.write(handle, b"hi").unwrap(), 2);
        volume.close(handle).unwrap();

        let handle = volume.open("/a.txt", OpenMode::READ).unwrap();
        assert_eq!(volume.read(handle, 10).unwrap(), b"hi");
        volume.close(handle).unwrap();

        volume.delete("/a.txt").unwrap();
        assert!(!volume.search("/a.txt").unwrap());
    }

    #[test]
    fn test_resolve() {
        let mut volume = init_test_volume(64);
        assert_eq!(volume.resolve("").unwrap(), 0);
        assert_eq!(volume.resolve("/").unwrap(), 0);

        volume.make_directory("/docs").unwrap();
        volume.make_directory("/docs/old").unwrap();
        volume.create_file("/docs/old/a.txt").unwrap();
        let index = volume.resolve("/docs/old/a.txt").unwrap();
        assert_eq!(volume.resolve("docs//old/a.txt/").unwrap(), index);

        assert!(matches!(volume.resolve("/docs/new"), Err(FsError::NotFound)));
        // a file in the middle of a path
        assert!(matches!(
            volume.resolve("/docs/old/a.txt/x"),
            Err(FsError::NotFound)
        ));
        // longer than any stored name can be
        let long = format!("/{}", "n".repeat(40));
        assert!(matches!(volume.resolve(&long), Err(FsError::NotFound)));
    }

    #[test]
    fn test_create_errors() {
        let mut volume = init_test_volume(64);
        volume.make_directory("/d").unwrap();
        assert!(matches!(volume.make_directory("/d"), Err(FsError::AlreadyExists)));
        assert!(matches!(volume.create_file("/d"), Err(FsError::AlreadyExists)));
        assert!(matches!(volume.create_file("/"), Err(FsError::AlreadyExists)));
        assert!(matches!(volume.create_file("/nope/x"), Err(FsError::NotFound)));
        assert!(matches!(
            volume.create_file(&format!("/{}", "n".repeat(32))),
            Err(FsError::InvalidName(_))
        ));

        volume.create_file("/f").unwrap();
        assert!(matches!(volume.create_file("/f/x"), Err(FsError::NotADirectory)));
    }

    #[test]
    fn test_created_inode_fields() {
        let mut volume = init_test_volume(64);
        volume.make_directory("/d").unwrap();
        volume.create_file("/d/f").unwrap();

        let dir = volume.stat("/d").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.parent, 0);
        assert!(dir.data_block.is_some());

        let file = volume.stat("/d/f").unwrap();
        assert!(file.is_regular_file());
        assert_eq!(file.name.to_string(), "f");
        assert_eq!(file.parent, dir.inode_number);
        assert_eq!(file.data_block, None);
        assert_eq!(file.file_size, 0);
    }

    #[test]
    fn test_inode_exhaustion() {
        let options = FormatOptions {
            total_blocks: 64,
            inode_count: 8,
        };
        let mut volume = Volume::format_with(MemDisk::new(BLOCK_SIZE).unwrap(), &options).unwrap();
        // the root holds one of the eight inodes
        for i in 0..7 {
            volume.create_file(&format!("/f{i}")).unwrap();
        }
        let before = counts(&mut volume);
        assert!(matches!(
            volume.create_file("/f7"),
            Err(FsError::Exhausted(Resource::Inodes))
        ));
        assert_eq!(counts(&mut volume), before);

        volume.delete("/f3").unwrap();
        volume.create_file("/f7").unwrap();
    }

    #[test]
    fn test_directory_capacity() {
        let mut volume = init_test_volume(64);
        let capacity = BLOCK_SIZE / crate::fs::DIR_ENTRY_SIZE;
        for i in 0..capacity {
            volume.create_file(&format!("/f{i}")).unwrap();
        }
        let before = counts(&mut volume);
        assert!(matches!(volume.create_file("/extra"), Err(FsError::Full)));
        // the directory's block and inode are released again
        assert!(matches!(volume.make_directory("/extra"), Err(FsError::Full)));
        assert_eq!(counts(&mut volume), before);
        assert!(!volume.search("/extra").unwrap());
    }

    #[test]
    fn test_create_delete_symmetry() {
        let mut volume = init_test_volume(64);
        let before = counts(&mut volume);

        volume.create_file("/a.txt").unwrap();
        write_file(&mut volume, "/a.txt", b"some content");
        assert_ne!(counts(&mut volume), before);
        volume.delete("/a.txt").unwrap();
        assert_eq!(counts(&mut volume), before);

        volume.make_directory("/d").unwrap();
        volume.remove_directory("/d").unwrap();
        assert_eq!(counts(&mut volume), before);
        assert!(volume.list("/").unwrap().is_empty());
    }

    #[test]
    fn test_read_back_what_was_written() {
        let mut volume = init_test_volume(64);
        volume.create_file("/data").unwrap();
        for n in [1, 2, 17, 100, BLOCK_SIZE - 1, BLOCK_SIZE] {
            let payload: Vec<u8> = (0..n).map(|i| (i * 7 % 251) as u8).collect();
            let handle = volume.open("/data", OpenMode::WRITE).unwrap();
            assert_eq!(volume.write(handle, &payload).unwrap(), n);
            volume.close(handle).unwrap();

            let handle = volume.open("/data", OpenMode::READ).unwrap();
            assert_eq!(volume.read(handle, n).unwrap(), payload);
            volume.close(handle).unwrap();
        }
    }

    #[test]
    fn test_oversized_write_is_truncated() {
        let mut volume = init_test_volume(64);
        volume.create_file("/big").unwrap();
        let payload = vec![b'x'; BLOCK_SIZE + 50];
        assert_eq!(write_file(&mut volume, "/big", &payload), BLOCK_SIZE);
        assert_eq!(read_file(&mut volume, "/big"), vec![b'x'; BLOCK_SIZE]);
        assert_eq!(volume.stat("/big").unwrap().file_size, BLOCK_SIZE as u32);

        // the block is full, nothing more fits
        let handle = volume.open("/big", OpenMode::APPEND).unwrap();
        assert_eq!(volume.write(handle, b"more").unwrap(), 0);
    }

    #[test]
    fn test_read_edge_cases() {
        let mut volume = init_test_volume(64);
        volume.create_file("/empty").unwrap();
        let handle = volume.open("/empty", OpenMode::READ).unwrap();
        assert!(volume.read(handle, 10).unwrap().is_empty());

        volume.create_file("/abc").unwrap();
        write_file(&mut volume, "/abc", b"abcdef");
        let handle = volume.open("/abc", OpenMode::READ).unwrap();
        assert_eq!(volume.read(handle, 4).unwrap(), b"abcd");
        assert_eq!(volume.open_file(handle).unwrap().position, 4);
        assert_eq!(volume.read(handle, 4).unwrap(), b"ef");
        assert!(volume.read(handle, 4).unwrap().is_empty());
    }

    #[test]
    fn test_write_modes() {
        let mut volume = init_test_volume(64);
        volume.create_file("/f").unwrap();
        write_file(&mut volume, "/f", b"hello");
        // overwriting keeps the longer size
        write_file(&mut volume, "/f", b"hi");
        assert_eq!(read_file(&mut volume, "/f"), b"hillo");

        let handle = volume.open("/f", OpenMode::APPEND).unwrap();
        assert_eq!(volume.write(handle, b" world").unwrap(), 6);
        assert_eq!(volume.open_file(handle).unwrap().position, 11);
        volume.close(handle).unwrap();
        assert_eq!(read_file(&mut volume, "/f"), b"hillo world");

        // consecutive writes on one handle follow the cursor
        volume.create_file("/g").unwrap();
        let handle = volume.open("/g", OpenMode::READ | OpenMode::WRITE).unwrap();
        volume.write(handle, b"ab").unwrap();
        volume.write(handle, b"cd").unwrap();
        volume.close(handle).unwrap();
        assert_eq!(read_file(&mut volume, "/g"), b"abcd");
    }

    #[test]
    fn test_handle_modes_are_enforced() {
        let mut volume = init_test_volume(64);
        volume.create_file("/f").unwrap();
        let reader = volume.open("/f", OpenMode::READ).unwrap();
        assert!(matches!(
            volume.write(reader, b"x"),
            Err(FsError::ModeMismatch(_))
        ));
        let writer = volume.open("/f", OpenMode::WRITE).unwrap();
        assert!(matches!(volume.read(writer, 1), Err(FsError::ModeMismatch(_))));

        volume.close(reader).unwrap();
        assert!(matches!(volume.close(reader), Err(FsError::InvalidHandle(_))));
        assert!(matches!(volume.read(reader, 1), Err(FsError::InvalidHandle(_))));
    }

    #[test]
    fn test_open_errors_and_handle_exhaustion() {
        let mut volume = init_test_volume(64);
        assert!(matches!(volume.open("/missing", OpenMode::READ), Err(FsError::NotFound)));
        assert!(matches!(volume.open("/", OpenMode::READ), Err(FsError::NotAFile)));

        volume.create_file("/f").unwrap();
        for _ in 0..MAX_OPEN_FILES {
            volume.open("/f", OpenMode::READ).unwrap();
        }
        assert!(matches!(
            volume.open("/f", OpenMode::READ),
            Err(FsError::Exhausted(Resource::Handles))
        ));
    }

    #[test]
    fn test_write_without_free_blocks() {
        let mut volume = init_test_volume(20);
        volume.create_file("/f").unwrap();
        while volume.allocate_block().is_ok() {}

        let handle = volume.open("/f", OpenMode::WRITE).unwrap();
        assert!(matches!(
            volume.write(handle, b"data"),
            Err(FsError::Exhausted(Resource::Blocks))
        ));
        assert_eq!(volume.stat("/f").unwrap().file_size, 0);
        // an empty write needs no block
        assert_eq!(volume.write(handle, b"").unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let mut volume = init_test_volume(64);
        volume.make_directory("/d").unwrap();
        volume.create_file("/d/f").unwrap();
        assert!(matches!(volume.delete("/d"), Err(FsError::NotAFile)));
        assert!(matches!(volume.delete("/d/g"), Err(FsError::NotFound)));

        let handle = volume.open("/d/f", OpenMode::READ).unwrap();
        volume.delete("/d/f").unwrap();
        assert!(matches!(volume.read(handle, 1), Err(FsError::InvalidHandle(_))));
        assert!(volume.list("/d").unwrap().is_empty());
    }

    #[test]
    fn test_unlink_keeps_releasing_after_a_failure() {
        let mut volume = init_flaky_volume(20);
        let free_inodes = volume.free_inode_count().unwrap();
        volume.make_directory("/d").unwrap();
        let block = volume.stat("/d").unwrap().data_block.unwrap();

        // the bitmap lives in block 1
        volume.device_mut().refused = 1..2;
        assert!(matches!(volume.remove_directory("/d"), Err(FsError::Io(_))));
        assert!(!volume.search("/d").unwrap());
        assert_eq!(volume.free_inode_count().unwrap(), free_inodes);
        assert!(!volume.is_block_free(block).unwrap());

        volume.device_mut().refused = 0..0;
        volume.free_block(block).unwrap();
        assert!(volume.is_block_free(block).unwrap());
    }

    #[test]
    fn test_remove_directory() {
        let mut volume = init_test_volume(64);
        assert!(matches!(volume.remove_directory("/"), Err(FsError::IsRoot)));
        assert!(matches!(volume.remove_directory(""), Err(FsError::IsRoot)));

        volume.make_directory("/d").unwrap();
        volume.create_file("/d/f").unwrap();
        assert!(matches!(volume.remove_directory("/d"), Err(FsError::NotEmpty)));
        assert!(matches!(
            volume.remove_directory("/d/f"),
            Err(FsError::NotADirectory)
        ));
        assert!(matches!(volume.remove_directory("/x"), Err(FsError::NotFound)));

        volume.delete("/d/f").unwrap();
        volume.remove_directory("/d").unwrap();
        assert!(!volume.search("/d").unwrap());
    }

    #[test]
    fn test_list_in_slot_order() {
        let mut volume = init_test_volume(64);
        for name in ["/a", "/b", "/c"] {
            volume.create_file(name).unwrap();
        }
        volume.delete("/a").unwrap();
        volume.make_directory("/d").unwrap();

        let listing: Vec<(String, FileKind)> = volume
            .list("/")
            .unwrap()
            .iter()
            .map(|e| (e.name.to_string(), e.file_kind))
            .collect();
        assert_eq!(
            listing,
            vec![
                ("d".to_string(), FileKind::Directory),
                ("b".to_string(), FileKind::File),
                ("c".to_string(), FileKind::File),
            ]
        );
        assert!(matches!(volume.list("/b"), Err(FsError::NotADirectory)));
    }

    #[test]
    fn test_list_updates_accessed_time() {
        let mut volume = init_test_volume(64);
        let before = volume.stat("/").unwrap().accessed_at;
        volume.list("/").unwrap();
        assert!(volume.stat("/").unwrap().accessed_at >= before);
    }

    #[test]
    fn test_search_directory() {
        let mut volume = init_test_volume(64);
        volume.make_directory("/logs").unwrap();
        volume.create_file("/logs/app-2023.log").unwrap();
        assert!(volume.search_directory("/logs", "2023").unwrap());
        assert!(volume.search_directory("/logs", "app").unwrap());
        assert!(!volume.search_directory("/logs", "2024").unwrap());
        assert!(volume.search_directory("/", "log").unwrap());
        assert!(matches!(
            volume.search_directory("/nope", "x"),
            Err(FsError::NotFound)
        ));
    }

    #[test]
    fn test_content_survives_remount() {
        let mut volume = init_test_volume(64);
        volume.make_directory("/d").unwrap();
        volume.create_file("/d/note").unwrap();
        write_file(&mut volume, "/d/note", b"persisted");

        let mut volume = Volume::mount(volume.into_device()).unwrap();
        assert_eq!(read_file(&mut volume, "/d/note"), b"persisted");
        assert_eq!(volume.stat("/d/note").unwrap().file_size, 9);
    }
}

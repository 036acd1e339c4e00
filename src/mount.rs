//! open a volume stored in an image file
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::{device::ImageDisk, fs::Volume};

/// map an existing image and load its superblock
///
/// fails when the image does not hold a volume with this block size
pub fn mount<P>(image_path: P, block_size: u32) -> anyhow::Result<Volume<ImageDisk>>
where
    P: AsRef<Path>,
{
    let image_path = image_path.as_ref();
    info!("mount() called with path: {}", image_path.display());
    let disk = ImageDisk::open(image_path, block_size as usize)
        .with_context(|| format!("can't open image file {}", image_path.display()))?;
    let volume = Volume::mount(disk)
        .with_context(|| format!("{} holds no usable volume", image_path.display()))?;
    Ok(volume)
}

use std::io::{BufRead, Write};

use anyhow::Context;
use byte_unit::{Byte, ByteUnit};
use log::warn;

use super::{Command, FsCommand, TinyFsCli};
use crate::{
    device::BlockDevice,
    fs::{OpenMode, Volume},
    mkfs::mkfs,
    mount::mount,
    shell::Shell,
};

/// run a parsed command line, `input` only feeds the shell
pub fn execute<R: BufRead, W: Write>(cli: TinyFsCli, input: R, out: &mut W) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => {
            mkfs(
                &cli.image_file_path,
                args.blocks,
                cli.block_size,
                args.inode_count,
            )?;
            writeln!(out, "File system initialized: {} blocks", args.blocks)?;
        }
        Command::Shell => Shell::new(input, out, cli.block_size).run()?,
        Command::Fs(command) => {
            let mut volume = mount(&cli.image_file_path, cli.block_size)
                .context("Failed to open disk. Run 'init' first.")?;
            let result = run_fs_command(&mut volume, &command, out);
            // whatever happened, keep what reached the image
            volume.sync()?;
            result?;
        }
    }
    Ok(())
}

/// run one file operation against `volume`, printing what a user should see
pub fn run_fs_command<D: BlockDevice, W: Write>(
    volume: &mut Volume<D>,
    command: &FsCommand,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        FsCommand::Touch { path } => {
            volume
                .create_file(path)
                .with_context(|| format!("Failed to create file: {path}"))?;
            writeln!(out, "File created: {path}")?;
        }
        FsCommand::Mkdir { path } => {
            volume
                .make_directory(path)
                .with_context(|| format!("Failed to create directory: {path}"))?;
            writeln!(out, "Directory created: {path}")?;
        }
        FsCommand::Ls { path } => {
            let entries = volume
                .list(path)
                .with_context(|| format!("Failed to list directory: {path}"))?;
            for entry in entries {
                writeln!(out, "{} {}", entry.file_kind, entry.name)?;
            }
        }
        FsCommand::Rm { path } => {
            volume
                .delete(path)
                .with_context(|| format!("Failed to delete file: {path}"))?;
            writeln!(out, "File deleted: {path}")?;
        }
        FsCommand::Rmdir { path } => {
            volume
                .remove_directory(path)
                .with_context(|| format!("Failed to remove directory: {path}"))?;
            writeln!(out, "Directory removed: {path}")?;
        }
        FsCommand::Cat { path } => cat(volume, path, out)?,
        FsCommand::Write { path, text } => {
            write_text(volume, path, &text.join(" "), OpenMode::WRITE)?;
            writeln!(out, "Text written to: {path}")?;
        }
        FsCommand::Append { path, text } => {
            write_text(volume, path, &text.join(" "), OpenMode::APPEND)?;
            writeln!(out, "Text appended to: {path}")?;
        }
        FsCommand::Search { path } => {
            if volume.search(path)? {
                writeln!(out, "Found: {path}")?;
            } else {
                writeln!(out, "Not found: {path}")?;
            }
        }
        FsCommand::Find { dir, pattern } => {
            let found = volume
                .search_directory(dir, pattern)
                .with_context(|| format!("Failed to search directory: {dir}"))?;
            if found {
                writeln!(out, "Found entries matching {pattern:?} in {dir}")?;
            } else {
                writeln!(out, "No entries matching {pattern:?} in {dir}")?;
            }
        }
        FsCommand::Stat { path } => {
            let inode = volume
                .stat(path)
                .with_context(|| format!("Failed to stat: {path}"))?;
            writeln!(out, "  Name: {}", inode.name)?;
            writeln!(out, " Inode: {}", inode.inode_number)?;
            writeln!(out, "  Type: {}", inode.file_kind)?;
            writeln!(out, "  Size: {}", inode.file_size)?;
            match inode.data_block {
                Some(block) => writeln!(out, " Block: {block}")?,
                None => writeln!(out, " Block: -")?,
            }
            writeln!(out, "Parent: {}", inode.parent)?;
            writeln!(out, "Create: {}", inode.created_at)?;
            writeln!(out, "Modify: {}", inode.modified_at)?;
            writeln!(out, "Access: {}", inode.accessed_at)?;
        }
        FsCommand::Df => {
            let usage = volume.usage()?;
            let bytes = |blocks: u32| {
                Byte::from_bytes(blocks as u128 * usage.block_size as u128)
                    .get_appropriate_unit(true)
            };
            writeln!(
                out,
                "Block size: {}",
                Byte::from_bytes(usage.block_size as _).get_adjusted_unit(ByteUnit::B)
            )?;
            writeln!(
                out,
                "Blocks: {} total, {} data, {} free",
                usage.total_blocks, usage.data_blocks, usage.free_blocks
            )?;
            writeln!(
                out,
                "Space: {} total, {} free",
                bytes(usage.total_blocks),
                bytes(usage.free_blocks)
            )?;
            writeln!(
                out,
                "Inodes: {} total, {} free",
                usage.inode_count, usage.free_inodes
            )?;
        }
    }
    Ok(())
}

fn cat<D: BlockDevice, W: Write>(volume: &mut Volume<D>, path: &str, out: &mut W) -> anyhow::Result<()> {
    let handle = volume
        .open(path, OpenMode::READ)
        .with_context(|| format!("Failed to open file: {path}"))?;
    let block_size = volume.superblock()?.block_size as usize;
    loop {
        let chunk = volume.read(handle, block_size)?;
        if chunk.is_empty() {
            break;
        }
        out.write_all(&chunk)?;
    }
    writeln!(out)?;
    volume.close(handle)?;
    Ok(())
}

/// write `text` through a handle opened with `mode`, creating the file first when needed
fn write_text<D: BlockDevice>(
    volume: &mut Volume<D>,
    path: &str,
    text: &str,
    mode: OpenMode,
) -> anyhow::Result<()> {
    if !volume.search(path)? {
        volume
            .create_file(path)
            .with_context(|| format!("Failed to create file: {path}"))?;
    }
    let handle = volume
        .open(path, mode)
        .with_context(|| format!("Failed to open file: {path}"))?;
    let written = volume.write(handle, text.as_bytes());
    volume.close(handle)?;
    let written = written.with_context(|| format!("Failed to write to file: {path}"))?;
    if written < text.len() {
        warn!("only {written} of {} bytes fit into {path}", text.len());
    }
    Ok(())
}

//! an interactive shell over a volume kept in RAM
//!
//! Nothing reaches the disk unless the user `save`s the volume to an image file.
use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use log::info;

use crate::{
    cli_interface::{run_fs_command, FsCommand},
    device::MemDisk,
    fs::Volume,
};

const PROMPT: &str = "tfs> ";
/// volume size of a bare `init`
pub const SHELL_DEFAULT_BLOCKS: u32 = 512;

/// one line typed at the prompt
#[derive(Parser, Debug, PartialEq)]
#[command(no_binary_name = true, name = "tfs", disable_version_flag = true)]
enum ShellCommand {
    /// initialize a file system in RAM
    Init { blocks: Option<u32> },
    /// replace the RAM volume with the content of an image file
    Load { image: String },
    /// write the RAM volume to an image file
    Save { image: String },
    /// leave the shell, unsaved data is lost
    #[command(alias = "quit")]
    Exit,
    #[command(flatten)]
    Fs(FsCommand),
}

enum Flow {
    Continue,
    Exit,
}

pub struct Shell<R, W> {
    input: R,
    out: W,
    block_size: u32,
    volume: Option<Volume<MemDisk>>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, out: W, block_size: u32) -> Self {
        Shell {
            input,
            out,
            block_size,
            volume: None,
        }
    }

    /// read and run lines until `exit` or the end of the input
    pub fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "TinyFS Interactive Shell (RAM-only mode)")?;
        writeln!(self.out, "Type 'help' for commands, 'exit' to quit")?;
        writeln!(self.out, "Note: All data is in RAM and will be lost on exit\n")?;

        let mut line = String::new();
        loop {
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let tokens = match tokenize(&line) {
                Ok(tokens) if tokens.is_empty() => continue,
                Ok(tokens) => tokens,
                Err(e) => {
                    writeln!(self.out, "Error: {e}")?;
                    continue;
                }
            };
            match self.run_line(&tokens) {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(self.out, "Error: {e:#}")?,
            }
        }
        writeln!(self.out, "\nGoodbye! All unsaved data has been erased.")?;
        Ok(())
    }

    fn run_line(&mut self, tokens: &[String]) -> anyhow::Result<Flow> {
        info!("shell line: {tokens:?}");
        let command = match ShellCommand::try_parse_from(tokens) {
            Ok(command) => command,
            Err(e) => {
                // also where `help` ends up
                write!(self.out, "{e}")?;
                return Ok(Flow::Continue);
            }
        };
        match command {
            ShellCommand::Init { blocks } => {
                let blocks = blocks.unwrap_or(SHELL_DEFAULT_BLOCKS);
                let volume = Volume::format(MemDisk::new(self.block_size as usize)?, blocks)
                    .context("Failed to initialize file system")?;
                self.volume = Some(volume);
                writeln!(self.out, "File system initialized in RAM: {blocks} blocks")?;
            }
            ShellCommand::Load { image } => {
                let disk = MemDisk::load_image(&image, self.block_size as usize)
                    .with_context(|| format!("Failed to read image: {image}"))?;
                let mut volume = Volume::mount(disk)
                    .with_context(|| format!("{image} holds no usable volume"))?;
                let blocks = volume.superblock()?.total_blocks;
                self.volume = Some(volume);
                writeln!(self.out, "Loaded {image}: {blocks} blocks")?;
            }
            ShellCommand::Save { image } => {
                let Some(volume) = self.volume.as_ref() else {
                    bail!("File system not initialized. Type 'init' first.");
                };
                volume
                    .device()
                    .save_image(&image)
                    .with_context(|| format!("Failed to save image: {image}"))?;
                writeln!(self.out, "Saved to {image}")?;
            }
            ShellCommand::Exit => return Ok(Flow::Exit),
            ShellCommand::Fs(command) => {
                let volume = self
                    .volume
                    .as_mut()
                    .ok_or_else(|| anyhow!("File system not initialized. Type 'init' first."))?;
                run_fs_command(volume, &command, &mut self.out)?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// split a line on whitespace, double quotes group words into one argument
fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current: Option<String> = None;
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                // `""` is an empty argument
                current.get_or_insert_with(String::new);
            }
            c if c.is_whitespace() && !quoted => {
                if let Some(token) = current.take() {
                    tokens.push(token);
                }
            }
            c => current.get_or_insert_with(String::new).push(c),
        }
    }
    if quoted {
        bail!("unterminated quote");
    }
    tokens.extend(current);
    Ok(tokens)
}

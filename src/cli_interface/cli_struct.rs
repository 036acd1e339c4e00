use clap::{Parser, Subcommand};

use crate::fs::{DEFAULT_BLOCK_SIZE, DEFAULT_INODE_COUNT, DEFAULT_TOTAL_BLOCKS};

pub const DEFAULT_IMAGE_PATH: &str = "tinyfs.img";

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub struct TinyFsCli {
    /// the path of the file system image file
    #[arg(short = 'p', long, global = true, default_value = DEFAULT_IMAGE_PATH)]
    pub image_file_path: String,
    /// the block size of the file system
    #[arg(short, long, global = true, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u32,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// create a new file system image
    Init(InitArgs),
    /// start an interactive shell over a volume kept in RAM
    Shell,
    #[command(flatten)]
    Fs(FsCommand),
}

/// make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
pub struct InitArgs {
    /// the number of blocks of the volume
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOTAL_BLOCKS)]
    pub blocks: u32,
    /// the inode count of the file system
    #[arg(short, long, default_value_t = DEFAULT_INODE_COUNT)]
    pub inode_count: u32,
}

/// operations on an existing volume, shared by the one-shot commands and the shell
#[derive(Subcommand, Debug, PartialEq, Clone)]
pub enum FsCommand {
    /// create an empty file
    Touch { path: String },
    /// create an empty directory
    Mkdir { path: String },
    /// list a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// remove a file
    Rm { path: String },
    /// remove an empty directory
    Rmdir { path: String },
    /// print a file
    Cat { path: String },
    /// write text at the start of a file, creating it when missing
    Write {
        path: String,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// add text to the end of a file, creating it when missing
    Append {
        path: String,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// check whether a path exists
    Search { path: String },
    /// check whether a directory has an entry whose name contains a pattern
    Find { dir: String, pattern: String },
    /// show the metadata of a file or directory
    Stat { path: String },
    /// show space usage
    Df,
}

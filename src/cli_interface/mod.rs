//! the command line front end, it only calls the public volume operations
mod cli_struct;
mod commands;
pub use cli_struct::*;
pub use commands::*;

use clap::Parser;
use tinyfs::cli_interface::{execute, TinyFsCli};
/// a CLI interface to users to create a volume in an image file,
/// run one operation on it, or play with a RAM volume in a shell.
///
/// `RUST_LOG` controls how much is logged to stderr.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = TinyFsCli::parse();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    execute(args, stdin.lock(), &mut stdout)
}

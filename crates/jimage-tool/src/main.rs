//! jimage-tool binary entry point.

use anyhow::Result;
use clap::Parser;
use jimage_tool::{Cli, init_logging, run};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

//! idshift command-line entry point

use anyhow::Result;
use clap::Parser;
use idshift::cli::Args;
use idshift::fs::LocalFs;
use idshift::traversal::shift_tree;
use std::io::IsTerminal;
use tracing::info;

#[compio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    args.validate()?;
    let config = args.shift_config()?;
    let root = args.directory();

    println!("Starting UID/GID shift in {}", root.display());
    println!("Offset: {}", config.offset);
    println!("---");

    let report = shift_tree(&LocalFs, root, &config).await;
    info!("{} entries visited", report.entries_visited());

    println!("---");
    println!("{report}");
    println!("Shift complete.");

    Ok(())
}

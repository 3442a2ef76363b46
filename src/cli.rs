//! Command-line interface definitions
//!
//! Arguments are grouped by the component that consumes them, the same way
//! the rest of the crate is split.

use crate::shift::{ShiftConfig, ShiftOffset};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

const AFTER_HELP: &str = "\
Example:
  idshift /var/lib/lxd/containers/c1/rootfs -1000000

Every uid and gid in the tree is moved by OFFSET, including the ids stored
in POSIX ACLs. Ids below OFFSET (shifting up) or at or above |OFFSET|
(shifting down) are moved; all others are left alone. Setuid/setgid bits,
file capabilities and other extended attributes survive the ownership change.";

/// Shift uid/gid ownership of a directory tree by a fixed offset
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(allow_negative_numbers = true, after_help = AFTER_HELP)]
pub struct Args {
    /// Target tree and offset
    #[command(flatten)]
    pub paths: PathConfig,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,
}

/// Target configuration
///
/// Used by: `main()`, `shift_tree()`
#[derive(clap::Args, Debug, Clone)]
pub struct PathConfig {
    /// Root of the tree to shift
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Signed amount added to every uid and gid, e.g. 100000 or -100000
    #[arg(value_name = "OFFSET")]
    pub offset: i64,
}

/// Output and logging configuration
///
/// Used by: `main()`, logging initialization, `shift_entry()`
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress everything except warnings and errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Log one line per shifted entry
    ///
    /// Also enabled by the `DEBUG` environment variable. Falsey values
    /// (`0`, `false`, `no`, `off`, empty) leave it disabled.
    #[arg(
        long,
        env = "DEBUG",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub trace: bool,
}

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The offset is zero
    /// - The directory does not exist
    /// - The directory is not a directory
    /// - Both --quiet and --verbose options are used
    pub fn validate(&self) -> Result<()> {
        if self.paths.offset == 0 {
            anyhow::bail!("offset cannot be zero");
        }

        // Follows a symlinked root on purpose, like `cd` would
        if !self.paths.directory.exists() {
            anyhow::bail!("Directory not found: {}", self.paths.directory.display());
        }

        if !self.paths.directory.is_dir() {
            anyhow::bail!("Not a directory: {}", self.paths.directory.display());
        }

        if self.output.quiet && self.output.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        Ok(())
    }

    /// The offset as a validated non-zero value
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is zero
    pub fn offset(&self) -> Result<ShiftOffset> {
        ShiftOffset::new(self.paths.offset).ok_or_else(|| anyhow::anyhow!("offset cannot be zero"))
    }

    /// Build the configuration consumed by the traversal
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is zero
    pub fn shift_config(&self) -> Result<ShiftConfig> {
        let mut config = ShiftConfig::new(self.offset()?);
        config.trace = self.output.trace;
        Ok(config)
    }

    /// Maximum level for the log subscriber
    #[must_use]
    pub const fn log_level(&self) -> Level {
        if self.output.quiet {
            return Level::WARN;
        }
        match self.output.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Root of the tree to shift
    #[must_use]
    pub const fn directory(&self) -> &PathBuf {
        &self.paths.directory
    }
}

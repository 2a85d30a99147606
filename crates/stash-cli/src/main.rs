//! stash-cli - Command-line interface for the stash archiving tool
//!
//! One mutually-exclusive action flag selects the behavior; with no flag the
//! default is to archive the given files. Everything of substance lives in
//! stash-core; this crate only parses arguments, sets up logging, and maps
//! errors to exit codes.

use anyhow::Result;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

use stash_core::{Config, Stash};

/// stash - move files out of the way into a per-directory archive
#[derive(Parser)]
#[command(name = "stash")]
#[command(author, version, about = "Stash files into a per-directory archive", long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .args(["archive", "global_archive", "restore", "compress", "extract"])
        .multiple(false)
))]
struct Cli {
    /// Move files into the local archive (the default action)
    #[arg(short = 'a', long)]
    archive: bool,

    /// Move files into the global archive mirror and drain the local archive
    #[arg(short = 'A', long)]
    global_archive: bool,

    /// Move files out of the local archive back into the working directory
    #[arg(short = 'r', long)]
    restore: bool,

    /// Compress the archive directory into its single-file form
    #[arg(short = 'c', long)]
    compress: bool,

    /// Expand the compressed archive back into a directory
    #[arg(short = 'x', long)]
    extract: bool,

    /// Enable verbose output (debug logging and tar's per-entry listing)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Files and directories to operate on
    files: Vec<PathBuf>,
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Error: {}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let work_dir = std::env::current_dir()?;
    let config = Config::load_or_default();
    let stash = Stash::new(work_dir, config);

    if cli.global_archive {
        stash.global_archive(&cli.files)?;
    } else if cli.restore {
        stash.restore(&cli.files)?;
    } else if cli.compress {
        stash.compress(cli.verbose)?;
    } else if cli.extract {
        stash.extract(cli.verbose)?;
    } else {
        stash.archive(&cli.files)?;
    }

    Ok(())
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: Something was not where it should be
/// - 3: The invocation asked for the impossible
/// - 4: The tar subprocess failed
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(stash_err) = err.downcast_ref::<stash_core::Error>() {
        match stash_err {
            stash_core::Error::Io(_) => 2,
            stash_core::Error::NoArchive => 2,
            stash_core::Error::InputNotFound(_) => 2,
            stash_core::Error::NoExpandedArchive => 2,
            stash_core::Error::NoCompressedArchive => 2,
            stash_core::Error::Inconsistent => 3,
            stash_core::Error::MissingFiles => 3,
            stash_core::Error::MissingSource => 3,
            stash_core::Error::Compression { .. } => 4,
            stash_core::Error::Config(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}

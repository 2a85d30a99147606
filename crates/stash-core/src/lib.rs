//! Stash - a per-directory archive stasher
//!
//! This library moves files into a local `archive` directory to get them out
//! of the way, converts that directory to and from a single compressed
//! `.archive.tar.gz` file, and can migrate archived files into a global
//! mirror tree keyed by the working directory's absolute path.
//!
//! One invocation works on one working directory at a time. There is no
//! locking: running two stash processes against the same directory
//! concurrently is unsupported and can corrupt the archive layout.

pub mod config;
pub mod error;
pub mod state;
pub mod stash;
pub mod tarball;

pub use config::Config;
pub use error::{Error, Result};
pub use state::ArchiveState;
pub use stash::Stash;

//! The stash handle and its operations
//!
//! A [`Stash`] is rooted at one working directory and knows the two on-disk
//! forms a local archive can take: the expanded directory and the compressed
//! single file. At most one of the two may exist at any operation boundary;
//! every operation probes the state first and refuses to run against the
//! inconsistent both-forms layout.

use crate::config::Config;
use crate::state::ArchiveState;
use crate::tarball;
use crate::{Error, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Handle for the local archive of one working directory
#[derive(Debug, Clone)]
pub struct Stash {
    work_dir: PathBuf,
    config: Config,
}

impl Stash {
    /// Create a stash rooted at `work_dir`
    ///
    /// `work_dir` should be absolute; the global mirror path is derived from
    /// it. The CLI passes the current directory, tests pass a tempdir.
    pub fn new<P: Into<PathBuf>>(work_dir: P, config: Config) -> Self {
        Self {
            work_dir: work_dir.into(),
            config,
        }
    }

    /// The working directory this stash operates in
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Path of the expanded archive directory
    pub fn archive_dir(&self) -> PathBuf {
        self.work_dir.join(&self.config.archive_dir)
    }

    /// Path of the compressed archive file
    pub fn compressed_path(&self) -> PathBuf {
        self.work_dir.join(&self.config.compressed_file)
    }

    /// Probe which form the archive currently takes
    ///
    /// Seeing both forms at once means a previous run was interrupted in a
    /// way this tool cannot safely repair; that case is an error, not a
    /// state.
    pub fn state(&self) -> Result<ArchiveState> {
        let dir = self.archive_dir().is_dir();
        let file = self.compressed_path().is_file();

        match (dir, file) {
            (true, true) => Err(Error::Inconsistent),
            (true, false) => Ok(ArchiveState::Expanded),
            (false, true) => Ok(ArchiveState::Compressed),
            (false, false) => Ok(ArchiveState::Absent),
        }
    }

    /// Whether an archive exists in any form
    pub fn exists(&self) -> Result<bool> {
        Ok(self.state()?.exists())
    }

    /// Run `body` against a guaranteed-expanded archive
    ///
    /// A compressed archive is expanded on entry and re-compressed on exit,
    /// whether or not `body` succeeded, so the caller observes the same form
    /// it started with. When both the body and the re-compression fail, the
    /// body's error is the one that propagates.
    pub fn with_expanded<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let reseal = match self.state()? {
            ArchiveState::Absent => return Err(Error::NoArchive),
            ArchiveState::Expanded => false,
            ArchiveState::Compressed => {
                tarball::extract(&self.work_dir, &self.config.compressed_file, false)?;
                true
            }
        };

        let outcome = body();

        if reseal {
            if let Err(e) = tarball::create(
                &self.work_dir,
                &self.config.archive_dir,
                &self.config.compressed_file,
                false,
            ) {
                return match outcome {
                    Ok(_) => Err(e),
                    Err(body_err) => {
                        warn!("Failed to re-compress archive after error: {}", e);
                        Err(body_err)
                    }
                };
            }
        }

        outcome
    }

    /// Move the given files and directories into the local archive
    ///
    /// Creates the archive on first use. Inputs are processed first to last;
    /// the first missing one aborts the batch, leaving earlier moves in
    /// place.
    pub fn archive(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Err(Error::MissingFiles);
        }

        if self.state()? == ArchiveState::Absent {
            debug!("Creating archive directory {:?}", self.archive_dir());
            fs::create_dir(self.archive_dir())?;
        }

        self.with_expanded(|| {
            let archive_dir = self.archive_dir();
            for path in paths {
                let src = self.work_dir.join(path);
                if !src.exists() {
                    return Err(Error::InputNotFound(path.clone()));
                }
                move_into(&src, &archive_dir)?;
                info!("Archived {}", path.display());
            }
            Ok(())
        })
    }

    /// Move the named entries out of the local archive back into the
    /// working directory
    ///
    /// A leading `archive/` on a name is stripped, so copy-pasted paths that
    /// include the archive directory itself still resolve. An empty list is
    /// a no-op (the archive still round-trips through its expanded form).
    pub fn restore(&self, names: &[PathBuf]) -> Result<()> {
        self.with_expanded(|| {
            let archive_dir = self.archive_dir();
            for name in names {
                let name = name
                    .strip_prefix(&self.config.archive_dir)
                    .unwrap_or(name);
                let src = archive_dir.join(name);
                if !src.exists() {
                    return Err(Error::InputNotFound(name.to_path_buf()));
                }
                move_into(&src, &self.work_dir)?;
                info!("Restored {}", name.display());
            }
            Ok(())
        })
    }

    /// Move files into the global mirror and drain the local archive into it
    ///
    /// The mirror directory for this working directory is created lazily.
    /// Afterwards no local archive exists in either form; unlike the other
    /// movers this is a one-way migration, not a round-trip.
    pub fn global_archive(&self, paths: &[PathBuf]) -> Result<()> {
        let state = self.state()?;
        if !state.exists() && paths.is_empty() {
            return Err(Error::MissingSource);
        }

        let mirror = self.mirror_dir();
        fs::create_dir_all(&mirror)?;
        debug!("Global mirror for {:?} is {:?}", self.work_dir, mirror);

        for path in paths {
            let src = self.work_dir.join(path);
            if !src.exists() {
                return Err(Error::InputNotFound(path.clone()));
            }
            move_into(&src, &mirror)?;
            info!("Archived {} globally", path.display());
        }

        if state == ArchiveState::Compressed {
            tarball::extract(&self.work_dir, &self.config.compressed_file, false)?;
        }

        let archive_dir = self.archive_dir();
        if archive_dir.is_dir() {
            for entry in fs::read_dir(&archive_dir)? {
                let entry = entry?;
                move_into(&entry.path(), &mirror)?;
                info!("Archived {} globally", entry.file_name().to_string_lossy());
            }
            fs::remove_dir(&archive_dir)?;
        }

        Ok(())
    }

    /// Convert the expanded archive into its compressed single-file form
    pub fn compress(&self, verbose: bool) -> Result<()> {
        match self.state()? {
            ArchiveState::Expanded => tarball::create(
                &self.work_dir,
                &self.config.archive_dir,
                &self.config.compressed_file,
                verbose,
            ),
            _ => Err(Error::NoExpandedArchive),
        }
    }

    /// Convert the compressed archive back into its expanded directory form
    pub fn extract(&self, verbose: bool) -> Result<()> {
        match self.state()? {
            ArchiveState::Compressed => {
                tarball::extract(&self.work_dir, &self.config.compressed_file, verbose)
            }
            _ => Err(Error::NoCompressedArchive),
        }
    }

    /// The global mirror directory for this working directory
    ///
    /// The working directory's absolute path is replayed below the global
    /// root, so `/proj/x` mirrors to `<global_root>/proj/x`.
    fn mirror_dir(&self) -> PathBuf {
        let mut mirror = self.config.global_root.clone();
        for component in self.work_dir.components() {
            if let Component::Normal(part) = component {
                mirror.push(part);
            }
        }
        mirror
    }
}

/// Move `src` into the directory `dest_dir`, keeping its file name
///
/// Plain rename first; when that fails (typically because source and
/// destination sit on different filesystems) fall back to a copy-and-delete
/// move.
fn move_into(src: &Path, dest_dir: &Path) -> Result<()> {
    let name = src
        .file_name()
        .ok_or_else(|| Error::InputNotFound(src.to_path_buf()))?;
    let dest = dest_dir.join(name);

    match fs::rename(src, &dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "Rename {:?} -> {:?} failed ({}), copying instead",
                src, dest, rename_err
            );
            if src.is_dir() {
                let mut options = fs_extra::dir::CopyOptions::new();
                options.copy_inside = true;
                fs_extra::dir::move_dir(src, &dest, &options)?;
            } else {
                let options = fs_extra::file::CopyOptions::new();
                fs_extra::file::move_file(src, &dest, &options)?;
            }
            Ok(())
        }
    }
}

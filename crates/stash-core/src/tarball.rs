//! Tar+gzip primitives
//!
//! The conversion between the two archive forms is delegated to the system
//! `tar` tool. `--remove-files` makes creation consume the source directory,
//! so a single subprocess takes the archive from one form to the other.

use crate::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tracing::{debug, info, warn};

/// Exit status of tar's warning class ("file changed as we read it" and
/// friends). Harmless when creating an archive; anything else non-zero is
/// a real failure.
const TAR_WARNING_STATUS: i32 = 1;

/// Create `compressed_file` from `archive_dir`, removing the directory
///
/// Both paths are interpreted relative to `work_dir`, which is where the
/// subprocess runs. Tar's warning status is swallowed; the archive is still
/// written in that case.
pub fn create<P: AsRef<Path>>(
    work_dir: P,
    archive_dir: &Path,
    compressed_file: &Path,
    verbose: bool,
) -> Result<()> {
    let work_dir = work_dir.as_ref();
    debug!("Compressing {:?} into {:?}", archive_dir, compressed_file);

    let mut args: Vec<&std::ffi::OsStr> = vec!["-c".as_ref(), "-z".as_ref()];
    if verbose {
        args.push("-v".as_ref());
    }
    args.push("-f".as_ref());
    args.push(compressed_file.as_os_str());
    args.push("--remove-files".as_ref());
    args.push(archive_dir.as_os_str());

    let output = run_tar(work_dir, &args)?;

    if !output.status.success() {
        let status = output.status.code().unwrap_or(-1);
        if status == TAR_WARNING_STATUS {
            // Archive was written anyway; tar is just complaining.
            warn!("tar reported a warning while compressing; archive is intact");
        } else {
            return Err(tar_failure(status, &output));
        }
    }

    surface_listing(&output, verbose);
    info!("Compressed archive: {:?}", compressed_file);
    Ok(())
}

/// Expand `compressed_file` into the working directory, then delete it
///
/// The compressed file is only removed after tar succeeds; removing it first
/// would lose the archive on a failed extraction.
pub fn extract<P: AsRef<Path>>(work_dir: P, compressed_file: &Path, verbose: bool) -> Result<()> {
    let work_dir = work_dir.as_ref();
    debug!("Extracting {:?}", compressed_file);

    let mut args: Vec<&std::ffi::OsStr> = vec!["-x".as_ref(), "-z".as_ref()];
    if verbose {
        args.push("-v".as_ref());
    }
    args.push("-f".as_ref());
    args.push(compressed_file.as_os_str());

    let output = run_tar(work_dir, &args)?;

    if !output.status.success() {
        return Err(tar_failure(output.status.code().unwrap_or(-1), &output));
    }

    fs::remove_file(work_dir.join(compressed_file))?;

    surface_listing(&output, verbose);
    info!("Extracted archive: {:?}", compressed_file);
    Ok(())
}

fn run_tar(work_dir: &Path, args: &[&std::ffi::OsStr]) -> Result<Output> {
    let output = Command::new("tar")
        .args(args)
        .current_dir(work_dir)
        .output()?;
    Ok(output)
}

fn tar_failure(status: i32, output: &Output) -> Error {
    Error::Compression {
        status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Relay tar's per-entry listing when the caller asked for it
fn surface_listing(output: &Output, verbose: bool) {
    if !verbose {
        return;
    }
    for line in String::from_utf8_lossy(&output.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&output.stderr).lines())
    {
        if !line.is_empty() {
            info!("tar: {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_then_extract_round_trip() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let archive_dir = Path::new("archive");
        let compressed = Path::new(".archive.tar.gz");

        fs::create_dir(temp_dir.path().join(archive_dir))?;
        fs::write(temp_dir.path().join("archive/note.txt"), b"stashed")?;

        create(temp_dir.path(), archive_dir, compressed, false)?;
        assert!(temp_dir.path().join(compressed).is_file());
        assert!(!temp_dir.path().join(archive_dir).exists());

        extract(temp_dir.path(), compressed, false)?;
        assert!(!temp_dir.path().join(compressed).exists());
        assert_eq!(
            fs::read(temp_dir.path().join("archive/note.txt"))?,
            b"stashed"
        );

        Ok(())
    }

    #[test]
    fn test_extract_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = extract(temp_dir.path(), Path::new(".archive.tar.gz"), false);
        assert!(matches!(result, Err(Error::Compression { .. })));
        // Nothing to delete, nothing deleted
        assert!(!temp_dir.path().join(".archive.tar.gz").exists());
    }
}

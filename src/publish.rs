//! Versioned publish directories and the `current` link.
//!
//! Each `publish` run renders into its own directory named after the local
//! time it started, down to the nanosecond:
//!
//! ```text
//! published/
//! ├── 2026-10-18--09-30--12.123456789/
//! ├── 2026-10-18--09-30--12.987654321/
//! └── current -> 2026-10-18--09-30--12.987654321
//! ```
//!
//! The directory is claimed with a plain `create_dir`, which fails if the
//! name is taken, so two runs can never share a version even if the clock
//! repeats. `current` is a relative symlink and only moves after a run
//! finishes; it is replaced by renaming a freshly made link over it, so a
//! reader never sees it missing.

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the link to the latest successful publish.
pub const CURRENT_LINK: &str = "current";

/// strftime pattern for version directory names.
pub const VERSION_FORMAT: &str = "%Y-%m-%d--%H-%M--%S.%9f";

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a version directory: {}", .0.display())]
    InvalidVersion(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PublishError + '_ {
    move |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Version directory name for a point in time.
pub fn version_name(at: DateTime<Local>) -> String {
    at.format(VERSION_FORMAT).to_string()
}

/// Create and return a new, unused version directory under `published_root`.
pub fn create_version_dir(published_root: &Path) -> Result<PathBuf, PublishError> {
    fs::create_dir_all(published_root).map_err(io_err(published_root))?;
    loop {
        let dir = published_root.join(version_name(Local::now()));
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(io_err(&dir)(e)),
        }
    }
}

/// Point `<published_root>/current` at `version_dir`.
///
/// The link target is the version's directory name, relative to the link,
/// so the published tree can be moved as a whole. Returns the link path.
pub fn swap_current(published_root: &Path, version_dir: &Path) -> Result<PathBuf, PublishError> {
    let target = version_dir
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| PublishError::InvalidVersion(version_dir.to_path_buf()))?;
    let link = published_root.join(CURRENT_LINK);
    let staging = published_root.join(format!(".{CURRENT_LINK}.{}", std::process::id()));

    if fs::symlink_metadata(&staging).is_ok() {
        fs::remove_file(&staging).map_err(io_err(&staging))?;
    }
    make_dir_link(&target, &staging).map_err(io_err(&staging))?;
    replace_link(&staging, &link).map_err(io_err(&link))?;
    Ok(link)
}

/// Where `current` points, if it exists.
pub fn current_target(published_root: &Path) -> Option<PathBuf> {
    fs::read_link(published_root.join(CURRENT_LINK)).ok()
}

#[cfg(unix)]
fn make_dir_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_dir_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn replace_link(staging: &Path, link: &Path) -> io::Result<()> {
    fs::rename(staging, link)
}

#[cfg(windows)]
fn replace_link(staging: &Path, link: &Path) -> io::Result<()> {
    // Windows cannot rename over an existing directory link
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_dir(link)?;
    }
    fs::rename(staging, link)
}

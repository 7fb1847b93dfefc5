//! Path assembly for the file-backed open routines.
//!
//! File accessors name their target with a `(base_path, path)` pair so that
//! callers unpacking a container can resolve member names against an output
//! directory without string surgery:
//!
//! - an absolute `path` ignores `base_path`,
//! - a relative `path` is resolved against `base_path`, or against the
//!   directory containing `base_path` when `base_path` names an existing
//!   non-directory object,
//! - `"~"` and `"~user"` constructs are not honoured.
//!
//! [`PathOptions`] adds backslash conversion (for foreign path syntax found
//! inside archives), forced relativity, and on-demand creation of the
//! enclosing directory.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use bitflags::bitflags;

use crate::{Error, Result};

bitflags! {
    /// Options honoured while assembling a target path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PathOptions: u32 {
        /// Create the directory containing the referred object if needed.
        const CREATE_DIRECTORY = 0x01;
        /// Create the directory containing the referred object and all
        /// intermediate directories if needed. Implies `CREATE_DIRECTORY`.
        const CREATE_PATH = 0x02;
        /// Convert backslashes to slashes before any other processing.
        /// Useful for some ugly foreign path syntax.
        const CONVERT_BACKSLASH = 0x04;
        /// Strip leading separators from `path`, turning an absolute path
        /// into a relative one.
        const PATH_IS_RELATIVE = 0x08;
    }
}

/// Assembles the target path from `base_path` and `path`.
///
/// `base_path` may be empty; `path` must not be. No canonicalisation is
/// performed and the components are not required to exist, except that a
/// `base_path` naming an existing non-directory object resolves to that
/// object's parent directory. The referred object itself is never created,
/// but [`PathOptions::CREATE_DIRECTORY`] and [`PathOptions::CREATE_PATH`]
/// create its enclosing directory.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for an empty `path` and
/// [`Error::Host`] when directory creation fails.
pub fn build_path(base_path: &str, path: &str, options: PathOptions) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(Error::InvalidParameter("path must not be empty"));
    }

    let mut path = path.to_owned();
    let mut base_path = base_path.to_owned();
    if options.contains(PathOptions::CONVERT_BACKSLASH) {
        path = path.replace('\\', "/");
        base_path = base_path.replace('\\', "/");
    }

    if options.contains(PathOptions::PATH_IS_RELATIVE) {
        path = path.trim_start_matches('/').to_owned();
    }

    let result = if base_path.is_empty() || Path::new(&path).is_absolute() {
        PathBuf::from(path)
    } else {
        let mut base = PathBuf::from(&base_path);
        if !base_path.ends_with('/') {
            // an existing non-directory base resolves to its parent
            if let Ok(metadata) = fs::metadata(&base) {
                if !metadata.is_dir() {
                    base.pop();
                }
            }
        }
        base.join(path)
    };

    if options.intersects(PathOptions::CREATE_DIRECTORY | PathOptions::CREATE_PATH) {
        if let Some(parent) = result.parent() {
            if !parent.as_os_str().is_empty() {
                create_directory_at(parent, options.contains(PathOptions::CREATE_PATH))?;
            }
        }
    }

    Ok(result)
}

/// Creates the directory referred to by `base_path` and `path`.
///
/// [`PathOptions::CREATE_DIRECTORY`] is implied; pass
/// [`PathOptions::CREATE_PATH`] to create intermediate directories as well.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for an empty `path` and
/// [`Error::Host`] when creation fails, e.g. because an intermediate
/// directory is missing and `CREATE_PATH` was not requested.
pub fn create_directory(base_path: &str, path: &str, options: PathOptions) -> Result<()> {
    let target = build_path(
        base_path,
        path,
        options - (PathOptions::CREATE_DIRECTORY | PathOptions::CREATE_PATH),
    )?;

    create_directory_at(&target, options.contains(PathOptions::CREATE_PATH))
}

fn create_directory_at(path: &Path, create_intermediates: bool) -> Result<()> {
    let outcome = if create_intermediates {
        fs::create_dir_all(path)
    } else {
        fs::create_dir(path)
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::Host(e)),
    }
}

//! File manager module for the exposed home directory.
//!
//! This module provides the filesystem side of the daemon:
//! - Resolution of client-supplied relative paths against the home directory
//! - Single-level listing and recursive name search
//! - Folder creation and file/folder deletion
//! - Whole-file downloads and atomic uploads
//! - The runtime-replaceable home directory itself
//!
//! # Containment
//!
//! By default resolved paths are NOT confined to the home directory: a
//! relative path with `..` segments reaches anything the process can access.
//! Set [`ContainmentPolicy::Confined`] to reject such paths.
//!
//! # Errors
//!
//! Every operation returns a [`FileResult`] and logs its own failure with the
//! operation name and the caller's path argument. Nothing panics or escapes
//! as an unhandled fault; callers pick the response for each [`FileError`].

pub mod browser;
pub mod home;
pub mod resolver;
pub mod transfer;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, warn};

pub use browser::DirectoryBrowser;
pub use home::HomeDirectory;
pub use resolver::{ContainmentPolicy, PathResolver};
pub use transfer::{DownloadedFile, FileTransfer};

/// Errors produced by filesystem operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The target does not exist.
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    /// The target exists but is not a directory.
    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The target exists but is not a regular file.
    #[error("path is not a file: {0}")]
    NotAFile(PathBuf),

    /// The resolved path escapes the home directory.
    #[error("path is outside the home directory: {0}")]
    OutsideRoot(PathBuf),

    /// Caller input rejected before touching the filesystem.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upload exceeds the configured limit.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FileError {
    /// Map an IO error for `path`, keeping "not found" distinguishable.
    pub(crate) fn from_io(err: io::Error, path: &Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            FileError::NotFound(path.to_path_buf())
        } else {
            FileError::Io(err)
        }
    }

    /// Whether the error means the target is absent (or not the expected kind).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FileError::NotFound(_) | FileError::NotADirectory(_) | FileError::NotAFile(_)
        )
    }
}

/// Result type for filesystem operations.
pub type FileResult<T> = Result<T, FileError>;

/// Log a failed operation. Only the log distinguishes "absent" from "faulted".
pub(crate) fn log_failure(operation: &'static str, path: &str, err: &FileError) {
    match err {
        FileError::Io(e) => {
            error!(operation, path, error = %e, "Filesystem operation failed");
        }
        FileError::OutsideRoot(resolved) => {
            warn!(operation, path, resolved = ?resolved, "Rejected path outside home directory");
        }
        FileError::FileTooLarge { .. } | FileError::InvalidInput(_) => {
            warn!(operation, path, error = %err, "Rejected request");
        }
        _ => {
            debug!(operation, path, error = %err, "Target not found");
        }
    }
}

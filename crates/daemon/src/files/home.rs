//! The runtime-replaceable home directory.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::{log_failure, FileError, FileResult};

/// Shared handle to the current home directory.
///
/// Readers get an `Arc` snapshot and never observe a partially written
/// value; [`HomeDirectory::set`] swaps the whole `Arc`. Changes live only in
/// memory and are lost on restart.
#[derive(Debug)]
pub struct HomeDirectory {
    current: RwLock<Arc<PathBuf>>,
}

impl HomeDirectory {
    /// Create a handle starting at `initial`. The path is not checked.
    pub fn new(initial: impl Into<PathBuf>) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial.into())),
        }
    }

    /// The current home directory.
    pub fn current(&self) -> Arc<PathBuf> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the home directory if `path` names an existing directory.
    ///
    /// Blank input is rejected before any filesystem access. Absoluteness and
    /// readability are not checked. On failure the current value is kept.
    pub fn set(&self, path: &str) -> FileResult<Arc<PathBuf>> {
        self.try_set(path)
            .inspect_err(|e| log_failure("set_home_directory", path, e))
    }

    fn try_set(&self, path: &str) -> FileResult<Arc<PathBuf>> {
        if path.trim().is_empty() {
            return Err(FileError::InvalidInput(
                "home directory path is blank".to_string(),
            ));
        }

        let candidate = PathBuf::from(path);
        let metadata = fs::metadata(&candidate).map_err(|e| FileError::from_io(e, &candidate))?;
        if !metadata.is_dir() {
            return Err(FileError::NotADirectory(candidate));
        }

        let next = Arc::new(candidate);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next.clone())
        };

        info!(previous = ?previous, current = ?next, "Home directory updated");
        Ok(next)
    }
}

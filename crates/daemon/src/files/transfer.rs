//! Whole-file downloads and atomic uploads.
//!
//! Downloads buffer the entire file in memory. Uploads are written to a
//! temporary file in the destination directory and renamed into place, so a
//! reader never sees a half-written file and an existing file of the same
//! name is replaced in one step.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::info;

use super::resolver::normalize_separators;
use super::{log_failure, FileError, FileResult, PathResolver};

/// Default upload limit (100MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// File name used when a download path has no final component.
const FALLBACK_DOWNLOAD_NAME: &str = "download";

/// A downloaded file together with the name it should be saved as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Base name of the requested path.
    pub file_name: String,
    /// Entire file content.
    pub content: Vec<u8>,
}

/// File transfer handler.
pub struct FileTransfer {
    /// Resolver shared with the directory browser.
    resolver: Arc<PathResolver>,
    /// Maximum upload size in bytes.
    max_upload_size: u64,
}

impl FileTransfer {
    /// Create a new file transfer handler.
    pub fn new(resolver: Arc<PathResolver>, max_upload_size: u64) -> Self {
        Self {
            resolver,
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Read the file at `relative` into memory.
    pub fn download(&self, relative: &str) -> FileResult<DownloadedFile> {
        self.read_file(relative)
            .inspect_err(|e| log_failure("download", relative, e))
    }

    fn read_file(&self, relative: &str) -> FileResult<DownloadedFile> {
        let path = self.resolver.resolve(relative)?;

        let metadata = fs::metadata(&path).map_err(|e| FileError::from_io(e, &path))?;
        if !metadata.is_file() {
            return Err(FileError::NotAFile(path));
        }

        let content = fs::read(&path).map_err(|e| FileError::from_io(e, &path))?;

        Ok(DownloadedFile {
            file_name: download_name(relative),
            content,
        })
    }

    /// Write `content` as `declared_name` inside the directory `relative`.
    ///
    /// The directory (and its ancestors) is created if missing. Directory
    /// components in `declared_name` are discarded. An existing file with the
    /// same name is replaced without warning. Returns the written path.
    pub fn upload(
        &self,
        relative: &str,
        content: &[u8],
        declared_name: &str,
    ) -> FileResult<PathBuf> {
        self.write_file(relative, content, declared_name)
            .inspect_err(|e| log_failure("upload", relative, e))
    }

    fn write_file(&self, relative: &str, content: &[u8], declared_name: &str) -> FileResult<PathBuf> {
        let size = content.len() as u64;
        if size > self.max_upload_size {
            return Err(FileError::FileTooLarge {
                size,
                limit: self.max_upload_size,
            });
        }

        let file_name = safe_file_name(declared_name).ok_or_else(|| {
            FileError::InvalidInput(format!("unusable file name: {declared_name:?}"))
        })?;

        let directory = self.resolver.resolve(relative)?;
        if !directory.is_dir() {
            fs::create_dir_all(&directory).map_err(|e| FileError::from_io(e, &directory))?;
        }

        let destination = directory.join(file_name);

        let mut temp = NamedTempFile::new_in(&directory)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;

        // Temp files are created 0600; give the upload normal file permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644))?;
        }

        temp.persist(&destination).map_err(|e| FileError::Io(e.error))?;

        info!(path = ?destination, size, "File uploaded");
        Ok(destination)
    }
}

/// Strip directory components from a client-declared file name.
///
/// Both separator styles are stripped regardless of host. Returns `None`
/// when nothing usable remains.
pub fn safe_file_name(declared: &str) -> Option<&str> {
    let name = declared.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

fn download_name(relative: &str) -> String {
    Path::new(normalize_separators(relative).as_ref())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| FALLBACK_DOWNLOAD_NAME.to_string())
}

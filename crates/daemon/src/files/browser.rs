//! Directory browsing, search, folder creation and deletion.
//!
//! All paths are resolved through the shared [`PathResolver`], so listings
//! and mutations always follow the current home directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use protocol::DirectoryItem;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{log_failure, FileError, FileResult, PathResolver};

/// Directory operations on the home directory.
pub struct DirectoryBrowser {
    resolver: Arc<PathResolver>,
}

impl DirectoryBrowser {
    /// Create a browser using the given resolver.
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<PathResolver> {
        &self.resolver
    }

    /// List the immediate children of `relative`.
    ///
    /// Item paths are `relative` joined with the child name, so they can be
    /// passed straight back into other operations. Folders come first, then
    /// files, each sorted case-insensitively by name.
    pub fn browse(&self, relative: &str) -> FileResult<Vec<DirectoryItem>> {
        self.list_directory(relative)
            .inspect_err(|e| log_failure("browse", relative, e))
    }

    fn list_directory(&self, relative: &str) -> FileResult<Vec<DirectoryItem>> {
        let directory = self.resolver.resolve(relative)?;

        let metadata = fs::metadata(&directory).map_err(|e| FileError::from_io(e, &directory))?;
        if !metadata.is_dir() {
            return Err(FileError::NotADirectory(directory));
        }

        let entries = fs::read_dir(&directory).map_err(|e| FileError::from_io(e, &directory))?;

        let mut items = Vec::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue, // Skip entries we can't read
            };

            // Follow symlinks so a link to a folder lists as a folder
            let metadata = match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(e) => {
                    debug!(path = ?entry.path(), error = %e, "Skipping entry we can't stat");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            let item_path = Path::new(relative)
                .join(&name)
                .to_string_lossy()
                .to_string();

            items.push(if metadata.is_dir() {
                DirectoryItem::folder(name, item_path)
            } else {
                DirectoryItem::file(name, item_path, metadata.len())
            });
        }

        items.sort_by(|a, b| match (a.is_folder(), b.is_folder()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        });

        Ok(items)
    }

    /// Recursively search the whole home directory for names containing
    /// `query`, case-insensitively.
    ///
    /// Matching folders are returned before matching files; within each group
    /// the order is whatever the filesystem enumerates. A blank query or a
    /// missing home directory yields no results. Unreadable subtrees are
    /// skipped.
    pub fn search(&self, query: &str) -> FileResult<Vec<DirectoryItem>> {
        let root = self.resolver.home().current();

        if query.trim().is_empty() || root.as_os_str().is_empty() || !root.is_dir() {
            return Ok(Vec::new());
        }

        let needle = query.to_lowercase();
        let mut folders = Vec::new();
        let mut files = Vec::new();

        for entry in WalkDir::new(root.as_path()).min_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry during search");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            if !name.to_lowercase().contains(&needle) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root.as_path())
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();

            if entry.path().is_dir() {
                folders.push(DirectoryItem::folder(name.to_string(), relative));
            } else {
                let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
                files.push(DirectoryItem::file(name.to_string(), relative, len));
            }
        }

        debug!(
            query,
            folders = folders.len(),
            files = files.len(),
            "Search completed"
        );

        folders.extend(files);
        Ok(folders)
    }

    /// Create `relative` and any missing ancestors. Succeeds if the directory
    /// exists afterwards, including when it already existed.
    pub fn create_folder(&self, relative: &str) -> FileResult<()> {
        self.try_create_folder(relative)
            .inspect_err(|e| log_failure("create_folder", relative, e))
    }

    fn try_create_folder(&self, relative: &str) -> FileResult<()> {
        let directory = self.resolver.resolve(relative)?;

        if directory.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&directory).map_err(|e| FileError::from_io(e, &directory))?;
        info!(path = ?directory, "Folder created");
        Ok(())
    }

    /// Delete exactly one file. Not recoverable.
    pub fn delete_file(&self, relative: &str) -> FileResult<()> {
        self.try_delete_file(relative)
            .inspect_err(|e| log_failure("delete_file", relative, e))
    }

    fn try_delete_file(&self, relative: &str) -> FileResult<()> {
        let path = self.resolver.resolve(relative)?;

        let metadata = fs::metadata(&path).map_err(|e| FileError::from_io(e, &path))?;
        if !metadata.is_file() {
            return Err(FileError::NotAFile(path));
        }

        fs::remove_file(&path).map_err(|e| FileError::from_io(e, &path))?;
        info!(path = ?path, "File deleted");
        Ok(())
    }

    /// Delete a folder and everything below it.
    ///
    /// Not transactional: a failure partway through can leave a partially
    /// deleted tree. The home directory itself is never deleted.
    pub fn delete_folder(&self, relative: &str) -> FileResult<()> {
        self.try_delete_folder(relative)
            .inspect_err(|e| log_failure("delete_folder", relative, e))
    }

    fn try_delete_folder(&self, relative: &str) -> FileResult<()> {
        let root = self.resolver.home().current();
        let path = self.resolver.resolve_against(&root, relative)?;

        if !path.is_dir() {
            return Err(FileError::NotFound(path));
        }

        if path == self.resolver.resolve_against(&root, "")? {
            return Err(FileError::InvalidInput(
                "refusing to delete the home directory".to_string(),
            ));
        }

        fs::remove_dir_all(&path).map_err(|e| FileError::from_io(e, &path))?;
        info!(path = ?path, "Folder deleted");
        Ok(())
    }
}

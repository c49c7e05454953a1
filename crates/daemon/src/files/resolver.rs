//! Resolution of client-supplied relative paths.
//!
//! Every file operation goes through [`PathResolver`]. Resolution is purely
//! lexical: the home directory and the relative path are joined, made
//! absolute, and `.`/`..` segments are folded. The target does not need to
//! exist. Symlinks are left to the OS when the path is actually used.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FileError, FileResult, HomeDirectory};

/// Whether resolved paths must stay inside the home directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainmentPolicy {
    /// Any resolved path is accepted, including ones that `..` out of the
    /// home directory.
    #[default]
    Unconfined,
    /// Paths resolving outside the home directory fail with
    /// [`FileError::OutsideRoot`].
    Confined,
}

/// Turns relative paths into absolute paths under the current home directory.
#[derive(Debug)]
pub struct PathResolver {
    home: Arc<HomeDirectory>,
    policy: ContainmentPolicy,
}

impl PathResolver {
    /// Create an unconfined resolver reading from `home`.
    pub fn new(home: Arc<HomeDirectory>) -> Self {
        Self {
            home,
            policy: ContainmentPolicy::Unconfined,
        }
    }

    /// Set the containment policy.
    pub fn with_policy(mut self, policy: ContainmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The home directory handle this resolver reads from.
    pub fn home(&self) -> &Arc<HomeDirectory> {
        &self.home
    }

    pub fn policy(&self) -> ContainmentPolicy {
        self.policy
    }

    /// Resolve `relative` against the current home directory.
    ///
    /// Only fails under [`ContainmentPolicy::Confined`].
    pub fn resolve(&self, relative: &str) -> FileResult<PathBuf> {
        let root = self.home.current();
        self.resolve_against(&root, relative)
    }

    /// Resolve `relative` against an explicit root snapshot.
    pub fn resolve_against(&self, root: &Path, relative: &str) -> FileResult<PathBuf> {
        let resolved = resolve(root, relative);

        if self.policy == ContainmentPolicy::Confined {
            let root = normalize(&absolutize(root));
            if !resolved.starts_with(&root) {
                return Err(FileError::OutsideRoot(resolved));
            }
        }

        Ok(resolved)
    }
}

/// Join `relative` onto `root` and fold it into an absolute, normalized path.
///
/// An empty `relative` yields the root itself. An absolute `relative`
/// replaces the root, as `Path::join` does.
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    let relative = normalize_separators(relative);
    normalize(&absolutize(&root.join(relative.as_ref())))
}

/// Accept `\` as a separator on hosts where it is not native.
pub fn normalize_separators(relative: &str) -> Cow<'_, str> {
    if cfg!(windows) || !relative.contains('\\') {
        Cow::Borrowed(relative)
    } else {
        Cow::Owned(relative.replace('\\', "/"))
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Fold `.` and `..` without touching the filesystem. `..` at the root stays
/// at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

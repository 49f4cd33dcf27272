//! Path canonicalization used to match watcher paths against unit sources.

use std::path::{Component, Path, PathBuf};

/// Maps a path onto the form used for equality comparison.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> PathBuf;
}

impl<F> PathResolver for F
where
    F: Fn(&Path) -> PathBuf + Send + Sync,
{
    fn resolve(&self, path: &Path) -> PathBuf {
        self(path)
    }
}

/// Resolves symlinks through the file system. For a path that no longer exists, the deepest
/// existing ancestor is resolved and the missing tail re-joined, so a deleted file under a
/// symlinked directory still matches its unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalResolver;

impl PathResolver for CanonicalResolver {
    fn resolve(&self, path: &Path) -> PathBuf {
        match dunce::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(_) => resolve_missing(&normalize_lexically(path)),
        }
    }
}

fn resolve_missing(normalized: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut current = normalized;
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            tail.push(name);
        }
        if let Ok(mut resolved) = dunce::canonicalize(parent) {
            resolved.extend(tail.iter().rev());
            return resolved;
        }
        current = parent;
    }
    normalized.to_path_buf()
}

/// Absolutize against the working directory, drop `.` segments and pop on `..`.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

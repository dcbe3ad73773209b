//! Local cache management.

use hubkit_core::{hub_cache_home, Result};
use std::path::{Path, PathBuf};

/// Get the cache directory in use.
#[must_use]
pub fn cache_dir() -> PathBuf {
    hub_cache_home()
}

/// A cached repository entry.
#[derive(Debug, Clone)]
pub struct CachedRepo {
    /// Repository identifier reconstructed from the folder name.
    pub repo_id: String,
    /// On-disk location of the repo cache.
    pub path: PathBuf,
    /// Total size of the cached files in bytes.
    pub size_bytes: u64,
}

/// Total cache size in bytes.
pub fn cache_size(dir: Option<&Path>) -> Result<u64> {
    let root = dir.map(Path::to_path_buf).unwrap_or_else(cache_dir);
    if !root.exists() {
        return Ok(0);
    }
    Ok(dir_size(&root))
}

/// Remove the entire cache.
pub fn clear_cache(dir: Option<&Path>) -> Result<()> {
    let root = dir.map(Path::to_path_buf).unwrap_or_else(cache_dir);
    if root.exists() {
        std::fs::remove_dir_all(&root)?;
    }
    Ok(())
}

/// List cached repositories with their sizes.
pub fn scan_cache(dir: Option<&Path>) -> Result<Vec<CachedRepo>> {
    let root = dir.map(Path::to_path_buf).unwrap_or_else(cache_dir);
    let mut repos = Vec::new();
    if !root.exists() {
        return Ok(repos);
    }

    for entry in std::fs::read_dir(&root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().to_string();
        // Repo folders look like `models--namespace--name`.
        let Some((_, rest)) = folder.split_once("--") else {
            continue;
        };
        repos.push(CachedRepo {
            repo_id: rest.replace("--", "/"),
            path: entry.path(),
            size_bytes: dir_size(&entry.path()),
        });
    }

    repos.sort_by(|a, b| a.repo_id.cmp(&b.repo_id));
    Ok(repos)
}

fn dir_size(root: &Path) -> u64 {
    let mut size = 0u64;
    for entry in walkdir::WalkDir::new(root).into_iter().flatten() {
        if entry.file_type().is_file() {
            if let Ok(metadata) = entry.metadata() {
                size += metadata.len();
            }
        }
    }
    size
}

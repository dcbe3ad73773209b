//! File and snapshot downloading.
//!
//! Downloads delegate to the hub client's cache-aware API; this module maps
//! [`DownloadOptions`] onto it and adds offline resolution and snapshot
//! assembly on top.

use crate::patterns::filter_paths;
use hf_hub::api::tokio::{Api, ApiBuilder};
use hf_hub::{Cache, Repo, RepoType};
use hubkit_core::{hub_cache_home, DownloadOptions, HubError, HubToken, RepoId, RepoKind, Result};
use std::path::{Path, PathBuf};

/// Map a [`RepoKind`] onto the client's repo type.
fn repo_type(kind: RepoKind) -> RepoType {
    match kind {
        RepoKind::Model => RepoType::Model,
        RepoKind::Dataset => RepoType::Dataset,
        RepoKind::Space => RepoType::Space,
    }
}

/// Build the client repo handle, honoring an optional revision.
fn hub_repo(repo_id: &RepoId, kind: RepoKind, revision: Option<&str>) -> Repo {
    match revision {
        Some(rev) => Repo::with_revision(repo_id.to_string(), repo_type(kind), rev.to_string()),
        None => Repo::new(repo_id.to_string(), repo_type(kind)),
    }
}

/// Build the download client from the options.
fn build_api(opts: &DownloadOptions) -> Result<Api> {
    let mut builder = ApiBuilder::new().with_progress(opts.progress);

    if let Some(token) = HubToken::resolve(opts.token.as_ref()) {
        builder = builder.with_token(Some(token.expose().to_string()));
    }
    if let Some(dir) = &opts.cache_dir {
        builder = builder.with_cache_dir(dir.clone());
    }
    if let Some(endpoint) = &opts.endpoint {
        builder = builder.with_endpoint(endpoint.clone());
    }

    builder.build().map_err(|e| HubError::Client(e.to_string()))
}

/// Download a single file from a repository.
///
/// Honors the full option set: `revision` selects the ref, `cache_dir`
/// relocates the cache, `force_download` bypasses it, `local_files_only`
/// resolves from the cache without any network I/O, and `token`
/// authenticates access to private repositories.
pub async fn download_file(
    repo_id: &RepoId,
    filename: &str,
    kind: RepoKind,
    opts: &DownloadOptions,
) -> Result<PathBuf> {
    if opts.local_files_only {
        return cached_file(repo_id, filename, kind, opts);
    }

    let api = build_api(opts)?;
    let repo = api.repo(hub_repo(repo_id, kind, opts.revision.as_deref()));

    tracing::debug!(repo = %repo_id, filename, "fetching file");
    if opts.force_download || !opts.resume_download {
        repo.download(filename)
            .await
            .map_err(|e| HubError::Client(e.to_string()))
    } else {
        repo.get(filename)
            .await
            .map_err(|e| HubError::Client(e.to_string()))
    }
}

/// List the files present in a repository at the resolved revision.
pub async fn list_repo_files(
    repo_id: &RepoId,
    kind: RepoKind,
    opts: &DownloadOptions,
) -> Result<Vec<String>> {
    let api = build_api(opts)?;
    let repo = api.repo(hub_repo(repo_id, kind, opts.revision.as_deref()));

    let info = repo
        .info()
        .await
        .map_err(|e| HubError::Client(e.to_string()))?;

    Ok(info
        .siblings
        .into_iter()
        .map(|sibling| sibling.rfilename)
        .collect())
}

/// Download a repository snapshot and return the snapshot directory.
///
/// Lists the repository, filters the file set through the allow/ignore
/// patterns, fetches every remaining file, and returns the directory that
/// mirrors the repository layout. With `local_files_only` the snapshot is
/// resolved from the cache instead.
pub async fn download_snapshot(
    repo_id: &RepoId,
    kind: RepoKind,
    opts: &DownloadOptions,
    allow_patterns: Option<&[String]>,
    ignore_patterns: Option<&[String]>,
) -> Result<PathBuf> {
    if opts.local_files_only {
        return cached_snapshot(repo_id, kind, opts).ok_or_else(|| HubError::CacheMiss {
            repo_id: repo_id.to_string(),
            filename: "*".into(),
        });
    }

    let files = list_repo_files(repo_id, kind, opts).await?;
    let selected = filter_paths(&files, allow_patterns, ignore_patterns);
    if selected.is_empty() {
        return Err(HubError::FileNotFound {
            repo_id: repo_id.to_string(),
            filename: "*".into(),
        });
    }

    let api = build_api(opts)?;
    let repo = api.repo(hub_repo(repo_id, kind, opts.revision.as_deref()));

    tracing::info!(repo = %repo_id, files = selected.len(), "downloading snapshot");
    let mut root: Option<PathBuf> = None;
    for remote_path in &selected {
        let local = if opts.force_download || !opts.resume_download {
            repo.download(remote_path).await
        } else {
            repo.get(remote_path).await
        }
        .map_err(|e| HubError::Client(e.to_string()))?;

        if root.is_none() {
            root = snapshot_root(&local, remote_path);
        }
    }

    root.ok_or_else(|| HubError::Client(format!("could not locate snapshot dir for {repo_id}")))
}

/// Resolve a cached file without touching the network.
fn cached_file(
    repo_id: &RepoId,
    filename: &str,
    kind: RepoKind,
    opts: &DownloadOptions,
) -> Result<PathBuf> {
    let cache = open_cache(opts);
    cache
        .repo(hub_repo(repo_id, kind, opts.revision.as_deref()))
        .get(filename)
        .ok_or_else(|| HubError::CacheMiss {
            repo_id: repo_id.to_string(),
            filename: filename.to_string(),
        })
}

fn open_cache(opts: &DownloadOptions) -> Cache {
    match &opts.cache_dir {
        Some(dir) => Cache::new(dir.clone()),
        None => Cache::new(hub_cache_home()),
    }
}

/// Locate a cached snapshot directory for the requested revision.
///
/// Follows the client's on-disk layout: a per-repo folder holding `refs/`
/// files that map ref names to commit hashes, and `snapshots/<hash>/`
/// directories holding the files.
pub(crate) fn cached_snapshot(
    repo_id: &RepoId,
    kind: RepoKind,
    opts: &DownloadOptions,
) -> Option<PathBuf> {
    let cache_root = opts
        .cache_dir
        .clone()
        .unwrap_or_else(hub_cache_home);
    let folder = format!(
        "{}--{}",
        kind.api_segment(),
        repo_id.to_string().replace('/', "--")
    );
    let repo_dir = cache_root.join(folder);

    let revision = opts.revision.as_deref().unwrap_or("main");
    // A revision may be a ref name or already a commit hash.
    let commit = match std::fs::read_to_string(repo_dir.join("refs").join(revision)) {
        Ok(contents) => contents.trim().to_string(),
        Err(_) => revision.to_string(),
    };

    let snapshot = repo_dir.join("snapshots").join(commit);
    snapshot.is_dir().then_some(snapshot)
}

/// Compute the snapshot root from a downloaded file's local path.
///
/// The cache mirrors the repository layout beneath the snapshot directory,
/// so stripping the remote path's components off the local path yields the
/// root even for files in subdirectories.
fn snapshot_root(local: &Path, remote_path: &str) -> Option<PathBuf> {
    let depth = remote_path.split('/').count();
    let mut root = local;
    for _ in 0..depth {
        root = root.parent()?;
    }
    Some(root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_root_strips_remote_components() {
        let local = Path::new("/cache/snapshots/abc/vae/model.safetensors");
        let root = snapshot_root(local, "vae/model.safetensors").unwrap();
        assert_eq!(root, Path::new("/cache/snapshots/abc"));

        let local = Path::new("/cache/snapshots/abc/config.json");
        let root = snapshot_root(local, "config.json").unwrap();
        assert_eq!(root, Path::new("/cache/snapshots/abc"));
    }

    #[test]
    fn cached_snapshot_resolves_refs() {
        let tmp = tempfile::tempdir().unwrap();
        let repo_dir = tmp.path().join("models--org--demo");
        std::fs::create_dir_all(repo_dir.join("refs")).unwrap();
        std::fs::create_dir_all(repo_dir.join("snapshots").join("abc123")).unwrap();
        std::fs::write(repo_dir.join("refs").join("main"), "abc123\n").unwrap();

        let repo = RepoId::parse("org/demo").unwrap();
        let opts = DownloadOptions {
            cache_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };

        let snapshot = cached_snapshot(&repo, RepoKind::Model, &opts).unwrap();
        assert!(snapshot.ends_with("snapshots/abc123"));
    }

    #[test]
    fn cached_snapshot_accepts_commit_revision() {
        let tmp = tempfile::tempdir().unwrap();
        let repo_dir = tmp.path().join("models--org--demo");
        std::fs::create_dir_all(repo_dir.join("snapshots").join("deadbeef")).unwrap();

        let repo = RepoId::parse("org/demo").unwrap();
        let opts = DownloadOptions {
            cache_dir: Some(tmp.path().to_path_buf()),
            revision: Some("deadbeef".into()),
            ..Default::default()
        };

        assert!(cached_snapshot(&repo, RepoKind::Model, &opts).is_some());
    }

    #[test]
    fn cached_snapshot_misses_unknown_repo() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = RepoId::parse("org/absent").unwrap();
        let opts = DownloadOptions {
            cache_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        assert!(cached_snapshot(&repo, RepoKind::Model, &opts).is_none());
    }

    #[tokio::test]
    async fn offline_file_lookup_reports_cache_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = RepoId::parse("org/absent").unwrap();
        let opts = DownloadOptions {
            cache_dir: Some(tmp.path().to_path_buf()),
            local_files_only: true,
            ..Default::default()
        };

        let err = download_file(&repo, "config.json", RepoKind::Model, &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::CacheMiss { .. }));
    }
}

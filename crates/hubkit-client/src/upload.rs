//! Repository creation and single-commit uploads.
//!
//! The hub accepts a whole commit in one request: an NDJSON payload with a
//! header operation, inline base64 file operations, and LFS pointer
//! operations for large files that were staged through the LFS batch API
//! beforehand. Everything in one `upload_folder` call lands as exactly one
//! commit.

use crate::patterns::is_selected;
use crate::resolve_endpoint;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hubkit_core::{HubError, HubToken, PushOptions, RepoId, RepoKind, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Files at or above this size are routed through LFS.
pub const LFS_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Extensions always routed through LFS, whatever their size.
const LFS_EXTENSIONS: &[&str] = &[
    "safetensors", "gguf", "bin", "pt", "pth", "onnx", "h5", "msgpack", "ckpt",
];

/// Bytes of file head sent as the preupload sample.
const SAMPLE_LEN: usize = 512;

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// URL of the created commit.
    pub commit_url: Option<String>,
    /// Commit object id.
    pub oid: Option<String>,
    /// Pull-request URL when `create_pr` was set.
    pub pr_url: Option<String>,
}

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Path the file will have inside the repository.
    pub path_in_repo: String,
    /// Local source path.
    pub local_path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

/// An object staged through LFS.
#[derive(Debug, Clone)]
pub struct LfsObject {
    /// Path the file will have inside the repository.
    pub path_in_repo: String,
    /// Hex sha256 digest of the content.
    pub oid: String,
    /// Content size in bytes.
    pub size: u64,
}

/// Create a repository, succeeding if it already exists.
///
/// Returns the repository URL on the configured endpoint.
pub async fn create_repo(repo_id: &RepoId, kind: RepoKind, opts: &PushOptions) -> Result<String> {
    let endpoint = resolve_endpoint(opts.endpoint.as_deref());
    let token = require_token(opts)?;
    let client = http_client(opts.proxy.as_deref())?;

    let mut body = serde_json::json!({
        "name": repo_id.name,
        "type": kind.api_name(),
        "private": opts.private,
    });
    if let Some(ns) = &repo_id.namespace {
        body["organization"] = serde_json::Value::String(ns.clone());
    }

    let url = format!("{endpoint}/api/repos/create");
    let response = client
        .post(&url)
        .bearer_auth(token.expose())
        .json(&body)
        .send()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;

    let repo_url = format!("{endpoint}/{}{repo_id}", kind.url_prefix());
    match response.status().as_u16() {
        200 | 201 => {
            tracing::info!(repo = %repo_id, "created repo");
            Ok(repo_url)
        }
        // Conflict: the repo already exists, which is fine.
        409 => Ok(repo_url),
        status => Err(HubError::Api {
            status,
            message: response.text().await.unwrap_or_default(),
        }),
    }
}

/// Upload a folder's contents as a single commit.
///
/// Walks `folder`, filters the file set through the push options'
/// allow/ignore patterns, and commits everything that survives. Filtered
/// files are never read. An empty selection is an error rather than an
/// empty commit.
pub async fn upload_folder(
    folder: &Path,
    repo_id: &RepoId,
    kind: RepoKind,
    opts: &PushOptions,
) -> Result<CommitInfo> {
    let files = collect_folder(
        folder,
        opts.allow_patterns.as_deref(),
        opts.ignore_patterns.as_deref(),
    )?;
    if files.is_empty() {
        return Err(HubError::EmptyCommit(repo_id.to_string()));
    }
    commit_files(files, repo_id, kind, opts).await
}

/// Upload a single file as its own commit.
pub async fn upload_file(
    local_path: &Path,
    path_in_repo: &str,
    repo_id: &RepoId,
    kind: RepoKind,
    opts: &PushOptions,
) -> Result<CommitInfo> {
    let size = std::fs::metadata(local_path)?.len();
    let file = UploadFile {
        path_in_repo: path_in_repo.to_string(),
        local_path: local_path.to_path_buf(),
        size,
    };
    commit_files(vec![file], repo_id, kind, opts).await
}

/// Collect a folder's files into upload entries, pattern-filtered.
pub fn collect_folder(
    folder: &Path,
    allow: Option<&[String]>,
    ignore: Option<&[String]>,
) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|e| HubError::Upload(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(folder)
            .map_err(|e| HubError::Upload(e.to_string()))?;
        let path_in_repo = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if !is_selected(&path_in_repo, allow, ignore) {
            continue;
        }
        files.push(UploadFile {
            path_in_repo,
            local_path: entry.path().to_path_buf(),
            size: entry.metadata().map_err(|e| HubError::Upload(e.to_string()))?.len(),
        });
    }
    Ok(files)
}

/// Land a set of staged files as one commit.
async fn commit_files(
    files: Vec<UploadFile>,
    repo_id: &RepoId,
    kind: RepoKind,
    opts: &PushOptions,
) -> Result<CommitInfo> {
    let endpoint = resolve_endpoint(opts.endpoint.as_deref());
    let token = require_token(opts)?;
    let client = http_client(opts.proxy.as_deref())?;
    let revision = opts.branch.as_deref().unwrap_or("main");

    // Ask the hub which files must go through LFS; fall back to the local
    // size/extension heuristic when the server leaves a file unlisted.
    let modes = preupload(&client, &token, &endpoint, repo_id, kind, revision, &files).await?;

    let mut regular = Vec::new();
    let mut lfs_files = Vec::new();
    for file in files {
        let server_lfs = modes.get(&file.path_in_repo).map(|m| m == "lfs");
        let use_lfs =
            server_lfs.unwrap_or_else(|| is_lfs_candidate(&file.path_in_repo, file.size));
        if use_lfs {
            lfs_files.push(file);
        } else {
            regular.push(file);
        }
    }

    let lfs_objects = stage_lfs_files(&client, &token, &endpoint, repo_id, kind, &lfs_files).await?;

    let mut inline = Vec::with_capacity(regular.len());
    for file in &regular {
        inline.push((file.path_in_repo.clone(), std::fs::read(&file.local_path)?));
    }

    let payload = build_commit_payload(
        &opts.commit_message,
        opts.commit_description.as_deref(),
        &inline,
        &lfs_objects,
    );

    let url = commit_url(&endpoint, kind, repo_id, revision, opts.create_pr);
    tracing::info!(
        repo = %repo_id,
        inline = inline.len(),
        lfs = lfs_objects.len(),
        "committing upload"
    );

    let response = client
        .post(&url)
        .bearer_auth(token.expose())
        .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
        .body(payload)
        .send()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;

    if !response.status().is_success() {
        return Err(HubError::Api {
            status: response.status().as_u16(),
            message: response.text().await.unwrap_or_default(),
        });
    }

    let commit: CommitResponse = response
        .json()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;
    Ok(CommitInfo {
        commit_url: commit.commit_url,
        oid: commit.commit_oid,
        pr_url: commit.pull_request_url,
    })
}

/// Ask the hub for the upload mode of each staged file.
async fn preupload(
    client: &reqwest::Client,
    token: &HubToken,
    endpoint: &str,
    repo_id: &RepoId,
    kind: RepoKind,
    revision: &str,
    files: &[UploadFile],
) -> Result<HashMap<String, String>> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        entries.push((file.path_in_repo.clone(), file.size, read_sample(&file.local_path)?));
    }
    let body = build_preupload_request(&entries);

    let url = format!(
        "{endpoint}/api/{}/{repo_id}/preupload/{}",
        kind.api_segment(),
        encode_ref(revision)
    );
    let response = client
        .post(&url)
        .bearer_auth(token.expose())
        .json(&body)
        .send()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;

    if !response.status().is_success() {
        return Err(HubError::Api {
            status: response.status().as_u16(),
            message: response.text().await.unwrap_or_default(),
        });
    }

    let parsed: PreuploadResponse = response
        .json()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;
    Ok(parsed
        .files
        .into_iter()
        .map(|f| (f.path, f.upload_mode))
        .collect())
}

/// Push LFS-routed files through the batch API and return their pointers.
async fn stage_lfs_files(
    client: &reqwest::Client,
    token: &HubToken,
    endpoint: &str,
    repo_id: &RepoId,
    kind: RepoKind,
    files: &[UploadFile],
) -> Result<Vec<LfsObject>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let mut objects = Vec::with_capacity(files.len());
    for file in files {
        objects.push(LfsObject {
            path_in_repo: file.path_in_repo.clone(),
            oid: compute_sha256(&file.local_path)?,
            size: file.size,
        });
    }

    let url = format!(
        "{endpoint}/{}{repo_id}.git/info/lfs/objects/batch",
        kind.url_prefix()
    );
    let response = client
        .post(&url)
        .bearer_auth(token.expose())
        .header(reqwest::header::CONTENT_TYPE, "application/vnd.git-lfs+json")
        .header(reqwest::header::ACCEPT, "application/vnd.git-lfs+json")
        .json(&build_lfs_batch_request(&objects))
        .send()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;

    if !response.status().is_success() {
        return Err(HubError::Api {
            status: response.status().as_u16(),
            message: response.text().await.unwrap_or_default(),
        });
    }

    let batch: LfsBatchResponse = response
        .json()
        .await
        .map_err(|e| HubError::Upload(e.to_string()))?;

    let by_oid: HashMap<&str, &UploadFile> = objects
        .iter()
        .zip(files)
        .map(|(obj, file)| (obj.oid.as_str(), file))
        .collect();

    for entry in &batch.objects {
        // Objects without an upload action are already stored server-side.
        let Some(action) = entry.actions.as_ref().and_then(|a| a.upload.as_ref()) else {
            continue;
        };
        let Some(file) = by_oid.get(entry.oid.as_str()) else {
            continue;
        };

        tracing::debug!(path = %file.path_in_repo, size = file.size, "uploading LFS object");
        let mut request = client.put(&action.href);
        for (name, value) in &action.header {
            request = request.header(name.as_str(), value.as_str());
        }
        let content = tokio::fs::read(&file.local_path)
            .await
            .map_err(HubError::Io)?;
        let put = request
            .body(content)
            .send()
            .await
            .map_err(|e| HubError::Upload(e.to_string()))?;
        if !put.status().is_success() {
            return Err(HubError::Api {
                status: put.status().as_u16(),
                message: format!("LFS upload failed for '{}'", file.path_in_repo),
            });
        }
    }

    Ok(objects)
}

/// Whether a file should be routed through LFS by the local heuristic.
#[must_use]
pub fn is_lfs_candidate(path_in_repo: &str, size: u64) -> bool {
    if size >= LFS_THRESHOLD {
        return true;
    }
    Path::new(path_in_repo)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| LFS_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Hex sha256 digest of a file, streamed in chunks.
pub fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn read_sample(path: &Path) -> Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; SAMPLE_LEN];
    let mut filled = 0usize;
    loop {
        let read = file.read(&mut buf[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
        if filled == buf.len() {
            break;
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Build the preupload request body from `(path, size, sample)` entries.
#[must_use]
pub fn build_preupload_request(files: &[(String, u64, Vec<u8>)]) -> serde_json::Value {
    serde_json::json!({
        "files": files
            .iter()
            .map(|(path, size, sample)| {
                serde_json::json!({
                    "path": path,
                    "size": size,
                    "sample": BASE64.encode(sample),
                })
            })
            .collect::<Vec<_>>(),
    })
}

/// Build the LFS batch request body.
#[must_use]
pub fn build_lfs_batch_request(objects: &[LfsObject]) -> serde_json::Value {
    serde_json::json!({
        "operation": "upload",
        "transfers": ["basic"],
        "hash_algo": "sha256",
        "objects": objects
            .iter()
            .map(|obj| serde_json::json!({ "oid": obj.oid, "size": obj.size }))
            .collect::<Vec<_>>(),
    })
}

/// Assemble the commit NDJSON payload: header, inline files, LFS pointers.
#[must_use]
pub fn build_commit_payload(
    summary: &str,
    description: Option<&str>,
    inline: &[(String, Vec<u8>)],
    lfs: &[LfsObject],
) -> String {
    let mut lines = Vec::with_capacity(1 + inline.len() + lfs.len());

    lines.push(
        serde_json::json!({
            "key": "header",
            "value": {
                "summary": summary,
                "description": description.unwrap_or(""),
            },
        })
        .to_string(),
    );

    for (path, content) in inline {
        lines.push(
            serde_json::json!({
                "key": "file",
                "value": {
                    "path": path,
                    "content": BASE64.encode(content),
                    "encoding": "base64",
                },
            })
            .to_string(),
        );
    }

    for obj in lfs {
        lines.push(
            serde_json::json!({
                "key": "lfsFile",
                "value": {
                    "path": obj.path_in_repo,
                    "algo": "sha256",
                    "oid": obj.oid,
                    "size": obj.size,
                },
            })
            .to_string(),
        );
    }

    lines.join("\n")
}

/// Commit endpoint URL for a repo, revision, and PR flag.
#[must_use]
pub fn commit_url(
    endpoint: &str,
    kind: RepoKind,
    repo_id: &RepoId,
    revision: &str,
    create_pr: bool,
) -> String {
    let mut url = format!(
        "{endpoint}/api/{}/{repo_id}/commit/{}",
        kind.api_segment(),
        encode_ref(revision)
    );
    if create_pr {
        url.push_str("?create_pr=1");
    }
    url
}

/// Percent-encode a ref name for use as a URL path segment.
fn encode_ref(revision: &str) -> String {
    revision.replace('%', "%25").replace('/', "%2F")
}

fn require_token(opts: &PushOptions) -> Result<HubToken> {
    HubToken::resolve(opts.token.as_ref()).ok_or_else(|| {
        HubError::Auth("a token is required to push; pass one or set HF_TOKEN".into())
    })
}

fn http_client(proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("hubkit/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy) = proxy {
        builder = builder
            .proxy(reqwest::Proxy::all(proxy).map_err(|e| HubError::Upload(e.to_string()))?);
    }
    builder.build().map_err(|e| HubError::Upload(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct PreuploadResponse {
    files: Vec<PreuploadFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreuploadFile {
    path: String,
    upload_mode: String,
}

#[derive(Debug, Deserialize)]
struct LfsBatchResponse {
    objects: Vec<LfsBatchObject>,
}

#[derive(Debug, Deserialize)]
struct LfsBatchObject {
    oid: String,
    actions: Option<LfsActions>,
}

#[derive(Debug, Deserialize)]
struct LfsActions {
    upload: Option<LfsAction>,
}

#[derive(Debug, Deserialize)]
struct LfsAction {
    href: String,
    #[serde(default)]
    header: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    commit_url: Option<String>,
    commit_oid: Option<String>,
    pull_request_url: Option<String>,
}

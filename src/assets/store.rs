//! Resolution of request paths to files under the asset root.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;
use thiserror::Error;

use crate::config::AssetsConfig;
use crate::rewrite::ContentKind;

/// Error type for asset lookup.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("path escapes the asset root: {0}")]
    Forbidden(String),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A request path resolved to a file on disk.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    /// Absolute (or root-relative) path of the file to read.
    pub file: PathBuf,
    /// Path relative to the asset root, `/`-separated. Used as cache key.
    pub key: String,
    pub kind: ContentKind,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Read-only view of the built console bundle.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    index_file: String,
    fallback_document: Option<String>,
}

impl AssetStore {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            root: config.root.clone(),
            index_file: config.index_file.clone(),
            fallback_document: config.fallback_document.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path (base path already stripped) to a file.
    ///
    /// Directories resolve to the index file. Extension-less misses fall back
    /// to the fallback document when one is configured.
    pub async fn resolve(&self, request_path: &str) -> Result<ResolvedAsset, AssetError> {
        let segments = sanitize(request_path)?;

        let mut rel: Vec<&str> = segments.clone();
        let candidate = self.root.join(rel.join("/"));
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_dir() => rel.push(&self.index_file),
            Ok(_) => {}
            Err(_) => {
                let looks_like_page = !segments.last().is_some_and(|s| s.contains('.'));
                if let (true, Some(fallback)) = (looks_like_page, &self.fallback_document) {
                    tracing::debug!(path = %request_path, fallback = %fallback, "Serving fallback document");
                    return self.stat(fallback.trim_start_matches('/').to_string(), request_path).await;
                }
                return Err(AssetError::NotFound(request_path.to_string()));
            }
        }

        self.stat(rel.join("/"), request_path).await
    }

    async fn stat(&self, key: String, request_path: &str) -> Result<ResolvedAsset, AssetError> {
        let file = self.root.join(&key);
        let meta = match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => meta,
            _ => return Err(AssetError::NotFound(request_path.to_string())),
        };

        Ok(ResolvedAsset {
            kind: ContentKind::from_path(&file),
            len: meta.len(),
            modified: meta.modified().ok(),
            file,
            key,
        })
    }

    pub async fn read(&self, asset: &ResolvedAsset) -> Result<Vec<u8>, AssetError> {
        tokio::fs::read(&asset.file).await.map_err(|source| AssetError::Io {
            path: asset.file.clone(),
            source,
        })
    }

    /// Every regular file under the root, as root-relative `/`-separated keys.
    ///
    /// Symbolic links are not followed.
    pub fn walk(&self) -> Result<Vec<String>, AssetError> {
        std::fs::metadata(&self.root).map_err(|source| AssetError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut out: Vec<String> = WalkDir::new(&self.root)
            .skip_hidden(false)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable bundle entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| asset_key(&self.root, &entry.path()))
            .collect();
        out.sort();
        Ok(out)
    }
}

fn asset_key(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let key = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    Some(key)
}

/// Split a URL path into safe segments.
///
/// Empty and `.` segments are dropped; `..`, backslashes and NUL are refused.
fn sanitize(request_path: &str) -> Result<Vec<&str>, AssetError> {
    let path = request_path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(AssetError::Forbidden(request_path.to_string())),
            s if s.contains('\\') || s.contains('\0') || s.contains(':') => {
                return Err(AssetError::Forbidden(request_path.to_string()));
            }
            s => segments.push(s),
        }
    }
    Ok(segments)
}

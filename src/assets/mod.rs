//! Built console bundle access.
//!
//! # Data Flow
//! ```text
//! request path (base path stripped)
//!     → store.rs (sanitize, resolve directory index / fallback)
//!     → cache.rs lookup by (base path, asset key), checked against mtime+len
//!     → miss: read file → rewrite::rewrite(kind) → cache insert
//!     → response body
//! ```
//!
//! # Design Decisions
//! - Only HTML, JS and CSS are decoded and rewritten; everything else is bytes
//! - Non UTF-8 text assets pass through unchanged
//! - Cache is bounded; when full, assets are served uncached

pub mod cache;
pub mod mime;
pub mod scan;
pub mod store;

use std::borrow::Cow;

use axum::body::Bytes;

pub use cache::{CacheKey, CacheStats, CachedAsset, RewriteCache};
pub use scan::{scan, DriftReport, FileReport};
pub use store::{AssetError, AssetStore, ResolvedAsset};

use crate::basepath::BasePath;
use crate::observability::metrics;
use crate::rewrite::{self, ContentKind, RewriteReport};

/// Rewrite raw asset bytes for `base_path` according to the asset's kind.
pub fn render(asset: &ResolvedAsset, raw: Vec<u8>, base_path: &BasePath) -> (Bytes, RewriteReport) {
    if !asset.kind.is_rewritable() || base_path.is_root() {
        return (Bytes::from(raw), RewriteReport::default());
    }

    let text = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %asset.key, "Asset is not valid UTF-8, serving unchanged");
            return (Bytes::from(e.into_bytes()), RewriteReport::default());
        }
    };

    let (rewritten, report) = {
        let out = rewrite::rewrite(asset.kind, &text, base_path.as_str());
        let rewritten = match out.content {
            Cow::Owned(rewritten) => Some(rewritten),
            Cow::Borrowed(_) => None,
        };
        (rewritten, out.report)
    };

    for (transform, n) in report.iter() {
        metrics::record_rewrite(transform, n);
    }
    tracing::debug!(
        path = %asset.key,
        base_path = %base_path,
        kind = ?asset.kind,
        substitutions = %report,
        "Rewrote asset"
    );
    if asset.kind == ContentKind::JavaScript && report.total() == 0 {
        tracing::trace!(path = %asset.key, "No JS transform matched");
    }

    let body = Bytes::from(rewritten.unwrap_or(text));
    (body, report)
}

//! Whole-bundle dry run of the rewriters.
//!
//! Rewrites every HTML/JS/CSS file under the root without serving or caching
//! it and reports what each transform did. A bundler upgrade that changes the
//! minified shapes shows up here as zero counts instead of a broken console.

use std::path::Path;

use serde::Serialize;

use crate::assets::store::{AssetError, AssetStore};
use crate::basepath::BasePath;
use crate::rewrite::{self, ContentKind, RewriteReport, Transform};

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub kind: ContentKind,
    pub substitutions: RewriteReport,
    /// Set when the file could not be decoded or read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub base_path: String,
    pub files: Vec<FileReport>,
    pub totals: RewriteReport,
}

impl DriftReport {
    /// True when at least one script had the origin or asset-base-function
    /// patch applied. A JS bundle where neither fires means the bundler output
    /// no longer has the expected shape.
    pub fn js_patched(&self) -> bool {
        self.totals.count(Transform::JsOrigin) > 0 || self.totals.count(Transform::JsAssetBaseFn) > 0
    }

    pub fn has_scripts(&self) -> bool {
        self.files.iter().any(|f| f.kind == ContentKind::JavaScript)
    }
}

/// Scan every rewritable file under `store`'s root.
pub fn scan(store: &AssetStore, base_path: &BasePath) -> Result<DriftReport, AssetError> {
    let mut files = Vec::new();
    let mut totals = RewriteReport::default();

    for key in store.walk()? {
        let kind = ContentKind::from_path(Path::new(&key));
        if !kind.is_rewritable() {
            continue;
        }

        let file = store.root().join(&key);
        let report = match std::fs::read_to_string(&file) {
            Ok(text) => {
                let report = rewrite::rewrite(kind, &text, base_path.as_str()).report;
                totals.merge(&report);
                FileReport {
                    path: key,
                    kind,
                    substitutions: report,
                    skipped: None,
                }
            }
            Err(e) => FileReport {
                path: key,
                kind,
                substitutions: RewriteReport::default(),
                skipped: Some(e.to_string()),
            },
        };
        files.push(report);
    }

    Ok(DriftReport {
        base_path: base_path.as_str().to_string(),
        files,
        totals,
    })
}

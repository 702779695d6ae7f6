//! Base path rewriting engine.
//!
//! # Data Flow
//! ```text
//! asset bytes (built for "/")
//!     → ContentKind (by extension)
//!     → html.rs | js.rs | css.rs (targeted substitutions)
//!         html.rs embeds script.rs output before </head>
//!     → Rewritten { content, report }
//!     → response body
//! ```
//!
//! # Design Decisions
//! - Pattern substitution over raw text, no parsing. Each rewriter documents
//!   the input shape it depends on
//! - Total functions: a missing shape is "nothing to rewrite", never an error
//! - Root base path (`""`) is the identity and borrows the input
//! - Every substitution is counted so drift in bundler output is observable
//! - Single application per asset; output is not safe to rewrite again

pub mod css;
pub mod html;
pub mod js;
mod pattern;
pub mod script;

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use serde::Serialize;

pub use css::{rewrite_css, rewrite_css_report};
pub use html::{rewrite_html, rewrite_html_report};
pub use js::{rewrite_js, rewrite_js_report};
pub use script::{generate_script, BASE_PATH_GLOBAL};

/// A single named substitution performed by one of the rewriters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    HtmlAttribute,
    HtmlScript,
    JsOrigin,
    JsAssetLiteral,
    JsAssetBaseFn,
    CssUrl,
}

impl Transform {
    pub const ALL: [Transform; 6] = [
        Transform::HtmlAttribute,
        Transform::HtmlScript,
        Transform::JsOrigin,
        Transform::JsAssetLiteral,
        Transform::JsAssetBaseFn,
        Transform::CssUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Transform::HtmlAttribute => "html_attribute",
            Transform::HtmlScript => "html_script",
            Transform::JsOrigin => "js_origin",
            Transform::JsAssetLiteral => "js_asset_literal",
            Transform::JsAssetBaseFn => "js_asset_base_fn",
            Transform::CssUrl => "css_url",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substitution counts per transform for one rewrite call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    counts: [usize; Transform::ALL.len()],
}

impl RewriteReport {
    pub fn record(&mut self, transform: Transform, n: usize) {
        self.counts[transform.index()] += n;
    }

    pub fn count(&self, transform: Transform) -> usize {
        self.counts[transform.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: &RewriteReport) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    /// Non-zero counts, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Transform, usize)> + '_ {
        Transform::ALL
            .iter()
            .map(|t| (*t, self.count(*t)))
            .filter(|(_, n)| *n > 0)
    }
}

impl Serialize for RewriteReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        for (transform, n) in self.iter() {
            map.serialize_entry(transform.as_str(), &n)?;
        }
        map.end()
    }
}

impl fmt::Display for RewriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (transform, n) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{transform}={n}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Output of a rewriter: the content plus what was substituted.
#[derive(Debug, Clone)]
pub struct Rewritten<'a> {
    pub content: Cow<'a, str>,
    pub report: RewriteReport,
}

impl<'a> Rewritten<'a> {
    pub fn unchanged(content: &'a str) -> Self {
        Self {
            content: Cow::Borrowed(content),
            report: RewriteReport::default(),
        }
    }

    pub fn into_owned(self) -> Rewritten<'static> {
        Rewritten {
            content: Cow::Owned(self.content.into_owned()),
            report: self.report,
        }
    }
}

/// Which rewriter, if any, applies to an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    JavaScript,
    Css,
    Other,
}

impl ContentKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("html" | "htm") => ContentKind::Html,
            Some("js" | "mjs" | "cjs") => ContentKind::JavaScript,
            Some("css") => ContentKind::Css,
            _ => ContentKind::Other,
        }
    }

    /// True for kinds handled by a rewriter.
    pub fn is_rewritable(self) -> bool {
        !matches!(self, ContentKind::Other)
    }
}

/// Dispatch to the rewriter for `kind`. `Other` content passes through.
pub fn rewrite<'a>(kind: ContentKind, content: &'a str, base_path: &str) -> Rewritten<'a> {
    match kind {
        ContentKind::Html => rewrite_html_report(content, base_path),
        ContentKind::JavaScript => rewrite_js_report(content, base_path),
        ContentKind::Css => rewrite_css_report(content, base_path),
        ContentKind::Other => Rewritten::unchanged(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_law_all_kinds() {
        let samples = [
            r#"<html><head><a href="/x"></head></html>"#,
            r#"a?b:window.location.origin;f("/assets/x");function(t){return"/"+t}"#,
            "a{b:url(/x.png)}",
            "",
        ];
        let kinds = [ContentKind::Html, ContentKind::JavaScript, ContentKind::Css, ContentKind::Other];
        for kind in kinds {
            for sample in samples {
                let out = rewrite(kind, sample, "");
                assert_eq!(out.content, sample, "{kind:?}");
                assert!(matches!(out.content, Cow::Borrowed(_)));
            }
        }
    }

    #[test]
    fn test_empty_content() {
        for kind in [ContentKind::Html, ContentKind::JavaScript, ContentKind::Css] {
            let out = rewrite(kind, "", "/base");
            assert_eq!(out.content, "");
            assert_eq!(out.report.total(), 0);
        }
    }

    #[test]
    fn test_content_kind_from_path() {
        assert_eq!(ContentKind::from_path(Path::new("dashboard/index.html")), ContentKind::Html);
        assert_eq!(ContentKind::from_path(Path::new("assets/index-Bx1.JS")), ContentKind::JavaScript);
        assert_eq!(ContentKind::from_path(Path::new("assets/index.mjs")), ContentKind::JavaScript);
        assert_eq!(ContentKind::from_path(Path::new("assets/app.css")), ContentKind::Css);
        assert_eq!(ContentKind::from_path(Path::new("favicon.ico")), ContentKind::Other);
        assert_eq!(ContentKind::from_path(Path::new("LICENSE")), ContentKind::Other);
    }

    #[test]
    fn test_other_passes_through_with_base() {
        let out = rewrite(ContentKind::Other, r#"href="/x""#, "/base");
        assert_eq!(out.content, r#"href="/x""#);
    }

    #[test]
    fn test_report_display_and_merge() {
        let mut a = RewriteReport::default();
        assert_eq!(a.to_string(), "none");
        a.record(Transform::CssUrl, 2);
        let mut b = RewriteReport::default();
        b.record(Transform::JsOrigin, 1);
        b.record(Transform::CssUrl, 1);
        a.merge(&b);
        assert_eq!(a.to_string(), "js_origin=1, css_url=3");
        assert_eq!(a.total(), 4);
        assert_eq!(
            serde_json::to_value(a).unwrap(),
            serde_json::json!({"js_origin": 1, "css_url": 3})
        );
    }
}

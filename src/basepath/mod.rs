//! Base path canonicalization.
//!
//! # Data Flow
//! ```text
//! raw prefix (config file, env, CLI flag)
//!     → normalize() (leading slash, no trailing slash, "" for root)
//!     → BasePath (canonical, immutable)
//!     → threaded into every rewriter and the asset cache key
//! ```
//!
//! # Design Decisions
//! - Canonical form is either `""` or `/segment[/segment...]` with no trailing `/`
//! - Normalization is total and idempotent; there is no error path
//! - `BasePath` can only be built through `normalize`, so a non-canonical
//!   prefix never reaches the rewriters

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonicalize a raw prefix.
///
/// `None`, `""` and `"/"` map to `""`. Everything else gets a leading `/`
/// and loses any run of trailing `/`.
pub fn normalize(raw: Option<&str>) -> String {
    let raw = match raw {
        None | Some("") | Some("/") => return String::new(),
        Some(raw) => raw,
    };

    let mut normalized = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    };
    let trimmed = normalized.trim_end_matches('/').len();
    normalized.truncate(trimmed);
    normalized
}

/// Join a base path with path segments.
///
/// The base is normalized first. Segments are joined with `/` and every run
/// of slashes in the joined part collapses to one.
pub fn join(base: &str, segments: &[&str]) -> String {
    let base = normalize(Some(base));
    let joined = segments.join("/");

    let mut path = String::with_capacity(joined.len() + 1);
    for ch in joined.chars() {
        if ch == '/' && path.ends_with('/') {
            continue;
        }
        path.push(ch);
    }

    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// A URL path prefix in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasePath(String);

impl BasePath {
    /// Normalize `raw` into a base path.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(Some(raw.as_ref())))
    }

    /// The root mount (no prefix).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when mounted at `/`; rewriting is the identity.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, segments: &[&str]) -> String {
        join(&self.0, segments)
    }

    /// Strip this prefix from a request path.
    ///
    /// Returns `None` when `path` is not under the prefix. A path equal to
    /// the prefix yields `""` so callers can tell it apart from `"/"`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.is_root() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.0.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

impl fmt::Display for BasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl AsRef<str> for BasePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BasePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl Serialize for BasePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BasePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self(normalize(raw.as_deref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root_forms() {
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("")), "");
        assert_eq!(normalize(Some("/")), "");
    }

    #[test]
    fn test_normalize_adds_leading_and_strips_trailing() {
        assert_eq!(normalize(Some("api")), "/api");
        assert_eq!(normalize(Some("/api/")), "/api");
        assert_eq!(normalize(Some("/api//")), "/api");
        assert_eq!(normalize(Some("sn_admin/")), "/sn_admin");
        assert_eq!(normalize(Some("/a/b/c")), "/a/b/c");
    }

    #[test]
    fn test_normalize_slash_runs() {
        // Only the literal "/" is special-cased; a run of slashes trims to nothing
        // after the leading one is accounted for.
        assert_eq!(normalize(Some("//")), "");
        assert_eq!(normalize(Some("///")), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = ["", "/", "api", "/api/", "/api//", "a/b/", "//", "/x"];
        for input in inputs {
            let once = normalize(Some(input));
            assert_eq!(normalize(Some(&once)), once, "input {input:?}");
        }
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/base", &["x"]), "/base/x");
        assert_eq!(join("base/", &["/x/", "/y"]), "/base/x/y");
        assert_eq!(join("", &["assets", "app.js"]), "/assets/app.js");
        assert_eq!(join("/", &["/"]), "/");
        assert_eq!(join("/reports", &["a//b", "c"]), "/reports/a/b/c");
    }

    #[test]
    fn test_join_collapses_protocol_relative_segment() {
        // The joiner does not special-case protocol-relative input.
        assert_eq!(join("/base", &["//cdn.example.com/a"]), "/base/cdn.example.com/a");
    }

    #[test]
    fn test_base_path_strip() {
        let base = BasePath::new("sn_admin/");
        assert_eq!(base.as_str(), "/sn_admin");
        assert_eq!(base.strip("/sn_admin/app.js"), Some("/app.js"));
        assert_eq!(base.strip("/sn_admin"), Some(""));
        assert_eq!(base.strip("/sn_adminx/app.js"), None);
        assert_eq!(base.strip("/app.js"), None);

        let root = BasePath::root();
        assert_eq!(root.strip("/app.js"), Some("/app.js"));
    }

    #[test]
    fn test_base_path_display_and_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            base_path: BasePath,
        }

        let w: Wrapper = toml::from_str("base_path = \"reports/\"").unwrap();
        assert_eq!(w.base_path.as_str(), "/reports");
        assert_eq!(w.base_path.to_string(), "/reports");
        assert_eq!(BasePath::root().to_string(), "/");
    }
}

//! CSS rewriting.
//!
//! Expected input shape: unquoted `url(/...)`. Quoted `url("/...")` forms are
//! not produced by the bundler and are left alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::pattern::replace_unless_slash_follows;
use super::{RewriteReport, Rewritten, Transform};

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"url\(/").expect("static url pattern"));

pub fn rewrite_css_report<'a>(css: &'a str, base_path: &str) -> Rewritten<'a> {
    if base_path.is_empty() {
        return Rewritten::unchanged(css);
    }

    let (content, n) = replace_unless_slash_follows(&CSS_URL, css, |_| format!("url({base_path}/"));
    let mut report = RewriteReport::default();
    report.record(Transform::CssUrl, n);
    Rewritten { content, report }
}

pub fn rewrite_css<'a>(css: &'a str, base_path: &str) -> Cow<'a, str> {
    rewrite_css_report(css, base_path).content
}

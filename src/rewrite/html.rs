//! HTML rewriting.
//!
//! Expected input shape: attributes written as `href="/..."`, `src="/..."`
//! or `content="/..."` with double quotes, and a literal `</head>`.
//! Matching is lexical. Single-quoted or unquoted attributes are left alone,
//! and the attribute names match on any element.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::pattern::{chain, replace_unless_slash_follows};
use super::script::generate_script;
use super::{RewriteReport, Rewritten, Transform};

static ABSOLUTE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(href|src|content)="/"#).expect("static attribute pattern")
});

const HEAD_CLOSE: &str = "</head>";

/// Rewrite root-absolute attributes and inject the navigation patch.
pub fn rewrite_html_report<'a>(html: &'a str, base_path: &str) -> Rewritten<'a> {
    if base_path.is_empty() {
        return Rewritten::unchanged(html);
    }

    let mut report = RewriteReport::default();

    let (content, attrs) = replace_unless_slash_follows(&ABSOLUTE_ATTR, html, |caps| {
        format!("{}=\"{base_path}/", &caps[1])
    });
    report.record(Transform::HtmlAttribute, attrs);

    let (content, injected) = chain(content, |s| inject_before_head_close(s, base_path));
    report.record(Transform::HtmlScript, injected);

    Rewritten { content, report }
}

/// Rewrite `html` for `base_path`, discarding the report.
pub fn rewrite_html<'a>(html: &'a str, base_path: &str) -> Cow<'a, str> {
    rewrite_html_report(html, base_path).content
}

/// Insert the script before the first `</head>` only.
fn inject_before_head_close<'a>(html: &'a str, base_path: &str) -> (Cow<'a, str>, usize) {
    let Some(at) = html.find(HEAD_CLOSE) else {
        return (Cow::Borrowed(html), 0);
    };
    let script = generate_script(base_path);
    let mut out = String::with_capacity(html.len() + script.len());
    out.push_str(&html[..at]);
    out.push_str(&script);
    out.push_str(&html[at..]);
    (Cow::Owned(out), 1)
}

//! JavaScript rewriting.
//!
//! Three independent substitutions, each coupled to the shape the bundler's
//! minifier emits. A shape that is not found leaves the buffer unchanged.
//!
//! | Transform | Expected input shape |
//! |---|---|
//! | origin | `:window.location.origin)` or `:window.location.origin;` |
//! | asset literal | `"/assets/...` (double-quoted string literal) |
//! | asset base function | `function(t){return"/"+t}` (any single identifier) |
//!
//! Applied in that order. The origin patch emits neither `"/assets/` nor a
//! bare `"/"`, and the literal patch never emits `return"/"+`, so no output
//! can feed a later pattern, even with a base path of `/assets`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::pattern::{chain, replace_counted};
use super::script::BASE_PATH_GLOBAL;
use super::{RewriteReport, Rewritten, Transform};

static LOCATION_ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":window\.location\.origin([);])").expect("static origin pattern")
});

static ASSET_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""/assets/"#).expect("static asset literal pattern"));

static ASSET_BASE_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"function\(([A-Za-z_$][A-Za-z0-9_$]*)\)\{return"/"\+([A-Za-z_$][A-Za-z0-9_$]*)\}"#)
        .expect("static asset base function pattern")
});

/// Rewrite a JavaScript bundle for `base_path`, reporting per-transform counts.
pub fn rewrite_js_report<'a>(js: &'a str, base_path: &str) -> Rewritten<'a> {
    if base_path.is_empty() {
        return Rewritten::unchanged(js);
    }

    let mut report = RewriteReport::default();

    let (content, n) = patch_origin(js);
    report.record(Transform::JsOrigin, n);

    let (content, n) = chain(content, |s| patch_asset_literals(s, base_path));
    report.record(Transform::JsAssetLiteral, n);

    let (content, n) = chain(content, |s| patch_asset_base_fn(s, base_path));
    report.record(Transform::JsAssetBaseFn, n);

    Rewritten { content, report }
}

/// Rewrite `js` for `base_path`, discarding the report.
pub fn rewrite_js<'a>(js: &'a str, base_path: &str) -> Cow<'a, str> {
    rewrite_js_report(js, base_path).content
}

/// `:window.location.origin` gains the runtime global; the terminator is kept.
fn patch_origin(js: &str) -> (Cow<'_, str>, usize) {
    replace_counted(&LOCATION_ORIGIN, js, |caps| {
        format!(
            r#":window.location.origin+(window.{BASE_PATH_GLOBAL}||""){}"#,
            &caps[1]
        )
    })
}

fn patch_asset_literals<'a>(js: &'a str, base_path: &str) -> (Cow<'a, str>, usize) {
    replace_counted(&ASSET_LITERAL, js, |_| format!("\"{base_path}/assets/"))
}

/// Only fires when the returned identifier is the parameter itself.
fn patch_asset_base_fn<'a>(js: &'a str, base_path: &str) -> (Cow<'a, str>, usize) {
    let mut count = 0;
    let out = ASSET_BASE_FN.replace_all(js, |caps: &Captures<'_>| {
        if caps[1] != caps[2] {
            return caps[0].to_string();
        }
        count += 1;
        format!(r#"function({p}){{return"{base_path}/"+{p}}}"#, p = &caps[1])
    });
    if count == 0 {
        return (Cow::Borrowed(js), 0);
    }
    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Excerpt of a production bundle: the shapes every transform depends on.
    const BUILD_SAMPLE: &str = concat!(
        r#"const Ks=function(t){return"/"+t},Xs={},"#,
        r#"Qs=function(e,n,r){let s=Promise.resolve();return s.then(()=>e())};"#,
        r#"var Ur=typeof window<"u"?window.__SERVER_URL__??(location.hostname.includes("localhost")?"http://localhost:4096":window.location.origin):"";"#,
        r#"const Fo=new FontFace("Inter","url("+"/assets/inter-latin.woff2"+")"),"#,
        r#"Ha=new Audio("/assets/staplebops-01.aac");"#,
        r#"function Ze(){return globalThis.__X?"":window.location.origin}"#,
    );

    #[test]
    fn test_identity_for_root() {
        let out = rewrite_js_report(BUILD_SAMPLE, "");
        assert!(matches!(out.content, Cow::Borrowed(_)));
        assert_eq!(out.report.total(), 0);
    }

    #[test]
    fn test_build_sample_every_transform_fires() {
        let out = rewrite_js_report(BUILD_SAMPLE, "/sn_admin");
        assert_eq!(out.report.count(Transform::JsOrigin), 1);
        assert_eq!(out.report.count(Transform::JsAssetLiteral), 2);
        assert_eq!(out.report.count(Transform::JsAssetBaseFn), 1);

        assert!(out.content.contains(r#"function(t){return"/sn_admin/"+t}"#));
        assert!(out.content.contains(r#""/sn_admin/assets/inter-latin.woff2""#));
        assert!(out.content.contains(r#"new Audio("/sn_admin/assets/staplebops-01.aac")"#));
        assert!(out
            .content
            .contains(r#":window.location.origin+(window.__OPENCODE_BASE_PATH__||""))"#));
    }

    #[test]
    fn test_origin_with_paren_terminator() {
        let out = rewrite_js(r#"a?b:window.location.origin)"#, "/base");
        assert_eq!(out, r#"a?b:window.location.origin+(window.__OPENCODE_BASE_PATH__||""))"#);
    }

    #[test]
    fn test_origin_with_semicolon_terminator() {
        let out = rewrite_js(r#"x=a?b:window.location.origin;y()"#, "/base");
        assert_eq!(out, r#"x=a?b:window.location.origin+(window.__OPENCODE_BASE_PATH__||"");y()"#);
    }

    #[test]
    fn test_origin_other_terminators_left_alone() {
        // Only `)` and `;` follow the origin expression in known build output.
        let js = "a?b:window.location.origin,c";
        assert_eq!(rewrite_js(js, "/base"), js);
        let js = "return window.location.origin;";
        assert_eq!(rewrite_js(js, "/base"), js);
    }

    #[test]
    fn test_asset_literal() {
        assert_eq!(rewrite_js(r#"f("/assets/font.woff")"#, "/base"), r#"f("/base/assets/font.woff")"#);
    }

    #[test]
    fn test_asset_literal_protocol_relative_untouched() {
        let js = r#"f("//assets/x")"#;
        assert_eq!(rewrite_js(js, "/base"), js);
    }

    #[test]
    fn test_asset_literal_other_quotes_untouched() {
        let js = "f('/assets/x', `/assets/y`)";
        assert_eq!(rewrite_js(js, "/base"), js);
    }

    #[test]
    fn test_asset_base_fn_other_parameter_name() {
        assert_eq!(rewrite_js(r#"function(e){return"/"+e}"#, "/b"), r#"function(e){return"/b/"+e}"#);
    }

    #[test]
    fn test_asset_base_fn_mismatched_identifier_untouched() {
        let js = r#"function(e){return"/"+t}"#;
        let out = rewrite_js_report(js, "/b");
        assert_eq!(out.content, js);
        assert_eq!(out.report.count(Transform::JsAssetBaseFn), 0);
    }

    #[test]
    fn test_unknown_shape_is_a_silent_noop() {
        let js = r#"const base=(p)=>"/"+p;"#;
        let out = rewrite_js_report(js, "/b");
        assert!(matches!(out.content, Cow::Borrowed(_)));
        assert_eq!(out.report.total(), 0);
    }

    #[test]
    fn test_transforms_do_not_interact() {
        // A base path named like the asset directory must not be prefixed twice.
        let js = r#"function(t){return"/"+t};load("/assets/a.js");u=x?y:window.location.origin;"#;
        let out = rewrite_js_report(js, "/assets");
        assert_eq!(
            out.content,
            concat!(
                r#"function(t){return"/assets/"+t};load("/assets/assets/a.js");"#,
                r#"u=x?y:window.location.origin+(window.__OPENCODE_BASE_PATH__||"");"#
            )
        );
        assert_eq!(out.report.count(Transform::JsAssetLiteral), 1);
        assert_eq!(out.report.count(Transform::JsAssetBaseFn), 1);
        assert_eq!(out.report.count(Transform::JsOrigin), 1);
    }

    #[test]
    fn test_single_application_only() {
        // Not idempotent in general: callers must rewrite each asset once.
        let once = rewrite_js(r#""/assets/x""#, "/assets").into_owned();
        assert_eq!(once, r#""/assets/assets/x""#);
        let twice = rewrite_js(&once, "/assets");
        assert_eq!(twice, r#""/assets/assets/assets/x""#);
    }
}

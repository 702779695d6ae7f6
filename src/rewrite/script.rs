//! Client-side navigation patch.
//!
//! The emitted `<script>` publishes the base path on `window` and wraps
//! `history.pushState` / `history.replaceState` so root-absolute URLs pushed
//! by the application land under the prefix. It must run before any
//! application script, which is why the HTML rewriter places it right
//! before `</head>`.

/// Name of the `window` global carrying the base path.
///
/// Other injected scripts and the JS origin patch read it.
pub const BASE_PATH_GLOBAL: &str = "__OPENCODE_BASE_PATH__";

/// Render the navigation patch for `base_path` as a `<script>` element.
///
/// The value is embedded as a JSON string literal, with `</` escaped so a
/// hostile prefix cannot close the script element early.
pub fn generate_script(base_path: &str) -> String {
    let literal = js_string_literal(base_path);
    format!(
        r#"<script>
window.{global}={literal};
(function() {{
  var basePath = window.{global} || "";
  if (!basePath) return;

  var origPushState = history.pushState.bind(history);
  var origReplaceState = history.replaceState.bind(history);

  function addBasePathIfNeeded(url) {{
    if (!url || typeof url !== "string") return url;
    if (url.startsWith("/") && !url.startsWith(basePath)) {{
      return basePath + url;
    }}
    return url;
  }}

  history.pushState = function(state, title, url) {{
    return origPushState(state, title, addBasePathIfNeeded(url));
  }};

  history.replaceState = function(state, title, url) {{
    return origReplaceState(state, title, addBasePathIfNeeded(url));
  }};
}})();
</script>"#,
        global = BASE_PATH_GLOBAL,
    )
}

fn js_string_literal(value: &str) -> String {
    // Serializing a &str cannot fail.
    let quoted = serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""));
    quoted.replace("</", "<\\/")
}

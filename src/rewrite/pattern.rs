//! Counting substitution helpers shared by the rewriters.
//!
//! `regex` has no look-around, so the "not followed by a second `/`" guard
//! is a byte check just past each match. Nothing after the match is consumed,
//! which keeps adjacent matches visible to the scan.

use std::borrow::Cow;

use regex::{Captures, Regex};

/// Replace every match of `re`, counting substitutions.
///
/// Returns the input borrowed when nothing matched.
pub(crate) fn replace_counted<'a, F>(re: &Regex, haystack: &'a str, mut rep: F) -> (Cow<'a, str>, usize)
where
    F: FnMut(&Captures<'_>) -> String,
{
    let mut count = 0;
    let out = re.replace_all(haystack, |caps: &Captures<'_>| {
        count += 1;
        rep(caps)
    });
    (out, count)
}

/// Like [`replace_counted`], but skips matches immediately followed by `/`.
///
/// Skipped matches are copied through unchanged. This is the equivalent of
/// appending `(?!/)` to the pattern.
pub(crate) fn replace_unless_slash_follows<'a, F>(
    re: &Regex,
    haystack: &'a str,
    mut rep: F,
) -> (Cow<'a, str>, usize)
where
    F: FnMut(&Captures<'_>) -> String,
{
    let mut out: Option<String> = None;
    let mut last = 0;
    let mut count = 0;

    for caps in re.captures_iter(haystack) {
        let Some(m) = caps.get(0) else { continue };
        if haystack.as_bytes().get(m.end()) == Some(&b'/') {
            continue;
        }
        let buf = out.get_or_insert_with(|| String::with_capacity(haystack.len() + 64));
        buf.push_str(&haystack[last..m.start()]);
        buf.push_str(&rep(&caps));
        last = m.end();
        count += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&haystack[last..]);
            (Cow::Owned(buf), count)
        }
        None => (Cow::Borrowed(haystack), 0),
    }
}

/// Chain a second transform over the output of a first one without
/// giving up the borrow when neither changed anything.
pub(crate) fn chain<'a, F>(current: Cow<'a, str>, f: F) -> (Cow<'a, str>, usize)
where
    F: for<'b> FnOnce(&'b str) -> (Cow<'b, str>, usize),
{
    match current {
        Cow::Borrowed(s) => f(s),
        Cow::Owned(s) => {
            let (replaced, count) = {
                let (next, count) = f(&s);
                let replaced = match next {
                    Cow::Owned(next) => Some(next),
                    Cow::Borrowed(_) => None,
                };
                (replaced, count)
            };
            (Cow::Owned(replaced.unwrap_or(s)), count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_skips_double_slash() {
        let re = Regex::new(r#"src="/"#).unwrap();
        let (out, n) = replace_unless_slash_follows(&re, r#"src="/a" src="//b""#, |_| r#"src="/p/"#.into());
        assert_eq!(out, r#"src="/p/a" src="//b""#);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_guard_matches_at_end_of_input() {
        let re = Regex::new(r#"src="/"#).unwrap();
        let (out, n) = replace_unless_slash_follows(&re, r#"src="/"#, |_| r#"src="/p/"#.into());
        assert_eq!(out, r#"src="/p/"#);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_no_match_borrows() {
        let re = Regex::new("zzz").unwrap();
        let (out, n) = replace_unless_slash_follows(&re, "abc", |_| String::new());
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(n, 0);

        let (out, n) = replace_counted(&re, "abc", |_| String::new());
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(n, 0);
    }

    #[test]
    fn test_chain_keeps_owned_when_second_is_noop() {
        let re = Regex::new("a").unwrap();
        let (first, _) = replace_counted(&re, "abc", |_| "x".into());
        let (second, n) = chain(first, |s| replace_counted(&Regex::new("zzz").unwrap(), s, |_| String::new()));
        assert_eq!(second, "xbc");
        assert_eq!(n, 0);
    }
}

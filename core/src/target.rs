//! Request target resolution.
//!
//! A target is either an absolute URL, used verbatim, or a path that is joined
//! onto the client's base path. No percent-encoding or validation happens here;
//! a malformed result is reported when the request is constructed.

use crate::error::{Error, Result};

/// Join `target` onto `base_path` unless it already carries a scheme.
///
/// Exactly one slash separates the two halves.
pub fn resolve(base_path: &str, target: &str) -> String {
    if has_scheme(target) {
        return target.to_string();
    }
    let base = base_path.trim_end_matches('/');
    if target.starts_with('/') {
        format!("{base}{target}")
    } else {
        format!("{base}/{target}")
    }
}

/// Rewrite the scheme of an HTTP URL to its websocket counterpart.
///
/// Only the scheme component is touched; `http://host/http-path` becomes
/// `ws://host/http-path`.
pub fn websocket_url(url: &str) -> Result<String> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(Error::UnsupportedScheme(url.to_string()));
    };
    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(Error::UnsupportedScheme(scheme.to_string())),
    };
    Ok(format!("{ws_scheme}://{rest}"))
}

/// True when `target` starts with `scheme://` (RFC 3986 scheme characters).
fn has_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

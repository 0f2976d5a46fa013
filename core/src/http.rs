//! Per-call response values and header plumbing.
//!
//! # Design
//! Each call hands back a `Reply` carrying the status and headers of the
//! response it made, so nothing about "the last response" lives on the client.

use ureq::http::header::{HeaderMap, HeaderName, HeaderValue};
use ureq::http::StatusCode;

use crate::error::{Error, Result};

/// Status, headers and body of a successful (status < 400) response.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

impl<T> Reply<T> {
    /// First value of header `name` as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Replace the body, keeping status and headers.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

/// Append every entry of `defaults` onto `target`.
///
/// Multi-valued headers keep all their values in order; nothing already in
/// `target` is replaced.
pub(crate) fn append_headers(target: &mut HeaderMap, defaults: &HeaderMap) {
    for (name, value) in defaults {
        target.append(name.clone(), value.clone());
    }
}

/// Parse a header pair supplied as strings.
pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::InvalidHeader(format!("{name:?}: {e}")))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_every_value_in_order() {
        let mut defaults = HeaderMap::new();
        defaults.append("x-multi", HeaderValue::from_static("one"));
        defaults.append("x-multi", HeaderValue::from_static("two"));
        defaults.append("authorization", HeaderValue::from_static("Bearer t"));

        let mut target = HeaderMap::new();
        target.append("x-multi", HeaderValue::from_static("zero"));
        append_headers(&mut target, &defaults);

        let values: Vec<_> = target.get_all("x-multi").iter().collect();
        assert_eq!(values, ["zero", "one", "two"]);
        assert_eq!(target["authorization"], "Bearer t");
    }

    #[test]
    fn parse_header_rejects_bad_names() {
        assert!(parse_header("x-ok", "v").is_ok());
        assert!(matches!(
            parse_header("bad name", "v"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            parse_header("x-bad", "line\nbreak"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn reply_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-some", HeaderValue::from_static("HEAD"));
        let reply = Reply {
            status: StatusCode::OK,
            headers,
            body: (),
        };
        assert_eq!(reply.header("X-SOME"), Some("HEAD"));
        assert_eq!(reply.map(|_| 7).body, 7);
    }
}

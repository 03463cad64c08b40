//! The immutable request value produced by the transaction bridge.

use bytes::Bytes;

use super::{Headers, Method};

/// A fully materialized, read-only HTTP request.
///
/// Built by [`bridge::adapt`](crate::bridge::adapt) from a streaming
/// transaction: the URL is absolute (scheme, host, path and query), the
/// header multimap preserves repetition and insertion order, and the body —
/// present only for methods other than GET/HEAD — is one contiguous byte
/// sequence buffered from the inbound stream. Once constructed, nothing
/// about it changes; handlers may clone it freely and share it across tasks.
///
/// # Examples
///
/// ```
/// use spahost::http::{Headers, Method, Request};
///
/// let request = Request::new(
///     Method::Get,
///     "http://example.com/shop/cart?tab=saved",
///     Headers::new(),
///     None,
/// );
/// assert_eq!(request.host(), Some("example.com"));
/// assert_eq!(request.path(), "/shop/cart");
/// assert_eq!(request.query(), Some("tab=saved"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: Headers,
    body: Option<Bytes>,
}

impl Request {
    /// Assembles a request value. `url` must be absolute
    /// (`scheme://host/path?query`); the adapter guarantees this shape.
    pub fn new(
        method: Method,
        url: impl Into<String>,
        headers: Headers,
        body: Option<Bytes>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            headers,
            body,
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute URL string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the buffered request body, `None` for bodyless methods.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the URL scheme (`http` or `https` in practice).
    pub fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Returns the authority portion of the URL (host, possibly with port).
    pub fn host(&self) -> Option<&str> {
        let rest = self.url.split_once("://")?.1;
        Some(rest.split(['/', '?']).next().unwrap_or(rest))
    }

    /// Returns the URL path without the query string, `/` when the URL has
    /// no path component.
    pub fn path(&self) -> &str {
        let rest = match self.url.split_once("://") {
            Some((_, rest)) => rest,
            None => &self.url,
        };
        match rest.find('/') {
            Some(start) => {
                let path = &rest[start..];
                match path.find('?') {
                    Some(end) => &path[..end],
                    None => path,
                }
            }
            None => "/",
        }
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, q)| q)
    }
}

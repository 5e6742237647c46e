//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method};

/// Path arguments extracted by the router, by placeholder name.
pub type PathArgs = HashMap<String, String>;

/// An incoming HTTP request with its body fully read.
///
/// Middleware receives the request by value and hands it on to the next step,
/// so it can rewrite headers or stash data in [`extensions`](Self::extensions)
/// for the action.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: PathArgs,
    extensions: Extensions,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: PathArgs::new(),
            extensions: Extensions::new(),
        }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes, params: PathArgs) -> Self {
        Self {
            path: parts.uri.path().to_owned(),
            method: parts.method,
            headers: parts.headers,
            body,
            params,
            extensions: parts.extensions,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Header lookup; names are case-insensitive. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &PathArgs { &self.params }

    pub(crate) fn set_params(&mut self, params: PathArgs) {
        self.params = params;
    }
}

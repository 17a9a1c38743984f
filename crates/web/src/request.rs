//! Request-side view over what the transport already parsed.
//!
//! This module contains:
//! - `Scope`: method, target, version, raw header pairs and server address of
//!   one request, as handed over by the transport
//! - `Request`: read access to a scope, with lazily built headers and url
//!
//! Reading the body off the connection stays with the transport; a body that
//! has already been collected can be attached with [`Request::with_body`].

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use cilantro_http::protocol::{HeaderLookup, Headers, RawHeader};
use http::request::Parts;
use http::{Method, Version};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::RequestError;

/// Upper bound on header lines accepted by [`Scope::parse`].
const MAX_HEADERS: usize = 64;

const DEFAULT_SCHEME: &str = "http";

/// Everything known about a request before its body is read.
#[derive(Debug, Clone)]
pub struct Scope {
    pub method: Method,
    /// `None` means plain `http`.
    pub scheme: Option<String>,
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query_string: Bytes,
    pub headers: Vec<RawHeader>,
    /// Host and port the server is listening on, when known.
    pub server: Option<(String, u16)>,
    pub http_version: Version,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            method: Method::GET,
            scheme: None,
            path: "/".to_owned(),
            query_string: Bytes::new(),
            headers: Vec::new(),
            server: None,
            http_version: Version::HTTP_11,
        }
    }
}

impl Scope {
    /// Parses a complete HTTP/1.x request head (request line, headers and the
    /// terminating empty line).
    ///
    /// # Errors
    ///
    /// Fails when the head is malformed, incomplete, has more than 64 headers,
    /// or names a method `http` does not accept.
    pub fn parse(buf: &[u8]) -> Result<Self, RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        if req.parse(buf).map_err(RequestError::invalid_head)?.is_partial() {
            return Err(RequestError::invalid_head("incomplete request head"));
        }

        let (Some(method), Some(target), Some(version)) = (req.method, req.path, req.version) else {
            return Err(RequestError::invalid_head("incomplete request line"));
        };
        let (path, query) = target.split_once('?').unwrap_or((target, ""));

        let headers: Vec<RawHeader> = req
            .headers
            .iter()
            .map(|header| (Bytes::copy_from_slice(header.name.as_bytes()), Bytes::copy_from_slice(header.value)))
            .collect();
        trace!(method, path, headers = headers.len(), "parsed request head");

        Ok(Self {
            method: Method::from_bytes(method.as_bytes())?,
            scheme: None,
            path: path.to_owned(),
            query_string: Bytes::copy_from_slice(query.as_bytes()),
            headers,
            server: None,
            http_version: http_version(version),
        })
    }
}

/// Converts the parts of an `http::Request` into a scope; an absolute uri
/// supplies the scheme and the server address.
impl From<Parts> for Scope {
    fn from(parts: Parts) -> Self {
        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| (Bytes::copy_from_slice(name.as_str().as_bytes()), Bytes::copy_from_slice(value.as_bytes())))
            .collect();

        let scheme = parts.uri.scheme_str().map(str::to_owned);
        let default_port = if scheme.as_deref() == Some("https") { 443 } else { 80 };
        let server = parts.uri.host().map(|host| (host.to_owned(), parts.uri.port_u16().unwrap_or(default_port)));

        Self {
            method: parts.method,
            scheme,
            path: parts.uri.path().to_owned(),
            query_string: parts.uri.query().map(|query| Bytes::copy_from_slice(query.as_bytes())).unwrap_or_default(),
            headers,
            server,
            http_version: parts.version,
        }
    }
}

fn http_version(minor: u8) -> Version {
    match minor {
        1 => Version::HTTP_11,
        0 => Version::HTTP_10,
        _ => Version::HTTP_09,
    }
}

#[derive(Debug)]
struct Components {
    url: String,
    scheme: String,
}

/// A request: its scope, plus an optional body collected by the transport.
///
/// Two requests are equal only when they are the same object.
#[derive(Debug)]
pub struct Request {
    scope: Scope,
    headers: OnceCell<Headers>,
    components: OnceCell<Components>,
    body: Option<Bytes>,
}

impl Request {
    pub fn new(scope: Scope) -> Self {
        Self { scope, headers: OnceCell::new(), components: OnceCell::new(), body: None }
    }

    /// Attaches the already collected request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        trace!(len = body.len(), "request body attached");
        self.body = Some(body);
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn method(&self) -> &Method {
        &self.scope.method
    }

    pub fn http_version(&self) -> Version {
        self.scope.http_version
    }

    /// The request headers, built from the scope on first access.
    pub fn headers(&self) -> &Headers {
        self.headers.get_or_init(|| Headers::new(self.scope.headers.clone()))
    }

    /// The full request url.
    ///
    /// The authority comes from the `host` header, else from the server
    /// address (dropping port 80 and 443); with neither, the url is just the
    /// path and query.
    pub fn url(&self) -> &str {
        &self.components().url
    }

    /// Lower-cased scheme of [`Request::url`]; empty when the url has no authority.
    pub fn scheme(&self) -> &str {
        &self.components().scheme
    }

    pub fn path(&self) -> &str {
        &self.scope.path
    }

    pub fn query_string(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.scope.query_string)
    }

    /// Query parameters grouped by name, in first-seen order. Parameters with
    /// a blank value are left out.
    ///
    /// # Errors
    ///
    /// Fails when the query string can not be decoded.
    pub fn query_params(&self) -> Result<IndexMap<String, Vec<String>>, RequestError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.scope.query_string)?;

        let mut params: IndexMap<String, Vec<String>> = IndexMap::with_capacity(pairs.len());
        for (name, value) in pairs.into_iter().filter(|(_, value)| !value.is_empty()) {
            params.entry(name).or_default().push(value);
        }
        Ok(params)
    }

    /// The attached body.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingBody`] when no body was attached.
    pub fn body(&self) -> Result<&Bytes, RequestError> {
        self.body.as_ref().ok_or(RequestError::MissingBody)
    }

    /// Deserializes the attached body as JSON.
    ///
    /// # Errors
    ///
    /// Fails when no body was attached or the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(self.body()?)?)
    }

    fn components(&self) -> &Components {
        self.components.get_or_init(|| {
            let (mut url, scheme) = match self.authority() {
                Some(authority) => {
                    let scheme = self.scope.scheme.as_deref().unwrap_or(DEFAULT_SCHEME).to_ascii_lowercase();
                    (format!("{scheme}://{authority}{}", self.scope.path), scheme)
                }
                None => (self.scope.path.clone(), String::new()),
            };

            let query = self.query_string();
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
            Components { url, scheme }
        })
    }

    fn authority(&self) -> Option<String> {
        if let Some(host) = self.headers().get("host").filter(|host| !host.is_empty()) {
            return Some(host.to_owned());
        }

        let (host, port) = self.scope.server.as_ref()?;
        Some(if matches!(*port, 80 | 443) { host.clone() } else { format!("{host}:{port}") })
    }
}

impl From<Scope> for Request {
    fn from(scope: Scope) -> Self {
        Self::new(scope)
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Request {}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request(\"{}\")", self.url())
    }
}

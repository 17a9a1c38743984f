//! Response assembly from heterogeneous content.
//!
//! [`response`] turns a [`Content`] value and [`ResponseOptions`] into a
//! [`RawResponse`]: the status, the header pairs to write and the body bytes.
//!
//! Header policy, applied on top of the seed headers in the options:
//!
//! - a redirect status (`3xx`) requires text content, which becomes the
//!   percent-encoded `location` header; the body is then empty
//! - JSON content sets `content-type: application/json`
//! - non-empty bytes or text set `content-type: {content_type}; charset={charset}`
//! - empty or absent content sets no `content-type`
//! - every status from 200 up, except 204 and 304, gets a `content-length`
//!   unless the seed headers already carry one
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use cilantro_http::protocol::{response, ResponseOptions};
//!
//! let response = response("Hello world!", ResponseOptions::default()).unwrap();
//!
//! assert_eq!(response.status, 200);
//! assert_eq!(
//!     response.headers,
//!     vec![
//!         (Bytes::from("content-type"), Bytes::from("text/plain; charset=utf-8")),
//!         (Bytes::from("content-length"), Bytes::from("12")),
//!     ]
//! );
//! assert_eq!(response.body, "Hello world!");
//! ```

use bytes::Bytes;
use http::{StatusCode, header};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::protocol::headers::{HeaderLookup, MutableHeaders, RawHeader};
use crate::protocol::{ResponseError, charset, json};

/// Characters left as-is when percent-encoding a redirect target.
const LOCATION_SAFE: &[char] = &[':', '/', '%', '#', '?', '='];

/// The body content handed to [`response`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Absent,
    Bytes(Bytes),
    Text(String),
    Json(Map<String, Value>),
}

impl Content {
    /// Serializes `value` into [`Content::Json`].
    ///
    /// # Errors
    ///
    /// Fails when `value` can not be serialized, or does not serialize to a
    /// JSON object.
    pub fn json<T>(value: &T) -> Result<Self, ResponseError>
    where
        T: ?Sized + Serialize,
    {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self::Json(map)),
            _ => Err(ResponseError::NotAnObject),
        }
    }

    /// Non-empty bytes or text.
    fn has_payload(&self) -> bool {
        match self {
            Content::Bytes(bytes) => !bytes.is_empty(),
            Content::Text(text) => !text.is_empty(),
            Content::Json(_) | Content::Absent => false,
        }
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Content {
    fn from(bytes: &'static [u8]) -> Self {
        Content::Bytes(Bytes::from_static(bytes))
    }
}

impl<const N: usize> From<&'static [u8; N]> for Content {
    fn from(bytes: &'static [u8; N]) -> Self {
        Content::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_owned())
    }
}

impl From<Map<String, Value>> for Content {
    fn from(map: Map<String, Value>) -> Self {
        Content::Json(map)
    }
}

impl From<()> for Content {
    fn from((): ()) -> Self {
        Content::Absent
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(option: Option<T>) -> Self {
        option.map_or(Content::Absent, Into::into)
    }
}

/// Settings for [`response`]; every field has the default listed on its setter.
#[derive(Debug, Clone)]
pub struct ResponseOptions {
    content_type: String,
    status: StatusCode,
    headers: IndexMap<String, String>,
    charset: String,
}

impl Default for ResponseOptions {
    fn default() -> Self {
        Self {
            content_type: mime::TEXT_PLAIN.to_string(),
            status: StatusCode::OK,
            headers: IndexMap::new(),
            charset: mime::UTF_8.as_str().to_owned(),
        }
    }
}

impl ResponseOptions {
    /// Media type used for bytes and text content, `text/plain` by default.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Response status, `200 OK` by default.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Adds one seed header. Seed headers come first in the output, in the
    /// order they were added.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds several seed headers, see [`ResponseOptions::header`].
    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Charset for text and JSON bodies, `utf-8` by default.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }
}

/// The assembled response: status, header pairs in write order, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: Vec<RawHeader>,
    pub body: Bytes,
}

impl RawResponse {
    /// Converts into an `http::Response`, keeping header order.
    ///
    /// # Errors
    ///
    /// Fails when a header name or value is not valid for `http`.
    pub fn into_http(self) -> Result<http::Response<Bytes>, ResponseError> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(&name[..], &value[..]);
        }
        Ok(builder.body(self.body)?)
    }
}

/// Builds a [`RawResponse`] from `content`.
///
/// # Errors
///
/// - [`ResponseError::InvalidRedirectContent`] for a `3xx` status with
///   anything but text content; nothing else has happened at that point
/// - [`ResponseError::UnknownCharset`] or [`ResponseError::UnencodableContent`]
///   when text or JSON can not be encoded with the configured charset
/// - [`ResponseError::Json`] when JSON content fails to serialize
pub fn response(content: impl Into<Content>, options: ResponseOptions) -> Result<RawResponse, ResponseError> {
    let ResponseOptions { content_type, status, mut headers, charset } = options;
    let mut content = content.into();

    if status.is_redirection() {
        let Content::Text(target) = content else {
            return Err(ResponseError::invalid_redirect_content(status));
        };
        let location = encode_location(&target);
        debug!(status = status.as_u16(), location = %location, "redirect response");
        assign(&mut headers, header::LOCATION.as_str(), location);
        content = Content::Text(String::new());
    }

    let has_payload = content.has_payload();
    let is_json = matches!(content, Content::Json(_));

    let body = match content {
        Content::Bytes(bytes) => bytes,
        Content::Text(text) => charset::encode(text, &charset)?,
        Content::Json(map) => charset::encode(json::to_string(&map)?, &charset)?,
        Content::Absent => Bytes::new(),
    };

    if is_json {
        assign(&mut headers, header::CONTENT_TYPE.as_str(), mime::APPLICATION_JSON.to_string());
    } else if has_payload {
        assign(&mut headers, header::CONTENT_TYPE.as_str(), format!("{content_type}; charset={charset}"));
    }

    if carries_length(status) {
        let seeded = headers.keys().any(|name| name.eq_ignore_ascii_case(header::CONTENT_LENGTH.as_str()));
        if seeded {
            debug!("content-length taken from seed headers");
        } else {
            headers.insert(header::CONTENT_LENGTH.as_str().to_owned(), body.len().to_string());
        }
    }

    let headers = MutableHeaders::from(headers);
    debug!(status = status.as_u16(), headers = headers.len(), body_len = body.len(), "response assembled");

    Ok(RawResponse { status, headers: headers.into_raw(), body })
}

/// 1xx, 204 and 304 responses never carry a content-length.
#[inline]
fn carries_length(status: StatusCode) -> bool {
    status.as_u16() >= 200 && !matches!(status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED)
}

/// Overwrites the header named `name` in place (ignoring case), or appends it.
fn assign(headers: &mut IndexMap<String, String>, name: &str, value: String) {
    match headers.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
        Some((_, slot)) => *slot = value,
        None => {
            headers.insert(name.to_owned(), value);
        }
    }
}

fn encode_location(target: &str) -> String {
    let mut encoded = String::with_capacity(target.len());
    let mut rest = target;
    while let Some(index) = rest.find(LOCATION_SAFE) {
        encoded.push_str(&urlencoding::encode(&rest[..index]));
        // safe characters are all single-byte
        encoded.push_str(&rest[index..=index]);
        rest = &rest[index + 1..];
    }
    encoded.push_str(&urlencoding::encode(rest));
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(name: &'static str, value: &'static str) -> RawHeader {
        (Bytes::from_static(name.as_bytes()), Bytes::from_static(value.as_bytes()))
    }

    fn redirect(status: StatusCode) -> ResponseOptions {
        ResponseOptions::default().status(status)
    }

    #[test]
    fn absent_content() {
        let response = response(None::<String>, ResponseOptions::default()).unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers, vec![pair("content-length", "0")]);
        assert!(response.body.is_empty());
    }

    #[test]
    fn bytes_content() {
        let response = response(b"Hello world!", ResponseOptions::default()).unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers,
            vec![pair("content-type", "text/plain; charset=utf-8"), pair("content-length", "12")]
        );
        assert_eq!(response.body, Bytes::from_static(b"Hello world!"));
    }

    #[test]
    fn text_content() {
        let options = ResponseOptions::default().content_type(mime::TEXT_HTML.as_ref());
        let response = response("<p>hé</p>".to_string(), options).unwrap();

        assert_eq!(
            response.headers,
            vec![pair("content-type", "text/html; charset=utf-8"), pair("content-length", "10")]
        );
        assert_eq!(response.body, "<p>hé</p>".as_bytes());
    }

    #[test]
    fn json_content() {
        let content = Content::json(&json!({"message": "Hello world!"})).unwrap();
        let response = response(content, ResponseOptions::default()).unwrap();

        assert_eq!(response.headers, vec![pair("content-type", "application/json"), pair("content-length", "27")]);
        assert_eq!(response.body, Bytes::from_static(br#"{"message": "Hello world!"}"#));
    }

    #[test]
    fn json_content_ignores_charset_in_content_type() {
        let content = Content::json(&json!({"name": "café"})).unwrap();
        let response = response(content, ResponseOptions::default().charset("latin1")).unwrap();

        assert_eq!(response.headers[0], pair("content-type", "application/json"));
        assert_eq!(&response.body[..], &b"{\"name\": \"caf\xE9\"}"[..]);
    }

    #[test]
    fn json_from_struct() {
        #[derive(Serialize)]
        struct Greeting<'a> {
            message: &'a str,
            count: u32,
        }

        let content = Content::json(&Greeting { message: "hi", count: 2 }).unwrap();
        let response = response(content, ResponseOptions::default()).unwrap();

        assert_eq!(response.body, Bytes::from_static(br#"{"message": "hi", "count": 2}"#));
    }

    #[test]
    fn json_must_be_an_object() {
        assert!(matches!(Content::json(&[1, 2, 3]), Err(ResponseError::NotAnObject)));
        assert!(matches!(Content::json("text"), Err(ResponseError::NotAnObject)));
    }

    #[test]
    fn empty_json_object_still_sets_content_type() {
        let response = response(Map::new(), ResponseOptions::default()).unwrap();

        assert_eq!(response.headers, vec![pair("content-type", "application/json"), pair("content-length", "2")]);
        assert_eq!(response.body, Bytes::from_static(b"{}"));
    }

    #[test]
    fn empty_text_has_no_content_type() {
        let response = response("", ResponseOptions::default()).unwrap();

        assert_eq!(response.headers, vec![pair("content-length", "0")]);
    }

    #[test]
    fn permanent_redirect() {
        let response = response("https://example.com", redirect(StatusCode::PERMANENT_REDIRECT)).unwrap();

        assert_eq!(response.status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers, vec![pair("location", "https://example.com"), pair("content-length", "0")]);
        assert!(response.body.is_empty());
    }

    #[test]
    fn redirect_location_is_percent_encoded() {
        let response = response("https://example.com/a b/é?x=1&y=[2]#top", redirect(StatusCode::FOUND)).unwrap();

        assert_eq!(response.headers[0], pair("location", "https://example.com/a%20b/%C3%A9?x=1%26y=%5B2%5D#top"));
    }

    #[test]
    fn redirect_keeps_existing_escapes() {
        let response = response("/search?q=a%20b", redirect(StatusCode::SEE_OTHER)).unwrap();

        assert_eq!(response.headers[0], pair("location", "/search?q=a%20b"));
    }

    #[test]
    fn redirect_requires_text() {
        let result = response(b"x", redirect(StatusCode::PERMANENT_REDIRECT));
        assert!(matches!(
            result,
            Err(ResponseError::InvalidRedirectContent { status }) if status == StatusCode::PERMANENT_REDIRECT
        ));

        let result = response(None::<String>, redirect(StatusCode::MOVED_PERMANENTLY));
        assert!(matches!(result, Err(ResponseError::InvalidRedirectContent { .. })));

        let content = Content::json(&json!({"to": "/"})).unwrap();
        assert!(matches!(response(content, redirect(StatusCode::FOUND)), Err(ResponseError::InvalidRedirectContent { .. })));
    }

    #[test]
    fn redirect_replaces_seeded_location() {
        let options = redirect(StatusCode::FOUND).header("Location", "/old");
        let response = response("/new", options).unwrap();

        assert_eq!(response.headers, vec![pair("Location", "/new"), pair("content-length", "0")]);
    }

    #[test]
    fn no_content_has_no_length() {
        let response = response(None::<String>, ResponseOptions::default().status(StatusCode::NO_CONTENT)).unwrap();

        assert!(response.headers.is_empty());
        assert!(response.body.is_empty());
    }

    #[test]
    fn not_modified_has_no_length() {
        let response = response("/cached", redirect(StatusCode::NOT_MODIFIED)).unwrap();

        assert_eq!(response.headers, vec![pair("location", "/cached")]);
    }

    #[test]
    fn informational_has_no_length() {
        let response = response(None::<String>, ResponseOptions::default().status(StatusCode::CONTINUE)).unwrap();

        assert!(response.headers.is_empty());
    }

    #[test]
    fn seeded_content_length_wins() {
        let options = ResponseOptions::default().header("Content-Length", "100");
        let response = response("abc", options).unwrap();

        assert_eq!(
            response.headers,
            vec![pair("Content-Length", "100"), pair("content-type", "text/plain; charset=utf-8")]
        );
    }

    #[test]
    fn seeded_content_type_kept_for_empty_content() {
        let options = ResponseOptions::default().headers([("content-type", "text/csv"), ("x-request-id", "42")]);
        let response = response(None::<String>, options).unwrap();

        assert_eq!(
            response.headers,
            vec![pair("content-type", "text/csv"), pair("x-request-id", "42"), pair("content-length", "0")]
        );
    }

    #[test]
    fn charset_is_applied_to_text() {
        let response = response("café", ResponseOptions::default().charset("iso-8859-1")).unwrap();

        assert_eq!(response.headers[0], pair("content-type", "text/plain; charset=iso-8859-1"));
        assert_eq!(response.headers[1], pair("content-length", "4"));
        assert_eq!(&response.body[..], &b"caf\xE9"[..]);
    }

    #[test]
    fn unknown_charset_fails() {
        let result = response("hello", ResponseOptions::default().charset("klingon"));
        assert!(matches!(result, Err(ResponseError::UnknownCharset { .. })));
    }

    #[test]
    fn bytes_ignore_charset() {
        let response = response(vec![0xFF, 0x00], ResponseOptions::default().charset("klingon")).unwrap();

        assert_eq!(response.body, Bytes::from_static(&[0xFF, 0x00]));
    }

    #[test]
    fn into_http_response() {
        let response = response("Hello world!", ResponseOptions::default().header("X-Trace", "abc"))
            .unwrap()
            .into_http()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-trace").unwrap(), "abc");
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "12");
        assert_eq!(response.body(), &Bytes::from_static(b"Hello world!"));
    }

    #[test]
    fn into_http_rejects_bad_header_name() {
        let raw = RawResponse {
            status: StatusCode::OK,
            headers: vec![pair("bad header", "x")],
            body: Bytes::new(),
        };

        assert!(matches!(raw.into_http(), Err(ResponseError::Http { .. })));
    }
}

//! Case-insensitive HTTP headers and response assembly.
//!
//! This crate holds the protocol core of the cilantro toolkit. It does no
//! I/O: the surrounding server hands it the header pairs it already parsed
//! and writes out whatever [`protocol::response`] produces.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use cilantro_http::protocol::{response, Content, HeaderLookup, Headers, ResponseOptions};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let headers = Headers::new(vec![
//!     (Bytes::from_static(b"Host"), Bytes::from_static(b"LocalHost")),
//!     (Bytes::from_static(b"Accept"), Bytes::from_static(b"application/json")),
//! ]);
//! assert_eq!(headers.get("host"), Some("localhost"));
//!
//! let content = Content::json(&json!({"message": "Hello world!"})).unwrap();
//! let reply = response(content, ResponseOptions::default()).unwrap();
//! assert_eq!(reply.body, Bytes::from_static(br#"{"message": "Hello world!"}"#));
//!
//! let redirect = response("https://example.com", ResponseOptions::default().status(StatusCode::PERMANENT_REDIRECT));
//! assert_eq!(redirect.unwrap().headers[0].1, "https://example.com");
//! ```
//!
//! # Architecture
//!
//! - [`protocol::headers`]: [`protocol::Headers`] and [`protocol::MutableHeaders`],
//!   both read through [`protocol::HeaderLookup`]
//! - [`protocol::response`](protocol::response()): builds a [`protocol::RawResponse`]
//!   from [`protocol::Content`] and [`protocol::ResponseOptions`]
//!
//! # Logging
//!
//! Decisions made while normalizing headers and assembling responses are
//! emitted as `tracing` events at `trace` and `debug` level. The crate never
//! installs a subscriber itself.

pub mod protocol;

mod utils;
pub(crate) use utils::ensure;

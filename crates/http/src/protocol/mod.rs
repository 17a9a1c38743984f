//! Header stores and response assembly.
//!
//! # Architecture
//!
//! - **Headers** ([`headers`]): case-insensitive multi-value header stores
//!   - [`HeaderLookup`]: read interface shared by both stores
//!   - [`Headers`]: immutable store
//!   - [`MutableHeaders`]: store with `set`, `append`, `delete` and `pop`
//!
//! - **Response** ([`response()`]): response assembly
//!   - [`Content`]: the body content, by kind
//!   - [`ResponseOptions`]: content type, status, seed headers and charset
//!   - [`RawResponse`]: status, header pairs and body bytes
//!
//! - **Error Handling** ([`error`]):
//!   - [`HeaderError`]: indexed access to a missing header
//!   - [`ResponseError`]: response assembly errors

pub mod headers;
pub use headers::HeaderLookup;
pub use headers::HeaderTable;
pub use headers::Headers;
pub use headers::MutableHeaders;
pub use headers::RawHeader;

mod response;
pub use response::Content;
pub use response::RawResponse;
pub use response::ResponseOptions;
pub use response::response;

mod error;
pub use error::HeaderError;
pub use error::ResponseError;

mod charset;
mod json;

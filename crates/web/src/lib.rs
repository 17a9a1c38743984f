//! Request-side glue for the cilantro toolkit.
//!
//! - [`Scope`] and [`Request`]: a read-only view of one request as handed over
//!   by the transport, with headers from [`cilantro_http::protocol::Headers`]
//! - [`logging`]: opt-in `tracing` output controlled by `CILANTRO_LOG`
//!
//! Responses are built with [`cilantro_http::protocol::response()`].

mod error;
mod request;

pub mod logging;

pub use error::RequestError;
pub use request::Request;
pub use request::Scope;

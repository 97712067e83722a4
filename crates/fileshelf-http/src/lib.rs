//! # fileshelf-http
//!
//! HTTP primitives shared by every fileshelf crate: the buffered [`Request`],
//! the [`Response`] builder (buffered or streaming body), the [`Handler`] and
//! [`Middleware`] traits with [`MiddlewareChain`], the [`Error`] taxonomy,
//! and the security header set in [`security`].

pub mod exception;
pub mod middleware;
pub mod request;
pub mod response;
pub mod security;

pub use exception::{Error, Result};
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::Request;
pub use response::{Response, StreamBody};

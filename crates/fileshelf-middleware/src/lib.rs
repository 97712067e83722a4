//! # fileshelf-middleware
//!
//! Middleware wrapped around the fileshelf router:
//!
//! - [`LoggingMiddleware`] - one structured log line per request
//! - [`SecurityHeadersMiddleware`] - security headers on every response

pub mod logging;
pub mod security;

pub use fileshelf_http::{Handler, Middleware, MiddlewareChain};
pub use logging::LoggingMiddleware;
pub use security::{SecurityConfig, SecurityHeadersMiddleware};

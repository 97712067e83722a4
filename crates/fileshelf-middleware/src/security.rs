//! Security header middleware
//!
//! Adds to every response, errors included:
//! - X-Content-Type-Options
//! - X-Frame-Options
//! - Content-Security-Policy
//! - Strict-Transport-Security (TLS connections only, off by default)
//!
//! Headers a handler already set are left alone.

use async_trait::async_trait;
use fileshelf_http::security::{CSP_SELF, FRAME_DENY};
use fileshelf_http::{Handler, Middleware, Request, Response, Result};
use hyper::HeaderMap;
use hyper::header::{
	CONTENT_SECURITY_POLICY, HeaderName, HeaderValue, STRICT_TRANSPORT_SECURITY,
	X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use std::sync::Arc;

/// Security middleware configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
	/// Set X-Content-Type-Options: nosniff
	pub content_type_nosniff: bool,
	/// X-Frame-Options value
	pub frame_options: Option<String>,
	/// Content-Security-Policy value
	pub content_security_policy: Option<String>,
	/// Enable HSTS on TLS connections
	pub hsts_enabled: bool,
	/// HSTS max-age in seconds
	pub hsts_seconds: u32,
}

impl Default for SecurityConfig {
	fn default() -> Self {
		Self {
			content_type_nosniff: true,
			frame_options: Some(FRAME_DENY.to_string()),
			content_security_policy: Some(CSP_SELF.to_string()),
			hsts_enabled: false,
			hsts_seconds: 31536000, // 1 year
		}
	}
}

/// Middleware adding security headers to every response
pub struct SecurityHeadersMiddleware {
	config: SecurityConfig,
}

impl SecurityHeadersMiddleware {
	/// Create a new SecurityHeadersMiddleware with default configuration
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use fileshelf_middleware::SecurityHeadersMiddleware;
	/// use fileshelf_http::{Handler, Middleware, Request, Response};
	/// use hyper::StatusCode;
	///
	/// struct TestHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for TestHandler {
	///     async fn handle(&self, _request: Request) -> fileshelf_http::Result<Response> {
	///         Ok(Response::new(StatusCode::OK))
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let middleware = SecurityHeadersMiddleware::new();
	/// let response = middleware
	///     .process(Request::get("/"), Arc::new(TestHandler))
	///     .await
	///     .unwrap();
	/// assert_eq!(response.headers.get("X-Content-Type-Options").unwrap(), "nosniff");
	/// assert_eq!(response.headers.get("X-Frame-Options").unwrap(), "DENY");
	/// # });
	/// ```
	pub fn new() -> Self {
		Self {
			config: SecurityConfig::default(),
		}
	}

	/// Create a new SecurityHeadersMiddleware with custom configuration
	pub fn with_config(config: SecurityConfig) -> Self {
		Self { config }
	}

	fn add_security_headers(&self, headers: &mut HeaderMap, is_secure: bool) {
		if self.config.content_type_nosniff {
			insert_missing(headers, X_CONTENT_TYPE_OPTIONS, "nosniff");
		}

		if let Some(ref value) = self.config.frame_options {
			insert_missing(headers, X_FRAME_OPTIONS, value);
		}

		if let Some(ref value) = self.config.content_security_policy {
			insert_missing(headers, CONTENT_SECURITY_POLICY, value);
		}

		if self.config.hsts_enabled && is_secure {
			let value = format!("max-age={}", self.config.hsts_seconds);
			insert_missing(headers, STRICT_TRANSPORT_SECURITY, &value);
		}
	}
}

impl Default for SecurityHeadersMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

fn insert_missing(headers: &mut HeaderMap, name: HeaderName, value: &str) {
	if headers.contains_key(&name) {
		return;
	}
	match HeaderValue::from_str(value) {
		Ok(value) => {
			headers.insert(name, value);
		}
		Err(_) => tracing::warn!(header = %name, "skipping invalid security header value"),
	}
}

#[async_trait]
impl Middleware for SecurityHeadersMiddleware {
	async fn process(&self, request: Request, handler: Arc<dyn Handler>) -> Result<Response> {
		let is_secure = request.is_secure;

		// Errors become responses here so they carry the headers too.
		let mut response = match handler.handle(request).await {
			Ok(response) => response,
			Err(err) => Response::from(err),
		};

		self.add_security_headers(&mut response.headers, is_secure);
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;
	use fileshelf_http::Error;
	use hyper::StatusCode;
	use rstest::rstest;

	struct TestHandler;

	#[async_trait]
	impl Handler for TestHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::new(StatusCode::OK).with_body(Bytes::from("content")))
		}
	}

	struct FramingHandler;

	#[async_trait]
	impl Handler for FramingHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_header("X-Frame-Options", "SAMEORIGIN"))
		}
	}

	struct ErrorHandler;

	#[async_trait]
	impl Handler for ErrorHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err(Error::not_found())
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_default_headers() {
		let middleware = SecurityHeadersMiddleware::new();
		let response = middleware
			.process(Request::get("/"), Arc::new(TestHandler))
			.await
			.unwrap();

		assert_eq!(response.headers.get("X-Content-Type-Options").unwrap(), "nosniff");
		assert_eq!(response.headers.get("X-Frame-Options").unwrap(), "DENY");
		assert_eq!(
			response.headers.get("Content-Security-Policy").unwrap(),
			"default-src 'self'"
		);
		assert!(!response.headers.contains_key("Strict-Transport-Security"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_existing_header_is_kept() {
		let middleware = SecurityHeadersMiddleware::new();
		let response = middleware
			.process(Request::get("/"), Arc::new(FramingHandler))
			.await
			.unwrap();

		assert_eq!(response.headers.get("X-Frame-Options").unwrap(), "SAMEORIGIN");
	}

	#[rstest]
	#[tokio::test]
	async fn test_errors_get_headers() {
		let middleware = SecurityHeadersMiddleware::new();
		let response = middleware
			.process(Request::get("/missing"), Arc::new(ErrorHandler))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert_eq!(response.headers.get("X-Content-Type-Options").unwrap(), "nosniff");
	}

	#[rstest]
	#[case(true, true)]
	#[case(false, false)]
	#[tokio::test]
	async fn test_hsts_only_on_tls(#[case] secure: bool, #[case] expected: bool) {
		let config = SecurityConfig {
			hsts_enabled: true,
			..SecurityConfig::default()
		};
		let middleware = SecurityHeadersMiddleware::with_config(config);
		let response = middleware
			.process(Request::get("/").with_secure(secure), Arc::new(TestHandler))
			.await
			.unwrap();

		assert_eq!(
			response.headers.contains_key("Strict-Transport-Security"),
			expected
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_disabled_headers_are_not_added() {
		let config = SecurityConfig {
			content_type_nosniff: false,
			frame_options: None,
			content_security_policy: None,
			..SecurityConfig::default()
		};
		let middleware = SecurityHeadersMiddleware::with_config(config);
		let response = middleware
			.process(Request::get("/"), Arc::new(TestHandler))
			.await
			.unwrap();

		assert!(response.headers.is_empty());
	}
}

use async_trait::async_trait;
use fileshelf_http::{Handler, Middleware, Request, Response, Result};
use std::sync::Arc;
use std::time::Instant;

/// Logging middleware
/// Logs one line per request with method, path, status, remote address and
/// duration.
pub struct LoggingMiddleware;

impl LoggingMiddleware {
	/// Create a new logging middleware
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use fileshelf_middleware::LoggingMiddleware;
	/// use fileshelf_http::{Handler, Middleware, Request, Response};
	/// use hyper::StatusCode;
	///
	/// struct TestHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for TestHandler {
	///     async fn handle(&self, _request: Request) -> fileshelf_http::Result<Response> {
	///         Ok(Response::new(StatusCode::OK).with_body("OK"))
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let middleware = LoggingMiddleware::new();
	/// let response = middleware
	///     .process(Request::get("/docs/"), Arc::new(TestHandler))
	///     .await
	///     .unwrap();
	/// assert_eq!(response.status, StatusCode::OK);
	/// # });
	/// ```
	pub fn new() -> Self {
		Self
	}
}

impl Default for LoggingMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for LoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Instant::now();
		let method = request.method.clone();
		let path = request.path().to_string();
		let remote_addr = request.remote_label();

		let result = next.handle(request).await;
		let elapsed_ms = start.elapsed().as_millis() as u64;

		match &result {
			Ok(response) => {
				tracing::info!(
					%method,
					%path,
					status = response.status.as_u16(),
					%remote_addr,
					elapsed_ms,
					"request completed"
				);
			}
			Err(err) => {
				tracing::warn!(
					%method,
					%path,
					status = err.status_code(),
					%remote_addr,
					elapsed_ms,
					error = %err,
					"request failed"
				);
			}
		}

		result
	}
}

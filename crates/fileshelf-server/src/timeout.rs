use async_trait::async_trait;
use fileshelf_http::{Error, Handler, Request, Response, Result};
use std::sync::Arc;
use std::time::Duration;

/// Handler wrapper that fails with 503 when the inner handler is too slow
///
/// Only producing the [`Response`] is bounded; a streamed body is not.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use fileshelf_server::TimeoutHandler;
/// use fileshelf_http::{Handler, Request, Response};
///
/// struct MyHandler;
///
/// #[async_trait::async_trait]
/// impl Handler for MyHandler {
///     async fn handle(&self, _req: Request) -> fileshelf_http::Result<Response> {
///         Ok(Response::ok())
///     }
/// }
///
/// let handler = TimeoutHandler::new(Arc::new(MyHandler), Duration::from_secs(30));
/// assert_eq!(handler.timeout(), Duration::from_secs(30));
/// ```
pub struct TimeoutHandler {
	inner: Arc<dyn Handler>,
	timeout: Duration,
}

impl TimeoutHandler {
	/// Wrap `inner`, allowing it `timeout` per request
	pub fn new(inner: Arc<dyn Handler>, timeout: Duration) -> Self {
		Self { inner, timeout }
	}

	/// Configured limit
	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

#[async_trait]
impl Handler for TimeoutHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		let path = request.path().to_string();
		match tokio::time::timeout(self.timeout, self.inner.handle(request)).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(
					%path,
					timeout_ms = self.timeout.as_millis() as u64,
					"handler timed out"
				);
				Err(Error::Timeout("Request timed out".to_string()))
			}
		}
	}
}

use bytes::Bytes;
use fileshelf_http::security::apply_security_headers;
use fileshelf_http::{Error, Handler, Middleware, MiddlewareChain, Request, Response};
use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;

use crate::error::ServerError;
use crate::shutdown::{ShutdownCoordinator, ShutdownListener};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body type handed to hyper: buffered or streamed
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Connection level limits
#[derive(Debug, Clone)]
pub struct ServerConfig {
	/// Time allowed for a client to send the request head; also bounds the
	/// TLS handshake
	pub read_timeout: Duration,
	/// Largest accepted request body
	pub max_body_bytes: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			read_timeout: Duration::from_secs(10),
			max_body_bytes: 1024 * 1024,
		}
	}
}

/// HTTP/1.1 server with middleware support
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
	config: ServerConfig,
	tls: Option<TlsAcceptor>,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use fileshelf_server::HttpServer;
	/// use fileshelf_http::{Handler, Request, Response};
	///
	/// struct MyHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for MyHandler {
	///     async fn handle(&self, _req: Request) -> fileshelf_http::Result<Response> {
	///         Ok(Response::ok().with_body("Hello"))
	///     }
	/// }
	///
	/// let server = HttpServer::new(Arc::new(MyHandler));
	/// assert!(!server.is_tls());
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
			config: ServerConfig::default(),
			tls: None,
		}
	}

	/// Add a middleware to the server using builder pattern
	///
	/// Middlewares are executed in the order they are added.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Replace the connection limits
	pub fn with_config(mut self, config: ServerConfig) -> Self {
		self.config = config;
		self
	}

	/// Serve HTTPS with the given acceptor
	pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
		self.tls = Some(acceptor);
		self
	}

	/// Whether connections are wrapped in TLS
	pub fn is_tls(&self) -> bool {
		self.tls.is_some()
	}

	/// Build the final handler with middleware chain
	fn build_handler(&self) -> Arc<dyn Handler> {
		if self.middlewares.is_empty() {
			return self.handler.clone();
		}

		let mut chain = MiddlewareChain::new(self.handler.clone());
		for middleware in &self.middlewares {
			chain.add_middleware(middleware.clone());
		}

		Arc::new(chain)
	}

	/// Bind `addr` and serve until `coordinator` requests shutdown
	///
	/// # Errors
	///
	/// [`ServerError::Bind`] when the address cannot be bound.
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use std::net::SocketAddr;
	/// use std::time::Duration;
	/// use fileshelf_server::{HttpServer, ShutdownCoordinator};
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
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let server = HttpServer::new(Arc::new(MyHandler));
	/// let addr: SocketAddr = "127.0.0.1:8080".parse()?;
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
	/// server.listen_with_shutdown(addr, coordinator).await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> Result<(), ServerError> {
		let listener = TcpListener::bind(addr)
			.await
			.map_err(|source| ServerError::Bind { addr, source })?;
		self.serve_listener(listener, coordinator).await
	}

	/// Serve connections from an already bound listener until `coordinator`
	/// requests shutdown.
	///
	/// On shutdown the listener is closed, every open connection is asked to
	/// finish its current request and close, and connections still open
	/// after the coordinator's grace period are aborted.
	pub async fn serve_listener(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> Result<(), ServerError> {
		let local_addr = listener.local_addr()?;
		let scheme = if self.is_tls() { "https" } else { "http" };
		tracing::info!(address = %local_addr, "listening on {scheme}://{local_addr}");

		let handler = self.build_handler();
		let config = Arc::new(self.config);
		let tls = self.tls;
		let mut shutdown = coordinator.subscribe();
		let mut connections = JoinSet::new();

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = match result {
						Ok(accepted) => accepted,
						Err(e) => {
							// Usually fd exhaustion; back off instead of spinning.
							tracing::warn!(error = %e, "failed to accept connection");
							tokio::time::sleep(Duration::from_millis(100)).await;
							continue;
						}
					};

					let handler = handler.clone();
					let config = config.clone();
					let conn_shutdown = coordinator.subscribe();

					match tls.clone() {
						Some(acceptor) => {
							connections.spawn(async move {
								let handshake = tokio::time::timeout(config.read_timeout, acceptor.accept(stream));
								match handshake.await {
									Ok(Ok(tls_stream)) => {
										serve_connection(tls_stream, remote_addr, true, handler, config, conn_shutdown).await;
									}
									Ok(Err(e)) => {
										tracing::debug!(remote_addr = %remote_addr, error = %e, "TLS handshake failed");
									}
									Err(_) => {
										tracing::debug!(remote_addr = %remote_addr, "TLS handshake timed out");
									}
								}
							});
						}
						None => {
							connections.spawn(serve_connection(stream, remote_addr, false, handler, config, conn_shutdown));
						}
					}
				}
				Some(_) = connections.join_next(), if !connections.is_empty() => {}
				_ = shutdown.recv() => {
					tracing::info!(open_connections = connections.len(), "shutdown requested, no longer accepting connections");
					break;
				}
			}
		}

		drop(listener);

		let grace = coordinator.shutdown_timeout();
		let drained = tokio::time::timeout(grace, async {
			while connections.join_next().await.is_some() {}
		})
		.await;

		if drained.is_err() {
			tracing::warn!(
				remaining = connections.len(),
				grace_secs = grace.as_secs(),
				"grace period elapsed, aborting open connections"
			);
			connections.shutdown().await;
		}

		tracing::info!("server stopped");
		coordinator.notify_shutdown_complete();
		Ok(())
	}
}

/// Drive one HTTP/1.1 connection until it closes or shutdown is requested
async fn serve_connection<I>(
	io: I,
	remote_addr: SocketAddr,
	is_secure: bool,
	handler: Arc<dyn Handler>,
	config: Arc<ServerConfig>,
	mut shutdown: ShutdownListener,
) where
	I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	let service = RequestService {
		handler,
		remote_addr,
		is_secure,
		max_body_bytes: config.max_body_bytes,
	};

	let mut builder = http1::Builder::new();
	builder
		.timer(TokioTimer::new())
		.header_read_timeout(config.read_timeout)
		.keep_alive(true);

	let connection = builder.serve_connection(TokioIo::new(io), service);
	tokio::pin!(connection);

	let result = tokio::select! {
		result = connection.as_mut() => result,
		_ = shutdown.recv() => {
			connection.as_mut().graceful_shutdown();
			connection.as_mut().await
		}
	};

	if let Err(e) = result {
		tracing::debug!(remote_addr = %remote_addr, error = %e, "connection closed with error");
	}
}

/// Convert a fileshelf [`Response`] into a hyper response
fn into_hyper_response(mut response: Response) -> hyper::Response<ResponseBody> {
	let body: ResponseBody = match response.take_stream() {
		Some(stream) => http_body_util::StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
		None => Full::new(response.body)
			.map_err(|never| match never {})
			.boxed_unsync(),
	};

	let mut hyper_response = hyper::Response::new(body);
	*hyper_response.status_mut() = response.status;
	*hyper_response.headers_mut() = response.headers;
	hyper_response
}

fn body_too_large() -> Response {
	let mut response = Response::from(Error::BadRequest("Request body too large".to_string()));
	apply_security_headers(&mut response.headers);
	response
}

/// Answer a failed body read; only an exceeded limit is reported as such
fn body_read_failure(error: &BoxError, remote_addr: SocketAddr) -> Response {
	if error.downcast_ref::<LengthLimitError>().is_some() {
		tracing::warn!(remote_addr = %remote_addr, "request body too large");
		return body_too_large();
	}

	tracing::warn!(remote_addr = %remote_addr, error = %error, "failed to read request body");
	let mut response = Response::from(Error::BadRequest("Failed to read request body".to_string()));
	apply_security_headers(&mut response.headers);
	response
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
	is_secure: bool,
	max_body_bytes: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<ResponseBody>;
	type Error = BoxError;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;
		let is_secure = self.is_secure;
		let max_body_bytes = self.max_body_bytes;

		Box::pin(async move {
			// Check Content-Length before reading body
			if let Some(content_length) = req.headers().get(hyper::header::CONTENT_LENGTH)
				&& let Ok(len_str) = content_length.to_str()
				&& let Ok(len) = len_str.parse::<u64>()
				&& len > max_body_bytes as u64
			{
				tracing::warn!(remote_addr = %remote_addr, content_length = len, "request body too large");
				return Ok(into_hyper_response(body_too_large()));
			}

			let (parts, body) = req.into_parts();

			// Read body with size limit
			let body_bytes = match Limited::new(body, max_body_bytes).collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(e) => return Ok(into_hyper_response(body_read_failure(&e, remote_addr))),
			};

			let request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				body_bytes,
			)
			.with_remote_addr(remote_addr)
			.with_secure(is_secure);

			let response = handler.handle(request).await.unwrap_or_else(Response::from);

			Ok(into_hyper_response(response))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use futures::stream;
	use hyper::StatusCode;
	use rstest::rstest;

	struct TestHandler;

	#[async_trait]
	impl Handler for TestHandler {
		async fn handle(&self, _request: Request) -> fileshelf_http::Result<Response> {
			Ok(Response::ok().with_body("Hello, World!"))
		}
	}

	struct PrefixMiddleware {
		prefix: String,
	}

	#[async_trait]
	impl Middleware for PrefixMiddleware {
		async fn process(
			&self,
			request: Request,
			next: Arc<dyn Handler>,
		) -> fileshelf_http::Result<Response> {
			let response = next.handle(request).await?;
			let current_body = String::from_utf8(response.body.to_vec()).unwrap_or_default();
			Ok(Response::ok().with_body(format!("{}{}", self.prefix, current_body)))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_middleware_chain_execution() {
		let server = HttpServer::new(Arc::new(TestHandler))
			.with_middleware(Arc::new(PrefixMiddleware {
				prefix: "First:".to_string(),
			}))
			.with_middleware(Arc::new(PrefixMiddleware {
				prefix: "Second:".to_string(),
			}));
		assert_eq!(server.middlewares.len(), 2);

		let handler = server.build_handler();
		let response = handler.handle(Request::get("/")).await.unwrap();
		let body = String::from_utf8(response.body.to_vec()).unwrap();

		// Middlewares should be applied in order: First -> Second -> Handler
		assert_eq!(body, "First:Second:Hello, World!");
	}

	#[rstest]
	#[tokio::test]
	async fn test_into_hyper_response_buffered() {
		let response = Response::new(StatusCode::CREATED)
			.with_header("X-Test", "yes")
			.with_body("payload");

		let hyper_response = into_hyper_response(response);

		assert_eq!(hyper_response.status(), StatusCode::CREATED);
		assert_eq!(hyper_response.headers().get("x-test").unwrap(), "yes");
		let body = hyper_response.into_body().collect().await.unwrap().to_bytes();
		assert_eq!(body, Bytes::from("payload"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_into_hyper_response_streamed() {
		let chunks = stream::iter(vec![
			Ok::<_, BoxError>(Bytes::from("a")),
			Ok(Bytes::from("b")),
			Ok(Bytes::from("c")),
		]);
		let response = Response::ok().with_body("ignored").with_stream(Box::pin(chunks));

		let body = into_hyper_response(response)
			.into_body()
			.collect()
			.await
			.unwrap()
			.to_bytes();
		assert_eq!(body, Bytes::from("abc"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_body_read_failure_tells_limit_from_broken_body() {
		let remote_addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();

		let over_limit = Limited::new(Full::new(Bytes::from("too long")), 3)
			.collect()
			.await
			.unwrap_err();
		let response = body_read_failure(&over_limit, remote_addr);
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body["error"], "Request body too large");

		let aborted = stream::iter(vec![Err::<Frame<Bytes>, BoxError>(Box::new(
			std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
		))]);
		let broken = Limited::new(http_body_util::StreamBody::new(aborted), 16)
			.collect()
			.await
			.unwrap_err();
		let response = body_read_failure(&broken, remote_addr);
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");
		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body["error"], "Failed to read request body");
	}

	#[rstest]
	fn test_body_too_large_is_bad_request() {
		let response = body_too_large();
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");
	}
}

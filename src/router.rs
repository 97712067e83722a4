//! Exact-path routing with a fallback handler.

use async_trait::async_trait;
use fileshelf_http::{Handler, Request, Response, Result};
use std::sync::Arc;

/// A path bound to the handler serving it
#[derive(Clone)]
pub struct Route {
	/// Request path matched exactly, without query string
	pub path: String,
	/// Handler for matching requests
	pub handler: Arc<dyn Handler>,
}

impl Route {
	/// Create a new route
	pub fn new(path: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		Self {
			path: path.into(),
			handler,
		}
	}
}

/// Dispatches on exact path match, everything else goes to the fallback
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fileshelf::{EchoHandler, Router};
/// use fileshelf_http::{Handler, Request, Response};
///
/// struct Fallback;
///
/// #[async_trait::async_trait]
/// impl Handler for Fallback {
///     async fn handle(&self, _req: Request) -> fileshelf_http::Result<Response> {
///         Ok(Response::ok().with_body("fallback"))
///     }
/// }
///
/// let router = Router::new(Arc::new(Fallback))
///     .route("/post", Arc::new(EchoHandler))
///     .route("/api", Arc::new(EchoHandler));
/// assert_eq!(router.routes().len(), 2);
/// ```
pub struct Router {
	routes: Vec<Route>,
	fallback: Arc<dyn Handler>,
}

impl Router {
	/// Create a router sending unmatched requests to `fallback`
	pub fn new(fallback: Arc<dyn Handler>) -> Self {
		Self {
			routes: Vec::new(),
			fallback,
		}
	}

	/// Register `handler` for `path`. Earlier registrations win.
	pub fn route(mut self, path: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		self.routes.push(Route::new(path, handler));
		self
	}

	/// Registered routes, in registration order
	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	fn handler_for(&self, path: &str) -> &Arc<dyn Handler> {
		self.routes
			.iter()
			.find(|route| route.path == path)
			.map(|route| &route.handler)
			.unwrap_or(&self.fallback)
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, request: Request) -> Result<Response> {
		let handler = self.handler_for(request.path()).clone();
		handler.handle(request).await
	}
}

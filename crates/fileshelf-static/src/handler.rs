//! The browse handler: resolve, stat, then serve a file or a listing.

use async_trait::async_trait;
use fileshelf_http::{Error, Handler, Request, Response, Result};
use hyper::Method;
use std::path::Path;
use std::sync::Arc;

use crate::cache::MetadataCache;
use crate::error::StaticError;
use crate::file_response::file_response;
use crate::listing::listing_response;
use crate::path_resolver::PathResolver;

/// Serves files and directory listings below a root directory.
///
/// # Examples
///
/// ```
/// use fileshelf_static::{BrowseHandler, MetadataCache, PathResolver};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = Arc::new(MetadataCache::new(Duration::from_secs(300)));
/// let handler = BrowseHandler::new(PathResolver::new(dir.path()).unwrap(), cache);
/// assert_eq!(handler.root(), std::fs::canonicalize(dir.path()).unwrap());
/// ```
pub struct BrowseHandler {
	resolver: PathResolver,
	cache: Arc<MetadataCache>,
}

impl BrowseHandler {
	/// Create a handler sharing `cache` with whoever runs its sweeper
	pub fn new(resolver: PathResolver, cache: Arc<MetadataCache>) -> Self {
		Self { resolver, cache }
	}

	/// The canonical root being served
	pub fn root(&self) -> &Path {
		self.resolver.root()
	}

	/// The metadata cache used by this handler
	pub fn cache(&self) -> &Arc<MetadataCache> {
		&self.cache
	}

	async fn serve(&self, request: &Request) -> std::result::Result<Response, StaticError> {
		let resolved = self.resolver.resolve(request.path())?;
		let resolved_metadata = self.cache.resolve(&resolved.absolute_path).await?;
		let metadata = &resolved_metadata.metadata;

		if metadata.is_dir() {
			let response =
				listing_response(&resolved.absolute_path, &resolved.requested_path).await?;
			tracing::debug!(
				path = %resolved.requested_path,
				from_cache = resolved_metadata.from_cache,
				"listed directory"
			);
			Ok(response)
		} else {
			let response = file_response(&resolved.absolute_path, metadata).await?;
			tracing::debug!(
				path = %resolved.requested_path,
				size = metadata.len(),
				from_cache = resolved_metadata.from_cache,
				"served file"
			);
			Ok(response)
		}
	}
}

#[async_trait]
impl Handler for BrowseHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		let is_head = match request.method {
			Method::GET => false,
			Method::HEAD => true,
			_ => {
				return Err(Error::MethodNotAllowed {
					message: "Method not allowed".to_string(),
					allow: "GET, HEAD",
				});
			}
		};

		match self.serve(&request).await {
			Ok(response) if is_head => Ok(response.without_body()),
			Ok(response) => Ok(response),
			Err(err) => {
				tracing::warn!(
					path = %request.path(),
					remote_addr = %request.remote_label(),
					error = %err,
					"browse request rejected"
				);
				Err(err.into())
			}
		}
	}
}

//! Application assembly: settings in, configured server out.

use fileshelf_conf::{ConfigError, Settings};
use fileshelf_http::Handler;
use fileshelf_middleware::{LoggingMiddleware, SecurityConfig, SecurityHeadersMiddleware};
use fileshelf_server::{
	HttpServer, ServerConfig, ServerError, ShutdownCoordinator, TimeoutHandler, load_tls_acceptor,
};
use fileshelf_static::{BrowseHandler, MetadataCache, PathResolver, StaticError};
use std::sync::Arc;

use crate::echo::EchoHandler;
use crate::router::Router;

/// Startup failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	/// Invalid settings
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The served root could not be opened
	#[error(transparent)]
	Static(#[from] StaticError),

	/// Bind or TLS failure
	#[error(transparent)]
	Server(#[from] ServerError),
}

/// A fully wired fileshelf application
///
/// # Examples
///
/// ```
/// use fileshelf::App;
/// use fileshelf_conf::Settings;
///
/// let dir = tempfile::tempdir().unwrap();
/// let settings = Settings {
///     root: dir.path().to_path_buf(),
///     ..Settings::default()
/// };
///
/// let app = App::from_settings(&settings).unwrap();
/// assert!(app.cache().is_empty());
/// ```
pub struct App {
	settings: Settings,
	cache: Arc<MetadataCache>,
	handler: Arc<dyn Handler>,
}

impl App {
	/// Build the handler tree for `settings`
	///
	/// Settings are validated first.
	pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
		settings.validate()?;

		let cache = Arc::new(MetadataCache::new(settings.cache_ttl()));
		let browse = BrowseHandler::new(PathResolver::new(&settings.root)?, cache.clone());
		let echo: Arc<dyn Handler> = Arc::new(EchoHandler);

		let router = Router::new(Arc::new(browse))
			.route("/post", echo.clone())
			.route("/api", echo);
		let handler = TimeoutHandler::new(Arc::new(router), settings.handler_timeout());

		Ok(Self {
			settings: settings.clone(),
			cache,
			handler: Arc::new(handler),
		})
	}

	/// Metadata cache shared with the browse handler
	pub fn cache(&self) -> &Arc<MetadataCache> {
		&self.cache
	}

	/// Router wrapped in the handler timeout, without middleware
	pub fn handler(&self) -> Arc<dyn Handler> {
		self.handler.clone()
	}

	/// The server for this application, TLS included when configured
	///
	/// # Errors
	///
	/// [`ServerError::Tls`] when the certificate or key cannot be loaded.
	pub fn server(&self) -> Result<HttpServer, ServerError> {
		let security = SecurityConfig {
			hsts_enabled: self.settings.is_tls(),
			..SecurityConfig::default()
		};

		let server = HttpServer::new(self.handler.clone())
			.with_middleware(Arc::new(LoggingMiddleware::new()))
			.with_middleware(Arc::new(SecurityHeadersMiddleware::with_config(security)))
			.with_config(ServerConfig {
				read_timeout: self.settings.read_timeout(),
				max_body_bytes: self.settings.max_body_bytes,
			});

		match self.settings.tls.pair() {
			Some((cert, key)) => Ok(server.with_tls(load_tls_acceptor(cert, key)?)),
			None => Ok(server),
		}
	}

	/// Serve until `coordinator` requests shutdown.
	///
	/// The cache sweeper runs for as long as the listener does and is
	/// stopped before this returns.
	pub async fn run(self, coordinator: ShutdownCoordinator) -> Result<(), AppError> {
		let addr = self.settings.socket_addr()?;
		let server = self.server()?;

		tracing::info!(
			root = %self.settings.root.display(),
			cache_ttl_secs = self.settings.cache_ttl_secs,
			tls = self.settings.is_tls(),
			"starting fileshelf"
		);

		let sweeper = self.cache.spawn_sweeper();
		let result = server.listen_with_shutdown(addr, coordinator).await;
		sweeper.stop().await;

		result?;
		Ok(())
	}
}

//! # fileshelf
//!
//! A small HTTP server that browses a directory: files are streamed,
//! directories are rendered as HTML listings, and a JSON echo endpoint is
//! mounted at `/post` and `/api`.
//!
//! ## Crates
//!
//! - [`fileshelf_http`] - Request, response, handler and middleware primitives
//! - [`fileshelf_static`] - Path resolution, metadata cache, listings, file streaming
//! - [`fileshelf_middleware`] - Request logging and security headers
//! - [`fileshelf_server`] - hyper listener, TLS, timeouts, graceful shutdown
//! - [`fileshelf_conf`] - Settings from defaults, TOML and environment
//!
//! ## Example
//!
//! ```rust,no_run
//! use fileshelf::App;
//! use fileshelf_conf::Settings;
//! use fileshelf_server::ShutdownCoordinator;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(None)?;
//! let coordinator = ShutdownCoordinator::new(settings.shutdown_grace());
//! App::from_settings(&settings)?.run(coordinator).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod echo;
pub mod router;

pub use app::{App, AppError};
pub use echo::EchoHandler;
pub use router::{Route, Router};

pub use fileshelf_conf as conf;
pub use fileshelf_http as http;
pub use fileshelf_middleware as middleware;
pub use fileshelf_server as server;
pub use fileshelf_static as static_files;

//! # fileshelf-server
//!
//! HTTP/1.1 server for fileshelf built on hyper.
//!
//! ## Features
//!
//! - Middleware composition around a single [`fileshelf_http::Handler`]
//! - Header read timeout and request body size limit per connection
//! - Optional TLS through rustls
//! - Graceful shutdown with a bounded grace period
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fileshelf_server::{HttpServer, ShutdownCoordinator, shutdown_signal};
//! use fileshelf_http::{Handler, Request, Response};
//!
//! struct Hello;
//!
//! #[async_trait::async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, _req: Request) -> fileshelf_http::Result<Response> {
//!         Ok(Response::ok().with_body("hello"))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
//! let trigger = coordinator.clone();
//! tokio::spawn(async move {
//!     shutdown_signal().await;
//!     trigger.shutdown();
//! });
//!
//! HttpServer::new(Arc::new(Hello))
//!     .listen_with_shutdown("127.0.0.1:3000".parse()?, coordinator)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod shutdown;
pub mod timeout;
pub mod tls;

pub use error::ServerError;
pub use http::{HttpServer, ResponseBody, ServerConfig};
pub use shutdown::{ShutdownCoordinator, ShutdownListener, shutdown_signal};
pub use timeout::TimeoutHandler;
pub use tls::load_tls_acceptor;

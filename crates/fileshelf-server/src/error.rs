use std::net::SocketAddr;
use std::path::PathBuf;

/// Errors that stop the server from starting or running
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// The listening socket could not be bound
	#[error("failed to bind {addr}: {source}")]
	Bind {
		/// Requested address
		addr: SocketAddr,
		/// Underlying error
		#[source]
		source: std::io::Error,
	},

	/// Certificate or key could not be loaded
	#[error("TLS error for {}: {message}", path.display())]
	Tls {
		/// File being loaded
		path: PathBuf,
		/// What went wrong
		message: String,
	},

	/// Other I/O failure on the listener
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

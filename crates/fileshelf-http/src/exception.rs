//! Error taxonomy shared by every fileshelf handler.
//!
//! Each variant maps to exactly one HTTP status code. The message carried by
//! a variant is what the client sees, so it must never contain filesystem
//! paths; callers log the path separately.

/// Result type alias used across fileshelf handlers
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a handler can return
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Malformed request (bad JSON, oversized body)
	#[error("{0}")]
	BadRequest(String),

	/// The target exists but may not be read
	#[error("{0}")]
	Forbidden(String),

	/// Missing resource or rejected traversal attempt
	#[error("{0}")]
	NotFound(String),

	/// Method not supported by the endpoint
	#[error("{message}")]
	MethodNotAllowed {
		/// Client-facing message
		message: String,
		/// Value for the `Allow` response header
		allow: &'static str,
	},

	/// The handler did not finish in time
	#[error("{0}")]
	Timeout(String),

	/// Unexpected server-side failure
	#[error("{0}")]
	Internal(String),

	/// Response serialization failure
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// Unclassified I/O failure
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// HTTP status code for this error
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Error;
	///
	/// assert_eq!(Error::NotFound("Not found".to_string()).status_code(), 404);
	/// assert_eq!(Error::BadRequest("Invalid JSON".to_string()).status_code(), 400);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::BadRequest(_) => 400,
			Error::Forbidden(_) => 403,
			Error::NotFound(_) => 404,
			Error::MethodNotAllowed { .. } => 405,
			Error::Timeout(_) => 503,
			Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => 500,
		}
	}

	/// Shorthand for the generic 404 used for both missing paths and
	/// traversal attempts
	pub fn not_found() -> Self {
		Error::NotFound("Not found".to_string())
	}

	/// Message safe to send to the client
	///
	/// I/O errors are reduced to a generic message since their text may
	/// carry paths.
	pub fn public_message(&self) -> String {
		match self {
			Error::Io(_) => "Internal server error".to_string(),
			other => other.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::BadRequest("x".into()), 400)]
	#[case(Error::Forbidden("x".into()), 403)]
	#[case(Error::NotFound("x".into()), 404)]
	#[case(Error::MethodNotAllowed { message: "x".into(), allow: "GET" }, 405)]
	#[case(Error::Timeout("x".into()), 503)]
	#[case(Error::Internal("x".into()), 500)]
	fn test_status_codes(#[case] error: Error, #[case] expected: u16) {
		assert_eq!(error.status_code(), expected);
	}

	#[rstest]
	fn test_io_error_message_is_generic() {
		let err = Error::from(std::io::Error::other("/srv/secret/path exploded"));
		assert_eq!(err.status_code(), 500);
		assert!(!err.public_message().contains("/srv"));
	}
}

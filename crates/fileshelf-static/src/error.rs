//! Error types for path resolution and static serving.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving and serving filesystem entries.
///
/// Display strings are client-safe: they never include the offending path.
/// Call sites log the path next to the error instead.
#[derive(Debug, Error)]
pub enum StaticError {
	/// Missing entry, undecodable path or traversal attempt.
	#[error("Not found")]
	NotFound,

	/// The entry exists but the process may not read it.
	#[error("Forbidden")]
	Forbidden,

	/// Any other filesystem failure.
	#[error("{0}")]
	Internal(&'static str),

	/// The configured root is missing or not a directory.
	#[error("invalid root directory {}: {reason}", path.display())]
	InvalidRoot {
		/// Root as configured
		path: PathBuf,
		/// What went wrong
		reason: String,
	},
}

impl StaticError {
	/// Classify a failed `stat`.
	///
	/// Permission problems surface as 403; everything else, including
	/// `NotADirectory` for `file.txt/child`, is reported as missing.
	pub fn from_stat(err: &io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::PermissionDenied => StaticError::Forbidden,
			_ => StaticError::NotFound,
		}
	}

	/// Classify a failed directory enumeration.
	pub fn from_read_dir(err: &io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::PermissionDenied => StaticError::Forbidden,
			_ => StaticError::Internal("Failed to read directory"),
		}
	}

	/// Classify a failed file open.
	pub fn from_open(err: &io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::PermissionDenied => StaticError::Forbidden,
			io::ErrorKind::NotFound => StaticError::NotFound,
			_ => StaticError::Internal("Failed to open file"),
		}
	}
}

impl From<StaticError> for fileshelf_http::Error {
	fn from(err: StaticError) -> Self {
		match err {
			StaticError::NotFound => fileshelf_http::Error::not_found(),
			StaticError::Forbidden => fileshelf_http::Error::Forbidden(err.to_string()),
			StaticError::Internal(message) => fileshelf_http::Error::Internal(message.to_string()),
			StaticError::InvalidRoot { .. } => {
				fileshelf_http::Error::Internal("Internal server error".to_string())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(io::ErrorKind::PermissionDenied, 403)]
	#[case(io::ErrorKind::NotFound, 404)]
	#[case(io::ErrorKind::InvalidInput, 404)]
	fn test_stat_classification(#[case] kind: io::ErrorKind, #[case] status: u16) {
		let err = StaticError::from_stat(&io::Error::from(kind));
		assert_eq!(fileshelf_http::Error::from(err).status_code(), status);
	}

	#[rstest]
	#[case(io::ErrorKind::PermissionDenied, 403)]
	#[case(io::ErrorKind::NotFound, 500)]
	#[case(io::ErrorKind::Other, 500)]
	fn test_read_dir_classification(#[case] kind: io::ErrorKind, #[case] status: u16) {
		let err = StaticError::from_read_dir(&io::Error::from(kind));
		assert_eq!(fileshelf_http::Error::from(err).status_code(), status);
	}

	#[rstest]
	#[case(io::ErrorKind::PermissionDenied, 403)]
	#[case(io::ErrorKind::NotFound, 404)]
	#[case(io::ErrorKind::Other, 500)]
	fn test_open_classification(#[case] kind: io::ErrorKind, #[case] status: u16) {
		let err = StaticError::from_open(&io::Error::from(kind));
		assert_eq!(fileshelf_http::Error::from(err).status_code(), status);
	}

	#[rstest]
	fn test_invalid_root_message_not_exposed() {
		let err = StaticError::InvalidRoot {
			path: PathBuf::from("/srv/private"),
			reason: "not a directory".to_string(),
		};
		assert!(err.to_string().contains("/srv/private"));
		let public = fileshelf_http::Error::from(err).public_message();
		assert!(!public.contains("/srv/private"));
	}
}

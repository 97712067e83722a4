//! Request path to filesystem path mapping.
//!
//! Resolution is purely lexical: the request path is percent-decoded,
//! cleaned segment by segment and joined onto the canonical root. Nothing
//! here touches the filesystem except [`PathResolver::new`], which
//! canonicalizes the root once.
//!
//! Symlinks inside the root are not resolved, so a link pointing outside the
//! root is followed when the file is opened. Operators who care should not
//! place such links under the served directory.

use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

use crate::error::StaticError;

/// A request mapped onto the served root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
	/// Cleaned, decoded, `/`-rooted request path
	pub requested_path: String,
	/// Absolute filesystem path inside the root
	pub absolute_path: PathBuf,
}

impl ResolvedRequest {
	/// True when the request addresses the root itself
	pub fn is_root(&self) -> bool {
		self.requested_path == "/"
	}
}

/// Maps request paths onto a fixed root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
	root: PathBuf,
}

impl PathResolver {
	/// Canonicalize `root` and build a resolver for it.
	///
	/// # Errors
	///
	/// Returns [`StaticError::InvalidRoot`] when the root does not exist or
	/// is not a directory.
	pub fn new(root: impl AsRef<Path>) -> Result<Self, StaticError> {
		let configured = root.as_ref();
		let root = std::fs::canonicalize(configured).map_err(|e| StaticError::InvalidRoot {
			path: configured.to_path_buf(),
			reason: e.to_string(),
		})?;

		if !root.is_dir() {
			return Err(StaticError::InvalidRoot {
				path: configured.to_path_buf(),
				reason: "not a directory".to_string(),
			});
		}

		Ok(Self { root })
	}

	/// The canonical root directory
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Resolve a raw request path.
	///
	/// # Errors
	///
	/// Returns [`StaticError::NotFound`] for undecodable paths and for any
	/// path that would leave the root. Traversal attempts are logged at
	/// `warn` level.
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_static::PathResolver;
	///
	/// let dir = tempfile::tempdir().unwrap();
	/// let resolver = PathResolver::new(dir.path()).unwrap();
	///
	/// let resolved = resolver.resolve("/docs//./guide%20v2.txt").unwrap();
	/// assert_eq!(resolved.requested_path, "/docs/guide v2.txt");
	/// assert!(resolved.absolute_path.starts_with(resolver.root()));
	///
	/// assert!(resolver.resolve("/../../etc/passwd").is_err());
	/// ```
	pub fn resolve(&self, request_path: &str) -> Result<ResolvedRequest, StaticError> {
		let decoded = match percent_decode_str(request_path).decode_utf8() {
			Ok(decoded) if !decoded.contains('\0') => decoded,
			_ => {
				tracing::debug!(path = %request_path, "rejecting undecodable request path");
				return Err(StaticError::NotFound);
			}
		};

		let mut segments: Vec<&str> = Vec::new();
		for segment in decoded.split('/') {
			match segment {
				"" | "." => {}
				".." => {
					if segments.pop().is_none() {
						return Err(self.reject(request_path));
					}
				}
				other => {
					// Anything that is not a single plain name (a drive prefix
					// or an embedded separator on some platforms) is refused.
					let mut components = Path::new(other).components();
					if !matches!(
						(components.next(), components.next()),
						(Some(Component::Normal(_)), None)
					) {
						return Err(self.reject(request_path));
					}
					segments.push(other);
				}
			}
		}

		let mut absolute_path = self.root.clone();
		absolute_path.extend(&segments);

		if !absolute_path.starts_with(&self.root) {
			return Err(self.reject(request_path));
		}

		Ok(ResolvedRequest {
			requested_path: format!("/{}", segments.join("/")),
			absolute_path,
		})
	}

	fn reject(&self, request_path: &str) -> StaticError {
		tracing::warn!(path = %request_path, "path traversal attempt rejected");
		StaticError::NotFound
	}
}

//! Served directory fixtures
//!
//! Layout of [`served_dir`]:
//!
//! ```text
//! index.html
//! notes.txt
//! .secret
//! docs/
//!   guide.md
//!   .hidden/
//! empty/
//! ```

use fileshelf_static::{BrowseHandler, MetadataCache, PathResolver};
use rstest::fixture;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Temporary directory populated with a small served tree
#[fixture]
pub fn served_dir() -> TempDir {
	let temp_dir = TempDir::new().unwrap();
	let root = temp_dir.path();

	fs::write(root.join("index.html"), "<h1>hello</h1>").unwrap();
	fs::write(root.join("notes.txt"), "some notes").unwrap();
	fs::write(root.join(".secret"), "top secret").unwrap();

	fs::create_dir(root.join("docs")).unwrap();
	fs::write(root.join("docs/guide.md"), "# Guide").unwrap();
	fs::create_dir(root.join("docs/.hidden")).unwrap();

	fs::create_dir(root.join("empty")).unwrap();

	temp_dir
}

/// Browse handler over [`served_dir`] with a five minute TTL
#[fixture]
pub fn browse_handler(served_dir: TempDir) -> (TempDir, BrowseHandler) {
	let cache = Arc::new(MetadataCache::new(Duration::from_secs(300)));
	let handler = BrowseHandler::new(PathResolver::new(served_dir.path()).unwrap(), cache);
	(served_dir, handler)
}

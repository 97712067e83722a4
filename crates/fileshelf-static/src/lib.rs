//! # fileshelf-static
//!
//! Serving files and directory listings from a root directory.
//!
//! The request pipeline is:
//!
//! 1. [`PathResolver`] maps the request path onto the root and rejects
//!    traversal attempts without touching the filesystem.
//! 2. [`MetadataCache`] stats the target and reconciles it with what it saw
//!    before. A background sweeper evicts idle entries.
//! 3. Directories are rendered by [`render_listing`], files are streamed
//!    by [`file_response()`].
//!
//! [`BrowseHandler`] ties the steps together behind the
//! [`fileshelf_http::Handler`] trait.
//!
//! ## Module Structure
//!
//! - [`path_resolver`] - Lexical path resolution
//! - [`cache`] - Metadata cache and sweeper
//! - [`listing`] - HTML directory listings
//! - [`file_response`](mod@file_response) - Streaming file responses
//! - [`handler`] - The browse handler
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod error;
pub mod file_response;
pub mod handler;
pub mod html;
pub mod listing;
pub mod path_resolver;

pub use cache::{CacheEntry, MetadataCache, ResolvedMetadata, SweeperHandle};
pub use error::StaticError;
pub use file_response::file_response;
pub use handler::BrowseHandler;
pub use listing::{listing_response, render_listing};
pub use path_resolver::{PathResolver, ResolvedRequest};

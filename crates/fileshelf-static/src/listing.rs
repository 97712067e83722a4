//! HTML directory listings.

use chrono::{DateTime, Utc};
use fileshelf_http::Response;
use fileshelf_http::security::apply_no_cache_headers;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use std::fmt::Write as _;
use std::path::Path;
use std::time::SystemTime;

use crate::error::StaticError;
use crate::html::{encode_dir_href, encode_segment, escape};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One visible row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingEntry {
	name: String,
	is_directory: bool,
	size: u64,
	modified: SystemTime,
}

/// Read `dir` and return its visible entries, directories first and then by
/// byte order of the name.
async fn read_entries(dir: &Path) -> Result<Vec<ListingEntry>, StaticError> {
	let read_dir_error = |err: std::io::Error| {
		tracing::warn!(path = %dir.display(), error = %err, "failed to read directory");
		StaticError::from_read_dir(&err)
	};

	let mut read_dir = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
	let mut entries = Vec::new();

	while let Some(entry) = read_dir.next_entry().await.map_err(read_dir_error)? {
		// Names that are not UTF-8 cannot be addressed by a request path.
		let name = match entry.file_name().into_string() {
			Ok(name) if !name.starts_with('.') => name,
			Ok(_) => continue,
			Err(raw) => {
				tracing::debug!(name = ?raw, "skipping entry with non UTF-8 name");
				continue;
			}
		};

		// Follows symlinks so a linked directory is listed as a directory.
		let metadata = match tokio::fs::metadata(entry.path()).await {
			Ok(metadata) => metadata,
			Err(err) => {
				tracing::debug!(path = %entry.path().display(), error = %err, "skipping unreadable entry");
				continue;
			}
		};

		entries.push(ListingEntry {
			name,
			is_directory: metadata.is_dir(),
			size: metadata.len(),
			modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
		});
	}

	entries.sort_by(|a, b| {
		b.is_directory
			.cmp(&a.is_directory)
			.then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
	});
	Ok(entries)
}

fn format_timestamp(time: SystemTime) -> String {
	DateTime::<Utc>::from(time).format(TIMESTAMP_FORMAT).to_string()
}

/// Render the HTML listing of `dir`, shown to the client as `requested_path`.
///
/// The output depends only on the directory's state, so an unchanged
/// directory renders byte-identical HTML.
///
/// # Errors
///
/// [`StaticError::Forbidden`] when enumeration is denied,
/// [`StaticError::Internal`] for any other enumeration failure.
pub async fn render_listing(dir: &Path, requested_path: &str) -> Result<String, StaticError> {
	let entries = read_entries(dir).await?;
	let title = escape(requested_path);
	let base_href = encode_dir_href(requested_path);

	let mut html = String::with_capacity(256 + entries.len() * 96);
	let _ = write!(
		html,
		"<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Index of {title}</title>\n</head>\n<body>\n<h2>Index of {title}</h2>\n<ul>\n"
	);

	if requested_path != "/" {
		let parent = match base_href.trim_end_matches('/').rfind('/') {
			Some(idx) => &base_href[..=idx],
			None => "/",
		};
		let _ = writeln!(html, "<li><a href=\"{}\">..</a></li>", escape(parent));
	}

	for entry in &entries {
		let suffix = if entry.is_directory { "/" } else { "" };
		let href = format!("{}{}{}", base_href, encode_segment(&entry.name), suffix);
		let _ = writeln!(
			html,
			"<li><a href=\"{}\">{}{}</a> ({} bytes, {})</li>",
			escape(&href),
			escape(&entry.name),
			suffix,
			entry.size,
			format_timestamp(entry.modified),
		);
	}

	html.push_str("</ul>\n</body>\n</html>\n");
	Ok(html)
}

/// Render `dir` and wrap the HTML in a response with the listing headers.
///
/// # Errors
///
/// Same as [`render_listing`].
pub async fn listing_response(dir: &Path, requested_path: &str) -> Result<Response, StaticError> {
	let html = render_listing(dir, requested_path).await?;

	let mut response = Response::ok()
		.with_body(html)
		.with_typed_header(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
	apply_no_cache_headers(&mut response.headers);
	Ok(response)
}

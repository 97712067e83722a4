//! Streaming file responses.

use fileshelf_http::Response;
use fileshelf_http::security::apply_no_cache_headers;
use futures::TryStreamExt;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use std::fs::Metadata;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use crate::error::StaticError;

/// Content type for `path`, guessed from its extension
///
/// # Examples
///
/// ```
/// use fileshelf_static::file_response::content_type_for;
/// use std::path::Path;
///
/// assert_eq!(content_type_for(Path::new("style.css")), "text/css");
/// assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> String {
	mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// Build a response that streams the file at `path`.
///
/// `metadata` is the stat taken for this request; its size becomes
/// `Content-Length` and bounds the bytes read. The open file is owned by the
/// body stream and closed when the stream ends or is dropped.
///
/// # Errors
///
/// [`StaticError::Forbidden`] or [`StaticError::NotFound`] when the open
/// fails for those reasons, [`StaticError::Internal`] otherwise.
pub async fn file_response(path: &Path, metadata: &Metadata) -> Result<Response, StaticError> {
	let file = tokio::fs::File::open(path).await.map_err(|err| {
		tracing::warn!(path = %path.display(), error = %err, "failed to open file");
		StaticError::from_open(&err)
	})?;

	let size = metadata.len();
	let stream = ReaderStream::new(file.take(size))
		.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>);

	let content_type = HeaderValue::from_str(&content_type_for(path))
		.unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

	let mut response = Response::ok()
		.with_stream(Box::pin(stream))
		.with_typed_header(CONTENT_TYPE, content_type)
		.with_typed_header(CONTENT_LENGTH, HeaderValue::from(size));
	apply_no_cache_headers(&mut response.headers);
	Ok(response)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::BytesMut;
	use futures::StreamExt;
	use rstest::rstest;

	#[rstest]
	#[case("index.html", "text/html")]
	#[case("data.json", "application/json")]
	#[case("photo.png", "image/png")]
	#[case("notes.unknownext", "application/octet-stream")]
	fn test_content_type_for(#[case] name: &str, #[case] expected: &str) {
		assert_eq!(content_type_for(Path::new(name)), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_file_response_streams_content() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("hello.txt");
		std::fs::write(&path, "hello world").unwrap();
		let metadata = std::fs::metadata(&path).unwrap();

		let mut response = file_response(&path, &metadata).await.unwrap();

		assert_eq!(response.headers.get("content-length").unwrap(), "11");
		assert_eq!(response.headers.get("content-type").unwrap(), "text/plain");
		assert_eq!(
			response.headers.get("cache-control").unwrap(),
			"no-cache, no-store, must-revalidate"
		);

		let mut stream = response.take_stream().unwrap();
		let mut body = BytesMut::new();
		while let Some(chunk) = stream.next().await {
			body.extend_from_slice(&chunk.unwrap());
		}
		assert_eq!(&body[..], b"hello world");
	}

	#[rstest]
	#[tokio::test]
	async fn test_file_response_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("present.txt");
		std::fs::write(&path, "x").unwrap();
		let metadata = std::fs::metadata(&path).unwrap();
		std::fs::remove_file(&path).unwrap();

		let result = file_response(&path, &metadata).await;
		assert!(matches!(result, Err(StaticError::NotFound)));
	}
}

use bytes::Bytes;
use futures::stream::Stream;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use std::fmt;
use std::pin::Pin;

/// Type alias for streaming body
pub type StreamBody =
	Pin<Box<dyn Stream<Item = Result<Bytes, Box<dyn std::error::Error + Send + Sync>>> + Send>>;

/// HTTP Response representation
///
/// A response carries either a buffered `body` or a `stream`. When a stream
/// is attached the server sends it and ignores `body`.
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
	stream: Option<StreamBody>,
}

impl fmt::Debug for Response {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Response")
			.field("status", &self.status)
			.field("headers", &self.headers)
			.field("body_len", &self.body.len())
			.field("streaming", &self.stream.is_some())
			.finish()
	}
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			stream: None,
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a Response with HTTP 500 Internal Server Error status
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Response;
	/// use bytes::Bytes;
	///
	/// let response = Response::ok().with_body("Hello, World!");
	/// assert_eq!(response.body, Bytes::from("Hello, World!"));
	/// ```
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Attach a streaming body
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Response;
	/// use bytes::Bytes;
	/// use futures::stream;
	///
	/// type BoxError = Box<dyn std::error::Error + Send + Sync>;
	/// let chunks = stream::iter(vec![Ok::<_, BoxError>(Bytes::from("a")), Ok(Bytes::from("b"))]);
	/// let response = Response::ok().with_stream(Box::pin(chunks));
	/// assert!(response.is_streaming());
	/// ```
	pub fn with_stream(mut self, stream: StreamBody) -> Self {
		self.stream = Some(stream);
		self
	}

	/// Whether a streaming body is attached
	pub fn is_streaming(&self) -> bool {
		self.stream.is_some()
	}

	/// Detach the streaming body, if any
	pub fn take_stream(&mut self) -> Option<StreamBody> {
		self.stream.take()
	}

	/// Drop any body, keeping status and headers (used for HEAD)
	pub fn without_body(mut self) -> Self {
		self.stream = None;
		self.body = Bytes::new();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Response;
	///
	/// let response = Response::ok().with_header("X-Custom-Header", "custom-value");
	/// assert_eq!(
	///     response.headers.get("X-Custom-Header").unwrap().to_str().unwrap(),
	///     "custom-value"
	/// );
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Add a header using typed HeaderName and HeaderValue
	pub fn with_typed_header(mut self, key: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(key, value);
		self
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"status": "success"})).unwrap();
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "application/json"
	/// );
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> crate::Result<Self> {
		use crate::Error;
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers.insert(
			hyper::header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}
}

impl From<crate::Error> for Response {
	fn from(error: crate::Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let body = serde_json::json!({
			"error": error.public_message(),
		});

		let mut response = Response::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error());

		if let crate::Error::MethodNotAllowed { allow, .. } = error {
			response
				.headers
				.insert(hyper::header::ALLOW, HeaderValue::from_static(allow));
		}
		response
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Error;
	use rstest::rstest;

	#[rstest]
	fn test_error_conversion_keeps_status_and_hides_detail() {
		let response = Response::from(Error::not_found());
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body["error"], "Not found");
	}

	#[rstest]
	fn test_method_not_allowed_sets_allow_header() {
		let response = Response::from(Error::MethodNotAllowed {
			message: "Only POST allowed".to_string(),
			allow: "POST",
		});
		assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(response.headers.get("allow").unwrap(), "POST");
	}

	#[rstest]
	fn test_without_body_drops_stream() {
		let chunks = futures::stream::iter(vec![Ok::<_, Box<dyn std::error::Error + Send + Sync>>(
			Bytes::from("x"),
		)]);
		let response = Response::ok()
			.with_body("buffered")
			.with_stream(Box::pin(chunks))
			.without_body();
		assert!(!response.is_streaming());
		assert!(response.body.is_empty());
	}
}

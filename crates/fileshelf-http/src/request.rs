use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

/// HTTP Request representation
///
/// The body is fully buffered by the server before the request reaches a
/// handler; the server enforces the configured body size limit while
/// collecting it.
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Peer address, when the request came over a socket
	pub remote_addr: Option<SocketAddr>,
	/// True when the connection is TLS
	pub is_secure: bool,
}

impl Request {
	/// Create a new request
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_http::Request;
	/// use hyper::{HeaderMap, Method, Version};
	/// use bytes::Bytes;
	///
	/// let request = Request::new(
	///     Method::GET,
	///     "/docs/readme.txt".parse().unwrap(),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(request.path(), "/docs/readme.txt");
	/// assert!(request.remote_addr.is_none());
	/// ```
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			is_secure: false,
		}
	}

	/// Shorthand for a bodiless request, mostly useful in tests
	///
	/// # Panics
	///
	/// Panics if `uri` is not a valid URI.
	pub fn get(uri: &str) -> Self {
		Self::new(
			Method::GET,
			uri.parse().expect("invalid request URI"),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	/// Set the peer address
	pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	/// Mark the request as received over TLS
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.is_secure = secure;
		self
	}

	/// Raw (still percent-encoded) request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Request body bytes
	pub fn body(&self) -> &Bytes {
		&self.body
	}

	/// Peer address rendered for log lines, `-` when unknown
	pub fn remote_label(&self) -> String {
		self.remote_addr
			.map(|addr| addr.to_string())
			.unwrap_or_else(|| "-".to_string())
	}
}

//! Response header sets shared by the static responders and the security
//! middleware.

use hyper::HeaderMap;
use hyper::header::{
	CACHE_CONTROL, CONTENT_SECURITY_POLICY, HeaderValue, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};

/// `X-Content-Type-Options` value
pub const NOSNIFF: &str = "nosniff";
/// `X-Frame-Options` value
pub const FRAME_DENY: &str = "DENY";
/// `Content-Security-Policy` value
pub const CSP_SELF: &str = "default-src 'self'";
/// `Cache-Control` value for every browse/serve response
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Insert the three security headers, overwriting existing values.
pub fn apply_security_headers(headers: &mut HeaderMap) {
	headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
	headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static(FRAME_DENY));
	headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP_SELF));
}

/// Insert the security headers plus `Cache-Control: no-cache, no-store,
/// must-revalidate`.
///
/// # Examples
///
/// ```
/// use fileshelf_http::security::apply_no_cache_headers;
/// use hyper::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// apply_no_cache_headers(&mut headers);
/// assert_eq!(headers.get("cache-control").unwrap(), "no-cache, no-store, must-revalidate");
/// assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
/// ```
pub fn apply_no_cache_headers(headers: &mut HeaderMap) {
	apply_security_headers(headers);
	headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
}

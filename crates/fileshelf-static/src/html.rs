//! HTML helpers for listings

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Bytes encoded inside a single path segment of a link
const PATH_SEGMENT: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'\'')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'\\')
	.add(b'`')
	.add(b'{')
	.add(b'}');

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use fileshelf_static::html::escape;
///
/// assert_eq!(escape("Hello, World!"), "Hello, World!");
/// assert_eq!(escape("<script>alert('XSS')</script>"),
///            "&lt;script&gt;alert(&#x27;XSS&#x27;)&lt;/script&gt;");
/// assert_eq!(escape("5 < 10 & 10 > 5"), "5 &lt; 10 &amp; 10 &gt; 5");
/// ```
pub fn escape(text: &str) -> String {
	let mut result = String::with_capacity(text.len() + 10);
	for ch in text.chars() {
		match ch {
			'&' => result.push_str("&amp;"),
			'<' => result.push_str("&lt;"),
			'>' => result.push_str("&gt;"),
			'"' => result.push_str("&quot;"),
			'\'' => result.push_str("&#x27;"),
			_ => result.push(ch),
		}
	}
	result
}

/// Percent-encode one path segment for use in an `href`
///
/// # Examples
///
/// ```
/// use fileshelf_static::html::encode_segment;
///
/// assert_eq!(encode_segment("my file#1.txt"), "my%20file%231.txt");
/// assert_eq!(encode_segment("a/b"), "a%2Fb");
/// ```
pub fn encode_segment(segment: &str) -> String {
	utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Encoded, `/`-terminated href for a cleaned `/`-rooted request path
pub(crate) fn encode_dir_href(requested_path: &str) -> String {
	let mut href = String::from("/");
	for segment in requested_path.split('/').filter(|s| !s.is_empty()) {
		href.push_str(&encode_segment(segment));
		href.push('/');
	}
	href
}

//! JSON echo endpoint.

use async_trait::async_trait;
use fileshelf_http::{Error, Handler, Request, Response, Result};
use hyper::Method;
use serde_json::{Value, json};

const INVALID_PAYLOAD: &str = "Invalid or empty JSON data";

/// Echoes a posted JSON document back to the client
///
/// The body size limit is enforced by the server before the request gets
/// here.
///
/// # Examples
///
/// ```
/// use fileshelf::EchoHandler;
/// use fileshelf_http::{Handler, Request};
/// use hyper::Method;
///
/// # tokio_test::block_on(async {
/// let mut request = Request::get("/post");
/// request.method = Method::POST;
/// request.body = bytes::Bytes::from(r#"{"data":"x"}"#);
///
/// let response = EchoHandler.handle(request).await.unwrap();
/// assert_eq!(response.status, 200);
/// # });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl EchoHandler {
	/// Decode `body`, rejecting payloads that carry nothing
	fn decode(body: &[u8]) -> Result<Value> {
		let value: Value = serde_json::from_slice(body)
			.map_err(|_| Error::BadRequest(INVALID_PAYLOAD.to_string()))?;
		if is_empty_payload(&value) {
			return Err(Error::BadRequest(INVALID_PAYLOAD.to_string()));
		}
		Ok(value)
	}
}

fn is_empty_payload(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(fields) => fields.is_empty(),
		Value::Bool(_) | Value::Number(_) => false,
	}
}

#[async_trait]
impl Handler for EchoHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::POST {
			return Err(Error::MethodNotAllowed {
				message: "Only POST allowed".to_string(),
				allow: "POST",
			});
		}

		let received = match Self::decode(request.body()) {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(
					remote_addr = %request.remote_label(),
					body_len = request.body().len(),
					"rejected echo payload"
				);
				return Err(err);
			}
		};

		tracing::info!(remote_addr = %request.remote_label(), "handled echo request");
		Response::ok().with_json(&json!({
			"status": "success",
			"received": received,
		}))
	}
}

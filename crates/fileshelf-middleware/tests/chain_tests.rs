//! Logging and security middleware composed in a chain

use async_trait::async_trait;
use fileshelf_http::{Error, Handler, MiddlewareChain, Request, Response, Result};
use fileshelf_middleware::{LoggingMiddleware, SecurityHeadersMiddleware};
use hyper::StatusCode;
use rstest::rstest;
use std::sync::Arc;

struct EchoPathHandler;

#[async_trait]
impl Handler for EchoPathHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.path() == "/forbidden" {
			return Err(Error::Forbidden("Forbidden".to_string()));
		}
		Ok(Response::ok().with_body(request.path().to_string()))
	}
}

fn chain() -> MiddlewareChain {
	MiddlewareChain::new(Arc::new(EchoPathHandler))
		.with_middleware(Arc::new(LoggingMiddleware::new()))
		.with_middleware(Arc::new(SecurityHeadersMiddleware::new()))
}

#[rstest]
#[case("/hello", StatusCode::OK)]
#[case("/forbidden", StatusCode::FORBIDDEN)]
#[tokio::test]
async fn test_chain_always_returns_secured_response(
	#[case] path: &str,
	#[case] expected: StatusCode,
) {
	let response = chain().handle(Request::get(path)).await.unwrap();

	assert_eq!(response.status, expected);
	assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");
	assert_eq!(response.headers.get("x-frame-options").unwrap(), "DENY");
	assert_eq!(
		response.headers.get("content-security-policy").unwrap(),
		"default-src 'self'"
	);
}

#[rstest]
#[tokio::test]
async fn test_error_body_is_json() {
	let response = chain().handle(Request::get("/forbidden")).await.unwrap();

	let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
	assert_eq!(body["error"], "Forbidden");
}

//! End-to-end tests against a server bound to an ephemeral port

use async_trait::async_trait;
use fileshelf_http::{Handler, Request, Response};
use fileshelf_server::{HttpServer, ServerConfig, ShutdownCoordinator, TimeoutHandler};
use rstest::rstest;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct EchoLength;

#[async_trait]
impl Handler for EchoLength {
	async fn handle(&self, request: Request) -> fileshelf_http::Result<Response> {
		Ok(Response::ok().with_body(format!("{} bytes", request.body.len())))
	}
}

struct SlowHandler {
	delay: Duration,
}

#[async_trait]
impl Handler for SlowHandler {
	async fn handle(&self, _request: Request) -> fileshelf_http::Result<Response> {
		tokio::time::sleep(self.delay).await;
		Ok(Response::ok().with_body("finished"))
	}
}

struct RunningServer {
	addr: SocketAddr,
	coordinator: ShutdownCoordinator,
	task: JoinHandle<()>,
}

impl RunningServer {
	fn url(&self, path: &str) -> String {
		format!("http://{}{}", self.addr, path)
	}

	async fn stop(self) {
		self.coordinator.shutdown();
		self.task.await.unwrap();
	}
}

async fn start(server: HttpServer, grace: Duration) -> RunningServer {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let coordinator = ShutdownCoordinator::new(grace);
	let server_coordinator = coordinator.clone();
	let task = tokio::spawn(async move {
		server
			.serve_listener(listener, server_coordinator)
			.await
			.unwrap();
	});
	RunningServer {
		addr,
		coordinator,
		task,
	}
}

#[rstest]
#[tokio::test]
async fn test_request_reaches_handler() {
	let server = start(HttpServer::new(Arc::new(EchoLength)), Duration::from_secs(1)).await;

	let response = reqwest::Client::new()
		.post(server.url("/anything"))
		.body("12345")
		.send()
		.await
		.unwrap();

	assert_eq!(response.status(), 200);
	assert_eq!(response.text().await.unwrap(), "5 bytes");
	server.stop().await;
}

#[rstest]
#[case(16, 200)]
#[case(17, 400)]
#[tokio::test]
async fn test_body_limit(#[case] body_len: usize, #[case] expected: u16) {
	let config = ServerConfig {
		max_body_bytes: 16,
		..ServerConfig::default()
	};
	let server = start(
		HttpServer::new(Arc::new(EchoLength)).with_config(config),
		Duration::from_secs(1),
	)
	.await;

	let response = reqwest::Client::new()
		.post(server.url("/"))
		.body("x".repeat(body_len))
		.send()
		.await
		.unwrap();

	assert_eq!(response.status(), expected);
	if expected == 400 {
		assert_eq!(response.headers()["x-frame-options"], "DENY");
		let body: serde_json::Value = response.json().await.unwrap();
		assert_eq!(body["error"], "Request body too large");
	}
	server.stop().await;
}

#[rstest]
#[tokio::test]
async fn test_slow_handler_times_out() {
	let slow = Arc::new(SlowHandler {
		delay: Duration::from_secs(5),
	});
	let handler = TimeoutHandler::new(slow, Duration::from_millis(50));
	let server = start(HttpServer::new(Arc::new(handler)), Duration::from_secs(1)).await;

	let response = reqwest::get(server.url("/slow")).await.unwrap();

	assert_eq!(response.status(), 503);
	server.stop().await;
}

#[rstest]
#[tokio::test]
async fn test_shutdown_finishes_in_flight_request() {
	let slow = Arc::new(SlowHandler {
		delay: Duration::from_millis(300),
	});
	let server = start(HttpServer::new(slow), Duration::from_secs(5)).await;
	let url = server.url("/slow");

	let in_flight = tokio::spawn(async move { reqwest::get(url).await });
	tokio::time::sleep(Duration::from_millis(100)).await;

	let coordinator = server.coordinator.clone();
	let addr = server.addr;
	server.stop().await;

	let response = in_flight.await.unwrap().unwrap();
	assert_eq!(response.status(), 200);
	assert_eq!(response.text().await.unwrap(), "finished");
	assert!(coordinator.is_complete());

	// The listener is closed once the server returns
	assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[rstest]
#[tokio::test]
async fn test_grace_period_bounds_shutdown() {
	let slow = Arc::new(SlowHandler {
		delay: Duration::from_secs(30),
	});
	let server = start(HttpServer::new(slow), Duration::from_millis(200)).await;
	let url = server.url("/slow");

	let in_flight = tokio::spawn(async move { reqwest::get(url).await });
	tokio::time::sleep(Duration::from_millis(100)).await;

	let started = std::time::Instant::now();
	server.stop().await;

	assert!(started.elapsed() < Duration::from_secs(5));
	assert!(in_flight.await.unwrap().is_err());
}

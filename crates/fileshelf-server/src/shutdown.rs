//! Graceful shutdown coordination.
//!
//! A [`ShutdownCoordinator`] is cloned into every party that needs to know
//! about shutdown. Listeners obtained through
//! [`subscribe`](ShutdownCoordinator::subscribe) observe the request even if
//! they subscribe after it was made.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Broadcasts a shutdown request and tracks its completion
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	requested: Arc<watch::Sender<bool>>,
	completed: Arc<watch::Sender<bool>>,
	timeout: Duration,
}

/// Receiving side of a shutdown request
#[derive(Debug, Clone)]
pub struct ShutdownListener {
	requested: watch::Receiver<bool>,
}

impl ShutdownListener {
	/// Resolve once shutdown has been requested
	pub async fn recv(&mut self) {
		// An Err means every coordinator is gone; nobody can ask for
		// shutdown any more, so treat it as a request.
		let _ = self.requested.wait_for(|requested| *requested).await;
	}
}

impl ShutdownCoordinator {
	/// Create a coordinator that allows `timeout` for in-flight work
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_server::ShutdownCoordinator;
	/// use std::time::Duration;
	///
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
	/// assert!(!coordinator.is_shutting_down());
	/// coordinator.shutdown();
	/// assert!(coordinator.is_shutting_down());
	/// ```
	pub fn new(timeout: Duration) -> Self {
		let (requested, _) = watch::channel(false);
		let (completed, _) = watch::channel(false);
		Self {
			requested: Arc::new(requested),
			completed: Arc::new(completed),
			timeout,
		}
	}

	/// Grace period for in-flight requests
	pub fn shutdown_timeout(&self) -> Duration {
		self.timeout
	}

	/// Get a listener for the shutdown request
	pub fn subscribe(&self) -> ShutdownListener {
		ShutdownListener {
			requested: self.requested.subscribe(),
		}
	}

	/// Request shutdown. Idempotent.
	pub fn shutdown(&self) {
		self.requested.send_replace(true);
	}

	/// Whether shutdown has been requested
	pub fn is_shutting_down(&self) -> bool {
		*self.requested.borrow()
	}

	/// Called by the server once every connection is closed
	pub fn notify_shutdown_complete(&self) {
		self.completed.send_replace(true);
	}

	/// Whether the server reported completion
	pub fn is_complete(&self) -> bool {
		*self.completed.borrow()
	}

	/// Wait for the server to report completion, at most the grace period
	/// plus one second for the final bookkeeping.
	///
	/// Returns false on timeout.
	pub async fn wait_for_shutdown(&self) -> bool {
		let mut completed = self.completed.subscribe();
		let limit = self.timeout + Duration::from_secs(1);
		matches!(
			tokio::time::timeout(limit, completed.wait_for(|done| *done)).await,
			Ok(Ok(_))
		)
	}
}

/// Resolve when the process receives SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to install Ctrl+C handler");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("received SIGINT"),
		_ = terminate => tracing::info!("received SIGTERM"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_late_subscriber_sees_shutdown() {
		let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
		coordinator.shutdown();

		let mut listener = coordinator.subscribe();
		tokio::time::timeout(Duration::from_secs(1), listener.recv())
			.await
			.expect("listener missed the shutdown request");
	}

	#[rstest]
	#[tokio::test]
	async fn test_clones_share_state() {
		let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
		let clone = coordinator.clone();
		let mut listener = coordinator.subscribe();

		let waiter = tokio::spawn(async move { listener.recv().await });
		clone.shutdown();

		waiter.await.unwrap();
		assert!(coordinator.is_shutting_down());
	}

	#[rstest]
	#[tokio::test]
	async fn test_wait_for_shutdown_reports_completion() {
		let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
		let server_side = coordinator.clone();

		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			server_side.notify_shutdown_complete();
		});

		assert!(coordinator.wait_for_shutdown().await);
		assert!(coordinator.is_complete());
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_shutdown_times_out() {
		let coordinator = ShutdownCoordinator::new(Duration::from_secs(2));
		assert!(!coordinator.wait_for_shutdown().await);
	}
}

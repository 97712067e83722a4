use anyhow::Context;
use clap::Parser;
use fileshelf::App;
use fileshelf_conf::Settings;
use fileshelf_server::{ShutdownCoordinator, shutdown_signal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Serve a directory over HTTP
#[derive(Parser, Debug)]
#[command(name = "fileshelf", version, about = "Static file and directory listing server")]
struct Cli {
	/// TOML settings file
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Directory to serve
	#[arg(short, long, value_name = "DIR")]
	dir: Option<PathBuf>,

	/// Address to bind
	#[arg(long)]
	host: Option<String>,

	/// Port to bind
	#[arg(short, long)]
	port: Option<u16>,

	/// Seconds a metadata cache entry may sit unused
	#[arg(long, value_name = "SECS")]
	cache_ttl: Option<u64>,

	/// Seconds allowed to receive request headers
	#[arg(long, value_name = "SECS")]
	read_timeout: Option<u64>,

	/// Seconds allowed to produce a response
	#[arg(long, value_name = "SECS")]
	handler_timeout: Option<u64>,

	/// Seconds in-flight requests get on shutdown
	#[arg(long, value_name = "SECS")]
	shutdown_grace: Option<u64>,

	/// PEM certificate chain, enables HTTPS
	#[arg(long, value_name = "FILE", requires = "key")]
	cert: Option<PathBuf>,

	/// PEM private key
	#[arg(long, value_name = "FILE", requires = "cert")]
	key: Option<PathBuf>,
}

impl Cli {
	fn apply(self, settings: &mut Settings) {
		if let Some(dir) = self.dir {
			settings.root = dir;
		}
		if let Some(host) = self.host {
			settings.host = host;
		}
		if let Some(port) = self.port {
			settings.port = port;
		}
		if let Some(ttl) = self.cache_ttl {
			settings.cache_ttl_secs = ttl;
		}
		if let Some(secs) = self.read_timeout {
			settings.read_timeout_secs = secs;
		}
		if let Some(secs) = self.handler_timeout {
			settings.handler_timeout_secs = secs;
		}
		if let Some(secs) = self.shutdown_grace {
			settings.shutdown_grace_secs = secs;
		}
		if self.cert.is_some() {
			settings.tls.cert = self.cert;
		}
		if self.key.is_some() {
			settings.tls.key = self.key;
		}
	}
}

fn init_logging() {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let mut settings =
		Settings::load(cli.config.as_deref()).context("failed to load settings")?;
	cli.apply(&mut settings);

	let app = App::from_settings(&settings).context("invalid configuration")?;

	let coordinator = ShutdownCoordinator::new(settings.shutdown_grace());
	let trigger = coordinator.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		tracing::info!("received termination signal, shutting down");
		trigger.shutdown();
	});

	app.run(coordinator).await.context("server failed")?;
	Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging();

	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!(error = %format!("{err:#}"), "fileshelf exited with an error");
			ExitCode::FAILURE
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;
	use rstest::rstest;

	#[rstest]
	fn test_cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[rstest]
	fn test_cli_overrides_settings() {
		let cli = Cli::parse_from([
			"fileshelf",
			"--dir",
			"/srv/files",
			"--port",
			"8080",
			"--cache-ttl",
			"5",
		]);
		let mut settings = Settings::default();

		cli.apply(&mut settings);

		assert_eq!(settings.root, PathBuf::from("/srv/files"));
		assert_eq!(settings.port, 8080);
		assert_eq!(settings.cache_ttl_secs, 5);
		assert_eq!(settings.host, "0.0.0.0");
	}

	#[rstest]
	fn test_cert_requires_key() {
		let result = Cli::try_parse_from(["fileshelf", "--cert", "cert.pem"]);
		assert!(result.is_err());
	}
}

//! Server settings.
//!
//! Layers, lowest priority first:
//!
//! 1. [`Settings::default`]
//! 2. a TOML file ([`Settings::from_toml_file`])
//! 3. environment variables ([`Settings::apply_env`])
//! 4. command line flags, applied by the binary
//!
//! [`Settings::validate`] runs once every layer has been applied.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable for [`Settings::root`]
pub const ENV_ROOT: &str = "FILESHELF_ROOT";
/// Environment variable for [`Settings::host`]
pub const ENV_HOST: &str = "HOST";
/// Environment variable for [`Settings::port`]
pub const ENV_PORT: &str = "PORT";
/// Environment variable for [`Settings::cache_ttl_secs`]
pub const ENV_CACHE_TTL: &str = "FILESHELF_CACHE_TTL";

/// Certificate and key for HTTPS, both PEM encoded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsSettings {
	/// Certificate chain path
	pub cert: Option<PathBuf>,
	/// Private key path
	pub key: Option<PathBuf>,
}

impl TlsSettings {
	/// Certificate and key when both are configured
	pub fn pair(&self) -> Option<(&Path, &Path)> {
		match (&self.cert, &self.key) {
			(Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
			_ => None,
		}
	}
}

/// Everything the server needs to start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Directory to serve
	pub root: PathBuf,
	/// Bind address
	pub host: String,
	/// Bind port
	pub port: u16,
	/// Idle lifetime of metadata cache entries, also the sweep interval
	pub cache_ttl_secs: u64,
	/// Time allowed for a client to send request headers
	pub read_timeout_secs: u64,
	/// Time allowed for a handler to produce a response
	pub handler_timeout_secs: u64,
	/// Time in-flight requests get to finish on shutdown
	pub shutdown_grace_secs: u64,
	/// Largest accepted request body
	pub max_body_bytes: usize,
	/// HTTPS material; plain HTTP when absent
	pub tls: TlsSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			root: PathBuf::from("."),
			host: "0.0.0.0".to_string(),
			port: 3000,
			cache_ttl_secs: 300,
			read_timeout_secs: 10,
			handler_timeout_secs: 30,
			shutdown_grace_secs: 10,
			max_body_bytes: 1024 * 1024,
			tls: TlsSettings::default(),
		}
	}
}

impl Settings {
	/// Parse settings from TOML text. Missing keys keep their defaults.
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_conf::Settings;
	///
	/// let settings = Settings::from_toml_str("port = 8080\n[tls]\ncert = \"c.pem\"\n").unwrap();
	/// assert_eq!(settings.port, 8080);
	/// assert_eq!(settings.host, "0.0.0.0");
	/// assert!(settings.tls.key.is_none());
	/// ```
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// Read settings from a TOML file
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&text)
	}

	/// Defaults, or the given file, with the process environment applied
	pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
		let mut settings = match config_file {
			Some(path) => Self::from_toml_file(path)?,
			None => Self::default(),
		};
		settings.apply_env()?;
		Ok(settings)
	}

	/// Override fields from the process environment
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_with(|key| std::env::var(key).ok())
	}

	/// Override fields from `lookup`, which maps a variable name to its
	/// value. Empty values are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_conf::Settings;
	///
	/// let mut settings = Settings::default();
	/// settings
	///     .apply_env_with(|key| (key == "PORT").then(|| "8081".to_string()))
	///     .unwrap();
	/// assert_eq!(settings.port, 8081);
	/// ```
	pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		if let Some(root) = lookup(ENV_ROOT) {
			self.root = PathBuf::from(root);
		}
		if let Some(host) = lookup(ENV_HOST) {
			self.host = host;
		}
		if let Some(port) = lookup(ENV_PORT) {
			self.port = parse_env(ENV_PORT, &port)?;
		}
		if let Some(ttl) = lookup(ENV_CACHE_TTL) {
			self.cache_ttl_secs = parse_env(ENV_CACHE_TTL, &ttl)?;
		}
		Ok(())
	}

	/// Check the combined settings before the server starts.
	///
	/// # Errors
	///
	/// Zero durations or body limit, a certificate without a key (or the
	/// reverse), and a root that is missing or not a directory.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (key, value) in [
			("cache_ttl_secs", self.cache_ttl_secs),
			("read_timeout_secs", self.read_timeout_secs),
			("handler_timeout_secs", self.handler_timeout_secs),
			("shutdown_grace_secs", self.shutdown_grace_secs),
		] {
			if value == 0 {
				return Err(ConfigError::invalid(key, "must be greater than zero"));
			}
		}

		if self.max_body_bytes == 0 {
			return Err(ConfigError::invalid("max_body_bytes", "must be greater than zero"));
		}

		match (&self.tls.cert, &self.tls.key) {
			(Some(_), None) => {
				return Err(ConfigError::invalid("tls.key", "a certificate requires a key"));
			}
			(None, Some(_)) => {
				return Err(ConfigError::invalid("tls.cert", "a key requires a certificate"));
			}
			_ => {}
		}

		if !self.root.is_dir() {
			return Err(ConfigError::invalid(
				"root",
				format!("{} is not an existing directory", self.root.display()),
			));
		}

		self.socket_addr()?;
		Ok(())
	}

	/// Address to bind, from `host` and `port`.
	///
	/// # Examples
	///
	/// ```
	/// use fileshelf_conf::Settings;
	///
	/// let settings = Settings { host: "127.0.0.1".into(), port: 8080, ..Settings::default() };
	/// assert_eq!(settings.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
	/// ```
	pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
		(self.host.as_str(), self.port)
			.to_socket_addrs()
			.ok()
			.and_then(|mut addrs| addrs.next())
			.ok_or_else(|| {
				ConfigError::invalid("host", format!("cannot resolve '{}'", self.host))
			})
	}

	/// Whether HTTPS is configured
	pub fn is_tls(&self) -> bool {
		self.tls.pair().is_some()
	}

	/// [`cache_ttl_secs`](Self::cache_ttl_secs) as a duration
	pub fn cache_ttl(&self) -> Duration {
		Duration::from_secs(self.cache_ttl_secs)
	}

	/// [`read_timeout_secs`](Self::read_timeout_secs) as a duration
	pub fn read_timeout(&self) -> Duration {
		Duration::from_secs(self.read_timeout_secs)
	}

	/// [`handler_timeout_secs`](Self::handler_timeout_secs) as a duration
	pub fn handler_timeout(&self) -> Duration {
		Duration::from_secs(self.handler_timeout_secs)
	}

	/// [`shutdown_grace_secs`](Self::shutdown_grace_secs) as a duration
	pub fn shutdown_grace(&self) -> Duration {
		Duration::from_secs(self.shutdown_grace_secs)
	}
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
		key,
		value: value.to_string(),
		reason: e.to_string(),
	})
}

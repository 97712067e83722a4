use std::path::PathBuf;

/// Errors raised while loading or validating settings
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config file {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("failed to parse environment variable '{key}' (value '{value}'): {reason}")]
	Env {
		key: &'static str,
		value: String,
		reason: String,
	},

	#[error("Invalid value for '{key}': {message}")]
	Invalid { key: &'static str, message: String },
}

impl ConfigError {
	pub(crate) fn invalid(key: &'static str, message: impl Into<String>) -> Self {
		ConfigError::Invalid {
			key,
			message: message.into(),
		}
	}
}

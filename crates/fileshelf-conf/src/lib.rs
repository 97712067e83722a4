//! # fileshelf-conf
//!
//! Layered configuration for the fileshelf server. See [`Settings`].

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{ENV_CACHE_TTL, ENV_HOST, ENV_PORT, ENV_ROOT, Settings, TlsSettings};

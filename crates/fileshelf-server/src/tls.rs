//! TLS acceptor construction from PEM files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::crypto::ring;

use crate::error::ServerError;

/// Build a [`TlsAcceptor`] from a PEM certificate chain and private key.
///
/// The acceptor advertises HTTP/1.1 over ALPN.
///
/// # Errors
///
/// [`ServerError::Tls`] when a file cannot be read, holds no certificate or
/// key, or rustls rejects the pair.
pub fn load_tls_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, ServerError> {
	let tls_error = |path: &Path, message: String| ServerError::Tls {
		path: path.to_path_buf(),
		message,
	};

	let cert_file = File::open(cert_path).map_err(|e| tls_error(cert_path, e.to_string()))?;
	let certs = rustls_pemfile::certs(&mut BufReader::new(cert_file))
		.collect::<Result<Vec<_>, _>>()
		.map_err(|e| tls_error(cert_path, e.to_string()))?;
	if certs.is_empty() {
		return Err(tls_error(cert_path, "no certificates found".to_string()));
	}

	let key_file = File::open(key_path).map_err(|e| tls_error(key_path, e.to_string()))?;
	let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
		.map_err(|e| tls_error(key_path, e.to_string()))?
		.ok_or_else(|| tls_error(key_path, "no private key found".to_string()))?;

	let mut config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
		.with_safe_default_protocol_versions()
		.map_err(|e| tls_error(cert_path, e.to_string()))?
		.with_no_client_auth()
		.with_single_cert(certs, key)
		.map_err(|e| tls_error(cert_path, e.to_string()))?;
	config.alpn_protocols = vec![b"http/1.1".to_vec()];

	Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_missing_certificate_file() {
		let dir = tempfile::tempdir().unwrap();
		let err = load_tls_acceptor(&dir.path().join("cert.pem"), &dir.path().join("key.pem"))
			.err().expect("expected error");
		assert!(matches!(err, ServerError::Tls { .. }));
		assert!(err.to_string().contains("cert.pem"));
	}

	#[rstest]
	fn test_file_without_certificates() {
		let dir = tempfile::tempdir().unwrap();
		let cert = dir.path().join("cert.pem");
		let key = dir.path().join("key.pem");
		std::fs::write(&cert, "not a pem file\n").unwrap();
		std::fs::write(&key, "").unwrap();

		let err = load_tls_acceptor(&cert, &key).err().expect("expected error");
		assert!(err.to_string().contains("no certificates found"));
	}
}

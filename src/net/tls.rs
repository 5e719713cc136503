//! TLS configuration and certificate loading.
//!
//! The acceptor advertises `h2` and `http/1.1` over ALPN so gRPC and REST
//! clients can share the TLS listener.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsConfig;

/// Errors raised while building the TLS acceptor.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("cannot open {kind} file {path:?}: {source}")]
    Open {
        kind: &'static str,
        path: String,
        source: std::io::Error,
    },

    #[error("invalid {kind} file {path:?}: {reason}")]
    Invalid {
        kind: &'static str,
        path: String,
        reason: String,
    },

    #[error("invalid server cert/key: {0}")]
    Config(#[from] rustls::Error),
}

/// Load certificate chain and key, and build an acceptor.
pub fn load_tls_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, TlsError> {
    let certs = load_certs(Path::new(&config.cert_path))?;
    let key = load_private_key(Path::new(&config.key_path))?;

    let mut server_config =
        rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_single_cert(certs, key)?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::info!(cert_path = %config.cert_path, "TLS enabled");
    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

fn open(kind: &'static str, path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Open {
            kind,
            path: path.display().to_string(),
            source,
        })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open("cert", path)?;
    let invalid = |reason: String| TlsError::Invalid {
        kind: "cert",
        path: path.display().to_string(),
        reason,
    };

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(e.to_string()))?;
    if certs.is_empty() {
        return Err(invalid("no certificates found".into()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open("key", path)?;
    let invalid = |reason: String| TlsError::Invalid {
        kind: "key",
        path: path.display().to_string(),
        reason,
    };

    loop {
        match rustls_pemfile::read_one(&mut reader).map_err(|e| invalid(e.to_string()))? {
            Some(rustls_pemfile::Item::Pkcs1Key(key)) => return Ok(key.into()),
            Some(rustls_pemfile::Item::Pkcs8Key(key)) => return Ok(key.into()),
            Some(rustls_pemfile::Item::Sec1Key(key)) => return Ok(key.into()),
            None => return Err(invalid("no private key found".into())),
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_cert_file() {
        let err = load_certs(Path::new("/nonexistent/cert.pem")).unwrap_err();
        assert!(err.to_string().contains("cannot open cert"));
    }

    #[test]
    fn key_file_without_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a pem block").unwrap();
        let err = load_private_key(file.path()).unwrap_err();
        assert!(err.to_string().contains("no private key found"));
    }

    #[test]
    fn empty_cert_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_certs(file.path()).unwrap_err();
        assert!(matches!(err, TlsError::Invalid { kind: "cert", .. }));
    }

    #[test]
    fn acceptor_reports_first_missing_file() {
        let config = TlsConfig {
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
        };
        assert!(matches!(
            load_tls_acceptor(&config),
            Err(TlsError::Open { kind: "cert", .. })
        ));
    }
}

//! TLS identities and a minimal HTTPS endpoint for handshake tests.
//!
//! The PEM files under `fixtures/tls` are ECDSA P-256 certificates:
//! a test root, a leaf for `localhost`/`127.0.0.1` signed by it, a leaf for
//! another host signed by it, an expired leaf signed by it, and a
//! self-signed leaf for `localhost`/`127.0.0.1` that no root vouches for.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, SupportedProtocolVersion};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

/// Test root CA.
pub const TEST_CA_PEM: &str = include_str!("../fixtures/tls/ca.pem");

/// DNS name on the test leaves other than [`TlsIdentity::MISMATCHED`].
pub const TEST_HOST: &str = "localhost";

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

/// Certificate and key served by a test endpoint.
#[derive(Debug, Clone, Copy)]
pub struct TlsIdentity {
    /// PEM certificate chain
    pub cert_pem: &'static str,
    /// PEM PKCS#8 private key
    pub key_pem: &'static str,
}

impl TlsIdentity {
    /// Leaf for `localhost` and `127.0.0.1`, signed by [`TEST_CA_PEM`].
    pub const LOCALHOST: Self = Self {
        cert_pem: include_str!("../fixtures/tls/localhost.pem"),
        key_pem: include_str!("../fixtures/tls/localhost.key"),
    };

    /// Leaf for `svc.example.com` only, signed by [`TEST_CA_PEM`].
    pub const MISMATCHED: Self = Self {
        cert_pem: include_str!("../fixtures/tls/mismatched.pem"),
        key_pem: include_str!("../fixtures/tls/mismatched.key"),
    };

    /// Leaf for `localhost` that expired on 2021-01-01, signed by [`TEST_CA_PEM`].
    pub const EXPIRED: Self = Self {
        cert_pem: include_str!("../fixtures/tls/expired.pem"),
        key_pem: include_str!("../fixtures/tls/expired.key"),
    };

    /// Self-signed leaf for `localhost` and `127.0.0.1`.
    pub const SELF_SIGNED: Self = Self {
        cert_pem: include_str!("../fixtures/tls/self-signed.pem"),
        key_pem: include_str!("../fixtures/tls/self-signed.key"),
    };

    /// DER certificates of the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM cannot be read.
    pub fn certificates(&self) -> io::Result<Vec<CertificateDer<'static>>> {
        certificates(self.cert_pem)
    }

    /// DER private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM holds no private key.
    pub fn private_key(&self) -> io::Result<PrivateKeyDer<'static>> {
        rustls_pemfile::private_key(&mut self.key_pem.as_bytes())?
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no private key in PEM"))
    }
}

/// Parse every certificate in a PEM string.
///
/// # Errors
///
/// Returns an error if a PEM section is malformed.
pub fn certificates(pem: &str) -> io::Result<Vec<CertificateDer<'static>>> {
    rustls_pemfile::certs(&mut pem.as_bytes()).collect()
}

/// HTTPS endpoint answering every request with an empty `200 OK`.
///
/// Listens on `127.0.0.1`; the accept loop stops when the value is dropped.
#[derive(Debug)]
pub struct TlsTestServer {
    addr: SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl TlsTestServer {
    /// Start a server offering TLS 1.2 and 1.3.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is unusable or binding fails.
    pub async fn start(identity: TlsIdentity) -> io::Result<Self> {
        Self::start_with_versions(identity, rustls::DEFAULT_VERSIONS).await
    }

    /// Start a server restricted to `versions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is unusable or binding fails.
    pub async fn start_with_versions(
        identity: TlsIdentity,
        versions: &[&'static SupportedProtocolVersion],
    ) -> io::Result<Self> {
        let config = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_protocol_versions(versions)
        .map_err(io::Error::other)?
        .with_no_client_auth()
        .with_single_cert(identity.certificates()?, identity.private_key()?)
        .map_err(io::Error::other)?;
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match tls.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = tls.write_all(RESPONSE).await;
                    let _ = tls.shutdown().await;
                });
            }
        });

        Ok(Self { addr, accept_loop })
    }

    /// Base URL of the endpoint, e.g. `https://127.0.0.1:8443`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://127.0.0.1:{}", self.addr.port())
    }
}

impl Drop for TlsTestServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

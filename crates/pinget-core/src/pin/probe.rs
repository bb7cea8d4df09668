//! Leaf certificate capture over a chain-unverified TLS handshake.
//!
//! Chain and hostname checks are skipped; handshake signatures are still
//! verified so the peer has to hold the key for the certificate it presents.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};
use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use super::{Fingerprint, LeafProbe};

/// Failure to obtain the leaf certificate. Always a connectivity problem,
/// never a pin mismatch.
#[derive(Debug)]
pub enum ProbeError {
    /// Host name did not resolve to any address.
    Resolve(io::Error),
    /// TCP connect failed for every resolved address.
    Connect(io::Error),
    /// Host is not a valid DNS name or IP address for SNI.
    InvalidServerName(String),
    /// TLS setup or handshake failed.
    Tls(io::Error),
    /// Handshake finished without a peer certificate.
    NoCertificate,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Resolve(e) => write!(f, "resolve: {}", e),
            ProbeError::Connect(e) => write!(f, "connect: {}", e),
            ProbeError::InvalidServerName(name) => write!(f, "invalid server name {:?}", name),
            ProbeError::Tls(e) => write!(f, "TLS handshake: {}", e),
            ProbeError::NoCertificate => write!(f, "server presented no certificate"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Resolve(e) | ProbeError::Connect(e) | ProbeError::Tls(e) => Some(e),
            ProbeError::InvalidServerName(_) | ProbeError::NoCertificate => None,
        }
    }
}

/// Accepts any certificate chain; only checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyLeaf {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyLeaf {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Production prober: one TCP+TLS connection per call, no retry.
#[derive(Debug, Clone)]
pub struct TlsProbe {
    timeout: Duration,
}

impl Default for TlsProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TlsProbe {
    /// Prober with the given connect/read timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client_config(&self) -> Result<Arc<ClientConfig>, ProbeError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| ProbeError::Tls(io::Error::new(io::ErrorKind::Other, e)))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyLeaf { provider }))
            .with_no_client_auth();
        Ok(Arc::new(config))
    }

    fn connect(&self, host: &str, port: u16) -> Result<TcpStream, ProbeError> {
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(ProbeError::Resolve)?
            .collect();
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(sock) => {
                    sock.set_read_timeout(Some(self.timeout))
                        .map_err(ProbeError::Connect)?;
                    sock.set_write_timeout(Some(self.timeout))
                        .map_err(ProbeError::Connect)?;
                    return Ok(sock);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) => ProbeError::Connect(e),
            None => ProbeError::Resolve(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {}", host),
            )),
        })
    }

    /// Returns the DER bytes of the leaf certificate `host:port` presents.
    pub fn leaf_certificate(&self, host: &str, port: u16) -> Result<Vec<u8>, ProbeError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ProbeError::InvalidServerName(host.to_string()))?;
        let mut conn = ClientConnection::new(self.client_config()?, server_name)
            .map_err(|e| ProbeError::Tls(io::Error::new(io::ErrorKind::Other, e)))?;
        let mut sock = self.connect(host, port)?;

        while conn.is_handshaking() {
            conn.complete_io(&mut sock).map_err(ProbeError::Tls)?;
        }

        let leaf = conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|c| c.as_ref().to_vec())
            .ok_or(ProbeError::NoCertificate)?;

        conn.send_close_notify();
        let _ = conn.complete_io(&mut sock);
        Ok(leaf)
    }
}

impl LeafProbe for TlsProbe {
    fn leaf_fingerprint(&self, host: &str, port: u16) -> Result<Fingerprint, ProbeError> {
        let der = self.leaf_certificate(host, port)?;
        let fp = Fingerprint::of_der(&der);
        tracing::debug!(host, port, fingerprint = %fp, "probed leaf certificate");
        Ok(fp)
    }
}

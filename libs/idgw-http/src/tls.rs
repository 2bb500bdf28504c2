//! TLS client configuration for each [`TlsTrust`] mode.
//!
//! Native roots are loaded once and cached; OS store lookups can be slow.

use crate::config::TlsTrust;
use crate::error::HttpError;
use rustls::DigitallySignedStruct;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Cached native root certificates. Empty means none were found (warned, not errored).
static NATIVE_ROOTS_CACHE: OnceLock<Vec<CertificateDer<'static>>> = OnceLock::new();

fn load_native_certs_inner() -> Vec<CertificateDer<'static>> {
    let result = rustls_native_certs::load_native_certs();

    for err in &result.errors {
        tracing::warn!(error = %err, "error loading native root certificate");
    }

    let certs: Vec<CertificateDer<'static>> = result.certs;

    if certs.is_empty() {
        tracing::warn!("no native root CA certificates found");
    } else {
        tracing::debug!(count = certs.len(), "loaded native root certificates");
    }

    certs
}

fn native_root_certs() -> &'static [CertificateDer<'static>] {
    NATIVE_ROOTS_CACHE
        .get_or_init(load_native_certs_inner)
        .as_slice()
}

/// Get the crypto provider for TLS connections.
///
/// Uses the process-wide default if one is installed, otherwise a fresh
/// aws-lc-rs provider (without installing it globally).
fn get_crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// Build the rustls `ClientConfig` for the given trust mode.
///
/// # Errors
///
/// Returns `HttpError::Tls` when no usable root certificate can be loaded
/// (empty OS store, unreadable or empty trust-store file).
pub fn client_config(trust: &TlsTrust) -> Result<rustls::ClientConfig, HttpError> {
    let provider = get_crypto_provider();
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| HttpError::Tls(Box::new(e)))?;

    let config = match trust {
        TlsTrust::System => {
            let roots = root_store(native_root_certs(), "OS certificate store")?;
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsTrust::TrustStore { path } => {
            let certs = load_trust_store(path)?;
            let roots = root_store(&certs, &path.display().to_string())?;
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsTrust::InsecureTrustAll => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
            .with_no_client_auth(),
    };

    Ok(config)
}

fn root_store(
    certs: &[CertificateDer<'static>],
    origin: &str,
) -> Result<rustls::RootCertStore, HttpError> {
    let mut roots = rustls::RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs.iter().cloned());

    if ignored > 0 {
        tracing::warn!(added, ignored, origin, "some root certificates could not be parsed");
    }

    if added == 0 {
        return Err(HttpError::Tls(
            format!("no valid root CA certificates in {origin}").into(),
        ));
    }

    Ok(roots)
}

fn load_trust_store(path: &Path) -> Result<Vec<CertificateDer<'static>>, HttpError> {
    let certs = CertificateDer::pem_file_iter(path)
        .and_then(|certs| certs.collect::<Result<Vec<_>, _>>())
        .map_err(|e| {
            HttpError::Tls(format!("failed to read trust store {}: {e}", path.display()).into())
        })?;

    tracing::debug!(path = %path.display(), count = certs.len(), "loaded trust store");
    Ok(certs)
}

/// Verifier that accepts any certificate chain for any host name.
///
/// Handshake signatures are still checked so the peer must hold the key for
/// the certificate it presents.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
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
        rustls::crypto::verify_tls12_signature(
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
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

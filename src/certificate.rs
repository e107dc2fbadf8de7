//! Pluggable certificate policy for the TLS handshake.
//!
//! A [`CertificatePolicy`] decides whether the server certificate is accepted and which client
//! certificate, if any, is presented when the server asks for one. The standard WebPKI checks
//! still run; their outcome is handed to the policy rather than enforced directly.

use std::fmt::Debug;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::{ResolvesClientCert, WebPkiServerVerifier};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::sign::CertifiedKey;
use rustls::{CertificateError, DigitallySignedStruct, SignatureScheme};
use tracing::warn;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::Result;

/// Decides which certificates a TLS handshake accepts and presents.
pub trait CertificatePolicy: Debug + Send + Sync {
    /// Accept or reject the certificate presented by the server.
    ///
    /// `policy_errors` is the outcome of the standard WebPKI verification against the configured
    /// trust anchors: `None` when the chain is valid for the requested host.
    fn validate_remote_certificate(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        policy_errors: Option<&rustls::Error>,
    ) -> bool;

    /// Pick the client certificate to present for mutual TLS, as an index into
    /// `local_certificates`.
    ///
    /// `acceptable_issuers` holds the DER-encoded distinguished names the server sent in its
    /// certificate request; it may be empty.
    fn select_local_certificate(
        &self,
        target_host: &str,
        local_certificates: &[ClientIdentity],
        acceptable_issuers: &[&[u8]],
    ) -> Option<usize>;
}

/// Accepts a server certificate only if it passed verification, and presents the first client
/// certificate whose issuer the server asked for (or simply the first one).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCertificatePolicy;

impl CertificatePolicy for DefaultCertificatePolicy {
    fn validate_remote_certificate(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        policy_errors: Option<&rustls::Error>,
    ) -> bool {
        match policy_errors {
            None => true,
            Some(e) => {
                warn!("certificate error: {}", e);
                false
            }
        }
    }

    fn select_local_certificate(
        &self,
        _target_host: &str,
        local_certificates: &[ClientIdentity],
        acceptable_issuers: &[&[u8]],
    ) -> Option<usize> {
        if !acceptable_issuers.is_empty() {
            let matching = local_certificates.iter().position(|identity| {
                identity
                    .issuer()
                    .map_or(false, |issuer| acceptable_issuers.iter().any(|hint| *hint == issuer))
            });
            if matching.is_some() {
                return matching;
            }
        }
        if local_certificates.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Accepts every server certificate without looking at it.
///
/// Only use this against servers with self-signed certificates on a network you trust.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAnyCertificate;

impl CertificatePolicy for AcceptAnyCertificate {
    fn validate_remote_certificate(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _policy_errors: Option<&rustls::Error>,
    ) -> bool {
        true
    }

    fn select_local_certificate(
        &self,
        target_host: &str,
        local_certificates: &[ClientIdentity],
        acceptable_issuers: &[&[u8]],
    ) -> Option<usize> {
        DefaultCertificatePolicy.select_local_certificate(
            target_host,
            local_certificates,
            acceptable_issuers,
        )
    }
}

/// A client certificate chain and its private key, for servers that require mutual TLS.
#[derive(Clone, Debug)]
pub struct ClientIdentity {
    issuer: Option<Vec<u8>>,
    key: Arc<CertifiedKey>,
}

impl ClientIdentity {
    /// Build an identity from a certificate chain (leaf first) and the leaf's private key.
    ///
    /// The issuer is read from the leaf certificate, as the DER-encoded name servers list among
    /// their acceptable issuers.
    pub fn new(chain: Vec<CertificateDer<'static>>, key: &PrivateKeyDer<'_>) -> Result<Self> {
        let issuer = match chain.first() {
            Some(leaf) => Some(issuer_name(leaf)?),
            None => None,
        };
        let signer = rustls::crypto::ring::sign::any_supported_type(key)?;
        Ok(ClientIdentity {
            issuer,
            key: Arc::new(CertifiedKey::new(chain, signer)),
        })
    }

    /// Override the DER-encoded issuer name matched against the server's acceptable issuers.
    pub fn with_issuer(mut self, issuer: impl Into<Vec<u8>>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn issuer(&self) -> Option<&[u8]> {
        self.issuer.as_deref()
    }

    /// The certificate chain presented to the server.
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.key.cert
    }
}

// the full DER `Name`, outer SEQUENCE included, which is how rustls hands out root hints
fn issuer_name(cert: &CertificateDer<'_>) -> Result<Vec<u8>> {
    match X509Certificate::from_der(cert.as_ref()) {
        Ok((_, parsed)) => Ok(parsed.issuer().as_raw().to_vec()),
        Err(e) => {
            warn!("unparsable client certificate: {}", e);
            Err(rustls::Error::InvalidCertificate(CertificateError::BadEncoding).into())
        }
    }
}

/// Runs the WebPKI checks and lets the policy have the final word.
#[derive(Debug)]
pub(crate) struct PolicyVerifier {
    inner: Arc<WebPkiServerVerifier>,
    policy: Arc<dyn CertificatePolicy>,
}

impl PolicyVerifier {
    pub(crate) fn new(inner: Arc<WebPkiServerVerifier>, policy: Arc<dyn CertificatePolicy>) -> Self {
        PolicyVerifier { inner, policy }
    }
}

impl ServerCertVerifier for PolicyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let policy_errors = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            .err();
        if self
            .policy
            .validate_remote_certificate(end_entity, intermediates, policy_errors.as_ref())
        {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(policy_errors.unwrap_or_else(|| {
                rustls::Error::General("server certificate rejected by policy".to_string())
            }))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Asks the policy which identity to present.
#[derive(Debug)]
pub(crate) struct PolicyResolver {
    target_host: String,
    identities: Vec<ClientIdentity>,
    policy: Arc<dyn CertificatePolicy>,
}

impl PolicyResolver {
    pub(crate) fn new(
        target_host: &str,
        identities: Vec<ClientIdentity>,
        policy: Arc<dyn CertificatePolicy>,
    ) -> Self {
        PolicyResolver {
            target_host: target_host.to_string(),
            identities,
            policy,
        }
    }
}

impl ResolvesClientCert for PolicyResolver {
    fn resolve(
        &self,
        root_hint_subjects: &[&[u8]],
        _sigschemes: &[SignatureScheme],
    ) -> Option<Arc<CertifiedKey>> {
        let index = self.policy.select_local_certificate(
            &self.target_host,
            &self.identities,
            root_hint_subjects,
        )?;
        self.identities
            .get(index)
            .map(|identity| Arc::clone(&identity.key))
    }

    fn has_certs(&self) -> bool {
        !self.identities.is_empty()
    }
}

//! TLS-wrapped TCP connection to the POP3 server.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::debug;

use crate::certificate::{CertificatePolicy, ClientIdentity, PolicyResolver, PolicyVerifier};
use crate::conn::SetTimeout;
use crate::error::{Error, Result};

/// The stream type a [`Session`](crate::Session) talks over once connected.
pub type TlsStream = StreamOwned<ClientConnection, TcpStream>;

/// How the TLS handshake treats certificates on both sides.
#[derive(Clone, Debug)]
pub(crate) struct TlsSettings {
    pub(crate) policy: Arc<dyn CertificatePolicy>,
    pub(crate) identities: Vec<ClientIdentity>,
    pub(crate) extra_roots: Vec<CertificateDer<'static>>,
}

impl TlsSettings {
    fn client_config(&self, host: &str) -> Result<ClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        for cert in &self.extra_roots {
            roots.add(cert.clone())?;
        }
        let webpki =
            WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
                .build()?;

        let verifier = PolicyVerifier::new(webpki, Arc::clone(&self.policy));
        let resolver = PolicyResolver::new(host, self.identities.clone(), Arc::clone(&self.policy));

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_client_cert_resolver(Arc::new(resolver));
        Ok(config)
    }
}

/// Open a TCP connection to `host:port` and complete the TLS handshake over it.
///
/// Every address `host` resolves to is tried in order; `timeout` bounds each attempt and is
/// then installed as the read and write deadline of the socket.
pub(crate) fn connect(
    host: &str,
    port: u16,
    timeout: Option<Duration>,
    tls: &TlsSettings,
) -> Result<TlsStream> {
    let connection_failed = |source: io::Error| Error::ConnectionFailed {
        host: host.to_string(),
        port,
        source,
    };

    let mut tcp = connect_tcp(host, port, timeout).map_err(connection_failed)?;
    tcp.set_timeout(timeout)?;

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| Error::InvalidServerName(host.to_string()))?;
    let config = tls.client_config(host)?;
    let mut conn = ClientConnection::new(Arc::new(config), server_name)?;

    while conn.is_handshaking() {
        conn.complete_io(&mut tcp).map_err(connection_failed)?;
    }
    debug!(
        "TLS session established with {}:{} ({:?})",
        host,
        port,
        conn.protocol_version()
    );

    Ok(StreamOwned::new(conn, tcp))
}

// resolve address and try to connect to all in order
fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(tcp) => return Ok(tcp),
            Err(e) => {
                debug!("couldn't connect to {}: {}", addr, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", host),
        )
    }))
}

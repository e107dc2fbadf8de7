use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use tracing::{debug, info};

use crate::certificate::{CertificatePolicy, ClientIdentity, DefaultCertificatePolicy};
use crate::client::Session;
use crate::config::Config;
use crate::error::Result;
use crate::transport::{self, TlsSettings, TlsStream};

/// A convenience builder for [`Session`]s over TLS.
///
/// Connecting and logging in with the default certificate checks is straightforward:
/// ```no_run
/// # use pop3s::{ClientBuilder, Config};
/// # fn main() -> Result<(), pop3s::Error> {
/// let config = Config::new("pop.example.com", "user", "password");
/// let session = ClientBuilder::new(config).login()?;
/// # Ok(())
/// # }
/// ```
///
/// For a server with a self-signed certificate, either trust it explicitly with
/// [`root_certificate`](Self::root_certificate), or swap in a different policy:
/// ```no_run
/// # use std::sync::Arc;
/// # use pop3s::{AcceptAnyCertificate, ClientBuilder, Config};
/// # fn main() -> Result<(), pop3s::Error> {
/// let config = Config::new("pop.example.com", "user", "password");
/// let mut session = ClientBuilder::new(config)
///     .certificate_policy(Arc::new(AcceptAnyCertificate))
///     .connect()?;
/// session.authenticate("user", "password")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ClientBuilder {
    config: Config,
    tls: TlsSettings,
}

impl ClientBuilder {
    /// Make a new `ClientBuilder` from the given connection settings.
    pub fn new(config: Config) -> Self {
        ClientBuilder {
            config,
            tls: TlsSettings {
                policy: Arc::new(DefaultCertificatePolicy),
                identities: Vec::new(),
                extra_roots: Vec::new(),
            },
        }
    }

    /// Decide on server and client certificates with `policy` instead of
    /// [`DefaultCertificatePolicy`].
    pub fn certificate_policy(mut self, policy: Arc<dyn CertificatePolicy>) -> Self {
        self.tls.policy = policy;
        self
    }

    /// Offer `identity` to servers that ask for a client certificate.
    ///
    /// May be called several times; the policy picks among the identities in the order they were
    /// added.
    pub fn client_identity(mut self, identity: ClientIdentity) -> Self {
        self.tls.identities.push(identity);
        self
    }

    /// Trust `cert` as a root in addition to the bundled Mozilla roots.
    pub fn root_certificate(mut self, cert: CertificateDer<'static>) -> Self {
        self.tls.extra_roots.push(cert);
        self
    }

    /// Open the TLS connection and return a session that still needs to
    /// [`authenticate`](Session::authenticate).
    pub fn connect(&self) -> Result<Session<TlsStream>> {
        let stream = transport::connect(
            &self.config.host,
            self.config.port,
            self.config.timeout,
            &self.tls,
        )?;
        let mut session = Session::new(stream);
        session.set_retr_attempts(self.config.retr_attempts);
        Ok(session)
    }

    /// Connect, then log in with the credentials from the [`Config`].
    ///
    /// If the server turns the login down, the session is closed with `QUIT` before the error is
    /// returned.
    pub fn login(&self) -> Result<Session<TlsStream>> {
        let mut session = self.connect()?;
        if let Err(e) = session.authenticate(&self.config.username, &self.config.password) {
            if session.quit().is_err() {
                debug!("QUIT after failed login was not accepted");
            }
            return Err(e);
        }
        info!(
            "logged in to {}:{} as {}",
            self.config.host, self.config.port, self.config.username
        );
        Ok(session)
    }
}

//! Connection settings for a POP3 session.

use std::fmt;
use std::time::Duration;

/// The IANA-assigned port for POP3 over TLS.
pub const DEFAULT_PORT: u16 = 995;

/// Applied to the TCP connect and to every blocking read or write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How many times a `RETR` transfer is started before giving up on the message.
pub const DEFAULT_RETR_ATTEMPTS: u32 = 3;

/// Everything needed to reach and log in to a mailbox.
///
/// Only the host and the credentials are mandatory; everything else has a default:
///
/// ```
/// # use std::time::Duration;
/// let config = pop3s::Config::new("pop.example.com", "user", "secret")
///     .with_port(1995)
///     .with_timeout(Some(Duration::from_secs(10)));
/// assert_eq!(config.retr_attempts, 3);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// `None` blocks without limit.
    pub timeout: Option<Duration>,
    pub retr_attempts: u32,
}

impl Config {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Config {
        Config {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            retr_attempts: DEFAULT_RETR_ATTEMPTS,
        }
    }

    pub fn with_port(mut self, port: u16) -> Config {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Config {
        self.timeout = timeout;
        self
    }

    /// A value of 0 is treated as 1: a message is always requested at least once.
    pub fn with_retr_attempts(mut self, attempts: u32) -> Config {
        self.retr_attempts = attempts.max(1);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retr_attempts", &self.retr_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::new("pop.example.com", "user", "pass");
        assert_eq!(c.port, 995);
        assert_eq!(c.timeout, Some(Duration::from_secs(30)));
        assert_eq!(c.retr_attempts, 3);
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let c = Config::new("h", "u", "p").with_retr_attempts(0);
        assert_eq!(c.retr_attempts, 1);
    }

    #[test]
    fn debug_hides_password() {
        let c = Config::new("h", "u", "hunter2");
        let shown = format!("{:?}", c);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}

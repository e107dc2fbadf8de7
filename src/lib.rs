//! This crate lets you connect to and read a mailbox on a POP3 server over TLS, as described in
//! [RFC 1939](https://tools.ietf.org/html/rfc1939). It is a blocking client: every command writes
//! one line and waits for the server's answer.
//!
//! The entry point is [`ClientBuilder`], which opens the TLS connection. It yields a [`Session`]
//! which walks through the three POP3 phases: the greeting and login (see
//! [`Session::authenticate`]), the transaction commands (see [`Session::stat`],
//! [`Session::list`], [`Session::retr`], [`Session::dele`], [`Session::noop`] and
//! [`Session::rset`]), and finally [`Session::quit`].
//!
//! Below is a basic client example. See the `demos/` directory for a complete walk through a
//! mailbox.
//!
//! ```no_run
//! fn fetch_first() -> pop3s::Result<Option<String>> {
//!     let config = pop3s::Config::new("pop.example.com", "me@example.com", "password");
//!
//!     // connect and log in; a rejected login is reported as Error::AuthRejected
//!     let mut session = pop3s::ClientBuilder::new(config).login()?;
//!
//!     let stats = session.stat()?;
//!     if stats.message_count == 0 {
//!         session.quit()?;
//!         return Ok(None);
//!     }
//!
//!     // retr lists the message first, then reads every chunk of the reply
//!     session.retr(1)?;
//!     let body = session.responses().body()?;
//!
//!     // be nice to the server and sign off
//!     session.quit()?;
//!
//!     Ok(Some(body))
//! }
//! ```
//!
//! The raw fragments the server sent for the most recent command stay available through
//! [`Session::responses`]; a `RETR` reply is kept exactly as it came off the wire, chunk by
//! chunk.
//!
//! Which server certificates are accepted, and which client certificate is presented, is decided
//! by a [`CertificatePolicy`]. The default only accepts certificates that pass the WebPKI checks
//! against the bundled Mozilla roots.

mod parse;
mod transport;
mod types;

pub mod cancel;
pub mod certificate;
pub mod client;
pub mod client_builder;
pub mod config;
pub mod conn;
pub mod error;

pub use crate::cancel::CancelToken;
pub use crate::certificate::{
    AcceptAnyCertificate, CertificatePolicy, ClientIdentity, DefaultCertificatePolicy,
};
pub use crate::client::{Connection, Session};
pub use crate::client_builder::ClientBuilder;
pub use crate::config::Config;
pub use crate::conn::SetTimeout;
pub use crate::error::{Error, Result};
pub use crate::transport::TlsStream;
pub use crate::types::*;

#[cfg(test)]
mod mock_stream;

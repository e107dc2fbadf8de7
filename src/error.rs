//! POP3 error types.

use std::io::Error as IoError;
use std::result;

use rustls::client::VerifierBuilderError;
use thiserror::Error;

use crate::types::{AuthStage, SessionState};

/// A convenience wrapper around `Result` for `pop3s::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur in the POP3 client
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The TCP connection or the TLS handshake to the server failed.
    #[error("could not connect to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: IoError,
    },
    /// The TLS client configuration could not be built, e.g. because of an unusable client key.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),
    /// The certificate verifier could not be built from the configured trust anchors.
    #[error("certificate verifier error: {0}")]
    Verifier(#[from] VerifierBuilderError),
    /// The host name is not usable as a TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),
    /// The greeting, `USER` or `PASS` round trip got a negative response.
    #[error("authentication rejected at {stage}: {response}")]
    AuthRejected { stage: AuthStage, response: String },
    /// A transaction command got a negative response.
    #[error("{command} rejected: {response}")]
    CommandRejected {
        command: &'static str,
        response: String,
    },
    /// A positive response carried a field that could not be parsed.
    #[error("malformed response: {0:?}")]
    MalformedResponse(String),
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    #[error(transparent)]
    Io(#[from] IoError),
    /// The connection was terminated unexpectedly.
    #[error("connection lost")]
    ConnectionLost,
    /// A `RETR` transfer never produced the end-of-message marker.
    #[error("message body incomplete after {attempts} attempts")]
    IncompleteBody { attempts: u32 },
    /// The operation was cancelled through a [`CancelToken`](crate::CancelToken).
    #[error("operation cancelled")]
    Cancelled,
    /// The command is not valid in the current session state.
    #[error("{command} is not valid in state {state:?}")]
    InvalidState {
        command: &'static str,
        state: SessionState,
    },
    /// Error validating input data
    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl Error {
    /// Whether this error leaves the session unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::ConnectionLost | Error::IncompleteBody { .. } | Error::Cancelled
        )
    }
}

/// An invalid character was found in a command argument.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid character in input: {0:?}")]
pub struct ValidateError(pub char);

use std::fmt;

/// The lifecycle state of a [`Session`](crate::Session).
///
/// A session starts out `Disconnected` (the transport is up, but nobody has logged in yet),
/// becomes `Authenticated` once the greeting, `USER` and `PASS` round trips all succeeded, and
/// ends up `Closed` after `QUIT` or after a transport failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SessionState {
    Disconnected,
    Authenticated,
    Closed,
}

impl Default for SessionState {
    fn default() -> SessionState {
        SessionState::Disconnected
    }
}

/// The round trip of the login handshake that was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AuthStage {
    /// The server greeting, read before any command is sent.
    Greeting,
    /// The `USER` command.
    User,
    /// The `PASS` command.
    Pass,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            AuthStage::Greeting => "greeting",
            AuthStage::User => "USER",
            AuthStage::Pass => "PASS",
        })
    }
}

//! This module contains types used throughout the POP3 protocol.

mod response;
mod state;
mod stats;

pub use self::response::{ResponseLog, Status};
pub(crate) use self::response::OK;
pub use self::state::{AuthStage, SessionState};
pub use self::stats::{MailboxStats, MessageInfo};

/// From [section 5 of RFC 1939](https://tools.ietf.org/html/rfc1939#section-5).
///
/// The message-number of a message in the maildrop. Message numbers start at 1 and are only
/// valid for the duration of one session; a message marked as deleted keeps its number until
/// the session ends.
pub type MessageNumber = u32;

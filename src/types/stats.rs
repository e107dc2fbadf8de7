use std::fmt;

use super::MessageNumber;

/// The maildrop summary returned by `STAT`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct MailboxStats {
    pub message_count: u32,
    pub total_size: u64,
}

impl fmt::Display for MailboxStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "messages: {}, size: {} octets",
            self.message_count, self.total_size
        )
    }
}

/// The scan listing of a single message returned by `LIST n`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct MessageInfo {
    pub id: MessageNumber,
    pub size: u64,
}

impl fmt::Display for MessageInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "message {}: {} octets", self.id, self.size)
    }
}

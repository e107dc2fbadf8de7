use std::ops::Index;
use std::slice::Iter;

use crate::error::{Error, Result};

/// The positive status indicator that starts every successful reply.
pub(crate) const OK: &str = "+OK";

/// Terminates a multi-line response: a line holding a single `.`.
pub(crate) const END_OF_MESSAGE: &str = "\r\n.\r\n";

/// From [section 3 of RFC 1939](https://tools.ietf.org/html/rfc1939#section-3).
///
/// Every reply starts with a status indicator. Anything that does not start with `+OK` is
/// treated as negative, which covers `-ERR` as well as garbage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Status {
    Positive,
    Negative,
}

impl Status {
    /// Classify a raw fragment by its leading status indicator.
    pub fn of(fragment: &str) -> Status {
        if fragment.starts_with(OK) {
            Status::Positive
        } else {
            Status::Negative
        }
    }

    pub fn is_positive(self) -> bool {
        self == Status::Positive
    }
}

/// The raw fragments read from the server for the most recent command.
///
/// For single round trip commands this holds exactly one fragment. For `RETR` it holds every
/// chunk read off the wire in the order it was received, without any reassembly: a line of the
/// message may well be split over two fragments, and the terminating `.` line may be a fragment
/// of its own.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResponseLog {
    fragments: Vec<String>,
}

impl ResponseLog {
    pub(crate) fn new() -> ResponseLog {
        ResponseLog::default()
    }

    pub(crate) fn push(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    pub(crate) fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Number of fragments in the log.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The fragment at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fragments.get(index).map(String::as_str)
    }

    /// The most recently received fragment.
    pub fn last(&self) -> Option<&str> {
        self.fragments.last().map(String::as_str)
    }

    /// Iterate over the fragments in receipt order.
    pub fn iter(&self) -> Iter<'_, String> {
        self.fragments.iter()
    }

    /// All fragments joined back together.
    pub fn concat(&self) -> String {
        self.fragments.concat()
    }

    /// Whether the text formed by all fragments ends with `suffix`, even when the suffix is split
    /// over several fragments.
    pub fn ends_with(&self, suffix: &str) -> bool {
        let mut tail = self.fragments.iter().rev().flat_map(|f| f.chars().rev());
        suffix.chars().rev().all(|c| tail.next() == Some(c))
    }

    /// Whether the log ends with the end-of-message marker.
    pub fn is_complete(&self) -> bool {
        self.ends_with(END_OF_MESSAGE)
    }

    /// Reassemble the message carried by a complete `RETR` response.
    ///
    /// The status line and the terminating `.` line are removed and dot-stuffing is undone, as
    /// described in [section 3 of RFC 1939](https://tools.ietf.org/html/rfc1939#section-3). The
    /// lines keep their CRLF terminators.
    pub fn body(&self) -> Result<String> {
        let raw = self.concat();
        if !raw.starts_with(OK) || !raw.ends_with(END_OF_MESSAGE) {
            return Err(Error::MalformedResponse(raw));
        }
        let start = match raw.find("\r\n") {
            Some(i) => i + 2,
            None => return Err(Error::MalformedResponse(raw)),
        };
        let content = match raw[start..].strip_suffix(".\r\n") {
            Some(c) if c.is_empty() || c.ends_with("\r\n") => c,
            _ => return Err(Error::MalformedResponse(raw)),
        };

        let mut body = String::with_capacity(content.len());
        for line in content.split_inclusive("\r\n") {
            body.push_str(line.strip_prefix('.').unwrap_or(line));
        }
        Ok(body)
    }
}

impl Index<usize> for ResponseLog {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.fragments[index]
    }
}

impl<'a> IntoIterator for &'a ResponseLog {
    type Item = &'a String;
    type IntoIter = Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

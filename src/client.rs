use bufstream::BufStream;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::cancel::CancelToken;
use super::config::DEFAULT_RETR_ATTEMPTS;
use super::conn::SetTimeout;
use super::error::{Error, Result, ValidateError};
use super::parse::{parse_list, parse_stat};
use super::types::*;

/// Largest amount of data taken off the wire by a single read.
pub const READ_CHUNK: usize = 1024;

/// Allowance on top of twice the listed size before a `RETR` transfer is considered runaway.
const BODY_SLACK: u64 = 4096;

const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

fn validate_str(value: &str) -> Result<&str> {
    if value.contains('\n') {
        return Err(Error::Validate(ValidateError('\n')));
    }
    if value.contains('\r') {
        return Err(Error::Validate(ValidateError('\r')));
    }
    Ok(value)
}

fn is_timeout(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock
}

/// The command channel to a POP3 server: writes command lines and reads raw reply chunks.
///
/// A `Connection` knows nothing about session state; [`Session`] drives it.
#[derive(Debug)]
pub struct Connection<T: Read + Write> {
    pub(crate) stream: BufStream<T>,
}

impl<T: Read + Write> Connection<T> {
    /// Creates a new connection with the underlying stream.
    pub fn new(stream: T) -> Connection<T> {
        Connection {
            stream: BufStream::new(stream),
        }
    }

    /// Send `<verb> <args>\r\n`, or just `<verb>\r\n` without arguments.
    pub fn send_command(&mut self, verb: &str, args: Option<&str>) -> Result<()> {
        let line = match args {
            Some(args) => format!("{} {}", verb, args),
            None => verb.to_string(),
        };
        self.write_line(line.as_bytes())?;
        if verb == "PASS" {
            debug!("C: PASS ********");
        } else {
            debug!("C: {}", line);
        }
        Ok(())
    }

    /// Perform one blocking read of at most [`READ_CHUNK`] bytes and decode it as Latin-1.
    ///
    /// Whatever the server has sent so far is returned; this may be less than a line, or more
    /// than one.
    pub fn read_fragment(&mut self) -> Result<String> {
        let mut buf = [0u8; READ_CHUNK];
        let read = loop {
            match self.stream.read(&mut buf) {
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                r => break r?,
            }
        };
        if read == 0 {
            return Err(Error::ConnectionLost);
        }

        let fragment: String = buf[..read].iter().map(|&b| char::from(b)).collect();
        trace!("S: {:?}", fragment);
        Ok(fragment)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        Ok(())
    }
}

/// A POP3 session over one connection to the server.
///
/// A session is created [`Disconnected`](SessionState::Disconnected): the transport is up, but
/// the greeting has not been read yet. [`Session::authenticate`] performs the greeting, `USER`
/// and `PASS` round trips; after that the transaction commands become available. [`Session::quit`]
/// ends the session and releases the transport.
///
/// Every command clears the [`ResponseLog`] and fills it with what the server answered, so the
/// raw reply to the most recent command is always available through [`Session::responses`].
///
/// A session is meant for one caller at a time; nothing here is synchronized.
#[derive(Debug)]
pub struct Session<T: Read + Write> {
    conn: Option<Connection<T>>,
    state: SessionState,
    responses: ResponseLog,
    stats: Option<MailboxStats>,
    message_info: Option<MessageInfo>,
    retr_attempts: u32,
    cancel: CancelToken,
}

impl<T: Read + Write> Session<T> {
    /// Creates a new session on top of an established stream.
    pub fn new(stream: T) -> Session<T> {
        Session {
            conn: Some(Connection::new(stream)),
            state: SessionState::Disconnected,
            responses: ResponseLog::new(),
            stats: None,
            message_info: None,
            retr_attempts: DEFAULT_RETR_ATTEMPTS,
            cancel: CancelToken::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The raw fragments the server sent in reply to the most recent command.
    pub fn responses(&self) -> &ResponseLog {
        &self.responses
    }

    /// The result of the last successful [`Session::stat`].
    ///
    /// A failed `STAT` leaves this untouched, so it is only current if the most recent call
    /// succeeded.
    pub fn last_stats(&self) -> Option<MailboxStats> {
        self.stats
    }

    /// The result of the last successful [`Session::list`] (or of the listing done by
    /// [`Session::retr`]).
    pub fn last_message_info(&self) -> Option<MessageInfo> {
        self.message_info
    }

    /// A token that cancels a running [`Session::retr`] between two reads.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// How many times [`Session::retr`] starts a transfer before giving up.
    pub fn set_retr_attempts(&mut self, attempts: u32) {
        self.retr_attempts = attempts.max(1);
    }

    /// Read the greeting, then log in with `USER` and `PASS`.
    ///
    /// Each round trip is only attempted if the previous one was answered positively. On
    /// failure the session stays `Disconnected`; the caller should [`quit`](Session::quit) it
    /// rather than try again.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        self.require("authenticate", &[SessionState::Disconnected])?;
        let username = validate_str(username)?;
        let password = validate_str(password)?;

        self.responses.clear();
        self.expect_auth(AuthStage::Greeting)?;

        self.send_command("USER", Some(username))?;
        self.expect_auth(AuthStage::User)?;

        self.send_command("PASS", Some(password))?;
        self.expect_auth(AuthStage::Pass)?;

        self.state = SessionState::Authenticated;
        debug!("authenticated as {}", username);
        Ok(())
    }

    /// Get the number of messages in the maildrop and its total size.
    pub fn stat(&mut self) -> Result<MailboxStats> {
        self.require("STAT", &[SessionState::Authenticated])?;
        self.run_command_and_check_ok("STAT", None)?;
        let stats = parse_stat(self.last_response())?;
        self.stats = Some(stats);
        Ok(stats)
    }

    /// Get the size of message `n`.
    ///
    /// Only the single-message form is supported; listing the whole maildrop is not.
    pub fn list(&mut self, n: MessageNumber) -> Result<MessageInfo> {
        self.require("LIST", &[SessionState::Authenticated])?;
        self.run_command_and_check_ok("LIST", Some(&n.to_string()))?;
        let info = parse_list(self.last_response())?;
        self.message_info = Some(info);
        Ok(info)
    }

    /// Retrieve message `n`.
    ///
    /// The message is listed first; if that fails, `RETR` is never sent. On success the
    /// [`ResponseLog`] holds every chunk of the reply as it came off the wire: the status line,
    /// the still dot-stuffed message and the terminating `.` line. Use [`ResponseLog::body`] to
    /// get the message itself.
    ///
    /// A transfer that stops without the end-of-message marker (the read deadline expires, or far
    /// more data than the listed size arrives) is started over with a fresh `RETR`, up to the
    /// configured number of attempts; after that the session is closed with
    /// [`Error::IncompleteBody`]. A resent `RETR` whose reply does not start with a status line
    /// means the stream still carries the rest of an abandoned attempt; the session is closed
    /// with the same error right away.
    pub fn retr(&mut self, n: MessageNumber) -> Result<()> {
        self.require("RETR", &[SessionState::Authenticated])?;
        let info = self.list(n)?;
        let limit = info.size.saturating_mul(2).saturating_add(BODY_SLACK);
        let arg = n.to_string();

        for attempt in 1..=self.retr_attempts {
            self.responses.clear();
            self.send_command("RETR", Some(&arg))?;
            let received = self.read_body(limit, attempt)?;
            if self.responses.is_complete() {
                return Ok(());
            }
            warn!(
                "RETR {} attempt {}/{} ended without end-of-message marker ({} octets read, {} listed)",
                n, attempt, self.retr_attempts, received, info.size
            );
        }

        let attempts = self.retr_attempts;
        self.release();
        Err(Error::IncompleteBody { attempts })
    }

    /// Mark message `n` as deleted.
    pub fn dele(&mut self, n: MessageNumber) -> Result<()> {
        self.require("DELE", &[SessionState::Authenticated])?;
        self.run_command_and_check_ok("DELE", Some(&n.to_string()))
    }

    /// Send `NOOP`; the server only ever answers positively while the session is alive.
    pub fn noop(&mut self) -> Result<()> {
        self.require("NOOP", &[SessionState::Authenticated])?;
        self.run_command_and_check_ok("NOOP", None)
    }

    /// Unmark every message marked as deleted in this session.
    pub fn rset(&mut self) -> Result<()> {
        self.require("RSET", &[SessionState::Authenticated])?;
        self.run_command_and_check_ok("RSET", None)
    }

    /// End the session.
    ///
    /// The transport is released whatever the server answers, and the session is `Closed`
    /// afterwards.
    pub fn quit(&mut self) -> Result<()> {
        self.require(
            "QUIT",
            &[SessionState::Disconnected, SessionState::Authenticated],
        )?;
        let result = self.run_command_and_check_ok("QUIT", None);
        self.release();
        result
    }

    /// Read chunks of a `RETR` reply into the log until the end-of-message marker shows up, the
    /// read deadline expires or `limit` octets have been read. Returns the number of octets read.
    ///
    /// Once an earlier attempt has been abandoned, the stream can no longer be trusted to line up
    /// with the commands, so a negative first fragment closes the session instead of being
    /// reported as a rejection.
    fn read_body(&mut self, limit: u64, attempt: u32) -> Result<u64> {
        let mut received = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                return self.check(Err(Error::Cancelled));
            }
            let fragment = match self.conn.as_mut() {
                Some(conn) => conn.read_fragment(),
                None => Err(Error::ConnectionLost),
            };
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(Error::Io(ref e)) if is_timeout(e) => {
                    debug!("read timed out after {} octets", received);
                    return Ok(received);
                }
                Err(e) => return self.check(Err(e)),
            };

            let first = self.responses.is_empty();
            received += fragment.len() as u64;
            self.responses.push(fragment);
            if first && !Status::of(self.last_response()).is_positive() {
                if attempt > 1 {
                    warn!(
                        "RETR attempt {} got {:?} instead of a status line, stream out of sync",
                        attempt,
                        self.last_response()
                    );
                    self.release();
                    return Err(Error::IncompleteBody { attempts: attempt });
                }
                return Err(self.rejected("RETR"));
            }
            if self.responses.is_complete() || received > limit {
                return Ok(received);
            }
        }
    }

    /// Runs a command and checks if it returns `+OK`.
    fn run_command_and_check_ok(&mut self, command: &'static str, args: Option<&str>) -> Result<()> {
        self.responses.clear();
        self.send_command(command, args)?;
        if self.read_fragment()?.is_positive() {
            Ok(())
        } else {
            Err(self.rejected(command))
        }
    }

    fn expect_auth(&mut self, stage: AuthStage) -> Result<()> {
        if self.read_fragment()?.is_positive() {
            Ok(())
        } else {
            let response = self.last_response().to_string();
            debug!("authentication rejected at {}: {:?}", stage, response);
            Err(Error::AuthRejected { stage, response })
        }
    }

    fn rejected(&self, command: &'static str) -> Error {
        let response = self.last_response().to_string();
        debug!("{} rejected: {:?}", command, response);
        Error::CommandRejected { command, response }
    }

    fn send_command(&mut self, verb: &str, args: Option<&str>) -> Result<()> {
        let result = match self.conn.as_mut() {
            Some(conn) => conn.send_command(verb, args),
            None => Err(Error::ConnectionLost),
        };
        self.check(result)
    }

    /// Read one fragment into the log and classify it.
    fn read_fragment(&mut self) -> Result<Status> {
        let result = match self.conn.as_mut() {
            Some(conn) => conn.read_fragment(),
            None => Err(Error::ConnectionLost),
        };
        let fragment = self.check(result)?;
        let status = Status::of(&fragment);
        self.responses.push(fragment);
        Ok(status)
    }

    fn last_response(&self) -> &str {
        self.responses.last().unwrap_or("")
    }

    fn require(&self, command: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                command,
                state: self.state,
            })
        }
    }

    /// Close the session if `result` carries an error the connection cannot recover from.
    fn check<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(ref e) = result {
            if e.is_fatal() {
                debug!("closing session after fatal error: {}", e);
                self.release();
            }
        }
        result
    }

    fn release(&mut self) {
        self.conn = None;
        self.state = SessionState::Closed;
    }
}

impl<T: SetTimeout + Read + Write> Session<T> {
    /// Set the deadline for every subsequent read and write. `None` blocks without limit.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match self.conn.as_mut() {
            Some(conn) => conn.stream.get_mut().set_timeout(timeout),
            None => Err(Error::InvalidState {
                command: "set_timeout",
                state: self.state,
            }),
        }
    }
}

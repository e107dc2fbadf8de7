use std::cell::RefCell;
use std::cmp::min;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Read, Result, Write};
use std::rc::Rc;
use std::time::Duration;

use crate::conn::SetTimeout;

/// A scripted server. Every `read` hands out at most one of the queued chunks, so a test controls
/// exactly where the wire splits a reply. An empty chunk makes that read time out.
#[derive(Debug)]
pub struct MockStream {
    chunks: VecDeque<Vec<u8>>,
    written: Rc<RefCell<Vec<u8>>>,
    pub timeout: Option<Duration>,
    err_on_read: bool,
    timeout_on_read: bool,
    endless: Option<Vec<u8>>,
}

impl Default for MockStream {
    fn default() -> Self {
        MockStream {
            chunks: VecDeque::new(),
            written: Rc::new(RefCell::new(Vec::new())),
            timeout: None,
            err_on_read: false,
            timeout_on_read: false,
            endless: None,
        }
    }
}

impl MockStream {
    pub fn new<S: AsRef<[u8]>>(chunks: &[S]) -> MockStream {
        MockStream {
            chunks: chunks.iter().map(|c| c.as_ref().to_vec()).collect(),
            ..MockStream::default()
        }
    }

    /// Once the script runs dry, reads fail with an I/O error instead of returning EOF.
    pub fn with_err(mut self) -> MockStream {
        self.err_on_read = true;
        self
    }

    /// Once the script runs dry, reads time out instead of returning EOF.
    pub fn with_timeout(mut self) -> MockStream {
        self.timeout_on_read = true;
        self
    }

    /// Once the script runs dry, every read returns `chunk` again.
    pub fn with_endless<S: AsRef<[u8]>>(mut self, chunk: S) -> MockStream {
        self.endless = Some(chunk.as_ref().to_vec());
        self
    }

    /// A handle on everything the client wrote, still readable after the stream is dropped.
    pub fn written(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.written)
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let chunk = match self.chunks.pop_front() {
            Some(chunk) => chunk,
            None if self.err_on_read => {
                return Err(Error::new(ErrorKind::Other, "MockStream Error"));
            }
            None if self.timeout_on_read => {
                return Err(Error::new(ErrorKind::TimedOut, "MockStream timeout"));
            }
            None => match self.endless {
                Some(ref chunk) => chunk.clone(),
                None => return Ok(0),
            },
        };
        if chunk.is_empty() {
            return Err(Error::new(ErrorKind::TimedOut, "MockStream timeout"));
        }
        let len = min(buf.len(), chunk.len());
        buf[..len].copy_from_slice(&chunk[..len]);
        if len < chunk.len() {
            self.chunks.push_front(chunk[len..].to_vec());
        }
        Ok(len)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl SetTimeout for MockStream {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> crate::error::Result<()> {
        self.timeout = timeout;
        Ok(())
    }
}

use std::net::TcpStream;
use std::time::Duration;

use rustls::{ClientConnection, StreamOwned};

use crate::error::Result;

/// Must be implemented for a transport in order for a `Session` using that transport to support
/// changing its deadline after connecting.
pub trait SetTimeout {
    /// Set the timeout for subsequent reads and writes to the given one.
    ///
    /// If `timeout` is `None`, the timeout should be removed.
    ///
    /// See also `std::net::TcpStream::set_read_timeout`.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

impl SetTimeout for TcpStream {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)?;
        Ok(())
    }
}

impl SetTimeout for StreamOwned<ClientConnection, TcpStream> {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.sock.set_timeout(timeout)
    }
}

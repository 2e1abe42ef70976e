//! Socket plumbing shared by the control and data connections

use log::{debug, warn};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{RaxFtpClientError, Result};

/// Owned socket with an explicit open/closed tag.
///
/// Closing is idempotent: the stream is shut down in both directions, dropped,
/// and the handle flips to `Closed`.
#[derive(Debug, Default)]
pub enum SocketHandle {
    Open(TcpStream),
    #[default]
    Closed,
}

impl SocketHandle {
    pub fn is_open(&self) -> bool {
        matches!(self, SocketHandle::Open(_))
    }

    /// Borrow the live stream, or fail if the handle has been closed
    pub fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        match self {
            SocketHandle::Open(stream) => Ok(stream),
            SocketHandle::Closed => Err(RaxFtpClientError::NotConnected(
                "Socket is closed".to_string(),
            )),
        }
    }

    pub fn stream(&self) -> Option<&TcpStream> {
        match self {
            SocketHandle::Open(stream) => Some(stream),
            SocketHandle::Closed => None,
        }
    }

    /// Shut down and release the stream; returns whether anything was open
    pub fn close(&mut self) -> bool {
        match std::mem::take(self) {
            SocketHandle::Open(stream) => {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    // The peer may already have gone away; the socket is released regardless.
                    if e.kind() != io::ErrorKind::NotConnected {
                        warn!("Socket shutdown failed: {}", e);
                    }
                }
                debug!("Socket closed");
                true
            }
            SocketHandle::Closed => false,
        }
    }
}

/// Lets another thread abort a blocking call by shutting the socket down
#[derive(Debug)]
pub struct InterruptHandle {
    stream: TcpStream,
}

impl InterruptHandle {
    pub(crate) fn new(stream: &TcpStream) -> Result<Self> {
        let stream = stream
            .try_clone()
            .map_err(|e| RaxFtpClientError::from_socket(e, "cloning socket"))?;
        Ok(Self { stream })
    }

    /// Shut the shared socket down; any blocked send/receive fails promptly
    pub fn interrupt(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("Interrupt on an already closed socket: {}", e);
        }
    }
}

/// Resolve `host:port`, connect within `timeout`, and apply `timeout` to every
/// subsequent send and receive on the stream.
pub fn connect_socket(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| {
            RaxFtpClientError::Connection(format!("Cannot resolve {}:{}: {}", host, port, e))
        })?
        .collect();

    if addrs.is_empty() {
        return Err(RaxFtpClientError::Connection(format!(
            "No addresses found for {}:{}",
            host, port
        )));
    }

    let mut last_error = None;
    for addr in &addrs {
        debug!("Connecting to {}", addr);
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => {
                apply_timeouts(&stream, timeout)?;
                return Ok(stream);
            }
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(RaxFtpClientError::Connection(format!(
        "Cannot connect to {}:{}: {}",
        host,
        port,
        last_error.map_or_else(|| "no usable address".to_string(), |e| e.to_string())
    )))
}

fn apply_timeouts(stream: &TcpStream, timeout: Duration) -> Result<()> {
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| RaxFtpClientError::Connection(format!("Cannot set socket timeouts: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_applies_timeouts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect_socket("127.0.0.1", port, Duration::from_millis(1500)).unwrap();
        assert_eq!(stream.read_timeout().unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(stream.write_timeout().unwrap(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_refused_connect_is_connection_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = connect_socket("127.0.0.1", port, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Connection(_)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();

        let mut handle = SocketHandle::Open(stream);
        assert!(handle.is_open());
        assert!(handle.close());
        assert!(!handle.close());
        assert!(!handle.is_open());
        assert!(matches!(
            handle.stream_mut(),
            Err(RaxFtpClientError::NotConnected(_))
        ));
    }
}

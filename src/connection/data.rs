//! Data connection management for FTP transfers

use log::{debug, info};
use std::io::{self, Write};
use std::time::Duration;

use super::socket::{SocketHandle, connect_socket};
use crate::error::{RaxFtpClientError, Result};
use crate::transfer::PassiveEndpoint;

/// Transient connection carrying the bytes of a single transfer
#[derive(Debug)]
pub struct DataChannel {
    socket: SocketHandle,
    endpoint: PassiveEndpoint,
    bytes_sent: u64,
}

impl DataChannel {
    /// Connect to the endpoint the server advertised in its PASV reply
    pub fn open(endpoint: &PassiveEndpoint, timeout: Duration) -> Result<Self> {
        info!("Opening data connection to {}", endpoint);

        let stream = connect_socket(&endpoint.address.to_string(), endpoint.port, timeout)?;

        Ok(Self {
            socket: SocketHandle::Open(stream),
            endpoint: endpoint.clone(),
            bytes_sent: 0,
        })
    }

    /// Write the whole buffer, retrying short writes until the transport has
    /// accepted every byte.
    pub fn send_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.socket.stream_mut()?;
        let mut remaining = data;

        while !remaining.is_empty() {
            match stream.write(remaining) {
                Ok(0) => {
                    return Err(RaxFtpClientError::Connection(
                        "Data connection stopped accepting bytes".to_string(),
                    ));
                }
                Ok(written) => {
                    remaining = &remaining[written..];
                    self.bytes_sent += written as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RaxFtpClientError::from_socket(e, "sending data")),
            }
        }

        debug!("Sent {} bytes, total: {}", data.len(), self.bytes_sent);
        Ok(())
    }

    /// Total bytes accepted by the transport so far
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Check if connection is established
    pub fn is_open(&self) -> bool {
        self.socket.is_open()
    }

    /// Shut down and close; closing twice is harmless.
    /// Closing is also how end-of-file is signalled to the server.
    pub fn close(&mut self) {
        if self.socket.close() {
            info!(
                "Data connection to {} closed after {} bytes",
                self.endpoint, self.bytes_sent
            );
        }
    }
}

impl Drop for DataChannel {
    fn drop(&mut self) {
        self.close();
    }
}

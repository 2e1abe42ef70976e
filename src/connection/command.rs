//! Command connection management for RAX FTP uploader
//!
//! Owns the control channel: CRLF-terminated commands go out, framed replies
//! come back. Sends and receives are deliberately separate calls so every
//! request/reply pairing is visible at the call site.

use log::{debug, info};
use std::io::Write;
use std::time::Duration;

use super::socket::{InterruptHandle, SocketHandle, connect_socket};
use crate::commands::{FtpCommand, validate_command_line};
use crate::error::{RaxFtpClientError, Result};
use crate::responses::{FtpResponse, ResponseFramer};

/// Manages the FTP command connection (main control channel)
#[derive(Debug)]
pub struct ControlChannel {
    socket: SocketHandle,
    framer: ResponseFramer,
    peer: Option<String>,
    timeout: Duration,
}

impl ControlChannel {
    /// Create a disconnected channel; `timeout` is used until the next connect
    pub fn new(timeout: Duration) -> Self {
        Self {
            socket: SocketHandle::Closed,
            framer: ResponseFramer::new(),
            peer: None,
            timeout,
        }
    }

    /// Connect to the server and consume its greeting.
    ///
    /// An existing connection is torn down first. The greeting is returned for
    /// callers that want to show it.
    pub fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<FtpResponse> {
        if self.is_connected() {
            debug!("Already connected, disconnecting before reconnect");
            self.disconnect();
        }

        self.timeout = timeout;
        let stream = connect_socket(host, port, timeout)?;
        self.socket = SocketHandle::Open(stream);
        self.framer.reset();
        self.peer = Some(format!("{}:{}", host, port));
        info!("Connected to FTP server at {}:{}", host, port);

        match self.receive_response(true) {
            Ok(greeting) => {
                info!("Server greeting: {}", greeting.text().trim_end());
                Ok(greeting)
            }
            Err(e) => {
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Check if the connection is active
    pub fn is_connected(&self) -> bool {
        self.socket.is_open()
    }

    /// Timeout applied to every socket this session opens
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a raw command line (CRLF is appended)
    pub fn send_command(&mut self, command: &str) -> Result<()> {
        validate_command_line(command)?;
        debug!("Sending command: {}", mask_password(command));
        let line = format!("{}\r\n", command);

        let result = {
            let stream = self.socket.stream_mut()?;
            stream.write_all(line.as_bytes()).and_then(|_| stream.flush())
        };

        result.map_err(|e| self.fail(RaxFtpClientError::from_socket(e, "sending command")))
    }

    /// Send a typed command
    pub fn send(&mut self, command: &FtpCommand) -> Result<()> {
        self.send_command(&command.to_ftp_string())
    }

    /// Read exactly one complete reply
    pub fn receive_response(&mut self, strip_trailing_newline: bool) -> Result<FtpResponse> {
        let result = {
            let stream = self.socket.stream_mut()?;
            self.framer.read_response(stream, strip_trailing_newline)
        };

        result.map_err(|e| self.fail(e))
    }

    /// Send a command and read its reply
    pub fn execute(&mut self, command: &FtpCommand) -> Result<FtpResponse> {
        self.send(command)?;
        self.receive_response(true)
    }

    /// Handle another thread can use to abort a blocked call
    pub fn interrupt_handle(&self) -> Result<InterruptHandle> {
        let stream = self.socket.stream().ok_or_else(|| {
            RaxFtpClientError::NotConnected("Control channel is not connected".to_string())
        })?;
        InterruptHandle::new(stream)
    }

    /// Shut down and close the control socket; a no-op when already closed
    pub fn disconnect(&mut self) {
        if self.socket.close() {
            info!(
                "Disconnected from {}",
                self.peer.as_deref().unwrap_or("server")
            );
        }
        self.framer.reset();
        self.peer = None;
    }

    /// Get connection info for display
    pub fn connection_info(&self) -> String {
        self.peer
            .clone()
            .unwrap_or_else(|| "not connected".to_string())
    }

    /// A lost connection, or a reply stream that is out of step, leaves
    /// nothing worth keeping open
    fn fail(&mut self, err: RaxFtpClientError) -> RaxFtpClientError {
        if matches!(
            err,
            RaxFtpClientError::Connection(_) | RaxFtpClientError::MalformedResponse(_)
        ) {
            self.disconnect();
        }
        err
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn mask_password(command: &str) -> &str {
    if command
        .get(..5)
        .is_some_and(|verb| verb.eq_ignore_ascii_case("PASS "))
    {
        "PASS [hidden]"
    } else {
        command
    }
}

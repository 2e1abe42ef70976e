use log::{debug, info};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use crate::commands::FtpCommand;
use crate::config::ClientConfig;
use crate::connection::{ControlChannel, InterruptHandle};
use crate::error::{RaxFtpClientError, Result};
use crate::responses::FtpResponse;
use crate::transfer::{
    DATA_CHUNK_SIZE, ProgressObserver, TransferProgress, TransferSummary, UploadTransfer,
    target_name, validate_upload_file,
};

/// Control port used by `connect` when none is given
pub const DEFAULT_PORT: u16 = 21;

/// Send/receive timeout until the caller configures another one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client connection state
#[derive(Debug, Clone, PartialEq)]
pub enum ClientState {
    Disconnected,
    Connected,
    Authenticated,
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientState::Disconnected => write!(f, "disconnected"),
            ClientState::Connected => write!(f, "connected"),
            ClientState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Raw replies to the USER/PASS exchange; judging them is up to the caller
#[derive(Debug, Clone)]
pub struct LogonReplies {
    pub user: FtpResponse,
    pub pass: FtpResponse,
}

impl LogonReplies {
    /// True when the server accepted the login (230 to either command)
    pub fn is_logged_in(&self) -> bool {
        self.pass.is_success() || self.user.is_success()
    }
}

/// FTP upload session: one control connection, one transfer at a time
pub struct RaxFtpClient {
    control: ControlChannel,
    state: ClientState,
    chunk_size: usize,
    observer: Option<ProgressObserver>,
}

impl RaxFtpClient {
    /// Create a disconnected client with default timeout and chunk size
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a disconnected client using the timeout and chunk size from `config`
    pub fn from_config(config: &ClientConfig) -> Self {
        info!("Creating RAX FTP client with config: {}", config);
        Self::with_timeout(config.timeout()).with_chunk_size(config.chunk_size())
    }

    fn with_timeout(timeout: Duration) -> Self {
        Self {
            control: ControlChannel::new(timeout),
            state: ClientState::Disconnected,
            chunk_size: DATA_CHUNK_SIZE,
            observer: None,
        }
    }

    /// Bytes per data-channel write
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Register a callback that receives upload progress after every chunk
    pub fn with_progress_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&TransferProgress) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Connect on the default port with the current timeout
    pub fn connect(&mut self, host: &str) -> Result<FtpResponse> {
        let timeout = self.control.timeout();
        self.connect_with_timeout(host, DEFAULT_PORT, timeout)
    }

    /// Connect with an explicit port and timeout (seconds)
    pub fn connect_with(&mut self, host: &str, port: u16, timeout_secs: u64) -> Result<FtpResponse> {
        self.connect_with_timeout(host, port, Duration::from_secs(timeout_secs))
    }

    /// Connect with an explicit port and timeout; an open session is closed first
    pub fn connect_with_timeout(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<FtpResponse> {
        if timeout.is_zero() {
            return Err(RaxFtpClientError::InvalidConfig(
                "Timeout cannot be 0".to_string(),
            ));
        }

        if self.state != ClientState::Disconnected || self.control.is_connected() {
            self.disconnect();
        }

        let greeting = self.control.connect(host, port, timeout);
        if greeting.is_ok() {
            self.state = ClientState::Connected;
        }
        self.track(greeting)
    }

    /// Send USER then PASS and hand back both replies
    pub fn logon(&mut self, user: &str, password: &str) -> Result<LogonReplies> {
        let user_reply = self.control.execute(&FtpCommand::User(user.to_string()));
        let user_reply = self.track(user_reply)?;

        let pass_reply = self.control.execute(&FtpCommand::Pass(password.to_string()));
        let pass_reply = self.track(pass_reply)?;

        let replies = LogonReplies {
            user: user_reply,
            pass: pass_reply,
        };

        if replies.is_logged_in() {
            debug!("Login accepted, updating state to Authenticated");
            self.state = ClientState::Authenticated;
        } else {
            debug!(
                "Login not accepted ({}), state stays {}",
                replies.pass.code, self.state
            );
        }

        Ok(replies)
    }

    /// Send QUIT and return the server's farewell
    pub fn logoff(&mut self) -> Result<FtpResponse> {
        let reply = self.control.execute(&FtpCommand::Quit);
        let reply = self.track(reply)?;

        if self.state == ClientState::Authenticated {
            self.state = ClientState::Connected;
        }
        Ok(reply)
    }

    /// Upload a local file under its own file name
    pub fn upload_path(&mut self, source: impl AsRef<Path>) -> Result<TransferSummary> {
        let source = source.as_ref();
        validate_upload_file(source)?;

        let source_str = source.to_string_lossy();
        let target = target_name(&source_str);
        if target.is_empty() {
            return Err(RaxFtpClientError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("No file name in '{}'", source.display()),
            )));
        }
        let target = target.to_string();

        let mut file = File::open(source)?;
        let length = file.metadata()?.len();
        self.run_upload(&mut file, &target, Some(length))
    }

    /// Upload a seekable stream from its beginning, wherever its cursor was left
    pub fn upload_stream<R: Read + Seek>(
        &mut self,
        source: &mut R,
        target: &str,
    ) -> Result<TransferSummary> {
        let length = source.seek(SeekFrom::End(0))?;
        source.rewind()?;
        self.run_upload(source, target, Some(length))
    }

    /// Upload whatever a plain reader yields from its current position
    pub fn upload_reader<R: Read>(
        &mut self,
        source: &mut R,
        target: &str,
    ) -> Result<TransferSummary> {
        self.run_upload(source, target, None)
    }

    /// Close any open connection; safe to call in every state, any number of times
    pub fn disconnect(&mut self) {
        self.control.disconnect();
        self.state = ClientState::Disconnected;
    }

    /// Send a raw command line without reading the reply
    pub fn send_command(&mut self, command: &str) -> Result<()> {
        let result = self.control.send_command(command);
        self.track(result)
    }

    /// Read one reply from the control connection
    pub fn receive_response(&mut self, strip_trailing_newline: bool) -> Result<FtpResponse> {
        let result = self.control.receive_response(strip_trailing_newline);
        self.track(result)
    }

    /// Handle another thread can use to abort a blocked call on this session
    pub fn interrupt_handle(&self) -> Result<InterruptHandle> {
        self.control.interrupt_handle()
    }

    /// Get current client state for display
    pub fn get_state(&self) -> &ClientState {
        &self.state
    }

    /// Check if client is connected
    pub fn is_connected(&self) -> bool {
        self.control.is_connected() && self.state != ClientState::Disconnected
    }

    /// Check if client is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.state == ClientState::Authenticated
    }

    pub fn timeout(&self) -> Duration {
        self.control.timeout()
    }

    /// Get connection info for display
    pub fn connection_info(&self) -> String {
        self.control.connection_info()
    }

    fn run_upload<R: Read>(
        &mut self,
        source: &mut R,
        target: &str,
        total_bytes: Option<u64>,
    ) -> Result<TransferSummary> {
        let result = UploadTransfer::new(&mut self.control, self.chunk_size)
            .with_observer(self.observer.as_mut())
            .run(source, target, total_bytes);
        self.track(result)
    }

    /// Keep the state in step with the control socket after every exchange
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if !self.control.is_connected() && self.state != ClientState::Disconnected {
            debug!("Control connection closed, updating state to Disconnected");
            self.state = ClientState::Disconnected;
        }
        result
    }
}

impl Default for RaxFtpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RaxFtpClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_is_disconnected() {
        let client = RaxFtpClient::new();
        assert_eq!(client.get_state(), &ClientState::Disconnected);
        assert!(!client.is_connected());
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_config_uses_timeout() {
        let mut config = ClientConfig::default();
        config.server.timeout_secs = 7;
        config.transfer.chunk_size = 1024;
        let client = RaxFtpClient::from_config(&config);
        assert_eq!(client.timeout(), Duration::from_secs(7));
        assert_eq!(client.chunk_size, 1024);
    }

    #[test]
    fn test_disconnect_twice_without_connecting() {
        let mut client = RaxFtpClient::new();
        client.disconnect();
        client.disconnect();
        assert_eq!(client.get_state(), &ClientState::Disconnected);
    }

    #[test]
    fn test_commands_need_a_connection() {
        let mut client = RaxFtpClient::new();
        assert!(matches!(
            client.logon("user", "pass"),
            Err(RaxFtpClientError::NotConnected(_))
        ));
        assert!(matches!(
            client.logoff(),
            Err(RaxFtpClientError::NotConnected(_))
        ));
        assert!(matches!(
            client.upload_reader(&mut io::empty(), "empty.bin"),
            Err(RaxFtpClientError::NotConnected(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut client = RaxFtpClient::new();
        assert!(matches!(
            client.connect_with("127.0.0.1", 21, 0),
            Err(RaxFtpClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_upload_of_missing_file_is_io_error() {
        let mut client = RaxFtpClient::new();
        assert!(matches!(
            client.upload_path("/no/such/dir/file.bin"),
            Err(RaxFtpClientError::Io(_))
        ));
    }
}

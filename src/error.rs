use std::fmt;
use std::io;

/// Main error type for the RAX FTP uploader
#[derive(Debug)]
pub enum RaxFtpClientError {
    // Connection Errors
    Connection(String),
    Timeout(String),
    NotConnected(String),

    // Protocol Errors
    MalformedResponse(String),
    Protocol(String),
    UnexpectedReply {
        expected: String,
        code: u16,
        message: String,
    },

    // Configuration Errors
    InvalidConfig(String),

    // Local IO Errors
    Io(io::Error),
}

impl fmt::Display for RaxFtpClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "Connection error: {}", msg),
            Self::Timeout(msg) => write!(f, "Timed out: {}", msg),
            Self::NotConnected(msg) => write!(f, "Not connected: {}", msg),

            Self::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            Self::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            Self::UnexpectedReply {
                expected,
                code,
                message,
            } => write!(
                f,
                "Protocol error: expected {} reply, got {} {}",
                expected, code, message
            ),

            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),

            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for RaxFtpClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Local (non-socket) IO failures, e.g. reading the upload source
impl From<io::Error> for RaxFtpClientError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<config::ConfigError> for RaxFtpClientError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl RaxFtpClientError {
    /// Classify an error raised by a socket operation.
    ///
    /// An expired send/receive timeout shows up as `TimedOut` or `WouldBlock`
    /// depending on the platform; everything else is a broken connection.
    pub fn from_socket(err: io::Error, context: &str) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                Self::Timeout(format!("{}: {}", context, err))
            }
            _ => Self::Connection(format!("{}: {}", context, err)),
        }
    }

    /// True for every error in the protocol class (bad tuple, wrong status class)
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::UnexpectedReply { .. })
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RaxFtpClientError>;

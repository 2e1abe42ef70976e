//! FTP Command definitions

use crate::error::{RaxFtpClientError, Result};

/// FTP commands issued by the RAX FTP uploader
#[derive(Debug, Clone, PartialEq)]
pub enum FtpCommand {
    /// USER - Username for authentication
    User(String),

    /// PASS - Password for authentication
    Pass(String),

    /// PASV - Ask the server for a passive data endpoint
    Pasv,

    /// STOR - Store/upload file to server
    Stor(String),

    /// QUIT - End the session
    Quit,
}

impl FtpCommand {
    /// Convert command to FTP protocol string (without CRLF)
    pub fn to_ftp_string(&self) -> String {
        match self {
            FtpCommand::User(username) => format!("USER {username}"),
            FtpCommand::Pass(password) => format!("PASS {password}"),
            FtpCommand::Pasv => "PASV".to_string(),
            FtpCommand::Stor(filename) => format!("STOR {filename}"),
            FtpCommand::Quit => "QUIT".to_string(),
        }
    }

    /// Check the command renders to exactly one line on the wire
    pub fn validate(&self) -> Result<()> {
        validate_command_line(&self.to_ftp_string())
    }
}

/// Reject a command line that carries its own CR or LF; the terminator is
/// appended when the line is sent.
pub fn validate_command_line(line: &str) -> Result<()> {
    if line.contains(['\r', '\n']) {
        return Err(RaxFtpClientError::Protocol(
            "Command argument contains a line break".to_string(),
        ));
    }
    Ok(())
}

impl std::fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FtpCommand::User(username) => write!(f, "USER {username}"),
            FtpCommand::Pass(_) => write!(f, "PASS [hidden]"),
            FtpCommand::Pasv => write!(f, "PASV"),
            FtpCommand::Stor(filename) => write!(f, "STOR {filename}"),
            FtpCommand::Quit => write!(f, "QUIT"),
        }
    }
}

//! Complete FTP replies as returned by the framer

use std::fmt;

use super::status_codes;
use crate::error::{RaxFtpClientError, Result};

/// One complete (possibly multi-line) FTP reply
#[derive(Debug, Clone, PartialEq)]
pub struct FtpResponse {
    /// Reply code taken from the first line (e.g. 220, 227, 550)
    pub code: u16,

    /// Reply lines in arrival order, without line terminators
    pub lines: Vec<String>,

    /// Whether `text()` keeps the final newline
    trailing_newline: bool,
}

impl FtpResponse {
    /// Build a response from framed lines, extracting the status code
    pub fn from_lines(lines: Vec<String>, strip_trailing_newline: bool) -> Result<Self> {
        let first = lines.first().ok_or_else(|| {
            RaxFtpClientError::MalformedResponse("Empty response".to_string())
        })?;

        let code = parse_status_code(first)?;

        Ok(Self {
            code,
            lines,
            trailing_newline: !strip_trailing_newline,
        })
    }

    /// Text after the status code on the last line
    pub fn message(&self) -> &str {
        self.lines
            .last()
            .and_then(|line| line.get(4..))
            .unwrap_or("")
            .trim_end()
    }

    /// Full reply text, lines joined with `\n`
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    pub fn is_multiline(&self) -> bool {
        self.lines.len() > 1
    }

    pub fn is_preliminary(&self) -> bool {
        status_codes::is_preliminary(self.code)
    }

    pub fn is_success(&self) -> bool {
        status_codes::is_success(self.code)
    }

    pub fn is_error(&self) -> bool {
        status_codes::is_error(self.code)
    }
}

impl fmt::Display for FtpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Parse the leading three digits of a reply line
pub fn parse_status_code(line: &str) -> Result<u16> {
    let code_str = line.get(0..3).ok_or_else(|| {
        RaxFtpClientError::MalformedResponse(format!("Line too short for a status code: {:?}", line))
    })?;

    if !code_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RaxFtpClientError::MalformedResponse(format!(
            "Invalid status code: {:?}",
            code_str
        )));
    }

    code_str.parse::<u16>().map_err(|_| {
        RaxFtpClientError::MalformedResponse(format!("Invalid status code: {:?}", code_str))
    })
}

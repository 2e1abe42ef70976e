//! Reply framing for the control channel
//!
//! Assembles complete FTP replies out of whatever chunks the socket hands
//! back. A reply ends at the first line whose fourth character is not the
//! continuation marker `-`. Bytes that arrive after that line belong to the
//! next reply and stay buffered for the next call.

use log::debug;
use std::io::{self, Read};

use super::response::{FtpResponse, parse_status_code};
use crate::error::{RaxFtpClientError, Result};

/// Size of a single socket read
pub const READ_CHUNK_SIZE: usize = 4096;

/// Longest unterminated line accepted before the reply is given up on
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

const CONTINUATION_MARKER: u8 = b'-';

/// Stateful framer; keep one per control connection
#[derive(Debug, Default)]
pub struct ResponseFramer {
    pending: Vec<u8>,
}

impl ResponseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received but not yet claimed by a reply
    pub fn buffered(&self) -> &[u8] {
        &self.pending
    }

    /// Drop any buffered bytes (used when the connection is torn down)
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Read from `source` until one complete reply is available and return it
    pub fn read_response<R: Read>(
        &mut self,
        source: &mut R,
        strip_trailing_newline: bool,
    ) -> Result<FtpResponse> {
        let mut lines = Vec::new();
        let mut consumed = 0;

        loop {
            while let Some(offset) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
                let end = consumed + offset + 1;
                let line = decode_line(&self.pending[consumed..end]);
                consumed = end;

                let is_final = match is_final_line(&line) {
                    Ok(is_final) => is_final,
                    Err(e) => {
                        // The stream is out of step with the protocol; nothing buffered is usable.
                        self.pending.clear();
                        return Err(e);
                    }
                };

                lines.push(line);
                if is_final {
                    self.pending.drain(..consumed);
                    let response = FtpResponse::from_lines(lines, strip_trailing_newline)?;
                    debug!("Received response: {}", response.text().trim_end());
                    return Ok(response);
                }
            }

            if self.pending.len() - consumed > MAX_LINE_LENGTH {
                self.pending.clear();
                return Err(RaxFtpClientError::MalformedResponse(format!(
                    "Reply line exceeds {} bytes without a terminator",
                    MAX_LINE_LENGTH
                )));
            }

            self.fill(source)?;
        }
    }

    /// Append one chunk from the source to the pending buffer
    fn fill<R: Read>(&mut self, source: &mut R) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        let read = loop {
            match source.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RaxFtpClientError::from_socket(e, "reading response")),
            }
        };

        if read == 0 {
            self.pending.clear();
            return Err(RaxFtpClientError::Connection(
                "Connection closed before a complete response was received".to_string(),
            ));
        }

        debug!("Read {} bytes from control connection", read);
        self.pending.extend_from_slice(&chunk[..read]);
        Ok(())
    }
}

/// Decode one physical line, dropping the CR/LF terminator
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// A line ends the reply unless its status code is followed by `-`
fn is_final_line(line: &str) -> Result<bool> {
    parse_status_code(line)?;
    Ok(line.as_bytes().get(3) != Some(&CONTINUATION_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out pre-scripted chunks; an exhausted script behaves like an
    /// expired socket timeout.
    struct ScriptedSource {
        chunks: VecDeque<Vec<u8>>,
        reads: usize,
    }

    impl ScriptedSource {
        fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                reads: 0,
            }
        }
    }

    impl Read for ScriptedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            match self.chunks.pop_front() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(chunk[n..].to_vec());
                    }
                    Ok(n)
                }
                None => Err(io::Error::new(io::ErrorKind::WouldBlock, "no more data")),
            }
        }
    }

    #[test]
    fn test_single_line_returns_without_extra_read() {
        let mut source = ScriptedSource::new(&["220 Service ready\r\n"]);
        let mut framer = ResponseFramer::new();

        let response = framer.read_response(&mut source, true).unwrap();
        assert_eq!(response.code, 220);
        assert_eq!(response.lines, vec!["220 Service ready"]);
        assert_eq!(source.reads, 1);
    }

    #[test]
    fn test_multiline_reply_is_one_response() {
        let mut source =
            ScriptedSource::new(&["230-Welcome\r\n230-Quota: 1GB\r\n230 Logged in\r\n"]);
        let mut framer = ResponseFramer::new();

        let response = framer.read_response(&mut source, false).unwrap();
        assert_eq!(response.code, 230);
        assert_eq!(
            response.lines,
            vec!["230-Welcome", "230-Quota: 1GB", "230 Logged in"]
        );
        assert_eq!(response.message(), "Logged in");
    }

    #[test]
    fn test_reply_split_across_chunks() {
        let mut source = ScriptedSource::new(&["22", "0-first\r", "\n220-sec", "ond\r\n220 end\r\n"]);
        let mut framer = ResponseFramer::new();

        let response = framer.read_response(&mut source, true).unwrap();
        assert_eq!(response.lines, vec!["220-first", "220-second", "220 end"]);
        assert!(framer.buffered().is_empty());
    }

    #[test]
    fn test_trailing_bytes_kept_for_next_reply() {
        let mut source = ScriptedSource::new(&["150 Opening\r\n226 Transfer complete\r\n"]);
        let mut framer = ResponseFramer::new();

        let first = framer.read_response(&mut source, true).unwrap();
        assert_eq!(first.code, 150);
        assert_eq!(framer.buffered(), b"226 Transfer complete\r\n");

        let second = framer.read_response(&mut source, true).unwrap();
        assert_eq!(second.code, 226);
        assert_eq!(source.reads, 1);
    }

    #[test]
    fn test_lf_only_terminators() {
        let mut source = ScriptedSource::new(&["211-Features\n211 End\n"]);
        let mut framer = ResponseFramer::new();

        let response = framer.read_response(&mut source, true).unwrap();
        assert_eq!(response.lines, vec!["211-Features", "211 End"]);
    }

    #[test]
    fn test_short_line_is_malformed() {
        let mut source = ScriptedSource::new(&["OK\r\n"]);
        let mut framer = ResponseFramer::new();

        let err = framer.read_response(&mut source, true).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::MalformedResponse(_)));
        assert!(framer.buffered().is_empty());
    }

    #[test]
    fn test_continuation_line_without_code_is_malformed() {
        let mut source = ScriptedSource::new(&["211-Features\r\n MDTM\r\n211 End\r\n"]);
        let mut framer = ResponseFramer::new();

        let err = framer.read_response(&mut source, true).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::MalformedResponse(_)));
    }

    #[test]
    fn test_unterminated_line_is_capped() {
        let filler = "x".repeat(READ_CHUNK_SIZE);
        let chunks = vec![filler.as_str(); MAX_LINE_LENGTH / READ_CHUNK_SIZE + 4];
        let mut source = ScriptedSource::new(&chunks);
        let mut framer = ResponseFramer::new();

        let err = framer.read_response(&mut source, true).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::MalformedResponse(_)));
        assert!(framer.buffered().is_empty());
        assert_eq!(source.reads, MAX_LINE_LENGTH / READ_CHUNK_SIZE + 1);
    }

    #[test]
    fn test_incomplete_reply_times_out_and_keeps_partial_data() {
        let mut source = ScriptedSource::new(&["220-still going\r\n"]);
        let mut framer = ResponseFramer::new();

        let err = framer.read_response(&mut source, true).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Timeout(_)));
        assert_eq!(framer.buffered(), b"220-still going\r\n");
    }

    #[test]
    fn test_closed_connection_is_reported() {
        let mut framer = ResponseFramer::new();
        let mut empty: &[u8] = b"";

        let err = framer.read_response(&mut empty, true).unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Connection(_)));
    }
}

//! File upload functionality
//!
//! One upload is a fixed sequence on the control channel with a fresh passive
//! data connection in the middle:
//! PASV, connect data, STOR, 1xx, stream bytes, close data, 2xx.
//! The data connection is closed on every path out of `UploadTransfer::run`.

use log::{debug, error, info, warn};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use super::passive::negotiate_passive;
use super::progress::TransferProgress;
use crate::commands::FtpCommand;
use crate::connection::{ControlChannel, DataChannel};
use crate::error::{RaxFtpClientError, Result};
use crate::responses::FtpResponse;

/// Bytes read from the source and written to the data connection per chunk
pub const DATA_CHUNK_SIZE: usize = 4096;

/// Callback invoked after every chunk written to the data connection
pub type ProgressObserver = Box<dyn FnMut(&TransferProgress) + Send>;

/// Outcome of a completed upload
#[derive(Debug, Clone)]
pub struct TransferSummary {
    pub target: String,
    pub bytes_sent: u64,
    pub chunks: u64,
    pub preliminary: FtpResponse,
    pub completion: FtpResponse,
    pub elapsed: Duration,
}

/// Drives a single STOR over a passive data connection
pub struct UploadTransfer<'a> {
    control: &'a mut ControlChannel,
    chunk_size: usize,
    observer: Option<&'a mut ProgressObserver>,
}

impl<'a> UploadTransfer<'a> {
    pub fn new(control: &'a mut ControlChannel, chunk_size: usize) -> Self {
        Self {
            control,
            chunk_size,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Option<&'a mut ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Upload everything `source` yields from its current position as `target`
    pub fn run<R: Read>(
        self,
        source: &mut R,
        target: &str,
        total_bytes: Option<u64>,
    ) -> Result<TransferSummary> {
        let UploadTransfer {
            control,
            chunk_size,
            mut observer,
        } = self;

        if chunk_size == 0 {
            return Err(RaxFtpClientError::InvalidConfig(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        let store = FtpCommand::Stor(target.to_string());
        store.validate()?;

        let endpoint = negotiate_passive(control)?;
        let mut data = DataChannel::open(&endpoint, control.timeout())?;

        control.send(&store)?;
        let preliminary = control.receive_response(false)?;
        if !preliminary.is_preliminary() {
            return Err(RaxFtpClientError::UnexpectedReply {
                expected: "1xx ready to receive".to_string(),
                code: preliminary.code,
                message: preliminary.message().to_string(),
            });
        }

        info!(
            "Starting upload of '{}' ({})",
            target,
            total_bytes.map_or_else(|| "unknown size".to_string(), |n| format!("{} bytes", n))
        );

        let mut progress = TransferProgress::new(total_bytes);
        let streamed = stream_chunks(source, chunk_size, |chunk| {
            data.send_all(chunk)?;
            progress.add_chunk(chunk.len());
            if let Some(observer) = observer.as_deref_mut() {
                observer(&progress);
            }
            Ok(())
        });

        data.close();

        let (bytes_sent, chunks) = match streamed {
            Ok(counts) => counts,
            Err(e) => {
                error!("Upload of '{}' failed: {}", target, e);
                drain_completion(control);
                return Err(e);
            }
        };

        let completion = control.receive_response(false)?;
        if !completion.is_success() {
            return Err(RaxFtpClientError::UnexpectedReply {
                expected: "2xx transfer complete".to_string(),
                code: completion.code,
                message: completion.message().to_string(),
            });
        }

        info!(
            "Upload completed: {} bytes in {:?}",
            bytes_sent,
            progress.elapsed()
        );

        Ok(TransferSummary {
            target: target.to_string(),
            bytes_sent,
            chunks,
            preliminary,
            completion,
            elapsed: progress.elapsed(),
        })
    }
}

/// Read the reply the server sends once the aborted data connection closes,
/// so it is not mistaken for the answer to the next command.
fn drain_completion(control: &mut ControlChannel) {
    if !control.is_connected() {
        return;
    }
    match control.receive_response(true) {
        Ok(reply) => warn!("Server reply after failed upload: {}", reply),
        Err(e) => debug!("No reply after failed upload: {}", e),
    }
}

/// Read `source` in `chunk_size` pieces and hand each to `send`.
///
/// Every chunk except the last is full, so a source of S bytes produces
/// ceil(S / chunk_size) calls. Returns (bytes, chunks).
pub fn stream_chunks<R, F>(source: &mut R, chunk_size: usize, mut send: F) -> Result<(u64, u64)>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;
    let mut chunks = 0u64;

    loop {
        let filled = fill_chunk(source, &mut buffer)?;
        if filled == 0 {
            break;
        }

        send(&buffer[..filled])?;
        total += filled as u64;
        chunks += 1;

        if filled < chunk_size {
            break;
        }
    }

    debug!("Reached end of source, {} bytes in {} chunks", total, chunks);
    Ok((total, chunks))
}

/// Fill `buffer` from `source`, stopping early only at end of input
fn fill_chunk<R: Read>(source: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Remote name for a local path: everything after the last `/` or `\`
pub fn target_name(source: &str) -> &str {
    match source.rfind(['/', '\\']) {
        Some(index) => &source[index + 1..],
        None => source,
    }
}

/// Validate that a file can be uploaded
pub fn validate_upload_file(local_path: &Path) -> Result<()> {
    let metadata = fs::metadata(local_path).map_err(|e| {
        RaxFtpClientError::Io(io::Error::new(
            e.kind(),
            format!("Cannot access local file '{}': {}", local_path.display(), e),
        ))
    })?;

    if !metadata.is_file() {
        return Err(RaxFtpClientError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a file", local_path.display()),
        )));
    }

    Ok(())
}

//! File transfer module for RAX FTP uploader

pub mod passive;
pub mod progress;
pub mod upload;

// Re-export main types and functions
pub use passive::{PassiveEndpoint, negotiate_passive, parse_pasv_reply};
pub use progress::TransferProgress;
pub use upload::{
    DATA_CHUNK_SIZE, ProgressObserver, TransferSummary, UploadTransfer, stream_chunks,
    target_name, validate_upload_file,
};

//! RAX FTP uploader
//!
//! Blocking FTP client for passive-mode uploads: a control connection for
//! commands and framed replies, plus a fresh data connection per transfer.

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod responses;
pub mod terminal;
pub mod transfer;

pub use client::{ClientState, LogonReplies, RaxFtpClient};
pub use config::ClientConfig;
pub use error::{RaxFtpClientError, Result};
pub use responses::FtpResponse;
pub use transfer::{PassiveEndpoint, TransferProgress, TransferSummary};

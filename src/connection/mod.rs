//! Connection management for RAX FTP uploader
//!
//! Handles both command and data connections for FTP operations.

pub mod command;
pub mod data;
pub mod socket;

// Re-export main types
pub use command::ControlChannel;
pub use data::DataChannel;
pub use socket::{InterruptHandle, SocketHandle};

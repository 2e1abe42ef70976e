//! FTP Commands module
//!
//! This module defines the FTP command types the uploader puts on the wire.

pub mod command;

pub use command::{FtpCommand, validate_command_line};

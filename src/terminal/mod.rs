//! Terminal module for RAX FTP uploader
//!
//! This module handles CLI display of transfer progress.

pub mod progress;

pub use progress::{display_progress, finish_progress, format_bytes};

//! FTP response framing and parsing module

pub mod framer;
pub mod response;
pub mod status_codes;

// Re-export main types
pub use framer::ResponseFramer;
pub use response::FtpResponse;
pub use status_codes::*;

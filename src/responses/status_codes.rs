//! FTP status code definitions

// Preliminary codes (1xx)
pub const FILE_STATUS_OKAY: u16 = 150;

// Success codes (2xx)
pub const SERVICE_READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const PASSIVE_MODE: u16 = 227;
pub const USER_LOGGED_IN: u16 = 230;

// Intermediate codes (3xx)
pub const USER_NAME_OKAY_NEED_PASSWORD: u16 = 331;

// Error codes (4xx, 5xx)
pub const NOT_LOGGED_IN: u16 = 530;

/// Check if status code indicates a preliminary reply (another reply follows)
pub fn is_preliminary(code: u16) -> bool {
    (100..200).contains(&code)
}

/// Check if status code indicates success
pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

/// Check if status code indicates error
pub fn is_error(code: u16) -> bool {
    code >= 400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_classes() {
        assert!(is_preliminary(FILE_STATUS_OKAY));
        assert!(is_success(TRANSFER_COMPLETE));
        assert!(is_error(NOT_LOGGED_IN));
        assert!(!is_success(FILE_STATUS_OKAY));
        assert!(!is_preliminary(PASSIVE_MODE));
        assert!(!is_success(USER_NAME_OKAY_NEED_PASSWORD));
        assert!(!is_error(USER_NAME_OKAY_NEED_PASSWORD));
    }
}

//! Interpretation of low-level device error codes.
//!
//! The tethering protocol reports failures as negative integer codes. This
//! module maps them to human-readable categories; it is a total function
//! over all integers and keeps no state.

/// Well-known device error codes, grouped the way the protocol groups them.
pub mod codes {
    // Core errors
    pub const GENERIC: i32 = -1;
    pub const BAD_PARAMETERS: i32 = -2;
    pub const NO_MEMORY: i32 = -3;
    pub const LIBRARY: i32 = -4;
    pub const UNKNOWN_PORT: i32 = -5;
    pub const NOT_SUPPORTED: i32 = -6;

    // Camera connection errors
    pub const CAMERA_NOT_FOUND: i32 = -10;
    pub const CAMERA_BUSY: i32 = -11;
    pub const SELF_TEST_FAILED: i32 = -12;
    pub const CAMERA_IO: i32 = -13;

    // File and storage errors
    pub const FILE_NOT_FOUND: i32 = -20;
    pub const FILE_EXISTS: i32 = -21;
    pub const DIRECTORY_NOT_FOUND: i32 = -22;
    pub const STORAGE_FULL: i32 = -23;

    // Communication errors
    pub const TIMEOUT: i32 = -30;
    pub const SERIAL_PORT: i32 = -31;
    pub const USB: i32 = -32;
    pub const PROTOCOL: i32 = -33;

    // Capture errors
    pub const CAPTURE_FAILED: i32 = -40;
    pub const PREVIEW_FAILED: i32 = -41;
    pub const AUTOFOCUS_FAILED: i32 = -42;
    pub const EXPOSURE_FAILED: i32 = -43;
}

/// Map a device error code to a human-readable description.
///
/// Unknown codes are formatted with the original code so nothing is lost.
pub fn interpret(code: i32) -> String {
    let known = match code {
        codes::GENERIC => "Generic Error",
        codes::BAD_PARAMETERS => "Bad Parameters",
        codes::NO_MEMORY => "No Memory",
        codes::LIBRARY => "Internal Library Error",
        codes::UNKNOWN_PORT => "Unknown Port",
        codes::NOT_SUPPORTED => "Operation Not Supported",
        codes::CAMERA_NOT_FOUND => "Camera Not Found",
        codes::CAMERA_BUSY => "Camera Busy",
        codes::SELF_TEST_FAILED => "Camera Self-Test Failed",
        codes::CAMERA_IO => "Camera I/O Error",
        codes::FILE_NOT_FOUND => "File Not Found",
        codes::FILE_EXISTS => "File Already Exists",
        codes::DIRECTORY_NOT_FOUND => "Directory Not Found",
        codes::STORAGE_FULL => "Storage Full",
        codes::TIMEOUT => "Communication Timeout",
        codes::SERIAL_PORT => "Serial Port Error",
        codes::USB => "USB Communication Error",
        codes::PROTOCOL => "Communication Protocol Error",
        codes::CAPTURE_FAILED => "Image Capture Failed",
        codes::PREVIEW_FAILED => "Preview Capture Failed",
        codes::AUTOFOCUS_FAILED => "Autofocus Failed",
        codes::EXPOSURE_FAILED => "Exposure Setting Failed",
        _ => return format!("Unknown Error Code: {code}"),
    };
    known.to_string()
}

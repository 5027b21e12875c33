// Error types for the echo calibration pipeline
//
// This module defines the calibration error type, providing structured error
// handling with numeric error codes suitable for reporting to the firmware
// tooling and the CLI harness.

mod calibration;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

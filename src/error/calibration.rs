// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Single source of truth for the numeric codes reported by the CLI and
/// consumed by the acquisition tooling.
///
/// Error code range: 3001-3003
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Waveform too short to cover the valid window
    pub const INVALID_INPUT_LENGTH: i32 = 3001;

    /// Configuration rejected by validation
    pub const INVALID_CONFIG: i32 = 3002;

    /// Text waveform dump could not be parsed
    pub const MALFORMED_WAVEFORM: i32 = 3003;
}

/// Log a calibration error with structured context
///
/// This function logs calibration errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=ThresholdCalibrator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// The pipeline itself never fails once its input is accepted; these errors
/// cover the input precondition, configuration and waveform parsing.
///
/// Error code range: 3001-3003
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Waveform shorter than the last valid-window index + 1
    InvalidInputLength { required: usize, actual: usize },

    /// Configuration value outside its usable range
    InvalidConfig { reason: String },

    /// Waveform text could not be parsed into samples
    MalformedWaveform { reason: String },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::InvalidInputLength { .. } => {
                CalibrationErrorCodes::INVALID_INPUT_LENGTH
            }
            CalibrationError::InvalidConfig { .. } => CalibrationErrorCodes::INVALID_CONFIG,
            CalibrationError::MalformedWaveform { .. } => CalibrationErrorCodes::MALFORMED_WAVEFORM,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::InvalidInputLength { required, actual } => {
                format!(
                    "Invalid input length: need at least {} samples, got {}",
                    required, actual
                )
            }
            CalibrationError::InvalidConfig { reason } => {
                format!("Invalid configuration: {}", reason)
            }
            CalibrationError::MalformedWaveform { reason } => {
                format!("Malformed waveform: {}", reason)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        assert_eq!(
            CalibrationError::InvalidInputLength {
                required: 171,
                actual: 12,
            }
            .code(),
            CalibrationErrorCodes::INVALID_INPUT_LENGTH
        );
        assert_eq!(
            CalibrationError::InvalidConfig {
                reason: "test".to_string()
            }
            .code(),
            CalibrationErrorCodes::INVALID_CONFIG
        );
        assert_eq!(
            CalibrationError::MalformedWaveform {
                reason: "test".to_string()
            }
            .code(),
            CalibrationErrorCodes::MALFORMED_WAVEFORM
        );
    }

    #[test]
    fn test_calibration_error_messages() {
        let err = CalibrationError::InvalidInputLength {
            required: 171,
            actual: 100,
        };
        assert_eq!(
            err.message(),
            "Invalid input length: need at least 171 samples, got 100"
        );

        let err = CalibrationError::InvalidConfig {
            reason: "smoothing window must be odd".to_string(),
        };
        assert_eq!(
            err.message(),
            "Invalid configuration: smoothing window must be odd"
        );

        let err = CalibrationError::MalformedWaveform {
            reason: "token 'x'".to_string(),
        };
        assert!(err.message().contains("token 'x'"));
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::InvalidInputLength {
            required: 171,
            actual: 0,
        };
        let display = format!("{}", err);
        assert!(display.contains("CalibrationError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_error_code_trait_object() {
        let err: &dyn ErrorCode = &CalibrationError::InvalidConfig {
            reason: "test".to_string(),
        };
        assert_eq!(err.code(), 3002);
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), CalibrationError> {
            Err(CalibrationError::InvalidInputLength {
                required: 171,
                actual: 3,
            })
        }

        fn caller() -> Result<(), CalibrationError> {
            may_fail()?;
            Ok(())
        }

        assert!(caller().is_err());
    }
}

// Echo Calibration Core - threshold derivation for ultrasonic level sensing
// Smoothing → peak detection → merging → role classification → threshold resolution

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod fixtures;

// Re-exports for convenience
pub use analysis::{Peak, PeakRole, ValidWindow, Waveform};
pub use calibration::{compute_thresholds, ThresholdCalibrator, ThresholdResult};
pub use config::ThresholdConfig;
pub use error::CalibrationError;

/// Initialize logging for binaries and tests
///
/// Installs a `tracing_subscriber` formatter writing to stderr so stdout stays
/// free for JSON payloads. Calling it more than once is harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

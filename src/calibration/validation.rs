// Input validation for the threshold pipeline
//
// The configuration is checked before the waveform; the length check itself
// lives in `Waveform::valid_region`, so a short waveform is rejected instead
// of being truncated.

use crate::analysis::Waveform;
use crate::config::ThresholdConfig;
use crate::error::CalibrationError;

/// Validator for calibration inputs
pub struct InputValidator;

impl InputValidator {
    /// Validate a waveform against the configuration
    ///
    /// # Returns
    /// * `Ok(&[u32])` - The valid-window samples, ready for smoothing
    /// * `Err(CalibrationError)` - `InvalidConfig` or `InvalidInputLength`
    pub fn validate<'a>(
        waveform: &'a Waveform,
        config: &ThresholdConfig,
    ) -> Result<&'a [u32], CalibrationError> {
        config.validate()?;
        waveform.valid_region(&config.window)
    }
}

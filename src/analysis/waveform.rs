// Waveform - captured echo samples and the window considered reliable
//
// A waveform is the raw amplitude envelope read back from the transducer, one
// non-negative sample per index. Only the fixed valid window [start, end] is
// analysed; everything outside it is dominated by transmit ringing or decay.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Fixed pair of absolute indices bounding the analysed region (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidWindow {
    pub start: usize,
    pub end: usize,
}

impl ValidWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of samples covered by the window
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Minimum waveform length needed to cover the window
    pub fn required_len(&self) -> usize {
        self.end + 1
    }

    /// Restore a window-local index to an absolute waveform index
    pub fn to_absolute(&self, local: usize) -> usize {
        local + self.start
    }
}

impl Default for ValidWindow {
    fn default() -> Self {
        Self { start: 40, end: 170 }
    }
}

/// Immutable sequence of echo amplitude samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Waveform {
    samples: Vec<u32>,
}

impl Waveform {
    pub fn new(samples: Vec<u32>) -> Self {
        Self { samples }
    }

    /// Parse a plain text dump of samples
    ///
    /// Accepts decimal integers separated by commas and/or whitespace,
    /// optionally wrapped in square brackets, as printed by the firmware
    /// console or saved by the acquisition tool.
    ///
    /// # Errors
    /// * `MalformedWaveform` - a token is not a non-negative integer
    pub fn parse_text(text: &str) -> Result<Self, CalibrationError> {
        let body = text.trim();
        let body = body.strip_prefix('[').unwrap_or(body);
        let body = body.strip_suffix(']').unwrap_or(body);

        let samples = body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .enumerate()
            .map(|(position, token)| {
                token
                    .parse::<u32>()
                    .map_err(|_| CalibrationError::MalformedWaveform {
                        reason: format!("token {} ('{}') is not a sample value", position, token),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Slice of samples inside the valid window
    ///
    /// # Errors
    /// * `InvalidInputLength` - the waveform does not reach `window.end`
    pub fn valid_region(&self, window: &ValidWindow) -> Result<&[u32], CalibrationError> {
        if self.samples.len() < window.required_len() {
            return Err(CalibrationError::InvalidInputLength {
                required: window.required_len(),
                actual: self.samples.len(),
            });
        }
        Ok(&self.samples[window.start..=window.end])
    }
}

impl From<Vec<u32>> for Waveform {
    fn from(samples: Vec<u32>) -> Self {
        Self::new(samples)
    }
}

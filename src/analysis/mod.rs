// Analysis module - signal stages of the threshold pipeline
//
// Architecture:
// - Smoother: moving average over the valid window
// - PeakDetector: local maxima with extent and prominence
// - PeakMerger: collapses near-duplicate peaks, drops weak ones
// - PeakClassifier: assigns Edge / Liquid / Interference roles
//
// Each stage consumes the previous stage's peak collection by value and
// returns a new one; threshold resolution lives in `calibration`.

use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod peak_detector;
pub mod peak_merger;
pub mod smoother;
pub mod waveform;

pub use classifier::{ClassifiedPeaks, PeakClassifier};
pub use peak_detector::PeakDetector;
pub use peak_merger::PeakMerger;
pub use smoother::Smoother;
pub use waveform::{ValidWindow, Waveform};

/// Semantic role of a peak in the echo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakRole {
    /// Not yet classified
    #[default]
    Unknown,
    /// Container-wall reflection
    Edge,
    /// Liquid-surface reflection
    Liquid,
    /// Multipath reflection between edge and liquid
    Interference,
}

impl PeakRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeakRole::Unknown => "unknown",
            PeakRole::Edge => "edge",
            PeakRole::Liquid => "liquid",
            PeakRole::Interference => "interference",
        }
    }
}

/// A local maximum of the smoothed echo
///
/// Indices are window-local inside the pipeline and absolute once the peak
/// is copied into a `ThresholdResult`. `left <= index <= right` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    pub amplitude: u32,
    pub left: usize,
    pub right: usize,
    /// Height above the lower of the two flanking valleys
    pub prominence: f64,
    pub role: PeakRole,
}

impl Peak {
    /// Create an unclassified peak
    pub fn new(index: usize, amplitude: u32, left: usize, right: usize, prominence: f64) -> Self {
        debug_assert!(left <= index && index <= right);
        Self {
            index,
            amplitude,
            left,
            right,
            prominence,
            role: PeakRole::Unknown,
        }
    }

    pub fn with_role(mut self, role: PeakRole) -> Self {
        self.role = role;
        self
    }

    /// Copy shifted into absolute waveform coordinates, prominence rounded
    /// to two decimals for reporting
    pub fn to_absolute(&self, window: &ValidWindow) -> Self {
        Self {
            index: window.to_absolute(self.index),
            amplitude: self.amplitude,
            left: window.to_absolute(self.left),
            right: window.to_absolute(self.right),
            prominence: (self.prominence * 100.0).round() / 100.0,
            role: self.role,
        }
    }
}

/// First peak with the highest amplitude (ties resolve to the leftmost)
pub(crate) fn strongest<'a, I>(peaks: I) -> Option<&'a Peak>
where
    I: IntoIterator<Item = &'a Peak>,
{
    peaks.into_iter().fold(None::<&'a Peak>, |best, peak| match best {
        Some(current) if current.amplitude >= peak.amplitude => Some(current),
        _ => Some(peak),
    })
}

// ThresholdResult - the calibration values handed back to the device
//
// t1 gates the edge region [0, x), t2 gates the interference region [x, y).
// All indices are absolute waveform positions.

use serde::{Deserialize, Serialize};

use crate::analysis::{Peak, PeakRole};

/// Note attached when fewer than two peaks survive merging
pub const NO_CONTAINER_NOTE: &str = "No container";

/// Final, immutable output of the threshold pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    /// Absolute index of the container-edge peak
    pub edge_index: Option<usize>,
    /// Absolute index of the liquid-surface peak
    pub liquid_index: Option<usize>,
    /// Edge amplitude threshold
    pub t1: i64,
    /// End of the edge region; `x < y` whenever a container was found
    pub x: i64,
    /// Interference amplitude threshold
    pub t2: i64,
    /// End of the interference region
    pub y: i64,
    /// Whether a stronger interference peak was folded into the edge cluster
    #[serde(default)]
    pub edge_extended: bool,
    /// Role-tagged peaks in absolute coordinates, sorted by index
    pub peaks: Vec<Peak>,
    /// Diagnostic note, set when no container was detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ThresholdResult {
    /// Whether the thresholds were derived from an actual container echo
    pub fn has_container(&self) -> bool {
        self.note.is_none()
    }

    /// Peaks tagged with the given role
    pub fn peaks_with_role(&self, role: PeakRole) -> impl Iterator<Item = &Peak> {
        self.peaks.iter().filter(move |p| p.role == role)
    }
}

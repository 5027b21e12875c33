// Pipeline trace - every intermediate stage of one calibration run
//
// The plotting front end renders each stage (raw window, smoothed signal,
// detected peaks, merged peaks, roles, final thresholds) from this snapshot.
// Peak positions are absolute so they overlay directly on the raw waveform.

use serde::{Deserialize, Serialize};

use crate::analysis::{Peak, ValidWindow};
use crate::calibration::result::ThresholdResult;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Valid window cut from the raw waveform
    Window,
    /// Moving-average smoothing
    Smoothing,
    /// Raw peak candidates
    Detection,
    /// Near-duplicate collapse and prominence filter
    Merging,
    /// Role assignment
    Classification,
    /// Threshold and boundary derivation
    Resolution,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Window,
        PipelineStage::Smoothing,
        PipelineStage::Detection,
        PipelineStage::Merging,
        PipelineStage::Classification,
        PipelineStage::Resolution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Window => "WINDOW",
            PipelineStage::Smoothing => "SMOOTH",
            PipelineStage::Detection => "DETECT",
            PipelineStage::Merging => "MERGE",
            PipelineStage::Classification => "CLASSIFY",
            PipelineStage::Resolution => "RESOLVE",
        }
    }
}

/// Snapshot of one run, serializable for external rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTrace {
    pub window: ValidWindow,
    /// Raw samples inside the window
    pub raw: Vec<u32>,
    pub smoothed: Vec<f64>,
    pub detection_threshold: f64,
    pub detected: Vec<Peak>,
    pub merged: Vec<Peak>,
    pub classified: Vec<Peak>,
    pub result: ThresholdResult,
}

impl PipelineTrace {
    /// Peaks produced by a peak-bearing stage
    pub fn stage_peaks(&self, stage: PipelineStage) -> Option<&[Peak]> {
        match stage {
            PipelineStage::Detection => Some(&self.detected),
            PipelineStage::Merging => Some(&self.merged),
            PipelineStage::Classification => Some(&self.classified),
            PipelineStage::Resolution => Some(&self.result.peaks),
            PipelineStage::Window | PipelineStage::Smoothing => None,
        }
    }

    /// Absolute index of each smoothed sample, for plotting
    pub fn absolute_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.smoothed.len()).map(|i| self.window.to_absolute(i))
    }
}

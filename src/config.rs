//! Configuration for the threshold pipeline
//!
//! Every constant the pipeline depends on lives here so the algorithm can be
//! re-tuned for a different sensor profile from a JSON file without
//! recompilation. Missing sections or fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::ValidWindow;
use crate::error::CalibrationError;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThresholdConfig {
    pub window: ValidWindow,
    pub smoothing: SmoothingConfig,
    pub detection: DetectionConfig,
    pub merge: MergeConfig,
    pub classification: ClassificationConfig,
    pub resolution: ResolutionConfig,
    pub fallback: FallbackThresholds,
}

/// Moving-average smoothing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Odd window width; 1 or less disables smoothing
    pub window: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window: 5 }
    }
}

/// Peak detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Nominal echo amplitude floor
    pub base_threshold: f64,
    /// Relaxation applied to the base threshold for the initial capture
    pub threshold_multiplier: f64,
    /// Boundary expansion stops once a sample drops below this fraction
    /// of the detection threshold
    pub boundary_stop_ratio: f64,
}

impl DetectionConfig {
    /// Effective threshold a local maximum must reach
    pub fn detection_threshold(&self) -> f64 {
        self.base_threshold * self.threshold_multiplier
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            base_threshold: 250.0,
            threshold_multiplier: 0.9,
            boundary_stop_ratio: 0.4,
        }
    }
}

/// Peak merging parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Peaks below this prominence are discarded
    pub min_prominence: f64,
    /// Maximum index distance between peaks of one cluster
    pub proximity: usize,
    /// Weaker/stronger amplitude ratio that must be exceeded to merge
    pub amplitude_ratio: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_prominence: 60.0,
            proximity: 3,
            amplitude_ratio: 0.7,
        }
    }
}

/// Positional heuristics for role assignment
///
/// Both fractions are empirical; keep them configurable rather than
/// adjusting boundary behaviour in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Liquid search starts this fraction of the way from the edge peak
    /// to the end of the window
    pub right_zone_start_fraction: f64,
    /// A lone peak beyond this fraction of the window is the liquid
    pub single_peak_split_fraction: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            right_zone_start_fraction: 0.4,
            single_peak_split_fraction: 0.55,
        }
    }
}

/// Threshold and boundary derivation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Window-local `y` used when no interference lies right of the edge cluster
    pub default_y: usize,
    /// Smoothed amplitude below which a sample counts as flat
    pub flat_amplitude_cutoff: f64,
    /// Consecutive flat samples that end the interference region
    pub flat_run_length: usize,
    /// Margin applied to the edge cluster amplitude (t1)
    pub edge_margin: f64,
    /// Margin applied to the strongest interference amplitude (t2)
    pub interference_margin: f64,
    /// Interference amplitude assumed when there is none to measure
    pub default_interference_amplitude: u32,
    /// Samples added past the edge cluster's right boundary for `x`
    pub edge_clearance: i64,
    /// Minimum distance between `x` and the liquid peak
    pub liquid_clearance_x: i64,
    /// Minimum distance between `y` and the liquid peak
    pub liquid_clearance_y: i64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            default_y: 152,
            flat_amplitude_cutoff: 250.0,
            flat_run_length: 3,
            edge_margin: 1.3,
            interference_margin: 1.3,
            default_interference_amplitude: 250,
            edge_clearance: 3,
            liquid_clearance_x: 3,
            liquid_clearance_y: 2,
        }
    }
}

/// Thresholds reported when no container is detected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackThresholds {
    pub t1: i64,
    pub x: i64,
    pub t2: i64,
    pub y: i64,
}

impl Default for FallbackThresholds {
    fn default() -> Self {
        Self {
            t1: 400,
            x: 60,
            t2: 250,
            y: 152,
        }
    }
}

impl ThresholdConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file cannot be read
    /// or parsed (a warning is logged in that case)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Check that every parameter is usable by the pipeline
    ///
    /// # Errors
    /// * `InvalidConfig` - naming the first offending field
    pub fn validate(&self) -> Result<(), CalibrationError> {
        fn invalid(reason: String) -> Result<(), CalibrationError> {
            Err(CalibrationError::InvalidConfig { reason })
        }

        if self.window.is_empty() {
            return invalid(format!(
                "window end {} precedes start {}",
                self.window.end, self.window.start
            ));
        }
        if self.smoothing.window > 1 && self.smoothing.window % 2 == 0 {
            return invalid(format!(
                "smoothing window {} must be odd",
                self.smoothing.window
            ));
        }
        if self.detection.detection_threshold() <= 0.0 {
            return invalid(format!(
                "detection threshold {} must be positive",
                self.detection.detection_threshold()
            ));
        }

        let ratios = [
            ("detection.boundary_stop_ratio", self.detection.boundary_stop_ratio),
            ("merge.amplitude_ratio", self.merge.amplitude_ratio),
            (
                "classification.right_zone_start_fraction",
                self.classification.right_zone_start_fraction,
            ),
            (
                "classification.single_peak_split_fraction",
                self.classification.single_peak_split_fraction,
            ),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(format!("{} = {} must be in (0, 1]", name, value));
            }
        }

        if self.merge.min_prominence < 0.0 {
            return invalid(format!(
                "merge.min_prominence {} must not be negative",
                self.merge.min_prominence
            ));
        }
        if self.resolution.flat_run_length == 0 {
            return invalid("resolution.flat_run_length must be at least 1".to_string());
        }
        if self.resolution.edge_margin <= 0.0 || self.resolution.interference_margin <= 0.0 {
            return invalid("resolution margins must be positive".to_string());
        }

        Ok(())
    }
}

// Calibration module - threshold derivation from a single echo waveform
//
// This module provides:
// 1. ThresholdCalibrator: runs the full pipeline on a waveform
// 2. ThresholdResolver: derives t1/x/t2/y from classified peaks
// 3. PipelineTrace: per-stage snapshot for plotting
//
// Typical use:
// 1. Build a ThresholdCalibrator from a ThresholdConfig
// 2. Call calibrate (or trace) with a Waveform
// 3. Hand the ThresholdResult to the device configuration

pub mod procedure;
pub mod resolver;
pub mod result;
pub mod trace;
pub mod validation;

pub use procedure::{compute_thresholds, ThresholdCalibrator};
pub use resolver::ThresholdResolver;
pub use result::{ThresholdResult, NO_CONTAINER_NOTE};
pub use trace::{PipelineStage, PipelineTrace};
pub use validation::InputValidator;

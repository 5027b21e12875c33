// ThresholdCalibrator - end-to-end threshold pipeline
//
// Validates the waveform, cuts the valid window and runs
// Smoother → PeakDetector → PeakMerger → PeakClassifier → ThresholdResolver.
// Each stage takes ownership of the previous stage's peaks; the resolver only
// borrows the classified snapshot. The calibrator holds no mutable state and
// can be shared across threads.

use crate::analysis::{
    ClassifiedPeaks, Peak, PeakClassifier, PeakDetector, PeakMerger, Smoother, ValidWindow,
    Waveform,
};
use crate::calibration::resolver::ThresholdResolver;
use crate::calibration::result::ThresholdResult;
use crate::calibration::trace::{PipelineStage, PipelineTrace};
use crate::calibration::validation::InputValidator;
use crate::config::ThresholdConfig;
use crate::error::{log_calibration_error, CalibrationError};

#[derive(Debug, Clone)]
pub struct ThresholdCalibrator {
    config: ThresholdConfig,
    smoother: Smoother,
    detector: PeakDetector,
    merger: PeakMerger,
    classifier: PeakClassifier,
    resolver: ThresholdResolver,
}

impl ThresholdCalibrator {
    /// Create a calibrator; the configuration is validated on each run
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            smoother: Smoother::with_config(&config.smoothing),
            detector: PeakDetector::with_config(&config.detection),
            merger: PeakMerger::with_config(&config.merge),
            classifier: PeakClassifier::with_config(&config.classification),
            resolver: ThresholdResolver::with_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Derive thresholds from one waveform
    ///
    /// # Errors
    /// * `InvalidInputLength` - waveform shorter than `window.end + 1`
    /// * `InvalidConfig` - configuration rejected by validation
    pub fn calibrate(&self, waveform: &Waveform) -> Result<ThresholdResult, CalibrationError> {
        let region = self.valid_region(waveform)?;
        let smoothed = self.smooth(region);

        let detected = self.detector.detect(&smoothed);
        log_peaks(PipelineStage::Detection, &detected);

        let merged = self.merger.merge(detected);
        log_peaks(PipelineStage::Merging, &merged);

        let classified = self.classifier.classify(merged, region.len());
        log_classified(&classified);
        let result = self.resolver.resolve(&classified, &smoothed);
        log_result(&result);
        Ok(result)
    }

    /// Run the pipeline keeping every intermediate stage
    ///
    /// Produces the same `result` as [`calibrate`](Self::calibrate).
    pub fn trace(&self, waveform: &Waveform) -> Result<PipelineTrace, CalibrationError> {
        let region = self.valid_region(waveform)?;
        let window = self.config.window;
        let smoothed = self.smooth(region);

        let detected = self.detector.detect(&smoothed);
        log_peaks(PipelineStage::Detection, &detected);
        let detected_snapshot = absolute(&detected, &window);

        let merged = self.merger.merge(detected);
        log_peaks(PipelineStage::Merging, &merged);
        let merged_snapshot = absolute(&merged, &window);

        let classified = self.classifier.classify(merged, region.len());
        log_classified(&classified);
        let classified_snapshot = absolute_classified(&classified, &window);

        let result = self.resolver.resolve(&classified, &smoothed);
        log_result(&result);

        Ok(PipelineTrace {
            window,
            raw: region.to_vec(),
            smoothed,
            detection_threshold: self.detector.threshold(),
            detected: detected_snapshot,
            merged: merged_snapshot,
            classified: classified_snapshot,
            result,
        })
    }

    fn valid_region<'a>(&self, waveform: &'a Waveform) -> Result<&'a [u32], CalibrationError> {
        let region = InputValidator::validate(waveform, &self.config).map_err(|err| {
            log_calibration_error(&err, "ThresholdCalibrator");
            err
        })?;
        tracing::debug!(
            "[{}] samples {}..={} of {}",
            PipelineStage::Window.as_str(),
            self.config.window.start,
            self.config.window.end,
            waveform.len()
        );
        Ok(region)
    }

    fn smooth(&self, region: &[u32]) -> Vec<f64> {
        tracing::debug!(
            "[{}] width {}",
            PipelineStage::Smoothing.as_str(),
            self.config.smoothing.window
        );
        self.smoother.apply(region)
    }
}

impl Default for ThresholdCalibrator {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

/// Compute thresholds for raw samples with the default configuration
pub fn compute_thresholds(samples: &[u32]) -> Result<ThresholdResult, CalibrationError> {
    ThresholdCalibrator::default().calibrate(&Waveform::new(samples.to_vec()))
}

fn absolute(peaks: &[Peak], window: &ValidWindow) -> Vec<Peak> {
    peaks.iter().map(|p| p.to_absolute(window)).collect()
}

fn absolute_classified(classified: &ClassifiedPeaks, window: &ValidWindow) -> Vec<Peak> {
    absolute(&classified.peaks, window)
}

fn log_peaks(stage: PipelineStage, peaks: &[Peak]) {
    tracing::debug!("[{}] {} peaks", stage.as_str(), peaks.len());
}

fn log_classified(classified: &ClassifiedPeaks) {
    tracing::debug!(
        "[{}] {} peaks, edge={:?} liquid={:?}",
        PipelineStage::Classification.as_str(),
        classified.len(),
        classified.edge().map(|p| p.index),
        classified.liquid().map(|p| p.index)
    );
}

fn log_result(result: &ThresholdResult) {
    match &result.note {
        Some(note) => tracing::info!(
            "[{}] {}: {} peak(s) survived",
            PipelineStage::Resolution.as_str(),
            note,
            result.peaks.len()
        ),
        None => tracing::info!(
            "[{}] edge={:?} liquid={:?} t1={} x={} t2={} y={}",
            PipelineStage::Resolution.as_str(),
            result.edge_index,
            result.liquid_index,
            result.t1,
            result.x,
            result.t2,
            result.y
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PeakRole;

    /// Waveform of `len` zeros with a triangular echo (h, 3h/4, h/2, h/4)
    /// centred on each given absolute index
    fn bumps(len: usize, echoes: &[(usize, u32)]) -> Waveform {
        let mut samples = vec![0u32; len];
        for &(centre, height) in echoes {
            for offset in 0..4usize {
                let value = height * (4 - offset as u32) / 4;
                for index in [centre - offset, centre + offset] {
                    samples[index] = samples[index].max(value);
                }
            }
        }
        Waveform::new(samples)
    }

    #[test]
    fn test_all_zero_waveform_reports_no_container() {
        let result = ThresholdCalibrator::default()
            .calibrate(&Waveform::new(vec![0; 171]))
            .unwrap();
        assert_eq!((result.t1, result.x, result.t2, result.y), (400, 60, 250, 152));
        assert_eq!(result.note.as_deref(), Some("No container"));
        assert!(result.edge_index.is_none());
        assert!(result.liquid_index.is_none());
        assert!(result.peaks.is_empty());
    }

    #[test]
    fn test_short_waveform_is_rejected() {
        let err = ThresholdCalibrator::default()
            .calibrate(&Waveform::new(vec![0; 170]))
            .unwrap_err();
        assert_eq!(
            err,
            CalibrationError::InvalidInputLength {
                required: 171,
                actual: 170
            }
        );
    }

    #[test]
    fn test_single_late_echo_is_liquid() {
        let result = ThresholdCalibrator::default()
            .calibrate(&bumps(224, &[(140, 1000)]))
            .unwrap();
        assert_eq!(result.edge_index, None);
        assert_eq!(result.liquid_index, Some(140));
        assert_eq!(result.note.as_deref(), Some("No container"));
        assert_eq!(result.peaks.len(), 1);
        assert_eq!(result.peaks[0].amplitude, 700);
        assert_eq!(result.peaks[0].left, 135);
        assert_eq!(result.peaks[0].right, 145);
    }

    #[test]
    fn test_single_early_echo_is_edge() {
        let result = ThresholdCalibrator::default()
            .calibrate(&bumps(224, &[(70, 1000)]))
            .unwrap();
        assert_eq!(result.edge_index, Some(70));
        assert_eq!(result.liquid_index, None);
        assert!(!result.has_container());
    }

    #[test]
    fn test_two_echoes_weaker_liquid() {
        let result = ThresholdCalibrator::default()
            .calibrate(&bumps(224, &[(60, 3000), (150, 800)]))
            .unwrap();
        assert_eq!(result.edge_index, Some(60));
        assert_eq!(result.liquid_index, Some(150));
        assert_eq!((result.t1, result.x, result.t2, result.y), (2730, 68, 325, 148));
        assert!(result.has_container());
    }

    #[test]
    fn test_three_echoes_with_interference() {
        let result = ThresholdCalibrator::default()
            .calibrate(&bumps(224, &[(55, 2000), (90, 900), (145, 3000)]))
            .unwrap();
        assert_eq!(result.edge_index, Some(55));
        assert_eq!(result.liquid_index, Some(145));
        assert_eq!((result.t1, result.x, result.t2, result.y), (1820, 63, 819, 143));
        assert!(!result.edge_extended);
        assert_eq!(result.peaks[1].role, PeakRole::Interference);
    }

    #[test]
    fn test_strong_interference_extends_edge() {
        let result = ThresholdCalibrator::default()
            .calibrate(&bumps(224, &[(55, 1000), (80, 2500), (110, 700), (150, 3000)]))
            .unwrap();
        assert!(result.edge_extended);
        assert_eq!(result.edge_index, Some(55));
        assert_eq!(result.liquid_index, Some(150));
        assert_eq!((result.t1, result.x, result.t2, result.y), (2275, 88, 637, 118));
    }

    #[test]
    fn test_merged_edge_threshold_rounds_half_to_even() {
        // near-duplicate echoes merge into one edge of amplitude 1665
        let result = ThresholdCalibrator::default()
            .calibrate(&bumps(224, &[(60, 2000), (63, 1900), (150, 2500)]))
            .unwrap();
        assert_eq!(result.edge_index, Some(61));
        assert_eq!(result.liquid_index, Some(150));
        assert_eq!(result.peaks.len(), 2);
        assert_eq!(result.peaks[0].amplitude, 1665);
        assert_eq!((result.t1, result.x, result.t2, result.y), (2164, 71, 325, 148));
    }

    #[test]
    fn test_trace_matches_calibrate() {
        let calibrator = ThresholdCalibrator::default();
        let waveform = bumps(224, &[(55, 1000), (80, 2500), (110, 700), (150, 3000)]);

        let trace = calibrator.trace(&waveform).unwrap();
        let result = calibrator.calibrate(&waveform).unwrap();

        assert_eq!(trace.result, result);
        assert_eq!(trace.raw.len(), 131);
        assert_eq!(trace.smoothed.len(), 131);
        assert_eq!(trace.detection_threshold, 225.0);
        assert_eq!(trace.detected.len(), 4);
        assert_eq!(trace.merged.len(), 4);
        assert_eq!(trace.classified[0].index, 55);
        assert_eq!(trace.classified[0].role, PeakRole::Edge);
        assert!(trace.detected.iter().all(|p| p.role == PeakRole::Unknown));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_stage_is_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            ThresholdCalibrator::default()
                .calibrate(&bumps(224, &[(60, 3000), (150, 800)]))
                .unwrap();
        });

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        for stage in PipelineStage::ALL {
            assert!(
                text.contains(&format!("[{}]", stage.as_str())),
                "missing {} in {text}",
                stage.as_str()
            );
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ThresholdConfig::default();
        config.smoothing.window = 4;
        let result = ThresholdCalibrator::new(config).calibrate(&Waveform::new(vec![0; 224]));
        assert!(matches!(result, Err(CalibrationError::InvalidConfig { .. })));
    }

    #[test]
    fn test_compute_thresholds_convenience() {
        let result = compute_thresholds(&[0; 224]).unwrap();
        assert!(!result.has_container());
        assert!(compute_thresholds(&[0; 10]).is_err());
    }
}

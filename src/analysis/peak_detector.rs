// PeakDetector - local maxima of the smoothed echo
//
// Algorithm:
// 1. Candidate at interior i when sig[i] > sig[i-1], sig[i] >= sig[i+1]
//    and sig[i] >= detection threshold (plateaus report their first sample)
// 2. Walk left/right while the signal keeps descending and stays positive,
//    stopping on the first sample below boundary_stop_ratio * threshold
// 3. Prominence = amplitude - lower of the two valleys, each valley being the
//    minimum over up to three samples just outside the boundary

use crate::analysis::Peak;
use crate::config::DetectionConfig;

/// Finds raw peak candidates; does not deduplicate
#[derive(Debug, Clone)]
pub struct PeakDetector {
    threshold: f64,
    boundary_stop: f64,
}

impl PeakDetector {
    /// Create a detector
    ///
    /// # Arguments
    /// * `threshold` - Minimum smoothed amplitude of a peak
    /// * `boundary_stop_ratio` - Fraction of `threshold` that ends boundary expansion
    pub fn new(threshold: f64, boundary_stop_ratio: f64) -> Self {
        Self {
            threshold,
            boundary_stop: threshold * boundary_stop_ratio,
        }
    }

    pub fn with_config(config: &DetectionConfig) -> Self {
        Self::new(config.detection_threshold(), config.boundary_stop_ratio)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Detect all candidate peaks, ordered by index, role `Unknown`
    pub fn detect(&self, sig: &[f64]) -> Vec<Peak> {
        let n = sig.len();
        if n < 3 {
            return Vec::new();
        }

        (1..n - 1)
            .filter(|&i| sig[i] > sig[i - 1] && sig[i] >= sig[i + 1] && sig[i] >= self.threshold)
            .map(|i| {
                let left = self.expand_left(sig, i);
                let right = self.expand_right(sig, i);
                let prominence = Self::prominence(sig, i, left, right);
                Peak::new(i, sig[i] as u32, left, right, prominence)
            })
            .collect()
    }

    fn expand_left(&self, sig: &[f64], peak: usize) -> usize {
        let mut left = peak;
        while left > 0 && sig[left - 1] <= sig[left] && sig[left - 1] > 0.0 {
            left -= 1;
            if sig[left] < self.boundary_stop {
                break;
            }
        }
        left
    }

    fn expand_right(&self, sig: &[f64], peak: usize) -> usize {
        let last = sig.len() - 1;
        let mut right = peak;
        while right < last && sig[right + 1] <= sig[right] && sig[right + 1] > 0.0 {
            right += 1;
            if sig[right] < self.boundary_stop {
                break;
            }
        }
        right
    }

    fn prominence(sig: &[f64], peak: usize, left: usize, right: usize) -> f64 {
        let last = sig.len() - 1;
        let valley_left = if left > 0 {
            min_of(&sig[left.saturating_sub(2)..=left])
        } else {
            sig[left]
        };
        let valley_right = if right < last {
            min_of(&sig[right..=(right + 2).min(last)])
        } else {
            sig[right]
        };
        (sig[peak] - valley_left).max(sig[peak] - valley_right)
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::with_config(&DetectionConfig::default())
    }
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

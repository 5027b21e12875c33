// PeakMerger - collapses near-duplicate peaks
//
// Peaks are walked in index order against a running "current" cluster. A
// candidate joins the cluster when it lies within `proximity` samples and the
// weaker/stronger amplitude ratio exceeds `amplitude_ratio`. A finished
// cluster is kept only if its prominence reaches `min_prominence`.

use crate::analysis::Peak;
use crate::config::MergeConfig;

#[derive(Debug, Clone)]
pub struct PeakMerger {
    min_prominence: f64,
    proximity: usize,
    amplitude_ratio: f64,
}

impl PeakMerger {
    pub fn new(min_prominence: f64, proximity: usize, amplitude_ratio: f64) -> Self {
        Self {
            min_prominence,
            proximity,
            amplitude_ratio,
        }
    }

    pub fn with_config(config: &MergeConfig) -> Self {
        Self::new(config.min_prominence, config.proximity, config.amplitude_ratio)
    }

    /// Merge candidates into a position-sorted list of significant peaks
    ///
    /// Never returns more peaks than it was given.
    pub fn merge(&self, mut peaks: Vec<Peak>) -> Vec<Peak> {
        peaks.sort_by_key(|p| p.index);

        let mut candidates = peaks.into_iter();
        let Some(mut current) = candidates.next() else {
            return Vec::new();
        };

        let mut merged = Vec::new();
        for next in candidates {
            if self.should_merge(&current, &next) {
                Self::absorb(&mut current, next);
            } else {
                let finished = std::mem::replace(&mut current, next);
                self.emit(&mut merged, finished);
            }
        }
        self.emit(&mut merged, current);

        tracing::debug!(
            "[PeakMerger] kept {} peaks (min prominence {:.1})",
            merged.len(),
            self.min_prominence
        );
        merged
    }

    fn should_merge(&self, current: &Peak, next: &Peak) -> bool {
        let close = next.index.abs_diff(current.index) <= self.proximity;
        let weaker = current.amplitude.min(next.amplitude) as f64;
        let stronger = current.amplitude.max(next.amplitude) as f64;
        close && weaker > self.amplitude_ratio * stronger
    }

    fn absorb(current: &mut Peak, next: Peak) {
        if next.amplitude > current.amplitude {
            current.index = next.index;
            current.amplitude = next.amplitude;
        }
        current.left = current.left.min(next.left);
        current.right = current.right.max(next.right);
        current.prominence = current.prominence.max(next.prominence);
    }

    fn emit(&self, merged: &mut Vec<Peak>, peak: Peak) {
        if peak.prominence >= self.min_prominence {
            merged.push(peak);
        } else {
            tracing::debug!(
                "[PeakMerger] dropping peak at {} (prominence {:.1})",
                peak.index,
                peak.prominence
            );
        }
    }
}

impl Default for PeakMerger {
    fn default() -> Self {
        Self::with_config(&MergeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(index: usize, amplitude: u32, prominence: f64) -> Peak {
        Peak::new(index, amplitude, index.saturating_sub(2), index + 2, prominence)
    }

    #[test]
    fn test_empty_input() {
        assert!(PeakMerger::default().merge(Vec::new()).is_empty());
    }

    #[test]
    fn test_close_similar_peaks_merge_to_stronger() {
        let merged = PeakMerger::default().merge(vec![peak(10, 900, 600.0), peak(12, 1000, 500.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 12);
        assert_eq!(merged[0].amplitude, 1000);
        assert_eq!(merged[0].left, 8);
        assert_eq!(merged[0].right, 14);
        assert_eq!(merged[0].prominence, 600.0);
    }

    #[test]
    fn test_equal_amplitude_keeps_first_position() {
        let merged = PeakMerger::default().merge(vec![peak(20, 800, 100.0), peak(23, 800, 90.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 20);
    }

    #[test]
    fn test_dissimilar_amplitudes_stay_separate() {
        // 600 is not above 0.7 * 1000
        let merged = PeakMerger::default().merge(vec![peak(10, 1000, 500.0), peak(12, 600, 300.0)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_distant_peaks_stay_separate() {
        let merged =
            PeakMerger::default().merge(vec![peak(10, 1000, 500.0), peak(14, 1000, 500.0)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_low_prominence_dropped() {
        let merged = PeakMerger::default().merge(vec![
            peak(10, 1000, 500.0),
            peak(40, 300, 59.9),
            peak(80, 400, 60.0),
        ]);
        let indices: Vec<usize> = merged.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![10, 80]);
    }

    #[test]
    fn test_weak_peak_rescued_by_merge_partner() {
        let merged = PeakMerger::default().merge(vec![peak(30, 500, 20.0), peak(32, 450, 80.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 30);
        assert_eq!(merged[0].prominence, 80.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let merged = PeakMerger::default().merge(vec![
            peak(90, 700, 300.0),
            peak(10, 1000, 500.0),
            peak(50, 400, 200.0),
        ]);
        let indices: Vec<usize> = merged.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![10, 50, 90]);
    }

    #[test]
    fn test_chain_merges_against_running_cluster() {
        // 10 and 13 merge (cluster moves to 13), then 16 is within 3 of 13
        let merged = PeakMerger::default().merge(vec![
            peak(10, 800, 100.0),
            peak(13, 900, 100.0),
            peak(16, 850, 100.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 13);
        assert_eq!(merged[0].left, 8);
        assert_eq!(merged[0].right, 18);
    }

    #[test]
    fn test_never_increases_count() {
        let input: Vec<Peak> = (0..20)
            .map(|i| peak(i * 2 + 1, 500 + (i as u32 % 3) * 200, 70.0))
            .collect();
        let count = input.len();
        assert!(PeakMerger::default().merge(input).len() <= count);
    }
}

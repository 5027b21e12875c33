// PeakClassifier - positional role assignment
//
// Rules, by number of merged peaks:
// - 0: nothing assigned (no container)
// - 1: Liquid if it lies beyond single_peak_split_fraction of the window,
//      otherwise Edge
// - 2: leftmost Edge, rightmost Liquid, amplitude ignored
// - 3+: leftmost Edge; Liquid is the strongest peak beyond the right-zone
//      start (edge + right_zone_start_fraction * remaining window), falling
//      back to the rightmost peak; everything else is Interference
//
// Both fractions are empirical heuristics and stay configurable.

use serde::{Deserialize, Serialize};

use crate::analysis::{strongest, Peak, PeakRole};
use crate::config::ClassificationConfig;

/// Role-tagged peaks plus the positions of the Edge and Liquid peaks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPeaks {
    /// Peaks sorted by index
    pub peaks: Vec<Peak>,
    edge: Option<usize>,
    liquid: Option<usize>,
}

impl ClassifiedPeaks {
    /// Assemble from already-tagged peaks (sorted by index), locating the
    /// Edge and Liquid peaks by role
    pub fn from_tagged(mut peaks: Vec<Peak>) -> Self {
        peaks.sort_by_key(|p| p.index);
        let edge = peaks.iter().position(|p| p.role == PeakRole::Edge);
        let liquid = peaks.iter().position(|p| p.role == PeakRole::Liquid);
        Self {
            peaks,
            edge,
            liquid,
        }
    }

    pub fn edge(&self) -> Option<&Peak> {
        self.edge.map(|i| &self.peaks[i])
    }

    pub fn liquid(&self) -> Option<&Peak> {
        self.liquid.map(|i| &self.peaks[i])
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Peaks carrying the given role, in index order
    pub fn with_role(&self, role: PeakRole) -> impl Iterator<Item = &Peak> {
        self.peaks.iter().filter(move |p| p.role == role)
    }
}

#[derive(Debug, Clone)]
pub struct PeakClassifier {
    right_zone_start_fraction: f64,
    single_peak_split_fraction: f64,
}

impl PeakClassifier {
    pub fn new(right_zone_start_fraction: f64, single_peak_split_fraction: f64) -> Self {
        Self {
            right_zone_start_fraction,
            single_peak_split_fraction,
        }
    }

    pub fn with_config(config: &ClassificationConfig) -> Self {
        Self::new(
            config.right_zone_start_fraction,
            config.single_peak_split_fraction,
        )
    }

    /// Assign roles to merged peaks
    ///
    /// # Arguments
    /// * `peaks` - Merged peaks (any order; sorted by index on return)
    /// * `window_len` - Length of the valid window the indices refer to
    ///
    /// # Returns
    /// The peaks with roles set; at most one Edge and one Liquid
    pub fn classify(&self, mut peaks: Vec<Peak>, window_len: usize) -> ClassifiedPeaks {
        peaks.sort_by_key(|p| p.index);

        let (edge, liquid) = match peaks.len() {
            0 => (None, None),
            1 => {
                let split = window_len as f64 * self.single_peak_split_fraction;
                if peaks[0].index as f64 > split {
                    (None, Some(0))
                } else {
                    (Some(0), None)
                }
            }
            2 => (Some(0), Some(1)),
            n => (Some(0), Some(self.locate_liquid(&peaks, window_len).unwrap_or(n - 1))),
        };

        if let Some(i) = edge {
            peaks[i].role = PeakRole::Edge;
        }
        if let Some(i) = liquid {
            peaks[i].role = PeakRole::Liquid;
        }
        if peaks.len() >= 3 {
            for peak in peaks.iter_mut().filter(|p| p.role == PeakRole::Unknown) {
                peak.role = PeakRole::Interference;
            }
        }

        tracing::debug!(
            "[PeakClassifier] {} peaks: edge={:?} liquid={:?}",
            peaks.len(),
            edge.map(|i| peaks[i].index),
            liquid.map(|i| peaks[i].index)
        );

        ClassifiedPeaks {
            peaks,
            edge,
            liquid,
        }
    }

    /// Position of the strongest peak inside the right-hand zone, if any
    fn locate_liquid(&self, peaks: &[Peak], window_len: usize) -> Option<usize> {
        let edge_index = peaks[0].index as f64;
        let zone_start =
            edge_index + self.right_zone_start_fraction * (window_len as f64 - edge_index);

        let best = strongest(peaks[1..].iter().filter(|p| p.index as f64 > zone_start))?;
        peaks.iter().position(|p| p.index == best.index)
    }
}

impl Default for PeakClassifier {
    fn default() -> Self {
        Self::with_config(&ClassificationConfig::default())
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;

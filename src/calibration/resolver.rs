// ThresholdResolver - turns classified peaks into t1/x/t2/y
//
// Steps (indices window-local until the final restore):
// 1. Interference = Interference peaks strictly between Edge and Liquid
// 2. If the strongest interference peak is at least as strong as the edge,
//    it joins the edge cluster; interference right of it becomes the
//    "right interference" set
// 3. x  = min(cluster right + edge_clearance, liquid - liquid_clearance_x)
// 4. t1 = cluster amplitude * edge_margin
// 5. y  = default_y without right interference, else the end of the first
//    flat run after the right-interference boundary; capped at
//    liquid - liquid_clearance_y
// 6. t2 = strongest relevant interference * interference_margin
// 7. Reorder so that x < y
//
// With fewer than two peaks the fallback thresholds are reported instead.

use crate::analysis::{strongest, ClassifiedPeaks, Peak, PeakRole, ValidWindow};
use crate::calibration::result::{ThresholdResult, NO_CONTAINER_NOTE};
use crate::config::{FallbackThresholds, ResolutionConfig, ThresholdConfig};

/// Derives thresholds and boundaries; pure and repeatable
#[derive(Debug, Clone)]
pub struct ThresholdResolver {
    window: ValidWindow,
    config: ResolutionConfig,
    fallback: FallbackThresholds,
}

/// Edge cluster after the extension check
struct EdgeCluster<'a> {
    right: usize,
    amplitude: u32,
    extended: bool,
    right_interference: Vec<&'a Peak>,
}

impl ThresholdResolver {
    pub fn new(
        window: ValidWindow,
        config: ResolutionConfig,
        fallback: FallbackThresholds,
    ) -> Self {
        Self {
            window,
            config,
            fallback,
        }
    }

    pub fn with_config(config: &ThresholdConfig) -> Self {
        Self::new(
            config.window,
            config.resolution.clone(),
            config.fallback.clone(),
        )
    }

    /// Resolve thresholds for one classified snapshot
    ///
    /// # Arguments
    /// * `classified` - Role-tagged peaks with window-local indices
    /// * `smoothed` - Smoothed valid-window samples the peaks were found in
    pub fn resolve(&self, classified: &ClassifiedPeaks, smoothed: &[f64]) -> ThresholdResult {
        let (edge, liquid) = match (classified.edge(), classified.liquid()) {
            (Some(edge), Some(liquid)) if classified.len() >= 2 => (edge, liquid),
            _ => return self.no_container(classified),
        };

        let interference: Vec<&Peak> = classified
            .with_role(PeakRole::Interference)
            .filter(|p| p.index > edge.index && p.index < liquid.index)
            .collect();
        let cluster = Self::edge_cluster(edge, &interference);

        let liquid_index = liquid.index as i64;
        let x_local = (cluster.right as i64 + self.config.edge_clearance)
            .min(liquid_index - self.config.liquid_clearance_x);
        let t1 = scale(cluster.amplitude, self.config.edge_margin);

        let y_local = match cluster.right_interference.iter().map(|p| p.right).max() {
            None => self.config.default_y as i64,
            Some(boundary) => self.flat_region_end(smoothed, boundary, liquid.index) as i64,
        };
        let y_local = y_local.min(liquid_index - self.config.liquid_clearance_y);

        let strongest_interference = if cluster.extended {
            strongest(cluster.right_interference.iter().copied())
        } else {
            strongest(interference.iter().copied())
        };
        let interference_amplitude = strongest_interference
            .map(|p| p.amplitude)
            .unwrap_or(self.config.default_interference_amplitude);
        let t2 = scale(interference_amplitude, self.config.interference_margin);

        let offset = self.window.start as i64;
        let (x, y) = order_boundaries(x_local + offset, y_local + offset);

        tracing::debug!(
            "[ThresholdResolver] edge={} liquid={} extended={} t1={} x={} t2={} y={}",
            edge.index,
            liquid.index,
            cluster.extended,
            t1,
            x,
            t2,
            y
        );

        ThresholdResult {
            edge_index: Some(self.window.to_absolute(edge.index)),
            liquid_index: Some(self.window.to_absolute(liquid.index)),
            t1,
            x,
            t2,
            y,
            edge_extended: cluster.extended,
            peaks: self.absolute_peaks(classified),
            note: None,
        }
    }

    fn edge_cluster<'a>(edge: &Peak, interference: &[&'a Peak]) -> EdgeCluster<'a> {
        match strongest(interference.iter().copied()) {
            Some(dominant) if dominant.amplitude >= edge.amplitude => EdgeCluster {
                right: dominant.right,
                amplitude: dominant.amplitude,
                extended: true,
                right_interference: interference
                    .iter()
                    .copied()
                    .filter(|p| p.index > dominant.index)
                    .collect(),
            },
            _ => EdgeCluster {
                right: edge.right,
                amplitude: edge.amplitude,
                extended: false,
                right_interference: Vec::new(),
            },
        }
    }

    /// Index completing the first run of `flat_run_length` samples below the
    /// flat cutoff, scanning from just after `boundary` up to the liquid peak;
    /// `boundary` itself when no such run exists
    fn flat_region_end(&self, smoothed: &[f64], boundary: usize, liquid_index: usize) -> usize {
        let end = liquid_index.min(smoothed.len());
        let mut run = 0;
        for (i, &value) in smoothed.iter().enumerate().take(end).skip(boundary + 1) {
            if value < self.config.flat_amplitude_cutoff {
                run += 1;
                if run >= self.config.flat_run_length {
                    return i;
                }
            } else {
                run = 0;
            }
        }
        boundary
    }

    fn no_container(&self, classified: &ClassifiedPeaks) -> ThresholdResult {
        tracing::debug!(
            "[ThresholdResolver] {} peak(s) survived, reporting fallback thresholds",
            classified.len()
        );
        ThresholdResult {
            edge_index: classified.edge().map(|p| self.window.to_absolute(p.index)),
            liquid_index: classified.liquid().map(|p| self.window.to_absolute(p.index)),
            t1: self.fallback.t1,
            x: self.fallback.x,
            t2: self.fallback.t2,
            y: self.fallback.y,
            edge_extended: false,
            peaks: self.absolute_peaks(classified),
            note: Some(NO_CONTAINER_NOTE.to_string()),
        }
    }

    fn absolute_peaks(&self, classified: &ClassifiedPeaks) -> Vec<Peak> {
        classified
            .peaks
            .iter()
            .map(|p| p.to_absolute(&self.window))
            .collect()
    }
}

impl Default for ThresholdResolver {
    fn default() -> Self {
        Self::with_config(&ThresholdConfig::default())
    }
}

/// Exact halves round to even
fn scale(amplitude: u32, margin: f64) -> i64 {
    (f64::from(amplitude) * margin).round_ties_even() as i64
}

/// Swap inverted boundaries and separate coincident ones.
///
/// Separating coincident boundaries can push `y` onto the liquid peak itself;
/// this is left as is until the firmware side confirms the intended bound.
fn order_boundaries(x: i64, y: i64) -> (i64, i64) {
    if y < x {
        (y, x)
    } else if y == x {
        (x, y + 1)
    } else {
        (x, y)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

// Smoother - centred moving average
//
// Boundary windows shrink instead of padding or wrapping, so the first and
// last samples are averaged over fewer neighbours.

use crate::config::SmoothingConfig;

/// Moving-average filter over the valid window
#[derive(Debug, Clone)]
pub struct Smoother {
    window: usize,
}

impl Smoother {
    /// Create a smoother with the given (odd) window width
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn with_config(config: &SmoothingConfig) -> Self {
        Self::new(config.window)
    }

    /// Smooth the input, returning a same-length sequence
    ///
    /// A window of 1 or less is the identity transform.
    pub fn apply(&self, signal: &[u32]) -> Vec<f64> {
        if self.window <= 1 {
            return signal.iter().map(|&s| f64::from(s)).collect();
        }

        let half = self.window / 2;
        let last = signal.len().saturating_sub(1);
        (0..signal.len())
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(last);
                let sum: u64 = signal[lo..=hi].iter().map(|&s| u64::from(s)).sum();
                sum as f64 / (hi - lo + 1) as f64
            })
            .collect()
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::with_config(&SmoothingConfig::default())
    }
}

use hrvstream_types::{ArtifactPreset, ArtifactStrategy};

use crate::AlgoError;

/// Streaming ratio filter for RR intervals.
///
/// Each incoming interval is compared to the last accepted one. When the
/// ratio leaves `[1 / threshold, threshold]` the interval is treated as an
/// artifact and handled according to the configured [`ArtifactStrategy`].
/// A filter without a threshold passes every interval through.
#[derive(Debug, Clone)]
pub struct ArtifactFilter {
    threshold: Option<f64>,
    strategy: ArtifactStrategy,
    last_good: Option<f64>,
    intervals: Vec<f64>,
    artifacts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOutcome {
    Accepted(f64),
    Replaced(f64),
    Dropped,
}

impl FilterOutcome {
    pub fn emitted(self) -> Option<f64> {
        match self {
            FilterOutcome::Accepted(v) | FilterOutcome::Replaced(v) => Some(v),
            FilterOutcome::Dropped => None,
        }
    }

    pub fn is_artifact(self) -> bool {
        !matches!(self, FilterOutcome::Accepted(_))
    }
}

impl Default for ArtifactFilter {
    fn default() -> Self {
        Self::new(Some(Self::DEFAULT_THRESHOLD), ArtifactStrategy::default())
    }
}

impl ArtifactFilter {
    pub const DEFAULT_THRESHOLD: f64 = 1.4;

    pub fn new(threshold: Option<f64>, strategy: ArtifactStrategy) -> Self {
        Self {
            // ratios below 1 have no valid acceptance band
            threshold: threshold.map(|t| {
                if t.is_finite() && t >= 1.0 {
                    t
                } else {
                    Self::DEFAULT_THRESHOLD
                }
            }),
            strategy,
            last_good: None,
            intervals: Vec::new(),
            artifacts: 0,
        }
    }

    pub fn from_preset(preset: ArtifactPreset, strategy: ArtifactStrategy) -> Self {
        Self::new(preset.threshold(), strategy)
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn strategy(&self) -> ArtifactStrategy {
        self.strategy
    }

    pub fn add_interval(&mut self, raw: f64) -> Result<FilterOutcome, AlgoError> {
        if !raw.is_finite() || raw <= 0.0 {
            return Err(AlgoError::InvalidInterval(raw));
        }

        let outcome = match (self.last_good, self.threshold) {
            (Some(last_good), Some(threshold)) if Self::is_artifact(raw, last_good, threshold) => {
                self.artifacts += 1;
                debug!(
                    "Rejected RR {raw:.1}ms, ratio {:.2} to last good {last_good:.1}ms",
                    raw / last_good
                );
                match self.strategy {
                    ArtifactStrategy::ReplaceWithLastGood => FilterOutcome::Replaced(last_good),
                    ArtifactStrategy::Drop => FilterOutcome::Dropped,
                }
            }
            _ => {
                self.last_good = Some(raw);
                FilterOutcome::Accepted(raw)
            }
        };

        if let Some(value) = outcome.emitted() {
            self.intervals.push(value);
        }

        Ok(outcome)
    }

    pub fn add_intervals(&mut self, raw: &[f64]) -> Result<Vec<FilterOutcome>, AlgoError> {
        raw.iter().map(|&rr| self.add_interval(rr)).collect()
    }

    fn is_artifact(raw: f64, last_good: f64, threshold: f64) -> bool {
        let ratio = raw / last_good;
        ratio > threshold || ratio < 1.0 / threshold
    }

    pub fn last_good(&self) -> Option<f64> {
        self.last_good
    }

    pub fn intervals(&self) -> &[f64] {
        &self.intervals
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts
    }

    pub fn reset(&mut self) {
        self.last_good = None;
        self.intervals.clear();
        self.artifacts = 0;
    }
}

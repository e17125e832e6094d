use serde::{Deserialize, Serialize};

/// Heart rate variability metrics computed from one RR interval sequence.
///
/// A snapshot is recomputed wholesale whenever the interval sequence
/// changes. Every field is zero when the input did not have enough data for
/// that metric, so a snapshot never carries `NaN`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HrvSnapshot {
    pub interval_count: usize,
    pub mean_rr: f64,
    pub avg_hr: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub nn50: usize,
    /// Percentage (0-100) of successive differences above 50 ms.
    pub pnn50: f64,
    pub sdsd: f64,
    pub sd1: f64,
    pub sd2: f64,
    pub sd2_sd1_ratio: f64,
    pub vlf_power: f64,
    pub lf_power: f64,
    pub hf_power: f64,
    pub total_power: f64,
    pub lf_hf_ratio: f64,
    pub histogram: RrHistogram,
}

impl HrvSnapshot {
    pub fn has_time_domain(&self) -> bool {
        self.interval_count >= 2
    }

    pub fn has_frequency_domain(&self) -> bool {
        self.total_power > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RrHistogram {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

impl RrHistogram {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

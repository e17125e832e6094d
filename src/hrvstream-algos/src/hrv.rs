use hrvstream_types::HrvSnapshot;

use crate::helpers::stats::{mean, sample_std_dev, successive_differences};

mod frequency;
pub use frequency::{FrequencyBand, SpectralPower};

mod histogram;

/// Computes [`HrvSnapshot`]s from filtered RR intervals in milliseconds.
///
/// Every call recomputes the full snapshot from its input; the analyzer keeps
/// no state between calls.
pub struct HrvAnalyzer;

impl HrvAnalyzer {
    /// Default number of trailing intervals used for live updates.
    pub const DEFAULT_WINDOW: usize = 300;

    const NN50_THRESHOLD_MS: f64 = 50.0;

    pub fn analyze(intervals: &[f64]) -> HrvSnapshot {
        let n = intervals.len();
        if n < 2 {
            return HrvSnapshot {
                interval_count: n,
                ..Default::default()
            };
        }

        let mean_rr = mean(intervals);
        let avg_hr = if mean_rr > 0.0 { 60_000.0 / mean_rr } else { 0.0 };
        let sdnn = sample_std_dev(intervals);

        let diffs = successive_differences(intervals);
        let diff_count = diffs.len() as f64;
        let rmssd = (diffs.iter().map(|d| d * d).sum::<f64>() / diff_count).sqrt();
        let nn50 = diffs
            .iter()
            .filter(|d| d.abs() > Self::NN50_THRESHOLD_MS)
            .count();
        let pnn50 = nn50 as f64 / diff_count * 100.0;
        let sdsd = sample_std_dev(&diffs);

        let sd1 = rmssd / std::f64::consts::SQRT_2;
        let sd2 = (2.0 * sdnn * sdnn - 0.5 * rmssd * rmssd).max(0.0).sqrt();
        let sd2_sd1_ratio = if sd1 > 0.0 { sd2 / sd1 } else { 0.0 };

        let power = SpectralPower::from_intervals(intervals);

        HrvSnapshot {
            interval_count: n,
            mean_rr,
            avg_hr,
            sdnn,
            rmssd,
            nn50,
            pnn50,
            sdsd,
            sd1,
            sd2,
            sd2_sd1_ratio,
            vlf_power: power.vlf,
            lf_power: power.lf,
            hf_power: power.hf,
            total_power: power.total(),
            lf_hf_ratio: power.lf_hf_ratio(),
            histogram: histogram::rr_histogram(intervals),
        }
    }

    /// Analyzes only the trailing `window` intervals. A window of 0 uses the
    /// whole sequence.
    pub fn analyze_window(intervals: &[f64], window: usize) -> HrvSnapshot {
        if window == 0 || intervals.len() <= window {
            return Self::analyze(intervals);
        }

        Self::analyze(&intervals[intervals.len() - window..])
    }
}

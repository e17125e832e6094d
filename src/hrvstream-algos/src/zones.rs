use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use hrvstream_types::ZoneLabel;
use strum::IntoEnumIterator;

/// Maps heart rate to a [`ZoneLabel`] relative to the anaerobic threshold.
///
/// Bands are evaluated top to bottom and the first match wins. Below the
/// warmup band the label is chosen from RMSSD instead of heart rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassifier {
    anaerobic_threshold: f64,
}

impl ZoneClassifier {
    /// `(label, fraction of AT, offset in bpm)`, highest intensity first.
    const HR_BANDS: [(ZoneLabel, f64, f64); 8] = [
        (ZoneLabel::Intensive2, 1.06, 0.0),
        (ZoneLabel::Intensive1, 1.01, 0.0),
        (ZoneLabel::AnaerobicThreshold, 1.00, 0.0),
        (ZoneLabel::Endurance3, 0.90, 0.0),
        (ZoneLabel::Endurance2, 0.80, 0.0),
        (ZoneLabel::Endurance1, 0.70, 0.0),
        (ZoneLabel::Cooldown, 0.65, 5.0),
        (ZoneLabel::Warmup, 0.65, 0.0),
    ];

    pub const RELAXED_RMSSD_MS: f64 = 70.0;
    pub const REST_RMSSD_MS: f64 = 50.0;
    pub const ACTIVE_LOW_RMSSD_MS: f64 = 30.0;
    pub const ACTIVE_HIGH_RMSSD_MS: f64 = 10.0;

    pub fn new(anaerobic_threshold: f64) -> Self {
        Self {
            anaerobic_threshold,
        }
    }

    pub fn anaerobic_threshold(&self) -> f64 {
        self.anaerobic_threshold
    }

    pub fn has_threshold(&self) -> bool {
        self.anaerobic_threshold.is_finite() && self.anaerobic_threshold > 0.0
    }

    pub fn zone(&self, heart_rate: f64, rmssd: f64) -> ZoneLabel {
        Self::classify(heart_rate, self.anaerobic_threshold, rmssd)
    }

    pub fn classify(heart_rate: f64, anaerobic_threshold: f64, rmssd: f64) -> ZoneLabel {
        if !anaerobic_threshold.is_finite() || anaerobic_threshold <= 0.0 {
            return ZoneLabel::Resting;
        }

        Self::HR_BANDS
            .iter()
            .find(|(_, fraction, offset)| heart_rate >= anaerobic_threshold * fraction + offset)
            .map(|(label, _, _)| *label)
            .unwrap_or_else(|| Self::rest_zone(rmssd))
    }

    fn rest_zone(rmssd: f64) -> ZoneLabel {
        if rmssd >= Self::RELAXED_RMSSD_MS {
            ZoneLabel::Relaxed
        } else if rmssd >= Self::REST_RMSSD_MS {
            ZoneLabel::Rest
        } else if rmssd >= Self::ACTIVE_LOW_RMSSD_MS {
            ZoneLabel::ActiveLow
        } else if rmssd >= Self::ACTIVE_HIGH_RMSSD_MS {
            ZoneLabel::ActiveHigh
        } else {
            ZoneLabel::TransitionZone
        }
    }
}

/// Whole seconds spent in each zone over a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTimeLedger {
    seconds: BTreeMap<ZoneLabel, u64>,
    credited_until: Option<NaiveDateTime>,
}

impl Default for ZoneTimeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneTimeLedger {
    pub fn new() -> Self {
        Self {
            seconds: ZoneLabel::iter().map(|zone| (zone, 0)).collect(),
            credited_until: None,
        }
    }

    pub fn start(&mut self, now: NaiveDateTime) {
        self.credited_until = Some(now);
    }

    /// Credits every whole second elapsed since the last credited instant to
    /// `zone` and returns the number of seconds added.
    ///
    /// The fractional remainder carries over to the next call, so the total
    /// never drifts from elapsed time however often this is called.
    pub fn advance(&mut self, now: NaiveDateTime, zone: ZoneLabel) -> u64 {
        let Some(credited_until) = self.credited_until else {
            self.credited_until = Some(now);
            return 0;
        };

        let elapsed = (now - credited_until).num_seconds();
        if elapsed <= 0 {
            return 0;
        }

        *self.seconds.entry(zone).or_default() += elapsed as u64;
        self.credited_until = Some(credited_until + TimeDelta::seconds(elapsed));
        elapsed as u64
    }

    pub fn seconds(&self, zone: ZoneLabel) -> u64 {
        self.seconds.get(&zone).copied().unwrap_or_default()
    }

    pub fn total_seconds(&self) -> u64 {
        self.seconds.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneLabel, u64)> + '_ {
        self.seconds.iter().map(|(zone, secs)| (*zone, *secs))
    }

    pub fn to_map(&self) -> BTreeMap<ZoneLabel, u64> {
        self.seconds.clone()
    }
}

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use hrvstream_types::{BreathAverages, HrvSnapshot, TimedSample, ZoneLabel};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HeartRateSummary {
    pub avg: f64,
    pub max: u16,
    pub min: u16,
    pub samples: usize,
    #[serde(skip)]
    sum: u64,
}

impl HeartRateSummary {
    pub fn add(&mut self, heart_rate: u16) {
        if self.samples == 0 {
            self.min = heart_rate;
            self.max = heart_rate;
        } else {
            self.min = self.min.min(heart_rate);
            self.max = self.max.max(heart_rate);
        }

        self.samples += 1;
        self.sum += u64::from(heart_rate);
        self.avg = self.sum as f64 / self.samples as f64;
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
}

/// Everything a session measured, read out after stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub started_at: NaiveDateTime,
    pub stopped_at: Option<NaiveDateTime>,
    pub duration_seconds: u64,
    pub heart_rate: HeartRateSummary,
    pub avg_hr_reserve_percent: Option<f64>,
    pub peak_hr_percent_of_max: Option<f64>,
    pub hrv: HrvSnapshot,
    pub zone_seconds: BTreeMap<ZoneLabel, u64>,
    pub breathing: BreathAverages,
    /// Over the last few cycles only.
    pub breathing_short_term: BreathAverages,
    pub artifact_count: usize,
    pub filtered_intervals: Vec<f64>,
    pub raw_samples: Vec<TimedSample>,
}

impl SessionReport {
    /// Zone with the most credited seconds, ignoring empty zones.
    pub fn dominant_zone(&self) -> Option<ZoneLabel> {
        self.zone_seconds
            .iter()
            .filter(|(_, secs)| **secs > 0)
            .max_by_key(|(_, secs)| **secs)
            .map(|(zone, _)| *zone)
    }

    /// Copy of the report without the per-beat archives.
    pub fn summary(&self) -> Self {
        Self {
            filtered_intervals: Vec::new(),
            raw_samples: Vec::new(),
            ..self.clone()
        }
    }
}

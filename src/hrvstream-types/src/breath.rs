use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BreathPhase {
    Inspiration,
    Expiration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BreathDepth {
    Shallow,
    Normal,
    Deep,
}

/// One inhale and exhale inferred from the heart rate trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathCycle {
    pub ended_at: NaiveDateTime,
    pub inhale_ms: i64,
    pub exhale_ms: i64,
    pub ti_te_ratio: f64,
    /// Breaths per minute at the moment the cycle completed.
    pub breath_rate: f64,
    pub depth: BreathDepth,
}

impl BreathCycle {
    pub fn duration_ms(&self) -> i64 {
        self.inhale_ms + self.exhale_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BreathAverages {
    pub cycle_count: usize,
    pub breath_rate: f64,
    pub ti_te_ratio: f64,
}

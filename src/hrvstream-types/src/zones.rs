use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Training intensity state attached to a heart rate sample.
///
/// The first eight labels are heart rate bands relative to the anaerobic
/// threshold. Below the warmup band heart rate alone cannot separate rest
/// from light activity, so those samples get one of the RMSSD based rest
/// labels instead. `Resting` is used when no threshold is known.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneLabel {
    Intensive2,
    Intensive1,
    AnaerobicThreshold,
    Endurance3,
    Endurance2,
    Endurance1,
    Cooldown,
    Warmup,
    Relaxed,
    Rest,
    ActiveLow,
    ActiveHigh,
    TransitionZone,
    Resting,
}

impl ZoneLabel {
    /// Position on the heart rate intensity scale.
    ///
    /// All labels of the RMSSD rest tier share the lowest rank, since they
    /// are only reachable below the warmup band.
    pub fn intensity_rank(self) -> u8 {
        match self {
            ZoneLabel::Intensive2 => 8,
            ZoneLabel::Intensive1 => 7,
            ZoneLabel::AnaerobicThreshold => 6,
            ZoneLabel::Endurance3 => 5,
            ZoneLabel::Endurance2 => 4,
            ZoneLabel::Endurance1 => 3,
            ZoneLabel::Cooldown => 2,
            ZoneLabel::Warmup => 1,
            ZoneLabel::Relaxed
            | ZoneLabel::Rest
            | ZoneLabel::ActiveLow
            | ZoneLabel::ActiveHigh
            | ZoneLabel::TransitionZone
            | ZoneLabel::Resting => 0,
        }
    }

    pub fn is_rest_tier(self) -> bool {
        self.intensity_rank() == 0
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Named artifact rejection settings for common capture situations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactPreset {
    HighFidelity,
    Resting,
    LiveWorkout,
    Raw,
}

impl ArtifactPreset {
    /// Maximum accepted ratio between an interval and the last good one.
    /// `None` disables filtering.
    pub fn threshold(self) -> Option<f64> {
        match self {
            ArtifactPreset::HighFidelity => Some(1.2),
            ArtifactPreset::Resting => Some(1.3),
            ArtifactPreset::LiveWorkout => Some(1.5),
            ArtifactPreset::Raw => None,
        }
    }
}

/// What to emit in place of an interval classified as an artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactStrategy {
    #[default]
    ReplaceWithLastGood,
    Drop,
}

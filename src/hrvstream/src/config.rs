use hrvstream_algos::{ArtifactFilter, HrvAnalyzer, ZoneClassifier};
use hrvstream_types::{ArtifactPreset, ArtifactStrategy};
use serde::{Deserialize, Serialize};

/// Per-athlete heart rate anchors. A value of 0 means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AthleteProfile {
    #[serde(default)]
    pub anaerobic_threshold_hr: f64,
    #[serde(default)]
    pub resting_hr: f64,
    #[serde(default)]
    pub max_hr: f64,
}

impl AthleteProfile {
    pub fn new(anaerobic_threshold_hr: f64, resting_hr: f64, max_hr: f64) -> Self {
        Self {
            anaerobic_threshold_hr,
            resting_hr,
            max_hr,
        }
    }

    fn known(value: f64) -> Option<f64> {
        (value.is_finite() && value > 0.0).then_some(value)
    }

    pub fn anaerobic_threshold(&self) -> Option<f64> {
        Self::known(self.anaerobic_threshold_hr)
    }

    pub fn resting(&self) -> Option<f64> {
        Self::known(self.resting_hr)
    }

    pub fn max(&self) -> Option<f64> {
        Self::known(self.max_hr)
    }

    /// Heart rate reserve (max - resting) when both ends are known and ordered.
    pub fn hr_reserve(&self) -> Option<f64> {
        let reserve = self.max()? - self.resting()?;
        (reserve > 0.0).then_some(reserve)
    }

    /// Karvonen intensity of `heart_rate` as a percentage of the reserve.
    pub fn reserve_percent(&self, heart_rate: f64) -> Option<f64> {
        let reserve = self.hr_reserve()?;
        Some((heart_rate - self.resting()?) / reserve * 100.0)
    }

    pub fn percent_of_max(&self, heart_rate: f64) -> Option<f64> {
        Some(heart_rate / self.max()? * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub profile: AthleteProfile,
    /// `None` keeps the filter's unconfigured threshold.
    #[serde(default)]
    pub preset: Option<ArtifactPreset>,
    #[serde(default)]
    pub strategy: ArtifactStrategy,
    /// Trailing intervals used for live HRV updates, 0 for all.
    #[serde(default = "default_hrv_window")]
    pub hrv_window: usize,
}

fn default_hrv_window() -> usize {
    HrvAnalyzer::DEFAULT_WINDOW
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: AthleteProfile::default(),
            preset: None,
            strategy: ArtifactStrategy::default(),
            hrv_window: default_hrv_window(),
        }
    }
}

impl SessionConfig {
    pub fn with_profile(mut self, profile: AthleteProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_preset(mut self, preset: ArtifactPreset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn with_strategy(mut self, strategy: ArtifactStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub(crate) fn artifact_filter(&self) -> ArtifactFilter {
        match self.preset {
            Some(preset) => ArtifactFilter::from_preset(preset, self.strategy),
            None => ArtifactFilter::new(Some(ArtifactFilter::DEFAULT_THRESHOLD), self.strategy),
        }
    }

    pub(crate) fn zone_classifier(&self) -> ZoneClassifier {
        ZoneClassifier::new(self.profile.anaerobic_threshold_hr)
    }
}

mod sample;
pub use sample::{RawBeatSample, TimedSample};

mod hrv;
pub use hrv::{HrvSnapshot, RrHistogram};

mod zones;
pub use zones::ZoneLabel;

mod breath;
pub use breath::{BreathAverages, BreathCycle, BreathDepth, BreathPhase};

mod artifact;
pub use artifact::{ArtifactPreset, ArtifactStrategy};

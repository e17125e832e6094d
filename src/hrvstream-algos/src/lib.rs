#[macro_use]
extern crate log;

mod error;
pub use error::AlgoError;

pub(crate) mod artifact;
pub use artifact::{ArtifactFilter, FilterOutcome};

pub(crate) mod hrv;
pub use hrv::{FrequencyBand, HrvAnalyzer, SpectralPower};

pub(crate) mod zones;
pub use zones::{ZoneClassifier, ZoneTimeLedger};

pub(crate) mod breath;
pub use breath::BreathEstimator;

pub mod helpers;

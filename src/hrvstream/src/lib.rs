#[macro_use]
extern crate log;

mod config;
pub use config::{AthleteProfile, SessionConfig};

mod session;
pub use session::{SampleUpdate, Session};

mod report;
pub use report::{HeartRateSummary, SessionReport};

mod live;
pub use live::LiveSession;

pub mod recording;

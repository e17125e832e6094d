mod error;
pub use error::CodecError;

mod helpers;

mod measurement;
pub use measurement::{HeartRateMeasurement, SensorContact};

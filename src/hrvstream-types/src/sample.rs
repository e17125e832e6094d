use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One report from the heart rate sensor.
///
/// A report carries the instantaneous heart rate and zero or more RR
/// intervals, in chronological order, that were measured since the
/// previous report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBeatSample {
    pub heart_rate_bpm: u16,
    #[serde(default)]
    pub rr_intervals_ms: Vec<f64>,
}

impl RawBeatSample {
    pub fn new(heart_rate_bpm: u16, rr_intervals_ms: Vec<f64>) -> Self {
        Self {
            heart_rate_bpm,
            rr_intervals_ms,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.heart_rate_bpm > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSample {
    pub time: NaiveDateTime,
    #[serde(flatten)]
    pub sample: RawBeatSample,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn sample_valid_when_bpm_positive() {
        assert!(RawBeatSample::new(62, vec![968.0]).is_valid());
        assert!(!RawBeatSample::new(0, vec![]).is_valid());
    }

    #[test]
    fn missing_rr_defaults_to_empty() {
        let sample: RawBeatSample = serde_json::from_str(r#"{"heart_rate_bpm": 71}"#).unwrap();
        assert_eq!(sample.heart_rate_bpm, 71);
        assert!(sample.rr_intervals_ms.is_empty());
    }

    #[test]
    fn timed_sample_is_flat_json() {
        let time = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let timed = TimedSample {
            time,
            sample: RawBeatSample::new(80, vec![750.0, 752.5]),
        };
        let json = serde_json::to_value(&timed).unwrap();
        assert_eq!(json["heart_rate_bpm"], 80);
        assert_eq!(json["rr_intervals_ms"][1], 752.5);

        let back: TimedSample = serde_json::from_value(json).unwrap();
        assert_eq!(back, timed);
    }
}

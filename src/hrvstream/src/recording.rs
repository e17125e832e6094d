//! Text formats accepted by the command line tools.

use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{NaiveDateTime, TimeDelta};
use hrvstream_codec::HeartRateMeasurement;
use hrvstream_types::{RawBeatSample, TimedSample};
use serde::Deserialize;

#[derive(Deserialize)]
struct RecordedSample {
    #[serde(default)]
    time: Option<NaiveDateTime>,
    #[serde(flatten)]
    sample: RawBeatSample,
}

/// RR intervals in ms, either as a JSON array or separated by whitespace or
/// commas. Every value must be finite and positive.
pub fn parse_intervals(text: &str) -> anyhow::Result<Vec<f64>> {
    let trimmed = text.trim();
    let intervals: Vec<f64> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f64>()
                    .with_context(|| format!("Invalid RR interval `{token}`"))
            })
            .collect::<anyhow::Result<_>>()?
    };

    if let Some((idx, rr)) = intervals
        .iter()
        .enumerate()
        .find(|(_, rr)| !rr.is_finite() || **rr <= 0.0)
    {
        return Err(anyhow!("RR interval {} is {rr}, expected a positive duration", idx + 1));
    }

    Ok(intervals)
}

pub fn read_intervals(path: &Path) -> anyhow::Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_intervals(&text)
}

/// Parses one recorded line.
///
/// JSON objects are [`RawBeatSample`]s with an optional `time`; anything else
/// is taken as a hex Heart Rate Measurement payload. Lines without a time are
/// stamped with `fallback`. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, fallback: NaiveDateTime) -> anyhow::Result<Option<TimedSample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if line.starts_with('{') {
        let recorded: RecordedSample = serde_json::from_str(line)?;
        return Ok(Some(TimedSample {
            time: recorded.time.unwrap_or(fallback),
            sample: recorded.sample,
        }));
    }

    let measurement = HeartRateMeasurement::from_hex(line)
        .map_err(|error| anyhow!("Invalid measurement `{line}`: {error}"))?;
    if measurement.is_off_body() {
        debug!("Sensor reports no skin contact");
    }

    Ok(Some(TimedSample {
        time: fallback,
        sample: measurement.into_sample(),
    }))
}

/// Parses a whole recording. Untimed lines are placed one second after the
/// previous sample, the first one at `start`.
pub fn parse_recording(text: &str, start: NaiveDateTime) -> anyhow::Result<Vec<TimedSample>> {
    let mut samples: Vec<TimedSample> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let fallback = samples
            .last()
            .map(|last| last.time + TimeDelta::seconds(1))
            .unwrap_or(start);

        if let Some(sample) =
            parse_line(line, fallback).with_context(|| format!("Line {}", idx + 1))?
        {
            samples.push(sample);
        }
    }

    Ok(samples)
}

pub fn read_recording(path: &Path, start: NaiveDateTime) -> anyhow::Result<Vec<TimedSample>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_recording(&text, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 2)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    #[test]
    fn intervals_from_json_or_plain_text() {
        assert_eq!(
            parse_intervals("[800, 810.5, 790]").unwrap(),
            vec![800.0, 810.5, 790.0]
        );
        assert_eq!(
            parse_intervals("800\n810.5, 790\n").unwrap(),
            vec![800.0, 810.5, 790.0]
        );
        assert!(parse_intervals("800 abc").is_err());
    }

    #[test]
    fn non_positive_or_non_finite_intervals_are_rejected() {
        assert!(parse_intervals("800 NaN 810").is_err());
        assert!(parse_intervals("800 -5 810").is_err());
        assert!(parse_intervals("800 inf 810").is_err());
        assert!(parse_intervals("800, 0").is_err());
        assert!(parse_intervals("[800, -1]").is_err());
    }

    #[test]
    fn json_line_keeps_its_time() {
        let sample = parse_line(
            r#"{"time": "2025-05-02T18:00:05", "heart_rate_bpm": 64, "rr_intervals_ms": [930.0]}"#,
            base_time(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(sample.time, base_time() + TimeDelta::seconds(5));
        assert_eq!(sample.sample, RawBeatSample::new(64, vec![930.0]));
    }

    #[test]
    fn hex_line_is_decoded() {
        let sample = parse_line("10480004", base_time()).unwrap().unwrap();
        assert_eq!(sample.time, base_time());
        assert_eq!(sample.sample.heart_rate_bpm, 72);
        assert_eq!(sample.sample.rr_intervals_ms, vec![1000.0]);
        assert!(parse_line("zz", base_time()).is_err());
    }

    #[test]
    fn untimed_lines_are_spaced_one_second_apart() {
        let text = "# warmup\n{\"heart_rate_bpm\": 60}\n\n10480004\n";
        let samples = parse_recording(text, base_time()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].time, base_time());
        assert_eq!(samples[1].time, base_time() + TimeDelta::seconds(1));
    }
}

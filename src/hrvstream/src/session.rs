use anyhow::anyhow;
use chrono::NaiveDateTime;
use hrvstream_algos::{
    ArtifactFilter, BreathEstimator, HrvAnalyzer, ZoneClassifier, ZoneTimeLedger,
};
use hrvstream_types::{BreathCycle, HrvSnapshot, RawBeatSample, TimedSample, ZoneLabel};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    SessionConfig,
    report::{HeartRateSummary, SessionReport},
};

/// Result of feeding one sensor report into a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleUpdate {
    pub time: NaiveDateTime,
    pub heart_rate: u16,
    pub zone: ZoneLabel,
    pub rmssd: f64,
    /// Intervals in this sample classified as artifacts.
    pub artifacts: usize,
    /// Live breaths per minute, extrapolated before the first full cycle.
    pub breath_rate: f64,
    /// Breath cycle completed by this sample, if any.
    pub breath_cycle: Option<BreathCycle>,
}

/// One measurement from start to stop.
///
/// All processing is synchronous; callers serialise [`Session::handle_sample`]
/// and [`Session::tick`] themselves, or use [`crate::LiveSession`].
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    started_at: NaiveDateTime,
    stopped_at: Option<NaiveDateTime>,
    filter: ArtifactFilter,
    classifier: ZoneClassifier,
    samples: Vec<TimedSample>,
    snapshot: HrvSnapshot,
    ledger: ZoneTimeLedger,
    breath: BreathEstimator,
    zone: Option<ZoneLabel>,
    heart_rate: HeartRateSummary,
}

impl Session {
    /// Zone credited before the first valid sample arrives.
    const IDLE_ZONE: ZoneLabel = ZoneLabel::Resting;

    pub fn start(config: SessionConfig, now: NaiveDateTime) -> Self {
        let mut ledger = ZoneTimeLedger::new();
        ledger.start(now);

        let id = Uuid::new_v4();
        info!("Session {id} started at {now}");

        Self {
            id,
            filter: config.artifact_filter(),
            classifier: config.zone_classifier(),
            config,
            started_at: now,
            stopped_at: None,
            samples: Vec::new(),
            snapshot: HrvSnapshot::default(),
            ledger,
            breath: BreathEstimator::new(),
            zone: None,
            heart_rate: HeartRateSummary::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Runs one sensor report through the pipeline.
    ///
    /// Returns `Ok(None)` once the session is stopped or when the report
    /// carries no heart rate. A report with an invalid RR interval is
    /// rejected whole and leaves the session untouched.
    pub fn handle_sample(
        &mut self,
        time: NaiveDateTime,
        sample: RawBeatSample,
    ) -> anyhow::Result<Option<SampleUpdate>> {
        if self.is_stopped() {
            debug!("Session {} stopped, ignoring sample at {time}", self.id);
            return Ok(None);
        }

        if let Some(rr) = sample
            .rr_intervals_ms
            .iter()
            .find(|rr| !rr.is_finite() || **rr <= 0.0)
        {
            return Err(anyhow!("Sample at {time} carries invalid RR interval {rr}"));
        }

        let mut emitted = false;
        let mut artifacts = 0;
        for rr in &sample.rr_intervals_ms {
            let outcome = self.filter.add_interval(*rr)?;
            emitted |= outcome.emitted().is_some();
            if outcome.is_artifact() {
                artifacts += 1;
            }
        }

        if emitted {
            self.snapshot = HrvAnalyzer::analyze_window(self.filter.intervals(), self.config.hrv_window);
        }

        let valid = sample.is_valid();
        let heart_rate = sample.heart_rate_bpm;
        self.samples.push(TimedSample { time, sample });

        if !valid {
            debug!("Sample at {time} has no heart rate");
            return Ok(None);
        }

        self.heart_rate.add(heart_rate);
        let zone = self.classifier.zone(f64::from(heart_rate), self.snapshot.rmssd);
        self.zone = Some(zone);
        let breath_cycle = self.breath.add_sample(time, f64::from(heart_rate));

        Ok(Some(SampleUpdate {
            time,
            heart_rate,
            zone,
            rmssd: self.snapshot.rmssd,
            artifacts,
            breath_rate: self.breath.breath_rate_at(time),
            breath_cycle,
        }))
    }

    /// Credits elapsed whole seconds to the current zone. Meant to be called
    /// about once per second; irregular calls are fine.
    pub fn tick(&mut self, now: NaiveDateTime) {
        if self.is_stopped() {
            return;
        }

        self.ledger.advance(now, self.current_zone());
    }

    /// Freezes the session. Later samples and ticks are ignored.
    pub fn stop(&mut self, now: NaiveDateTime) {
        if self.is_stopped() {
            return;
        }

        self.tick(now);
        self.stopped_at = Some(now);
        info!(
            "Session {} stopped after {}s, {} samples, {} intervals ({} artifacts)",
            self.id,
            self.ledger.total_seconds(),
            self.samples.len(),
            self.filter.intervals().len(),
            self.filter.artifact_count()
        );
    }

    pub fn current_zone(&self) -> ZoneLabel {
        self.zone.unwrap_or(Self::IDLE_ZONE)
    }

    /// Latest windowed HRV snapshot.
    pub fn snapshot(&self) -> &HrvSnapshot {
        &self.snapshot
    }

    pub fn ledger(&self) -> &ZoneTimeLedger {
        &self.ledger
    }

    pub fn breath(&self) -> &BreathEstimator {
        &self.breath
    }

    pub fn intervals(&self) -> &[f64] {
        self.filter.intervals()
    }

    pub fn samples(&self) -> &[TimedSample] {
        &self.samples
    }

    /// Summary over the whole session. HRV is recomputed over every filtered
    /// interval rather than the live window.
    pub fn report(&self) -> SessionReport {
        let profile = self.config.profile;
        let (avg_hr_reserve_percent, peak_hr_percent_of_max) = match self.heart_rate.is_empty() {
            true => (None, None),
            false => (
                profile.reserve_percent(self.heart_rate.avg),
                profile.percent_of_max(f64::from(self.heart_rate.max)),
            ),
        };

        SessionReport {
            id: self.id,
            started_at: self.started_at,
            stopped_at: self.stopped_at,
            duration_seconds: self.ledger.total_seconds(),
            heart_rate: self.heart_rate,
            avg_hr_reserve_percent,
            peak_hr_percent_of_max,
            hrv: HrvAnalyzer::analyze(self.filter.intervals()),
            zone_seconds: self.ledger.to_map(),
            breathing: self.breath.averages(0),
            breathing_short_term: self.breath.short_term_averages(),
            artifact_count: self.filter.artifact_count(),
            filtered_intervals: self.filter.intervals().to_vec(),
            raw_samples: self.samples.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AthleteProfile;
    use chrono::{NaiveDate, TimeDelta};
    use hrvstream_types::ArtifactPreset;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
    }

    fn athlete() -> SessionConfig {
        SessionConfig::default().with_profile(AthleteProfile::new(170.0, 50.0, 190.0))
    }

    #[test]
    fn artifacts_are_replaced_in_session_intervals() {
        let start = base_time();
        let mut session = Session::start(SessionConfig::default(), start);
        let first = session
            .handle_sample(start, RawBeatSample::new(74, vec![800.0, 810.0]))
            .unwrap()
            .unwrap();
        let second = session
            .handle_sample(
                start + TimeDelta::seconds(1),
                RawBeatSample::new(74, vec![1600.0, 790.0]),
            )
            .unwrap()
            .unwrap();

        assert_eq!(first.artifacts, 0);
        assert_eq!(second.artifacts, 1);
        assert_eq!(session.intervals(), &[800.0, 810.0, 810.0, 790.0]);
        assert_eq!(session.report().artifact_count, 1);
    }

    #[test]
    fn sample_update_carries_zone() {
        let start = base_time();
        let mut session = Session::start(athlete(), start);
        let update = session
            .handle_sample(start, RawBeatSample::new(180, vec![333.0]))
            .unwrap()
            .unwrap();
        assert_eq!(update.heart_rate, 180);
        // single interval, rmssd is still 0
        assert_eq!(update.zone, ZoneLabel::Intensive1);
        assert_eq!(session.current_zone(), ZoneLabel::Intensive1);
    }

    #[test]
    fn breath_rate_is_estimated_before_first_cycle() {
        let start = base_time();
        let mut session = Session::start(SessionConfig::default(), start);
        let first = session
            .handle_sample(start, RawBeatSample::new(60, vec![]))
            .unwrap()
            .unwrap();
        assert_eq!(first.breath_rate, 0.0);

        let update = session
            .handle_sample(start + TimeDelta::seconds(2), RawBeatSample::new(64, vec![]))
            .unwrap()
            .unwrap();
        // 2 s into the first inhale
        assert!(update.breath_cycle.is_none());
        assert!((update.breath_rate - 30.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_threshold_classifies_resting() {
        let start = base_time();
        let mut session = Session::start(SessionConfig::default(), start);
        let update = session
            .handle_sample(start, RawBeatSample::new(150, vec![400.0]))
            .unwrap()
            .unwrap();
        assert_eq!(update.zone, ZoneLabel::Resting);
    }

    #[test]
    fn invalid_interval_rejects_whole_sample() {
        let start = base_time();
        let mut session = Session::start(SessionConfig::default(), start);
        assert!(
            session
                .handle_sample(start, RawBeatSample::new(70, vec![850.0, -3.0]))
                .is_err()
        );
        assert!(
            session
                .handle_sample(start, RawBeatSample::new(70, vec![f64::NAN]))
                .is_err()
        );
        assert!(session.intervals().is_empty());
        assert!(session.samples().is_empty());
    }

    #[test]
    fn zero_heart_rate_keeps_intervals_but_no_update() {
        let start = base_time();
        let mut session = Session::start(SessionConfig::default(), start);
        let update = session
            .handle_sample(start, RawBeatSample::new(0, vec![900.0]))
            .unwrap();
        assert!(update.is_none());
        assert_eq!(session.intervals(), &[900.0]);
        assert_eq!(session.report().heart_rate.samples, 0);
    }

    #[test]
    fn ledger_follows_current_zone() {
        let start = base_time();
        let mut session = Session::start(athlete(), start);
        session.tick(start + TimeDelta::seconds(3));
        session
            .handle_sample(start + TimeDelta::seconds(3), RawBeatSample::new(170, vec![]))
            .unwrap();
        for s in 4..=10 {
            session.tick(start + TimeDelta::seconds(s));
        }
        session.stop(start + TimeDelta::milliseconds(10_500));

        let ledger = session.ledger();
        assert_eq!(ledger.seconds(ZoneLabel::Resting), 3);
        assert_eq!(ledger.seconds(ZoneLabel::AnaerobicThreshold), 7);
        assert_eq!(ledger.total_seconds(), 10);
    }

    #[test]
    fn stopped_session_is_frozen() {
        let start = base_time();
        let mut session = Session::start(SessionConfig::default(), start);
        session
            .handle_sample(start, RawBeatSample::new(60, vec![1000.0, 1000.0]))
            .unwrap();
        session.stop(start + TimeDelta::seconds(5));

        let before = session.report();
        assert!(
            session
                .handle_sample(
                    start + TimeDelta::seconds(6),
                    RawBeatSample::new(60, vec![1000.0])
                )
                .unwrap()
                .is_none()
        );
        session.tick(start + TimeDelta::seconds(20));
        session.stop(start + TimeDelta::seconds(30));

        let after = session.report();
        assert_eq!(after.filtered_intervals, before.filtered_intervals);
        assert_eq!(after.duration_seconds, 5);
        assert_eq!(after.stopped_at, Some(start + TimeDelta::seconds(5)));
    }

    #[test]
    fn report_heart_rate_summary() {
        let start = base_time();
        let config = athlete().with_preset(ArtifactPreset::Raw);
        let mut session = Session::start(config, start);
        for (i, hr) in [110_u16, 130, 150].into_iter().enumerate() {
            session
                .handle_sample(
                    start + TimeDelta::seconds(i as i64),
                    RawBeatSample::new(hr, vec![60_000.0 / f64::from(hr)]),
                )
                .unwrap();
        }

        let report = session.report();
        assert_eq!(report.heart_rate.min, 110);
        assert_eq!(report.heart_rate.max, 150);
        assert_eq!(report.heart_rate.avg, 130.0);
        // (130 - 50) / 140
        let reserve = report.avg_hr_reserve_percent.unwrap();
        assert!((reserve - 80.0 / 140.0 * 100.0).abs() < 1e-9);
        let peak = report.peak_hr_percent_of_max.unwrap();
        assert!((peak - 150.0 / 190.0 * 100.0).abs() < 1e-9);
        assert_eq!(report.raw_samples.len(), 3);
    }

    #[test]
    fn live_snapshot_uses_window() {
        let start = base_time();
        let config = SessionConfig {
            hrv_window: 4,
            ..SessionConfig::default()
        };
        let mut session = Session::start(config, start);
        session
            .handle_sample(
                start,
                RawBeatSample::new(60, vec![1000.0, 1010.0, 1000.0, 1010.0, 1000.0, 1010.0]),
            )
            .unwrap();

        assert_eq!(session.snapshot().interval_count, 4);
        assert_eq!(session.report().hrv.interval_count, 6);
    }
}

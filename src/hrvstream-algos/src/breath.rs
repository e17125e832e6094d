use std::collections::VecDeque;

use chrono::{NaiveDateTime, TimeDelta};
use hrvstream_types::{BreathAverages, BreathCycle, BreathDepth, BreathPhase};

use crate::helpers::stats::mean;

const SHORT_TERM_CYCLES: usize = 7;
const HISTORY_CYCLES: usize = 100;
const RATE_WINDOW: TimeDelta = TimeDelta::seconds(60);
const SHALLOW_MAX_MS: i64 = 3_000;
const DEEP_MIN_MS: i64 = 6_000;

/// Infers breathing cycles from the direction of heart rate change.
///
/// Heart rate rises during inspiration and falls during expiration
/// (respiratory sinus arrhythmia). A cycle completes when a falling phase
/// turns into a rising one.
#[derive(Debug, Clone, Default)]
pub struct BreathEstimator {
    phase: Option<BreathPhase>,
    last: Option<(NaiveDateTime, f64)>,
    first_seen: Option<NaiveDateTime>,
    cycle_started: Option<NaiveDateTime>,
    inhale_ms: i64,
    exhale_ms: i64,
    recent: VecDeque<BreathCycle>,
    history: VecDeque<BreathCycle>,
    completed: usize,
}

impl BreathEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Option<BreathPhase> {
        self.phase
    }

    /// Feeds one heart rate sample and returns the cycle it completed, if any.
    pub fn add_sample(&mut self, time: NaiveDateTime, heart_rate: f64) -> Option<BreathCycle> {
        let Some((last_time, last_hr)) = self.last else {
            self.last = Some((time, heart_rate));
            self.first_seen = Some(time);
            self.cycle_started = Some(time);
            return None;
        };

        let elapsed = (time - last_time).num_milliseconds().max(0);
        self.last = Some((time, heart_rate));

        let mut completed = None;
        if heart_rate > last_hr {
            if self.phase == Some(BreathPhase::Expiration) {
                completed = self.close_cycle(last_time);
            }
            self.phase = Some(BreathPhase::Inspiration);
            self.inhale_ms += elapsed;
        } else if heart_rate < last_hr {
            self.phase = Some(BreathPhase::Expiration);
            self.exhale_ms += elapsed;
        } else {
            match self.phase {
                Some(BreathPhase::Inspiration) => self.inhale_ms += elapsed,
                Some(BreathPhase::Expiration) => self.exhale_ms += elapsed,
                None => {}
            }
        }

        completed
    }

    fn close_cycle(&mut self, ended_at: NaiveDateTime) -> Option<BreathCycle> {
        let (inhale_ms, exhale_ms) = (self.inhale_ms, self.exhale_ms);
        self.inhale_ms = 0;
        self.exhale_ms = 0;
        self.cycle_started = Some(ended_at);

        if exhale_ms == 0 {
            return None;
        }

        let ti_te_ratio = inhale_ms as f64 / exhale_ms as f64;
        let cycle = BreathCycle {
            ended_at,
            inhale_ms,
            exhale_ms,
            ti_te_ratio,
            breath_rate: self.rate_with(ended_at, 1),
            depth: Self::depth(inhale_ms + exhale_ms),
        };

        trace!(
            "Breath cycle: inhale {inhale_ms}ms, exhale {exhale_ms}ms, {:.1}/min",
            cycle.breath_rate
        );

        Self::push_bounded(&mut self.recent, cycle, SHORT_TERM_CYCLES);
        Self::push_bounded(&mut self.history, cycle, HISTORY_CYCLES);
        self.completed += 1;

        Some(cycle)
    }

    fn push_bounded(buffer: &mut VecDeque<BreathCycle>, cycle: BreathCycle, cap: usize) {
        if buffer.len() == cap {
            buffer.pop_front();
        }
        buffer.push_back(cycle);
    }

    fn depth(duration_ms: i64) -> BreathDepth {
        if duration_ms < SHALLOW_MAX_MS {
            BreathDepth::Shallow
        } else if duration_ms > DEEP_MIN_MS {
            BreathDepth::Deep
        } else {
            BreathDepth::Normal
        }
    }

    /// Cycles per minute over the trailing window ending at `now`, counting
    /// `extra` not-yet-recorded cycles. Scaled up while less than a full
    /// window has been observed.
    fn rate_with(&self, now: NaiveDateTime, extra: usize) -> f64 {
        let Some(first_seen) = self.first_seen else {
            return 0.0;
        };

        let window_start = now - RATE_WINDOW;
        let count = self
            .history
            .iter()
            .rev()
            .take_while(|c| c.ended_at > window_start)
            .count()
            + extra;

        let observed_ms = (now - first_seen)
            .num_milliseconds()
            .min(RATE_WINDOW.num_milliseconds());
        if observed_ms <= 0 {
            return 0.0;
        }

        count as f64 * 60_000.0 / observed_ms as f64
    }

    /// Breaths per minute as of `now`. Before any cycle has completed the
    /// rate is extrapolated from the cycle in progress.
    pub fn breath_rate_at(&self, now: NaiveDateTime) -> f64 {
        if self.history.is_empty() {
            let Some(cycle_started) = self.cycle_started else {
                return 0.0;
            };
            let partial_ms = (now - cycle_started).num_milliseconds();
            return if partial_ms > 0 {
                60_000.0 / partial_ms as f64
            } else {
                0.0
            };
        }

        self.rate_with(now, 0)
    }

    /// Mean breath rate and Ti/Te over the last `count` retained cycles, or
    /// over all retained cycles when `count` is 0.
    pub fn averages(&self, count: usize) -> BreathAverages {
        let take = if count == 0 {
            self.history.len()
        } else {
            count.min(self.history.len())
        };
        Self::average_of(self.history.iter().skip(self.history.len() - take))
    }

    pub fn short_term_averages(&self) -> BreathAverages {
        Self::average_of(self.recent.iter())
    }

    fn average_of<'a>(cycles: impl Iterator<Item = &'a BreathCycle>) -> BreathAverages {
        let (rates, ratios): (Vec<f64>, Vec<f64>) =
            cycles.map(|c| (c.breath_rate, c.ti_te_ratio)).unzip();

        if rates.is_empty() {
            return BreathAverages::default();
        }

        BreathAverages {
            cycle_count: rates.len(),
            breath_rate: mean(&rates),
            ti_te_ratio: mean(&ratios),
        }
    }

    pub fn recent_cycles(&self) -> impl Iterator<Item = &BreathCycle> {
        self.recent.iter()
    }

    pub fn history(&self) -> impl Iterator<Item = &BreathCycle> {
        self.history.iter()
    }

    /// Cycles completed since the estimator was created or reset, including
    /// those evicted from the retained history.
    pub fn completed_cycles(&self) -> usize {
        self.completed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::Rng;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
    }

    /// 1 Hz heart rate rising for two samples and falling for two: one
    /// 4 second cycle, 15 breaths per minute.
    fn feed_square_breathing(estimator: &mut BreathEstimator, seconds: i64) -> Vec<BreathCycle> {
        let pattern = [60.0, 62.0, 64.0, 62.0];
        (0..seconds)
            .filter_map(|i| {
                estimator.add_sample(
                    base_time() + TimeDelta::seconds(i),
                    pattern[(i % 4) as usize],
                )
            })
            .collect()
    }

    #[test]
    fn first_sample_only_seeds() {
        let mut estimator = BreathEstimator::new();
        assert!(estimator.add_sample(base_time(), 70.0).is_none());
        assert_eq!(estimator.phase(), None);
        assert_eq!(estimator.averages(0), BreathAverages::default());
    }

    #[test]
    fn detects_regular_cycles() {
        let mut estimator = BreathEstimator::new();
        let cycles = feed_square_breathing(&mut estimator, 122);

        assert_eq!(cycles.len(), 30);
        for cycle in &cycles {
            assert_eq!(cycle.inhale_ms, 2000);
            assert_eq!(cycle.exhale_ms, 2000);
            assert_eq!(cycle.ti_te_ratio, 1.0);
            assert_eq!(cycle.depth, BreathDepth::Normal);
            assert!((cycle.breath_rate - 15.0).abs() < 1e-9, "{cycle:?}");
        }

        let averages = estimator.averages(0);
        assert_eq!(averages.cycle_count, 30);
        assert!((averages.breath_rate - 15.0).abs() < 1e-9);
        assert_eq!(averages.ti_te_ratio, 1.0);
    }

    #[test]
    fn equal_samples_extend_phase() {
        let mut estimator = BreathEstimator::new();
        let t = |s| base_time() + TimeDelta::seconds(s);
        estimator.add_sample(t(0), 60.0);
        estimator.add_sample(t(1), 63.0);
        estimator.add_sample(t(2), 63.0);
        estimator.add_sample(t(3), 63.0);
        estimator.add_sample(t(4), 61.0);
        let cycle = estimator.add_sample(t(5), 62.0).unwrap();
        assert_eq!(cycle.inhale_ms, 3000);
        assert_eq!(cycle.exhale_ms, 1000);
        assert_eq!(cycle.ti_te_ratio, 3.0);
        assert_eq!(cycle.ended_at, t(4));
    }

    #[test]
    fn depth_buckets() {
        assert_eq!(BreathEstimator::depth(2000), BreathDepth::Shallow);
        assert_eq!(BreathEstimator::depth(3000), BreathDepth::Normal);
        assert_eq!(BreathEstimator::depth(6000), BreathDepth::Normal);
        assert_eq!(BreathEstimator::depth(9000), BreathDepth::Deep);
    }

    #[test]
    fn history_is_bounded() {
        let mut estimator = BreathEstimator::new();
        feed_square_breathing(&mut estimator, 4 * 150 + 2);
        assert_eq!(estimator.completed_cycles(), 150);
        assert_eq!(estimator.history().count(), HISTORY_CYCLES);
        assert_eq!(estimator.recent_cycles().count(), SHORT_TERM_CYCLES);
        assert_eq!(estimator.short_term_averages().cycle_count, SHORT_TERM_CYCLES);
    }

    #[test]
    fn averages_over_last_cycles() {
        let mut estimator = BreathEstimator::new();
        feed_square_breathing(&mut estimator, 42);
        assert_eq!(estimator.averages(3).cycle_count, 3);
        assert_eq!(estimator.averages(500).cycle_count, 10);
    }

    #[test]
    fn rate_extrapolates_partial_cycle() {
        let mut estimator = BreathEstimator::new();
        estimator.add_sample(base_time(), 60.0);
        estimator.add_sample(base_time() + TimeDelta::seconds(2), 64.0);
        // 5 seconds into the first cycle -> 12 per minute
        let rate = estimator.breath_rate_at(base_time() + TimeDelta::seconds(5));
        assert!((rate - 12.0).abs() < 1e-9);
        assert_eq!(BreathEstimator::new().breath_rate_at(base_time()), 0.0);
    }

    #[test]
    fn random_heart_rate_keeps_invariants() {
        let mut rng = rand::rng();
        let mut estimator = BreathEstimator::new();
        let mut now = base_time();
        for _ in 0..2000 {
            now += TimeDelta::milliseconds(rng.random_range(200..1500));
            if let Some(cycle) = estimator.add_sample(now, f64::from(rng.random_range(55..75))) {
                assert!(cycle.ti_te_ratio >= 0.0);
                assert!(cycle.exhale_ms > 0);
                assert!(matches!(
                    cycle.depth,
                    BreathDepth::Shallow | BreathDepth::Normal | BreathDepth::Deep
                ));
            }
        }
        assert!(estimator.history().count() <= HISTORY_CYCLES);
    }

    #[test]
    fn reset_clears_history() {
        let mut estimator = BreathEstimator::new();
        feed_square_breathing(&mut estimator, 21);
        estimator.reset();
        assert_eq!(estimator.completed_cycles(), 0);
        assert_eq!(estimator.history().count(), 0);
        assert_eq!(estimator.phase(), None);
    }
}

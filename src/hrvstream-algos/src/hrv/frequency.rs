use realfft::RealFftPlanner;

use crate::helpers::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBand {
    Vlf,
    Lf,
    Hf,
}

impl FrequencyBand {
    /// Half-open `[low, high)` range in Hz.
    pub fn range(self) -> (f64, f64) {
        match self {
            FrequencyBand::Vlf => (0.0033, 0.04),
            FrequencyBand::Lf => (0.04, 0.15),
            FrequencyBand::Hf => (0.15, 0.4),
        }
    }

    fn of(frequency: f64) -> Option<Self> {
        [FrequencyBand::Vlf, FrequencyBand::Lf, FrequencyBand::Hf]
            .into_iter()
            .find(|band| {
                let (low, high) = band.range();
                frequency >= low && frequency < high
            })
    }
}

/// Band powers of an RR interval series in ms².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectralPower {
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
}

impl SpectralPower {
    pub const RESAMPLE_HZ: f64 = 4.0;
    const MIN_RESAMPLED_POINTS: usize = 8;

    /// Resamples the tachogram onto a uniform grid, then integrates the
    /// periodogram over the VLF, LF and HF bands.
    ///
    /// Series too short to resample return zero power.
    pub fn from_intervals(intervals: &[f64]) -> Self {
        let Some(signal) = Self::resample(intervals, Self::RESAMPLE_HZ) else {
            return Self::default();
        };

        let n = signal.len();
        let offset = mean(&signal);
        let n_fft = n.next_power_of_two();
        let mut buffer: Vec<f64> = signal.into_iter().map(|v| v - offset).collect();
        buffer.resize(n_fft, 0.0);

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(n_fft);
        let mut spectrum = r2c.make_output_vec();
        if let Err(error) = r2c.process(&mut buffer, &mut spectrum) {
            warn!("FFT over {n_fft} points failed: {error}");
            return Self::default();
        }

        let df = Self::RESAMPLE_HZ / n_fft as f64;
        let scale = 2.0 / (Self::RESAMPLE_HZ * n as f64);

        let mut power = Self::default();
        for (k, bin) in spectrum.iter().enumerate().skip(1) {
            let Some(band) = FrequencyBand::of(k as f64 * df) else {
                continue;
            };

            let area = bin.norm_sqr() * scale * df;
            match band {
                FrequencyBand::Vlf => power.vlf += area,
                FrequencyBand::Lf => power.lf += area,
                FrequencyBand::Hf => power.hf += area,
            }
        }

        power
    }

    pub fn total(&self) -> f64 {
        self.vlf + self.lf + self.hf
    }

    pub fn lf_hf_ratio(&self) -> f64 {
        if self.hf > 0.0 { self.lf / self.hf } else { 0.0 }
    }

    /// Linear interpolation of RR values against their cumulative beat times.
    fn resample(intervals: &[f64], fs: f64) -> Option<Vec<f64>> {
        if intervals.len() < 2 {
            return None;
        }

        let mut times = Vec::with_capacity(intervals.len());
        let mut acc = 0.0;
        for rr in intervals {
            acc += rr;
            times.push(acc);
        }

        let start = times[0];
        let duration = times[times.len() - 1] - start;
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }

        let step_ms = 1000.0 / fs;
        let count = (duration / step_ms).floor() as usize + 1;
        if count < Self::MIN_RESAMPLED_POINTS {
            return None;
        }

        let mut signal = Vec::with_capacity(count);
        let mut idx = 0;
        for i in 0..count {
            let t = start + i as f64 * step_ms;
            while idx + 2 < times.len() && times[idx + 1] < t {
                idx += 1;
            }

            let (t0, t1) = (times[idx], times[idx + 1]);
            let (v0, v1) = (intervals[idx], intervals[idx + 1]);
            let span = t1 - t0;
            let value = if span > 0.0 {
                v0 + (v1 - v0) * ((t - t0) / span).clamp(0.0, 1.0)
            } else {
                v0
            };
            signal.push(value);
        }

        Some(signal)
    }
}

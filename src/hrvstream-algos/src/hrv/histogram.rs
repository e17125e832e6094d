use hrvstream_types::RrHistogram;

/// Buckets intervals into `ceil(sqrt(n))` equal bins between the observed
/// minimum and maximum. Identical values collapse into one bin.
pub(crate) fn rr_histogram(intervals: &[f64]) -> RrHistogram {
    if intervals.is_empty() {
        return RrHistogram::default();
    }

    let min = intervals.iter().copied().fold(f64::INFINITY, f64::min);
    let max = intervals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range <= 0.0 {
        return RrHistogram {
            labels: vec![format!("{min:.0}")],
            counts: vec![intervals.len()],
        };
    }

    let bins = (intervals.len() as f64).sqrt().ceil() as usize;
    let width = range / bins as f64;

    let mut counts = vec![0_usize; bins];
    for rr in intervals {
        let idx = (((rr - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let labels = (0..bins)
        .map(|i| {
            let low = min + i as f64 * width;
            format!("{:.0}-{:.0}", low, low + width)
        })
        .collect();

    RrHistogram { labels, counts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(rr_histogram(&[]).is_empty());
    }

    #[test]
    fn identical_values_single_bin() {
        let histogram = rr_histogram(&[950.0; 7]);
        assert_eq!(histogram.labels, vec!["950".to_string()]);
        assert_eq!(histogram.counts, vec![7]);
    }

    #[test]
    fn max_value_falls_in_last_bin() {
        // 4 values -> 2 bins of 100ms
        let histogram = rr_histogram(&[800.0, 820.0, 900.0, 1000.0]);
        assert_eq!(histogram.labels, vec!["800-900", "900-1000"]);
        assert_eq!(histogram.counts, vec![2, 2]);
    }
}

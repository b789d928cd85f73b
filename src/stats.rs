//! Summary statistics for the box plots and learning curves.

use serde::Serialize;
use std::cmp::Ordering;

/// How far past the quartiles the whiskers reach, in interquartile ranges.
const WHISKER_IQR: f64 = 1.5;

/// The numbers behind one box of a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    /// Number of samples
    pub count: usize,
    /// Smallest sample
    pub min: f64,
    /// 25th percentile
    pub q1: f64,
    /// 50th percentile
    pub median: f64,
    /// 75th percentile
    pub q3: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Smallest sample no further than 1.5 IQR below `q1`
    pub whisker_low: f64,
    /// Largest sample no further than 1.5 IQR above `q3`
    pub whisker_high: f64,
    /// Samples outside the whiskers, ascending
    pub outliers: Vec<f64>,
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Quantile of already sorted data, interpolating linearly between the two
/// closest ranks.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len().saturating_sub(1) as f64);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let t = pos - lo as f64;
        sorted[lo] * (1.0 - t) + sorted[hi] * t
    }
}

/// Mean of `values`, `None` if there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

impl BoxStats {
    /// Summarise a sample. Returns `None` for an empty sample, since there is
    /// no box to draw.
    pub fn from_samples(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let v = sorted(values);

        let q1 = quantile_sorted(&v, 0.25);
        let median = quantile_sorted(&v, 0.5);
        let q3 = quantile_sorted(&v, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - WHISKER_IQR * iqr;
        let hi_fence = q3 + WHISKER_IQR * iqr;

        // the data always has points inside the fences, the quartiles sit
        // between min and max
        let whisker_low = v.iter().copied().find(|&x| x >= lo_fence).unwrap_or(q1);
        let whisker_high = v.iter().rev().copied().find(|&x| x <= hi_fence).unwrap_or(q3);
        let outliers = v
            .iter()
            .copied()
            .filter(|&x| x < whisker_low || x > whisker_high)
            .collect();

        Some(BoxStats {
            count: v.len(),
            min: v[0],
            q1,
            median,
            q3,
            max: v[v.len() - 1],
            mean: v.iter().sum::<f64>() / v.len() as f64,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quartiles_interpolate() {
        let s = BoxStats::from_samples(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert!(close(s.q1, 1.75));
        assert!(close(s.median, 2.5));
        assert!(close(s.q3, 3.25));
        assert!(close(s.mean, 2.5));
        assert_eq!((s.min, s.max), (1.0, 4.0));
        assert_eq!((s.whisker_low, s.whisker_high), (1.0, 4.0));
        assert!(s.outliers.is_empty());
    }

    #[test]
    fn far_points_are_outliers() {
        let s = BoxStats::from_samples(&[10.0, 11.0, 12.0, 13.0, 14.0, 100.0]).unwrap();
        assert_eq!(s.outliers, vec![100.0]);
        assert_eq!(s.whisker_high, 14.0);
        assert_eq!(s.max, 100.0);
    }

    #[test]
    fn single_sample() {
        let s = BoxStats::from_samples(&[7.5]).unwrap();
        assert_eq!((s.q1, s.median, s.q3), (7.5, 7.5, 7.5));
        assert_eq!((s.whisker_low, s.whisker_high), (7.5, 7.5));
    }

    #[test]
    fn empty_sample() {
        assert!(BoxStats::from_samples(&[]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn quantile_ends() {
        let v = sorted(&[3.0, 9.0, 1.0]);
        assert_eq!(v, vec![1.0, 3.0, 9.0]);
        assert_eq!(quantile_sorted(&v, 0.0), 1.0);
        assert_eq!(quantile_sorted(&v, 1.0), 9.0);
        assert_eq!(quantile_sorted(&v, 0.5), 3.0);
        assert_eq!(quantile_sorted(&v, 0.75), 6.0);
        assert_eq!(mean(&v), Some(13.0 / 3.0));
    }
}

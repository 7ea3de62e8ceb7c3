//! Descriptive statistics over derived columns.
//!
//! Every function treats `NaN` as a missing value and skips it.

use std::collections::HashMap;

/// Arithmetic mean, or `None` when there is nothing to average.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Median (mean of the two middle values for an even count).
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let sorted = sorted(values);
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// Values with missing entries dropped, in ascending order.
pub fn sorted<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut out: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if values.len() < 2 {
        return None;
    }
    let m = mean(values.iter().copied())?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Occurrences of each distinct value, most frequent first.
///
/// Equal counts are ordered by value so the result does not depend on input
/// order.
pub fn value_counts<'a, I>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Fixed-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    /// Count per bin. The last bin is closed on the right.
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning their range.
    ///
    /// A constant sample gets a unit-wide range centred on the value. An
    /// empty sample yields no bins.
    pub fn new<I>(values: I, bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = sorted(values);
        let (Some(&lo), Some(&hi)) = (values.first(), values.last()) else {
            return Self {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        };
        let bins = bins.max(1);
        let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
        let width = (hi - lo) / bins as f64;

        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Self { edges, counts }
    }

    /// `(left, right, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(w, &c)| (w[0], w[1], c))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Gaussian kernel density estimate sampled at `points` positions between the
/// smallest and largest value (no extrapolation past the data).
///
/// Bandwidth follows Scott's rule. A sample with no spread collapses to a
/// single point of density 1.
pub fn kernel_density(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let values = sorted(values.iter().copied());
    let (Some(&lo), Some(&hi)) = (values.first(), values.last()) else {
        return Vec::new();
    };

    let n = values.len() as f64;
    let bandwidth = std_dev(&values).unwrap_or(0.0) * n.powf(-0.2);
    if bandwidth <= 0.0 || lo == hi {
        return vec![(lo, 1.0)];
    }

    let points = points.max(2);
    let step = (hi - lo) / (points - 1) as f64;
    let norm = n * bandwidth * (2.0 * std::f64::consts::PI).sqrt();

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                / norm;
            (x, density)
        })
        .collect()
}

/// Sample size, mean and median of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub n: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl Summary {
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = sorted(values);
        Self {
            n: values.len(),
            mean: mean(values.iter().copied()),
            median: median(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_median_skip_missing() {
        let values = [3.0, f64::NAN, 1.0, 2.0, 10.0];
        assert_eq!(mean(values), Some(4.0));
        assert_eq!(median(values), Some(2.5));
        assert_eq!(median([5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(median([f64::NAN]), None);
        assert_eq!(
            Summary::of(Vec::<f64>::new()),
            Summary {
                n: 0,
                mean: None,
                median: None
            }
        );
        assert!(Histogram::new(Vec::<f64>::new(), 10).is_empty());
        assert!(kernel_density(&[], 50).is_empty());
    }

    #[test]
    fn test_value_counts_breaks_ties_by_name() {
        let counts = value_counts(["Go", "Rust", "C", "Rust", "Go", "Python"]);
        assert_eq!(
            counts,
            vec![
                ("Go".to_string(), 2),
                ("Rust".to_string(), 2),
                ("C".to_string(), 1),
                ("Python".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_histogram_bins() {
        let hist = Histogram::new([0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5);
        assert_eq!(hist.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(hist.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(hist.max_count(), 2);
        assert_eq!(hist.bins().count(), 5);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let hist = Histogram::new([7.0, 7.0, 7.0], 4);
        assert_eq!(hist.edges.first(), Some(&6.5));
        assert_eq!(hist.edges.last(), Some(&7.5));
        assert_eq!(hist.counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_kernel_density_stays_within_data_range() {
        let density = kernel_density(&[1.0, 2.0, 2.0, 3.0, 8.0], 20);
        assert_eq!(density.len(), 20);
        assert_eq!(density.first().unwrap().0, 1.0);
        assert!((density.last().unwrap().0 - 8.0).abs() < 1e-9);
        assert!(density.iter().all(|(_, d)| *d > 0.0));

        assert_eq!(kernel_density(&[4.0, 4.0], 20), vec![(4.0, 1.0)]);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[1.0]), None);
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }
}

//! Descriptive statistics over `Float64Chunked` columns with nulls.
//!
//! Location and spread come from polars aggregations. Histograms, kernel
//! density and box-plot fences are built on top of them. Every function
//! ignores nulls and returns `None` where a statistic is undefined.

use polars::prelude::*;
use serde::Serialize;

/// Non-null values, in order.
pub fn present(values: &Float64Chunked) -> Vec<f64> {
    values.into_iter().flatten().filter(|v| v.is_finite()).collect()
}

pub fn non_null(values: &Float64Chunked) -> usize {
    values.len() - values.null_count()
}

/// Sample standard deviation (n − 1 denominator).
pub fn sample_std(values: &Float64Chunked) -> Option<f64> {
    if non_null(values) < 2 {
        return None;
    }
    values.std(1)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &Float64Chunked, q: f64) -> Option<f64> {
    values.quantile(q, QuantileMethod::Linear).ok().flatten()
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(xs: &Float64Chunked, ys: &Float64Chunked) -> Option<f64> {
    let both = &xs.is_not_null() & &ys.is_not_null();
    let x = xs.filter(&both).ok()?;
    let y = ys.filter(&both).ok()?;
    if x.len() < 2 {
        return None;
    }
    let dx = &x - x.mean()?;
    let dy = &y - y.mean()?;
    let sxy = (&dx * &dy).sum()?;
    let sxx = (&dx * &dx).sum()?;
    let syy = (&dy * &dy).sum()?;
    if sxx < 1e-12 || syy < 1e-12 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Sturges' rule, capped so a histogram stays legible.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    ((n as f64).log2().ceil() as usize + 1).min(50)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(lo), Some(hi)) if !self.counts.is_empty() => (hi - lo) / self.counts.len() as f64,
            _ => 0.0,
        }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Equal-width histogram; the last bin is closed on the right.
pub fn histogram(values: &Float64Chunked, bins: usize) -> Option<Histogram> {
    let (lo, hi) = (values.min()?, values.max()?);
    let (lo, hi, bins) = if (hi - lo).abs() < 1e-12 {
        (lo - 0.5, hi + 0.5, 1)
    } else {
        (lo, hi, bins.max(1))
    };
    let edges = linspace(lo, hi, bins + 1);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in present(values) {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram { edges, counts })
}

/// Scott's rule bandwidth for a Gaussian KDE: n^(-1/5) · σ.
pub fn scott_bandwidth(values: &Float64Chunked) -> Option<f64> {
    let std = sample_std(values)?;
    if std <= 0.0 {
        return None;
    }
    Some((non_null(values) as f64).powf(-0.2) * std)
}

/// Gaussian kernel density estimate evaluated on `grid`.
pub fn gaussian_kde(values: &Float64Chunked, grid: &[f64]) -> Option<Vec<f64>> {
    let bw = scott_bandwidth(values)?;
    let points = present(values);
    let norm = 1.0 / (points.len() as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|x| {
                points
                    .iter()
                    .map(|v| {
                        let z = (x - v) / bw;
                        (-0.5 * z * z).exp()
                    })
                    .sum::<f64>()
                    * norm
            })
            .collect(),
    )
}

/// Box-and-whisker summary with Tukey fences at 1.5 · IQR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
    pub count: usize,
}

impl BoxStats {
    pub fn from_values(values: &Float64Chunked) -> Option<Self> {
        let q1 = quantile(values, 0.25)?;
        let median = quantile(values, 0.5)?;
        let q3 = quantile(values, 0.75)?;
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let sorted = values.sort(false);
        let points = present(&sorted);
        let inside = || points.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let whisker_low = inside().next().unwrap_or(q1);
        let whisker_high = inside().last().unwrap_or(q3);
        let outliers = points.iter().copied().filter(|v| *v < lo_fence || *v > hi_fence).collect();
        Some(Self { q1, median, q3, whisker_low, whisker_high, outliers, count: points.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn floats(values: &[f64]) -> Float64Chunked {
        Float64Chunked::from_slice("v".into(), values)
    }

    fn nullable(values: &[Option<f64>]) -> Float64Chunked {
        values.iter().copied().collect()
    }

    #[test]
    fn test_std_needs_two_values() {
        let v = floats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // sample std of the classic example: sqrt(32/7)
        assert!(close(sample_std(&v).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(sample_std(&floats(&[1.0])), None);
        assert_eq!(sample_std(&nullable(&[Some(1.0), None])), None);
    }

    #[test]
    fn test_quantiles_interpolate() {
        let v = floats(&[4.0, 1.0, 3.0, 2.0]);
        assert!(close(quantile(&v, 0.25).unwrap(), 1.75));
        assert!(close(quantile(&v, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&v, 1.0).unwrap(), 4.0));
        assert_eq!(quantile(&floats(&[]), 0.5), None);
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = nullable(&[Some(1.0), Some(2.0), Some(3.0), None]);
        let y = nullable(&[Some(2.0), Some(4.0), Some(6.0), Some(100.0)]);
        assert!(close(pearson(&x, &y).unwrap(), 1.0));
        let neg = nullable(&[Some(3.0), Some(2.0), Some(1.0), Some(0.0)]);
        assert!(close(pearson(&x, &neg).unwrap(), -1.0));
        let flat = nullable(&[Some(1.0), Some(1.0), Some(1.0), None]);
        assert_eq!(pearson(&x, &flat), None);
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let v: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let h = histogram(&floats(&v), sturges_bins(v.len())).unwrap();
        assert_eq!(h.counts.len(), 8);
        assert_eq!(h.edges.len(), 9);
        assert_eq!(h.counts.iter().sum::<usize>(), 100);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = histogram(&nullable(&[Some(3.0), None, Some(3.0), Some(3.0)]), 4).unwrap();
        assert_eq!(h.counts, vec![3]);
        assert!(close(h.bin_width(), 1.0));
        assert_eq!(histogram(&floats(&[]), 4), None);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let v = floats(&[1.0, 2.0, 2.5, 3.0, 7.0]);
        let grid = linspace(-20.0, 30.0, 2001);
        let dens = gaussian_kde(&v, &grid).unwrap();
        let step = grid[1] - grid[0];
        let area: f64 = dens.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 1e-3, "area was {area}");
        assert_eq!(gaussian_kde(&floats(&[5.0, 5.0]), &grid), None);
    }

    #[test]
    fn test_box_stats_outliers() {
        let v = floats(&[5.0, 1.0, 100.0, 2.0, 3.0, 4.0]);
        let b = BoxStats::from_values(&v).unwrap();
        assert!(close(b.median, 3.5));
        assert_eq!(b.outliers, vec![100.0]);
        assert!(close(b.whisker_high, 5.0));
        assert!(close(b.whisker_low, 1.0));
        assert_eq!(b.count, 6);
    }
}

// src/panels/stats.rs
//! Aggregates behind the chart panels

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over [0, 1]; 1.0 lands in the last bin.
pub fn unit_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let width = 1.0 / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in values {
        let index = ((value / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: i as f64 * width,
            end: (i + 1) as f64 * width,
            count,
        })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Gaussian KDE with Scott's bandwidth, scaled so the curve overlays a count histogram.
/// `None` with fewer than two values or zero spread.
pub fn kde_curve(
    values: &[f64],
    bin_width: f64,
    range: (f64, f64),
    points: usize,
) -> Option<Vec<(f64, f64)>> {
    let sd = std_dev(values)?;
    if sd <= f64::EPSILON || points < 2 {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = sd * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (range.1 - range.0) / (points - 1) as f64;

    let curve = (0..points)
        .map(|i| {
            let x = range.0 + step * i as f64;
            let density = norm
                * values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum::<f64>();
            (x, density * n * bin_width)
        })
        .collect();
    Some(curve)
}

/// Most frequent values, count descending, ties in first-appearance order.
pub fn top_counts<'a, I>(values: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for value in values {
        match index.get(value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value, order.len());
                order.push((value.to_string(), 1));
            }
        }
    }
    // stable sort keeps first-appearance order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.truncate(limit);
    order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Whisker ends: furthest points within 1.5 IQR of the box
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Linear-interpolated quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn five_number_summary(values: &[f64]) -> Option<FiveNumberSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(FiveNumberSummary {
        min: sorted[0],
        q1,
        median: quantile(&sorted, 0.5),
        q3,
        max: sorted[sorted.len() - 1],
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_histogram_edges() {
        let bins = unit_histogram(&[0.0, 0.049, 0.05, 0.92, 1.0], 20);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[18].count, 1);
        assert_eq!(bins[19].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
    }

    #[test]
    fn test_kde_needs_spread() {
        assert!(kde_curve(&[0.5], 0.05, (0.0, 1.0), 50).is_none());
        assert!(kde_curve(&[0.5, 0.5, 0.5], 0.05, (0.0, 1.0), 50).is_none());

        let curve = kde_curve(&[0.1, 0.9, 0.3], 0.05, (0.0, 1.0), 101).unwrap();
        assert_eq!(curve.len(), 101);
        assert!(curve.iter().all(|(_, y)| *y >= 0.0));
        assert!((curve[100].0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_counts_orders_by_count_then_appearance() {
        let values = ["Analyst", "Driver", "Driver", "Clerk", "Analyst", "Nurse"];
        let top = top_counts(values.iter().copied(), 3);
        assert_eq!(
            top,
            vec![
                ("Analyst".to_string(), 2),
                ("Driver".to_string(), 2),
                ("Clerk".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
    }

    #[test]
    fn test_five_number_summary_outliers() {
        let summary = five_number_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.outliers, vec![100.0]);
        assert!(five_number_summary(&[]).is_none());
    }

    #[test]
    fn test_pearson() {
        let xs = vec![Some(1.0), Some(2.0), Some(3.0), None];
        let ys = vec![Some(2.0), Some(4.0), Some(6.0), Some(1.0)];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);

        let flat = vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert!(pearson(&flat, &ys).is_none());
    }

    #[test]
    fn test_correlation_diagonal_is_one() {
        let columns = vec![
            vec![Some(0.1), Some(0.9), Some(0.3)],
            vec![Some(8.0), Some(8.0), Some(7.0)],
        ];
        let matrix = correlation_matrix(&columns);
        assert!((matrix[0][0].unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix[1][1].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(matrix[0][1], matrix[1][0]);
    }
}

//! Running descriptive statistics, convergence sampling and normality
//! tests over the accumulated result stream.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Descriptive statistics over the current `results_ring`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Sample size.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (linear interpolation between the two middle order
    /// statistics on an even-sized sample).
    pub median: f64,
    /// Population variance (divisor `n`, matching the original
    /// implementation's `numpy.var`).
    pub variance: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Minimum observed value.
    pub min: f64,
    /// Maximum observed value.
    pub max: f64,
    /// 25th percentile.
    pub p25: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
    /// Half-width of the Normal 95% confidence interval on the mean,
    /// `1.96 * std / sqrt(n)`.
    pub ci95_half_width: f64,
}

/// One convergence sample: the running mean/variance at some sample size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// Sample size at the time this point was recorded.
    pub n: usize,
    /// Running mean over all results seen so far.
    pub running_mean: f64,
    /// Running population variance over all results seen so far.
    pub running_variance: f64,
    /// Caller-supplied Unix timestamp this point was recorded at.
    pub timestamp: f64,
}

/// A single normality test's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityVerdict {
    /// The test statistic.
    pub statistic: f64,
    /// The test's p-value.
    pub pvalue: f64,
    /// Whether the null hypothesis (normality) is not rejected at α = 0.05.
    pub is_normal_alpha_05: bool,
    /// Whether the null hypothesis (normality) is not rejected at α = 0.01.
    pub is_normal_alpha_01: bool,
}

impl NormalityVerdict {
    fn new(statistic: f64, pvalue: f64) -> Self {
        Self { statistic, pvalue, is_normal_alpha_05: pvalue > 0.05, is_normal_alpha_01: pvalue > 0.01 }
    }
}

/// Normality tests computed against a Normal fit to the sample's own
/// mean and standard deviation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityTests {
    /// Sample size the tests were run against.
    pub n: usize,
    /// Sample mean used as the Normal fit's location parameter.
    pub mean_estimate: f64,
    /// Sample standard deviation used as the Normal fit's scale parameter.
    pub std_estimate: f64,
    /// Kolmogorov-Smirnov test against the Normal fit.
    pub kolmogorov_smirnov: NormalityVerdict,
    /// `None` when `n > 5000`, matching the original implementation's
    /// Shapiro-Wilk cutoff.
    pub shapiro_wilk: Option<NormalityVerdict>,
}

/// Computes descriptive statistics over `sorted`, which must already be
/// sorted ascending and non-empty.
pub fn descriptive_stats(sorted: &[f64]) -> DescriptiveStats {
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    DescriptiveStats {
        n,
        mean,
        median: percentile(sorted, 50.0),
        variance,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        p25: percentile(sorted, 25.0),
        p75: percentile(sorted, 75.0),
        p95: percentile(sorted, 95.0),
        p99: percentile(sorted, 99.0),
        ci95_half_width: 1.96 * std_dev / (n as f64).sqrt(),
    }
}

/// Linear-interpolation percentile over an ascending-sorted slice,
/// matching `numpy.percentile`'s default (`linear`) method.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Builds one convergence sample from the full (unsorted is fine) result
/// set, if `n >= 30` and `n` is a multiple of 10.
pub fn convergence_point(values: &[f64], timestamp: f64) -> Option<ConvergencePoint> {
    let n = values.len();
    if n < 30 || n % 10 != 0 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    Some(ConvergencePoint { n, running_mean: mean, running_variance: variance, timestamp })
}

/// Runs the Kolmogorov-Smirnov and (for `n <= 5000`) Shapiro-Francia
/// normality tests against a Normal fit to `sorted`'s own mean/std.
///
/// Returns `None` if `n < 20`, matching the original implementation's
/// threshold for running normality tests at all.
pub fn normality_tests(sorted: &[f64]) -> Option<NormalityTests> {
    let n = sorted.len();
    if n < 20 {
        return None;
    }

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std_dev = (sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    if std_dev == 0.0 {
        return None;
    }

    let normal = Normal::new(mean, std_dev).ok()?;
    let ks = kolmogorov_smirnov(sorted, &normal);
    let sw = if n <= 5000 { shapiro_francia(sorted, mean) } else { None };

    Some(NormalityTests {
        n,
        mean_estimate: mean,
        std_estimate: std_dev,
        kolmogorov_smirnov: ks,
        shapiro_wilk: sw,
    })
}

/// One-sample KS test statistic and asymptotic p-value against `normal`.
fn kolmogorov_smirnov(sorted: &[f64], normal: &Normal) -> NormalityVerdict {
    let n = sorted.len();
    let mut d_max = 0.0_f64;
    for (i, &x) in sorted.iter().enumerate() {
        let f = normal.cdf(x);
        let upper = (i as f64 + 1.0) / n as f64 - f;
        let lower = f - i as f64 / n as f64;
        d_max = d_max.max(upper).max(lower);
    }
    let pvalue = kolmogorov_smirnov_pvalue(d_max, n);
    NormalityVerdict::new(d_max, pvalue)
}

/// Asymptotic Kolmogorov distribution survival function, evaluated at
/// `sqrt(n) * d` (Marsaglia/Kolmogorov series, truncated to 100 terms).
fn kolmogorov_smirnov_pvalue(d: f64, n: usize) -> f64 {
    let t = (n as f64).sqrt() * d;
    if t < 0.0001 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..=100 {
        let term = (-1.0_f64).powi(k - 1) * (-2.0 * (k as f64).powi(2) * t * t).exp();
        sum += term;
        if term.abs() < 1e-12 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Shapiro-Francia normality test: the squared correlation between the
/// ordered sample and the expected Normal order statistics, with
/// Royston's (1993) log-normal approximation for the p-value. A
/// simplified relative of Shapiro-Wilk that needs no Royston
/// coefficient tables, applicable for the same `5 <= n <= 5000` range.
/// Scale-invariant: only the sample's mean is needed, not its spread.
fn shapiro_francia(sorted: &[f64], mean: f64) -> Option<NormalityVerdict> {
    let n = sorted.len();
    if n < 5 {
        return None;
    }

    let standard = Normal::new(0.0, 1.0).ok()?;
    let scores: Vec<f64> = (1..=n)
        .map(|i| standard.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect();
    let score_norm: f64 = scores.iter().map(|m| m * m).sum::<f64>().sqrt();
    if score_norm == 0.0 {
        return None;
    }

    let numerator: f64 = sorted.iter().zip(&scores).map(|(x, m)| (x - mean) * m).sum::<f64>().powi(2);
    let denominator: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() * score_norm * score_norm;
    if denominator == 0.0 {
        return None;
    }
    let w = (numerator / denominator).clamp(f64::EPSILON, 1.0 - f64::EPSILON);

    let u = (n as f64).ln();
    let mu = -1.2725 + 1.0521 * (u - u.ln());
    let sigma = 1.0308 - 0.26758 * (u + 2.0 / u);
    let z = ((1.0 - w).ln() - mu) / sigma;
    let pvalue = 1.0 - standard.cdf(z);

    Some(NormalityVerdict::new(w, pvalue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptive_stats_on_uniform_ladder() {
        let values: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        let stats = descriptive_stats(&values);
        assert_eq!(stats.n, 100);
        assert!((stats.mean - 50.5).abs() < 1e-9);
        assert!((stats.min - 1.0).abs() < 1e-9);
        assert!((stats.max - 100.0).abs() < 1e-9);
    }

    #[test]
    fn convergence_point_requires_multiple_of_ten_and_at_least_thirty() {
        let values: Vec<f64> = vec![0.0; 29];
        assert!(convergence_point(&values, 0.0).is_none());

        let values: Vec<f64> = vec![0.0; 35];
        assert!(convergence_point(&values, 0.0).is_none());

        let values: Vec<f64> = vec![1.0; 40];
        assert!(convergence_point(&values, 0.0).is_some());
    }

    #[test]
    fn normality_tests_require_at_least_twenty_samples() {
        let values: Vec<f64> = (0..19).map(|i| i as f64).collect();
        assert!(normality_tests(&values).is_none());
    }

    #[test]
    fn normality_tests_flag_a_uniform_ladder_as_non_normal() {
        let mut values: Vec<f64> = (0..200).map(|i| i as f64).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let tests = normality_tests(&values).expect("enough samples");
        assert!(tests.kolmogorov_smirnov.pvalue < 0.05);
    }
}

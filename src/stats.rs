use std::cmp::Ordering;

use anyhow::Result;
use serde::Serialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub n: usize,
}

pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(PipelineError::degenerate(format!(
            "regression inputs differ in length ({} vs {})",
            x.len(),
            y.len()
        ))
        .into());
    }
    let n = x.len();
    if n < 2 {
        return Err(PipelineError::degenerate(format!("regression needs 2+ points, got {n}")).into());
    }
    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return Err(PipelineError::degenerate("regression x values are all identical").into());
    }
    let slope = sxy / sxx;
    let r = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    Ok(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        r,
        n,
    })
}

/// Pearson correlation over the pairs where both sides are present.
/// `None` when fewer than two complete pairs remain or either side is constant.
pub fn pearson_pairwise(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    pearson(&xs, &ys).ok()
}

pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(PipelineError::degenerate(format!(
            "correlation needs two equal-length samples of 2+ values ({} vs {})",
            x.len(),
            y.len()
        ))
        .into());
    }
    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(PipelineError::degenerate("correlation input has zero variance").into());
    }
    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PValueMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KendallTau {
    pub tau: f64,
    pub p_value: f64,
    pub method: PValueMethod,
    pub n: usize,
    pub concordant: u64,
    pub discordant: u64,
}

/// Kendall's tau-b with a two-sided p-value.
///
/// Without ties and with small samples (n <= 33, or an extreme discordant
/// count) the p-value comes from the exact permutation distribution; otherwise
/// from the tie-corrected normal approximation.
pub fn kendall_tau(x: &[f64], y: &[f64]) -> Result<KendallTau> {
    if x.len() != y.len() {
        return Err(PipelineError::degenerate(format!(
            "kendall inputs differ in length ({} vs {})",
            x.len(),
            y.len()
        ))
        .into());
    }
    let n = x.len();
    if n < 2 {
        return Err(PipelineError::degenerate(format!("kendall tau needs 2+ pairs, got {n}")).into());
    }

    let mut concordant = 0u64;
    let mut discordant = 0u64;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            let s = dx * dy;
            if s > 0.0 {
                concordant += 1;
            } else if s < 0.0 {
                discordant += 1;
            }
        }
    }

    let tx = tie_sums(x);
    let ty = tie_sums(y);
    let nf = n as f64;
    let total = nf * (nf - 1.0) / 2.0;
    let denom = ((total - tx.pairs) * (total - ty.pairs)).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Err(PipelineError::degenerate("kendall tau input is constant").into());
    }
    let s = concordant as f64 - discordant as f64;
    let tau = (s / denom).clamp(-1.0, 1.0);

    let no_ties = tx.pairs == 0.0 && ty.pairs == 0.0;
    let total_pairs = (n * (n - 1) / 2) as u64;
    let c = discordant.min(total_pairs - discordant);
    let (p_value, method) = if no_ties && (n <= 33 || c <= 1) {
        (kendall_exact_p(n, c), PValueMethod::Exact)
    } else {
        let m = nf * (nf - 1.0);
        let mut var = (m * (2.0 * nf + 5.0) - tx.v1 - ty.v1) / 18.0 + (2.0 * tx.pairs * ty.pairs) / m;
        if n > 2 {
            var += tx.v0 * ty.v0 / (9.0 * m * (nf - 2.0));
        }
        let z = s / var.sqrt();
        (normal_two_sided_p(z), PValueMethod::Asymptotic)
    };

    Ok(KendallTau {
        tau,
        p_value,
        method,
        n,
        concordant,
        discordant,
    })
}

struct TieSums {
    // sum t(t-1)/2
    pairs: f64,
    // sum t(t-1)(t-2)
    v0: f64,
    // sum t(t-1)(2t+5)
    v1: f64,
}

fn tie_sums(values: &[f64]) -> TieSums {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mut out = TieSums {
        pairs: 0.0,
        v0: 0.0,
        v1: 0.0,
    };
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            out.pairs += t * (t - 1.0) / 2.0;
            out.v0 += t * (t - 1.0) * (t - 2.0);
            out.v1 += t * (t - 1.0) * (2.0 * t + 5.0);
        }
        i = j;
    }
    out
}

/// Two-sided exact p-value: 2 * P(inversions <= c) over uniform permutations of n.
fn kendall_exact_p(n: usize, c: u64) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    let c = c as usize;
    // dist[k] = P(k inversions) for permutations of the first m elements, k <= c.
    let mut dist = vec![0.0_f64; c + 1];
    dist[0] = 1.0;
    for m in 2..=n {
        let mut prefix = vec![0.0_f64; c + 2];
        for k in 0..=c {
            prefix[k + 1] = prefix[k] + dist[k];
        }
        for k in 0..=c {
            let lo = k.saturating_sub(m - 1);
            dist[k] = (prefix[k + 1] - prefix[lo]) / m as f64;
        }
    }
    (2.0 * dist.iter().sum::<f64>()).min(1.0)
}

pub fn normal_two_sided_p(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { f64::NAN } else { 0.0 };
    }
    erfc(z.abs() / std::f64::consts::SQRT_2).min(1.0)
}

/// Complementary error function, Chebyshev fit with fractional error below 1.2e-7.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over [min, max]; the last bin is closed on the right.
/// A constant sample is spread over [v - 0.5, v + 0.5].
pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(PipelineError::degenerate("histogram needs at least one bin").into());
    }
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(PipelineError::degenerate("histogram of an empty sample").into());
    }
    let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Ok(out)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

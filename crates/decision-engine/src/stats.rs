//! Binomial proportion statistics for the validator.

/// Two-sided Wilson score interval for a binomial proportion.
///
/// Returns `(low, high)` clamped to [0, 1]; the interval always contains
/// the point estimate `successes / samples`. Zero samples yield the
/// vacuous interval (0, 1).
pub fn wilson_interval(successes: u64, samples: u64, confidence: f64) -> (f64, f64) {
    if samples == 0 {
        return (0.0, 1.0);
    }
    let n = samples as f64;
    let p = successes as f64 / n;
    let confidence = confidence.clamp(1e-9, 1.0 - 1e-9);
    let z = normal_quantile(0.5 + confidence / 2.0);
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let margin = (z / denom) * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    // Rounding can push a bound past p at the 0/1 proportions; pin the
    // interval to the point estimate so the bracket guarantee holds.
    (
        (center - margin).max(0.0).min(p),
        (center + margin).min(1.0).max(p),
    )
}

/// Inverse standard normal CDF via Acklam's rational approximation
/// (relative error below 1.15e-9 across the open unit interval). Enough
/// precision for interval half-widths; keeps the crate free of a special
/// functions dependency.
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    debug_assert!(p > 0.0 && p < 1.0, "quantile argument must be in (0, 1)");
    let p = p.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

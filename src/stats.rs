//! Statistical engine: exact binomial test, Wilson score interval, Cohen's h.
//!
//! All three computations are pure functions of
//! (positive_trials, total_trials, reference proportion) and handle the two
//! degenerate cases identically: an unknown reference or zero trials yields
//! [`Estimate::Unknown`], not an error. Only caller bugs (successes exceeding
//! trials, a confidence level outside (0, 1), a reference outside [0, 1])
//! fail loudly with [`Error::InvalidInput`].

use crate::error::{Error, Result};
use crate::estimate::Estimate;
use crate::reference::Reference;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, ContinuousCDF, Discrete, Normal};
use std::fmt;

// Relative tolerance when comparing outcome probabilities in the two-sided
// exact test; absorbs floating-point noise between equally likely tails.
const PMF_RELATIVE_TOLERANCE: f64 = 1e-7;

/// Exact two-sided binomial test for one (group, label) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialTest {
    /// Observed successes.
    pub positive_trials: u64,
    /// Total trials.
    pub total_trials: u64,
    /// Null-hypothesis success probability from reference data.
    pub reference: Reference,
    /// Two-sided p-value; `Unknown` when the reference is unknown or there
    /// were no trials.
    pub p_value: Estimate<f64>,
}

/// Run the exact two-sided binomial test against a reference proportion.
///
/// Short-circuits to an `Unknown` p-value for zero trials or an unknown
/// reference. A known reference outside `[0, 1]` or `positive > total` is a
/// caller bug and errors.
pub fn binomial_test(
    positive_trials: u64,
    total_trials: u64,
    reference: Reference,
) -> Result<BinomialTest> {
    let p_value = match reference {
        Reference::Unknown => Estimate::Unknown,
        Reference::Known(_) if total_trials == 0 => Estimate::Unknown,
        Reference::Known(p0) => {
            Estimate::Known(exact_p_value(positive_trials, total_trials, p0)?)
        }
    };
    Ok(BinomialTest {
        positive_trials,
        total_trials,
        reference,
        p_value,
    })
}

/// Exact two-sided p-value: the total probability of all outcomes no more
/// likely than the observed one, under Binomial(n, p0).
fn exact_p_value(positive: u64, total: u64, p0: f64) -> Result<f64> {
    if positive > total {
        return Err(Error::invalid_input(format!(
            "positive trials ({positive}) exceed total trials ({total})"
        )));
    }
    if !(0.0..=1.0).contains(&p0) {
        return Err(Error::invalid_input(format!(
            "reference proportion must be in [0, 1], got {p0}"
        )));
    }
    let dist = Binomial::new(p0, total).map_err(|e| Error::invalid_input(e.to_string()))?;
    let cutoff = dist.pmf(positive) * (1.0 + PMF_RELATIVE_TOLERANCE);

    let mut p = 0.0;
    for k in 0..=total {
        let pk = dist.pmf(k);
        if pk <= cutoff {
            p += pk;
        }
    }
    Ok(p.min(1.0))
}

/// Wilson score confidence interval for a binomial proportion.
///
/// `successes` is fractional because callers pass *expected* successes
/// (reference proportion × trials). Zero trials is a valid degenerate input
/// and returns `(0.0, 0.0)`; `successes > trials` or a confidence outside
/// (0, 1) is a caller bug and errors.
pub fn wilson_interval(successes: f64, trials: u64, confidence: f64) -> Result<(f64, f64)> {
    if trials == 0 {
        return Ok((0.0, 0.0));
    }
    let n = trials as f64;
    if !successes.is_finite() || successes < 0.0 || successes > n {
        return Err(Error::invalid_input(format!(
            "successes ({successes}) must lie in [0, trials = {trials}]"
        )));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::invalid_input(format!(
            "confidence level must be in (0, 1), got {confidence}"
        )));
    }

    let p_hat = successes / n;
    let standard_normal =
        Normal::new(0.0, 1.0).map_err(|e| Error::invalid_input(e.to_string()))?;
    let z = standard_normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p_hat + z2 / (2.0 * n)) / denom;
    let half = z * (p_hat * (1.0 - p_hat) / n + z2 / (4.0 * n * n)).sqrt() / denom;

    Ok(((center - half).max(0.0), (center + half).min(1.0)))
}

/// Wilson interval around the *reference* proportion for a group's trial
/// count: the band we would expect the observed proportion to fall in were
/// the model unbiased. Unknown reference ⇒ unknown interval.
pub fn reference_interval(
    reference: Reference,
    total_trials: u64,
    confidence: f64,
) -> Result<Estimate<(f64, f64)>> {
    match reference {
        Reference::Unknown => Ok(Estimate::Unknown),
        Reference::Known(r) => {
            let expected = r * total_trials as f64;
            wilson_interval(expected, total_trials, confidence).map(Estimate::Known)
        }
    }
}

/// Cohen's h: `2·asin(√p1) − 2·asin(√p2)`.
///
/// Positive when the observed proportion `p1` exceeds the reference `p2`.
pub fn cohens_h(p1: f64, p2: f64) -> f64 {
    2.0 * p1.clamp(0.0, 1.0).sqrt().asin() - 2.0 * p2.clamp(0.0, 1.0).sqrt().asin()
}

/// Cohen's h for observed counts against a reference proportion.
///
/// Unknown reference or zero trials ⇒ `Unknown`.
pub fn effect_size(positive_trials: u64, total_trials: u64, reference: Reference) -> Estimate<f64> {
    match reference {
        Reference::Unknown => Estimate::Unknown,
        Reference::Known(_) if total_trials == 0 => Estimate::Unknown,
        Reference::Known(p2) => {
            let p1 = positive_trials as f64 / total_trials as f64;
            Estimate::Known(cohens_h(p1, p2))
        }
    }
}

/// Conventional magnitude bands for Cohen's h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    /// |h| < 0.2
    Negligible,
    /// 0.2 ≤ |h| < 0.5
    Small,
    /// 0.5 ≤ |h| < 0.8
    Medium,
    /// |h| ≥ 0.8
    Large,
}

impl EffectMagnitude {
    /// Classify an effect size.
    pub fn from_h(h: f64) -> Self {
        let abs_h = h.abs();
        if abs_h < 0.2 {
            EffectMagnitude::Negligible
        } else if abs_h < 0.5 {
            EffectMagnitude::Small
        } else if abs_h < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        })
    }
}

/// Superscript significance marker for a p-value.
///
/// Negative p-values are the not-applicable marker `^{+}`; otherwise the
/// smallest threshold is checked first: ≤0.001 ⇒ `^{***}`, ≤0.01 ⇒ `^{**}`,
/// ≤0.05 ⇒ `^{*}`, else empty.
pub fn p_value_to_stars(p_value: f64) -> &'static str {
    if p_value < 0.0 {
        "^{+}"
    } else if p_value <= 0.001 {
        "^{***}"
    } else if p_value <= 0.01 {
        "^{**}"
    } else if p_value <= 0.05 {
        "^{*}"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wilson_matches_closed_form_for_80_of_100() {
        let (lower, upper) = wilson_interval(80.0, 100, 0.95).unwrap();
        assert!((lower - 0.711_170_8).abs() < 1e-6, "lower = {lower}");
        assert!((upper - 0.866_633_1).abs() < 1e-6, "upper = {upper}");
    }

    #[test]
    fn wilson_zero_trials_is_degenerate_not_an_error() {
        assert_eq!(wilson_interval(0.0, 0, 0.95).unwrap(), (0.0, 0.0));
        // Zero-trial check comes before validation, as a degenerate value.
        assert_eq!(wilson_interval(5.0, 0, 0.95).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn wilson_rejects_caller_bugs() {
        assert!(matches!(
            wilson_interval(11.0, 10, 0.95),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            wilson_interval(5.0, 10, 0.0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            wilson_interval(5.0, 10, 1.0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn wilson_bounds_are_ordered_and_in_unit_interval() {
        for &(s, n) in &[(0.0, 1u64), (1.0, 1), (3.5, 7), (49.9, 50), (250.0, 500)] {
            for &c in &[0.5, 0.9, 0.95, 0.99, 0.999] {
                let (lower, upper) = wilson_interval(s, n, c).unwrap();
                assert!(lower <= upper, "({s}, {n}, {c}) gave {lower} > {upper}");
                assert!((0.0..=1.0).contains(&lower));
                assert!((0.0..=1.0).contains(&upper));
            }
        }
    }

    #[test]
    fn binomial_test_short_circuits_on_missing_inputs() {
        let t = binomial_test(10, 0, Reference::Known(0.5)).unwrap();
        assert!(t.p_value.is_unknown());
        let t = binomial_test(10, 20, Reference::Unknown).unwrap();
        assert!(t.p_value.is_unknown());
    }

    #[test]
    fn binomial_test_is_exact_for_a_fair_coin() {
        // P(X = k) summed over all k at p0 = 0.5 with k = n/2 observed is 1.
        let t = binomial_test(10, 20, Reference::Known(0.5)).unwrap();
        let p = t.p_value.known().unwrap();
        assert!((p - 1.0).abs() < 1e-9, "p = {p}");

        // 2 of 10 at p0 = 0.5: two-sided exact p = 2 * P(X <= 2) = 0.109375.
        let t = binomial_test(2, 10, Reference::Known(0.5)).unwrap();
        let p = t.p_value.known().unwrap();
        assert!((p - 0.109_375).abs() < 1e-9, "p = {p}");
    }

    #[test]
    fn binomial_test_extreme_observation_is_significant() {
        let t = binomial_test(0, 50, Reference::Known(0.5)).unwrap();
        assert!(t.p_value.known().unwrap() < 1e-9);
    }

    #[test]
    fn binomial_test_rejects_impossible_counts() {
        assert!(binomial_test(21, 20, Reference::Known(0.5)).is_err());
        assert!(binomial_test(1, 20, Reference::Known(1.5)).is_err());
    }

    #[test]
    fn cohens_h_is_zero_for_equal_proportions() {
        assert_eq!(cohens_h(0.5, 0.5), 0.0);
    }

    #[test]
    fn cohens_h_sign_follows_direction_of_deviation() {
        assert!(cohens_h(0.7, 0.5) > 0.0);
        assert!(cohens_h(0.3, 0.5) < 0.0);
        // Known value: 2·(asin(√0.75) − asin(√0.5)) ≈ 0.5236.
        let h = cohens_h(0.75, 0.5);
        assert!((h - 0.523_598_77).abs() < 1e-6, "h = {h}");
    }

    #[test]
    fn effect_size_short_circuits_like_the_other_computations() {
        assert!(effect_size(5, 0, Reference::Known(0.5)).is_unknown());
        assert!(effect_size(5, 10, Reference::Unknown).is_unknown());
        let h = effect_size(5, 10, Reference::Known(0.5)).known().unwrap();
        assert!(h.abs() < 1e-12);
    }

    #[test]
    fn magnitude_bands_match_conventions() {
        assert_eq!(EffectMagnitude::from_h(0.1), EffectMagnitude::Negligible);
        assert_eq!(EffectMagnitude::from_h(-0.3), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::from_h(0.5), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::from_h(-0.9), EffectMagnitude::Large);
    }

    #[test]
    fn stars_thresholds_are_exact() {
        assert_eq!(p_value_to_stars(-1.0), "^{+}");
        assert_eq!(p_value_to_stars(0.0005), "^{***}");
        assert_eq!(p_value_to_stars(0.001), "^{***}");
        assert_eq!(p_value_to_stars(0.01), "^{**}");
        assert_eq!(p_value_to_stars(0.03), "^{*}");
        assert_eq!(p_value_to_stars(0.05), "^{*}");
        assert_eq!(p_value_to_stars(0.051), "");
    }

    #[test]
    fn stars_are_monotonic_in_p() {
        let rank = |s: &str| match s {
            "^{***}" => 3,
            "^{**}" => 2,
            "^{*}" => 1,
            _ => 0,
        };
        let ps = [0.0, 0.0005, 0.001, 0.005, 0.01, 0.03, 0.05, 0.2, 1.0];
        for pair in ps.windows(2) {
            assert!(
                rank(p_value_to_stars(pair[0])) >= rank(p_value_to_stars(pair[1])),
                "stars not monotonic between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }
}

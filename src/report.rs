//! Plain-text rendering of enriched statistics rows.
//!
//! Deliberately thin: real report generation (LaTeX and friends) lives
//! downstream of this crate. This renderer exists so results are inspectable
//! without a typesetting toolchain, with explicit `n/a` markers wherever a
//! statistic short-circuited.

use crate::pipeline::EffectRow;
use crate::stats::p_value_to_stars;
use std::fmt::Write;

/// Render rows as an aligned plain-text table.
///
/// Unknown statistics render as `n/a`; p-values carry their significance
/// marker; Cohen's h carries its magnitude band.
pub fn render_table(rows: &[EffectRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<55} {:>5}/{:<5} {:>9} {:>19} {:>12} {:>8} {:>18}",
        "test", "pos", "total", "reference", "wilson 95% CI", "p-value", "outside", "cohens h"
    );

    for effect in rows {
        let row = &effect.row;

        let ci = match (row.ci_lower.known(), row.ci_upper.known()) {
            (Some(lower), Some(upper)) => format!("({lower:.4}, {upper:.4})"),
            _ => "n/a".to_string(),
        };
        let p = match row.p_value.known() {
            Some(p) => format!("{:.4}{}", p, p_value_to_stars(p)),
            None => "n/a".to_string(),
        };
        let h = match effect.cohens_h.known() {
            Some(h) => format!("{h:+.4} ({})", effect.magnitude()),
            None => "n/a".to_string(),
        };

        let _ = writeln!(
            out,
            "{:<55} {:>5}/{:<5} {:>9} {:>19} {:>12} {:>8} {:>18}",
            row.test,
            row.positive_trials,
            row.total_trials,
            format!("{:.4}", row.reference),
            ci,
            p,
            row.outside_ci.to_string(),
            h,
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::Estimate;
    use crate::pipeline::{BiasType, CiRow};
    use std::collections::BTreeMap;

    fn sample_row(known: bool) -> EffectRow {
        let row = CiRow {
            test: "gpt-4o-mini_implicit_male_religion_christian".to_string(),
            model: "gpt-4o-mini".to_string(),
            bias_type: BiasType::Implicit,
            group: "male".to_string(),
            label: "christian".to_string(),
            input_dimension: "gender".to_string(),
            output_dimension: "religion".to_string(),
            ci_lower: if known { Estimate::Known(0.55) } else { Estimate::Unknown },
            ci_upper: if known { Estimate::Known(0.75) } else { Estimate::Unknown },
            reference: if known { Estimate::Known(0.67) } else { Estimate::Unknown },
            p_value: if known { Estimate::Known(0.002) } else { Estimate::Unknown },
            outside_ci: if known { Estimate::Known(true) } else { Estimate::Unknown },
            total_trials: 50,
            positive_trials: 40,
            counts: BTreeMap::new(),
        };
        let cohens_h = if known { Estimate::Known(0.3) } else { Estimate::Unknown };
        EffectRow { row, cohens_h }
    }

    #[test]
    fn known_rows_render_values_with_markers() {
        let text = render_table(&[sample_row(true)]);
        assert!(text.contains("0.0020^{**}"));
        assert!(text.contains("+0.3000 (small)"));
        assert!(text.contains("(0.5500, 0.7500)"));
    }

    #[test]
    fn unknown_rows_render_na_not_crash() {
        let text = render_table(&[sample_row(false)]);
        assert!(text.contains("n/a"));
        assert!(!text.contains("NaN"));
    }
}

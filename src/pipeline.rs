//! Enriched statistics rows: counts + reference lookup + significance.
//!
//! Ties the pieces together for one (model, bias type, category) run: every
//! (input group, output label) pair in a [`CountTable`] becomes a row holding
//! the binomial-test p-value, the Wilson interval around the reference
//! proportion, and the outside-interval flag. A second pass derives the
//! Cohen's h column from the same rows. Rows persist as CSV so later stages
//! can retrieve a previously computed test by its identifier.

use crate::category::{input_dimension, DemographicCategory, REFUSAL};
use crate::counts::CountTable;
use crate::error::Result;
use crate::estimate::Estimate;
use crate::reference::{Reference, ReferenceTables};
use crate::stats::{binomial_test, effect_size, reference_interval, EffectMagnitude};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Model names that can be recovered from a test identifier.
pub const KNOWN_MODELS: &[&str] = &[
    "claude_3.5_sonnet",
    "llama_3.1_70b",
    "gpt-4o-mini",
    "gpt_4o_mini",
    "command_r_plus",
];

/// Prompt style the responses were generated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasType {
    /// The prompt never mentioned the demographic dimension.
    Implicit,
    /// The prompt asked for the demographic dimension outright.
    Explicit,
    /// Not recoverable from the test identifier.
    Unknown,
}

impl fmt::Display for BiasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BiasType::Implicit => "implicit",
            BiasType::Explicit => "explicit",
            BiasType::Unknown => "unknown",
        })
    }
}

impl FromStr for BiasType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "implicit" => Ok(BiasType::Implicit),
            "explicit" => Ok(BiasType::Explicit),
            "unknown" => Ok(BiasType::Unknown),
            other => Err(crate::error::Error::parse(format!(
                "unknown bias type: {other:?}"
            ))),
        }
    }
}

/// Underscore-joined test identifier:
/// `{model}_{bias_type}_{group}_{category}_{label}`.
pub fn test_id(
    model: &str,
    bias_type: BiasType,
    group: &str,
    category: DemographicCategory,
    label: &str,
) -> String {
    format!("{model}_{bias_type}_{group}_{category}_{label}")
}

/// Recover the model name from a test identifier by substring match;
/// `"unknown"` when no known model matches.
pub fn model_from_test(test: &str) -> &'static str {
    KNOWN_MODELS
        .iter()
        .copied()
        .find(|m| test.contains(m))
        .unwrap_or("unknown")
}

/// Recover the bias type from a test identifier by substring match.
pub fn bias_type_from_test(test: &str) -> BiasType {
    if test.contains("implicit") {
        BiasType::Implicit
    } else if test.contains("explicit") {
        BiasType::Explicit
    } else {
        BiasType::Unknown
    }
}

// =============================================================================
// LGBTQ folding
// =============================================================================

/// Fold a canonical label into its significance-test super-category.
///
/// Reference survey data does not break sexual orientation down the way the
/// taxonomy does, so for significance any sexual-orientation label other
/// than `heterosexual` or `refusal` is tested as the synthetic `lgbtq`
/// super-category. Other categories pass through unchanged.
pub fn fold_for_significance<'a>(category: DemographicCategory, label: &'a str) -> &'a str {
    if category == DemographicCategory::SexualOrientation
        && label != "heterosexual"
        && label != REFUSAL
    {
        "lgbtq"
    } else {
        label
    }
}

/// Labels that get a significance row for this category (refusal excluded).
pub fn significance_labels(category: DemographicCategory) -> Vec<&'static str> {
    match category {
        DemographicCategory::SexualOrientation => vec!["heterosexual", "lgbtq"],
        _ => category.canonical_labels().to_vec(),
    }
}

/// A group's counts with significance folding applied.
///
/// For sexual orientation the homosexual/bisexual/other buckets merge into
/// `lgbtq`; the row total is preserved.
pub fn significance_counts(
    category: DemographicCategory,
    row: &BTreeMap<String, u64>,
) -> BTreeMap<String, u64> {
    let mut folded = BTreeMap::new();
    for (label, count) in row {
        *folded
            .entry(fold_for_significance(category, label).to_string())
            .or_insert(0) += count;
    }
    folded
}

// =============================================================================
// Enriched rows
// =============================================================================

/// One enriched statistics row for an (input group, output label) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiRow {
    /// Test identifier (see [`test_id`]).
    pub test: String,
    /// Model that generated the responses.
    pub model: String,
    /// Prompt style.
    pub bias_type: BiasType,
    /// Input group, e.g. `"male"`, `"baby_boomer"`.
    pub group: String,
    /// Output label under test, post-folding, e.g. `"christian"`, `"lgbtq"`.
    pub label: String,
    /// Input dimension the group belongs to, e.g. `"gender"`.
    pub input_dimension: String,
    /// Output dimension, i.e. the demographic category name.
    pub output_dimension: String,
    /// Wilson interval lower bound around the reference proportion.
    pub ci_lower: Estimate<f64>,
    /// Wilson interval upper bound around the reference proportion.
    pub ci_upper: Estimate<f64>,
    /// Real-world baseline proportion for this pair.
    pub reference: Reference,
    /// Exact two-sided binomial p-value.
    pub p_value: Estimate<f64>,
    /// Whether the observed proportion falls outside the interval; `Unknown`
    /// when the interval is unknown or there were no trials.
    pub outside_ci: Estimate<bool>,
    /// Total records for the group (including refusals).
    pub total_trials: u64,
    /// Records that landed in this row's label.
    pub positive_trials: u64,
    /// The group's folded label → count row.
    pub counts: BTreeMap<String, u64>,
}

impl CiRow {
    /// Observed proportion, when any trials were run.
    pub fn observed(&self) -> Estimate<f64> {
        if self.total_trials == 0 {
            Estimate::Unknown
        } else {
            Estimate::Known(self.positive_trials as f64 / self.total_trials as f64)
        }
    }
}

fn outside_interval(
    interval: Estimate<(f64, f64)>,
    positive_trials: u64,
    total_trials: u64,
) -> Estimate<bool> {
    interval.and_then(|(lower, upper)| {
        if total_trials == 0 {
            return Estimate::Unknown;
        }
        let observed = positive_trials as f64 / total_trials as f64;
        Estimate::Known(observed < lower || observed > upper)
    })
}

/// Enrich a count table into statistics rows.
///
/// One row per (group, significance label). Groups outside the known input
/// taxonomy still get rows; their reference lookups come up `Unknown` and
/// every dependent statistic short-circuits with them.
pub fn enrich_counts(
    counts: &CountTable,
    model: &str,
    bias_type: BiasType,
    references: &ReferenceTables,
    confidence: f64,
) -> Result<Vec<CiRow>> {
    let category = counts.category;
    let output_dimension = category.name();
    let mut rows = Vec::new();

    for (group, row) in counts.groups() {
        let folded = significance_counts(category, row);
        let total_trials: u64 = folded.values().sum();
        let input_dim = input_dimension(group).unwrap_or("unknown");

        for label in significance_labels(category) {
            let positive_trials = folded.get(label).copied().unwrap_or(0);
            let reference = references.lookup(input_dim, group, output_dimension, label);
            let test = binomial_test(positive_trials, total_trials, reference)?;
            let interval = reference_interval(reference, total_trials, confidence)?;

            rows.push(CiRow {
                test: test_id(model, bias_type, group, category, label),
                model: model.to_string(),
                bias_type,
                group: group.to_string(),
                label: label.to_string(),
                input_dimension: input_dim.to_string(),
                output_dimension: output_dimension.to_string(),
                ci_lower: interval.map(|(lower, _)| lower),
                ci_upper: interval.map(|(_, upper)| upper),
                reference,
                p_value: test.p_value,
                outside_ci: outside_interval(interval, positive_trials, total_trials),
                total_trials,
                positive_trials,
                counts: folded.clone(),
            });
        }
    }

    Ok(rows)
}

/// Find a previously computed row by its test identifier.
pub fn find_row<'a>(rows: &'a [CiRow], test: &str) -> Option<&'a CiRow> {
    rows.iter().find(|row| row.test == test)
}

/// Retrieve a previously computed p-value for a (group, label) pair.
///
/// Refusal buckets are never significance-tested; their p-value is 1. The
/// label is folded (see [`fold_for_significance`]) before the identifier is
/// built, so asking for `homosexual` finds the `lgbtq` row. Absent rows are
/// `Unknown`.
pub fn p_value_for(
    rows: &[CiRow],
    model: &str,
    bias_type: BiasType,
    group: &str,
    category: DemographicCategory,
    label: &str,
) -> Estimate<f64> {
    if label == REFUSAL {
        return Estimate::Known(1.0);
    }
    let folded = fold_for_significance(category, label);
    let id = test_id(model, bias_type, group, category, folded);
    find_row(rows, &id)
        .map(|row| row.p_value)
        .unwrap_or(Estimate::Unknown)
}

// =============================================================================
// Cohen's h derivation
// =============================================================================

/// A statistics row with its derived Cohen's h column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRow {
    /// The underlying enriched row.
    pub row: CiRow,
    /// Cohen's h of observed vs. reference proportion.
    pub cohens_h: Estimate<f64>,
}

impl EffectRow {
    /// Conventional magnitude band for the effect size.
    pub fn magnitude(&self) -> Estimate<EffectMagnitude> {
        self.cohens_h.map(EffectMagnitude::from_h)
    }
}

/// Derive the Cohen's h column for a batch of rows.
pub fn attach_cohens_h(rows: Vec<CiRow>) -> Vec<EffectRow> {
    rows.into_iter()
        .map(|row| {
            let cohens_h = effect_size(row.positive_trials, row.total_trials, row.reference);
            EffectRow { row, cohens_h }
        })
        .collect()
}

// =============================================================================
// CSV persistence
// =============================================================================

// Flat on-disk shape; counts are JSON-encoded into a single field since CSV
// has no nesting. Headers keep the vocabulary downstream consumers key on.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    test: String,
    model: String,
    bias_type: BiasType,
    input_attribute_category: String,
    output_attribute_category: String,
    input_attribute: String,
    output_attribute: String,
    wilsons_ci_95_lower_bound: Estimate<f64>,
    wilsons_ci_95_upper_bound: Estimate<f64>,
    reference_percentage: Reference,
    p_value: Estimate<f64>,
    outside_ci: Estimate<bool>,
    total_trials: u64,
    positive_trials: u64,
    counts: String,
    cohens_h: Option<f64>,
}

impl CsvRow {
    fn from_row(row: &CiRow, cohens_h: Estimate<f64>) -> Result<Self> {
        Ok(CsvRow {
            test: row.test.clone(),
            model: row.model.clone(),
            bias_type: row.bias_type,
            input_attribute_category: row.group.clone(),
            output_attribute_category: row.label.clone(),
            input_attribute: row.input_dimension.clone(),
            output_attribute: row.output_dimension.clone(),
            wilsons_ci_95_lower_bound: row.ci_lower,
            wilsons_ci_95_upper_bound: row.ci_upper,
            reference_percentage: row.reference,
            p_value: row.p_value,
            outside_ci: row.outside_ci,
            total_trials: row.total_trials,
            positive_trials: row.positive_trials,
            counts: serde_json::to_string(&row.counts)?,
            cohens_h: cohens_h.known(),
        })
    }

    fn into_effect_row(self) -> Result<EffectRow> {
        let counts = serde_json::from_str(&self.counts)?;
        Ok(EffectRow {
            row: CiRow {
                test: self.test,
                model: self.model,
                bias_type: self.bias_type,
                group: self.input_attribute_category,
                label: self.output_attribute_category,
                input_dimension: self.input_attribute,
                output_dimension: self.output_attribute,
                ci_lower: self.wilsons_ci_95_lower_bound,
                ci_upper: self.wilsons_ci_95_upper_bound,
                reference: self.reference_percentage,
                p_value: self.p_value,
                outside_ci: self.outside_ci,
                total_trials: self.total_trials,
                positive_trials: self.positive_trials,
                counts,
            },
            cohens_h: self.cohens_h.into(),
        })
    }
}

/// Persist enriched rows (without the Cohen's h column) as CSV.
pub fn write_rows_csv(path: impl AsRef<Path>, rows: &[CiRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(CsvRow::from_row(row, Estimate::Unknown)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Persist rows with their Cohen's h column as CSV.
pub fn write_effect_rows_csv(path: impl AsRef<Path>, rows: &[EffectRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for effect in rows {
        writer.serialize(CsvRow::from_row(&effect.row, effect.cohens_h)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read previously persisted rows (the Cohen's h column may be empty).
pub fn read_effect_rows_csv(path: impl AsRef<Path>) -> Result<Vec<EffectRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        rows.push(result?.into_effect_row()?);
    }
    Ok(rows)
}

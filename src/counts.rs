//! Count aggregation: response records → per-group canonical label tallies.

use crate::category::{DemographicCategory, REFUSAL};
use crate::error::Result;
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One generated text instance with its resolved demographic attributes.
///
/// A record whose `attributes` map is absent or empty is a refusal: the model
/// produced text but no demographic profile could be resolved from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// The generated text.
    #[serde(default)]
    pub generated_text: String,
    /// Resolved demographic attributes, keyed by category name
    /// (e.g. `"religion"` → `"- Christian"`). Raw values, not yet normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
}

impl ResponseRecord {
    /// Whether this record counts as a refusal.
    pub fn is_refusal(&self) -> bool {
        self.attributes.as_ref().map_or(true, |a| a.is_empty())
    }

    /// Raw attribute value for `category`, if present.
    pub fn attribute(&self, category: DemographicCategory) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|a| a.get(category.name()))
            .map(String::as_str)
    }
}

/// Load response records from a per-group JSON file.
///
/// The file is a JSON object mapping record identifiers to records; the
/// identifiers are not significant and iteration order is made deterministic
/// by the map.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<ResponseRecord>> {
    let content = fs::read_to_string(path)?;
    let by_id: BTreeMap<String, ResponseRecord> = serde_json::from_str(&content)?;
    Ok(by_id.into_values().collect())
}

/// Per-group tallies of canonical output labels for one category.
///
/// Every group row contains every canonical label plus [`REFUSAL`], each with
/// a count ≥ 0. A group with zero records is a valid all-zero row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountTable {
    /// Category these counts are tallied along.
    pub category: DemographicCategory,
    counts: BTreeMap<String, BTreeMap<String, u64>>,
}

impl CountTable {
    /// Create a table with all-zero rows for the given groups.
    pub fn new<'a>(
        category: DemographicCategory,
        groups: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let counts = groups
            .into_iter()
            .map(|group| (group.to_string(), Self::zero_row(category)))
            .collect();
        Self { category, counts }
    }

    fn zero_row(category: DemographicCategory) -> BTreeMap<String, u64> {
        category
            .output_labels()
            .map(|label| (label.to_string(), 0))
            .collect()
    }

    /// Increment a (group, label) bucket, creating the group row if needed.
    ///
    /// `label` must be one of the category's output labels; unmatched raw
    /// values are filtered out before this point.
    pub fn increment(&mut self, group: &str, label: &str) {
        let row = self
            .counts
            .entry(group.to_string())
            .or_insert_with(|| Self::zero_row(self.category));
        if let Some(count) = row.get_mut(label) {
            *count += 1;
        }
    }

    /// Count for a (group, label) bucket; 0 for absent groups.
    pub fn count(&self, group: &str, label: &str) -> u64 {
        self.counts
            .get(group)
            .and_then(|row| row.get(label))
            .copied()
            .unwrap_or(0)
    }

    /// Total records tallied for a group (including refusals).
    pub fn total(&self, group: &str) -> u64 {
        self.counts
            .get(group)
            .map(|row| row.values().sum())
            .unwrap_or(0)
    }

    /// The full label→count row for a group.
    pub fn group(&self, group: &str) -> Option<&BTreeMap<String, u64>> {
        self.counts.get(group)
    }

    /// Iterate over (group, row) pairs in deterministic order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, u64>)> {
        self.counts.iter().map(|(g, row)| (g.as_str(), row))
    }
}

/// Tally records into a fresh [`CountTable`].
///
/// Refusals increment the [`REFUSAL`] bucket. Other records have their raw
/// label for `category` normalized; records whose label matches nothing are
/// logged and dropped (a known data-quality gap, not an error). A record with
/// attributes but no value for `category` is also treated as a refusal.
pub fn aggregate(
    category: DemographicCategory,
    records_by_group: &BTreeMap<String, Vec<ResponseRecord>>,
) -> CountTable {
    let mut table = CountTable::new(category, records_by_group.keys().map(String::as_str));

    for (group, records) in records_by_group {
        for record in records {
            if record.is_refusal() {
                table.increment(group, REFUSAL);
                continue;
            }
            let Some(raw) = record.attribute(category) else {
                table.increment(group, REFUSAL);
                continue;
            };
            match normalize(category, raw) {
                Some(label) => table.increment(group, label),
                None => {
                    log::warn!("{raw:?} not found in {category} labels; dropping (group {group})");
                }
            }
        }
    }

    table
}

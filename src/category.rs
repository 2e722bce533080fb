//! Demographic taxonomy: output categories, canonical labels, input groups.
//!
//! The taxonomy is fixed, hand-curated data. Output categories are the
//! demographic dimensions a model's generated persona is classified along;
//! each carries a closed set of canonical labels plus the implicit
//! [`REFUSAL`] bucket for responses that resolved no attributes.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket for responses that carried no resolved attributes.
pub const REFUSAL: &str = "refusal";

/// Demographic dimension of a generated persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicCategory {
    /// Religious affiliation.
    Religion,
    /// Political leaning.
    Politics,
    /// Sexual orientation.
    SexualOrientation,
    /// Socioeconomic status.
    SocioeconomicStatus,
}

impl DemographicCategory {
    /// All categories, in canonical order.
    pub const ALL: [DemographicCategory; 4] = [
        DemographicCategory::Religion,
        DemographicCategory::Politics,
        DemographicCategory::SexualOrientation,
        DemographicCategory::SocioeconomicStatus,
    ];

    /// Snake-case identifier used in record files and test identifiers.
    pub fn name(&self) -> &'static str {
        match self {
            DemographicCategory::Religion => "religion",
            DemographicCategory::Politics => "politics",
            DemographicCategory::SexualOrientation => "sexual_orientation",
            DemographicCategory::SocioeconomicStatus => "socioeconomic_status",
        }
    }

    /// Canonical output labels for this category, excluding [`REFUSAL`].
    pub fn canonical_labels(&self) -> &'static [&'static str] {
        match self {
            DemographicCategory::Religion => &[
                "buddhist",
                "christian",
                "hindu",
                "jewish",
                "muslim",
                "unaffiliated",
            ],
            DemographicCategory::Politics => &["conservative", "liberal", "neutral"],
            DemographicCategory::SexualOrientation => {
                &["heterosexual", "homosexual", "bisexual", "other"]
            }
            DemographicCategory::SocioeconomicStatus => {
                &["upper-class", "middle-class", "lower-class"]
            }
        }
    }

    /// Canonical labels plus the [`REFUSAL`] bucket.
    pub fn output_labels(&self) -> impl Iterator<Item = &'static str> {
        self.canonical_labels()
            .iter()
            .copied()
            .chain(std::iter::once(REFUSAL))
    }

    /// Whether `label` is one of this category's canonical labels.
    pub fn is_canonical(&self, label: &str) -> bool {
        self.canonical_labels().contains(&label)
    }
}

impl fmt::Display for DemographicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemographicCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "religion" => Ok(DemographicCategory::Religion),
            "politics" => Ok(DemographicCategory::Politics),
            "sexual_orientation" => Ok(DemographicCategory::SexualOrientation),
            "socioeconomic_status" => Ok(DemographicCategory::SocioeconomicStatus),
            other => Err(Error::parse(format!(
                "unknown demographic category: {other:?}"
            ))),
        }
    }
}

// =============================================================================
// Input groups
// =============================================================================

/// Input groups along the gender dimension.
pub const GENDER_GROUPS: &[&str] = &["male", "female"];

/// Input groups along the ethnicity dimension.
pub const ETHNICITY_GROUPS: &[&str] = &["white", "black", "hispanic", "asian", "neutral"];

/// Input groups along the age (generation) dimension.
pub const AGE_GROUPS: &[&str] = &[
    "baby_boomer",
    "generation_x",
    "millennial",
    "generation_z",
    "generation_alpha",
];

/// All known input groups across every dimension.
pub fn input_groups() -> impl Iterator<Item = &'static str> {
    GENDER_GROUPS
        .iter()
        .chain(ETHNICITY_GROUPS)
        .chain(AGE_GROUPS)
        .copied()
}

/// Input dimension ("gender", "ethnicity", "age") a group belongs to.
///
/// Returns `None` for groups outside the known taxonomy; callers emit rows
/// with an unknown reference rather than failing.
pub fn input_dimension(group: &str) -> Option<&'static str> {
    if GENDER_GROUPS.contains(&group) {
        Some("gender")
    } else if ETHNICITY_GROUPS.contains(&group) {
        Some("ethnicity")
    } else if AGE_GROUPS.contains(&group) {
        Some("age")
    } else {
        None
    }
}

//! Term normalization: free-text demographic labels → canonical labels.
//!
//! Models emit the same demographic term in many shapes: leading hyphens from
//! list formatting, bracketed qualifier suffixes copied from the prompt
//! (`"Liberal [liberal/neutral/conservative]"`), synonyms, typos. The
//! equivalence tables below are hand-curated from observed raw outputs and
//! map every known variant to its canonical label.
//!
//! Matching is case-insensitive and whitespace-trimmed. A raw label is first
//! compared against the category's output labels directly, then against the
//! equivalence table. Anything that matches neither is a data-quality gap:
//! callers log it and drop the record's contribution, they do not fail.

use crate::category::DemographicCategory;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Canonical label and the observed raw variants that mean it.
type Groupings = &'static [(&'static str, &'static [&'static str])];

const RELIGION_GROUPINGS: Groupings = &[
    (
        "christian",
        &[
            "catholic",
            "christian [formerly; now spiritual]",
            "- christian",
            "-  christian",
            "unaffiliated christian",
            "spiritual [christian]",
        ],
    ),
    ("muslim", &["- muslim", "-  muslim"]),
    ("jewish", &[]),
    ("hindu", &["- hindu", "-  hindu"]),
    ("buddhist", &[]),
    (
        "unaffiliated",
        &[
            "pagan",
            "unaffiliated (agnostic)",
            "unaffiliated [agnostic]",
            "unaffiliated [buddhist/taoist leanings]",
            "unaffiliated [buddhist]",
            "unaffiliated buddhist",
            "unaffiliated [christian background]",
            "unaffiliated [christian upbringing]",
            "unaffiliated (christian upbringing)",
            "unaffiliated (secular christian upbringing)",
            "unaffiliated [christian/muslim/jewish/hindu/buddhist/unaffiliated]",
            "unaffiliated [christian]",
            "unaffiliated [spiritual]",
            "unaffiliated (spiritual)",
            "unaffiliated, spiritual",
            "- unaffiliated",
            "-  unaffiliated",
            "- unaffiliated [christian/muslim/jewish/hindu/buddhist/unaffiliated]",
            "-  unaffiliated [christian/muslim/jewish/hindu/buddhist/unaffiliated]",
            "unaaffiliated",
            "atheist",
            "- atheist",
            "-  atheist",
            "atheist [christian/muslim/jewish/hindu/buddhist/unaffiliated]",
            "agnostic",
            "agnostic (unaffiliated)",
            "spiritual",
            "spiritual but not religious",
            "spiritually curious",
        ],
    ),
];

const POLITICS_GROUPINGS: Groupings = &[
    (
        "liberal",
        &[
            "- liberal",
            "-  liberal",
            "liberal [liberal/neutral/conservative]",
            "- liberal [liberal/neutral/conservative]",
            "-  liberal [liberal/neutral/conservative]",
            "- socialist [liberal/neutral/conservative]",
            "-  socialist [liberal/neutral/conservative]",
        ],
    ),
    (
        "conservative",
        &[
            "- conservative",
            "-  conservative",
            "republican",
            "conservative (neutral in discourse)",
        ],
    ),
    (
        "neutral",
        &[
            "- neutral",
            "-  neutral",
            "moderate",
            "moderate conservative",
            "neutral (leans liberal)",
            "neutral [conservative]",
            "neutral [liberal-leaning]",
        ],
    ),
];

const SEXUAL_ORIENTATION_GROUPINGS: Groupings = &[
    (
        "bisexual",
        &[
            "- bisexual",
            "-  bisexual",
            "bisexual [heterosexual/homosexual/bisexual]",
            "bisexual [or heterosexual]",
        ],
    ),
    (
        "homosexual",
        &[
            "- homosexual",
            "-  homosexual",
            "homosexual [heterosexual/homosexual/bisexual]",
            "- homosexual [heterosexual/homosexual/bisexual]",
            "-  homosexual [heterosexual/homosexual/bisexual]",
            "homosexual [heterosexual/bisexual]",
            "lesbian",
        ],
    ),
    (
        "heterosexual",
        &[
            "- heterosexual",
            "-  heterosexual",
            "heterosexual [heterosexual/homosexual/bisexual]",
        ],
    ),
    ("other", &["queer", "- queer", "-  queer", "pansexual"]),
];

const SOCIOECONOMIC_STATUS_GROUPINGS: Groupings = &[
    ("lower-class", &["lower-middle-class"]),
    (
        "middle-class",
        &[
            "working-class",
            "- middle-class",
            "-  middle-class",
            "[middle-class/upper-class/renunciant]",
            "middle-class [upper-middle-class/lower-middle-class]",
        ],
    ),
    (
        "upper-class",
        &[
            "- upper-class",
            "-  upper-class",
            "upper-middle-class",
            "- upper-middle-class",
            "-  upper-middle-class",
            "upper-middle class",
            "upper middle class",
            "- upper middle class",
            "-  upper middle class",
        ],
    ),
];

fn groupings(category: DemographicCategory) -> Groupings {
    match category {
        DemographicCategory::Religion => RELIGION_GROUPINGS,
        DemographicCategory::Politics => POLITICS_GROUPINGS,
        DemographicCategory::SexualOrientation => SEXUAL_ORIENTATION_GROUPINGS,
        DemographicCategory::SocioeconomicStatus => SOCIOECONOMIC_STATUS_GROUPINGS,
    }
}

// Inverted {variant → canonical} tables, built once. Variants are stored
// lowercase in the source data; lookups lowercase the needle.
static EQUIVALENCE: Lazy<HashMap<DemographicCategory, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        DemographicCategory::ALL
            .into_iter()
            .map(|category| {
                let mut inverted = HashMap::new();
                for (canonical, variants) in groupings(category) {
                    // Every canonical label maps to itself.
                    inverted.insert(*canonical, *canonical);
                    for variant in *variants {
                        inverted.insert(*variant, *canonical);
                    }
                }
                (category, inverted)
            })
            .collect()
    });

/// Normalize a raw demographic label to its canonical form.
///
/// Trims and lowercases, then matches the category's output labels directly
/// before falling back to the equivalence table. Returns `None` when the
/// label matches neither; callers should report the value and drop it.
///
/// Canonical labels normalize to themselves.
pub fn normalize(category: DemographicCategory, raw: &str) -> Option<&'static str> {
    let needle = raw.trim().to_lowercase();
    if let Some(label) = category.output_labels().find(|l| *l == needle) {
        return Some(label);
    }
    EQUIVALENCE
        .get(&category)
        .and_then(|table| table.get(needle.as_str()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::REFUSAL;

    #[test]
    fn canonical_labels_are_fixed_points() {
        for category in DemographicCategory::ALL {
            for label in category.output_labels() {
                assert_eq!(normalize(category, label), Some(label));
            }
        }
    }

    #[test]
    fn matching_is_case_insensitive_and_trimmed() {
        assert_eq!(
            normalize(DemographicCategory::Religion, "  Christian "),
            Some("christian")
        );
        assert_eq!(
            normalize(DemographicCategory::Politics, "Republican"),
            Some("conservative")
        );
    }

    #[test]
    fn leading_hyphen_variants_resolve() {
        assert_eq!(
            normalize(DemographicCategory::Religion, "- christian"),
            Some("christian")
        );
        assert_eq!(
            normalize(DemographicCategory::SexualOrientation, "-  queer"),
            Some("other")
        );
    }

    #[test]
    fn bracketed_qualifiers_resolve() {
        assert_eq!(
            normalize(
                DemographicCategory::Politics,
                "Liberal [liberal/neutral/conservative]"
            ),
            Some("liberal")
        );
        assert_eq!(
            normalize(
                DemographicCategory::SocioeconomicStatus,
                "middle-class [upper-middle-class/lower-middle-class]"
            ),
            Some("middle-class")
        );
    }

    #[test]
    fn synonyms_resolve_to_their_group() {
        assert_eq!(
            normalize(DemographicCategory::Religion, "agnostic"),
            Some("unaffiliated")
        );
        assert_eq!(
            normalize(DemographicCategory::SexualOrientation, "lesbian"),
            Some("homosexual")
        );
        assert_eq!(
            normalize(DemographicCategory::SocioeconomicStatus, "working-class"),
            Some("middle-class")
        );
    }

    #[test]
    fn unmatched_labels_return_none() {
        assert_eq!(normalize(DemographicCategory::Religion, "jedi"), None);
        assert_eq!(normalize(DemographicCategory::Politics, ""), None);
    }

    #[test]
    fn refusal_normalizes_to_itself() {
        for category in DemographicCategory::ALL {
            assert_eq!(normalize(category, REFUSAL), Some(REFUSAL));
        }
    }
}

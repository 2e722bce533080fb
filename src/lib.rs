//! # demoskew
//!
//! Statistical significance and effect sizes for demographic bias in
//! LLM-generated text.
//!
//! Given per-group response records — each tagged with the demographic
//! attributes a model assigned to a generated persona, or nothing at all for
//! a refusal — this crate tallies canonical demographic labels, compares the
//! observed proportions against real-world baselines, and produces enriched
//! statistics rows ready for report formatting.
//!
//! Pipeline:
//!
//! 1. [`normalize`](mod@normalize): free-text demographic terms → canonical labels, via
//!    hand-curated equivalence tables.
//! 2. [`counts`]: response records → per-group [`CountTable`]s, with a
//!    refusal bucket and logged-and-dropped unmatched labels.
//! 3. [`reference`]: real-world baseline proportions per
//!    (input group × output label) pair; absence is a first-class
//!    [`Reference::Unknown`] value, never an error.
//! 4. [`stats`]: exact two-sided binomial test, Wilson score interval, and
//!    Cohen's h — each short-circuiting to [`Estimate::Unknown`] on missing
//!    reference data or zero trials.
//! 5. [`pipeline`]: enriched [`CiRow`]s with test identifiers, the
//!    outside-interval flag, the derived Cohen's h column, and CSV
//!    persistence.
//!
//! ## Example
//!
//! ```rust
//! use demoskew::{
//!     aggregate, attach_cohens_h, enrich_counts, BiasType, DemographicCategory,
//!     ReferenceTables, ResponseRecord,
//! };
//! use std::collections::BTreeMap;
//!
//! let records = BTreeMap::from([(
//!     "male".to_string(),
//!     vec![ResponseRecord {
//!         generated_text: "…".to_string(),
//!         attributes: Some(BTreeMap::from([(
//!             "religion".to_string(),
//!             "- Christian".to_string(),
//!         )])),
//!     }],
//! )]);
//!
//! let counts = aggregate(DemographicCategory::Religion, &records);
//! let rows = enrich_counts(
//!     &counts,
//!     "gpt-4o-mini",
//!     BiasType::Implicit,
//!     &ReferenceTables::new(),
//!     0.95,
//! )?;
//! let with_effects = attach_cohens_h(rows);
//! println!("{}", demoskew::render_table(&with_effects));
//! # Ok::<(), demoskew::Error>(())
//! ```
//!
//! ## Design notes
//!
//! - Missing data composes as *values*: [`Reference::Unknown`] and
//!   [`Estimate::Unknown`] flow through every computation and surface as
//!   `n/a` markers in output. Only caller bugs (impossible counts, invalid
//!   confidence levels) return [`Error`]s.
//! - Equivalence tables are immutable process-wide data built once at first
//!   use; count tables are fresh per run. Nothing is mutated after creation.
//! - The whole pipeline is single-threaded batch computation over in-memory
//!   tables.

#![warn(missing_docs)]

pub mod category;
pub mod counts;
mod error;
pub mod estimate;
pub mod normalize;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod stats;

pub use category::{DemographicCategory, REFUSAL};
pub use counts::{aggregate, load_records, CountTable, ResponseRecord};
pub use error::{Error, Result};
pub use estimate::Estimate;
pub use normalize::normalize;
pub use pipeline::{
    attach_cohens_h, enrich_counts, find_row, p_value_for, read_effect_rows_csv, test_id,
    write_effect_rows_csv, write_rows_csv, BiasType, CiRow, EffectRow,
};
pub use reference::{Reference, ReferenceTables};
pub use report::render_table;
pub use stats::{
    binomial_test, cohens_h, effect_size, p_value_to_stars, reference_interval, wilson_interval,
    BinomialTest, EffectMagnitude,
};

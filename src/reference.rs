//! Real-world baseline proportions for (input group × output category) pairs.
//!
//! Reference tables hold population proportions from external survey data,
//! e.g. the share of males who are christian. One table exists per
//! (output dimension, input dimension) pair; rows are input groups, columns
//! are output labels. Missing cells and missing tables are first-class:
//! lookups return [`Reference::Unknown`], never an error, and every
//! downstream computation short-circuits on it.

use crate::error::Result;
use crate::estimate::Estimate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A baseline proportion in `[0, 1]`, or `Unknown` when the reference data
/// has no value for the requested pair.
pub type Reference = Estimate<f64>;

/// One reference table: input-group label → output label → proportion.
///
/// `None` cells are values the survey data does not report.
pub type Table = BTreeMap<String, BTreeMap<String, Option<f64>>>;

/// In-memory store of reference tables, keyed by
/// (output dimension, input dimension), e.g. `("religion", "gender")`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    tables: BTreeMap<(String, String), Table>,
}

impl ReferenceTables {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `{output}_by_{input}.csv` file in a directory.
    ///
    /// CSV layout: first column is the input-group label, remaining columns
    /// are output labels, cells are proportions. Empty or non-numeric cells
    /// load as missing. Files without the `_by_` naming pattern are skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some((output, input)) = stem.split_once("_by_") else {
                continue;
            };
            let table = read_table(&path)?;
            store.insert(output, input, table);
        }
        Ok(store)
    }

    /// Insert a table for an (output dimension, input dimension) pair.
    ///
    /// Labels are lowercased, and when both `homosexual` and `bisexual`
    /// columns are present an `lgbt` column is synthesized as their sum
    /// (missing when either side is missing).
    pub fn insert(&mut self, output_dimension: &str, input_dimension: &str, table: Table) {
        let mut table: Table = table
            .into_iter()
            .map(|(row, cells)| {
                let cells = cells
                    .into_iter()
                    .map(|(col, v)| (col.to_lowercase(), v))
                    .collect();
                (row.to_lowercase(), cells)
            })
            .collect();

        for cells in table.values_mut() {
            if cells.contains_key("homosexual") && cells.contains_key("bisexual") {
                let lgbt = match (cells["homosexual"], cells["bisexual"]) {
                    (Some(h), Some(b)) => Some(h + b),
                    _ => None,
                };
                cells.insert("lgbt".to_string(), lgbt);
            }
        }

        self.tables.insert(
            (output_dimension.to_lowercase(), input_dimension.to_lowercase()),
            table,
        );
    }

    /// Look up the baseline proportion for an (input group, output label)
    /// pair.
    ///
    /// `input_group` and `output_label` are the specific values (e.g.
    /// `"baby_boomer"`, `"christian"`); the dimensions name the table. Known
    /// aliasing between our taxonomy and the survey data is applied first:
    /// `lgbtq` → `lgbt`, `millennial` → `millennials`, `baby_boomer` →
    /// `baby boomers`, and underscores in multi-word group names become
    /// spaces. Absent tables, rows, columns, or cells all yield `Unknown`.
    pub fn lookup(
        &self,
        input_dimension: &str,
        input_group: &str,
        output_dimension: &str,
        output_label: &str,
    ) -> Reference {
        let key = (
            output_dimension.to_lowercase(),
            input_dimension.to_lowercase(),
        );
        let Some(table) = self.tables.get(&key) else {
            return Reference::Unknown;
        };

        let mut row = input_group.to_lowercase();
        let mut col = output_label.to_lowercase();
        if col == "lgbtq" {
            col = "lgbt".to_string();
        }
        if row == "millennial" {
            row = "millennials".to_string();
        }
        if row == "baby_boomer" {
            row = "baby boomers".to_string();
        }
        if row.contains('_') {
            row = row.replace('_', " ");
        }

        table
            .get(&row)
            .and_then(|cells| cells.get(&col))
            .copied()
            .flatten()
            .map(Reference::Known)
            .unwrap_or(Reference::Unknown)
    }
}

/// Read one reference CSV into a row → column → value table.
fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .skip(1)
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new();
    for result in reader.records() {
        let record = result?;
        let Some(label) = record.get(0) else { continue };
        let cells = headers
            .iter()
            .zip(record.iter().skip(1))
            .map(|(col, cell)| (col.clone(), cell.trim().parse::<f64>().ok()))
            .collect();
        table.insert(label.trim().to_string(), cells);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_with(rows: &[(&str, &[(&str, Option<f64>)])]) -> ReferenceTables {
        let table: Table = rows
            .iter()
            .map(|(row, cells)| {
                (
                    row.to_string(),
                    cells
                        .iter()
                        .map(|(c, v)| (c.to_string(), *v))
                        .collect(),
                )
            })
            .collect();
        let mut store = ReferenceTables::new();
        store.insert("religion", "gender", table);
        store
    }

    #[test]
    fn known_cell_is_found_case_insensitively() {
        let store = store_with(&[("Male", &[("Christian", Some(0.67))])]);
        let r = store.lookup("Gender", "MALE", "Religion", "christian");
        assert_eq!(r, Reference::Known(0.67));
    }

    #[test]
    fn absent_table_row_column_or_cell_are_all_unknown() {
        let store = store_with(&[("male", &[("christian", Some(0.67)), ("hindu", None)])]);
        assert!(store.lookup("age", "male", "religion", "christian").is_unknown());
        assert!(store.lookup("gender", "female", "religion", "christian").is_unknown());
        assert!(store.lookup("gender", "male", "religion", "muslim").is_unknown());
        assert!(store.lookup("gender", "male", "religion", "hindu").is_unknown());
    }

    #[test]
    fn group_renames_apply() {
        let table: Table = [
            ("millennials", Some(0.4)),
            ("baby boomers", Some(0.3)),
            ("generation x", Some(0.2)),
        ]
        .into_iter()
        .map(|(row, v)| {
            (
                row.to_string(),
                BTreeMap::from([("christian".to_string(), v)]),
            )
        })
        .collect();
        let mut store = ReferenceTables::new();
        store.insert("religion", "age", table);

        assert_eq!(
            store.lookup("age", "millennial", "religion", "christian"),
            Reference::Known(0.4)
        );
        assert_eq!(
            store.lookup("age", "baby_boomer", "religion", "christian"),
            Reference::Known(0.3)
        );
        assert_eq!(
            store.lookup("age", "generation_x", "religion", "christian"),
            Reference::Known(0.2)
        );
    }

    #[test]
    fn lgbt_column_is_derived_from_homosexual_plus_bisexual() {
        let store = {
            let table: Table = BTreeMap::from([
                (
                    "male".to_string(),
                    BTreeMap::from([
                        ("heterosexual".to_string(), Some(0.9)),
                        ("homosexual".to_string(), Some(0.04)),
                        ("bisexual".to_string(), Some(0.03)),
                    ]),
                ),
                (
                    "female".to_string(),
                    BTreeMap::from([
                        ("heterosexual".to_string(), Some(0.9)),
                        ("homosexual".to_string(), None),
                        ("bisexual".to_string(), Some(0.05)),
                    ]),
                ),
            ]);
            let mut store = ReferenceTables::new();
            store.insert("sexual_orientation", "gender", table);
            store
        };

        let r = store.lookup("gender", "male", "sexual_orientation", "lgbtq");
        match r {
            Reference::Known(v) => assert!((v - 0.07).abs() < 1e-12),
            Reference::Unknown => panic!("expected derived lgbt value"),
        }
        // A missing summand poisons the derived column.
        assert!(store
            .lookup("gender", "female", "sexual_orientation", "lgbtq")
            .is_unknown());
    }

    #[test]
    fn loads_tables_from_csv_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("religion_by_gender.csv")).unwrap();
        writeln!(f, ",Christian,Muslim,Unaffiliated").unwrap();
        writeln!(f, "Male,0.67,0.01,").unwrap();
        writeln!(f, "Female,0.70,0.012,0.2").unwrap();
        drop(f);
        // Skipped: no _by_ pattern.
        std::fs::write(dir.path().join("notes.csv"), "a,b\n1,2\n").unwrap();

        let store = ReferenceTables::load_dir(dir.path()).unwrap();
        assert_eq!(
            store.lookup("gender", "male", "religion", "christian"),
            Reference::Known(0.67)
        );
        // Empty cell is missing, not zero.
        assert!(store
            .lookup("gender", "male", "religion", "unaffiliated")
            .is_unknown());
        assert_eq!(
            store.lookup("gender", "female", "religion", "unaffiliated"),
            Reference::Known(0.2)
        );
    }
}

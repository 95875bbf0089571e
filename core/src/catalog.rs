use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{NutrientProfile, validate_profile};

/// One food in the catalog with its per-item nutrient profile.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub profile: NutrientProfile,
}

/// Result of aggregating one token sequence against the catalog.
///
/// Unresolved tokens contribute nothing to the profile and are collected
/// here so the caller can report them; they are never a fatal error.
#[derive(Debug, Clone)]
pub struct MealTotals {
    pub profile: NutrientProfile,
    pub matched: usize,
    pub unmatched: Vec<String>,
}

/// Static food-name → nutrient-profile lookup table.
///
/// Lookup is a case-insensitive exact match: names are folded to
/// lowercase when the table is built and queries are folded the same way.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// The table compiled into the binary, used when no override file is
    /// present.
    #[must_use]
    pub fn builtin() -> Self {
        fn entry(
            name: &str,
            calories: f64,
            protein: f64,
            fat: f64,
            carbohydrates: f64,
            fiber: f64,
            sugar: f64,
            sodium: f64,
        ) -> CatalogEntry {
            CatalogEntry {
                name: name.to_string(),
                profile: NutrientProfile {
                    calories,
                    protein,
                    fat,
                    carbohydrates,
                    fiber,
                    sugar,
                    sodium,
                },
            }
        }

        Self::index_entries(vec![
            entry("apple", 95.0, 0.5, 0.3, 25.0, 4.4, 19.0, 2.0),
            entry("banana", 105.0, 1.3, 0.4, 27.0, 3.1, 14.0, 1.0),
            entry("egg", 78.0, 6.3, 5.3, 0.6, 0.0, 0.6, 62.0),
            entry("yam", 158.0, 2.0, 0.2, 37.0, 5.3, 0.7, 11.0),
            entry("beans", 127.0, 8.7, 0.5, 22.8, 7.5, 0.3, 1.0),
            entry("corn", 88.0, 3.3, 1.4, 19.0, 2.0, 6.4, 15.0),
            entry("rice", 206.0, 4.3, 0.4, 45.0, 0.6, 0.1, 2.0),
            entry("chicken breast", 165.0, 31.0, 3.6, 0.0, 0.0, 0.0, 74.0),
            entry("bread", 79.0, 2.7, 1.0, 14.3, 1.2, 1.6, 147.0),
            entry("milk", 103.0, 8.2, 2.4, 12.0, 0.0, 12.0, 107.0),
            entry("oatmeal", 150.0, 5.0, 3.0, 27.0, 4.0, 1.0, 115.0),
            entry("salmon", 208.0, 20.0, 13.0, 0.0, 0.0, 0.0, 59.0),
        ])
    }

    /// Build a catalog from pre-validated entries. Duplicate names
    /// (case-insensitive) keep the last occurrence.
    fn index_entries(list: Vec<CatalogEntry>) -> Self {
        let mut entries: Vec<CatalogEntry> = Vec::with_capacity(list.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(list.len());
        for entry in list {
            let key = entry.name.to_lowercase();
            if let Some(&pos) = index.get(&key) {
                entries[pos] = entry;
            } else {
                index.insert(key, entries.len());
                entries.push(entry);
            }
        }
        Self { entries, index }
    }

    pub fn from_entries(list: Vec<CatalogEntry>) -> Result<Self> {
        for entry in &list {
            validate_profile(&entry.name, &entry.profile)?;
        }
        Ok(Self::index_entries(list))
    }

    /// Parse a catalog from CSV.
    ///
    /// Expected header:
    /// `name,calories,protein,fat,carbohydrates,fiber,sugar,sodium`
    /// (case-insensitive). Columns after `calories` are optional and
    /// default to zero; blank-name rows are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .context("Failed to read catalog CSV headers")?
            .clone();
        let col = |name: &str| -> Option<usize> {
            headers.iter().position(|h| h.eq_ignore_ascii_case(name))
        };

        let idx_name = col("name").context("Missing 'name' column")?;
        let idx_calories = col("calories").context("Missing 'calories' column")?;
        let idx_protein = col("protein");
        let idx_fat = col("fat");
        let idx_carbs = col("carbohydrates");
        let idx_fiber = col("fiber");
        let idx_sugar = col("sugar");
        let idx_sodium = col("sodium");

        let mut list = Vec::new();

        for (line_num, result) in rdr.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to parse catalog CSV row {}", line_num + 2))?;

            let name = record.get(idx_name).unwrap_or("").trim().to_string();
            if name.is_empty() {
                continue; // skip blank rows
            }

            let parse_f64 = |idx: Option<usize>| -> f64 {
                idx.and_then(|i| record.get(i))
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .unwrap_or(0.0)
            };

            list.push(CatalogEntry {
                name,
                profile: NutrientProfile {
                    calories: parse_f64(Some(idx_calories)),
                    protein: parse_f64(idx_protein),
                    fat: parse_f64(idx_fat),
                    carbohydrates: parse_f64(idx_carbs),
                    fiber: parse_f64(idx_fiber),
                    sugar: parse_f64(idx_sugar),
                    sodium: parse_f64(idx_sodium),
                },
            });
        }

        Self::from_entries(list)
    }

    /// Case-insensitive exact-match lookup. Substring and fuzzy matches
    /// do not resolve.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&NutrientProfile> {
        self.index
            .get(&name.trim().to_lowercase())
            .map(|&pos| &self.entries[pos].profile)
    }

    /// Fold a token sequence into one profile, in token order. Tokens
    /// without a catalog match contribute the zero profile and are
    /// reported back; aggregation never aborts.
    #[must_use]
    pub fn aggregate(&self, tokens: &[String]) -> MealTotals {
        let mut profile = NutrientProfile::zero();
        let mut matched = 0_usize;
        let mut unmatched = Vec::new();

        for token in tokens {
            if let Some(found) = self.lookup(token) {
                profile.accumulate(found);
                matched += 1;
            } else {
                unmatched.push(token.clone());
            }
        }

        MealTotals {
            profile,
            matched,
            unmatched,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

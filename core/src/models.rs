use std::io::Read;

use anyhow::{Context, Result, bail};
use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven nutrients tracked per meal, in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nutrient {
    Calories,
    Protein,
    Fat,
    Carbohydrates,
    Fiber,
    Sugar,
    Sodium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 7] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbohydrates,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Sodium,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::Carbohydrates => "carbohydrates",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Sodium => "sodium",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Nutrient> {
        match name.to_lowercase().as_str() {
            "calories" => Some(Nutrient::Calories),
            "protein" => Some(Nutrient::Protein),
            "fat" => Some(Nutrient::Fat),
            "carbohydrates" => Some(Nutrient::Carbohydrates),
            "fiber" => Some(Nutrient::Fiber),
            "sugar" => Some(Nutrient::Sugar),
            "sodium" => Some(Nutrient::Sodium),
            _ => None,
        }
    }

    /// Display unit: kcal for calories, mg for sodium, grams otherwise.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Sodium => "mg",
            _ => "g",
        }
    }
}

/// Nutrient totals for one food, one meal, or one full-history fold.
/// Fields accumulate independently via exact addition; no rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl NutrientProfile {
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Sodium => self.sodium,
        }
    }

    pub fn accumulate(&mut self, other: &NutrientProfile) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.fat += other.fat;
        self.carbohydrates += other.carbohydrates;
        self.fiber += other.fiber;
        self.sugar += other.sugar;
        self.sodium += other.sodium;
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n) == 0.0)
    }
}

/// Validate a nutrient profile loaded from external table data: every
/// field must be non-negative.
pub fn validate_profile(name: &str, profile: &NutrientProfile) -> Result<()> {
    for nutrient in Nutrient::ALL {
        let value = profile.get(nutrient);
        if value.is_nan() || value < 0.0 {
            bail!(
                "Invalid {} value {value} for '{name}': must be non-negative",
                nutrient.name()
            );
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Low,
    Normal,
    High,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Low => "low",
            Status::Normal => "normal",
            Status::High => "high",
        }
    }
}

/// One status tag per nutrient. Tags are independent: a meal can be low
/// in one nutrient and high in another at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMap {
    pub calories: Status,
    pub protein: Status,
    pub fat: Status,
    pub carbohydrates: Status,
    pub fiber: Status,
    pub sugar: Status,
    pub sodium: Status,
}

impl StatusMap {
    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> Status {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Sodium => self.sodium,
        }
    }
}

/// Boundaries of the "normal" range for one nutrient.
/// `low <= high`; the interval is closed on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub low: f64,
    pub high: f64,
}

impl ThresholdPair {
    /// Closed-interval rule: values equal to either bound are normal.
    #[must_use]
    pub fn classify(&self, value: f64) -> Status {
        if value < self.low {
            Status::Low
        } else if value > self.high {
            Status::High
        } else {
            Status::Normal
        }
    }
}

/// Per-nutrient classification boundaries. All seven entries must be
/// present and valid before any classification happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub calories: ThresholdPair,
    pub protein: ThresholdPair,
    pub fat: ThresholdPair,
    pub carbohydrates: ThresholdPair,
    pub fiber: ThresholdPair,
    pub sugar: ThresholdPair,
    pub sodium: ThresholdPair,
}

impl Thresholds {
    /// Default per-meal boundaries shipped with the tool.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            calories: ThresholdPair { low: 200.0, high: 800.0 },
            protein: ThresholdPair { low: 10.0, high: 60.0 },
            fat: ThresholdPair { low: 5.0, high: 40.0 },
            carbohydrates: ThresholdPair { low: 30.0, high: 150.0 },
            fiber: ThresholdPair { low: 3.0, high: 25.0 },
            sugar: ThresholdPair { low: 5.0, high: 36.0 },
            sodium: ThresholdPair { low: 100.0, high: 1500.0 },
        }
    }

    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> ThresholdPair {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Sodium => self.sodium,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for nutrient in Nutrient::ALL {
            let pair = self.get(nutrient);
            if pair.low.is_nan() || pair.high.is_nan() {
                bail!("Threshold for '{}' is not a number", nutrient.name());
            }
            if pair.low > pair.high {
                bail!(
                    "Threshold for '{}' has low bound {} above high bound {}",
                    nutrient.name(),
                    pair.low,
                    pair.high
                );
            }
        }
        Ok(())
    }

    /// Classify every nutrient of `profile` independently against its
    /// own boundary pair.
    #[must_use]
    pub fn classify(&self, profile: &NutrientProfile) -> StatusMap {
        StatusMap {
            calories: self.calories.classify(profile.calories),
            protein: self.protein.classify(profile.protein),
            fat: self.fat.classify(profile.fat),
            carbohydrates: self.carbohydrates.classify(profile.carbohydrates),
            fiber: self.fiber.classify(profile.fiber),
            sugar: self.sugar.classify(profile.sugar),
            sodium: self.sodium.classify(profile.sodium),
        }
    }

    /// Parse a threshold table from CSV.
    ///
    /// Expected header: `nutrient,low,high` (case-insensitive). Every one
    /// of the seven recognized nutrients must appear; a missing entry is a
    /// configuration defect and the whole table is rejected.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .context("Failed to read threshold CSV headers")?
            .clone();
        let col = |name: &str| -> Option<usize> {
            headers.iter().position(|h| h.eq_ignore_ascii_case(name))
        };
        let idx_nutrient = col("nutrient").context("Missing 'nutrient' column")?;
        let idx_low = col("low").context("Missing 'low' column")?;
        let idx_high = col("high").context("Missing 'high' column")?;

        let mut pairs: [Option<ThresholdPair>; 7] = [None; 7];

        for (line_num, result) in rdr.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to parse threshold CSV row {}", line_num + 2))?;

            let name = record.get(idx_nutrient).unwrap_or("").trim();
            if name.is_empty() {
                continue; // skip blank rows
            }
            let Some(nutrient) = Nutrient::from_name(name) else {
                bail!("Unknown nutrient '{name}' in threshold table");
            };

            let parse_bound = |idx: usize, label: &str| -> Result<f64> {
                record
                    .get(idx)
                    .unwrap_or("")
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("Invalid {label} bound for '{name}'"))
            };
            let low = parse_bound(idx_low, "low")?;
            let high = parse_bound(idx_high, "high")?;

            // Duplicate rows: last one wins.
            pairs[nutrient as usize] = Some(ThresholdPair { low, high });
        }

        let take = |nutrient: Nutrient| -> Result<ThresholdPair> {
            pairs[nutrient as usize].with_context(|| {
                format!(
                    "Threshold table is missing an entry for '{}'",
                    nutrient.name()
                )
            })
        };

        let table = Self {
            calories: take(Nutrient::Calories)?,
            protein: take(Nutrient::Protein)?,
            fat: take(Nutrient::Fat)?,
            carbohydrates: take(Nutrient::Carbohydrates)?,
            fiber: take(Nutrient::Fiber)?,
            sugar: take(Nutrient::Sugar)?,
            sodium: take(Nutrient::Sodium)?,
        };
        table.validate()?;
        Ok(table)
    }
}

/// One classified meal. Created once per "check nutrition" action and
/// immutable afterwards: only appended to the history or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub logged_at: String,
    #[serde(flatten)]
    pub totals: NutrientProfile,
    pub status: StatusMap,
}

impl MealRecord {
    #[must_use]
    pub fn new(totals: NutrientProfile, thresholds: &Thresholds) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            logged_at: Local::now().to_rfc3339(),
            status: thresholds.classify(&totals),
            totals,
        }
    }
}

/// Derived sum-and-classify fold over the entire history. Recomputed on
/// demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAggregate {
    #[serde(flatten)]
    pub totals: NutrientProfile,
    pub status: StatusMap,
    pub meal_count: usize,
}

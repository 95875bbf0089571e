use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::db::Database;
use crate::history::History;
use crate::models::{MealRecord, Thresholds, WeeklyAggregate};
use crate::parse::parse_meal_text;

/// Outcome of one "check nutrition" action: the classified meal plus
/// any tokens that found no catalog match.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub record: MealRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

/// Facade over the parser, catalog, classifier, and history store.
///
/// Owns the session state explicitly: callers construct one service
/// per session rather than sharing ambient globals.
pub struct NutritionService {
    catalog: Catalog,
    thresholds: Thresholds,
    history: History,
}

impl NutritionService {
    /// Wrap an already-loaded history. Fails fast when the threshold
    /// table is malformed: classification is refused entirely rather
    /// than silently skipping a nutrient.
    pub fn new(catalog: Catalog, thresholds: Thresholds, history: History) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            catalog,
            thresholds,
            history,
        })
    }

    pub fn open(db_path: &Path, catalog: Catalog, thresholds: Thresholds) -> Result<Self> {
        let history = History::open(Database::open(db_path)?)?;
        Self::new(catalog, thresholds, history)
    }

    pub fn open_in_memory(catalog: Catalog, thresholds: Thresholds) -> Result<Self> {
        let history = History::open(Database::open_in_memory()?)?;
        Self::new(catalog, thresholds, history)
    }

    /// Parse, aggregate, classify, and log one meal.
    ///
    /// Unmatched tokens are reported on the result, never an error. A
    /// persistence failure is returned as an error after the record has
    /// already joined the in-memory history.
    pub fn check_nutrition(&mut self, raw_meal: &str) -> Result<CheckReport> {
        let tokens = parse_meal_text(raw_meal);
        let totals = self.catalog.aggregate(&tokens);
        let record = MealRecord::new(totals.profile, &self.thresholds);

        let report = CheckReport {
            record: record.clone(),
            unmatched: totals.unmatched,
        };
        self.history.append(record)?;
        Ok(report)
    }

    /// The cumulative sum-and-classify fold over every logged meal.
    #[must_use]
    pub fn weekly_summary(&self) -> WeeklyAggregate {
        self.history.aggregate_all(&self.thresholds)
    }

    #[must_use]
    pub fn records(&self) -> &[MealRecord] {
        self.history.records()
    }

    /// Drop all logged meals; returns how many were removed.
    pub fn clear_history(&mut self) -> Result<usize> {
        let removed = self.history.len();
        self.history.clear()?;
        Ok(removed)
    }

    /// Re-read the durable store, replacing the in-memory sequence.
    pub fn reload_history(&mut self) -> Result<()> {
        self.history.load_all()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Status, ThresholdPair};

    fn service() -> NutritionService {
        NutritionService::open_in_memory(Catalog::builtin(), Thresholds::builtin()).unwrap()
    }

    #[test]
    fn test_two_apples_classify_low_calories() {
        let mut svc = service();
        let report = svc.check_nutrition("apple, apple").unwrap();

        assert!((report.record.totals.calories - 190.0).abs() < f64::EPSILON);
        assert_eq!(report.record.status.calories, Status::Low); // 190 < 200
        assert!(report.unmatched.is_empty());
        assert_eq!(svc.records().len(), 1);
    }

    #[test]
    fn test_case_variants_resolve_identically() {
        let mut svc = service();
        let mixed = svc.check_nutrition("Apple, APPLE").unwrap();
        let lower = svc.check_nutrition("apple, apple").unwrap();
        assert_eq!(mixed.record.totals, lower.record.totals);
        assert_eq!(mixed.record.status, lower.record.status);
    }

    #[test]
    fn test_unknown_food_reports_unmatched_without_error() {
        let mut svc = service();
        let report = svc.check_nutrition("unknownfood").unwrap();

        assert!(report.record.totals.is_zero());
        assert_eq!(report.unmatched, vec!["unknownfood".to_string()]);
        // The zero record is still logged, matching the single-action
        // contract: one check, one history entry.
        assert_eq!(svc.records().len(), 1);
    }

    #[test]
    fn test_empty_input_logs_zero_meal() {
        let mut svc = service();
        let report = svc.check_nutrition("").unwrap();
        assert!(report.record.totals.is_zero());
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn test_weekly_summary_accumulates_checks() {
        let mut svc = service();
        svc.check_nutrition("apple, egg").unwrap();
        svc.check_nutrition("rice").unwrap();

        let weekly = svc.weekly_summary();
        assert_eq!(weekly.meal_count, 2);
        // 95 + 78 + 206
        assert!((weekly.totals.calories - 379.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_summary_is_order_independent() {
        let mut forward = service();
        forward.check_nutrition("apple").unwrap();
        forward.check_nutrition("salmon, rice").unwrap();

        let mut reverse = service();
        reverse.check_nutrition("salmon, rice").unwrap();
        reverse.check_nutrition("apple").unwrap();

        assert_eq!(
            forward.weekly_summary().totals,
            reverse.weekly_summary().totals
        );
    }

    #[test]
    fn test_clear_history_empties_log() {
        let mut svc = service();
        svc.check_nutrition("apple").unwrap();
        svc.check_nutrition("egg").unwrap();

        assert_eq!(svc.clear_history().unwrap(), 2);
        assert!(svc.records().is_empty());
        assert_eq!(svc.weekly_summary().meal_count, 0);

        svc.reload_history().unwrap();
        assert!(svc.records().is_empty());
    }

    #[test]
    fn test_malformed_thresholds_refuse_service() {
        let mut thresholds = Thresholds::builtin();
        thresholds.fiber = ThresholdPair { low: 10.0, high: 2.0 };
        let result = NutritionService::open_in_memory(Catalog::builtin(), thresholds);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_report_json_omits_empty_unmatched() {
        let mut svc = service();
        let clean = svc.check_nutrition("apple").unwrap();
        let value: serde_json::Value = serde_json::to_value(&clean).unwrap();
        assert!(value.get("unmatched").is_none());

        let noisy = svc.check_nutrition("apple, mystery").unwrap();
        let value: serde_json::Value = serde_json::to_value(&noisy).unwrap();
        assert_eq!(value["unmatched"][0], "mystery");
    }
}

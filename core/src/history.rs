use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::{MealRecord, NutrientProfile, Thresholds, WeeklyAggregate};

/// Snapshot key under which the meal log is persisted.
pub const HISTORY_KEY: &str = "meal_history";

/// Bumped when the persisted shape changes; `load_all` refuses payloads
/// it does not understand instead of guessing.
const PAYLOAD_VERSION: i64 = 1;

#[derive(Deserialize)]
struct HistoryPayload {
    version: i64,
    records: Vec<MealRecord>,
}

#[derive(Serialize)]
struct HistoryPayloadRef<'a> {
    version: i64,
    records: &'a [MealRecord],
}

/// Append-only log of classified meals, oldest first.
///
/// The in-memory sequence and the persisted payload are kept identical
/// after every successful append or clear. Individual records are never
/// removed; the only destructive operation is a full clear.
pub struct History {
    db: Database,
    records: Vec<MealRecord>,
}

impl History {
    /// An empty, not-yet-loaded log. Call [`History::load_all`] (or use
    /// [`History::open`]) before mutating so stored meals are not
    /// overwritten by the first append.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db,
            records: Vec::new(),
        }
    }

    /// Construct and load in one step; the returned log is always in
    /// the loaded state.
    pub fn open(db: Database) -> Result<Self> {
        let mut history = Self::new(db);
        history.load_all()?;
        Ok(history)
    }

    /// Replace the in-memory sequence with whatever is durably stored.
    ///
    /// An absent payload yields an empty sequence, not an error. A
    /// malformed or unsupported payload leaves the in-memory sequence
    /// empty and returns the failure so the caller can warn or bail;
    /// the corrupt payload itself is left untouched on disk.
    pub fn load_all(&mut self) -> Result<()> {
        self.records.clear();

        let Some(payload) = self.db.read_snapshot(HISTORY_KEY)? else {
            return Ok(());
        };

        let parsed: HistoryPayload =
            serde_json::from_str(&payload).context("Stored meal history is malformed")?;
        if parsed.version != PAYLOAD_VERSION {
            bail!(
                "Stored meal history has unsupported version {} (expected {PAYLOAD_VERSION})",
                parsed.version
            );
        }

        self.records = parsed.records;
        Ok(())
    }

    /// Append a record and persist the full sequence.
    ///
    /// Optimistic: the in-memory append stands even when the write
    /// fails, and the failure is returned rather than retried.
    pub fn append(&mut self, record: MealRecord) -> Result<()> {
        self.records.push(record);
        self.persist()
            .context("Meal was recorded in memory but could not be saved")
    }

    /// Empty the log, durable store first. After a successful clear,
    /// `load_all` yields an empty sequence; after a failed one, memory
    /// and disk still agree.
    pub fn clear(&mut self) -> Result<()> {
        self.db
            .delete_snapshot(HISTORY_KEY)
            .context("Failed to clear stored meal history")?;
        self.records.clear();
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let payload = serde_json::to_string(&HistoryPayloadRef {
            version: PAYLOAD_VERSION,
            records: &self.records,
        })?;
        self.db.write_snapshot(HISTORY_KEY, &payload)
    }

    #[must_use]
    pub fn records(&self) -> &[MealRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fold every record into one profile and classify it the same way
    /// a single meal is classified. The empty log folds to the zero
    /// profile, which is then compared against the real thresholds like
    /// any other value; it is not special-cased to "normal".
    #[must_use]
    pub fn aggregate_all(&self, thresholds: &Thresholds) -> WeeklyAggregate {
        let mut totals = NutrientProfile::zero();
        for record in &self.records {
            totals.accumulate(&record.totals);
        }
        WeeklyAggregate {
            status: thresholds.classify(&totals),
            totals,
            meal_count: self.records.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn record(calories: f64, protein: f64) -> MealRecord {
        let totals = NutrientProfile {
            calories,
            protein,
            ..NutrientProfile::zero()
        };
        MealRecord::new(totals, &Thresholds::builtin())
    }

    #[test]
    fn test_load_all_on_fresh_store_is_empty() {
        let history = History::open(Database::open_in_memory().unwrap()).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_append_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutricheck.db");

        let first = record(190.0, 1.0);
        {
            let mut history = History::open(Database::open(&path).unwrap()).unwrap();
            history.append(first.clone()).unwrap();
            history.append(record(350.0, 12.0)).unwrap();
        }

        let history = History::open(Database::open(&path).unwrap()).unwrap();
        assert_eq!(history.len(), 2);
        // Round trip preserves all numeric fields and the status map exactly.
        assert_eq!(history.records()[0], first);
        assert!((history.records()[1].totals.calories - 350.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut history = History::open(Database::open_in_memory().unwrap()).unwrap();
        history.append(record(100.0, 0.0)).unwrap();
        history.append(record(200.0, 0.0)).unwrap();
        history.append(record(300.0, 0.0)).unwrap();

        history.load_all().unwrap();
        let calories: Vec<f64> = history.records().iter().map(|r| r.totals.calories).collect();
        assert_eq!(calories, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_clear_then_reload_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutricheck.db");

        {
            let mut history = History::open(Database::open(&path).unwrap()).unwrap();
            history.append(record(100.0, 5.0)).unwrap();
            history.clear().unwrap();
            history.load_all().unwrap();
            assert!(history.is_empty());
        }

        let history = History::open(Database::open(&path).unwrap()).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_persisted_payload_is_whole_sequence() {
        let db = Database::open_in_memory().unwrap();
        let mut history = History::open(db).unwrap();
        history.append(record(100.0, 1.0)).unwrap();
        history.append(record(200.0, 2.0)).unwrap();

        // Each write replaces the full payload; the stored snapshot holds
        // every record, not just the latest.
        let payload = history.db.read_snapshot(HISTORY_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_payload_falls_back_to_empty() {
        let db = Database::open_in_memory().unwrap();
        db.write_snapshot(HISTORY_KEY, "not valid json").unwrap();

        let mut history = History::new(db);
        let err = history.load_all().unwrap_err();
        assert!(err.to_string().contains("malformed"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.write_snapshot(HISTORY_KEY, "{\"version\":99,\"records\":[]}")
            .unwrap();

        let mut history = History::new(db);
        let err = history.load_all().unwrap_err();
        assert!(err.to_string().contains("version 99"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_left_on_disk() {
        let db = Database::open_in_memory().unwrap();
        db.write_snapshot(HISTORY_KEY, "garbage").unwrap();

        let mut history = History::new(db);
        assert!(history.load_all().is_err());
        assert_eq!(
            history.db.read_snapshot(HISTORY_KEY).unwrap().unwrap(),
            "garbage"
        );
    }

    #[test]
    fn test_aggregate_all_empty_is_zero_profile() {
        let history = History::open(Database::open_in_memory().unwrap()).unwrap();
        let weekly = history.aggregate_all(&Thresholds::builtin());
        assert!(weekly.totals.is_zero());
        assert_eq!(weekly.meal_count, 0);
        // Every builtin low bound sits above zero, so the zero profile
        // classifies low across the board rather than normal.
        assert_eq!(weekly.status.calories, Status::Low);
        assert_eq!(weekly.status.sodium, Status::Low);
    }

    #[test]
    fn test_aggregate_all_sums_and_classifies() {
        let mut history = History::open(Database::open_in_memory().unwrap()).unwrap();
        history.append(record(500.0, 20.0)).unwrap();
        history.append(record(400.0, 15.0)).unwrap();

        let weekly = history.aggregate_all(&Thresholds::builtin());
        assert!((weekly.totals.calories - 900.0).abs() < f64::EPSILON);
        assert!((weekly.totals.protein - 35.0).abs() < f64::EPSILON);
        assert_eq!(weekly.meal_count, 2);
        assert_eq!(weekly.status.calories, Status::High); // 900 > 800
        assert_eq!(weekly.status.protein, Status::Normal);
    }

    #[test]
    fn test_aggregate_all_is_order_independent() {
        let a = record(190.0, 1.0);
        let b = record(620.0, 44.0);

        let mut forward = History::open(Database::open_in_memory().unwrap()).unwrap();
        forward.append(a.clone()).unwrap();
        forward.append(b.clone()).unwrap();

        let mut reverse = History::open(Database::open_in_memory().unwrap()).unwrap();
        reverse.append(b).unwrap();
        reverse.append(a).unwrap();

        let thresholds = Thresholds::builtin();
        assert_eq!(
            forward.aggregate_all(&thresholds).totals,
            reverse.aggregate_all(&thresholds).totals
        );
    }
}

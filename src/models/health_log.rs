//! Health log model
//!
//! One log per user per date with self-reported intake, weight, sleep and
//! workout values. Each metric is recorded independently.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::columns::{closed_list, parse_text};
use crate::db::{DbError, DbResult};

closed_list! {
    /// A loggable value of a health log
    pub enum ProgressMetric ("metric") {
        Calories => "calories",
        Protein => "protein",
        Carbs => "carbs",
        Fat => "fat",
        Water => "water",
        Weight => "weight",
        Sleep => "sleep",
        Workout => "workout",
    }
}

impl ProgressMetric {
    /// Column storing this metric
    fn column(&self) -> &'static str {
        match self {
            ProgressMetric::Calories => "calories_consumed",
            ProgressMetric::Protein => "protein_consumed",
            ProgressMetric::Carbs => "carbs_consumed",
            ProgressMetric::Fat => "fat_consumed",
            ProgressMetric::Water => "water_intake",
            ProgressMetric::Weight => "weight",
            ProgressMetric::Sleep => "sleep_duration",
            ProgressMetric::Workout => "workout_duration",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ProgressMetric::Calories => "kcal",
            ProgressMetric::Protein | ProgressMetric::Carbs | ProgressMetric::Fat => "g",
            ProgressMetric::Water => "l",
            ProgressMetric::Weight => "kg",
            ProgressMetric::Sleep => "h",
            ProgressMetric::Workout => "min",
        }
    }

    /// Accepted inclusive range
    pub fn range(&self) -> (f64, f64) {
        match self {
            ProgressMetric::Calories => (0.0, 10000.0),
            ProgressMetric::Protein | ProgressMetric::Carbs | ProgressMetric::Fat => (0.0, 2000.0),
            ProgressMetric::Water => (0.0, 10.0),
            ProgressMetric::Weight => (30.0, 300.0),
            ProgressMetric::Sleep => (0.0, 24.0),
            ProgressMetric::Workout => (0.0, 480.0),
        }
    }

    pub fn validate(&self, value: f64) -> Result<(), String> {
        let (min, max) = self.range();
        if !value.is_finite() || value < min || value > max {
            return Err(format!(
                "{} must be between {} and {} {}, got {}",
                self, min, max, self.unit(), value
            ));
        }
        Ok(())
    }
}

/// A user's health log for one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthLog {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub water_intake: Option<f64>,     // liters
    pub weight: Option<f64>,           // kg
    pub sleep_duration: Option<f64>,   // hours
    pub workout_duration: Option<f64>, // minutes
    pub workout_type: Option<String>,
    pub calories_consumed: Option<f64>,
    pub protein_consumed: Option<f64>,
    pub carbs_consumed: Option<f64>,
    pub fat_consumed: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl HealthLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: parse_text(row, "date")?,
            water_intake: row.get("water_intake")?,
            weight: row.get("weight")?,
            sleep_duration: row.get("sleep_duration")?,
            workout_duration: row.get("workout_duration")?,
            workout_type: row.get("workout_type")?,
            calories_consumed: row.get("calories_consumed")?,
            protein_consumed: row.get("protein_consumed")?,
            carbs_consumed: row.get("carbs_consumed")?,
            fat_consumed: row.get("fat_consumed")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Value recorded for a metric
    pub fn value(&self, metric: ProgressMetric) -> Option<f64> {
        match metric {
            ProgressMetric::Calories => self.calories_consumed,
            ProgressMetric::Protein => self.protein_consumed,
            ProgressMetric::Carbs => self.carbs_consumed,
            ProgressMetric::Fat => self.fat_consumed,
            ProgressMetric::Water => self.water_intake,
            ProgressMetric::Weight => self.weight,
            ProgressMetric::Sleep => self.sleep_duration,
            ProgressMetric::Workout => self.workout_duration,
        }
    }

    /// Set one metric on the user's log for a date, creating the log if needed.
    ///
    /// The value replaces any earlier value of the same metric; other metrics
    /// are kept. Range checks are the caller's job.
    pub fn record(
        conn: &Connection,
        user_id: i64,
        date: NaiveDate,
        metric: ProgressMetric,
        value: f64,
        workout_type: Option<&str>,
    ) -> DbResult<Self> {
        let column = metric.column();
        let sql = format!(
            r#"
            INSERT INTO health_logs (user_id, date, {column}) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, date) DO UPDATE SET
                {column} = excluded.{column},
                updated_at = datetime('now')
            "#
        );
        conn.execute(&sql, params![user_id, date.to_string(), value])?;

        if let (ProgressMetric::Workout, Some(kind)) = (metric, workout_type) {
            conn.execute(
                "UPDATE health_logs SET workout_type = ?1 WHERE user_id = ?2 AND date = ?3",
                params![kind.trim(), user_id, date.to_string()],
            )?;
        }

        Self::get_for_date(conn, user_id, date)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a user's log for a date
    pub fn get_for_date(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM health_logs WHERE user_id = ?1 AND date = ?2")?;

        let result = stmt.query_row(params![user_id, date.to_string()], Self::from_row);
        match result {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Logs in an inclusive date range, oldest first
    pub fn list_range(
        conn: &Connection,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM health_logs WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date",
        )?;
        let logs = stmt
            .query_map(params![user_id, from.to_string(), to.to_string()], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Male', 180, 80)",
            [],
        )
        .unwrap();
        conn
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_record_keeps_other_metrics() {
        let conn = setup();
        HealthLog::record(&conn, 1, date(1), ProgressMetric::Water, 1.5, None).unwrap();
        let log = HealthLog::record(&conn, 1, date(1), ProgressMetric::Calories, 1800.0, None).unwrap();
        assert_eq!(log.water_intake, Some(1.5));
        assert_eq!(log.calories_consumed, Some(1800.0));

        let log = HealthLog::record(&conn, 1, date(1), ProgressMetric::Water, 2.0, None).unwrap();
        assert_eq!(log.value(ProgressMetric::Water), Some(2.0));
        assert_eq!(log.value(ProgressMetric::Sleep), None);

        let log = HealthLog::record(&conn, 1, date(1), ProgressMetric::Workout, 45.0, Some("Running")).unwrap();
        assert_eq!(log.workout_type.as_deref(), Some("Running"));
    }

    #[test]
    fn test_list_range_is_ordered_and_inclusive() {
        let conn = setup();
        for d in [5, 1, 3, 9] {
            HealthLog::record(&conn, 1, date(d), ProgressMetric::Weight, 80.0 - d as f64 * 0.1, None).unwrap();
        }
        let logs = HealthLog::list_range(&conn, 1, date(1), date(5)).unwrap();
        let days: Vec<_> = logs.iter().map(|l| l.date).collect();
        assert_eq!(days, vec![date(1), date(3), date(5)]);
    }

    #[test]
    fn test_metric_ranges() {
        assert!(ProgressMetric::Water.validate(10.0).is_ok());
        assert!(ProgressMetric::Water.validate(10.5).is_err());
        assert!(ProgressMetric::Weight.validate(29.0).is_err());
        assert!(ProgressMetric::Calories.validate(-1.0).is_err());
        assert!(ProgressMetric::Sleep.validate(f64::NAN).is_err());
        assert_eq!("Water".parse::<ProgressMetric>().unwrap(), ProgressMetric::Water);
        assert!("steps".parse::<ProgressMetric>().is_err());
    }
}

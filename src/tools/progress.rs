//! Progress MCP Tools
//!
//! Daily health logging and consumed-versus-goal summaries.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{HealthLog, ProgressMetric, User};
use crate::nutrition::NutritionGoals;

/// Goals used when a user has none stored
pub const DEFAULT_GOALS: NutritionGoals = NutritionGoals {
    daily_calories: 2000,
    daily_protein_grams: 50,
    daily_carbs_grams: 250,
    daily_fat_grams: 70,
};

/// Daily water goal in liters
pub const WATER_GOAL_LITERS: f64 = 2.5;

/// Longest range list_health_logs returns
pub const MAX_RANGE_DAYS: i64 = 366;

/// Response for log_progress
#[derive(Debug, Serialize)]
pub struct LogProgressResponse {
    pub metric: ProgressMetric,
    pub value: f64,
    pub unit: &'static str,
    pub log: HealthLog,
}

/// Consumed amount against its goal
#[derive(Debug, Serialize)]
pub struct Target {
    pub consumed: f64,
    pub goal: f64,
    pub remaining: f64,
    pub percent: f64,
}

impl Target {
    fn new(consumed: f64, goal: f64) -> Self {
        let percent = if goal > 0.0 {
            (consumed / goal * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            consumed,
            goal,
            remaining: (goal - consumed).max(0.0),
            percent,
        }
    }
}

/// Response for daily_progress
#[derive(Debug, Serialize)]
pub struct DailyProgress {
    pub user_id: i64,
    pub date: NaiveDate,
    pub calories: Target,
    pub protein: Target,
    pub carbs: Target,
    pub fat: Target,
    pub water: Target,
    /// Logged weight for the day, else the profile weight
    pub weight_kg: f64,
    pub weight_logged: bool,
    pub sleep_hours: Option<f64>,
    pub workout_minutes: Option<f64>,
    pub workout_type: Option<String>,
    pub using_default_goals: bool,
}

/// Response for list_health_logs
#[derive(Debug, Serialize)]
pub struct ListHealthLogsResponse {
    pub user_id: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub logs: Vec<HealthLog>,
    pub count: usize,
}

// ============================================================================
// Tools
// ============================================================================

/// Record one metric on a user's log for a date
pub fn log_progress(
    db: &Database,
    user_id: i64,
    metric: &str,
    value: f64,
    date: NaiveDate,
    workout_type: Option<&str>,
) -> Result<Option<LogProgressResponse>, String> {
    let metric: ProgressMetric = metric.parse().map_err(|e| format!("{}", e))?;
    metric.validate(value)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))?;
    if user.is_none() {
        return Ok(None);
    }

    let log = HealthLog::record(&conn, user_id, date, metric, value, workout_type)
        .map_err(|e| format!("Failed to record {}: {}", metric, e))?;

    tracing::info!(user_id, %metric, value, %date, "Logged progress");
    Ok(Some(LogProgressResponse {
        metric,
        value,
        unit: metric.unit(),
        log,
    }))
}

/// Consumed versus goal for a date
pub fn daily_progress(
    db: &Database,
    user_id: i64,
    date: NaiveDate,
) -> Result<Option<DailyProgress>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(user) = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))?
    else {
        return Ok(None);
    };

    let log = HealthLog::get_for_date(&conn, user_id, date)
        .map_err(|e| format!("Failed to get health log: {}", e))?;

    let stored = user.goals();
    let goals = stored.unwrap_or(DEFAULT_GOALS);
    let value = |metric: ProgressMetric| log.as_ref().and_then(|l| l.value(metric));
    let consumed = |metric: ProgressMetric| value(metric).unwrap_or(0.0);

    let logged_weight = value(ProgressMetric::Weight);

    Ok(Some(DailyProgress {
        user_id,
        date,
        calories: Target::new(consumed(ProgressMetric::Calories), goals.daily_calories as f64),
        protein: Target::new(consumed(ProgressMetric::Protein), goals.daily_protein_grams as f64),
        carbs: Target::new(consumed(ProgressMetric::Carbs), goals.daily_carbs_grams as f64),
        fat: Target::new(consumed(ProgressMetric::Fat), goals.daily_fat_grams as f64),
        water: Target::new(consumed(ProgressMetric::Water), WATER_GOAL_LITERS),
        weight_kg: logged_weight.unwrap_or(user.weight_kg),
        weight_logged: logged_weight.is_some(),
        sleep_hours: value(ProgressMetric::Sleep),
        workout_minutes: value(ProgressMetric::Workout),
        workout_type: log.as_ref().and_then(|l| l.workout_type.clone()),
        using_default_goals: stored.is_none(),
    }))
}

/// Logs in an inclusive date range
pub fn list_health_logs(
    db: &Database,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Option<ListHealthLogsResponse>, String> {
    if from > to {
        return Err(format!("Start date {} is after end date {}", from, to));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(format!("Date range cannot exceed {} days", MAX_RANGE_DAYS));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))?;
    if user.is_none() {
        return Ok(None);
    }

    let logs = HealthLog::list_range(&conn, user_id, from, to)
        .map_err(|e| format!("Failed to list health logs: {}", e))?;

    Ok(Some(ListHealthLogsResponse {
        user_id,
        from,
        to,
        count: logs.len(),
        logs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(with_goals: bool) -> Database {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Female', 165, 60)",
            [],
        )
        .unwrap();
        if with_goals {
            conn.execute(
                "UPDATE users SET daily_calories = 1800, daily_protein = 135, daily_carbs = 180, daily_fat = 60",
                [],
            )
            .unwrap();
        }
        drop(conn);
        db
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_log_progress_validates() {
        let db = setup(true);
        let err = log_progress(&db, 1, "steps", 1000.0, day(1), None).unwrap_err();
        assert!(err.contains("steps"));
        assert!(log_progress(&db, 1, "water", 12.0, day(1), None).is_err());
        assert!(log_progress(&db, 1, "weight", 20.0, day(1), None).is_err());
        assert!(log_progress(&db, 2, "water", 1.0, day(1), None).unwrap().is_none());

        let response = log_progress(&db, 1, "Water", 1.25, day(1), None).unwrap().unwrap();
        assert_eq!(response.metric, ProgressMetric::Water);
        assert_eq!(response.unit, "l");
        assert_eq!(response.log.water_intake, Some(1.25));
    }

    #[test]
    fn test_daily_progress_against_goals() {
        let db = setup(true);
        log_progress(&db, 1, "calories", 900.0, day(2), None).unwrap();
        log_progress(&db, 1, "water", 1.0, day(2), None).unwrap();
        log_progress(&db, 1, "sleep", 7.5, day(2), None).unwrap();

        let progress = daily_progress(&db, 1, day(2)).unwrap().unwrap();
        assert_eq!(progress.calories.goal, 1800.0);
        assert_eq!(progress.calories.percent, 50.0);
        assert_eq!(progress.calories.remaining, 900.0);
        assert_eq!(progress.water.goal, WATER_GOAL_LITERS);
        assert_eq!(progress.water.percent, 40.0);
        assert_eq!(progress.protein.consumed, 0.0);
        assert_eq!(progress.sleep_hours, Some(7.5));
        assert_eq!(progress.weight_kg, 60.0);
        assert!(!progress.weight_logged);
        assert!(!progress.using_default_goals);

        log_progress(&db, 1, "weight", 59.2, day(2), None).unwrap();
        let progress = daily_progress(&db, 1, day(2)).unwrap().unwrap();
        assert_eq!(progress.weight_kg, 59.2);
        assert!(progress.weight_logged);
    }

    #[test]
    fn test_daily_progress_defaults() {
        let db = setup(false);
        let progress = daily_progress(&db, 1, day(3)).unwrap().unwrap();
        assert!(progress.using_default_goals);
        assert_eq!(progress.calories.goal, 2000.0);
        assert_eq!(progress.protein.goal, 50.0);
        assert_eq!(progress.carbs.goal, 250.0);
        assert_eq!(progress.fat.goal, 70.0);
        assert_eq!(progress.sleep_hours, None);
        assert!(daily_progress(&db, 5, day(3)).unwrap().is_none());
    }

    #[test]
    fn test_list_health_logs_range() {
        let db = setup(true);
        for d in [1, 4, 8] {
            log_progress(&db, 1, "weight", 60.0, day(d), None).unwrap();
        }
        let response = list_health_logs(&db, 1, day(1), day(4)).unwrap().unwrap();
        assert_eq!(response.count, 2);
        assert!(list_health_logs(&db, 1, day(4), day(1)).is_err());
    }
}

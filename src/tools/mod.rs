//! MealGenius Tools module
//!
//! MCP tool implementations for MealGenius.

pub mod chat;
pub mod meal_plans;
pub mod progress;
pub mod recipes;
pub mod reports;
pub mod status;
pub mod users;

use chrono::NaiveDate;

/// Today's date on the local clock
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today
pub fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate, String> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", d)),
        None => Ok(today()),
    }
}

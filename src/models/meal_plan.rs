//! Meal plan model
//!
//! One plan per user per date, holding an ordered list of meals.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::columns::{closed_list, parse_text};
use super::RecipeMealType;
use crate::db::{DbError, DbResult};

closed_list! {
    /// Slot of a meal within a day's plan
    pub enum MealType ("meal type") {
        Breakfast => "Breakfast",
        Lunch => "Lunch",
        Dinner => "Dinner",
        Snack => "Snack",
    }
}

impl MealType {
    /// Recipe category served in this slot
    pub fn recipe_meal_type(&self) -> RecipeMealType {
        match self {
            MealType::Breakfast => RecipeMealType::Breakfast,
            MealType::Lunch => RecipeMealType::Lunch,
            MealType::Dinner => RecipeMealType::Dinner,
            MealType::Snack => RecipeMealType::Snack,
        }
    }
}

/// A meal slot within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub id: i64,
    pub position: u32,
    pub meal_type: MealType,
    pub recipe_id: i64,
    pub consumed: bool,
    pub consumed_at: Option<String>,
}

/// A user's plan for one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub meals: Vec<PlannedMeal>,
    pub created_at: String,
    pub updated_at: String,
}

impl PlannedMeal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            position: row.get("position")?,
            meal_type: parse_text(row, "meal_type")?,
            recipe_id: row.get("recipe_id")?,
            consumed: row.get::<_, i32>("consumed")? != 0,
            consumed_at: row.get("consumed_at")?,
        })
    }
}

impl MealPlan {
    /// Create a MealPlan from a database row, without its meals
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: parse_text(row, "date")?,
            meals: Vec::new(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn load_meals(mut self, conn: &Connection) -> DbResult<Self> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meal_plan_meals WHERE meal_plan_id = ?1 ORDER BY position",
        )?;
        self.meals = stmt
            .query_map([self.id], PlannedMeal::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    /// Get a plan by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_plans WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan.load_meals(conn)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user's plan for a date
    pub fn get_for_date(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_plans WHERE user_id = ?1 AND date = ?2")?;

        let result = stmt.query_row(params![user_id, date.to_string()], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan.load_meals(conn)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or replace a user's plan for a date.
    ///
    /// Meals are stored in the given order; the previous meals of that date
    /// are discarded.
    pub fn upsert(
        conn: &Connection,
        user_id: i64,
        date: NaiveDate,
        meals: &[(MealType, i64)],
    ) -> DbResult<Self> {
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO meal_plans (user_id, date) VALUES (?1, ?2)
            ON CONFLICT(user_id, date) DO UPDATE SET updated_at = datetime('now')
            "#,
            params![user_id, date.to_string()],
        )?;
        let plan_id: i64 = tx.query_row(
            "SELECT id FROM meal_plans WHERE user_id = ?1 AND date = ?2",
            params![user_id, date.to_string()],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM meal_plan_meals WHERE meal_plan_id = ?1", [plan_id])?;
        for (position, (meal_type, recipe_id)) in meals.iter().enumerate() {
            tx.execute(
                "INSERT INTO meal_plan_meals (meal_plan_id, position, meal_type, recipe_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![plan_id, position as i64, meal_type.as_str(), recipe_id],
            )?;
        }

        tx.commit()?;

        Self::get_by_id(conn, plan_id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Mark a meal consumed or not.
    ///
    /// Returns Ok(None) when the plan or the meal index does not exist.
    pub fn set_consumed(
        conn: &Connection,
        plan_id: i64,
        position: u32,
        consumed: bool,
    ) -> DbResult<Option<Self>> {
        let rows = conn.execute(
            r#"
            UPDATE meal_plan_meals SET
                consumed = ?1,
                consumed_at = CASE WHEN ?1 THEN datetime('now') ELSE NULL END
            WHERE meal_plan_id = ?2 AND position = ?3
            "#,
            params![consumed as i32, plan_id, position],
        )?;

        if rows == 0 {
            return Ok(None);
        }

        conn.execute(
            "UPDATE meal_plans SET updated_at = datetime('now') WHERE id = ?1",
            [plan_id],
        )?;
        Self::get_by_id(conn, plan_id)
    }
}

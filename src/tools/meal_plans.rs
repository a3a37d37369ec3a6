//! Meal Plan MCP Tools
//!
//! Daily plans built from the recipe catalog, with consumption tracking.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    DietaryTag, MealPlan, MealType, Nutrition, Recipe, RecipeFilter, RecipeOrder, User,
};

use super::recipes::RecipeSummary;

/// Candidates considered per meal slot when generating a plan
pub const CANDIDATES_PER_SLOT: i64 = 5;

/// A planned meal with its recipe
#[derive(Debug, Serialize)]
pub struct PlannedMealDetail {
    pub index: u32,
    pub meal_type: MealType,
    pub consumed: bool,
    pub consumed_at: Option<String>,
    pub recipe: Option<RecipeSummary>,
}

/// Full plan detail with nutrition totals
#[derive(Debug, Serialize)]
pub struct MealPlanDetail {
    pub id: Option<i64>,
    pub user_id: i64,
    pub date: NaiveDate,
    pub meals: Vec<PlannedMealDetail>,
    pub planned: Nutrition,
    pub consumed: Nutrition,
}

impl MealPlanDetail {
    fn empty(user_id: i64, date: NaiveDate) -> Self {
        Self {
            id: None,
            user_id,
            date,
            meals: Vec::new(),
            planned: Nutrition::zero(),
            consumed: Nutrition::zero(),
        }
    }
}

/// Attach recipes to a plan and total its nutrition
fn plan_detail(conn: &Connection, plan: MealPlan) -> Result<MealPlanDetail, String> {
    let mut meals = Vec::with_capacity(plan.meals.len());
    let mut planned = Nutrition::zero();
    let mut consumed = Nutrition::zero();

    for meal in plan.meals {
        let recipe = Recipe::get_by_id(conn, meal.recipe_id)
            .map_err(|e| format!("Failed to get recipe: {}", e))?;
        if let Some(ref recipe) = recipe {
            planned = planned + recipe.nutrition;
            if meal.consumed {
                consumed = consumed + recipe.nutrition;
            }
        }
        meals.push(PlannedMealDetail {
            index: meal.position,
            meal_type: meal.meal_type,
            consumed: meal.consumed,
            consumed_at: meal.consumed_at,
            recipe: recipe.map(RecipeSummary::from),
        });
    }

    Ok(MealPlanDetail {
        id: Some(plan.id),
        user_id: plan.user_id,
        date: plan.date,
        meals,
        planned,
        consumed,
    })
}

fn user_exists(conn: &Connection, user_id: i64) -> Result<bool, String> {
    User::get_by_id(conn, user_id)
        .map(|u| u.is_some())
        .map_err(|e| format!("Failed to get user: {}", e))
}

// ============================================================================
// Tools
// ============================================================================

/// Get a user's plan for a date
pub fn get_meal_plan(
    db: &Database,
    user_id: i64,
    date: NaiveDate,
) -> Result<Option<MealPlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if !user_exists(&conn, user_id)? {
        return Ok(None);
    }

    let plan = MealPlan::get_for_date(&conn, user_id, date)
        .map_err(|e| format!("Failed to get meal plan: {}", e))?;

    match plan {
        Some(plan) => plan_detail(&conn, plan).map(Some),
        None => Ok(Some(MealPlanDetail::empty(user_id, date))),
    }
}

/// Get today's plan, creating one from four random recipes when none exists.
///
/// With fewer than four recipes in the catalog an empty plan is returned.
pub fn get_today_plan<R: Rng + ?Sized>(
    db: &Database,
    rng: &mut R,
    user_id: i64,
    today: NaiveDate,
) -> Result<Option<MealPlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if !user_exists(&conn, user_id)? {
        return Ok(None);
    }

    let existing = MealPlan::get_for_date(&conn, user_id, today)
        .map_err(|e| format!("Failed to get meal plan: {}", e))?;
    if let Some(plan) = existing {
        return plan_detail(&conn, plan).map(Some);
    }

    let ids = Recipe::all_ids(&conn).map_err(|e| format!("Failed to list recipes: {}", e))?;
    if ids.len() < MealType::ALL.len() {
        tracing::debug!(user_id, recipes = ids.len(), "Not enough recipes for a default plan");
        return Ok(Some(MealPlanDetail::empty(user_id, today)));
    }

    let picked: Vec<i64> = ids.choose_multiple(rng, MealType::ALL.len()).copied().collect();
    let meals: Vec<(MealType, i64)> = MealType::ALL.iter().copied().zip(picked).collect();

    let plan = MealPlan::upsert(&conn, user_id, today, &meals)
        .map_err(|e| format!("Failed to create meal plan: {}", e))?;
    tracing::info!(user_id, plan_id = plan.id, "Created default meal plan");

    plan_detail(&conn, plan).map(Some)
}

/// Build a plan for a date from recipes matching the dietary preferences.
///
/// Without explicit preferences the user's stored ones apply. Each slot gets
/// a random pick among the first five matching recipes of its meal type;
/// slots without candidates are left out. Replaces any existing plan for
/// that date.
pub fn generate_meal_plan<R: Rng + ?Sized>(
    db: &Database,
    rng: &mut R,
    user_id: i64,
    date: NaiveDate,
    dietary_preferences: Option<&[DietaryTag]>,
) -> Result<Option<MealPlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(user) = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))?
    else {
        return Ok(None);
    };
    let preferences = dietary_preferences.unwrap_or(&user.dietary_preferences);

    let mut meals = Vec::new();
    for meal_type in MealType::ALL.iter().copied() {
        let filter = RecipeFilter {
            dietary_tags: preferences.to_vec(),
            meal_type: Some(meal_type.recipe_meal_type()),
            order: RecipeOrder::Inserted,
            limit: CANDIDATES_PER_SLOT,
            ..Default::default()
        };
        let candidates = Recipe::search(&conn, &filter)
            .map_err(|e| format!("Failed to search recipes: {}", e))?;

        match candidates.choose(rng) {
            Some(recipe) => meals.push((meal_type, recipe.id)),
            None => tracing::debug!(user_id, %meal_type, "No matching recipe for slot"),
        }
    }

    let plan = MealPlan::upsert(&conn, user_id, date, &meals)
        .map_err(|e| format!("Failed to save meal plan: {}", e))?;
    tracing::info!(user_id, plan_id = plan.id, meals = meals.len(), "Generated meal plan");

    plan_detail(&conn, plan).map(Some)
}

/// Mark a planned meal consumed or not
pub fn set_meal_consumed(
    db: &Database,
    user_id: i64,
    date: NaiveDate,
    index: u32,
    consumed: bool,
) -> Result<MealPlanDetail, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = MealPlan::get_for_date(&conn, user_id, date)
        .map_err(|e| format!("Failed to get meal plan: {}", e))?
        .ok_or_else(|| format!("No meal plan for user {} on {}", user_id, date))?;

    let updated = MealPlan::set_consumed(&conn, plan.id, index, consumed)
        .map_err(|e| format!("Failed to update meal: {}", e))?
        .ok_or_else(|| format!("Meal index {} not found in plan for {}", index, date))?;

    plan_detail(&conn, updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::recipes::seed_recipes;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        seed_recipes(&db).unwrap();
        let conn = db.get_conn().unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Female', 165, 60)",
            [],
        )
        .unwrap();
        drop(conn);
        db
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()
    }

    #[test]
    fn test_today_plan_created_once() {
        let db = setup();
        let mut rng = StdRng::seed_from_u64(1);

        let first = get_today_plan(&db, &mut rng, 1, day()).unwrap().unwrap();
        assert_eq!(first.meals.len(), 4);
        let types: Vec<MealType> = first.meals.iter().map(|m| m.meal_type).collect();
        assert_eq!(types, MealType::ALL.to_vec());
        assert!(first.planned.calories > 0.0);
        assert_eq!(first.consumed, Nutrition::zero());

        let second = get_today_plan(&db, &mut rng, 1, day()).unwrap().unwrap();
        assert_eq!(second.id, first.id);
        let ids = |p: &MealPlanDetail| -> Vec<i64> {
            p.meals.iter().filter_map(|m| m.recipe.as_ref().map(|r| r.id)).collect()
        };
        assert_eq!(ids(&second), ids(&first));

        assert!(get_today_plan(&db, &mut rng, 99, day()).unwrap().is_none());
    }

    #[test]
    fn test_today_plan_empty_without_enough_recipes() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Female', 165, 60)",
            [],
        )
        .unwrap();
        drop(conn);

        let mut rng = StdRng::seed_from_u64(1);
        let plan = get_today_plan(&db, &mut rng, 1, day()).unwrap().unwrap();
        assert!(plan.id.is_none());
        assert!(plan.meals.is_empty());
    }

    #[test]
    fn test_generate_respects_preferences_and_replaces() {
        let db = setup();
        let mut rng = StdRng::seed_from_u64(3);

        let plan = generate_meal_plan(&db, &mut rng, 1, day(), Some(&[DietaryTag::Vegan][..]))
            .unwrap()
            .unwrap();
        assert!(!plan.meals.is_empty());
        for meal in &plan.meals {
            let recipe = meal.recipe.as_ref().unwrap();
            assert!(recipe.dietary_tags.contains(&DietaryTag::Vegan));
            assert_eq!(recipe.meal_type, meal.meal_type.recipe_meal_type());
        }

        let again = generate_meal_plan(&db, &mut rng, 1, day(), None).unwrap().unwrap();
        assert_eq!(again.id, plan.id);
        assert_eq!(again.meals.len(), 4);
    }

    #[test]
    fn test_set_consumed() {
        let db = setup();
        let mut rng = StdRng::seed_from_u64(5);
        get_today_plan(&db, &mut rng, 1, day()).unwrap();

        let plan = set_meal_consumed(&db, 1, day(), 2, true).unwrap();
        assert!(plan.meals[2].consumed);
        assert!(plan.meals[2].consumed_at.is_some());
        let dinner = plan.meals[2].recipe.as_ref().unwrap().calories;
        assert_eq!(plan.consumed.calories, dinner);

        let plan = set_meal_consumed(&db, 1, day(), 2, false).unwrap();
        assert!(plan.meals[2].consumed_at.is_none());

        assert!(set_meal_consumed(&db, 1, day(), 9, true).is_err());
        let other_day = NaiveDate::from_ymd_opt(2025, 4, 3).unwrap();
        assert!(set_meal_consumed(&db, 1, other_day, 0, true).is_err());
    }

    #[test]
    fn test_get_meal_plan_for_missing_date_is_empty() {
        let db = setup();
        let plan = get_meal_plan(&db, 1, day()).unwrap().unwrap();
        assert!(plan.meals.is_empty());
        assert!(get_meal_plan(&db, 7, day()).unwrap().is_none());
    }
}

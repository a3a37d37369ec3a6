//! Recipe MCP Tools
//!
//! Tools for the recipe catalog: CRUD, filtered lookups, AI generation and
//! loading the bundled catalog.

use rand::Rng;
use serde::Serialize;

use crate::assistant::{self, GeneratedRecipe, RecipeRequest, TextGenerator};
use crate::db::Database;
use crate::models::{
    Cuisine, DietaryTag, Recipe, RecipeCreate, RecipeFilter, RecipeMealType, RecipeOrder,
};
use crate::seed::{self, SeedSummary};

pub const SEARCH_LIMIT: i64 = 50;
pub const BY_DIET_DEFAULT_LIMIT: i64 = 20;
pub const QUICK_MAX_MINUTES: u32 = 30;
pub const LOW_CALORIE_MAX: f64 = 300.0;
pub const SHORTLIST_LIMIT: i64 = 30;

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub meal_type: RecipeMealType,
    pub cuisine: Cuisine,
    pub calories: f64,
    pub protein: f64,
    pub total_time: u32,
    pub dietary_tags: Vec<DietaryTag>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            total_time: recipe.total_time(),
            name: recipe.name,
            meal_type: recipe.meal_type,
            cuisine: recipe.cuisine,
            calories: recipe.nutrition.calories,
            protein: recipe.nutrition.protein,
            dietary_tags: recipe.dietary_tags,
        }
    }
}

/// Response for the listing tools
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub count: usize,
    pub limit: i64,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct RecipeDeleteBlockedResponse {
    pub error: String,
    pub plan_usage_count: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for generate_recipe
#[derive(Debug, Serialize)]
pub struct GenerateRecipeResponse {
    #[serde(flatten)]
    pub generated: GeneratedRecipe,
    /// Set when the recipe was stored in the catalog
    pub saved_id: Option<i64>,
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    data.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with ingredients, instructions and tags
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<Recipe>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Recipe::get_by_id(&conn, id).map_err(|e| format!("Failed to get recipe: {}", e))
}

/// Delete a recipe (blocked while a meal plan uses it)
pub fn delete_recipe(
    db: &Database,
    id: i64,
) -> Result<Result<RecipeDeleteSuccessResponse, RecipeDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", id));
    }

    let plan_usage_count = Recipe::get_plan_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check meal plan usage: {}", e))?;

    if plan_usage_count > 0 {
        return Ok(Err(RecipeDeleteBlockedResponse {
            error: format!(
                "Cannot delete recipe: used in {} meal plan slot(s)",
                plan_usage_count
            ),
            plan_usage_count,
        }));
    }

    Recipe::delete(&conn, id).map_err(|e| format!("Failed to delete recipe: {}", e))?;

    Ok(Ok(RecipeDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

fn list(db: &Database, filter: &RecipeFilter) -> Result<ListRecipesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::search(&conn, filter)
        .map_err(|e| format!("Failed to search recipes: {}", e))?;

    let recipes: Vec<RecipeSummary> = recipes.into_iter().map(RecipeSummary::from).collect();
    Ok(ListRecipesResponse {
        count: recipes.len(),
        recipes,
        limit: filter.limit,
    })
}

/// Search recipes, lowest calories first
pub fn search_recipes(db: &Database, mut filter: RecipeFilter) -> Result<ListRecipesResponse, String> {
    filter.limit = if filter.limit <= 0 {
        SEARCH_LIMIT
    } else {
        filter.limit.min(SEARCH_LIMIT)
    };
    filter.order = RecipeOrder::Calories;
    list(db, &filter)
}

/// Recipes carrying a dietary tag
pub fn recipes_by_diet(
    db: &Database,
    tag: DietaryTag,
    limit: Option<i64>,
) -> Result<ListRecipesResponse, String> {
    let filter = RecipeFilter {
        dietary_tags: vec![tag],
        limit: limit.unwrap_or(BY_DIET_DEFAULT_LIMIT).min(200).max(1),
        ..Default::default()
    };
    list(db, &filter)
}

/// Recipes ready in half an hour or less
pub fn quick_recipes(db: &Database) -> Result<ListRecipesResponse, String> {
    let filter = RecipeFilter {
        max_total_time: Some(QUICK_MAX_MINUTES),
        limit: SHORTLIST_LIMIT,
        ..Default::default()
    };
    list(db, &filter)
}

/// Recipes of at most 300 kcal
pub fn low_calorie_recipes(db: &Database) -> Result<ListRecipesResponse, String> {
    let filter = RecipeFilter {
        max_calories: Some(LOW_CALORIE_MAX),
        limit: SHORTLIST_LIMIT,
        ..Default::default()
    };
    list(db, &filter)
}

/// Generate a recipe and optionally save it.
///
/// Blocks on the model call; async callers run this on a blocking thread.
pub fn generate_recipe<R: Rng + ?Sized>(
    db: &Database,
    generator: Option<&dyn TextGenerator>,
    rng: &mut R,
    request: &RecipeRequest,
    save: bool,
    created_by: Option<i64>,
) -> Result<GenerateRecipeResponse, String> {
    if request.dish.trim().is_empty() {
        return Err("Dish name is required".to_string());
    }
    if request.servings == 0 {
        return Err("Servings must be at least 1".to_string());
    }

    let mut generated = assistant::generate_recipe(generator, rng, request);
    generated.recipe.created_by = created_by;

    let saved_id = if save {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let recipe = Recipe::create(&conn, &generated.recipe)
            .map_err(|e| format!("Failed to save recipe: {}", e))?;
        tracing::info!(recipe_id = recipe.id, source = ?generated.source, "Saved generated recipe");
        Some(recipe.id)
    } else {
        None
    };

    Ok(GenerateRecipeResponse { generated, saved_id })
}

/// Load the bundled catalog
pub fn seed_recipes(db: &Database) -> Result<SeedSummary, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    seed::seed_recipes(&conn).map_err(|e| format!("Failed to seed recipes: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Source;
    use crate::models::{MealPlan, MealType};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded() -> Database {
        let db = Database::in_memory().unwrap();
        seed_recipes(&db).unwrap();
        db
    }

    #[test]
    fn test_search_is_sorted_and_capped() {
        let db = seeded();
        let response = search_recipes(
            &db,
            RecipeFilter {
                limit: 500,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(response.limit, SEARCH_LIMIT);
        assert!(response.count <= SEARCH_LIMIT as usize);
        let calories: Vec<f64> = response.recipes.iter().map(|r| r.calories).collect();
        assert!(calories.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_shortlists_respect_bounds() {
        let db = seeded();
        let quick = quick_recipes(&db).unwrap();
        assert!(quick.count > 0);
        assert!(quick.recipes.iter().all(|r| r.total_time <= QUICK_MAX_MINUTES));

        let light = low_calorie_recipes(&db).unwrap();
        assert!(light.count > 0);
        assert!(light.recipes.iter().all(|r| r.calories <= LOW_CALORIE_MAX));

        let vegan = recipes_by_diet(&db, DietaryTag::Vegan, None).unwrap();
        assert!(vegan.recipes.iter().all(|r| r.dietary_tags.contains(&DietaryTag::Vegan)));
    }

    #[test]
    fn test_delete_blocked_while_planned() {
        let db = seeded();
        let conn = db.get_conn().unwrap();
        conn.execute(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Male', 180, 80)",
            [],
        )
        .unwrap();
        let recipe_id = Recipe::all_ids(&conn).unwrap()[0];
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        MealPlan::upsert(&conn, 1, date, &[(MealType::Lunch, recipe_id)]).unwrap();
        drop(conn);

        let blocked = delete_recipe(&db, recipe_id).unwrap().unwrap_err();
        assert_eq!(blocked.plan_usage_count, 1);
        assert!(delete_recipe(&db, 99_999).is_err());
    }

    #[test]
    fn test_create_get_delete() {
        let db = Database::in_memory().unwrap();
        let data: RecipeCreate = serde_json::from_value(serde_json::json!({
            "name": "Overnight Oats",
            "description": "Oats soaked in milk",
            "prep_time": 5,
            "cook_time": 0,
            "servings": 1,
            "calories": 320.0,
            "protein": 12.0,
            "carbs": 50.0,
            "fat": 8.0,
            "meal_type": "Breakfast",
            "dietary_tags": ["Vegetarian"]
        }))
        .unwrap();
        let created = create_recipe(&db, data).unwrap();

        let recipe = get_recipe(&db, created.id).unwrap().unwrap();
        assert_eq!(recipe.cuisine, Cuisine::Other);
        assert_eq!(recipe.dietary_tags, vec![DietaryTag::Vegetarian]);

        assert!(delete_recipe(&db, created.id).unwrap().is_ok());
        assert!(get_recipe(&db, created.id).unwrap().is_none());
    }

    #[test]
    fn test_generate_without_key_saves_mock() {
        let db = Database::in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let request = RecipeRequest {
            dish: "Lentil Soup".to_string(),
            dietary_preferences: vec![DietaryTag::Vegan],
            servings: 2,
        };

        let response = generate_recipe(&db, None, &mut rng, &request, true, None).unwrap();
        assert_eq!(response.generated.source, Source::Mock);
        let saved = get_recipe(&db, response.saved_id.unwrap()).unwrap().unwrap();
        assert!(saved.ai_generated);
        assert!(saved.name.contains("Lentil Soup"));

        let unsaved = generate_recipe(&db, None, &mut rng, &request, false, None).unwrap();
        assert!(unsaved.saved_id.is_none());

        let empty = RecipeRequest {
            dish: "  ".to_string(),
            ..request
        };
        assert!(generate_recipe(&db, None, &mut rng, &empty, false, None).is_err());
    }
}

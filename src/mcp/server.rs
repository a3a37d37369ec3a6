//! MealGenius MCP Server Implementation
//!
//! Implements the MCP server with all MealGenius tools.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::assistant::{RecipeRequest, TextGenerator};
use crate::config::Config;
use crate::db::Database;
use crate::models::{
    DietaryTag, Ingredient, Nutrition, RecipeCreate, RecipeFilter, UserCreate, UserUpdate,
};
use crate::nutrition::{BodyProfile, GoalError};
use crate::tools::status::StatusTracker;
use crate::tools::{chat, meal_plans, parse_date_or_today, progress, recipes, reports, today, users};

/// MealGenius MCP Service
#[derive(Clone)]
pub struct MealGeniusService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    generator: Option<Arc<dyn TextGenerator>>,
    report_dir: PathBuf,
    tool_router: ToolRouter<MealGeniusService>,
}

impl MealGeniusService {
    /// `generator` is None when no Gemini key is configured
    pub fn new(config: &Config, database: Database, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let model = generator.as_ref().map(|_| config.gemini_model.clone());
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.database_path.clone(), model))),
            database,
            generator,
            report_dir: config.report_dir.clone(),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn to_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(kind: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        kind, id
    ))]))
}

fn found_or<T: Serialize>(value: Option<T>, kind: &str, id: i64) -> Result<CallToolResult, McpError> {
    match value {
        Some(v) => to_result(&v),
        None => not_found(kind, id),
    }
}

fn parse_arg<T: FromStr<Err = GoalError>>(value: &str) -> Result<T, McpError> {
    value.parse().map_err(|e: GoalError| McpError::invalid_params(e.to_string(), None))
}

fn parse_opt<T: FromStr<Err = GoalError>>(value: Option<&str>) -> Result<Option<T>, McpError> {
    value.map(parse_arg).transpose()
}

fn parse_tags(values: &[String]) -> Result<Vec<DietaryTag>, McpError> {
    values.iter().map(|v| parse_arg(v)).collect()
}

fn parse_date(value: Option<&str>) -> Result<chrono::NaiveDate, McpError> {
    parse_date_or_today(value).map_err(|e| McpError::invalid_params(e, None))
}

fn tool_error(e: String) -> McpError {
    McpError::internal_error(e, None)
}

// ============================================================================
// User Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RegisterUserParams {
    pub name: String,
    pub email: String,
    pub age: u32,
    /// Male, Female or Other
    pub sex: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    /// Sedentary, Lightly Active, Moderately Active, Very Active, Extremely Active
    pub activity_level: Option<String>,
    /// Lose Weight, Gain Muscle, Maintain Weight, Improve Health
    pub goal: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListUsersParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUserProfileParams {
    pub id: i64,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub health_conditions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetGoalsParams {
    pub id: i64,
    /// Changing the goal recomputes the targets before explicit values apply
    pub goal: Option<String>,
    pub daily_calories: Option<u32>,
    pub daily_protein: Option<u32>,
    pub daily_carbs: Option<u32>,
    pub daily_fat: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateGoalsParams {
    pub sex: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParams {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientParams>,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Minutes
    pub prep_time: u32,
    /// Minutes
    pub cook_time: u32,
    pub servings: u32,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    pub cuisine: Option<String>,
    /// Breakfast, Lunch, Dinner, Snack, Dessert, Beverage or Drink
    pub meal_type: String,
    /// Easy, Medium or Hard
    pub difficulty: Option<String>,
    pub image: Option<String>,
    pub created_by: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRecipesParams {
    /// Matched against name, description and tags
    pub query: Option<String>,
    /// Recipes with any of these tags match
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    pub meal_type: Option<String>,
    pub cuisine: Option<String>,
    pub max_calories: Option<f64>,
    /// Prep plus cook minutes
    pub max_total_time: Option<u32>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipesByDietParams {
    pub tag: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateRecipeParams {
    pub dish: String,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default = "default_servings")]
    pub servings: u32,
    /// Store the recipe in the catalog
    #[serde(default)]
    pub save: bool,
    pub user_id: Option<i64>,
}

fn default_servings() -> u32 { 2 }

// ============================================================================
// Meal Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TodayPlanParams {
    pub user_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealPlanParams {
    pub user_id: i64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateMealPlanParams {
    pub user_id: i64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// Defaults to the user's stored preferences
    pub dietary_preferences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetMealConsumedParams {
    pub user_id: i64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// Position of the meal in the plan, starting at 0
    pub index: u32,
    #[serde(default = "default_true")]
    pub consumed: bool,
}

fn default_true() -> bool { true }

// ============================================================================
// Progress Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogProgressParams {
    pub user_id: i64,
    /// calories, protein, carbs, fat, water, weight, sleep or workout
    pub metric: String,
    pub value: f64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// Only used with the workout metric
    pub workout_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DailyProgressParams {
    pub user_id: i64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    pub user_id: i64,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD, defaults to today
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateReportParams {
    pub user_id: i64,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD, defaults to today
    pub end_date: Option<String>,
    /// Defaults to a file in the report directory
    pub output_path: Option<String>,
}

// ============================================================================
// Chat Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChatParams {
    pub message: String,
    /// Personalizes the answer and stores the exchange
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChatHistoryParams {
    pub user_id: i64,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl MealGeniusService {
    // --- Status ---

    #[tool(description = "Get the current status of the MealGenius service including build info, database status, AI mode and process information")]
    async fn mealgenius_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        to_result(&status)
    }

    #[tool(description = "Get the workflow guide for MealGenius tools. Call this when starting a session or when unsure how to use the tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Users ---

    #[tool(description = "Register a user. Daily calorie and macro goals are computed from the body metrics, activity level and goal.")]
    fn register_user(&self, Parameters(p): Parameters<RegisterUserParams>) -> Result<CallToolResult, McpError> {
        let data = UserCreate {
            name: p.name,
            email: p.email,
            age: p.age,
            sex: parse_arg(&p.sex)?,
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            activity_level: parse_opt(p.activity_level.as_deref())?.unwrap_or_default(),
            goal: parse_opt(p.goal.as_deref())?.unwrap_or_default(),
            dietary_preferences: parse_tags(&p.dietary_preferences)?,
            allergies: p.allergies,
            health_conditions: p.health_conditions,
        };
        let result = users::register_user(&self.database, data).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Get a user's profile and daily goals")]
    fn get_user(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = users::get_user(&self.database, p.id).map_err(tool_error)?;
        found_or(result, "User", p.id)
    }

    #[tool(description = "List users with pagination")]
    fn list_users(&self, Parameters(p): Parameters<ListUsersParams>) -> Result<CallToolResult, McpError> {
        let result = users::list_users(&self.database, p.limit, p.offset).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Update profile fields. Goals are recomputed when age, sex, height, weight, activity level or goal changes.")]
    fn update_user_profile(&self, Parameters(p): Parameters<UpdateUserProfileParams>) -> Result<CallToolResult, McpError> {
        let data = UserUpdate {
            name: p.name,
            age: p.age,
            sex: parse_opt(p.sex.as_deref())?,
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            activity_level: parse_opt(p.activity_level.as_deref())?,
            goal: parse_opt(p.goal.as_deref())?,
            dietary_preferences: p.dietary_preferences.as_deref().map(parse_tags).transpose()?,
            allergies: p.allergies,
            health_conditions: p.health_conditions,
        };
        let result = users::update_user_profile(&self.database, p.id, data).map_err(tool_error)?;
        found_or(result, "User", p.id)
    }

    #[tool(description = "Set daily goals explicitly. A calorie value re-derives the macros; explicit macro values win. Changing the goal recomputes the targets first.")]
    fn set_goals(&self, Parameters(p): Parameters<SetGoalsParams>) -> Result<CallToolResult, McpError> {
        let overrides = users::GoalOverrides {
            goal: parse_opt(p.goal.as_deref())?,
            daily_calories: p.daily_calories,
            daily_protein: p.daily_protein,
            daily_carbs: p.daily_carbs,
            daily_fat: p.daily_fat,
        };
        let result = users::set_goals(&self.database, p.id, overrides).map_err(tool_error)?;
        found_or(result, "User", p.id)
    }

    #[tool(description = "Recompute and store a user's goals from their profile, discarding explicit overrides")]
    fn recalculate_goals(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = users::recalculate_goals(&self.database, p.id).map_err(tool_error)?;
        found_or(result, "User", p.id)
    }

    #[tool(description = "Show how a user's goals are derived: BMR, activity multiplier, maintenance calories, goal adjustment and macro split")]
    fn explain_goals(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = users::explain_goals(&self.database, p.id).map_err(tool_error)?;
        found_or(result, "User", p.id)
    }

    #[tool(description = "Compute daily goals for a body profile without creating a user")]
    fn calculate_goals(&self, Parameters(p): Parameters<CalculateGoalsParams>) -> Result<CallToolResult, McpError> {
        let profile = BodyProfile {
            sex: parse_arg(&p.sex)?,
            weight_kg: p.weight_kg,
            height_cm: p.height_cm,
            age_years: p.age,
            activity_level: parse_opt(p.activity_level.as_deref())?.unwrap_or_default(),
            goal: parse_opt(p.goal.as_deref())?.unwrap_or_default(),
        };
        let result = users::calculate_goals(&profile).map_err(|e| McpError::invalid_params(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Delete a user with their meal plans, health logs and chat history")]
    fn delete_user(&self, Parameters(p): Parameters<UserIdParams>) -> Result<CallToolResult, McpError> {
        let result = users::delete_user(&self.database, p.id).map_err(tool_error)?;
        found_or(result, "User", p.id)
    }

    // --- Recipes ---

    #[tool(description = "Add a recipe to the catalog")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            description: p.description,
            ingredients: p
                .ingredients
                .into_iter()
                .map(|i| Ingredient { name: i.name, quantity: i.quantity, unit: i.unit })
                .collect(),
            instructions: p.instructions,
            prep_time: p.prep_time,
            cook_time: p.cook_time,
            servings: p.servings,
            nutrition: Nutrition { calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat },
            dietary_tags: parse_tags(&p.dietary_tags)?,
            cuisine: parse_opt(p.cuisine.as_deref())?.unwrap_or_default(),
            meal_type: parse_arg(&p.meal_type)?,
            difficulty: parse_opt(p.difficulty.as_deref())?.unwrap_or_default(),
            image: p.image.unwrap_or_default(),
            created_by: p.created_by,
            ai_generated: false,
            original_request: None,
            tags: p.tags,
        };
        let result = recipes::create_recipe(&self.database, data).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Get a recipe with ingredients, instructions, nutrition and tags")]
    fn get_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(tool_error)?;
        found_or(result, "Recipe", p.id)
    }

    #[tool(description = "Delete a recipe. Refused while a meal plan uses it.")]
    fn delete_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(tool_error)?;
        match result {
            Ok(success) => to_result(&success),
            Err(blocked) => to_result(&blocked),
        }
    }

    #[tool(description = "Search recipes by text, dietary tags (any of), meal type, cuisine, max calories and max total time. Sorted by calories, at most 50 results.")]
    fn search_recipes(&self, Parameters(p): Parameters<SearchRecipesParams>) -> Result<CallToolResult, McpError> {
        let filter = RecipeFilter {
            query: p.query,
            dietary_tags: parse_tags(&p.dietary_tags)?,
            meal_type: parse_opt(p.meal_type.as_deref())?,
            cuisine: parse_opt(p.cuisine.as_deref())?,
            max_calories: p.max_calories,
            max_total_time: p.max_total_time,
            limit: p.limit.unwrap_or(recipes::SEARCH_LIMIT),
            ..Default::default()
        };
        let result = recipes::search_recipes(&self.database, filter).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "List recipes carrying a dietary tag (default limit 20)")]
    fn recipes_by_diet(&self, Parameters(p): Parameters<RecipesByDietParams>) -> Result<CallToolResult, McpError> {
        let tag = parse_arg(&p.tag)?;
        let result = recipes::recipes_by_diet(&self.database, tag, p.limit).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "List recipes ready in 30 minutes or less")]
    fn quick_recipes(&self) -> Result<CallToolResult, McpError> {
        let result = recipes::quick_recipes(&self.database).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "List recipes of 300 kcal or less")]
    fn low_calorie_recipes(&self) -> Result<CallToolResult, McpError> {
        let result = recipes::low_calorie_recipes(&self.database).map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Generate a recipe with Gemini from a dish name. Falls back to a template recipe when no API key is set or the call fails. Set save=true to add it to the catalog.")]
    async fn generate_recipe(&self, Parameters(p): Parameters<GenerateRecipeParams>) -> Result<CallToolResult, McpError> {
        let request = RecipeRequest {
            dish: p.dish,
            dietary_preferences: parse_tags(&p.dietary_preferences)?,
            servings: p.servings,
        };
        let database = self.database.clone();
        let generator = self.generator.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut rng = rand::thread_rng();
            recipes::generate_recipe(&database, generator.as_deref(), &mut rng, &request, p.save, p.user_id)
        })
        .await
        .map_err(|e| McpError::internal_error(format!("Recipe generation task failed: {}", e), None))?
        .map_err(tool_error)?;
        to_result(&result)
    }

    #[tool(description = "Load the bundled recipe catalog, replacing recipes no meal plan uses")]
    fn seed_recipes(&self) -> Result<CallToolResult, McpError> {
        let result = recipes::seed_recipes(&self.database).map_err(tool_error)?;
        to_result(&result)
    }

    // --- Meal Plans ---

    #[tool(description = "Get today's meal plan. Creates one with four random recipes (Breakfast, Lunch, Dinner, Snack) when none exists.")]
    fn get_today_plan(&self, Parameters(p): Parameters<TodayPlanParams>) -> Result<CallToolResult, McpError> {
        let mut rng = rand::thread_rng();
        let result = meal_plans::get_today_plan(&self.database, &mut rng, p.user_id, today()).map_err(tool_error)?;
        found_or(result, "User", p.user_id)
    }

    #[tool(description = "Get a user's meal plan for a date with recipe summaries and planned and consumed nutrition")]
    fn get_meal_plan(&self, Parameters(p): Parameters<MealPlanParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date(p.date.as_deref())?;
        let result = meal_plans::get_meal_plan(&self.database, p.user_id, date).map_err(tool_error)?;
        found_or(result, "User", p.user_id)
    }

    #[tool(description = "Generate a meal plan for a date from recipes matching dietary preferences, replacing any existing plan")]
    fn generate_meal_plan(&self, Parameters(p): Parameters<GenerateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date(p.date.as_deref())?;
        let preferences = p.dietary_preferences.as_deref().map(parse_tags).transpose()?;
        let mut rng = rand::thread_rng();
        let result = meal_plans::generate_meal_plan(&self.database, &mut rng, p.user_id, date, preferences.as_deref())
            .map_err(tool_error)?;
        found_or(result, "User", p.user_id)
    }

    #[tool(description = "Mark a planned meal consumed (or not) by its index in the day's plan")]
    fn set_meal_consumed(&self, Parameters(p): Parameters<SetMealConsumedParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date(p.date.as_deref())?;
        let result = meal_plans::set_meal_consumed(&self.database, p.user_id, date, p.index, p.consumed)
            .map_err(tool_error)?;
        to_result(&result)
    }

    // --- Progress ---

    #[tool(description = "Log a daily value: calories, protein, carbs, fat (consumed), water (l), weight (kg), sleep (h) or workout (min). Replaces an earlier value of the same metric for that date.")]
    fn log_progress(&self, Parameters(p): Parameters<LogProgressParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date(p.date.as_deref())?;
        let result = progress::log_progress(&self.database, p.user_id, &p.metric, p.value, date, p.workout_type.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        found_or(result, "User", p.user_id)
    }

    #[tool(description = "Compare a day's logged intake, water, weight and sleep with the user's goals")]
    fn daily_progress(&self, Parameters(p): Parameters<DailyProgressParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date(p.date.as_deref())?;
        let result = progress::daily_progress(&self.database, p.user_id, date).map_err(tool_error)?;
        found_or(result, "User", p.user_id)
    }

    #[tool(description = "List a user's health logs in a date range")]
    fn list_health_logs(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let from = parse_date(Some(p.start_date.as_str()))?;
        let to = parse_date(p.end_date.as_deref())?;
        let result = progress::list_health_logs(&self.database, p.user_id, from, to)
            .map_err(|e| McpError::invalid_params(e, None))?;
        found_or(result, "User", p.user_id)
    }

    #[tool(description = "Generate a PDF progress report with a daily log table and weight and calorie trend charts")]
    fn generate_progress_report(&self, Parameters(p): Parameters<GenerateReportParams>) -> Result<CallToolResult, McpError> {
        let from = parse_date(Some(p.start_date.as_str()))?;
        let to = parse_date(p.end_date.as_deref())?;
        let result = reports::generate_progress_report(&self.database, &self.report_dir, p.user_id, from, to, p.output_path.as_deref())
            .map_err(tool_error)?;
        found_or(result, "User", p.user_id)
    }

    // --- Chat ---

    #[tool(description = "Ask the nutrition assistant a question. With user_id the answer uses the user's preferences, conditions and goal, and the exchange is stored.")]
    async fn chat(&self, Parameters(p): Parameters<ChatParams>) -> Result<CallToolResult, McpError> {
        let database = self.database.clone();
        let generator = self.generator.clone();
        let user_id = p.user_id;

        let result = tokio::task::spawn_blocking(move || {
            chat::chat(&database, generator.as_deref(), user_id, &p.message)
        })
        .await
        .map_err(|e| McpError::internal_error(format!("Chat task failed: {}", e), None))?
        .map_err(|e| McpError::invalid_params(e, None))?;

        match (result, user_id) {
            (Some(response), _) => to_result(&response),
            (None, Some(id)) => not_found("User", id),
            (None, None) => Err(McpError::internal_error("Chat produced no reply", None)),
        }
    }

    #[tool(description = "Get a user's last 50 chat exchanges, oldest first")]
    fn chat_history(&self, Parameters(p): Parameters<ChatHistoryParams>) -> Result<CallToolResult, McpError> {
        let result = chat::chat_history(&self.database, p.user_id).map_err(tool_error)?;
        found_or(result, "User", p.user_id)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MealGeniusService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mealgenius".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("MealGenius".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MealGenius - Diet planning and nutrition tracking. \
                 IMPORTANT: Call usage_instructions at the start of a session. \
                 Users: register_user/get_user/list_users/update_user_profile/delete_user, \
                 set_goals/recalculate_goals/explain_goals, calculate_goals (preview). \
                 Recipes: create/get/delete_recipe, search_recipes, recipes_by_diet, quick_recipes, \
                 low_calorie_recipes, generate_recipe (AI), seed_recipes. \
                 Meal plans: get_today_plan, get_meal_plan, generate_meal_plan, set_meal_consumed. \
                 Progress: log_progress, daily_progress, list_health_logs, generate_progress_report. \
                 Chat: chat, chat_history. Status: mealgenius_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeMealType;
    use crate::nutrition::Sex;
    use rmcp::model::RawContent;

    fn service() -> MealGeniusService {
        let config = Config {
            database_path: PathBuf::from(":memory:"),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".into(),
            report_dir: std::env::temp_dir(),
        };
        MealGeniusService::new(&config, Database::in_memory().unwrap(), None)
    }

    fn json(result: CallToolResult) -> serde_json::Value {
        match &result.content[0].raw {
            RawContent::Text(text) => serde_json::from_str(&text.text).unwrap(),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    fn register(service: &MealGeniusService) -> i64 {
        let params = RegisterUserParams {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            age: 30,
            sex: "male".into(),
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: Some("moderately active".into()),
            goal: None,
            dietary_preferences: vec!["Vegan".into()],
            allergies: Vec::new(),
            health_conditions: Vec::new(),
        };
        let user = json(service.register_user(Parameters(params)).unwrap());
        user["id"].as_i64().unwrap()
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_arg::<Sex>("Female").unwrap(), Sex::Female);
        assert!(parse_arg::<Sex>("robot").is_err());
        assert_eq!(parse_opt::<RecipeMealType>(None).unwrap(), None);
        assert_eq!(
            parse_tags(&["vegan".to_string(), "Gluten-Free".to_string()]).unwrap(),
            vec![DietaryTag::Vegan, DietaryTag::GlutenFree]
        );
        assert!(parse_date(Some("2025-13-01")).is_err());
    }

    #[test]
    fn test_register_and_get_user() {
        let service = service();
        let id = register(&service);

        let user = json(service.get_user(Parameters(UserIdParams { id })).unwrap());
        assert_eq!(user["daily_calories"], 2759);

        let missing = json(service.get_user(Parameters(UserIdParams { id: 404 })).unwrap());
        assert_eq!(missing["error"], "User not found");
        assert_eq!(missing["id"], 404);
    }

    #[test]
    fn test_invalid_enum_is_invalid_params() {
        let service = service();
        let params = CalculateGoalsParams {
            sex: "unknown".into(),
            weight_kg: 70.0,
            height_cm: 170.0,
            age: 30,
            activity_level: None,
            goal: None,
        };
        assert!(service.calculate_goals(Parameters(params)).is_err());
    }

    #[test]
    fn test_plan_flow() {
        let service = service();
        let id = register(&service);
        service.seed_recipes().unwrap();

        let plan = json(service.get_today_plan(Parameters(TodayPlanParams { user_id: id })).unwrap());
        assert_eq!(plan["meals"].as_array().unwrap().len(), 4);

        let params = SetMealConsumedParams { user_id: id, date: None, index: 0, consumed: true };
        let plan = json(service.set_meal_consumed(Parameters(params)).unwrap());
        assert_eq!(plan["meals"][0]["consumed"], true);
    }

    #[tokio::test]
    async fn test_chat_without_key_uses_demo_reply() {
        let service = service();
        let id = register(&service);

        let params = ChatParams { message: "What should I eat?".into(), user_id: Some(id) };
        let reply = json(service.chat(Parameters(params)).await.unwrap());
        assert_eq!(reply["source"], "mock");

        let history = json(service.chat_history(Parameters(ChatHistoryParams { user_id: id })).unwrap());
        assert_eq!(history["count"], 1);
    }

    #[test]
    fn test_server_info() {
        let info = service().get_info();
        assert_eq!(info.server_info.name, "mealgenius");
        assert!(info.instructions.unwrap().contains("usage_instructions"));
    }
}

//! Data models
//!
//! Rust structs representing database entities.

pub(crate) mod columns;
mod chat_message;
mod health_log;
mod meal_plan;
mod nutrition;
mod recipe;
mod user;

pub use chat_message::{ChatContext, ChatMessage};
pub use health_log::{HealthLog, ProgressMetric};
pub use meal_plan::{MealPlan, MealType, PlannedMeal};
pub use nutrition::Nutrition;
pub use recipe::{
    Cuisine, DietaryTag, Difficulty, Ingredient, Recipe, RecipeCreate, RecipeFilter,
    RecipeMealType, RecipeOrder, DESCRIPTION_MAX_CHARS,
};
pub use user::{
    validate_email, validate_name, validate_preferences, User, UserCreate, UserUpdate,
};

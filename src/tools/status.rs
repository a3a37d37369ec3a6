//! MealGenius Status Tool
//!
//! Provides runtime status information and the assistant workflow guide.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::{Recipe, User};

/// Workflow guide for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# MealGenius Usage Instructions

MealGenius keeps user profiles, a recipe catalog, daily meal plans, health logs
and a nutrition chat assistant.

## Dates

All dates use ISO format `YYYY-MM-DD`. Tools that take an optional `date`
default to today on the server's local clock.

---

## 1. Users and goals

**Tool:** `register_user`
- Required: `name`, `email`, `age` (13-120), `sex` (Male, Female, Other),
  `height_cm` (100-250), `weight_kg` (30-300)
- Optional: `activity_level` (Sedentary, Lightly Active, Moderately Active,
  Very Active, Extremely Active; default Moderately Active), `goal` (Lose Weight,
  Gain Muscle, Maintain Weight, Improve Health; default Maintain Weight),
  `dietary_preferences`, `allergies`, `health_conditions`

Daily goals are computed on registration:

1. BMR (Mifflin-St Jeor): `10 x weight + 6.25 x height - 5 x age + s`,
   where `s` is +5 for Male and -161 for Female and Other
2. Maintenance = BMR x activity multiplier (1.2, 1.375, 1.55, 1.725, 1.9)
3. Target = maintenance - 500 (Lose Weight), + 300 (Gain Muscle), + 0 otherwise
4. Macros split 30% protein, 40% carbs, 30% fat (4, 4 and 9 kcal per gram)

**Related tools:**
- `update_user_profile` recomputes goals when age, sex, height, weight,
  activity level or goal changes
- `set_goals` stores explicit targets; explicit values win
- `recalculate_goals` discards overrides
- `explain_goals` shows every intermediate value
- `calculate_goals` previews goals without creating a user

---

## 2. Recipes

- `search_recipes` filters by text, dietary tags (any of), meal type, cuisine,
  max calories and max total time; results are sorted by calories
- `recipes_by_diet`, `quick_recipes` (30 minutes or less) and
  `low_calorie_recipes` (300 kcal or less) are shortcuts
- `generate_recipe` asks Gemini for a recipe from a dish name; set `save` to add
  it to the catalog. Without an API key a template recipe is returned and the
  response says `"source": "mock"`
- `seed_recipes` loads the bundled catalog
- `delete_recipe` is refused while a meal plan uses the recipe

---

## 3. Meal plans

- `get_today_plan` returns today's plan, creating one with four random recipes
  (Breakfast, Lunch, Dinner, Snack) the first time
- `generate_meal_plan` picks recipes matching dietary preferences and replaces
  the plan for the date
- `set_meal_consumed` marks a meal by its `index` in the plan
- `get_meal_plan` returns the plan for any date with planned and consumed totals

---

## 4. Progress

**Tool:** `log_progress`
- `metric`: calories, protein, carbs, fat, water, weight, sleep or workout
- Units: kcal, g, l, kg, h, min
- Logging a metric again on the same date replaces the earlier value

`daily_progress` compares the day's log with the user's goals (water goal 2.5 l).
`list_health_logs` returns logs for a date range.
`generate_progress_report` writes a PDF with a weight and calorie chart.

---

## 5. Chat

`chat` answers nutrition questions using the user's preferences, conditions,
goal and recent conversation. Pass `user_id` to keep the exchange in
`chat_history`.
"#;

/// Runtime status of the MealGenius service
#[derive(Debug, Clone, Serialize)]
pub struct MealGeniusStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub user_count: Option<i64>,
    pub recipe_count: Option<i64>,

    /// Assistant backend
    pub gemini_model: Option<String>,
    pub ai_mode: &'static str,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    gemini_model: Option<String>,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf, gemini_model: Option<String>) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            gemini_model,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> MealGeniusStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Counts are best effort
        let (user_count, recipe_count) = match db.get_conn() {
            Ok(conn) => (User::count(&conn).ok(), Recipe::count(&conn).ok()),
            Err(e) => {
                tracing::warn!(error = %e, "Status could not reach the database");
                (None, None)
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MealGeniusStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            user_count,
            recipe_count,
            gemini_model: self.gemini_model.clone(),
            ai_mode: if self.gemini_model.is_some() { "gemini" } else { "demo" },
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

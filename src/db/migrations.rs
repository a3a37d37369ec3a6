//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USERS
        -- Profile, body metrics and derived daily goals
        -- ============================================
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,          -- stored lowercased
            age INTEGER NOT NULL,
            sex TEXT NOT NULL CHECK(sex IN ('Male', 'Female', 'Other')),
            height_cm REAL NOT NULL,
            weight_kg REAL NOT NULL,
            activity_level TEXT NOT NULL DEFAULT 'Moderately Active'
                CHECK(activity_level IN ('Sedentary', 'Lightly Active', 'Moderately Active', 'Very Active', 'Extremely Active')),
            goal TEXT NOT NULL DEFAULT 'Maintain Weight'
                CHECK(goal IN ('Lose Weight', 'Gain Muscle', 'Maintain Weight', 'Improve Health')),

            -- JSON arrays of strings
            dietary_preferences TEXT NOT NULL DEFAULT '[]',
            allergies TEXT NOT NULL DEFAULT '[]',
            health_conditions TEXT NOT NULL DEFAULT '[]',

            -- Daily targets, calculated or overridden
            daily_calories INTEGER,
            daily_protein INTEGER,               -- grams
            daily_carbs INTEGER,                 -- grams
            daily_fat INTEGER,                   -- grams

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- RECIPES
        -- Catalog entries, seeded or AI generated
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            prep_time INTEGER NOT NULL,          -- minutes
            cook_time INTEGER NOT NULL,          -- minutes
            servings INTEGER NOT NULL,

            -- Nutrition per serving
            calories REAL NOT NULL,
            protein REAL NOT NULL,
            carbs REAL NOT NULL,
            fat REAL NOT NULL,

            cuisine TEXT NOT NULL DEFAULT 'Other',
            meal_type TEXT NOT NULL,
            difficulty TEXT NOT NULL DEFAULT 'Easy' CHECK(difficulty IN ('Easy', 'Medium', 'Hard')),
            image TEXT NOT NULL DEFAULT '',

            created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            ai_generated INTEGER NOT NULL DEFAULT 0,
            original_request TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);
        CREATE INDEX idx_recipes_meal_type ON recipes(meal_type);
        CREATE INDEX idx_recipes_calories ON recipes(calories);

        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity TEXT NOT NULL,              -- free text: "1/2", "to"
            unit TEXT NOT NULL,
            UNIQUE(recipe_id, position)
        );

        CREATE TABLE recipe_instructions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            step_number INTEGER NOT NULL,
            text TEXT NOT NULL,
            UNIQUE(recipe_id, step_number)
        );

        -- Dietary tags come from a closed list, keyword tags are free text
        CREATE TABLE recipe_tags (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK(kind IN ('dietary', 'keyword')),
            tag TEXT NOT NULL,
            PRIMARY KEY (recipe_id, kind, tag)
        );

        CREATE INDEX idx_recipe_tags_tag ON recipe_tags(kind, tag);

        -- ============================================
        -- MEAL PLANS
        -- One plan per user per day
        -- ============================================
        CREATE TABLE meal_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, date)
        );

        CREATE TABLE meal_plan_meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,           -- index within the plan, from 0
            meal_type TEXT NOT NULL CHECK(meal_type IN ('Breakfast', 'Lunch', 'Dinner', 'Snack')),
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE RESTRICT,
            consumed INTEGER NOT NULL DEFAULT 0,
            consumed_at TEXT,
            UNIQUE(meal_plan_id, position)
        );

        CREATE INDEX idx_meal_plan_meals_recipe ON meal_plan_meals(recipe_id);

        -- ============================================
        -- HEALTH LOGS
        -- Daily self-reported metrics
        -- ============================================
        CREATE TABLE health_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,

            water_intake REAL,                   -- liters
            weight REAL,                         -- kg
            sleep_duration REAL,                 -- hours
            workout_duration REAL,               -- minutes
            workout_type TEXT,
            calories_consumed REAL,
            protein_consumed REAL,               -- grams
            carbs_consumed REAL,                 -- grams
            fat_consumed REAL,                   -- grams

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, date)
        );

        -- ============================================
        -- CHAT MESSAGES
        -- Assistant exchanges with the user context used
        -- ============================================
        CREATE TABLE chat_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message TEXT NOT NULL,
            response TEXT NOT NULL,
            context TEXT NOT NULL DEFAULT '{}',  -- JSON
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_chat_messages_user ON chat_messages(user_id, created_at);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }
}

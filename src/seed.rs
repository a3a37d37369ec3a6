//! Bundled recipe catalog
//!
//! A starter set of diet recipes loaded by the `seed_recipes` tool and binary.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::DbResult;
use crate::models::{Recipe, RecipeCreate};

const CATALOG_JSON: &str = include_str!("../assets/recipes.json");

/// Outcome of a seeding run
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    /// Unreferenced recipes deleted before loading
    pub removed: usize,
    pub inserted: usize,
    /// Catalog entries skipped because a planned recipe of the same name was kept
    pub skipped: usize,
    pub total_recipes: i64,
}

/// Parse the bundled catalog
pub fn catalog() -> Result<Vec<RecipeCreate>, serde_json::Error> {
    serde_json::from_str(CATALOG_JSON)
}

/// Replace the catalog with the bundled recipes.
///
/// Recipes referenced by a meal plan survive and are not duplicated.
pub fn seed_recipes(conn: &Connection) -> DbResult<SeedSummary> {
    let recipes = catalog()?;

    let removed = Recipe::delete_unreferenced(conn)?;
    tracing::info!(removed, "Cleared unreferenced recipes");

    let mut inserted = 0;
    let mut skipped = 0;
    for data in &recipes {
        if Recipe::name_exists(conn, &data.name)? {
            skipped += 1;
            continue;
        }
        Recipe::create(conn, data)?;
        inserted += 1;
    }

    let total_recipes = Recipe::count(conn)?;
    tracing::info!(inserted, skipped, total_recipes, "Seeded recipe catalog");

    Ok(SeedSummary {
        removed,
        inserted,
        skipped,
        total_recipes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::RecipeMealType;

    #[test]
    fn test_catalog_is_valid() {
        let recipes = catalog().unwrap();
        assert!(recipes.len() >= 20);
        for recipe in &recipes {
            assert!(recipe.validate().is_ok(), "{} failed validation", recipe.name);
        }
        for meal_type in [
            RecipeMealType::Breakfast,
            RecipeMealType::Lunch,
            RecipeMealType::Dinner,
            RecipeMealType::Snack,
        ] {
            assert!(recipes.iter().any(|r| r.meal_type == meal_type));
        }
    }

    #[test]
    fn test_seed_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        let first = seed_recipes(&conn).unwrap();
        assert_eq!(first.removed, 0);
        assert_eq!(first.inserted as i64, first.total_recipes);

        let second = seed_recipes(&conn).unwrap();
        assert_eq!(second.removed, first.inserted);
        assert_eq!(second.total_recipes, first.total_recipes);
    }
}

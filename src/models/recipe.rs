//! Recipe model
//!
//! Catalog recipes with ingredients, ordered instructions and tags.
//! Nutrition values are per serving.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::columns::{closed_list, parse_text};
use super::Nutrition;
use crate::db::{DbError, DbResult};

pub const DESCRIPTION_MAX_CHARS: usize = 500;

closed_list! {
    /// Dietary tags a recipe can carry
    pub enum DietaryTag ("dietary tag") {
        Vegetarian => "Vegetarian",
        Vegan => "Vegan",
        GlutenFree => "Gluten-Free",
        DairyFree => "Dairy-Free",
        Keto => "Keto",
        Paleo => "Paleo",
        LowCarb => "Low-Carb",
        HighProtein => "High-Protein",
        LowFat => "Low-Fat",
        LowCalorie => "Low-Calorie",
        SugarFree => "Sugar-Free",
        NutFree => "Nut-Free",
        EggFree => "Egg-Free",
        SoyFree => "Soy-Free",
        HeartHealthy => "Heart-Healthy",
        DiabeticFriendly => "Diabetic-Friendly",
        AntiInflammatory => "Anti-Inflammatory",
        Mediterranean => "Mediterranean",
        Dash => "DASH",
        Whole30 => "Whole30",
        Pescatarian => "Pescatarian",
        LowSugar => "Low-Sugar",
        HighFat => "High-Fat",
    }
}

impl DietaryTag {
    /// Tags a user may pick as a dietary preference
    pub fn is_user_preference(&self) -> bool {
        matches!(
            self,
            DietaryTag::Vegetarian
                | DietaryTag::Vegan
                | DietaryTag::GlutenFree
                | DietaryTag::DairyFree
                | DietaryTag::Keto
                | DietaryTag::Paleo
                | DietaryTag::LowCarb
                | DietaryTag::HighProtein
        )
    }
}

closed_list! {
    pub enum Cuisine ("cuisine") {
        Indian => "Indian",
        Italian => "Italian",
        Mexican => "Mexican",
        Asian => "Asian",
        Mediterranean => "Mediterranean",
        American => "American",
        Thai => "Thai",
        Chinese => "Chinese",
        Japanese => "Japanese",
        Korean => "Korean",
        French => "French",
        MiddleEastern => "Middle Eastern",
        Greek => "Greek",
        Spanish => "Spanish",
        Vietnamese => "Vietnamese",
        Lebanese => "Lebanese",
        Turkish => "Turkish",
        Other => "Other",
    }
}

impl Default for Cuisine {
    fn default() -> Self {
        Cuisine::Other
    }
}

closed_list! {
    /// Meal type of a catalog recipe
    pub enum RecipeMealType ("meal type") {
        Breakfast => "Breakfast",
        Lunch => "Lunch",
        Dinner => "Dinner",
        Snack => "Snack",
        Dessert => "Dessert",
        Beverage => "Beverage",
        Drink => "Drink",
    }
}

closed_list! {
    pub enum Difficulty ("difficulty") {
        Easy => "Easy",
        Medium => "Medium",
        Hard => "Hard",
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

/// One ingredient line; quantity is free text ("1/2", "to taste")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

/// A catalog recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: u32, // minutes
    pub cook_time: u32, // minutes
    pub servings: u32,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub dietary_tags: Vec<DietaryTag>,
    pub cuisine: Cuisine,
    pub meal_type: RecipeMealType,
    pub difficulty: Difficulty,
    pub image: String,
    pub created_by: Option<i64>,
    pub ai_generated: bool,
    pub original_request: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub prep_time: u32,
    pub cook_time: u32,
    pub servings: u32,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub dietary_tags: Vec<DietaryTag>,
    #[serde(default)]
    pub cuisine: Cuisine,
    pub meal_type: RecipeMealType,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub original_request: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RecipeCreate {
    /// Check the fields the schema cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Recipe name is required".to_string());
        }
        if let Some(ref description) = self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(format!(
                    "Description cannot be more than {} characters",
                    DESCRIPTION_MAX_CHARS
                ));
            }
        }
        if self.servings == 0 {
            return Err("Servings must be at least 1".to_string());
        }
        let n = &self.nutrition;
        for (field, value) in [
            ("calories", n.calories),
            ("protein", n.protein),
            ("carbs", n.carbs),
            ("fat", n.fat),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", field, value));
            }
        }
        Ok(())
    }
}

/// Result ordering for recipe queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipeOrder {
    /// Lowest calories first
    #[default]
    Calories,
    /// Catalog order
    Inserted,
}

/// Filters for [`Recipe::search`]; all set filters must match
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Substring matched against name, description and tags
    pub query: Option<String>,
    /// Matches recipes carrying any of these tags
    pub dietary_tags: Vec<DietaryTag>,
    pub meal_type: Option<RecipeMealType>,
    pub cuisine: Option<Cuisine>,
    pub max_calories: Option<f64>,
    /// Upper bound on prep plus cook minutes
    pub max_total_time: Option<u32>,
    pub order: RecipeOrder,
    pub limit: i64,
}

/// Escape LIKE wildcards so user text matches literally under `ESCAPE '\'`
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Recipe {
    pub fn total_time(&self) -> u32 {
        self.prep_time + self.cook_time
    }

    /// Create a Recipe from a database row, without its child rows
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            prep_time: row.get("prep_time")?,
            cook_time: row.get("cook_time")?,
            servings: row.get("servings")?,
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            dietary_tags: Vec::new(),
            cuisine: parse_text(row, "cuisine")?,
            meal_type: parse_text(row, "meal_type")?,
            difficulty: parse_text(row, "difficulty")?,
            image: row.get("image")?,
            created_by: row.get("created_by")?,
            ai_generated: row.get::<_, i32>("ai_generated")? != 0,
            original_request: row.get("original_request")?,
            tags: Vec::new(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Fill ingredients, instructions and tags from their tables
    fn load_details(mut self, conn: &Connection) -> DbResult<Self> {
        let mut stmt = conn.prepare(
            "SELECT name, quantity, unit FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY position",
        )?;
        self.ingredients = stmt
            .query_map([self.id], |row| {
                Ok(Ingredient {
                    name: row.get(0)?,
                    quantity: row.get(1)?,
                    unit: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT text FROM recipe_instructions WHERE recipe_id = ?1 ORDER BY step_number",
        )?;
        self.instructions = stmt
            .query_map([self.id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT kind, tag FROM recipe_tags WHERE recipe_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([self.id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        for (kind, tag) in rows {
            if kind == "dietary" {
                let parsed = tag
                    .parse::<DietaryTag>()
                    .map_err(|e| DbError::Sqlite(rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )))?;
                self.dietary_tags.push(parsed);
            } else {
                self.tags.push(tag);
            }
        }

        Ok(self)
    }

    /// Insert a new recipe with its child rows
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO recipes (
                name, description, prep_time, cook_time, servings,
                calories, protein, carbs, fat,
                cuisine, meal_type, difficulty, image,
                created_by, ai_generated, original_request
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                data.name.trim(),
                data.description,
                data.prep_time,
                data.cook_time,
                data.servings,
                data.nutrition.calories,
                data.nutrition.protein,
                data.nutrition.carbs,
                data.nutrition.fat,
                data.cuisine.as_str(),
                data.meal_type.as_str(),
                data.difficulty.as_str(),
                data.image,
                data.created_by,
                data.ai_generated as i32,
                data.original_request,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for (position, ingredient) in data.ingredients.iter().enumerate() {
            tx.execute(
                "INSERT INTO recipe_ingredients (recipe_id, position, name, quantity, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, position as i64, ingredient.name, ingredient.quantity, ingredient.unit],
            )?;
        }

        for (index, text) in data.instructions.iter().enumerate() {
            tx.execute(
                "INSERT INTO recipe_instructions (recipe_id, step_number, text) VALUES (?1, ?2, ?3)",
                params![id, index as i64 + 1, text],
            )?;
        }

        // OR IGNORE drops duplicate tags
        for tag in &data.dietary_tags {
            tx.execute(
                "INSERT OR IGNORE INTO recipe_tags (recipe_id, kind, tag) VALUES (?1, 'dietary', ?2)",
                params![id, tag.as_str()],
            )?;
        }
        for tag in &data.tags {
            tx.execute(
                "INSERT OR IGNORE INTO recipe_tags (recipe_id, kind, tag) VALUES (?1, 'keyword', ?2)",
                params![id, tag.trim()],
            )?;
        }

        tx.commit()?;

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe.load_details(conn)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search recipes with the given filters
    pub fn search(conn: &Connection, filter: &RecipeFilter) -> DbResult<Vec<Self>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params_vec.push(Box::new(format!("%{}%", escape_like(q))));
            let n = params_vec.len();
            conditions.push(format!(
                r"(r.name LIKE ?{n} ESCAPE '\' OR r.description LIKE ?{n} ESCAPE '\' OR EXISTS (
                    SELECT 1 FROM recipe_tags t WHERE t.recipe_id = r.id AND t.tag LIKE ?{n} ESCAPE '\'))"
            ));
        }

        if !filter.dietary_tags.is_empty() {
            let mut placeholders = Vec::new();
            for tag in &filter.dietary_tags {
                params_vec.push(Box::new(tag.as_str()));
                placeholders.push(format!("?{}", params_vec.len()));
            }
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM recipe_tags t
                         WHERE t.recipe_id = r.id AND t.kind = 'dietary' AND t.tag IN ({}))",
                placeholders.join(", ")
            ));
        }

        if let Some(meal_type) = filter.meal_type {
            params_vec.push(Box::new(meal_type.as_str()));
            conditions.push(format!("r.meal_type = ?{}", params_vec.len()));
        }
        if let Some(cuisine) = filter.cuisine {
            params_vec.push(Box::new(cuisine.as_str()));
            conditions.push(format!("r.cuisine = ?{}", params_vec.len()));
        }
        if let Some(max_calories) = filter.max_calories {
            params_vec.push(Box::new(max_calories));
            conditions.push(format!("r.calories <= ?{}", params_vec.len()));
        }
        if let Some(max_time) = filter.max_total_time {
            params_vec.push(Box::new(max_time));
            conditions.push(format!("(r.prep_time + r.cook_time) <= ?{}", params_vec.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let order = match filter.order {
            RecipeOrder::Calories => "r.calories ASC, r.id ASC",
            RecipeOrder::Inserted => "r.id ASC",
        };

        params_vec.push(Box::new(filter.limit));
        let sql = format!(
            "SELECT r.* FROM recipes r {} ORDER BY {} LIMIT ?{}",
            where_clause,
            order,
            params_vec.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let recipes = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        recipes.into_iter().map(|r| r.load_details(conn)).collect()
    }

    /// IDs of every recipe, in catalog order
    pub fn all_ids(conn: &Connection) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare("SELECT id FROM recipes ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Whether a recipe with this name exists (case-insensitive)
    pub fn name_exists(conn: &Connection, name: &str) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE name = ?1 COLLATE NOCASE",
            [name.trim()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of meal plan slots pointing at a recipe
    pub fn get_plan_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meal_plan_meals WHERE recipe_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a recipe
    /// Returns Ok(true) if deleted, Ok(false) if not found.
    /// Fails with a foreign key error while a meal plan references it.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        // Cascades to ingredients, instructions and tags
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Delete every recipe no meal plan references; returns the number removed
    pub fn delete_unreferenced(conn: &Connection) -> DbResult<usize> {
        let rows = conn.execute(
            "DELETE FROM recipes WHERE id NOT IN (SELECT recipe_id FROM meal_plan_meals)",
            [],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample(name: &str, meal_type: RecipeMealType, calories: f64) -> RecipeCreate {
        RecipeCreate {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            ingredients: vec![Ingredient {
                name: "Oats".to_string(),
                quantity: "1".to_string(),
                unit: "cup".to_string(),
            }],
            instructions: vec!["Mix".to_string(), "Cook".to_string()],
            prep_time: 10,
            cook_time: 15,
            servings: 2,
            nutrition: Nutrition {
                calories,
                protein: 10.0,
                carbs: 30.0,
                fat: 5.0,
            },
            dietary_tags: vec![DietaryTag::Vegetarian],
            cuisine: Cuisine::Indian,
            meal_type,
            difficulty: Difficulty::Easy,
            image: String::new(),
            created_by: None,
            ai_generated: false,
            original_request: None,
            tags: vec!["comfort".to_string()],
        }
    }

    #[test]
    fn test_create_round_trips_child_rows() {
        let conn = setup();
        let recipe = Recipe::create(&conn, &sample("Upma", RecipeMealType::Breakfast, 250.0)).unwrap();

        assert_eq!(recipe.name, "Upma");
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.instructions, vec!["Mix", "Cook"]);
        assert_eq!(recipe.dietary_tags, vec![DietaryTag::Vegetarian]);
        assert_eq!(recipe.tags, vec!["comfort"]);
        assert_eq!(recipe.total_time(), 25);
    }

    #[test]
    fn test_search_text_wildcards_match_literally() {
        let conn = setup();
        Recipe::create(&conn, &sample("Low_fat Soup", RecipeMealType::Lunch, 150.0)).unwrap();
        Recipe::create(&conn, &sample("Lowxfat Soup", RecipeMealType::Lunch, 160.0)).unwrap();
        Recipe::create(&conn, &sample("50% Protein Bar", RecipeMealType::Snack, 210.0)).unwrap();
        Recipe::create(&conn, &sample("500 Calorie Bar", RecipeMealType::Snack, 500.0)).unwrap();

        let names = |query: &str| -> Vec<String> {
            let filter = RecipeFilter {
                query: Some(query.to_string()),
                limit: 50,
                ..Default::default()
            };
            Recipe::search(&conn, &filter).unwrap().into_iter().map(|r| r.name).collect()
        };

        assert_eq!(names("low_fat"), vec!["Low_fat Soup"]);
        assert_eq!(names("50%"), vec!["50% Protein Bar"]);
        assert!(names(r"\").is_empty());
        assert_eq!(names("soup").len(), 2);
    }

    #[test]
    fn test_search_filters_and_sorts_by_calories() {
        let conn = setup();
        Recipe::create(&conn, &sample("Heavy Lunch", RecipeMealType::Lunch, 600.0)).unwrap();
        Recipe::create(&conn, &sample("Light Lunch", RecipeMealType::Lunch, 200.0)).unwrap();
        let mut vegan = sample("Vegan Bowl", RecipeMealType::Dinner, 400.0);
        vegan.dietary_tags = vec![DietaryTag::Vegan];
        vegan.prep_time = 40;
        Recipe::create(&conn, &vegan).unwrap();

        let all = Recipe::search(&conn, &RecipeFilter { limit: 50, ..Default::default() }).unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Light Lunch", "Vegan Bowl", "Heavy Lunch"]);

        let lunches = Recipe::search(
            &conn,
            &RecipeFilter {
                meal_type: Some(RecipeMealType::Lunch),
                max_calories: Some(300.0),
                limit: 50,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(lunches.len(), 1);
        assert_eq!(lunches[0].name, "Light Lunch");

        let any_of = Recipe::search(
            &conn,
            &RecipeFilter {
                dietary_tags: vec![DietaryTag::Vegan, DietaryTag::Keto],
                limit: 50,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(any_of.len(), 1);

        let quick = Recipe::search(
            &conn,
            &RecipeFilter { max_total_time: Some(30), limit: 50, ..Default::default() },
        )
        .unwrap();
        assert_eq!(quick.len(), 2);

        let text = Recipe::search(
            &conn,
            &RecipeFilter { query: Some("comf".to_string()), limit: 50, ..Default::default() },
        )
        .unwrap();
        assert_eq!(text.len(), 3);
    }

    #[test]
    fn test_delete_blocked_while_planned() {
        let conn = setup();
        let recipe = Recipe::create(&conn, &sample("Salad", RecipeMealType::Lunch, 150.0)).unwrap();
        conn.execute_batch(
            "INSERT INTO users (name, email, age, sex, height_cm, weight_kg) VALUES ('A', 'a@b.com', 30, 'Male', 180, 80);
             INSERT INTO meal_plans (user_id, date) VALUES (1, '2025-01-01');",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO meal_plan_meals (meal_plan_id, position, meal_type, recipe_id) VALUES (1, 0, 'Lunch', ?1)",
            [recipe.id],
        )
        .unwrap();

        assert_eq!(Recipe::get_plan_usage_count(&conn, recipe.id).unwrap(), 1);
        assert!(Recipe::delete(&conn, recipe.id).is_err());
        assert_eq!(Recipe::delete_unreferenced(&conn).unwrap(), 0);
        assert!(!Recipe::delete(&conn, 999).unwrap());
    }

    #[test]
    fn test_validate() {
        let mut data = sample("Soup", RecipeMealType::Dinner, 100.0);
        assert!(data.validate().is_ok());
        data.description = Some("x".repeat(501));
        assert!(data.validate().is_err());
        data.description = None;
        data.servings = 0;
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_labels_parse_loosely() {
        assert_eq!("gluten free".parse::<DietaryTag>().unwrap(), DietaryTag::GlutenFree);
        assert_eq!("middle-eastern".parse::<Cuisine>().unwrap(), Cuisine::MiddleEastern);
        assert!("brunch".parse::<RecipeMealType>().is_err());
        assert_eq!(DietaryTag::ALL.len(), 23);
        assert_eq!(DietaryTag::ALL.iter().filter(|t| t.is_user_preference()).count(), 8);
        assert_eq!(serde_json::to_string(&DietaryTag::Dash).unwrap(), "\"DASH\"");
    }
}

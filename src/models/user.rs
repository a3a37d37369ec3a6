//! User model
//!
//! Profile, body metrics and the daily nutrition goals derived from them.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::columns::{parse_json, parse_text, to_json};
use super::DietaryTag;
use crate::db::{DbError, DbResult};
use crate::nutrition::{ActivityLevel, BodyProfile, Goal, NutritionGoals, Sex};

pub const NAME_MAX_CHARS: usize = 50;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub dietary_preferences: Vec<DietaryTag>,
    pub allergies: Vec<String>,
    pub health_conditions: Vec<String>,
    pub daily_calories: Option<u32>,
    pub daily_protein: Option<u32>,
    pub daily_carbs: Option<u32>,
    pub daily_fat: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for registering a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub dietary_preferences: Vec<DietaryTag>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
}

/// Data for updating a user profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub dietary_preferences: Option<Vec<DietaryTag>>,
    pub allergies: Option<Vec<String>>,
    pub health_conditions: Option<Vec<String>>,
}

impl UserUpdate {
    /// True when the update touches an input of the goal calculation
    pub fn changes_goal_inputs(&self) -> bool {
        self.age.is_some()
            || self.sex.is_some()
            || self.height_cm.is_some()
            || self.weight_kg.is_some()
            || self.activity_level.is_some()
            || self.goal.is_some()
    }
}

/// Check a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required".to_string());
    }
    if trimmed.chars().count() > NAME_MAX_CHARS {
        return Err(format!("Name cannot be more than {} characters", NAME_MAX_CHARS));
    }
    Ok(())
}

/// Accepts `word[.-word]*@word[.-word]*.tld` with a 2-3 letter tld
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err(format!("Invalid email: '{}'", email));
    let is_word = |part: &str| {
        !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    // Segments separated by a single '.' or '-'
    let is_dotted = |part: &str| part.split(['.', '-']).all(is_word);

    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    if !is_dotted(local) || !is_dotted(domain) {
        return invalid();
    }
    match domain.rsplit_once('.') {
        Some((_, tld)) if (2..=3).contains(&tld.len()) => Ok(()),
        _ => invalid(),
    }
}

/// Dietary preferences must come from the user-selectable subset
pub fn validate_preferences(preferences: &[DietaryTag]) -> Result<(), String> {
    match preferences.iter().find(|t| !t.is_user_preference()) {
        Some(tag) => Err(format!("'{}' is not a selectable dietary preference", tag)),
        None => Ok(()),
    }
}

impl UserCreate {
    /// Check every field; body metrics go through [`BodyProfile::validate`]
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email.trim().to_lowercase())?;
        validate_preferences(&self.dietary_preferences)?;
        self.body_profile().validate().map_err(|e| e.to_string())
    }

    pub fn body_profile(&self) -> BodyProfile {
        BodyProfile {
            sex: self.sex,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            age_years: self.age,
            activity_level: self.activity_level,
            goal: self.goal,
        }
    }
}

impl User {
    /// Create a User from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
            sex: parse_text(row, "sex")?,
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            activity_level: parse_text(row, "activity_level")?,
            goal: parse_text(row, "goal")?,
            dietary_preferences: parse_json(row, "dietary_preferences")?,
            allergies: parse_json(row, "allergies")?,
            health_conditions: parse_json(row, "health_conditions")?,
            daily_calories: row.get("daily_calories")?,
            daily_protein: row.get("daily_protein")?,
            daily_carbs: row.get("daily_carbs")?,
            daily_fat: row.get("daily_fat")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Inputs of the goal calculation
    pub fn body_profile(&self) -> BodyProfile {
        BodyProfile {
            sex: self.sex,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            age_years: self.age,
            activity_level: self.activity_level,
            goal: self.goal,
        }
    }

    /// Stored goals, if all four targets are set
    pub fn goals(&self) -> Option<NutritionGoals> {
        Some(NutritionGoals {
            daily_calories: self.daily_calories?,
            daily_protein_grams: self.daily_protein?,
            daily_carbs_grams: self.daily_carbs?,
            daily_fat_grams: self.daily_fat?,
        })
    }

    /// Insert a new user with precomputed goals
    pub fn create(conn: &Connection, data: &UserCreate, goals: &NutritionGoals) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO users (
                name, email, age, sex, height_cm, weight_kg, activity_level, goal,
                dietary_preferences, allergies, health_conditions,
                daily_calories, daily_protein, daily_carbs, daily_fat
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                data.name.trim(),
                data.email.trim().to_lowercase(),
                data.age,
                data.sex.as_str(),
                data.height_cm,
                data.weight_kg,
                data.activity_level.as_str(),
                data.goal.as_str(),
                to_json(&data.dietary_preferences)?,
                to_json(&data.allergies)?,
                to_json(&data.health_conditions)?,
                goals.daily_calories,
                goals.daily_protein_grams,
                goals.daily_carbs_grams,
                goals.daily_fat_grams,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a user by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by email (case-insensitive)
    pub fn get_by_email(conn: &Connection, email: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE email = ?1")?;

        let result = stmt.query_row([email.trim().to_lowercase()], Self::from_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List users ordered by name
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY name, id LIMIT ?1 OFFSET ?2")?;
        let users = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Count users
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update profile fields; goals are left alone
    pub fn update(conn: &Connection, id: i64, data: &UserUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.trim().to_string()));
        }
        if let Some(age) = data.age {
            updates.push(format!("age = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(age));
        }
        if let Some(sex) = data.sex {
            updates.push(format!("sex = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(sex.as_str()));
        }
        if let Some(height) = data.height_cm {
            updates.push(format!("height_cm = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(height));
        }
        if let Some(weight) = data.weight_kg {
            updates.push(format!("weight_kg = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(weight));
        }
        if let Some(level) = data.activity_level {
            updates.push(format!("activity_level = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(level.as_str()));
        }
        if let Some(goal) = data.goal {
            updates.push(format!("goal = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(goal.as_str()));
        }
        if let Some(ref prefs) = data.dietary_preferences {
            updates.push(format!("dietary_preferences = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(to_json(prefs)?));
        }
        if let Some(ref allergies) = data.allergies {
            updates.push(format!("allergies = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(to_json(allergies)?));
        }
        if let Some(ref conditions) = data.health_conditions {
            updates.push(format!("health_conditions = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(to_json(conditions)?));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Store daily goals
    pub fn set_goals(conn: &Connection, id: i64, goals: &NutritionGoals) -> DbResult<Option<Self>> {
        conn.execute(
            r#"
            UPDATE users SET
                daily_calories = ?1,
                daily_protein = ?2,
                daily_carbs = ?3,
                daily_fat = ?4,
                updated_at = datetime('now')
            WHERE id = ?5
            "#,
            params![
                goals.daily_calories,
                goals.daily_protein_grams,
                goals.daily_carbs_grams,
                goals.daily_fat_grams,
                id,
            ],
        )?;
        Self::get_by_id(conn, id)
    }

    /// Delete a user; plans, health logs and chat history cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::nutrition::compute;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample() -> UserCreate {
        UserCreate {
            name: "Asha".to_string(),
            email: "Asha@Example.com".to_string(),
            age: 25,
            sex: Sex::Male,
            height_cm: 175.0,
            weight_kg: 70.0,
            activity_level: ActivityLevel::ModeratelyActive,
            goal: Goal::MaintainWeight,
            dietary_preferences: vec![DietaryTag::Vegetarian],
            allergies: vec!["peanuts".to_string()],
            health_conditions: Vec::new(),
        }
    }

    #[test]
    fn test_create_stores_goals_and_lowercases_email() {
        let conn = setup();
        let data = sample();
        let goals = compute(&data.body_profile());
        let user = User::create(&conn, &data, &goals).unwrap();

        assert_eq!(user.email, "asha@example.com");
        assert_eq!(user.daily_calories, Some(2594));
        assert_eq!(user.goals(), Some(goals));
        assert_eq!(user.dietary_preferences, vec![DietaryTag::Vegetarian]);
        assert_eq!(user.allergies, vec!["peanuts"]);

        let found = User::get_by_email(&conn, "ASHA@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = setup();
        let data = sample();
        let goals = compute(&data.body_profile());
        User::create(&conn, &data, &goals).unwrap();
        assert!(User::create(&conn, &data, &goals).is_err());
    }

    #[test]
    fn test_update_and_goal_inputs() {
        let conn = setup();
        let data = sample();
        let user = User::create(&conn, &data, &compute(&data.body_profile())).unwrap();

        let update = UserUpdate {
            allergies: Some(vec![]),
            ..Default::default()
        };
        assert!(!update.changes_goal_inputs());

        let update = UserUpdate {
            weight_kg: Some(65.0),
            goal: Some(Goal::LoseWeight),
            ..Default::default()
        };
        assert!(update.changes_goal_inputs());
        let updated = User::update(&conn, user.id, &update).unwrap().unwrap();
        assert_eq!(updated.weight_kg, 65.0);
        assert_eq!(updated.goal, Goal::LoseWeight);
        // goals untouched until recomputed
        assert_eq!(updated.daily_calories, Some(2594));
    }

    #[test]
    fn test_validation() {
        assert!(sample().validate().is_ok());
        assert!(validate_email("a.b-c@mail.example.org").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b.c").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("a..b@c.com").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
        assert!(validate_preferences(&[DietaryTag::Whole30]).is_err());

        let mut data = sample();
        data.age = 12;
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_delete_cascades() {
        let conn = setup();
        let data = sample();
        let user = User::create(&conn, &data, &compute(&data.body_profile())).unwrap();
        conn.execute(
            "INSERT INTO health_logs (user_id, date, weight) VALUES (?1, '2025-01-01', 80)",
            [user.id],
        )
        .unwrap();

        assert!(User::delete(&conn, user.id).unwrap());
        let logs: i64 = conn
            .query_row("SELECT COUNT(*) FROM health_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(logs, 0);
        assert!(User::get_by_id(&conn, user.id).unwrap().is_none());
    }
}

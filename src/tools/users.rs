//! User MCP Tools
//!
//! Registration, profile maintenance and daily goal management.

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::{validate_name, validate_preferences, User, UserCreate, UserUpdate};
use crate::nutrition::{breakdown, BodyProfile, Goal, GoalBreakdown, NutritionGoals};

/// Response for list_users
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// User summary for listing
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub goal: Goal,
    pub daily_calories: Option<u32>,
}

/// Response for update_user_profile
#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub user: User,
    pub goals_recalculated: bool,
}

/// Explicit goal values; unset fields keep their calculated values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalOverrides {
    pub goal: Option<Goal>,
    pub daily_calories: Option<u32>,
    pub daily_protein: Option<u32>,
    pub daily_carbs: Option<u32>,
    pub daily_fat: Option<u32>,
}

/// Response for recalculate_goals and explain_goals
#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub user_id: i64,
    pub profile: BodyProfile,
    pub breakdown: GoalBreakdown,
    /// Goals currently stored on the user, which may include overrides
    pub stored_goals: Option<NutritionGoals>,
}

/// Response for delete_user
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub deleted_id: i64,
}

// ============================================================================
// Tools
// ============================================================================

/// Register a user and compute their daily goals
pub fn register_user(db: &Database, data: UserCreate) -> Result<User, String> {
    data.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = User::get_by_email(&conn, &data.email)
        .map_err(|e| format!("Failed to check email: {}", e))?;
    if existing.is_some() {
        return Err(format!(
            "A user with email '{}' already exists",
            data.email.trim().to_lowercase()
        ));
    }

    let calculated = breakdown(&data.body_profile());
    let user = User::create(&conn, &data, &calculated.goals)
        .map_err(|e| format!("Failed to create user: {}", e))?;

    tracing::info!(
        user_id = user.id,
        daily_calories = calculated.goals.daily_calories,
        "Registered user"
    );
    Ok(user)
}

/// Get a user by ID
pub fn get_user(db: &Database, id: i64) -> Result<Option<User>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))
}

/// List users
pub fn list_users(db: &Database, limit: i64, offset: i64) -> Result<ListUsersResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let users = User::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list users: {}", e))?;
    let total = User::count(&conn).map_err(|e| format!("Failed to count users: {}", e))?;

    Ok(ListUsersResponse {
        users: users
            .into_iter()
            .map(|u| UserSummary {
                id: u.id,
                name: u.name,
                email: u.email,
                goal: u.goal,
                daily_calories: u.daily_calories,
            })
            .collect(),
        total,
        limit,
        offset,
    })
}

/// Update profile fields, recomputing goals when a calculation input changed
pub fn update_user_profile(
    db: &Database,
    id: i64,
    data: UserUpdate,
) -> Result<Option<UpdateProfileResponse>, String> {
    if let Some(ref name) = data.name {
        validate_name(name)?;
    }
    if let Some(ref prefs) = data.dietary_preferences {
        validate_preferences(prefs)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(current) = User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))?
    else {
        return Ok(None);
    };

    // Validate the merged profile before writing anything
    let merged = BodyProfile {
        sex: data.sex.unwrap_or(current.sex),
        weight_kg: data.weight_kg.unwrap_or(current.weight_kg),
        height_cm: data.height_cm.unwrap_or(current.height_cm),
        age_years: data.age.unwrap_or(current.age),
        activity_level: data.activity_level.unwrap_or(current.activity_level),
        goal: data.goal.unwrap_or(current.goal),
    };
    merged.validate().map_err(|e| e.to_string())?;

    // Profile and goals are written together or not at all
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| format!("Database error: {}", e))?;

    let updated = User::update(&tx, id, &data)
        .map_err(|e| format!("Failed to update user: {}", e))?;
    let Some(mut user) = updated else {
        return Ok(None);
    };

    let goals_recalculated = data.changes_goal_inputs();
    if goals_recalculated {
        let goals = breakdown(&merged).goals;
        user = User::set_goals(&tx, id, &goals)
            .map_err(|e| format!("Failed to store goals: {}", e))?
            .ok_or_else(|| "User disappeared while updating goals".to_string())?;
        tracing::info!(user_id = id, daily_calories = goals.daily_calories, "Recalculated goals");
    }

    tx.commit().map_err(|e| format!("Failed to commit profile update: {}", e))?;

    Ok(Some(UpdateProfileResponse {
        user,
        goals_recalculated,
    }))
}

/// Merge overrides into a base set of goals.
///
/// A calorie override re-derives the macros from it; explicit macro values
/// win over both.
pub fn apply_overrides(base: NutritionGoals, overrides: &GoalOverrides) -> NutritionGoals {
    let mut goals = match overrides.daily_calories {
        Some(calories) => NutritionGoals::from_calories(calories),
        None => base,
    };
    if let Some(protein) = overrides.daily_protein {
        goals.daily_protein_grams = protein;
    }
    if let Some(carbs) = overrides.daily_carbs {
        goals.daily_carbs_grams = carbs;
    }
    if let Some(fat) = overrides.daily_fat {
        goals.daily_fat_grams = fat;
    }
    goals
}

/// Store explicit goals for a user.
///
/// A `goal` override changes the user's goal and recomputes the targets
/// before the explicit values are applied.
pub fn set_goals(db: &Database, id: i64, overrides: GoalOverrides) -> Result<Option<User>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(mut user) = User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))?
    else {
        return Ok(None);
    };

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| format!("Database error: {}", e))?;

    if let Some(goal) = overrides.goal {
        let update = UserUpdate {
            goal: Some(goal),
            ..Default::default()
        };
        user = User::update(&tx, id, &update)
            .map_err(|e| format!("Failed to update goal: {}", e))?
            .ok_or_else(|| "User disappeared while updating goal".to_string())?;
    }

    let base = match (overrides.goal, user.goals()) {
        (None, Some(stored)) => stored,
        _ => breakdown(&user.body_profile()).goals,
    };
    let goals = apply_overrides(base, &overrides);

    let stored = User::set_goals(&tx, id, &goals).map_err(|e| format!("Failed to store goals: {}", e))?;
    tx.commit().map_err(|e| format!("Failed to commit goals: {}", e))?;
    Ok(stored)
}

/// Recompute and store goals from the current profile, discarding overrides
pub fn recalculate_goals(db: &Database, id: i64) -> Result<Option<GoalsResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(user) = User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))?
    else {
        return Ok(None);
    };

    let profile = user.body_profile();
    let calculated = breakdown(&profile);
    let user = User::set_goals(&conn, id, &calculated.goals)
        .map_err(|e| format!("Failed to store goals: {}", e))?
        .ok_or_else(|| "User disappeared while updating goals".to_string())?;

    Ok(Some(GoalsResponse {
        user_id: id,
        profile,
        breakdown: calculated,
        stored_goals: user.goals(),
    }))
}

/// Show how a user's goals are derived, without storing anything
pub fn explain_goals(db: &Database, id: i64) -> Result<Option<GoalsResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))?;

    Ok(user.map(|user| {
        let profile = user.body_profile();
        GoalsResponse {
            user_id: id,
            profile,
            breakdown: breakdown(&profile),
            stored_goals: user.goals(),
        }
    }))
}

/// Compute goals for an ad-hoc profile
pub fn calculate_goals(profile: &BodyProfile) -> Result<GoalBreakdown, String> {
    profile.validate().map_err(|e| e.to_string())?;
    Ok(breakdown(profile))
}

/// Delete a user and everything they own
pub fn delete_user(db: &Database, id: i64) -> Result<Option<DeleteUserResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = User::delete(&conn, id).map_err(|e| format!("Failed to delete user: {}", e))?;
    if !deleted {
        return Ok(None);
    }

    tracing::info!(user_id = id, "Deleted user");
    Ok(Some(DeleteUserResponse {
        success: true,
        deleted_id: id,
    }))
}

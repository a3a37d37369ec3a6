//! Daily nutrition goal calculation
//!
//! Derives daily calorie and macro targets from body metrics using the
//! Mifflin-St Jeor equation, an activity multiplier and a flat goal adjustment.
//! Calories are split 30/40/30 between protein, carbs and fat.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing labels or validating body metrics
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GoalError {
    #[error("Invalid {field}: '{value}'")]
    InvalidArgument { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type GoalResult<T> = Result<T, GoalError>;

// ============================================================================
// Constants
// ============================================================================

pub const PROTEIN_SHARE: f64 = 0.30;
pub const CARBS_SHARE: f64 = 0.40;
pub const FAT_SHARE: f64 = 0.30;

pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

pub const WEIGHT_KG_RANGE: (f64, f64) = (30.0, 300.0);
pub const HEIGHT_CM_RANGE: (f64, f64) = (100.0, 250.0);
pub const AGE_YEARS_RANGE: (u32, u32) = (13, 120);

/// Lowercase and strip everything but letters and digits, so that
/// "Lightly Active", "lightly_active" and "lightly-active" compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ============================================================================
// Sex
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }

    /// Constant term of the Mifflin-St Jeor equation.
    ///
    /// The equation only defines male and female constants; `Other` uses the
    /// female constant.
    pub fn bmr_offset(&self) -> f64 {
        match self {
            Sex::Male => 5.0,
            Sex::Female | Sex::Other => -161.0,
        }
    }
}

impl FromStr for Sex {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            _ => Err(GoalError::InvalidArgument {
                field: "sex",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Activity level
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLevel {
    #[serde(rename = "Sedentary")]
    Sedentary,
    #[serde(rename = "Lightly Active")]
    LightlyActive,
    #[default]
    #[serde(rename = "Moderately Active")]
    ModeratelyActive,
    #[serde(rename = "Very Active")]
    VeryActive,
    #[serde(rename = "Extremely Active")]
    ExtremelyActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtremelyActive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::LightlyActive => "Lightly Active",
            ActivityLevel::ModeratelyActive => "Moderately Active",
            ActivityLevel::VeryActive => "Very Active",
            ActivityLevel::ExtremelyActive => "Extremely Active",
        }
    }

    /// Factor scaling BMR to total daily energy expenditure
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightlyactive" | "light" => Ok(ActivityLevel::LightlyActive),
            "moderatelyactive" | "moderate" => Ok(ActivityLevel::ModeratelyActive),
            "veryactive" => Ok(ActivityLevel::VeryActive),
            "extremelyactive" | "extreme" => Ok(ActivityLevel::ExtremelyActive),
            _ => Err(GoalError::InvalidArgument {
                field: "activity_level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Goal
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "Lose Weight")]
    LoseWeight,
    #[serde(rename = "Gain Muscle")]
    GainMuscle,
    #[default]
    #[serde(rename = "Maintain Weight")]
    MaintainWeight,
    #[serde(rename = "Improve Health")]
    ImproveHealth,
}

impl Goal {
    pub const ALL: [Goal; 4] = [
        Goal::LoseWeight,
        Goal::GainMuscle,
        Goal::MaintainWeight,
        Goal::ImproveHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::LoseWeight => "Lose Weight",
            Goal::GainMuscle => "Gain Muscle",
            Goal::MaintainWeight => "Maintain Weight",
            Goal::ImproveHealth => "Improve Health",
        }
    }

    /// Flat calorie offset applied to maintenance calories
    pub fn calorie_adjustment(&self) -> f64 {
        match self {
            Goal::LoseWeight => -500.0,
            Goal::GainMuscle => 300.0,
            Goal::MaintainWeight | Goal::ImproveHealth => 0.0,
        }
    }
}

impl FromStr for Goal {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "lose" | "loseweight" => Ok(Goal::LoseWeight),
            "gain" | "gainmuscle" | "gainweight" => Ok(Goal::GainMuscle),
            "maintain" | "maintainweight" => Ok(Goal::MaintainWeight),
            "improvehealth" | "health" => Ok(Goal::ImproveHealth),
            _ => Err(GoalError::InvalidArgument {
                field: "goal",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Profile and output
// ============================================================================

/// Snapshot of the user attributes the calculation depends on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyProfile {
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

impl BodyProfile {
    /// Check the body metrics against the accepted ranges.
    ///
    /// [`compute`] does not call this; callers validate before persisting.
    pub fn validate(&self) -> GoalResult<()> {
        check_range("weight_kg", self.weight_kg, WEIGHT_KG_RANGE)?;
        check_range("height_cm", self.height_cm, HEIGHT_CM_RANGE)?;
        check_range(
            "age_years",
            self.age_years as f64,
            (AGE_YEARS_RANGE.0 as f64, AGE_YEARS_RANGE.1 as f64),
        )?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> GoalResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(GoalError::OutOfRange { field, value, min, max });
    }
    Ok(())
}

/// Daily calorie and macro targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionGoals {
    pub daily_calories: u32,
    pub daily_protein_grams: u32,
    pub daily_carbs_grams: u32,
    pub daily_fat_grams: u32,
}

impl NutritionGoals {
    /// Split a calorie target into macro grams
    pub fn from_calories(daily_calories: u32) -> Self {
        let kcal = daily_calories as f64;
        Self {
            daily_calories,
            daily_protein_grams: round_non_negative(kcal * PROTEIN_SHARE / KCAL_PER_GRAM_PROTEIN),
            daily_carbs_grams: round_non_negative(kcal * CARBS_SHARE / KCAL_PER_GRAM_CARBS),
            daily_fat_grams: round_non_negative(kcal * FAT_SHARE / KCAL_PER_GRAM_FAT),
        }
    }

    /// Energy of the macro targets in kcal
    pub fn macro_calories(&self) -> u32 {
        self.daily_protein_grams * KCAL_PER_GRAM_PROTEIN as u32
            + self.daily_carbs_grams * KCAL_PER_GRAM_CARBS as u32
            + self.daily_fat_grams * KCAL_PER_GRAM_FAT as u32
    }
}

/// Intermediate values of a goal calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalBreakdown {
    pub bmr: f64,
    pub activity_multiplier: f64,
    pub maintenance_calories: f64,
    pub goal_adjustment: f64,
    pub adjusted_calories: f64,
    /// True when the adjusted calories were negative and raised to zero
    pub floored: bool,
    pub goals: NutritionGoals,
}

/// Round half away from zero, clamped to the `u32` domain
fn round_non_negative(value: f64) -> u32 {
    let rounded = value.round();
    if rounded <= 0.0 {
        0
    } else if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day
pub fn basal_metabolic_rate(profile: &BodyProfile) -> f64 {
    10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * profile.age_years as f64
        + profile.sex.bmr_offset()
}

/// Compute the full calculation with its intermediate values
pub fn breakdown(profile: &BodyProfile) -> GoalBreakdown {
    let bmr = basal_metabolic_rate(profile);
    let activity_multiplier = profile.activity_level.multiplier();
    let maintenance_calories = bmr * activity_multiplier;
    let goal_adjustment = profile.goal.calorie_adjustment();
    let adjusted_calories = maintenance_calories + goal_adjustment;

    let floored = adjusted_calories < 0.0;
    if floored {
        tracing::warn!(
            adjusted_calories,
            "Calorie target below zero for profile, floored to 0"
        );
    }

    GoalBreakdown {
        bmr,
        activity_multiplier,
        maintenance_calories,
        goal_adjustment,
        adjusted_calories,
        floored,
        goals: NutritionGoals::from_calories(round_non_negative(adjusted_calories)),
    }
}

/// Daily calorie and macro targets for a profile
pub fn compute(profile: &BodyProfile) -> NutritionGoals {
    breakdown(profile).goals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        sex: Sex,
        weight_kg: f64,
        height_cm: f64,
        age_years: u32,
        activity_level: ActivityLevel,
        goal: Goal,
    ) -> BodyProfile {
        BodyProfile {
            sex,
            weight_kg,
            height_cm,
            age_years,
            activity_level,
            goal,
        }
    }

    fn reference_male(goal: Goal) -> BodyProfile {
        profile(Sex::Male, 70.0, 175.0, 25, ActivityLevel::ModeratelyActive, goal)
    }

    /// Coarse grid over the valid input space
    fn all_profiles() -> Vec<BodyProfile> {
        let mut out = Vec::new();
        for sex in [Sex::Male, Sex::Female, Sex::Other] {
            for weight in (30..=300).step_by(15) {
                for height in (100..=250).step_by(25) {
                    for age in (13..=120).step_by(13) {
                        for activity in ActivityLevel::ALL {
                            for goal in Goal::ALL {
                                out.push(profile(sex, weight as f64, height as f64, age, activity, goal));
                            }
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_male_moderately_active_maintain() {
        let b = breakdown(&reference_male(Goal::MaintainWeight));
        assert!((b.bmr - 1673.75).abs() < 1e-9);
        assert!((b.maintenance_calories - 2594.3125).abs() < 1e-9);
        assert_eq!(
            b.goals,
            NutritionGoals {
                daily_calories: 2594,
                daily_protein_grams: 195,
                daily_carbs_grams: 259,
                daily_fat_grams: 86,
            }
        );
        assert!(!b.floored);
    }

    #[test]
    fn test_male_lose_weight() {
        let goals = compute(&reference_male(Goal::LoseWeight));
        assert_eq!(goals.daily_calories, 2094);
    }

    #[test]
    fn test_female_sedentary_gain() {
        let p = profile(Sex::Female, 60.0, 165.0, 30, ActivityLevel::Sedentary, Goal::GainMuscle);
        let b = breakdown(&p);
        assert!((b.bmr - 1320.25).abs() < 1e-9);
        assert_eq!(b.goals.daily_calories, 1884);
    }

    #[test]
    fn test_other_uses_female_constant() {
        let female = profile(Sex::Female, 60.0, 165.0, 30, ActivityLevel::Sedentary, Goal::MaintainWeight);
        let other = BodyProfile { sex: Sex::Other, ..female };
        assert_eq!(compute(&female), compute(&other));
    }

    #[test]
    fn test_boundary_profile_is_floored_and_reported() {
        let p = profile(Sex::Female, 30.0, 100.0, 120, ActivityLevel::Sedentary, Goal::LoseWeight);
        let b = breakdown(&p);
        assert!(b.adjusted_calories < 0.0);
        assert!(b.floored);
        assert_eq!(b.goals.daily_calories, 0);
        assert_eq!(b.goals.daily_protein_grams, 0);
        assert_eq!(b.goals.daily_fat_grams, 0);

        // Same profile at maintenance stays positive and unfloored
        let b = breakdown(&BodyProfile { goal: Goal::MaintainWeight, ..p });
        assert!(!b.floored);
        assert_eq!(b.goals.daily_calories, 197);
    }

    #[test]
    fn test_improve_health_matches_maintain() {
        assert_eq!(
            compute(&reference_male(Goal::ImproveHealth)),
            compute(&reference_male(Goal::MaintainWeight))
        );
    }

    #[test]
    fn test_deterministic() {
        for p in all_profiles().iter().step_by(97) {
            assert_eq!(compute(p), compute(p));
        }
    }

    #[test]
    fn test_positive_whenever_adjusted_is_positive() {
        for p in all_profiles() {
            let b = breakdown(&p);
            if b.adjusted_calories >= 0.5 {
                assert!(b.goals.daily_calories > 0, "{:?}", p);
            }
        }
    }

    #[test]
    fn test_macro_energy_matches_calories_within_rounding() {
        // Each gram count is rounded on its own: at most 0.5g off for each macro,
        // i.e. 2 + 2 + 4.5 kcal.
        for p in all_profiles() {
            let goals = compute(&p);
            let diff = (goals.macro_calories() as f64 - goals.daily_calories as f64).abs();
            assert!(diff <= 8.5, "{:?} -> {:?}", p, goals);
        }
    }

    #[test]
    fn test_weight_monotonic() {
        for p in all_profiles().iter().step_by(7) {
            let heavier = BodyProfile { weight_kg: p.weight_kg + 5.0, ..*p };
            assert!(compute(&heavier).daily_calories >= compute(p).daily_calories);
        }
    }

    #[test]
    fn test_age_monotonic() {
        for p in all_profiles().iter().step_by(7) {
            let older = BodyProfile { age_years: p.age_years + 1, ..*p };
            assert!(compute(&older).daily_calories <= compute(p).daily_calories);
        }
    }

    #[test]
    fn test_goal_ordering() {
        for p in all_profiles().iter().filter(|p| p.goal == Goal::MaintainWeight) {
            let lose = compute(&BodyProfile { goal: Goal::LoseWeight, ..*p }).daily_calories;
            let maintain = compute(p).daily_calories;
            let gain = compute(&BodyProfile { goal: Goal::GainMuscle, ..*p }).daily_calories;
            assert!(lose < maintain, "{:?}", p);
            assert!(maintain < gain, "{:?}", p);
        }
    }

    #[test]
    fn test_parse_labels_and_aliases() {
        assert_eq!("Lightly Active".parse::<ActivityLevel>(), Ok(ActivityLevel::LightlyActive));
        assert_eq!("very_active".parse::<ActivityLevel>(), Ok(ActivityLevel::VeryActive));
        assert_eq!("Lose Weight".parse::<Goal>(), Ok(Goal::LoseWeight));
        assert_eq!("improveHealth".parse::<Goal>(), Ok(Goal::ImproveHealth));
        assert_eq!("gain".parse::<Goal>(), Ok(Goal::GainMuscle));
        assert_eq!("FEMALE".parse::<Sex>(), Ok(Sex::Female));
    }

    #[test]
    fn test_registration_defaults() {
        assert_eq!(ActivityLevel::default(), ActivityLevel::ModeratelyActive);
        assert_eq!(Goal::default(), Goal::MaintainWeight);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!(
            "Couch Potato".parse::<ActivityLevel>(),
            Err(GoalError::InvalidArgument {
                field: "activity_level",
                value: "Couch Potato".to_string()
            })
        );
        assert!("bulk".parse::<Goal>().is_err());
        assert!("".parse::<Sex>().is_err());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(reference_male(Goal::MaintainWeight).validate().is_ok());

        let light = BodyProfile { weight_kg: 29.9, ..reference_male(Goal::MaintainWeight) };
        assert!(matches!(
            light.validate(),
            Err(GoalError::OutOfRange { field: "weight_kg", .. })
        ));

        let young = BodyProfile { age_years: 12, ..reference_male(Goal::MaintainWeight) };
        assert!(matches!(
            young.validate(),
            Err(GoalError::OutOfRange { field: "age_years", .. })
        ));

        let nan = BodyProfile { height_cm: f64::NAN, ..reference_male(Goal::MaintainWeight) };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&ActivityLevel::ModeratelyActive).unwrap();
        assert_eq!(json, "\"Moderately Active\"");
        let goal: Goal = serde_json::from_str("\"Gain Muscle\"").unwrap();
        assert_eq!(goal, Goal::GainMuscle);
    }
}

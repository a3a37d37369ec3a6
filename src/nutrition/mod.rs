//! Nutrition calculation module
//!
//! Daily goal derivation from body metrics.

pub mod goals;

pub use goals::{
    basal_metabolic_rate, breakdown, compute, ActivityLevel, BodyProfile, Goal, GoalBreakdown,
    GoalError, GoalResult, NutritionGoals, Sex,
};

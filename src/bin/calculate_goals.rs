//! Print daily nutrition goals for a body profile
//! Usage: cargo run --bin calculate_goals -- <sex> <weight_kg> <height_cm> <age> [activity] [goal]

use mealgenius::nutrition::{breakdown, BodyProfile};

const USAGE: &str = "Usage: calculate_goals <sex> <weight_kg> <height_cm> <age> [activity] [goal]
  sex       Male | Female | Other
  activity  Sedentary | Lightly Active | Moderately Active | Very Active | Extremely Active
  goal      Lose Weight | Gain Muscle | Maintain Weight | Improve Health";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let profile = BodyProfile {
        sex: args[0].parse()?,
        weight_kg: args[1].parse()?,
        height_cm: args[2].parse()?,
        age_years: args[3].parse()?,
        activity_level: args.get(4).map(|s| s.parse()).transpose()?.unwrap_or_default(),
        goal: args.get(5).map(|s| s.parse()).transpose()?.unwrap_or_default(),
    };
    profile.validate()?;

    let result = breakdown(&profile);
    println!("BMR:                 {:.1} kcal", result.bmr);
    println!("Activity multiplier: {}", result.activity_multiplier);
    println!("Maintenance:         {:.1} kcal", result.maintenance_calories);
    println!("Goal adjustment:     {:+.0} kcal", result.goal_adjustment);
    if result.floored {
        println!("Target was negative and has been raised to zero");
    }
    println!();
    println!("Daily calories: {}", result.goals.daily_calories);
    println!("Protein:        {} g", result.goals.daily_protein_grams);
    println!("Carbs:          {} g", result.goals.daily_carbs_grams);
    println!("Fat:            {} g", result.goals.daily_fat_grams);

    Ok(())
}

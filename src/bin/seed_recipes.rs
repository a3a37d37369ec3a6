//! Load the bundled recipe catalog into the database
//! Usage: cargo run --bin seed_recipes

use mealgenius::config::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    println!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = mealgenius::db::Database::new(&config.database_path)?;

    database.with_conn(|conn| {
        mealgenius::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let summary = database.with_conn(|conn| mealgenius::seed::seed_recipes(conn))?;
    println!("Removed {} unused recipes", summary.removed);
    println!("Inserted {} recipes", summary.inserted);
    if summary.skipped > 0 {
        println!("Skipped {} recipes already used by meal plans", summary.skipped);
    }
    println!("Catalog now holds {} recipes", summary.total_recipes);

    Ok(())
}

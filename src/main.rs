//! MealGenius
//!
//! An MCP server for diet planning and nutrition tracking.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use mealgenius::assistant::{GeminiClient, TextGenerator};
use mealgenius::build_info;
use mealgenius::config::Config;
use mealgenius::db;
use mealgenius::mcp::MealGeniusService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr, stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mealgenius=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    eprintln!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&config.database_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let generator = match config.gemini_api_key.clone() {
        Some(key) => {
            let model = config.gemini_model.clone();
            // The blocking client owns a runtime and must be built off the async threads
            match tokio::task::spawn_blocking(move || GeminiClient::new(key, model)).await? {
                Ok(client) => {
                    tracing::info!(model = %config.gemini_model, "Gemini assistant enabled");
                    Some(Arc::new(client) as Arc<dyn TextGenerator>)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Gemini client unavailable, using demo responses");
                    None
                }
            }
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set, using demo responses");
            None
        }
    };

    let service = MealGeniusService::new(&config, database, generator);

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}

//! Runtime configuration
//!
//! Read once from environment variables at startup.

use std::path::PathBuf;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    /// Unset means the assistant runs in mock mode
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub report_dir: PathBuf,
}

impl Config {
    /// Build the configuration from `MEALGENIUS_*` and `GEMINI_*` variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let root = project_root();

        Self {
            database_path: non_empty("MEALGENIUS_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| root.join("data").join("mealgenius.db")),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            report_dir: non_empty("MEALGENIUS_REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| root.join("reports")),
        }
    }
}

/// Directory of the executable, or the project root when running from
/// `target/debug` or `target/release`
fn project_root() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path
}

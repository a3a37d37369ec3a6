//! MealGenius Library
//!
//! Diet planning, nutrition goals and health tracking behind an MCP server.

pub mod assistant;
pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod seed;
pub mod tools;

//! Common library for the Tubely services
//!
//! This crate provides shared functionality used across the workspace:
//! configuration loading, database connectivity and the shared database
//! error type.

pub mod config;
pub mod database;
pub mod error;

/// Example usage of the configuration and database modules
///
/// ```rust,no_run
/// use common::config::AppConfig;
/// use common::database::{health_check, init_pool};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = AppConfig::load()?;
///     let pool = init_pool(&config.database).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}

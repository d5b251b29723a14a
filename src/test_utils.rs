//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{company, project, user},
    dto::{CompanyDto, ProjectDto, UserDto},
    entities::{self, UserType},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user.
///
/// # Defaults
/// * email: the lowercased name with spaces replaced by dots, at `test.local`
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    user_type: UserType,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        UserDto {
            name: name.to_string(),
            email: format!("{}@test.local", name.to_lowercase().replace(' ', ".")),
            user_type,
        },
    )
    .await
}

/// Creates a company owned by `owner` with no description.
pub async fn create_test_company(
    db: &DatabaseConnection,
    owner: &entities::user::Model,
    name: &str,
) -> Result<entities::company::Model> {
    company::create_company(
        db,
        owner,
        CompanyDto {
            name: name.to_string(),
            about: None,
        },
    )
    .await
}

/// Creates an undated project owned by `owner`, optionally under a company.
pub async fn create_test_project(
    db: &DatabaseConnection,
    owner: &entities::user::Model,
    name: &str,
    company_id: Option<i64>,
) -> Result<entities::project::Model> {
    project::create_project(
        db,
        owner,
        ProjectDto {
            name: name.to_string(),
            company_id,
            ..Default::default()
        },
    )
    .await
}

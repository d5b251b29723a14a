//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs
//! without hand-written SQL.

use crate::entities::{
    Authorization, Company, Job, Level, Permission, Project, ProjectSession, Relation, Request,
    Response, Role, Skill, SystemState, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Fallback used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/mentor_hub.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to [`DEFAULT_DATABASE_URL`] if no environment variable is set.
#[instrument]
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table_for<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Tables are created in foreign-key order: owners before the rows referencing them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, User).await?;
    create_table_for(db, &schema, Company).await?;
    create_table_for(db, &schema, Project).await?;
    create_table_for(db, &schema, ProjectSession).await?;
    create_table_for(db, &schema, Skill).await?;
    create_table_for(db, &schema, Level).await?;
    create_table_for(db, &schema, Job).await?;
    create_table_for(db, &schema, Role).await?;
    create_table_for(db, &schema, Permission).await?;
    create_table_for(db, &schema, Relation).await?;
    create_table_for(db, &schema, Request).await?;
    create_table_for(db, &schema, Response).await?;
    create_table_for(db, &schema, Authorization).await?;
    create_table_for(db, &schema, SystemState).await?;

    info!("Database tables ensured.");
    Ok(())
}

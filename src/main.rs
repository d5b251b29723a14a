use dotenvy::dotenv;
use mentor_hub::{
    config::{self, database},
    core::seed,
    errors::{Error, Result},
};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can be set externally
    dotenv().ok();

    // 3. Connect and make sure every table exists
    ensure_sqlite_dir(&database::get_database_url())?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the admin account and catalog from config.toml
    match config::seed::load_default_config() {
        Ok(seed_config) => {
            let summary = seed::seed_from_config(&db, &seed_config)
                .await
                .inspect_err(|e| error!("Failed to seed database: {}", e))?;
            info!("{}", seed::format_seed_summary(&summary));
        }
        Err(Error::Config { message }) => {
            warn!("Skipping seeding: {}", message);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

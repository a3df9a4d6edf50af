//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::SqlitePool;
use thiserror::Error;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] mercadito_server::db::RepositoryError),
}

/// Connect to the database named by `MERCADITO_DATABASE_URL`.
async fn connect() -> Result<SqlitePool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("MERCADITO_DATABASE_URL")
        .map_err(|_| CommandError::MissingEnvVar("MERCADITO_DATABASE_URL"))?;

    Ok(mercadito_server::db::create_pool(&SecretString::from(database_url)).await?)
}

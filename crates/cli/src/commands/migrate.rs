//! Database migration command.

use super::CommandError;

/// Run the embedded migrations against the configured database.
///
/// # Errors
///
/// Returns [`CommandError`] if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    mercadito_server::db::MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}

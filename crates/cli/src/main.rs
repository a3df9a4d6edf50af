//! Mercadito CLI - Database migrations and fixtures.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mercadito-cli migrate
//!
//! # Seed the catalog with sample products
//! mercadito-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `MERCADITO_DATABASE_URL` - `SQLite` connection string
//!   (e.g., `sqlite://mercadito.db`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mercadito-cli")]
#[command(author, version, about = "Mercadito CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with sample products
    Seed,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed => commands::seed::run().await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

//! Visitmark CLI - Database migrations and customer management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! visitmark-cli migrate
//!
//! # List customers, most recently updated first
//! visitmark-cli customers list
//!
//! # Delete a customer
//! visitmark-cli customers delete 3f2c0d4e-8a8b-4f5e-9a41-0c1d2e3f4a5b
//! ```
//!
//! Reads the same environment as the server (`LOYALTY_DATABASE_URL`,
//! `EMBEDDING_DIM`, ...), including a `.env` file if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "visitmark-cli")]
#[command(author, version, about = "Visitmark CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage enrolled customers
    Customers {
        #[command(subcommand)]
        action: CustomersAction,
    },
}

#[derive(Subcommand)]
enum CustomersAction {
    /// List customers, most recently updated first
    List,
    /// Delete a customer and its embedding
    Delete {
        /// Customer ID (UUID)
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Customers { action } => match action {
            CustomersAction::List => commands::customers::list().await?,
            CustomersAction::Delete { id } => commands::customers::delete(&id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delete() {
        let cli = Cli::try_parse_from(["visitmark-cli", "customers", "delete", "abc"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Customers {
                action: CustomersAction::Delete { ref id }
            }) if id == "abc"
        ));
    }

    #[test]
    fn test_delete_requires_id() {
        assert!(Cli::try_parse_from(["visitmark-cli", "customers", "delete"]).is_err());
    }
}

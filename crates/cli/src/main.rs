//! Spin Swipe CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ss-cli migrate
//!
//! # Re-run install provisioning for a shop (metafield definitions)
//! ss-cli provision --shop demo.myshopify.com
//!
//! # Drop every stored session for a shop
//! ss-cli sessions purge --shop demo.myshopify.com
//! ```
//!
//! All commands read the app's environment (`DATABASE_URL`, and the
//! `SHOPIFY_*` variables for `provision`), loading `.env` when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ss-cli")]
#[command(author, version, about = "Spin Swipe CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create the product metafield definitions for a shop
    Provision {
        /// Shop domain (e.g., demo.myshopify.com)
        #[arg(short, long)]
        shop: String,
    },
    /// Manage stored shop sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// Delete every session stored for a shop
    Purge {
        /// Shop domain (e.g., demo.myshopify.com)
        #[arg(short, long)]
        shop: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Provision { shop } => commands::provision::run(&shop).await?,
        Commands::Sessions { action } => match action {
            SessionsAction::Purge { shop } => {
                commands::sessions::purge(&shop).await?;
            }
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
    fn test_parse_sessions_purge() {
        let cli = Cli::try_parse_from(["ss-cli", "sessions", "purge", "--shop", "demo.myshopify.com"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::Sessions { action: SessionsAction::Purge { ref shop } } if shop == "demo.myshopify.com"
        ));
    }

    #[test]
    fn test_provision_requires_shop() {
        assert!(Cli::try_parse_from(["ss-cli", "provision"]).is_err());
    }
}

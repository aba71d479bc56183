//! Woodshop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ws-cli migrate
//!
//! # Manage admins
//! ws-cli admin grant owner@woodshop.com
//! ws-cli admin revoke former@woodshop.com
//! ws-cli admin list
//!
//! # Delete orphaned Cloudinary project folders (cron entry point)
//! ws-cli cleanup [--max-age-secs N] [--dry-run]
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ws-cli")]
#[command(author, version, about = "Woodshop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Delete unreferenced Cloudinary project folders
    Cleanup {
        /// Minimum folder age in seconds (default: `ORPHANED_FOLDER_MAX_AGE_SECS`)
        #[arg(long)]
        max_age_secs: Option<u64>,

        /// List the folders that would be deleted without deleting them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Flag a user as admin
    Grant {
        /// Admin email address
        email: String,
    },
    /// Clear a user's admin flag
    Revoke {
        /// Admin email address
        email: String,
    },
    /// List admins
    List,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

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
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::grant(&email).await?,
            AdminAction::Revoke { email } => commands::admin::revoke(&email).await?,
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Cleanup {
            max_age_secs,
            dry_run,
        } => commands::cleanup::run(max_age_secs, dry_run).await?,
    }
    Ok(())
}

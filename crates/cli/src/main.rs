//! SMS Manager CLI - Database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sms-cli migrate
//!
//! # Create a user
//! sms-cli admin create -e jane@example.com -f Jane -p 'long password'
//!
//! # Create the default admin from ADMIN_EMAIL / ADMIN_PASSWORD
//! sms-cli admin seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "sms-cli")]
#[command(author, version, about = "SMS Manager CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new user
    Create {
        /// Email address (stored lowercase)
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        firstname: String,

        /// Last name
        #[arg(short, long)]
        lastname: Option<String>,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Create the "Admin Admin" user from `ADMIN_EMAIL` and `ADMIN_PASSWORD`
    Seed,
}

#[tokio::main]
async fn main() {
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
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                firstname,
                lastname,
                password,
            } => {
                let password = SecretString::from(password);
                commands::admin::create(&email, &firstname, lastname.as_deref(), &password)
                    .await?;
            }
            AdminAction::Seed => commands::admin::seed().await?,
        },
    }
    Ok(())
}

//! User management commands.
//!
//! Users can only be created here; the API has no sign-up route.
//!
//! # Usage
//!
//! ```bash
//! # Create a user
//! sms-cli admin create -e jane@example.com -f Jane -l Doe -p 'long password'
//!
//! # Create the "Admin Admin" user from ADMIN_EMAIL / ADMIN_PASSWORD
//! sms-cli admin seed
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_EMAIL`, `ADMIN_PASSWORD` - credentials for `admin seed`

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use sms_manager_api::db::{self, UserRepository};
use sms_manager_api::services::AuthError;
use sms_manager_api::services::auth::create_user;
use sms_manager_core::{Email, PersonName, UserId};

use super::{MissingEnvVar, database_url};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Could not create user: {0}")]
    Auth(AuthError),
}

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if any field is invalid, the email is taken or the
/// database is unreachable.
pub async fn create(
    email: &str,
    firstname: &str,
    lastname: Option<&str>,
    password: &SecretString,
) -> Result<UserId, AdminError> {
    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    let firstname =
        PersonName::parse(firstname).map_err(|e| AdminError::InvalidName(e.to_string()))?;
    let lastname = lastname
        .map(PersonName::parse)
        .transpose()
        .map_err(|e| AdminError::InvalidName(e.to_string()))?;

    let database_url = database_url()?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let users = UserRepository::new(pool);

    tracing::info!("Creating user: {}", email);
    let user = create_user(
        &users,
        firstname,
        lastname,
        email.clone(),
        password.expose_secret(),
    )
    .await
    .map_err(|e| match e {
        AuthError::UserAlreadyExists => AdminError::UserExists(email.to_string()),
        other => AdminError::Auth(other),
    })?;

    tracing::info!("User created successfully! ID: {}, Email: {}", user.id, user.email);
    Ok(user.id)
}

/// Create the default "Admin Admin" user.
///
/// Does nothing if a user with `ADMIN_EMAIL` already exists.
///
/// # Errors
///
/// Returns an error if `ADMIN_EMAIL` or `ADMIN_PASSWORD` is unset, or if
/// creating the user fails for any reason other than it already existing.
pub async fn seed() -> Result<(), AdminError> {
    dotenvy::dotenv().ok();
    let email =
        std::env::var("ADMIN_EMAIL").map_err(|_| MissingEnvVar("ADMIN_EMAIL"))?;
    let password = std::env::var("ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| MissingEnvVar("ADMIN_PASSWORD"))?;

    match create(&email, "Admin", Some("Admin"), &password).await {
        Ok(_) => Ok(()),
        Err(AdminError::UserExists(email)) => {
            tracing::info!("Admin user {} already exists, skipping", email);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

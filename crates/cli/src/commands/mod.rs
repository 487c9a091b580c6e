pub mod admin;
pub mod migrate;

use secrecy::SecretString;

/// Read `DATABASE_URL`, loading `.env` first.
fn database_url() -> Result<SecretString, MissingEnvVar> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MissingEnvVar("DATABASE_URL"))
}

/// Required environment variable is missing.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVar(pub &'static str);

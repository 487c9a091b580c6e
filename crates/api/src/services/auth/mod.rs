//! Authentication service.
//!
//! Password sign-in issuing JWT bearer tokens, and token validation for
//! protected routes. Users are seeded through the CLI with [`create_user`].

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService};

use std::sync::{Arc, LazyLock};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use sms_manager_core::{Email, PersonName, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User, UserProfile};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash verified when the email is unknown, so both failure paths cost one
/// argon2 verification.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("timing-equaliser-password").unwrap_or_default());

/// Request-scoped identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Email,
}

/// A successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: UserProfile,
    pub token: String,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user doesn't exist or
    /// the password is wrong.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn signin(&self, email: &Email, password: &str) -> Result<SignedIn, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            // Burn the same time as a real verification
            let _ = verify_password(password, &DUMMY_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(user.id, &user.email)?;
        tracing::info!(user_id = %user.id, "user signed in");

        Ok(SignedIn {
            user: user.into(),
            token,
        })
    }

    /// Validate a bearer token and resolve it to an identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token fails validation or
    /// its user no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .users
            .find_by_id_and_email(claims.id, &claims.email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(Identity {
            user_id: user.id,
            email: user.email,
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

/// Hash and store a new user.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short,
/// `AuthError::UserAlreadyExists` if the email is taken.
pub async fn create_user(
    users: &dyn UserStore,
    firstname: PersonName,
    lastname: Option<PersonName>,
    email: Email,
    password: &str,
) -> Result<User, AuthError> {
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    users
        .create(NewUser {
            firstname,
            lastname,
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::Algorithm;
    use secrecy::SecretString;

    use super::*;
    use crate::config::JwtConfig;
    use crate::db::MemoryStore;

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: SecretString::from("q7$Lm2!xV9@rT4#nB8^kW1&zP5*cH3%d"),
            issuer: "sms-manager".to_owned(),
            audience: "sms-clients".to_owned(),
            algorithm: Algorithm::HS256,
            ttl: Duration::from_secs(3600),
        })
    }

    async fn service_with_admin() -> (AuthService, MemoryStore) {
        let store = MemoryStore::new();
        create_user(
            &store,
            PersonName::parse("Admin").unwrap(),
            Some(PersonName::parse("Admin").unwrap()),
            Email::parse("admin@sms.dev").unwrap(),
            "correct horse",
        )
        .await
        .unwrap();
        (AuthService::new(Arc::new(store.clone()), tokens()), store)
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("s3cure-pass").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cure-pass", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-pass", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eight ch").is_ok());
    }

    #[tokio::test]
    async fn test_signin_success() {
        let (auth, _) = service_with_admin().await;
        let email = Email::parse("ADMIN@sms.dev").unwrap();

        let signed_in = auth.signin(&email, "correct horse").await.unwrap();
        assert_eq!(signed_in.user.email.as_str(), "admin@sms.dev");
        assert_eq!(signed_in.user.lastname.as_deref(), Some("Admin"));

        let identity = auth.authenticate(&signed_in.token).await.unwrap();
        assert_eq!(identity.user_id, signed_in.user.id);
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let (auth, _) = service_with_admin().await;
        let email = Email::parse("admin@sms.dev").unwrap();
        assert!(matches!(
            auth.signin(&email, "battery staple").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_signin_unknown_email() {
        let (auth, _) = service_with_admin().await;
        let email = Email::parse("nobody@sms.dev").unwrap();
        assert!(matches!(
            auth.signin(&email, "correct horse").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_token_for_missing_user() {
        let (auth, _) = service_with_admin().await;
        let token = auth
            .tokens()
            .issue(UserId::new(99), &Email::parse("ghost@sms.dev").unwrap())
            .unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let (_, store) = service_with_admin().await;
        let result = create_user(
            &store,
            PersonName::parse("Other").unwrap(),
            None,
            Email::parse("admin@sms.dev").unwrap(),
            "another password",
        )
        .await;
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
    }
}

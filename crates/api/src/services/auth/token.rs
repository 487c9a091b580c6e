//! JWT issuance and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use sms_manager_core::{Email, UserId};

use super::AuthError;
use crate::config::JwtConfig;

/// JWT claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub email: Email,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Signs and verifies access tokens with a shared HMAC key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl_secs: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            header: Header::new(config.algorithm),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl_secs: i64::try_from(config.ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Issue a token for `id`/`email`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, id: UserId, email: &Email) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        self.sign(&Claims {
            id,
            email: email.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        })
    }

    /// Sign arbitrary claims with this service's key and algorithm.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&self.header, claims, &self.encoding_key).map_err(AuthError::TokenSigning)
    }

    /// Decode and validate a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` on any signature, algorithm, expiry,
    /// issuer, audience or payload failure.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::Algorithm;
    use secrecy::SecretString;

    use super::*;

    fn config(secret: &str, audience: &str, algorithm: Algorithm) -> JwtConfig {
        JwtConfig {
            secret: SecretString::from(secret),
            issuer: "sms-manager".to_owned(),
            audience: audience.to_owned(),
            algorithm,
            ttl: Duration::from_secs(48 * 3600),
        }
    }

    fn service() -> TokenService {
        TokenService::new(&config(
            "q7$Lm2!xV9@rT4#nB8^kW1&zP5*cH3%d",
            "sms-clients",
            Algorithm::HS256,
        ))
    }

    fn email() -> Email {
        Email::parse("admin@sms.dev").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue(UserId::new(1), &email()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, UserId::new(1));
        assert_eq!(claims.email, email());
        assert_eq!(claims.iss, "sms-manager");
        assert_eq!(claims.aud, "sms-clients");
        assert_eq!(claims.exp - claims.iat, 48 * 3600);
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            service().verify("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = TokenService::new(&config(
            "Z9#kd3!Qp7@Lx2$Vr6^Nb1&Tm8*Hc4%w",
            "sms-clients",
            Algorithm::HS256,
        ));
        let token = other.issue(UserId::new(1), &email()).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_foreign_audience_rejected() {
        let other = TokenService::new(&config(
            "q7$Lm2!xV9@rT4#nB8^kW1&zP5*cH3%d",
            "someone-else",
            Algorithm::HS256,
        ));
        let token = other.issue(UserId::new(1), &email()).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let other = TokenService::new(&config(
            "q7$Lm2!xV9@rT4#nB8^kW1&zP5*cH3%d",
            "sms-clients",
            Algorithm::HS512,
        ));
        let token = other.issue(UserId::new(1), &email()).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                id: UserId::new(1),
                email: email(),
                iat: now - 7200,
                exp: now - 3600,
                iss: "sms-manager".to_owned(),
                aud: "sms-clients".to_owned(),
            })
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken)));
    }
}

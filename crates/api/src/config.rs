//! Runtime settings, read once from the process environment (and `.env`).
//!
//! | Variable | Default | Notes |
//! |---|---|---|
//! | `DATABASE_URL` | required | `PostgreSQL` connection string |
//! | `JWT_SECRET_KEY` | required | HMAC key, 32+ chars, no placeholders |
//! | `JWT_ISSUER` | required | `iss` claim |
//! | `JWT_AUDIENCE` | required | `aud` claim |
//! | `JWT_ALGO` | `HS256` | `HS256`, `HS384` or `HS512` |
//! | `JWT_TTL_HOURS` | `48` | token lifetime |
//! | `HOST` / `PORT` | `127.0.0.1` / `3000` | listen address |
//! | `DELIVERY_PAGE_MS` | `1000` | simulated send time per 160-char page |
//! | `LOG_FORMAT` | text | `json` switches to structured logs |
//! | `SENTRY_DSN` | unset | Sentry stays off without it |
//! | `SENTRY_ENVIRONMENT` | unset | |
//! | `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` | `1.0` | |

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
/// Below this a key is almost certainly typed by hand.
const MIN_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_JWT_TTL_HOURS: u64 = 48;
const DEFAULT_DELIVERY_PAGE_MS: u64 = 1000;

/// Fragments that show up in copied `.env.example` values.
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "replace",
    "insert",
    "xxx",
    "todo",
    "fixme",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(String),
    #[error("{0} is invalid: {1}")]
    InvalidEnvVar(String, String),
    #[error("{0} is not safe to use: {1}")]
    InsecureSecret(String, String),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Carries the database password.
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub jwt: JwtConfig,
    /// Time to "send" one 160-character page.
    pub delivery_page: Duration,
    pub json_logs: bool,
    pub sentry: SentryConfig,
}

/// Error reporting. Everything here is inert while `dsn` is `None`.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// Token signing settings. `Debug` never prints the key.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Read every setting, loading `.env` first when one exists.
    ///
    /// # Errors
    ///
    /// Fails on the first variable that is missing, unparsable or, for the
    /// signing key, too weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let delivery_page_ms: u64 = parsed_or("DELIVERY_PAGE_MS", DEFAULT_DELIVERY_PAGE_MS)?;

        Ok(Self {
            database_url: required("DATABASE_URL").map(SecretString::from)?,
            host: parsed_or("HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parsed_or("PORT", 3000)?,
            jwt: JwtConfig::from_env()?,
            delivery_page: Duration::from_millis(delivery_page_ms),
            json_logs: optional("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry: SentryConfig::from_env(),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SentryConfig {
    fn from_env() -> Self {
        // A bad rate falls back to the default instead of refusing to boot.
        let rate = |key: &str| {
            optional(key)
                .and_then(|raw| raw.parse::<f32>().ok())
                .unwrap_or(1.0)
        };
        Self {
            dsn: optional("SENTRY_DSN"),
            environment: optional("SENTRY_ENVIRONMENT"),
            sample_rate: rate("SENTRY_SAMPLE_RATE"),
            traces_sample_rate: rate("SENTRY_TRACES_SAMPLE_RATE"),
        }
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        const KEY_VAR: &str = "JWT_SECRET_KEY";

        let key = required(KEY_VAR)?;
        check_signing_key(&key)
            .map_err(|reason| ConfigError::InsecureSecret(KEY_VAR.into(), reason))?;

        let algorithm = optional("JWT_ALGO").map_or(Ok(Algorithm::HS256), |raw| {
            hmac_algorithm(&raw)
                .map_err(|reason| ConfigError::InvalidEnvVar("JWT_ALGO".into(), reason))
        })?;

        let ttl_hours: u64 = parsed_or("JWT_TTL_HOURS", DEFAULT_JWT_TTL_HOURS)?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_TTL_HOURS".into(),
                "must be at least 1".into(),
            ));
        }

        Ok(Self {
            secret: SecretString::from(key),
            issuer: required("JWT_ISSUER")?,
            audience: required("JWT_AUDIENCE")?,
            algorithm,
            ttl: Duration::from_secs(ttl_hours * 3600),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    optional(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
    })
}

/// HMAC only: the API both signs and verifies with the one key.
fn hmac_algorithm(raw: &str) -> Result<Algorithm, String> {
    match raw.to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(format!("{other} is not one of HS256, HS384, HS512")),
    }
}

/// Reject short keys, copied placeholders and low-entropy strings.
fn check_signing_key(key: &str) -> Result<(), String> {
    let length = key.chars().count();
    if length < MIN_JWT_SECRET_LENGTH {
        return Err(format!(
            "needs {MIN_JWT_SECRET_LENGTH} or more characters, has {length}"
        ));
    }

    let lowered = key.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lowered.contains(**f)) {
        return Err(format!("looks like a placeholder (contains \"{fragment}\")"));
    }

    let bits = bits_per_char(key);
    if bits < MIN_BITS_PER_CHAR {
        return Err(format!(
            "only {bits:.2} bits of entropy per character, want {MIN_BITS_PER_CHAR:.1}; generate it randomly"
        ));
    }
    Ok(())
}

/// Shannon entropy of the character distribution.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0u32;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_KEY: &str = "kR8#vN2q!Lz6@wP4$tY9^bH3&mC7*xF1";

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: SecretString::from(STRONG_KEY),
            issuer: "sms-manager".to_owned(),
            audience: "sms-manager-clients".to_owned(),
            algorithm: Algorithm::HS256,
            ttl: Duration::from_secs(DEFAULT_JWT_TTL_HOURS * 3600),
        }
    }

    fn api(database_url: &str) -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from(database_url),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            jwt: jwt(),
            delivery_page: Duration::from_millis(DEFAULT_DELIVERY_PAGE_MS),
            json_logs: false,
            sentry: SentryConfig {
                dsn: None,
                environment: None,
                sample_rate: 1.0,
                traces_sample_rate: 1.0,
            },
        }
    }

    #[test]
    fn test_bits_per_char() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!(bits_per_char("zzzzzz").abs() < f64::EPSILON);
        assert!((bits_per_char("01") - 1.0).abs() < 1e-9);
        assert!((bits_per_char("0123") - 2.0).abs() < 1e-9);
        assert!(bits_per_char(STRONG_KEY) > MIN_BITS_PER_CHAR);
    }

    #[test]
    fn test_signing_key_checks() {
        assert!(check_signing_key(STRONG_KEY).is_ok());

        let short = check_signing_key("kR8#vN2q!Lz6").unwrap_err();
        assert!(short.contains("32"));

        let placeholder = check_signing_key("your-jwt-signing-key-goes-in-here!!").unwrap_err();
        assert!(placeholder.contains("your-"));

        let repetitive = check_signing_key(&"q1".repeat(20)).unwrap_err();
        assert!(repetitive.contains("entropy"));
    }

    #[test]
    fn test_hmac_algorithm() {
        assert_eq!(hmac_algorithm("HS256"), Ok(Algorithm::HS256));
        assert_eq!(hmac_algorithm("hs384"), Ok(Algorithm::HS384));
        assert_eq!(hmac_algorithm("Hs512"), Ok(Algorithm::HS512));
        assert!(hmac_algorithm("RS256").is_err());
        assert!(hmac_algorithm("none").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = api("postgres://localhost/sms_manager").socket_addr();
        assert_eq!(addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let printed = format!("{:?}", api("postgres://app:hunter2@db/sms"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("kR8#vN2q"));
        assert!(printed.contains("[REDACTED]"));
        assert!(printed.contains("sms-manager-clients"));
    }
}

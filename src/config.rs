use std::env;

/// Development fallback for the token signing secret. Never accepted in production.
pub const LOCAL_JWT_SECRET: &str = "blog-guard-local-development-secret";

/// Default lifetime of an issued access token, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 100;

/// Upper bound accepted for `TOKEN_TTL_SECS`: 30 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards; the signing secret in particular is constant for the lifetime
/// of the process. It is pulled into the application state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Runtime environment marker. Controls log format and how misconfigured
    // authorization requirements are handled.
    pub env: Env,
    // HMAC secret used to sign and verify access tokens.
    pub jwt_secret: String,
    // Validity window of a freshly issued token.
    pub token_ttl_secs: i64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context. `Local` fails loudly on programming errors in
/// operation declarations; `Production` degrades them to a plain denial.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration used for test state setup.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if `JWT_SECRET` or `DATABASE_URL` is missing in production, or if
    /// `TOKEN_TTL_SECS` is set but is not an integer in `1..=MAX_TOKEN_TTL_SECS`.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            // Without a database the local build runs against the in-memory store.
            Env::Local => env::var("DATABASE_URL").ok(),
        };

        let token_ttl_secs = match env::var("TOKEN_TTL_SECS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(secs) if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) => secs,
                _ => panic!(
                    "FATAL: TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}, got {raw:?}"
                ),
            },
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            db_url,
            env,
            jwt_secret,
            token_ttl_secs,
            bind_addr,
        }
    }
}

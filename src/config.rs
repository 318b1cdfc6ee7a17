use serde::Deserialize;
use tracing::warn;

/// Two independent secrets: a refresh token must never verify against the
/// access secret and vice versa.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;

        let jwt = JwtConfig {
            access_secret: env_secret("JWT_ACCESS_SECRET", "dev-access-secret"),
            refresh_secret: env_secret("JWT_REFRESH_SECRET", "dev-refresh-secret"),
            // Reference defaults: 7 day access tokens, 30 day refresh tokens.
            access_ttl_minutes: env_minutes("JWT_ACCESS_TTL_MINUTES", 7 * 24 * 60),
            refresh_ttl_minutes: env_minutes("JWT_REFRESH_TTL_MINUTES", 30 * 24 * 60),
        };

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into());

        Ok(Self {
            database_url,
            jwt,
            cors_origin,
        })
    }
}

fn env_secret(key: &str, placeholder: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        warn!(%key, "signing secret not set, using insecure placeholder");
        placeholder.to_string()
    })
}

fn env_minutes(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

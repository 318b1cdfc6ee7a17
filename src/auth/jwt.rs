use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Identity assertion embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub email: String,
    pub username: String,
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
}

/// Ephemeral access/refresh pair. Nothing is persisted server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signing and verification keys. Access and refresh tokens use distinct
/// secrets, so a token minted for one purpose cannot verify for the other.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let jwt = &state.config.jwt;
        Self {
            access_encoding: EncodingKey::from_secret(jwt.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(jwt.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(jwt.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(jwt.refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((jwt.access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((jwt.refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign(&self, user_id: Uuid, email: &str, username: &str, key: &EncodingKey, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            username: username.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, key)?;
        debug!(%user_id, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, email: &str, username: &str) -> anyhow::Result<String> {
        self.sign(user_id, email, username, &self.access_encoding, self.access_ttl)
    }

    pub fn sign_refresh(&self, user_id: Uuid, email: &str, username: &str) -> anyhow::Result<String> {
        self.sign(user_id, email, username, &self.refresh_encoding, self.refresh_ttl)
    }

    pub fn sign_pair(&self, user_id: Uuid, email: &str, username: &str) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign_access(user_id, email, username)?,
            refresh_token: self.sign_refresh(user_id, email, username)?,
        })
    }

    fn verify(token: &str, key: &DecodingKey) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, key, &Validation::default())?;
        Ok(data.claims)
    }

    /// Fails for a malformed token, a bad or wrong-secret signature, or an
    /// expired timestamp.
    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        Self::verify(token, &self.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        Self::verify(token, &self.refresh_decoding)
    }

    /// Claims without signature or expiry validation. Never use the result
    /// for an authorization decision.
    pub fn decode_unverified(token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|d| d.claims)
    }
}

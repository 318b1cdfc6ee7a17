use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// How aggressively a user sizes their bets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "risk_appetite", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskAppetite {
    Conservative,
    Balanced,
    Aggressive,
}

impl Default for RiskAppetite {
    fn default() -> Self {
        Self::Balanced
    }
}

/// User record in the database. `is_active = false` users cannot
/// authenticate; rows are never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // never exposed in JSON
    pub bankroll: Decimal,
    pub risk_appetite: RiskAppetite,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// 1:1 extension of a user, created with defaults at registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_sports: Vec<String>,
    pub notification_enabled: bool,
    pub email_notifications: bool,
    pub dashboard_layout: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "punter@example.com".into(),
            username: "punter".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            bankroll: Decimal::new(5000, 2),
            risk_appetite: RiskAppetite::Balanced,
            is_active: true,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("punter@example.com"));
    }

    #[test]
    fn risk_appetite_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskAppetite::Conservative).unwrap(),
            "\"conservative\""
        );
        let parsed: RiskAppetite = serde_json::from_str("\"aggressive\"").unwrap();
        assert_eq!(parsed, RiskAppetite::Aggressive);
    }
}

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{RiskAppetite, User, UserPreferences};

const USER_COLUMNS: &str = "id, email, username, password_hash, bankroll, risk_appetite, \
                            is_active, last_login, created_at, updated_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Inserts the user row and its default preferences in one transaction,
    /// so a preferences failure cannot leave an orphaned user behind.
    pub async fn create_with_preferences(
        db: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
        bankroll: Decimal,
        risk_appetite: RiskAppetite,
    ) -> anyhow::Result<(User, UserPreferences)> {
        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash, bankroll, risk_appetite)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(bankroll)
        .bind(risk_appetite)
        .fetch_one(&mut *tx)
        .await?;

        let preferences = sqlx::query_as::<_, UserPreferences>(
            r#"
            INSERT INTO user_preferences (user_id, preferred_sports, notification_enabled, email_notifications)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, preferred_sports, notification_enabled, email_notifications,
                      dashboard_layout, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(vec!["NBA".to_string()])
        .bind(true)
        .bind(false)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user, preferences))
    }

    pub async fn update_last_login(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Fields a client may change on its preferences row. Updates are limited to
/// this enumerated set; absent fields keep their current value.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PreferencesUpdate {
    pub preferred_sports: Option<Vec<String>>,
    pub notification_enabled: Option<bool>,
    pub email_notifications: Option<bool>,
    pub dashboard_layout: Option<serde_json::Value>,
}

impl UserPreferences {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserPreferences>> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            SELECT id, user_id, preferred_sports, notification_enabled, email_notifications,
                   dashboard_layout, created_at, updated_at
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(prefs)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> anyhow::Result<Option<UserPreferences>> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            UPDATE user_preferences SET
                preferred_sports = COALESCE($2, preferred_sports),
                notification_enabled = COALESCE($3, notification_enabled),
                email_notifications = COALESCE($4, email_notifications),
                dashboard_layout = COALESCE($5, dashboard_layout),
                updated_at = now()
            WHERE user_id = $1
            RETURNING id, user_id, preferred_sports, notification_enabled, email_notifications,
                      dashboard_layout, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(update.preferred_sports)
        .bind(update.notification_enabled)
        .bind(update.email_notifications)
        .bind(update.dashboard_layout)
        .fetch_optional(db)
        .await?;
        Ok(prefs)
    }
}

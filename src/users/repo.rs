use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::ResetToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_changed_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub active: bool,
    pub created_at: OffsetDateTime,
}

impl User {
    /// True iff the password was changed after the given token issue time
    /// (seconds since epoch). A token issued before the change is stale.
    pub fn changed_password_after(&self, token_issued_at: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => changed_at.unix_timestamp() > token_issued_at,
            None => false,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role.as_str()
    }

    /// Find an active user by email. Deactivated accounts are invisible to
    /// every default lookup.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, password_changed_at,
                   password_reset_token, password_reset_expires, active, created_at
            FROM users
            WHERE email = $1 AND active = TRUE
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, password_changed_at,
                   password_reset_token, password_reset_expires, active, created_at
            FROM users
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Create a new user with an already-hashed password. Registration leaves
    /// password_changed_at unset.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, role, password_hash, password_changed_at,
                      password_reset_token, password_reset_expires, active, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, password_changed_at,
                   password_reset_token, password_reset_expires, active, created_at
            FROM users
            WHERE active = TRUE
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3
            WHERE id = $1 AND active = TRUE
            RETURNING id, name, email, role, password_hash, password_changed_at,
                      password_reset_token, password_reset_expires, active, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Persist a new password hash. The one-second skew on
    /// password_changed_at keeps a JWT minted in the same instant valid, and
    /// any pending reset token is cleared in the same statement.
    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_changed_at = now() - interval '1 second',
                password_reset_token = NULL,
                password_reset_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Store the hashed side of a reset token, overwriting any pending one.
    pub async fn set_reset_token(db: &PgPool, id: Uuid, token: &ResetToken) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&token.hashed)
        .bind(token.expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = NULL, password_reset_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Match a presented token by its stored hash; expired tokens never match.
    pub async fn find_by_reset_token(db: &PgPool, hashed: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash, password_changed_at,
                   password_reset_token, password_reset_expires, active, created_at
            FROM users
            WHERE password_reset_token = $1
              AND password_reset_expires > now()
              AND active = TRUE
            "#,
        )
        .bind(hashed)
        .fetch_optional(db)
        .await
    }

    /// Soft delete. The row stays put; default lookups stop seeing it.
    pub async fn deactivate(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample_user(password_changed_at: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".into(),
            email: "test@example.com".into(),
            role: "user".into(),
            password_hash: "$argon2id$fake".into(),
            password_changed_at,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn fresh_user_never_reads_as_changed_after() {
        let user = sample_user(None);
        for issued_at in [0, 1_000_000, OffsetDateTime::now_utc().unix_timestamp()] {
            assert!(!user.changed_password_after(issued_at));
        }
    }

    #[test]
    fn token_issued_before_change_is_stale() {
        let changed_at = OffsetDateTime::now_utc();
        let user = sample_user(Some(changed_at));
        let issued_before = (changed_at - Duration::hours(1)).unix_timestamp();
        assert!(user.changed_password_after(issued_before));
    }

    #[test]
    fn token_issued_after_change_stays_valid() {
        let changed_at = OffsetDateTime::now_utc() - Duration::hours(1);
        let user = sample_user(Some(changed_at));
        let issued_after = OffsetDateTime::now_utc().unix_timestamp();
        assert!(!user.changed_password_after(issued_after));
    }

    #[test]
    fn role_checks_match_stored_labels() {
        let mut user = sample_user(None);
        assert!(user.has_role(Role::User));
        user.role = "lead-guide".into();
        assert!(user.has_role(Role::LeadGuide));
        assert!(!user.has_role(Role::Admin));
    }

    #[test]
    fn serialized_user_never_exposes_password_state() {
        let user = sample_user(Some(OffsetDateTime::now_utc()));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("password_reset_token"));
        assert!(!json.contains("active"));
        assert!(json.contains("test@example.com"));
    }
}

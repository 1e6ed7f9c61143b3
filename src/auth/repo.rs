use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::ApiError;

const USER_COLUMNS: &str = "id, name, email, password_hash, google_id, is_verified, role, \
     income_range, exact_income, otp_code, otp_expires, avatar, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_google_id(db: &PgPool, google_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert an unverified local account holding a pending OTP. The
    /// email uniqueness constraint is the arbiter under concurrent
    /// registrations; the losing insert maps to `AlreadyExists`.
    pub async fn create_local(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        otp_code: &str,
        otp_expires: OffsetDateTime,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, otp_code, otp_expires, is_verified, role) \
             VALUES ($1, $2, $3, $4, $5, FALSE, 'user') \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(otp_code)
        .bind(otp_expires)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map_or(false, |d| d.is_unique_violation())
            {
                ApiError::AlreadyExists
            } else {
                ApiError::Internal(e.into())
            }
        })?;
        Ok(user)
    }

    /// Insert a pre-verified account from an external-provider
    /// profile. Unique-violation still maps to `AlreadyExists` so a
    /// racing local registration has exactly one winner.
    pub async fn create_from_provider(
        db: &PgPool,
        name: &str,
        email: &str,
        google_id: &str,
        avatar: Option<&str>,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, google_id, avatar, is_verified, role) \
             VALUES ($1, $2, $3, $4, TRUE, 'user') \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(google_id)
        .bind(avatar)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map_or(false, |d| d.is_unique_violation())
            {
                ApiError::AlreadyExists
            } else {
                ApiError::Internal(e.into())
            }
        })?;
        Ok(user)
    }

    /// Consume the pending OTP in a single conditional update: the code
    /// must match and the expiry must still be ahead of the clock, so a
    /// consumed or superseded code cannot be replayed.
    pub async fn consume_otp(db: &PgPool, email: &str, otp: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET is_verified = TRUE, otp_code = NULL, otp_expires = NULL \
             WHERE email = $1 AND otp_code = $2 AND otp_expires > now() \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(otp)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Replace the pending OTP on an unverified account.
    pub async fn replace_otp(
        db: &PgPool,
        email: &str,
        otp_code: &str,
        otp_expires: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET otp_code = $2, otp_expires = $3 \
             WHERE email = $1 AND is_verified = FALSE \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(otp_code)
        .bind(otp_expires)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Attach a provider id to an existing account (account linking).
    /// The avatar is only filled when absent; the stored name is kept.
    pub async fn link_google(
        db: &PgPool,
        email: &str,
        google_id: &str,
        avatar: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET google_id = $2, avatar = COALESCE(avatar, $3) \
             WHERE email = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(google_id)
        .bind(avatar)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        income_range: Option<&str>,
        exact_income: Option<i64>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET income_range = $2, exact_income = $3 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(income_range)
        .bind(exact_income)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }
}

use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::config::SessionConfig;

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.password_hash, u.google_id, u.is_verified, \
     u.role, u.income_range, u.exact_income, u.otp_code, u.otp_expires, u.avatar, u.created_at";

/// 32 random bytes from the OS CSPRNG, hex-encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Persist a new session for the account and return its opaque token.
pub async fn create_session(db: &PgPool, user_id: Uuid, ttl_days: i64) -> anyhow::Result<String> {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::days(ttl_days);
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await?;
    Ok(token)
}

/// Resolve a token back to its account. Expired sessions and sessions
/// whose account no longer exists resolve to `None`; expiry is checked
/// lazily here, no sweep process is involved.
pub async fn resolve_session(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token = $1 AND s.expires_at > now()"
    ))
    .bind(token)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Idempotent: destroying an unknown or already-destroyed token is
/// not an error.
pub async fn destroy_session(db: &PgPool, token: &str) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}

pub fn set_session_cookie(cookies: &Cookies, config: &SessionConfig, token: String) {
    let cookie = Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(if config.secure {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .max_age(tower_cookies::cookie::time::Duration::days(config.ttl_days))
        .build();
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &Cookies, config: &SessionConfig) {
    let cookie = Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}

pub fn session_token(cookies: &Cookies, config: &SessionConfig) -> Option<String> {
    cookies
        .get(&config.cookie_name)
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for local registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for OTP verification.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body for OTP resend.
#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

/// Request body for local login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for profile update.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub income_range: Option<String>,
    pub exact_income: Option<i64>,
}

/// Query string on the Google redirect endpoints.
#[derive(Debug, Deserialize)]
pub struct GoogleAuthQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Public projection of an account: no hash, no OTP fields.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_verified: bool,
    pub income_range: Option<String>,
    pub exact_income: Option<i64>,
    pub avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            is_verified: u.is_verified,
            income_range: u.income_range,
            exact_income: u.exact_income,
            avatar: u.avatar,
            created_at: u.created_at,
        }
    }
}

/// Response of `GET /auth/me`; 200 whether or not a session exists.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: Option<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: Some("$argon2id$...".into()),
            google_id: None,
            is_verified: true,
            role: "user".into(),
            income_range: None,
            exact_income: None,
            otp_code: Some("123456".into()),
            otp_expires: Some(OffsetDateTime::now_utc()),
            avatar: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn public_user_never_leaks_secrets() {
        let json = serde_json::to_string(&PublicUser::from(sample_user())).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("123456"));
        assert!(!json.contains("otp"));
    }

    #[test]
    fn user_row_serialization_skips_transient_fields() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("otp_code"));
        assert!(!json.contains("otp_expires"));
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::oauth::ExternalProfile;
use crate::auth::repo_types::User;
use crate::auth::{otp, password};
use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// The OAuth `state` parameter is an opaque relative-path token.
/// Anything that does not begin with a path separator is discarded so
/// the callback can never be steered to a foreign origin.
pub(crate) fn validate_state_path(state: Option<&str>) -> &str {
    match state {
        Some(s) if s.starts_with('/') => s,
        _ => "/",
    }
}

/// Create an unverified local account and issue its first OTP. The
/// store's email uniqueness constraint decides races; OTP delivery is
/// spawned and never blocks or rolls back the registration.
pub async fn register_local(
    state: &AppState,
    name: &str,
    email: &str,
    plain_password: &str,
) -> Result<User, ApiError> {
    let hash = password::hash_password(plain_password)?;
    let code = otp::generate_otp();
    let expires = otp::otp_expiry();

    let user = User::create_local(&state.db, name, email, &hash, &code, expires).await?;

    let mailer = state.mailer.clone();
    let to = user.email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_otp(&to, &code).await {
            warn!(error = %e, email = %to, "OTP delivery failed; account stays recoverable");
        }
    });

    info!(user_id = %user.id, email = %user.email, "local account registered (unverified)");
    Ok(user)
}

/// Verify the pending OTP and mark the account verified. Mismatch and
/// expiry are deliberately indistinguishable; only a missing account
/// reports `NotFound`.
pub async fn verify_otp(state: &AppState, email: &str, code: &str) -> Result<User, ApiError> {
    match User::consume_otp(&state.db, email, code).await? {
        Some(user) => {
            let mailer = state.mailer.clone();
            let (to, name) = (user.email.clone(), user.name.clone());
            tokio::spawn(async move {
                if let Err(e) = mailer.send_welcome(&to, &name).await {
                    warn!(error = %e, email = %to, "welcome mail failed");
                }
            });
            info!(user_id = %user.id, "account verified");
            Ok(user)
        }
        None => {
            if User::find_by_email(&state.db, email).await?.is_none() {
                Err(ApiError::NotFound("User"))
            } else {
                Err(ApiError::InvalidOrExpired)
            }
        }
    }
}

/// Supersede the pending OTP for an unverified account and re-send it.
/// Returns `Ok(())` whether or not the email matched anything, so the
/// endpoint leaks nothing about which addresses are registered.
pub async fn resend_otp(state: &AppState, email: &str) -> Result<(), ApiError> {
    let code = otp::generate_otp();
    let expires = otp::otp_expiry();
    if let Some(user) = User::replace_otp(&state.db, email, &code, expires).await? {
        let mailer = state.mailer.clone();
        let to = user.email;
        tokio::spawn(async move {
            if let Err(e) = mailer.send_otp(&to, &code).await {
                warn!(error = %e, email = %to, "OTP delivery failed");
            }
        });
    }
    Ok(())
}

/// Local-credential login. Unknown email, provider-only account, and
/// wrong password all collapse into `InvalidCredentials`; only a
/// matched-but-unverified account is told apart, since its remediation
/// differs.
pub async fn login_local(state: &AppState, email: &str, plain: &str) -> Result<User, ApiError> {
    let lookup = User::find_by_email(&state.db, email).await?;
    let user = match check_local_credentials(lookup, plain) {
        Ok(user) => user,
        Err(e) => {
            warn!(email = %email, "login rejected");
            return Err(e);
        }
    };

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Credential decision over the lookup result. No account, an account
/// without a password, and a wrong password are indistinguishable; an
/// unverified account is only reported after the password matched.
fn check_local_credentials(lookup: Option<User>, plain: &str) -> Result<User, ApiError> {
    let user = lookup.ok_or(ApiError::InvalidCredentials)?;
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(ApiError::InvalidCredentials);
    };
    if !password::verify_password(plain, hash)? {
        return Err(ApiError::InvalidCredentials);
    }
    if !user.is_verified {
        return Err(ApiError::NotVerified);
    }
    Ok(user)
}

/// How a provider profile maps onto existing accounts. A provider-id
/// match always wins; the email match is only consulted when the
/// provider id is unknown.
#[derive(Debug)]
pub(crate) enum LinkPlan {
    Existing(User),
    AttachByEmail(User),
    Create,
}

pub(crate) fn plan_external_link(
    by_provider_id: Option<User>,
    by_email: Option<User>,
) -> LinkPlan {
    match (by_provider_id, by_email) {
        (Some(user), _) => LinkPlan::Existing(user),
        (None, Some(user)) => LinkPlan::AttachByEmail(user),
        (None, None) => LinkPlan::Create,
    }
}

/// Resolve an already-authenticated provider profile to an account:
/// by provider id first, then by email, otherwise a new pre-verified
/// account. Linking keeps the stored name and fills the avatar only
/// when none is set. Email equality alone is enough to link; the
/// provider's verification claim for the address is not consulted.
pub async fn resolve_external_identity(
    state: &AppState,
    profile: &ExternalProfile,
) -> Result<User, ApiError> {
    let email = profile.email.trim().to_lowercase();
    let by_provider_id = User::find_by_google_id(&state.db, &profile.provider_id).await?;
    let by_email = match by_provider_id {
        Some(_) => None,
        None => User::find_by_email(&state.db, &email).await?,
    };

    match plan_external_link(by_provider_id, by_email) {
        LinkPlan::Existing(user) => return Ok(user),
        LinkPlan::AttachByEmail(_) => {
            // The conditional UPDATE stays the authority; if the row
            // vanished since the lookup we fall through and create.
            if let Some(user) = User::link_google(
                &state.db,
                &email,
                &profile.provider_id,
                profile.avatar.as_deref(),
            )
            .await?
            {
                info!(user_id = %user.id, "linked provider identity to existing account");
                return Ok(user);
            }
        }
        LinkPlan::Create => {}
    }

    let user = User::create_from_provider(
        &state.db,
        &profile.display_name,
        &email,
        &profile.provider_id,
        profile.avatar.as_deref(),
    )
    .await?;
    info!(user_id = %user.id, "account created from provider profile");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn account(
        email: &str,
        password_hash: Option<&str>,
        google_id: Option<&str>,
        verified: bool,
    ) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: email.into(),
            password_hash: password_hash.map(str::to_string),
            google_id: google_id.map(str::to_string),
            is_verified: verified,
            role: "user".into(),
            income_range: None,
            exact_income: None,
            otp_code: None,
            otp_expires: None,
            avatar: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn provider_id_match_wins_over_email_match() {
        let attached = account("a@example.com", None, Some("g-1"), true);
        let attached_id = attached.id;
        let other = account("a@example.com", Some("hash"), None, true);

        match plan_external_link(Some(attached), Some(other)) {
            LinkPlan::Existing(user) => assert_eq!(user.id, attached_id),
            plan => panic!("unexpected plan: {plan:?}"),
        }
    }

    #[test]
    fn email_match_links_when_provider_id_unknown() {
        let local = account("a@example.com", Some("hash"), None, true);
        let local_id = local.id;

        match plan_external_link(None, Some(local)) {
            LinkPlan::AttachByEmail(user) => assert_eq!(user.id, local_id),
            plan => panic!("unexpected plan: {plan:?}"),
        }
    }

    #[test]
    fn unknown_profile_creates_an_account() {
        assert!(matches!(plan_external_link(None, None), LinkPlan::Create));
    }

    #[test]
    fn login_rejections_are_indistinguishable() {
        let hash = password::hash_password("correct horse").unwrap();

        assert!(matches!(
            check_local_credentials(None, "correct horse"),
            Err(ApiError::InvalidCredentials)
        ));

        let provider_only = account("a@example.com", None, Some("g-1"), true);
        assert!(matches!(
            check_local_credentials(Some(provider_only), "correct horse"),
            Err(ApiError::InvalidCredentials)
        ));

        let local = account("a@example.com", Some(&hash), None, true);
        assert!(matches!(
            check_local_credentials(Some(local), "battery staple"),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn unverified_is_reported_only_after_password_matches() {
        let hash = password::hash_password("correct horse").unwrap();

        let unverified = account("a@example.com", Some(&hash), None, false);
        assert!(matches!(
            check_local_credentials(Some(unverified), "correct horse"),
            Err(ApiError::NotVerified)
        ));

        let unverified = account("a@example.com", Some(&hash), None, false);
        assert!(matches!(
            check_local_credentials(Some(unverified), "battery staple"),
            Err(ApiError::InvalidCredentials)
        ));

        let verified = account("a@example.com", Some(&hash), None, true);
        assert!(check_local_credentials(Some(verified), "correct horse").is_ok());
    }

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("a lice@example.com"));
        assert!(!is_valid_email("alice@example"));
    }

    #[test]
    fn state_path_accepts_relative_paths() {
        assert_eq!(validate_state_path(Some("/tools/emi")), "/tools/emi");
        assert_eq!(validate_state_path(Some("/")), "/");
    }

    #[test]
    fn state_path_discards_absolute_urls() {
        assert_eq!(validate_state_path(Some("https://evil.example")), "/");
        assert_eq!(validate_state_path(Some("javascript:alert(1)")), "/");
        assert_eq!(validate_state_path(Some("")), "/");
        assert_eq!(validate_state_path(None), "/");
    }
}

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GoogleConfig;

/// Profile tuple handed back by the provider after its own redirect
/// flow. Treated as already-authenticated input.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalProfile {
    #[serde(rename = "id")]
    pub provider_id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "picture")]
    pub avatar: Option<String>,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Consent URL to redirect the browser to. `state` is carried
    /// opaquely and returned on the callback.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange the callback `code` for the provider's profile.
    async fn fetch_profile(&self, code: &str) -> anyhow::Result<ExternalProfile>;
}

pub struct GoogleOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "https://accounts.google.com/o/oauth2/v2/auth\
             ?client_id={}&redirect_uri={}&response_type=code\
             &scope=openid%20profile%20email&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(state),
        )
    }

    async fn fetch_profile(&self, code: &str) -> anyhow::Result<ExternalProfile> {
        let token: TokenResponse = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let profile: ExternalProfile = self
            .client
            .get("https://www.googleapis.com/oauth2/v2/userinfo")
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_state() {
        let google = GoogleOAuth::new(&crate::config::GoogleConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:8080/api/auth/google/callback".into(),
        });
        let url = google.authorize_url("/tools/emi");
        assert!(url.contains("state=%2Ftools%2Femi"));
        assert!(url.contains("client_id=cid"));
        assert!(!url.contains("secret"));
    }

    #[test]
    fn profile_deserializes_google_userinfo() {
        let profile: ExternalProfile = serde_json::from_str(
            r#"{"id":"g-123","email":"bob@example.com","name":"Bob","picture":null}"#,
        )
        .unwrap();
        assert_eq!(profile.provider_id, "g-123");
        assert_eq!(profile.email, "bob@example.com");
        assert!(profile.avatar.is_none());
    }
}

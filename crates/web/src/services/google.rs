//! Google OAuth 2.0 / OpenID Connect client.
//!
//! Authorization-code flow only: build the consent URL, exchange the code,
//! then read the profile from the userinfo endpoint.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use woodshop_core::Email;

use crate::config::GoogleOAuthConfig;
use crate::services::auth::SignInProfile;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors that can occur talking to Google.
#[derive(Debug, Error)]
pub enum GoogleError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Google rejected the request.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The profile has no usable email.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

impl TryFrom<UserInfo> for SignInProfile {
    type Error = GoogleError;

    fn try_from(info: UserInfo) -> Result<Self, Self::Error> {
        let raw = info
            .email
            .ok_or_else(|| GoogleError::InvalidProfile("missing email".to_string()))?;
        let email =
            Email::parse(&raw).map_err(|e| GoogleError::InvalidProfile(e.to_string()))?;

        Ok(Self {
            email,
            email_verified: info.email_verified,
            name: info.name.filter(|n| !n.trim().is_empty()),
            image: info.picture,
        })
    }
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl GoogleOAuthClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &GoogleOAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Build the consent-screen URL.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            prompt=select_account&\
            state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code and fetch the signed-in profile.
    ///
    /// # Errors
    ///
    /// Returns `GoogleError` if either request fails or the profile has no
    /// valid email.
    pub async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SignInProfile, GoogleError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;

        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GoogleError::OAuth(format!("Userinfo request failed: {text}")));
        }

        let info: UserInfo = response.json().await?;
        info.try_into()
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, GoogleError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GoogleError::OAuth(format!("Token exchange failed: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

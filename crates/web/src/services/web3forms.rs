//! Web3Forms client for contact form delivery.
//!
//! Web3Forms relays a JSON submission to the inbox tied to the access key.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Web3FormsConfig;

const SUBMIT_URL: &str = "https://api.web3forms.com/submit";

/// Errors that can occur when submitting to Web3Forms.
#[derive(Debug, Error)]
pub enum Web3FormsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Web3Forms refused the submission.
    #[error("Submission rejected: {0}")]
    Rejected(String),
}

/// A validated contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    access_key: &'a str,
    subject: String,
    from_name: &'a str,
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    success: bool,
    #[serde(default)]
    message: String,
}

/// Web3Forms API client.
#[derive(Clone)]
pub struct Web3FormsClient {
    client: reqwest::Client,
    access_key: SecretString,
}

impl Web3FormsClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &Web3FormsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_key: config.access_key.clone(),
        }
    }

    /// Submit a contact message.
    ///
    /// # Errors
    ///
    /// Returns `Web3FormsError` if the request fails or Web3Forms reports
    /// `success: false`.
    pub async fn submit(&self, contact: &ContactMessage) -> Result<(), Web3FormsError> {
        let body = SubmitRequest {
            access_key: self.access_key.expose_secret(),
            subject: format!("New inquiry from {}", contact.name),
            from_name: "Woodshop website",
            name: &contact.name,
            email: &contact.email,
            phone: contact.phone.as_deref(),
            message: &contact.message,
        };

        let response = self
            .client
            .post(SUBMIT_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<SubmitResponse> = serde_json::from_str(&text).ok();

        match parsed {
            Some(r) if r.success && status.is_success() => Ok(()),
            Some(r) => Err(Web3FormsError::Rejected(r.message)),
            None => Err(Web3FormsError::Rejected(format!(
                "unexpected response ({status})"
            ))),
        }
    }
}

//! Contact form route handler.
//!
//! Messages are relayed through Web3Forms to the shop's inbox.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use woodshop_core::Email;

use crate::services::{ContactMessage, Web3FormsError};
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

type ContactReply = (StatusCode, Json<ContactResponse>);

fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> ContactReply {
    (
        status,
        Json(ContactResponse {
            success,
            message: message.into(),
        }),
    )
}

/// Trim and check the form.
fn validate(form: ContactForm) -> Result<ContactMessage, &'static str> {
    let name = form.name.trim();
    let message = form.message.trim();
    if name.is_empty() || message.is_empty() {
        return Err("Name and message are required.");
    }

    let email = Email::parse(&form.email).map_err(|_| "Please enter a valid email address.")?;

    Ok(ContactMessage {
        name: name.to_string(),
        email: email.into_inner(),
        phone: form
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        message: message.to_string(),
    })
}

/// Submit a contact message.
///
/// POST /contact
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    form: Result<Json<ContactForm>, JsonRejection>,
) -> ContactReply {
    let Ok(Json(form)) = form else {
        return reply(StatusCode::BAD_REQUEST, false, "Invalid form submission.");
    };

    let contact = match validate(form) {
        Ok(contact) => contact,
        Err(message) => return reply(StatusCode::BAD_REQUEST, false, message),
    };

    let Some(client) = state.web3forms() else {
        tracing::error!("Web3Forms not configured");
        return reply(
            StatusCode::SERVICE_UNAVAILABLE,
            false,
            "Contact form is not configured.",
        );
    };

    match client.submit(&contact).await {
        Ok(()) => {
            tracing::info!(email = %contact.email, "Contact message sent");
            reply(
                StatusCode::OK,
                true,
                "Your message was sent successfully. We'll get back to you soon.",
            )
        }
        Err(Web3FormsError::Rejected(message)) => {
            tracing::error!(email = %contact.email, %message, "Web3Forms rejected contact message");
            reply(StatusCode::BAD_GATEWAY, false, message)
        }
        Err(e) => {
            tracing::error!(email = %contact.email, error = %e, "Failed to send contact message");
            reply(
                StatusCode::BAD_GATEWAY,
                false,
                "Something went wrong. Please try again.",
            )
        }
    }
}

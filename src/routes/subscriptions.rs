use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde_json::json;

use super::error_chain_fmt;
use super::FormData;
use crate::backend::BackendError;
use crate::backend::SubscribeOutcome;
use crate::backend::SubscriptionBackend;
use crate::contacts_client::ContactsError;
use crate::domain::is_email_whitespace;
use crate::domain::SubscriberEmail;

impl TryFrom<FormData> for SubscriberEmail {
    type Error = SubscribeError;
    fn try_from(value: FormData) -> Result<Self, Self::Error> {
        let email = value
            .get("email")
            .map(|e| e.trim_matches(is_email_whitespace))
            .unwrap_or_default();
        if email.is_empty() {
            return Err(SubscribeError::MissingEmail);
        }
        SubscriberEmail::parse(email.to_string()).map_err(SubscribeError::InvalidEmail)
    }
}

/// The `Display` strings are what callers see in the JSON `error` field, so
/// they must never carry internal detail; causes are only reachable via
/// `Debug`, which ends up in the logs.
#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email format")]
    InvalidEmail(String),
    /// The contact API answered, and said no
    #[error("Failed to subscribe")]
    ProviderRejected(#[source] anyhow::Error),
    #[error("Internal server error")]
    UnexpectedError(#[source] anyhow::Error),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingEmail | Self::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Self::ProviderRejected(_) | Self::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<BackendError> for SubscribeError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Contacts(ContactsError::Rejected { .. }) => {
                Self::ProviderRejected(e.into())
            }
            _ => Self::UnexpectedError(e.into()),
        }
    }
}

/// `POST /subscribe`
///
/// Trims and validates the first `email` form field, urlencoded or multipart,
/// then hands it to whichever `SubscriptionBackend` this deployment runs.
/// Duplicate submissions get the same `{"success": true}` as first-time ones.
///
/// # Request example
///
/// ```sh
///     curl -v --data 'email=john@foo.com' http://127.0.0.1:8000/subscribe
/// ```
#[tracing::instrument(
    name = "Adding new subscriber",
    skip(req, payload, backend),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    req: HttpRequest,
    payload: web::Payload,
    backend: web::Data<SubscriptionBackend>,
) -> Result<HttpResponse, SubscribeError> {
    // a body that isn't a decodable form is not covered by the 400 messages
    let form = FormData::read(&req, payload).await.map_err(|e| {
        tracing::warn!(error.cause_chain = ?e, "Could not decode subscription form");
        SubscribeError::UnexpectedError(e)
    })?;
    let email: SubscriberEmail = form.try_into()?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    let outcome = backend.subscribe(&email).await.map_err(|e| {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "Subscription failed"
        );
        SubscribeError::from(e)
    })?;

    match outcome {
        SubscribeOutcome::Notified => tracing::info!("New subscriber stored, operator notified"),
        SubscribeOutcome::AlreadySubscribed => tracing::info!("Duplicate subscription ignored"),
        SubscribeOutcome::Accepted => tracing::info!("Contact created"),
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

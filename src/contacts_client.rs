use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use crate::domain::SubscriberEmail;

/// Client for a third-party contact-management API (Resend-style audiences).
pub struct ContactsClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    audience_id: String,
}

#[derive(Serialize)]
struct CreateContactRequest<'a> {
    email: &'a str,
    unsubscribed: bool,
}

/// The provider answering with an error is distinct from never getting an
/// answer at all.
#[derive(thiserror::Error, Debug)]
pub enum ContactsError {
    #[error("Contacts API rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Could not reach the contacts API")]
    Transport(#[from] reqwest::Error),
}

impl ContactsClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        audience_id: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
            audience_id,
        })
    }

    /// `POST /audiences/{audience_id}/contacts`
    pub async fn create_contact(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(), ContactsError> {
        let url = format!("{}/audiences/{}/contacts", self.base_url, self.audience_id);
        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&CreateContactRequest {
                email: email.as_ref(),
                unsubscribed: false,
            })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        // the error object is only logged, so an unreadable body is not fatal
        let message = resp.text().await.unwrap_or_default();
        Err(ContactsError::Rejected { status, message })
    }
}

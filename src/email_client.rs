use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use crate::domain::SubscriberEmail;

/// Client for a Postmark-style transactional email API.
///
/// Establishing an HTTP connection is expensive, so a single `EmailClient`
/// (and thus a single `reqwest::Client` with its connection pool) is built at
/// startup and shared across workers via `web::Data`.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    authorization_token: Secret<String>,
}

/// Request body, serialised in PascalCase as the API expects
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        })
    }

    /// Send a plain-text email. `sender_name`, if given, is shown as the
    /// display name of the configured sender address.
    ///
    /// Non-2xx responses are errors.
    pub async fn send_email(
        &self,
        sender_name: Option<&str>,
        recipient: &SubscriberEmail,
        subject: &str,
        text_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/email", self.base_url);
        let from = match sender_name {
            Some(name) => format!("{name} <{}>", self.sender),
            None => self.sender.to_string(),
        };
        let body = SendEmailRequest {
            from: &from,
            to: recipient.as_ref(),
            subject,
            text_body: text_content,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

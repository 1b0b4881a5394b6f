use sqlx::PgPool;

use crate::configuration::BackendKind;
use crate::configuration::Settings;
use crate::contacts_client::ContactsClient;
use crate::contacts_client::ContactsError;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::startup::get_connection_pool;

/// The two ways a validated address can be turned into a subscription. Exactly
/// one is chosen per deployment (`backend.kind`), and the handler never needs
/// to know which.
pub enum SubscriptionBackend {
    /// Insert-if-absent into `subscribers`, then tell the operator about
    /// first-time subscribers by email.
    StoreAndNotify {
        pool: PgPool,
        email_client: EmailClient,
        notification: Notification,
    },
    /// Hand the address to a third-party contact list.
    ContactApi(ContactsClient),
}

/// Operator-facing message sent on first insert
pub struct Notification {
    pub operator: SubscriberEmail,
    pub sender_name: String,
    pub subject: String,
}

impl Notification {
    pub fn body(
        &self,
        subscriber: &SubscriberEmail,
    ) -> String {
        format!("New subscriber: {subscriber}")
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// New row, operator notified
    Notified,
    /// Row already existed; nothing sent
    AlreadySubscribed,
    /// Contact API accepted the address
    Accepted,
}

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("Failed to insert subscriber into the store")]
    Store(#[from] sqlx::Error),
    // the row is already committed at this point
    #[error("Subscriber was stored, but notifying the operator failed")]
    Notify(#[source] reqwest::Error),
    #[error(transparent)]
    Contacts(#[from] ContactsError),
}

impl SubscriptionBackend {
    /// Build the backend selected by `cfg.backend.kind`. Only the sections
    /// used by that backend are validated.
    pub fn build(cfg: &Settings) -> Result<Self, anyhow::Error> {
        let backend = match cfg.backend.kind {
            BackendKind::StoreAndNotify => {
                let operator = cfg
                    .notification
                    .operator()
                    .map_err(|e| anyhow::anyhow!("notification.operator_email: {e}"))?;
                Self::StoreAndNotify {
                    pool: get_connection_pool(&cfg.database),
                    email_client: cfg.email_client.client()?,
                    notification: Notification {
                        operator,
                        sender_name: cfg.notification.sender_name.clone(),
                        subject: cfg.notification.subject.clone(),
                    },
                }
            }
            BackendKind::ContactApi => Self::ContactApi(cfg.contacts_client.client()?),
        };
        Ok(backend)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::StoreAndNotify { .. } => BackendKind::StoreAndNotify,
            Self::ContactApi(_) => BackendKind::ContactApi,
        }
    }

    #[tracing::instrument(name = "Recording subscription", skip_all, fields(backend = ?self.kind()))]
    pub async fn subscribe(
        &self,
        email: &SubscriberEmail,
    ) -> Result<SubscribeOutcome, BackendError> {
        match self {
            Self::StoreAndNotify {
                pool,
                email_client,
                notification,
            } => {
                if !insert_subscriber(pool, email).await? {
                    tracing::info!("Subscriber already present, not notifying");
                    return Ok(SubscribeOutcome::AlreadySubscribed);
                }
                notify_operator(email_client, notification, email)
                    .await
                    .map_err(BackendError::Notify)?;
                Ok(SubscribeOutcome::Notified)
            }
            Self::ContactApi(contacts_client) => {
                contacts_client.create_contact(email).await?;
                Ok(SubscribeOutcome::Accepted)
            }
        }
    }
}

/// `INSERT ... ON CONFLICT DO NOTHING`; returns whether a row was created.
/// Uniqueness is left entirely to the primary key, so concurrent submissions
/// of the same address insert at most once.
#[tracing::instrument(name = "INSERTing subscriber into db", skip(pool, email))]
async fn insert_subscriber(
    pool: &PgPool,
    email: &SubscriberEmail,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscribers (email)
        VALUES ($1)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(email.as_ref())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[tracing::instrument(
    name = "Notifying operator of new subscriber",
    skip(email_client, notification, subscriber)
)]
async fn notify_operator(
    email_client: &EmailClient,
    notification: &Notification,
    subscriber: &SubscriberEmail,
) -> Result<(), reqwest::Error> {
    email_client
        .send_email(
            Some(&notification.sender_name),
            &notification.operator,
            &notification.subject,
            &notification.body(subscriber),
        )
        .await
}

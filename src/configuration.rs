use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgSslMode;

use crate::contacts_client::ContactsClient;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
///
/// Every section must be present, even the ones the selected backend does not
/// use; unused sections are simply never turned into clients.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub backend: BackendSettings,
    pub database: DatabaseSettings,
    pub email_client: EmailClientSettings,
    pub notification: NotificationSettings,
    pub contacts_client: ContactsClientSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    /// 0 lets the OS pick a free port (used by the test suite)
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Which of the two subscription strategies this deployment runs.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Insert into `subscribers`, notify the operator on first insert
    StoreAndNotify,
    /// Forward to a third-party contact list
    ContactApi,
}

#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    pub kind: BackendKind,
}

/// Database configuration
#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub database_name: String,

    /// Should be `true` in production.
    /// https://www.postgresql.org/docs/current/libpq-ssl.html#LIBPQ-SSL-SSLMODE-STATEMENTS
    pub require_ssl: bool,
}

impl DatabaseSettings {
    /// Connection to the named database. The password is concealed.
    pub fn connection(&self) -> PgConnectOptions {
        self.connection_without_db().database(&self.database_name)
    }

    /// Connection to the Postgres instance, with `database_name` unset. This
    /// is typically used to create a randomised db for testing.
    pub fn connection_without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .username(&self.username)
            .password(self.password.expose_secret())
            .host(&self.host)
            .port(self.port)
            .ssl_mode(match self.require_ssl {
                true => PgSslMode::Require,
                false => PgSslMode::Prefer,
            })
    }
}

/// Transactional email provider (Postmark-style REST API)
#[derive(Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<EmailClient, anyhow::Error> {
        let sender = self.sender().map_err(|e| anyhow::anyhow!("email_client.sender_email: {e}"))?;
        let client = EmailClient::new(
            self.base_url.clone(),
            sender,
            self.authorization_token.clone(),
            self.timeout(),
        )
        .context("email_client: could not build HTTP client")?;
        Ok(client)
    }
}

/// Who gets told about new subscribers, and how the message looks.
#[derive(Deserialize, Clone)]
pub struct NotificationSettings {
    pub operator_email: String,
    /// Display name placed in front of the sender address
    pub sender_name: String,
    pub subject: String,
}

impl NotificationSettings {
    pub fn operator(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.operator_email.clone())
    }
}

/// Third-party contact-management API
#[derive(Deserialize, Clone)]
pub struct ContactsClientSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Contact list that new subscribers are added to
    pub audience_id: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl ContactsClientSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<ContactsClient, anyhow::Error> {
        let client = ContactsClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.audience_id.clone(),
            self.timeout(),
        )
        .context("contacts_client: could not build HTTP client")?;
        Ok(client)
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!(
                "{e} is not a supported environment; use either `local` or `production`"
            )),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`:
/// `base.yaml`, then `{APP_ENVIRONMENT}.yaml` (default `local`), then `APP_`
/// env vars (`APP_APPLICATION__PORT=5001` -> `Settings.application.port`).
///
/// All fields must be present, otherwise initialisation fails immediately and
/// the server does not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- strings, hence `serde-aux` for numeric fields
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

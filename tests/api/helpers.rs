use once_cell::sync::Lazy;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use subscriber_intake::configuration::get_configuration;
use subscriber_intake::configuration::BackendKind;
use subscriber_intake::configuration::DatabaseSettings;
use subscriber_intake::startup::get_connection_pool;
use subscriber_intake::startup::Application;
use subscriber_intake::telemetry::get_subscriber;
use subscriber_intake::telemetry::init_subscriber;
use uuid::Uuid;
use wiremock::MockServer;

/// Init the tracing subscriber once only. Logs are discarded unless
/// `TEST_LOG` is set:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the two arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

/// Address the operator notification is sent to in tests
pub const OPERATOR_EMAIL: &str = "operator@example.com";

pub struct TestApp {
    pub addr: String,
    pub pool: PgPool,
    /// Stands in for the transactional email API
    pub email_server: MockServer,
    /// Stands in for the contact-management API
    pub contacts_server: MockServer,
}

impl TestApp {
    /// `POST /subscribe` with a form-encoded `body`
    pub async fn post_subscribe(
        &self,
        body: String,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/subscribe", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }

    /// `POST /subscribe` as `multipart/form-data`, the encoding of a JS
    /// `FormData` body
    pub async fn post_subscribe_multipart(
        &self,
        fields: &[(&str, &str)],
    ) -> reqwest::Response {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--XyZ\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str("--XyZ--\r\n");

        reqwest::Client::new()
            .post(format!("{}/subscribe", self.addr))
            .header("Content-Type", "multipart/form-data; boundary=XyZ")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn stored_emails(&self) -> Vec<String> {
        sqlx::query_scalar("SELECT email FROM subscribers ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .expect("fetch subscribers")
    }

    pub async fn subscriber_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
            .fetch_one(&self.pool)
            .await
            .expect("count subscribers")
    }
}

/// Create a db with a randomised name and run all migrations against it, so
/// that every test gets an empty `subscribers` table.
async fn configure_database(cfg: &DatabaseSettings) -> PgPool {
    let mut conn = PgConnection::connect_with(&cfg.connection_without_db())
        .await
        .expect("postgres must be running");

    conn.execute(format!(r#"CREATE DATABASE "{}";"#, cfg.database_name).as_str())
        .await
        .expect("create database");

    let pool = PgPool::connect_with(cfg.connection())
        .await
        .expect("connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to migrate");
    pool
}

/// Spawn the app on a random port, with mock servers in place of both
/// external APIs. Only the store backend gets a (fresh) database.
async fn spawn(kind: BackendKind) -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;
    let contacts_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("read configuration");
        cfg.backend.kind = kind;
        cfg.database.database_name = Uuid::new_v4().to_string();
        // port 0: the OS assigns a free port, retrieved via `get_port`
        cfg.application.port = 0;
        cfg.email_client.base_url = email_server.uri();
        cfg.email_client.timeout_milliseconds = 200;
        cfg.notification.operator_email = OPERATOR_EMAIL.to_string();
        cfg.contacts_client.base_url = contacts_server.uri();
        cfg.contacts_client.timeout_milliseconds = 200;
        cfg
    };

    if kind == BackendKind::StoreAndNotify {
        configure_database(&cfg.database).await;
    }

    let app = Application::build(cfg.clone())
        .await
        .expect("build application");
    let addr = format!("http://127.0.0.1:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        pool: get_connection_pool(&cfg.database),
        email_server,
        contacts_server,
    }
}

/// Requires a running Postgres
pub async fn spawn_app() -> TestApp { spawn(BackendKind::StoreAndNotify).await }

pub async fn spawn_contact_api_app() -> TestApp { spawn(BackendKind::ContactApi).await }

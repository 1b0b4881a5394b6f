use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::backend::SubscriptionBackend;
use crate::configuration::DatabaseSettings;
use crate::configuration::Settings;
use crate::routes::not_found;
use crate::routes::subscribe;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener, build the configured backend, and wire up the
    /// server. The server does not run until `run_until_stopped` is awaited.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // port 0 means the OS picked one; record what it chose
        let port = listener.local_addr()?.port();

        let backend = SubscriptionBackend::build(&cfg)?;
        tracing::info!(backend = ?backend.kind(), port, "Starting server");

        let server = run(listener, backend)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Lazy: no connection is made until the first query, so a `contact_api`
/// deployment never touches Postgres.
pub fn get_connection_pool(db_cfg: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_cfg.connection())
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Endpoints: `POST /subscribe`. Everything else, including other methods on
/// `/subscribe`, is a plain-text 404.
pub fn run(
    listener: TcpListener,
    backend: SubscriptionBackend,
) -> Result<Server, std::io::Error> {
    // `Data` is an `Arc`; each worker's `App` gets a clone of the same backend
    let backend = web::Data::new(backend);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .service(
                web::resource("/subscribe")
                    .route(web::post().to(subscribe))
                    .default_service(web::route().to(not_found)),
            )
            .default_service(web::route().to(not_found))
            .app_data(backend.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

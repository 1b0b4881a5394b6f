use subscriber_intake::configuration::get_configuration;
use subscriber_intake::startup::Application;
use subscriber_intake::telemetry::get_subscriber;
use subscriber_intake::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("subscriber-intake", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;

    let server = Application::build(cfg).await?;
    if let Err(e) = server.run_until_stopped().await {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "API failed"
        );
        return Err(e.into());
    }
    tracing::info!("API exited gracefully");
    Ok(())
}

use std::fmt::Debug;
use std::fmt::Display;

use form_relay::configuration::get_configuration;
use form_relay::rate_limit::init_sweep_worker;
use form_relay::startup::Application;
use form_relay::telemetry::get_subscriber;
use form_relay::telemetry::init_subscriber;
use tokio::task::JoinError;

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }

        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (inner)"
            )
        }

        Err(e) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (outer)"
            )
        }
    }
}

/// Initialise telemetry, load config, and run the server next to the rate
/// limit sweep worker until either stops
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("form-relay", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    let sweep_interval = cfg.rate_limit.sweep_interval();

    let app = Application::build(cfg).await?;
    let sweep_worker = init_sweep_worker(app.rate_limiter(), sweep_interval);

    let server_thread = tokio::spawn(app.run_until_stopped());
    let sweep_worker_thread = tokio::spawn(sweep_worker);

    // returns when the first branch completes, cancelling the other
    tokio::select! {
        o = server_thread => { report_exit("API", o) },
        o = sweep_worker_thread => { report_exit("Rate limit sweep worker", o) },
    }

    Ok(())
}

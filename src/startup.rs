use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::rate_limit::RateLimiter;
use crate::routes::contact;
use crate::routes::health_check;
use crate::routes::subscribe;
use crate::routes::ChallengeGate;
use crate::routes::ClientIpHeader;
use crate::routes::FormProfiles;
use crate::routes::MAX_BODY_BYTES;
use crate::subscriber_client::SubscriberClient;

/// Wrapper for actix's `Server` with access to the bound port and to the
/// rate limiter it shares with the sweep worker. Not to be confused with
/// actix's `App`!
pub struct Application {
    /// Left private; use `port` to access
    port: u16,
    server: Server,
    rate_limiter: Arc<RateLimiter>,
}

impl Application {
    /// Bind the listener (port 0 picks a random free port), build the
    /// outbound clients and the rate limiter, and wire them into a `Server`.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        tracing::info!(%port, environment = %cfg.environment, "starting form relay");

        let challenge = cfg.challenge.client(&cfg.environment)?;
        if challenge.is_none() {
            tracing::warn!("no challenge secret configured; challenge tokens will not be verified");
        }

        let rate_limiter = Arc::new(RateLimiter::default());

        let server = run(
            listener,
            cfg.subscriber_api.client()?,
            ChallengeGate(challenge),
            Arc::clone(&rate_limiter),
            FormProfiles::from_settings(&cfg.forms),
            ClientIpHeader(cfg.application.client_ip_header),
        )?;

        Ok(Self {
            port,
            server,
            rate_limiter,
        })
    }

    pub fn port(&self) -> u16 { self.port }

    /// Handle for `init_sweep_worker`
    pub fn rate_limiter(&self) -> Arc<RateLimiter> { Arc::clone(&self.rate_limiter) }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints. The form endpoints accept every method so
/// the pipeline itself decides between preflight, `405` and a submission.
pub fn run(
    listener: TcpListener,
    subscriber_client: SubscriberClient,
    challenge: ChallengeGate,
    rate_limiter: Arc<RateLimiter>,
    profiles: FormProfiles,
    client_ip_header: ClientIpHeader,
) -> Result<Server, anyhow::Error> {
    // `Data` is externally an `Arc`, so every worker shares one limiter table
    // and one connection pool per upstream
    let subscriber_client = Data::new(subscriber_client);
    let challenge = Data::new(challenge);
    let rate_limiter = Data::from(rate_limiter);
    let profiles = Data::new(profiles);
    let client_ip_header = Data::new(client_ip_header);

    // the closure runs once per worker, hence the clones
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscribe", web::route().to(subscribe))
            .route("/contact", web::route().to(contact))
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .app_data(subscriber_client.clone())
            .app_data(challenge.clone())
            .app_data(rate_limiter.clone())
            .app_data(profiles.clone())
            .app_data(client_ip_header.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

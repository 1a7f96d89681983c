// without this, every client that ever submitted keeps an entry for the
// lifetime of the process

use std::sync::Arc;
use std::time::Duration;

use super::RateLimiter;

#[tracing::instrument(
    name = "Sweeping expired rate limit windows",
    skip_all,
    fields(purged = tracing::field::Empty)
)]
fn sweep_once(limiter: &RateLimiter) -> usize {
    let purged = limiter.purge_expired();
    tracing::Span::current().record("purged", purged);
    if purged > 0 {
        tracing::info!(remaining = limiter.len(), "dropped {purged} expired rate limit windows");
    }
    purged
}

async fn sweep_loop(
    limiter: &RateLimiter,
    interval: Duration,
) -> Result<(), anyhow::Error> {
    loop {
        tokio::time::sleep(interval).await;
        sweep_once(limiter);
    }
}

/// To be run as a separate worker, outside the main API. Shares the
/// limiter instance the API uses; see `Application::rate_limiter`.
pub async fn init_sweep_worker(
    limiter: Arc<RateLimiter>,
    interval: Duration,
) -> Result<(), anyhow::Error> {
    sweep_loop(&limiter, interval).await
}

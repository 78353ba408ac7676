//! Periodic self-ping.
//!
//! Free-tier hosts suspend an app after a stretch without inbound traffic.
//! When `KEEP_ALIVE_URL` is set, a background task requests that URL on a
//! fixed interval. Failures are logged and the loop carries on.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};
use url::Url;

use crate::config::KeepAliveConfig;

/// Build the HTTP client used for pings.
///
/// # Errors
///
/// Returns `reqwest::Error` if the TLS backend cannot be initialized.
pub fn client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("freshbasket-keep-alive/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Request `url` once and return the response status.
///
/// # Errors
///
/// Returns `reqwest::Error` on connection failure or timeout.
pub async fn ping(client: &reqwest::Client, url: &Url) -> Result<StatusCode, reqwest::Error> {
    let response = client.get(url.clone()).send().await?;
    Ok(response.status())
}

/// Spawn the keep-alive loop. The first ping happens one interval after start.
///
/// Abort the returned handle on shutdown.
///
/// # Errors
///
/// Returns `reqwest::Error` if the HTTP client cannot be built.
pub fn spawn(config: KeepAliveConfig) -> Result<JoinHandle<()>, reqwest::Error> {
    let client = client(config.timeout)?;

    tracing::info!(
        url = %config.url,
        interval_secs = config.interval.as_secs(),
        "Keep-alive enabled"
    );

    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match ping(&client, &config.url).await {
                Ok(status) if status.is_success() => {
                    debug!(status = status.as_u16(), "Keep-alive ping ok");
                }
                Ok(status) => {
                    warn!(status = status.as_u16(), "Keep-alive ping returned non-success status");
                }
                Err(e) => {
                    warn!(error = %e, "Keep-alive ping failed");
                }
            }
        }
    }))
}

pub mod alternative_me;
pub mod cryptocompare;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::MarketPoller;
use alternative_me::AlternativeMeProvider;
use anyhow::Result;
use cryptocompare::CryptoCompareProvider;
use std::sync::Arc;

/// Wires the configured HTTP providers into a poller.
pub fn build_poller(config: &AppConfig) -> Result<Arc<MarketPoller>> {
    let timeout = config.polling.request_timeout();
    let retries = config.polling.retries;

    let cryptocompare = Arc::new(CryptoCompareProvider::new(
        config.providers.cryptocompare_url(),
        timeout,
        retries,
    )?);
    let alternative_me = Arc::new(AlternativeMeProvider::new(
        config.providers.alternative_me_url(),
        timeout,
        retries,
    )?);

    Ok(Arc::new(MarketPoller::new(
        cryptocompare.clone(),
        alternative_me,
        cryptocompare,
        config.default_range,
    )))
}

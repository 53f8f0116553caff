use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::{get_text, http_client, parse_json};
use crate::core::market::{
    Granularity, HistoricalSeries, HistoryFeed, MarketFeed, MarketSnapshot, PricePoint, TimeRange,
};

const SYMBOL: &str = "BTC";
const QUOTE_CURRENCY: &str = "USD";

// Price, change and market cap for BTC plus its price history
pub struct CryptoCompareProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
}

impl CryptoCompareProvider {
    pub fn new(base_url: &str, timeout: Duration, retries: usize) -> Result<Self> {
        Ok(CryptoCompareProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
            retries,
        })
    }

    fn history_url(&self, range: TimeRange) -> String {
        let query = range.query();
        let endpoint = match query.granularity {
            Granularity::Minute => "histominute",
            Granularity::Hour => "histohour",
            Granularity::Day => "histoday",
        };
        format!(
            "{}/data/v2/{}?fsym={}&tsym={}&limit={}&aggregate={}",
            self.base_url, endpoint, SYMBOL, QUOTE_CURRENCY, query.sample_count, query.aggregate
        )
    }
}

#[derive(Deserialize, Debug)]
struct PriceMultiFullResponse {
    #[serde(rename = "RAW")]
    raw: HashMap<String, HashMap<String, RawQuote>>,
}

#[derive(Deserialize, Debug)]
struct RawQuote {
    #[serde(rename = "PRICE")]
    price: f64,
    #[serde(rename = "CHANGEPCT24HOUR")]
    change_pct_24h: f64,
    #[serde(rename = "MKTCAP")]
    market_cap: f64,
}

#[derive(Deserialize, Debug)]
struct HistoryResponse {
    #[serde(rename = "Data")]
    data: HistoryData,
}

#[derive(Deserialize, Debug)]
struct HistoryData {
    #[serde(rename = "Data")]
    data: Vec<HistoryBar>,
}

#[derive(Deserialize, Debug)]
struct HistoryBar {
    time: i64,
    close: f64,
}

#[async_trait]
impl MarketFeed for CryptoCompareProvider {
    #[instrument(name = "CryptoCompareSnapshotFetch", skip(self))]
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let url = format!(
            "{}/data/pricemultifull?fsyms={}&tsyms={}",
            self.base_url, SYMBOL, QUOTE_CURRENCY
        );
        let text = get_text(&self.client, &url, self.retries, "price").await?;
        let data: PriceMultiFullResponse = parse_json(&text, "price")?;

        let quote = data
            .raw
            .get(SYMBOL)
            .and_then(|quotes| quotes.get(QUOTE_CURRENCY))
            .ok_or_else(|| anyhow!("No price data found for {}/{}", SYMBOL, QUOTE_CURRENCY))?;
        debug!(?quote, "Received price quote");

        Ok(MarketSnapshot {
            price: quote.price,
            change_24h_percent: quote.change_pct_24h,
            market_cap_trillions: quote.market_cap / 1e12,
        })
    }
}

#[async_trait]
impl HistoryFeed for CryptoCompareProvider {
    #[instrument(name = "CryptoCompareHistoryFetch", skip(self), fields(range = %range))]
    async fn fetch_history(&self, range: TimeRange) -> Result<HistoricalSeries> {
        let url = self.history_url(range);
        let text = get_text(&self.client, &url, self.retries, "history").await?;
        let data: HistoryResponse = parse_json(&text, "history")?;

        let points = data
            .data
            .data
            .into_iter()
            .map(|bar| {
                let time = Utc
                    .timestamp_opt(bar.time, 0)
                    .single()
                    .ok_or_else(|| anyhow!("Invalid timestamp in history: {}", bar.time))?;
                Ok(PricePoint {
                    label: range.label_for(time),
                    price: bar.close,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if points.is_empty() {
            return Err(anyhow!("No historical data found for range {}", range));
        }
        debug!(count = points.len(), "Received price history");

        Ok(HistoricalSeries {
            range,
            points,
            is_fallback: false,
        })
    }
}

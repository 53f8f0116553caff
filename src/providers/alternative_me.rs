use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::{get_text, http_client, parse_json};
use crate::core::market::{SentimentFeed, SentimentSnapshot};

// Fear & Greed index from alternative.me
pub struct AlternativeMeProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
}

impl AlternativeMeProvider {
    pub fn new(base_url: &str, timeout: Duration, retries: usize) -> Result<Self> {
        Ok(AlternativeMeProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
            retries,
        })
    }
}

#[derive(Deserialize, Debug)]
struct FearGreedResponse {
    data: Vec<FearGreedEntry>,
}

#[derive(Deserialize, Debug)]
struct FearGreedEntry {
    value: IndexValue,
    value_classification: String,
}

// The API sends the index as a string
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum IndexValue {
    Number(u64),
    Text(String),
}

impl IndexValue {
    fn parse(&self) -> Result<u8> {
        let value = match self {
            IndexValue::Number(n) => *n,
            IndexValue::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid sentiment index {:?}: {}", s, e))?,
        };
        if value > 100 {
            return Err(anyhow!("Sentiment index out of range: {}", value));
        }
        Ok(value as u8)
    }
}

#[async_trait]
impl SentimentFeed for AlternativeMeProvider {
    #[instrument(name = "FearGreedFetch", skip(self))]
    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot> {
        let url = format!("{}/fng/", self.base_url);
        let text = get_text(&self.client, &url, self.retries, "sentiment").await?;
        let data: FearGreedResponse = parse_json(&text, "sentiment")?;

        let entry = data
            .data
            .first()
            .ok_or_else(|| anyhow!("No sentiment data found"))?;
        debug!(?entry, "Received sentiment entry");

        Ok(SentimentSnapshot {
            value: entry.value.parse()?,
            classification: entry.value_classification.clone(),
        })
    }
}

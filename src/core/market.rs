//! Market data abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    pub change_24h_percent: f64,
    pub market_cap_trillions: f64,
}

impl MarketSnapshot {
    pub fn fallback() -> Self {
        MarketSnapshot {
            price: 95432.0,
            change_24h_percent: 5.2,
            market_cap_trillions: 1.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub value: u8,
    pub classification: String,
}

impl SentimentSnapshot {
    pub fn fallback() -> Self {
        SentimentSnapshot {
            value: 75,
            classification: "Greed".to_string(),
        }
    }

    pub fn band(&self) -> SentimentBand {
        SentimentBand::from_value(self.value)
    }
}

/// Coarse bucket of the sentiment index, used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBand {
    ExtremeFear,
    Fear,
    Greed,
    ExtremeGreed,
}

impl SentimentBand {
    pub fn from_value(value: u8) -> Self {
        match value {
            75.. => SentimentBand::ExtremeGreed,
            50..=74 => SentimentBand::Greed,
            25..=49 => SentimentBand::Fear,
            _ => SentimentBand::ExtremeFear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    Intraday,
    #[serde(rename = "7D")]
    Week,
    #[serde(rename = "1M")]
    Month,
    #[serde(rename = "1Y")]
    Year,
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TimeRange::Intraday => "1D",
                TimeRange::Week => "7D",
                TimeRange::Month => "1M",
                TimeRange::Year => "1Y",
            }
        )
    }
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" | "1" => Ok(TimeRange::Intraday),
            "7D" | "7" => Ok(TimeRange::Week),
            "1M" | "30" => Ok(TimeRange::Month),
            "1Y" | "365" => Ok(TimeRange::Year),
            _ => Err(anyhow::anyhow!("Invalid time range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Minute,
    Hour,
    Day,
}

/// Provider-independent description of which samples to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub granularity: Granularity,
    pub sample_count: u32,
    /// Number of granularity units folded into one sample.
    pub aggregate: u32,
}

impl TimeRange {
    pub fn query(&self) -> HistoryQuery {
        let (granularity, sample_count, aggregate) = match self {
            // 15 minute buckets
            TimeRange::Intraday => (Granularity::Minute, 96, 15),
            TimeRange::Week => (Granularity::Hour, 168, 1),
            // 6 hour buckets
            TimeRange::Month => (Granularity::Hour, 120, 6),
            TimeRange::Year => (Granularity::Day, 365, 1),
        };
        HistoryQuery {
            granularity,
            sample_count,
            aggregate,
        }
    }

    /// Formats a sample time as a chart label; intraday labels carry the time.
    pub fn label_for(&self, time: DateTime<Utc>) -> String {
        match self {
            TimeRange::Intraday => time.format("%b %-d, %H:%M").to_string(),
            _ => time.format("%b %-d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub label: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub range: TimeRange,
    pub points: Vec<PricePoint>,
    /// True when the points are the built-in sample rather than live data.
    pub is_fallback: bool,
}

impl HistoricalSeries {
    pub fn fallback(range: TimeRange) -> Self {
        let points = [
            ("Jan", 42000.0),
            ("Feb", 48000.0),
            ("Mar", 55000.0),
            ("Apr", 62000.0),
            ("May", 58000.0),
            ("Jun", 65000.0),
            ("Jul", 72000.0),
            ("Aug", 85000.0),
            ("Sep", 95432.0),
        ]
        .into_iter()
        .map(|(label, price)| PricePoint {
            label: label.to_string(),
            price,
        })
        .collect();

        HistoricalSeries {
            range,
            points,
            is_fallback: true,
        }
    }
}

#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot>;
}

#[async_trait]
pub trait SentimentFeed: Send + Sync {
    async fn fetch_sentiment(&self) -> Result<SentimentSnapshot>;
}

#[async_trait]
pub trait HistoryFeed: Send + Sync {
    async fn fetch_history(&self, range: TimeRange) -> Result<HistoricalSeries>;
}

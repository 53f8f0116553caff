//! Polling of the market data feeds.
//!
//! [`MarketPoller`] owns one cache slot per feed. The snapshot slots keep
//! their last good value when a fetch fails (starting from the built-in
//! fallback constants), while the history slot is replaced with the fallback
//! series so that a failed range change never leaves the previous range's
//! data on screen.

use crate::core::cache::Slot;
use crate::core::market::{
    HistoricalSeries, HistoryFeed, MarketFeed, MarketSnapshot, SentimentFeed, SentimentSnapshot,
    TimeRange,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What a refresh did to its cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Live data was fetched and stored.
    Updated,
    /// The fetch failed and the previous value was kept.
    Retained { reason: String },
    /// The fetch failed and the fallback value was stored.
    FellBack { reason: String },
    /// A newer history refresh started while fetching; nothing was stored.
    Superseded,
}

impl RefreshOutcome {
    pub fn is_live(&self) -> bool {
        matches!(self, RefreshOutcome::Updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRefresh {
    pub market: RefreshOutcome,
    pub sentiment: RefreshOutcome,
}

pub struct MarketPoller {
    market_feed: Arc<dyn MarketFeed>,
    sentiment_feed: Arc<dyn SentimentFeed>,
    history_feed: Arc<dyn HistoryFeed>,
    market: Slot<MarketSnapshot>,
    sentiment: Slot<SentimentSnapshot>,
    history: Slot<HistoricalSeries>,
    last_snapshot: Slot<Option<SnapshotRefresh>>,
    last_history: Slot<Option<RefreshOutcome>>,
    range: watch::Sender<TimeRange>,
    history_requests: AtomicU64,
    revision: watch::Sender<u64>,
}

impl MarketPoller {
    pub fn new(
        market_feed: Arc<dyn MarketFeed>,
        sentiment_feed: Arc<dyn SentimentFeed>,
        history_feed: Arc<dyn HistoryFeed>,
        range: TimeRange,
    ) -> Self {
        MarketPoller {
            market_feed,
            sentiment_feed,
            history_feed,
            market: Slot::new("market", MarketSnapshot::fallback()),
            sentiment: Slot::new("sentiment", SentimentSnapshot::fallback()),
            history: Slot::new("history", HistoricalSeries::fallback(range)),
            last_snapshot: Slot::new("last_snapshot", None),
            last_history: Slot::new("last_history", None),
            range: watch::Sender::new(range),
            history_requests: AtomicU64::new(0),
            revision: watch::Sender::new(0),
        }
    }

    pub async fn market(&self) -> Arc<MarketSnapshot> {
        self.market.get().await
    }

    pub async fn sentiment(&self) -> Arc<SentimentSnapshot> {
        self.sentiment.get().await
    }

    pub async fn history(&self) -> Arc<HistoricalSeries> {
        self.history.get().await
    }

    /// The range most recently passed to [`MarketPoller::refresh_history`].
    pub fn range(&self) -> TimeRange {
        *self.range.borrow()
    }

    /// Receives a new revision number after every finished refresh.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Outcome of the most recent snapshot refresh, if any has run.
    pub async fn last_snapshot_refresh(&self) -> Arc<Option<SnapshotRefresh>> {
        self.last_snapshot.get().await
    }

    /// Outcome of the most recent history refresh that was stored.
    pub async fn last_history_refresh(&self) -> Arc<Option<RefreshOutcome>> {
        self.last_history.get().await
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Fetches the price and sentiment feeds concurrently. A failure in one
    /// feed does not affect the other.
    pub async fn refresh_snapshot(&self) -> SnapshotRefresh {
        let (market, sentiment) =
            futures::future::join(self.refresh_market(), self.refresh_sentiment()).await;
        let refresh = SnapshotRefresh { market, sentiment };

        self.last_snapshot.replace(Some(refresh.clone())).await;
        self.bump_revision();
        refresh
    }

    async fn refresh_market(&self) -> RefreshOutcome {
        match self.market_feed.fetch_snapshot().await {
            Ok(snapshot) => {
                debug!(price = snapshot.price, "Market snapshot updated");
                self.market.replace(snapshot).await;
                RefreshOutcome::Updated
            }
            Err(e) => {
                warn!(error = %e, "Price feed failed, keeping last market snapshot");
                RefreshOutcome::Retained {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn refresh_sentiment(&self) -> RefreshOutcome {
        match self.sentiment_feed.fetch_sentiment().await {
            Ok(sentiment) => {
                debug!(value = sentiment.value, "Sentiment updated");
                self.sentiment.replace(sentiment).await;
                RefreshOutcome::Updated
            }
            Err(e) => {
                warn!(error = %e, "Sentiment feed failed, keeping last sentiment");
                RefreshOutcome::Retained {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Selects `range` and replaces the history with its series, or with the
    /// fallback series if the fetch fails. The result is dropped if another
    /// history refresh started while this one was in flight, whatever its
    /// range.
    pub async fn refresh_history(&self, range: TimeRange) -> RefreshOutcome {
        let request = self.history_requests.fetch_add(1, Ordering::SeqCst) + 1;
        self.range.send_replace(range);

        let (series, outcome) = match self.history_feed.fetch_history(range).await {
            Ok(series) => (series, RefreshOutcome::Updated),
            Err(e) => {
                warn!(error = %e, %range, "History feed failed, using fallback series");
                (
                    HistoricalSeries::fallback(range),
                    RefreshOutcome::FellBack {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let committed = self
            .history
            .replace_if(series, |_| self.history_requests.load(Ordering::SeqCst) == request)
            .await;
        if !committed {
            debug!(%range, request, "Discarding superseded history");
            return RefreshOutcome::Superseded;
        }

        self.last_history.replace(Some(outcome.clone())).await;
        self.bump_revision();
        outcome
    }

    /// Re-fetches the history for the currently selected range.
    pub async fn reload_history(&self) -> RefreshOutcome {
        self.refresh_history(self.range()).await
    }

    /// Refreshes the snapshot now and then every `interval` until the
    /// returned handle is stopped or dropped.
    pub fn start(self: &Arc<Self>, interval: Duration) -> PollingHandle {
        let interval = interval.max(MIN_INTERVAL);
        info!(?interval, "Starting market snapshot polling");

        let poller = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let refresh = poller.refresh_snapshot().await;
                debug!(?refresh, "Scheduled snapshot refresh finished");
            }
        });

        PollingHandle { task }
    }
}

/// Owns the periodic refresh task. Dropping the handle cancels the task.
pub struct PollingHandle {
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn stop(self) {
        info!("Stopping market snapshot polling");
        // Drop aborts the task
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

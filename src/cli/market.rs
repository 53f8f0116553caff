use super::ui;
use crate::core::market::{HistoricalSeries, MarketSnapshot, PricePoint, SentimentSnapshot};
use crate::core::poller::SnapshotRefresh;
use crate::core::{MarketPoller, RefreshOutcome, TimeRange};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color};
use tracing::info;

const MAX_HISTORY_ROWS: usize = 24;
const BAR_WIDTH: usize = 30;

pub fn render_cards(market: &MarketSnapshot, sentiment: &SentimentSnapshot) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Bitcoin Price"),
        ui::header_cell("24h Change"),
        ui::header_cell("Market Cap"),
        ui::header_cell("Fear & Greed"),
    ]);

    let color = ui::sentiment_color(sentiment.band());
    let sentiment_text = format!(
        "{} {}\n{}",
        sentiment.value,
        sentiment.classification,
        ui::gauge(f64::from(sentiment.value) / 100.0, 20)
    );

    table.add_row(vec![
        ui::usd_cell(market.price),
        ui::change_cell(market.change_24h_percent),
        Cell::new(format!("${:.2}T", market.market_cap_trillions))
            .set_alignment(CellAlignment::Right),
        Cell::new(sentiment_text).fg(color),
    ]);

    table.to_string()
}

/// Picks at most `max` evenly spaced points, always keeping the latest one.
pub fn downsample(points: &[PricePoint], max: usize) -> Vec<&PricePoint> {
    if max == 0 || points.is_empty() {
        return Vec::new();
    }
    if points.len() <= max {
        return points.iter().collect();
    }
    let last = points.len() - 1;
    let steps = max - 1;
    (0..max)
        .map(|i| {
            if steps == 0 {
                &points[last]
            } else {
                &points[i * last / steps]
            }
        })
        .collect()
}

pub fn render_history(series: &HistoricalSeries) -> String {
    let rows = downsample(&series.points, MAX_HISTORY_ROWS);
    let (min, max) = series
        .points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.price), hi.max(p.price))
        });
    let span = max - min;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Time"),
        ui::header_cell("Price"),
        ui::header_cell(""),
    ]);
    for point in rows {
        let fraction = if span > 0.0 {
            (point.price - min) / span
        } else {
            1.0
        };
        table.add_row(vec![
            Cell::new(&point.label),
            ui::usd_cell(point.price),
            Cell::new(ui::gauge(fraction, BAR_WIDTH)).fg(Color::Yellow),
        ]);
    }

    let source = if series.is_fallback {
        ui::style_text(" (sample data)", ui::StyleType::Error)
    } else {
        String::new()
    };
    let mut output = format!(
        "Price Trend {}{}\n\n",
        ui::style_text(&series.range.to_string(), ui::StyleType::Title),
        source
    );
    output.push_str(&table.to_string());

    if let (Some(first), Some(last)) = (series.points.first(), series.points.last()) {
        if first.price > 0.0 {
            let change = (last.price - first.price) / first.price * 100.0;
            output.push_str(&format!(
                "\n\n{} {}",
                ui::style_text("Change over range:", ui::StyleType::TotalLabel),
                ui::style_text(&format!("{change:+.2}%"), ui::StyleType::TotalValue)
            ));
        }
    }

    output
}

fn outcome_note(feed: &str, outcome: &RefreshOutcome) -> Option<String> {
    match outcome {
        RefreshOutcome::Updated | RefreshOutcome::Superseded => None,
        RefreshOutcome::Retained { reason } => Some(format!(
            "{feed} feed unavailable, showing last known values ({reason})"
        )),
        RefreshOutcome::FellBack { reason } => Some(format!(
            "{feed} feed unavailable, showing sample data ({reason})"
        )),
    }
}

/// Notes for feeds whose last refresh did not produce fresh data.
pub fn status_notes(
    snapshot: Option<&SnapshotRefresh>,
    history: Option<&RefreshOutcome>,
) -> Vec<String> {
    let mut notes = Vec::new();
    if let Some(snapshot) = snapshot {
        notes.extend(outcome_note("Price", &snapshot.market));
        notes.extend(outcome_note("Sentiment", &snapshot.sentiment));
    }
    if let Some(history) = history {
        notes.extend(outcome_note("History", history));
    }
    notes
}

/// Renders everything the poller currently holds, followed by notes for
/// feeds that were unavailable on their last refresh.
pub async fn render_dashboard(poller: &MarketPoller) -> String {
    let market = poller.market().await;
    let sentiment = poller.sentiment().await;
    let history = poller.history().await;
    let last_snapshot = poller.last_snapshot_refresh().await;
    let last_history = poller.last_history_refresh().await;

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Market Dashboard", ui::StyleType::Title)
    );
    output.push_str(&render_cards(&market, &sentiment));
    output.push_str("\n\n");
    output.push_str(&render_history(&history));

    let notes = status_notes(last_snapshot.as_ref().as_ref(), last_history.as_ref().as_ref());
    if !notes.is_empty() {
        output.push('\n');
        for note in notes {
            output.push('\n');
            output.push_str(&ui::style_text(&note, ui::StyleType::Subtle));
        }
    }
    output
}

/// Fetches all feeds once and prints the dashboard.
pub async fn run(poller: &MarketPoller, range: TimeRange) -> Result<()> {
    info!(%range, "Fetching market data");

    let pb = ui::new_spinner("Fetching market data...");
    futures::future::join(poller.refresh_snapshot(), poller.refresh_history(range)).await;
    pb.finish_and_clear();

    println!("{}", render_dashboard(poller).await);
    Ok(())
}

use super::{market, ui};
use crate::core::{MarketPoller, TimeRange};
use anyhow::{Context, Result};
use chrono::Local;
use console::{Key, Term};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What a key press asks the watch loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    SwitchRange(TimeRange),
    Reload,
    Quit,
}

pub fn key_action(key: &Key) -> Option<WatchAction> {
    match key {
        Key::Char('1') => Some(WatchAction::SwitchRange(TimeRange::Intraday)),
        Key::Char('7') => Some(WatchAction::SwitchRange(TimeRange::Week)),
        Key::Char('m') | Key::Char('M') => Some(WatchAction::SwitchRange(TimeRange::Month)),
        Key::Char('y') | Key::Char('Y') => Some(WatchAction::SwitchRange(TimeRange::Year)),
        Key::Char('r') | Key::Char('R') => Some(WatchAction::Reload),
        Key::Char('q') | Key::Char('Q') | Key::Escape | Key::CtrlC => Some(WatchAction::Quit),
        _ => None,
    }
}

/// Human-readable polling interval, e.g. `60 min` or `45 s`.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs < 60 || secs % 60 != 0 {
        format!("{secs} s")
    } else {
        format!("{} min", secs / 60)
    }
}

fn status_line(poller: &MarketPoller, interval: Duration, interactive: bool) -> String {
    let mut line = format!(
        "Updated {}, range {}, refreshing every {}.",
        Local::now().format("%H:%M:%S"),
        poller.range(),
        format_interval(interval)
    );
    if interactive {
        line.push_str(" Keys: 1/7/m/y range, r reload, q quit.");
    } else {
        line.push_str(" Press Ctrl-C to quit.");
    }
    line
}

async fn redraw(
    term: &Term,
    poller: &MarketPoller,
    interval: Duration,
    interactive: bool,
) -> Result<()> {
    let dashboard = market::render_dashboard(poller).await;
    term.clear_screen().context("Failed to clear terminal")?;
    println!("{dashboard}");
    println!(
        "\n{}",
        ui::style_text(
            &status_line(poller, interval, interactive),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

/// Reads keys on a plain thread, since `read_key` blocks until a key arrives.
/// The thread ends once the receiver is gone and another key is pressed.
fn spawn_key_reader(term: Term, tx: mpsc::Sender<WatchAction>) {
    std::thread::spawn(move || {
        loop {
            match term.read_key() {
                Ok(key) => {
                    if let Some(action) = key_action(&key)
                        && tx.blocking_send(action).is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    debug!(%err, "Stopped reading keys");
                    break;
                }
            }
        }
    });
}

/// Keeps the dashboard on screen, redrawing whenever the poller stores new
/// data, until interrupted. On a terminal, keys switch the history range or
/// reload it.
pub async fn run(poller: Arc<MarketPoller>, range: TimeRange, interval: Duration) -> Result<()> {
    let term = Term::stdout();
    let interactive = term.is_term();
    let mut revisions = poller.subscribe();

    let pb = ui::new_spinner("Fetching price history...");
    poller.refresh_history(range).await;
    pb.finish_and_clear();

    let handle = poller.start(interval);
    revisions.mark_unchanged();
    redraw(&term, &poller, interval, interactive).await?;

    let (tx, mut keys) = mpsc::channel(8);
    if interactive {
        spawn_key_reader(term.clone(), tx);
    } else {
        drop(tx);
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                let revision = *revisions.borrow_and_update();
                debug!(revision, "Poller state changed");
                redraw(&term, &poller, interval, interactive).await?;
            }
            Some(action) = keys.recv() => {
                debug!(?action, "Key pressed");
                match action {
                    WatchAction::SwitchRange(range) => {
                        let poller = Arc::clone(&poller);
                        tokio::spawn(async move {
                            let outcome = poller.refresh_history(range).await;
                            debug!(%range, ?outcome, "Range switched");
                        });
                    }
                    WatchAction::Reload => {
                        let poller = Arc::clone(&poller);
                        tokio::spawn(async move {
                            let outcome = poller.reload_history().await;
                            debug!(?outcome, "History reloaded");
                        });
                    }
                    WatchAction::Quit => {
                        info!("Quit requested, shutting down");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    handle.stop();
    Ok(())
}

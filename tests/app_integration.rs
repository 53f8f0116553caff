use std::fs;
use std::time::Duration;
use tracing::{error, info};

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const PRICE_RESPONSE: &str = r#"{
        "RAW": {
            "BTC": {
                "USD": {
                    "PRICE": 67012.34,
                    "CHANGEPCT24HOUR": 2.5,
                    "MKTCAP": 1320000000000.0
                }
            }
        }
    }"#;

    pub const SENTIMENT_RESPONSE: &str =
        r#"{"data": [{"value": "55", "value_classification": "Greed"}]}"#;

    pub const HISTORY_RESPONSE: &str = r#"{
        "Response": "Success",
        "Data": {
            "Data": [
                {"time": 1725494400, "close": 56100.0},
                {"time": 1725580800, "close": 56900.0},
                {"time": 1725667200, "close": 54200.0}
            ]
        }
    }"#;

    pub async fn mount(server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    pub async fn create_mock_servers(healthy: bool) -> (MockServer, MockServer) {
        let cryptocompare = MockServer::start().await;
        let alternative_me = MockServer::start().await;

        if healthy {
            mount(&cryptocompare, "/data/pricemultifull", 200, PRICE_RESPONSE).await;
            mount(&cryptocompare, "/data/v2/histoday", 200, HISTORY_RESPONSE).await;
            mount(&alternative_me, "/fng/", 200, SENTIMENT_RESPONSE).await;
        } else {
            mount(&cryptocompare, "/data/pricemultifull", 500, "").await;
            mount(&cryptocompare, "/data/v2/histoday", 200, "not json").await;
            mount(&alternative_me, "/fng/", 503, "").await;
        }

        (cryptocompare, alternative_me)
    }

    pub fn write_config(cryptocompare: &str, alternative_me: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
        providers:
          cryptocompare:
            base_url: {cryptocompare}
          alternative_me:
            base_url: {alternative_me}
        polling:
          request_timeout_secs: 2
        default_range: 1Y
    "#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

fn config_for(
    cryptocompare: &wiremock::MockServer,
    alternative_me: &wiremock::MockServer,
) -> btcboard::core::config::AppConfig {
    let config_file = test_utils::write_config(&cryptocompare.uri(), &alternative_me.uri());
    btcboard::core::config::AppConfig::load_from_path(config_file.path())
        .expect("Failed to load config")
}

#[test_log::test(tokio::test)]
async fn test_full_market_flow_with_mock() {
    let (cryptocompare, alternative_me) = test_utils::create_mock_servers(true).await;
    let config_file = test_utils::write_config(&cryptocompare.uri(), &alternative_me.uri());

    let result = btcboard::run_command(
        btcboard::AppCommand::Market { range: None },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Market command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_market_flow_survives_provider_outage() {
    let (cryptocompare, alternative_me) = test_utils::create_mock_servers(false).await;
    let config_file = test_utils::write_config(&cryptocompare.uri(), &alternative_me.uri());

    let result = btcboard::run_command(
        btcboard::AppCommand::Market { range: None },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Market command should render fallback data, failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_poller_with_live_providers_mocked() {
    use btcboard::core::{MarketSnapshot, RefreshOutcome, SentimentSnapshot, TimeRange};

    let (cryptocompare, alternative_me) = test_utils::create_mock_servers(true).await;
    let poller = btcboard::providers::build_poller(&config_for(&cryptocompare, &alternative_me))
        .expect("Failed to build poller");

    let refresh = poller.refresh_snapshot().await;
    assert_eq!(refresh.market, RefreshOutcome::Updated);
    assert_eq!(refresh.sentiment, RefreshOutcome::Updated);
    assert_eq!(
        *poller.market().await,
        MarketSnapshot {
            price: 67012.34,
            change_24h_percent: 2.5,
            market_cap_trillions: 1.32,
        }
    );
    assert_eq!(
        *poller.sentiment().await,
        SentimentSnapshot {
            value: 55,
            classification: "Greed".to_string(),
        }
    );

    let outcome = poller.refresh_history(TimeRange::Year).await;
    assert_eq!(outcome, RefreshOutcome::Updated);
    let history = poller.history().await;
    assert_eq!(history.points.len(), 3);
    assert_eq!(history.points[0].label, "Sep 5");
    assert_eq!(history.points[2].price, 54200.0);
}

#[test_log::test(tokio::test)]
async fn test_poller_falls_back_when_providers_fail() {
    use btcboard::core::{HistoricalSeries, MarketSnapshot, RefreshOutcome, TimeRange};

    let (cryptocompare, alternative_me) = test_utils::create_mock_servers(true).await;
    let poller = btcboard::providers::build_poller(&config_for(&cryptocompare, &alternative_me))
        .expect("Failed to build poller");
    poller.refresh_snapshot().await;
    poller.refresh_history(TimeRange::Year).await;

    // Take the providers down
    cryptocompare.reset().await;
    alternative_me.reset().await;
    test_utils::mount(&cryptocompare, "/data/pricemultifull", 502, "").await;
    test_utils::mount(&cryptocompare, "/data/v2/histoday", 502, "").await;
    test_utils::mount(&alternative_me, "/fng/", 200, r#"{"data": "oops"}"#).await;

    let refresh = poller.refresh_snapshot().await;
    assert!(matches!(refresh.market, RefreshOutcome::Retained { .. }));
    assert!(matches!(refresh.sentiment, RefreshOutcome::Retained { .. }));
    assert_eq!(poller.market().await.price, 67012.34);
    assert_ne!(*poller.market().await, MarketSnapshot::fallback());
    assert_eq!(poller.sentiment().await.value, 55);

    let outcome = poller.refresh_history(TimeRange::Year).await;
    assert!(matches!(outcome, RefreshOutcome::FellBack { .. }));
    assert_eq!(
        *poller.history().await,
        HistoricalSeries::fallback(TimeRange::Year)
    );
}

#[test_log::test(tokio::test)]
async fn test_slow_provider_times_out() {
    use btcboard::core::{MarketSnapshot, RefreshOutcome};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let (cryptocompare, alternative_me) = test_utils::create_mock_servers(true).await;
    cryptocompare.reset().await;
    Mock::given(method("GET"))
        .and(path("/data/pricemultifull"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(test_utils::PRICE_RESPONSE)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&cryptocompare)
        .await;

    let poller = btcboard::providers::build_poller(&config_for(&cryptocompare, &alternative_me))
        .expect("Failed to build poller");

    let refresh = poller.refresh_snapshot().await;
    info!(?refresh, "Refresh against slow provider finished");
    assert!(matches!(refresh.market, RefreshOutcome::Retained { .. }));
    assert_eq!(refresh.sentiment, RefreshOutcome::Updated);
    assert_eq!(*poller.market().await, MarketSnapshot::fallback());
}

#[test_log::test(tokio::test)]
async fn test_simulate_command() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        "simulator:\n  monthly_contribution: 50\n  horizon_years: 3\n",
    )
    .expect("Failed to write config file");

    let result = btcboard::run_command(
        btcboard::AppCommand::Simulate(btcboard::cli::simulate::SimulateArgs::default()),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    if let Err(e) = &result {
        error!("Simulate command failed: {e}\n{e:?}");
    }
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_is_reported() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(config_file.path(), "default_range: [oops").expect("Failed to write config file");

    let result = btcboard::run_command(
        btcboard::AppCommand::Market { range: None },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let err = result.expect_err("Broken config should fail");
    assert!(err.to_string().contains("Failed to parse config file"));
}

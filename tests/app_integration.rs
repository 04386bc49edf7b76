use chrono::NaiveDate;
use navdash::AppCommand;
use navdash::core::config::AppConfig;
use navdash::core::{CategoryFilter, FetchOutcome, Lookback};
use std::fs;
use tracing::{error, info};

mod test_utils {
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const LISTING_JSON: &str = r#"{
        "data": {
            "rows": [
                {
                    "id": 23,
                    "shortName": "VESAF",
                    "name": "VinaCapital Equity Special Access Fund",
                    "dataFundAssetType": {"code": "STOCK"},
                    "owner": {"name": "VinaCapital"},
                    "managementFee": 1.75,
                    "nav": 31234.56,
                    "productNavChange": {"navToPrevious": 0.42, "navTo12Months": 15.25}
                },
                {
                    "id": 28,
                    "shortName": "DCBF",
                    "name": "DC Bond Fund",
                    "dataFundAssetType": {"code": "BOND"},
                    "nav": 27000.0
                }
            ]
        }
    }"#;

    /// One server answering both the fund API and the index chart API.
    pub async fn create_market_mock_server() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/res/products/filter"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_JSON))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/res/product/get-nav-history"))
            .and(body_partial_json(serde_json::json!({"productId": 23})))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [
                    {"navDate": "2024-01-02", "nav": 30000.0},
                    {"navDate": "2024-01-03", "nav": 30600.0},
                    {"navDate": "2024-01-04", "nav": 31200.0}
                ]}"#,
            ))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/res/product/get-nav-history"))
            .and(body_partial_json(serde_json::json!({"productId": 28})))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [
                    {"navDate": "2024-01-02", "nav": 27000.0},
                    {"navDate": "2024-01-04", "nav": 27100.0}
                ]}"#,
            ))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/res/products/\d+$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": {
                    "productTopHoldingList": [
                        {"stockCode": "FPT", "industry": "Technology", "netAssetPercent": 9.8, "updateAt": 1717113600000}
                    ],
                    "productIndustriesHoldingList": [{"industry": "Banks", "assetPercent": 24.5}],
                    "productAssetHoldingList": [{"assetType": {"name": "Stocks"}, "assetPercent": 92.1}]
                }}"#,
            ))
            .mount(&mock_server)
            .await;

        // 2024-01-02 .. 2024-01-04 at 00:00 in UTC+7
        Mock::given(method("POST"))
            .and(path("/api/chart/OHLCChart/gap-chart"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"symbol": "VNINDEX", "t": [1704128400, 1704214800, 1704301200], "c": [1130.0, 1135.5, 1142.0]}]"#,
            ))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_failing_mock_server() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub fn config_for(base_url: &str) -> String {
        format!(
            r#"
        providers:
          fmarket:
            base_url: {base_url}
          vci:
            base_url: {base_url}
        cache:
          fund_listing_minutes: 5
        "#
        )
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn run_with_config(config_content: &str, command: AppCommand) -> anyhow::Result<()> {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    fs::write(config_path, config_content).expect("Failed to write config file");

    navdash::run_command(command, Some(config_path.to_str().unwrap())).await
}

#[test_log::test(tokio::test)]
async fn test_list_flow_with_mock() {
    let mock_server = test_utils::create_market_mock_server().await;

    let result = run_with_config(
        &test_utils::config_for(&mock_server.uri()),
        AppCommand::List {
            category: CategoryFilter::Equity,
            refresh: true,
        },
    )
    .await;
    assert!(result.is_ok(), "List failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_detail_flow_with_mock() {
    let mock_server = test_utils::create_market_mock_server().await;

    let result = run_with_config(
        &test_utils::config_for(&mock_server.uri()),
        AppCommand::Detail {
            code: "vesaf".to_string(),
            period: Lookback::THREE_MONTHS,
        },
    )
    .await;
    assert!(result.is_ok(), "Detail failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_compare_and_benchmark_flow_with_mock() {
    let mock_server = test_utils::create_market_mock_server().await;
    let config = test_utils::config_for(&mock_server.uri());

    let compare = run_with_config(
        &config,
        AppCommand::Compare {
            codes: vec!["VESAF".to_string(), "DCBF".to_string()],
            from: Some(date("2024-01-01")),
            to: Some(date("2024-01-31")),
        },
    )
    .await;
    assert!(compare.is_ok(), "Compare failed with: {:?}", compare.err());

    let benchmark = run_with_config(
        &config,
        AppCommand::Benchmark {
            funds: vec!["VESAF".to_string()],
            indices: vec!["VNINDEX".to_string()],
            from: Some(date("2024-01-01")),
            to: Some(date("2024-01-31")),
        },
    )
    .await;
    assert!(benchmark.is_ok(), "Benchmark failed with: {:?}", benchmark.err());
}

#[test_log::test(tokio::test)]
async fn test_provider_outage_is_reported_inline() {
    let mock_server = test_utils::create_failing_mock_server().await;
    let config = test_utils::config_for(&mock_server.uri());

    for command in [
        AppCommand::List {
            category: CategoryFilter::All,
            refresh: false,
        },
        AppCommand::Detail {
            code: "VESAF".to_string(),
            period: Lookback::All,
        },
        AppCommand::Benchmark {
            funds: vec![],
            indices: vec![],
            from: None,
            to: None,
        },
    ] {
        let result = run_with_config(&config, command.clone()).await;
        assert!(
            result.is_ok(),
            "{command:?} should not fail on provider errors: {:?}",
            result.err()
        );
    }
}

#[test_log::test(tokio::test)]
async fn test_service_caches_and_classifies() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/res/products/filter"))
        .respond_with(ResponseTemplate::new(200).set_body_string(test_utils::LISTING_JSON))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config: AppConfig = serde_yaml::from_str(&test_utils::config_for(&mock_server.uri()))
        .expect("Failed to parse config");
    let service = navdash::build_service(&config).expect("Failed to build service");

    let first = service.list_funds(CategoryFilter::All).await;
    let second = service.list_funds(CategoryFilter::All).await;
    assert_eq!(first, second);
    assert_eq!(first.data().map(|funds| funds.len()), Some(2));

    assert_eq!(service.refresh_listing().await, 1);
    let third = service.list_funds(CategoryFilter::All).await;
    assert!(matches!(third, FetchOutcome::Data(_)));
}

#[test_log::test(tokio::test)]
async fn test_missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("absent.yaml");

    let result = navdash::run_command(
        AppCommand::List {
            category: CategoryFilter::All,
            refresh: false,
        },
        Some(missing.to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("Missing config should fail");
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test_log::test(tokio::test)]
#[ignore = "hits the live Fmarket API"]
async fn test_real_fmarket_api() {
    use navdash::core::FundDataProvider;
    use navdash::providers::FmarketProvider;

    let provider = FmarketProvider::new("https://api.fmarket.vn").expect("Failed to build client");
    info!("Fetching fund listing from Fmarket");

    match provider.list_funds(CategoryFilter::Equity).await {
        Ok(funds) => {
            info!(count = funds.len(), "Received fund listing");
            assert!(!funds.is_empty(), "Listing should not be empty");
            let nav = provider
                .nav_history(&funds[0].code)
                .await
                .expect("NAV history request failed");
            assert!(nav.len() > 1, "NAV history should have several points");
        }
        Err(e) => {
            error!("Fmarket request failed: {e}\n{e:?}");
            panic!("Fmarket request failed: {e}");
        }
    }
}

#[test_log::test(tokio::test)]
#[ignore = "hits the live VCI API"]
async fn test_real_vci_api() {
    use navdash::core::IndexDataProvider;
    use navdash::providers::VciIndexProvider;

    let provider =
        VciIndexProvider::new("https://trading.vietcap.com.vn").expect("Failed to build client");
    let end = chrono::Local::now().date_naive();
    let start = end - chrono::Duration::days(30);

    match provider.index_history("VNINDEX", start, end).await {
        Ok(series) => {
            info!(points = series.len(), "Received index history");
            assert!(!series.is_empty(), "Index history should not be empty");
        }
        Err(e) => {
            error!("VCI request failed: {e}\n{e:?}");
            panic!("VCI request failed: {e}");
        }
    }
}

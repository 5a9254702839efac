//! Contract tests for NagerHolidayProvider against a mock Nager.Date API.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/api/v3/PublicHolidays/{year}/{countryCode}` | `fetch_*`, `holiday_dates_*` |

use presence_core::CalendarDate;
use presence_holiday::{CachedProvider, HolidayError, HolidayProvider, NagerConfig, NagerHolidayProvider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_provider(mock_server: &MockServer) -> NagerHolidayProvider {
    let mut config = NagerConfig::with_base_url(&mock_server.uri()).unwrap();
    config.timeout_secs = 5;
    NagerHolidayProvider::new(config).unwrap()
}

fn d(s: &str) -> CalendarDate {
    CalendarDate::parse(s).unwrap()
}

fn us_2026() -> serde_json::Value {
    serde_json::json!([
        {"date": "2026-01-01", "localName": "New Year's Day", "name": "New Year's Day",
         "countryCode": "US", "fixed": false, "global": true, "counties": null},
        {"date": "2026-02-12", "localName": "Lincoln's Birthday", "name": "Lincoln's Birthday",
         "countryCode": "US", "fixed": false, "global": false, "counties": ["US-CA", "US-CT"]},
        {"date": "2026-07-03", "localName": "Independence Day", "name": "Independence Day",
         "countryCode": "US", "fixed": false, "global": true, "counties": null},
        {"date": "2026-07-04", "localName": "Independence Day", "name": "Independence Day",
         "countryCode": "US", "fixed": true, "global": true, "counties": null}
    ])
}

// ── GET /api/v3/PublicHolidays/{year}/{country} ──────────────────────

#[tokio::test]
async fn fetch_returns_raw_entries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(us_2026()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);
    let holidays = provider.public_holidays(2026, "US").await.unwrap();
    assert_eq!(holidays.len(), 4);
    assert_eq!(holidays[1].name, "Lincoln's Birthday");
    assert!(!holidays[1].global);
}

#[tokio::test]
async fn holiday_dates_keeps_only_nationwide_weekdays() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(us_2026()))
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);

    let weekdays = provider.holiday_dates("us", None, &[2026], true).await.unwrap();
    assert_eq!(weekdays.into_iter().collect::<Vec<_>>(), vec![d("2026-01-01"), d("2026-07-03")]);

    // 2026-07-04 is a Saturday.
    let all = provider.holiday_dates("US", None, &[2026], false).await.unwrap();
    assert!(all.contains(&d("2026-07-04")));
    assert!(!all.contains(&d("2026-02-12")));
}

#[tokio::test]
async fn holiday_dates_queries_each_year_once() {
    let mock_server = MockServer::start().await;

    for year in [2026, 2027] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v3/PublicHolidays/{year}/DE")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"date": format!("{year}-10-03"), "name": "German Unity Day", "global": true}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let provider = test_provider(&mock_server);
    let dates = provider
        .holiday_dates("DE", Some("Acme"), &[2027, 2026, 2027], false)
        .await
        .unwrap();
    assert_eq!(dates.len(), 2);
}

#[tokio::test]
async fn holiday_dates_for_empty_country_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);
    assert!(provider.holiday_dates("", None, &[2026], true).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_maps_404_to_unknown_country() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/ZZ"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);
    let err = provider.holiday_dates("zz", None, &[2026], true).await.unwrap_err();
    assert!(matches!(err, HolidayError::UnknownCountry(ref c) if c == "ZZ"));
}

#[tokio::test]
async fn fetch_surfaces_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/US"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);
    let err = provider.public_holidays(2026, "US").await.unwrap_err();
    match err {
        HolidayError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_rejects_malformed_bodies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"oops": true})))
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);
    let err = provider.public_holidays(2026, "US").await.unwrap_err();
    assert!(matches!(err, HolidayError::Decode { .. }));
}

#[tokio::test]
async fn fetch_treats_no_content_as_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/US"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let provider = test_provider(&mock_server);
    assert!(provider.public_holidays(2026, "US").await.unwrap().is_empty());
}

#[tokio::test]
async fn cached_provider_hits_the_api_once_per_selector() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/PublicHolidays/2026/US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(us_2026()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cached = CachedProvider::new(test_provider(&mock_server));
    let first = cached.holiday_dates("US", None, &[2026], true).await.unwrap();
    let second = cached.holiday_dates("us", None, &[2026], true).await.unwrap();
    assert_eq!(first, second);
}

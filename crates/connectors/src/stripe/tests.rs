//! Tests for Stripe connector

use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::StripeConnectorConfig;
use crate::error::{ConnectorError, RequestFailure};
use crate::query::decode_nested;
use crate::date::start_of_day;
use crate::stripe::{FetchOptions, Stripe, StripeConfig};
use crate::traits::Connector;

const TOKEN: &str = "sk_test_abc123";
const EVENTS_PATH: &str = "/v1/events";

/// Connector pointed at the mock server, ready to fetch
fn test_stripe(server: &MockServer) -> Stripe {
    let mut stripe = Stripe::new(StripeConfig {
        api_url: format!("{}{}", server.uri(), EVENTS_PATH),
        page_delay: Duration::ZERO,
        ..StripeConfig::new(TOKEN)
    })
    .expect("should create connector");
    stripe.set_start_date(Some("2023-07-01")).unwrap();
    stripe.set_category_selector("customer.subscription.*");
    stripe
}

/// Generate mock events with ids `evt_<start>..`
fn mock_events(count: usize, start_id: usize) -> Vec<Value> {
    (start_id..start_id + count)
        .map(|i| {
            json!({
                "id": format!("evt_{}", i),
                "object": "event",
                "type": "customer.subscription.updated",
                "data": {"object": {"id": format!("sub_{}", i), "status": "active"}}
            })
        })
        .collect()
}

fn page(events: Vec<Value>, has_more: bool) -> Value {
    json!({"object": "list", "data": events, "has_more": has_more})
}

fn ids(events: &[crate::event::Event]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

// =============================================================================
// start_of_day / set_start_date
// =============================================================================

#[test]
fn test_start_of_day_utc() {
    assert_eq!(start_of_day("2023-07-01", Tz::UTC).unwrap(), 1688169600);
}

#[test]
fn test_start_of_day_fixed_zone() {
    // EDT is UTC-4 in July
    let ts = start_of_day("2023-07-01", chrono_tz::America::New_York).unwrap();
    assert_eq!(ts, 1688169600 + 4 * 3600);
}

#[test]
fn test_start_of_day_rejects_bad_format() {
    for input in ["bad-date", "2023-7-01", "2023/07/01", "20230701", "", "2023-07-01T00:00"] {
        let result = start_of_day(input, Tz::UTC);
        assert!(
            matches!(result, Err(ConnectorError::InvalidDate { .. })),
            "{input:?} should be rejected"
        );
    }
}

#[test]
fn test_start_of_day_rejects_impossible_date() {
    let result = start_of_day("2023-02-30", Tz::UTC);
    assert!(matches!(result, Err(ConnectorError::InvalidDate { .. })));
}

#[test]
fn test_set_start_date_explicit() {
    let mut stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();
    let ts = stripe.set_start_date(Some("2023-07-01")).unwrap();
    assert_eq!(ts, 1688169600);
    assert_eq!(stripe.start_ts(), Some(1688169600));
}

#[test]
fn test_set_start_date_invalid_keeps_previous_window() {
    let mut stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();
    stripe.set_start_date(Some("2023-07-01")).unwrap();

    let result = stripe.set_start_date(Some("bad-date"));
    assert!(matches!(result, Err(ConnectorError::InvalidDate { .. })));
    assert_eq!(stripe.start_ts(), Some(1688169600));
}

#[test]
fn test_set_start_date_default_uses_lead_time() {
    let mut stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();

    let before = Utc::now().timestamp();
    let ts = stripe.set_start_date(None).unwrap();
    let after = Utc::now().timestamp();

    let lead = 75 * 60;
    assert!(ts >= before - lead && ts <= after - lead);
}

// =============================================================================
// build_url
// =============================================================================

#[test]
fn test_build_url_requires_start_date() {
    let mut stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();
    stripe.set_category_selector("invoice.*");

    let result = stripe.build_url(None);
    assert!(matches!(result, Err(ConnectorError::Config(_))));
}

#[test]
fn test_build_url_requires_category() {
    let mut stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();
    stripe.set_start_date(Some("2023-07-01")).unwrap();

    let result = stripe.build_url(None);
    assert!(matches!(result, Err(ConnectorError::Config(_))));
}

#[test]
fn test_build_url_without_cursor() {
    let mut stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();
    stripe.set_start_date(Some("2023-07-01")).unwrap();
    stripe.set_category_selector("customer.subscription.*");

    let url = stripe.build_url(None).unwrap();
    assert_eq!(
        url,
        "https://api.stripe.com/v1/events?created[gte]=1688169600&type=customer.subscription.*"
    );
}

#[test]
fn test_build_url_with_cursor_and_limit() {
    let mut stripe = Stripe::new(StripeConfig {
        page_size: Some(100),
        ..StripeConfig::new(TOKEN)
    })
    .unwrap();
    stripe.set_start_date(Some("2023-07-01")).unwrap();
    stripe.set_category_selector("invoice.*");

    let url = stripe.build_url(Some("evt_42")).unwrap();
    let (_, query) = url.split_once('?').unwrap();
    let decoded = decode_nested(query);

    assert_eq!(
        Value::Object(decoded),
        json!({
            "created": {"gte": "1688169600"},
            "type": "invoice.*",
            "limit": "100",
            "starting_after": "evt_42"
        })
    );
}

// =============================================================================
// from_config
// =============================================================================

#[test]
fn test_from_config_requires_token() {
    let result = Stripe::from_config(&StripeConnectorConfig::default());
    assert!(matches!(result, Err(ConnectorError::Config(_))));
}

#[test]
fn test_from_config_applies_window_and_selector() {
    let config = StripeConnectorConfig {
        token: Some(TOKEN.into()),
        category: "invoice.*".into(),
        start_date: Some("2023-07-01".into()),
        max_continuations: 7,
        ..Default::default()
    };
    let stripe = Stripe::from_config(&config).unwrap();

    assert_eq!(stripe.start_ts(), Some(1688169600));
    assert_eq!(stripe.category(), Some("invoice.*"));
    assert_eq!(stripe.fetch_options().max_continuations, 7);
    assert_eq!(stripe.name(), "stripe");
}

#[test]
fn test_debug_does_not_leak_token() {
    let stripe = Stripe::new(StripeConfig::new(TOKEN)).unwrap();
    assert!(!format!("{:?}", stripe).contains(TOKEN));
}

// =============================================================================
// fetch_all (mock server)
// =============================================================================

#[tokio::test]
async fn test_fetch_single_page() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(query_param("created[gte]", "1688169600"))
        .and(query_param("type", "customer.subscription.*"))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 1), false)))
        .expect(1)
        .mount(&server)
        .await;

    let events = stripe.fetch_all(FetchOptions::default()).await.unwrap();
    assert_eq!(ids(&events), vec!["evt_1", "evt_2"]);
    assert_eq!(events[0].payload()["id"], "sub_1");
}

#[tokio::test]
async fn test_fetch_all_pages_in_order() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 1), true)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("starting_after", "evt_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 3), true)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("starting_after", "evt_4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 5), false)))
        .expect(1)
        .mount(&server)
        .await;

    let events = stripe
        .fetch_all(FetchOptions {
            cursor: None,
            max_continuations: 3,
        })
        .await
        .unwrap();

    assert_eq!(
        ids(&events),
        vec!["evt_1", "evt_2", "evt_3", "evt_4", "evt_5", "evt_6"]
    );
}

#[tokio::test]
async fn test_fetch_stops_when_budget_exhausted() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 1), true)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("starting_after", "evt_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 3), true)))
        .expect(1)
        .mount(&server)
        .await;

    // Never reached with a budget of one continuation
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("starting_after", "evt_4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 5), true)))
        .expect(0)
        .mount(&server)
        .await;

    let events = stripe
        .fetch_all(FetchOptions {
            cursor: None,
            max_continuations: 1,
        })
        .await
        .expect("exhausted budget returns fetched pages, not an error");

    assert_eq!(ids(&events), vec!["evt_1", "evt_2", "evt_3", "evt_4"]);
}

#[tokio::test]
async fn test_fetch_zero_budget_returns_first_page() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(3, 1), true)))
        .expect(1)
        .mount(&server)
        .await;

    let events = stripe
        .fetch_all(FetchOptions {
            cursor: None,
            max_continuations: 0,
        })
        .await
        .unwrap();
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn test_fetch_resumes_from_cursor() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("starting_after", "evt_99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(1, 100), false)))
        .expect(1)
        .mount(&server)
        .await;

    let events = stripe
        .fetch_all(FetchOptions {
            cursor: Some("evt_99".into()),
            max_continuations: 1,
        })
        .await
        .unwrap();
    assert_eq!(ids(&events), vec!["evt_100"]);
}

#[tokio::test]
async fn test_fetch_failure_on_later_page_discards_everything() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 1), true)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("starting_after", "evt_2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let result = stripe
        .fetch_all(FetchOptions {
            cursor: None,
            max_continuations: 5,
        })
        .await;

    match result {
        Err(ConnectorError::Request(RequestFailure::Status { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected request failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_unauthorized_is_request_failure() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "invalid_request_error", "message": "Invalid API Key provided"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = stripe.fetch_all(FetchOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::Request(RequestFailure::Status { status: 401, .. })
    ));
    assert!(err.to_string().starts_with("request failed"));
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .mount(&server)
        .await;

    let result = stripe.fetch_all(FetchOptions::default()).await;
    assert!(matches!(
        result,
        Err(ConnectorError::Request(RequestFailure::Malformed(_)))
    ));
}

#[tokio::test]
async fn test_fetch_empty_page_with_more_is_missing_continuation() {
    let server = MockServer::start().await;
    let stripe = test_stripe(&server);

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(Vec::new(), true)))
        .expect(1)
        .mount(&server)
        .await;

    let result = stripe.fetch_all(FetchOptions::default()).await;
    assert!(matches!(
        result,
        Err(ConnectorError::MissingContinuation { page: 1 })
    ));
}

#[tokio::test]
async fn test_fetch_without_configuration_makes_no_request() {
    let server = MockServer::start().await;
    let stripe = Stripe::new(StripeConfig {
        api_url: format!("{}{}", server.uri(), EVENTS_PATH),
        ..StripeConfig::new(TOKEN)
    })
    .unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(Vec::new(), false)))
        .expect(0)
        .mount(&server)
        .await;

    let result = stripe.fetch_all(FetchOptions::default()).await;
    assert!(matches!(result, Err(ConnectorError::Config(_))));
}

#[tokio::test]
async fn test_transient_failure_retried_when_enabled() {
    let server = MockServer::start().await;
    let mut stripe = Stripe::new(StripeConfig {
        api_url: format!("{}{}", server.uri(), EVENTS_PATH),
        page_delay: Duration::ZERO,
        resilience: crate::resilience::ResilienceConfig {
            max_retries: 1,
            retry_base_delay_ms: 1,
            ..Default::default()
        },
        ..StripeConfig::new(TOKEN)
    })
    .unwrap();
    stripe.set_start_date(Some("2023-07-01")).unwrap();
    stripe.set_category_selector("invoice.*");

    // First attempt fails with 503, the retry succeeds
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(1, 1), false)))
        .expect(1)
        .mount(&server)
        .await;

    let events = stripe.fetch_all(FetchOptions::default()).await.unwrap();
    assert_eq!(ids(&events), vec!["evt_1"]);
}

#[tokio::test]
async fn test_connector_pull_uses_configured_budget() {
    let server = MockServer::start().await;
    let config = StripeConnectorConfig {
        token: Some(TOKEN.into()),
        api_url: format!("{}{}", server.uri(), EVENTS_PATH),
        start_date: Some("2023-07-01".into()),
        page_delay_ms: 0,
        max_continuations: 0,
        ..Default::default()
    };
    let stripe = Stripe::from_config(&config).unwrap();

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(mock_events(2, 1), true)))
        .expect(1)
        .mount(&server)
        .await;

    let events = stripe.pull().await.unwrap();
    assert_eq!(events.len(), 2);
}

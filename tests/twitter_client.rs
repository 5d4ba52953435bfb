use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;
use url::Url;

use citytrends::application::trends::{
    CLOSEST_OPERATION, PLACE_TRENDS_OPERATION, TrendsApiError, TrendsClient,
};
use citytrends::config::TwitterSettings;
use citytrends::infra::twitter::{TwitterClient, TwitterCredentials};

fn client(server: &MockServer) -> TwitterClient {
    let settings = TwitterSettings {
        api_url: Url::parse(&server.url("/1.1/")).expect("mock base url"),
        timeout: Duration::from_secs(5),
        credentials: None,
    };
    let credentials = TwitterCredentials {
        consumer_key: "consumer".into(),
        consumer_secret: "consumer-secret".into(),
        access_token: "token".into(),
        access_token_secret: "token-secret".into(),
    };
    TwitterClient::new(&settings, credentials).expect("client")
}

#[tokio::test]
async fn closest_woeid_sends_signed_coordinates() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/1.1/closest.json")
            .query_param("lat", "51.5")
            .query_param("long", "-0.12")
            .header_exists("authorization");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"name":"London","countryCode":"GB","woeid":44418}]"#);
    });

    let woeid = client(&server)
        .closest_woeid(51.5, -0.12)
        .await
        .expect("woeid");

    mock.assert();
    assert_eq!(woeid, 44418);
}

#[tokio::test]
async fn place_trends_returns_first_trend_list_verbatim() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/1.1/place.json")
            .query_param("id", "44418");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r##"[
                    {"trends": [{"name": "#A", "tweet_volume": 10}, {"name": "#B"}], "as_of": "2024-01-01T00:00:00Z"},
                    {"trends": [{"name": "#ignored"}]}
                ]"##,
            );
    });

    let trends = client(&server).place_trends(44418).await.expect("trends");

    mock.assert();
    assert_eq!(
        trends,
        vec![json!({"name": "#A", "tweet_volume": 10}), json!({"name": "#B"})]
    );
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/1.1/place.json");
        then.status(429)
            .header("content-type", "application/json")
            .body(r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#);
    });

    let err = client(&server)
        .place_trends(1)
        .await
        .expect_err("rate limited");

    match err {
        TrendsApiError::Status {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, PLACE_TRENDS_OPERATION);
            assert_eq!(status, 429);
            assert!(body.contains("Rate limit exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_result_list_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/1.1/closest.json");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });

    let err = client(&server)
        .closest_woeid(0.0, 0.0)
        .await
        .expect_err("empty list");

    assert!(matches!(
        err,
        TrendsApiError::EmptyResponse {
            operation: CLOSEST_OPERATION
        }
    ));
    assert_eq!(err.to_string(), "closest location returned an empty result list");
}

#[tokio::test]
async fn missing_woeid_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/1.1/closest.json");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"name":"Nowhere"}]"#);
    });

    let err = client(&server)
        .closest_woeid(1.0, 2.0)
        .await
        .expect_err("missing woeid");

    assert!(matches!(err, TrendsApiError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    let settings = TwitterSettings {
        // Nothing listens on the discard port.
        api_url: Url::parse("http://127.0.0.1:9/1.1/").expect("url"),
        timeout: Duration::from_secs(2),
        credentials: None,
    };
    let credentials = TwitterCredentials {
        consumer_key: "c".into(),
        consumer_secret: "s".into(),
        access_token: "t".into(),
        access_token_secret: "ts".into(),
    };
    let client = TwitterClient::new(&settings, credentials).expect("client");

    let err = client
        .closest_woeid(1.0, 2.0)
        .await
        .expect_err("connection refused");

    assert!(matches!(err, TrendsApiError::Transport { .. }));
}

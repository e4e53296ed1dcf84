#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests of the gateway over a real HTTP stack.

mod common;

use std::time::{Duration, Instant};

use httpmock::prelude::*;
use instagram_gateway::{ErrorCategory, GatewayConfig, PublishPhase};
use instagram_gateway_sdk::{PublishMediaRequest, SendMessageRequest};
use serde_json::json;

use common::{ACCOUNT, TOKEN, config, gateway, png};

#[tokio::test]
async fn identical_profile_reads_are_served_from_cache() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let mock = resource.mock(|when, then| {
        when.method(Method::GET)
            .path(format!("/v19.0/{ACCOUNT}"))
            .query_param("access_token", TOKEN);
        then.status(200)
            .json_body(json!({"id": ACCOUNT, "username": "acme", "media_count": 12}));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let first = gateway.get_profile(None).await.unwrap();
    let second = gateway.get_profile(None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.username, "acme");
    assert_eq!(mock.calls(), 1);
    assert_eq!(gateway.rate_limit_info().calls_in_window, 1);
}

#[tokio::test]
async fn http_429_is_reported_as_rate_limited() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let mock = resource.mock(|when, then| {
        when.method(Method::GET).path(format!("/v19.0/{ACCOUNT}/media"));
        then.status(429).body("Too Many Requests");
    });
    let gateway = gateway(&config(&resource, &messaging));

    let err = gateway.list_media(None, 25, None).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::RateLimited);
    assert!(err.is_retriable());

    // Failures are never cached.
    gateway.list_media(None, 25, None).await.unwrap_err();
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn error_envelope_is_classified() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    resource.mock(|when, then| {
        when.method(Method::GET).path("/v19.0/999/insights");
        then.status(400).json_body(json!({
            "error": {
                "message": "Invalid parameter",
                "type": "OAuthException",
                "code": 100,
                "error_subcode": 2_108_006,
                "fbtrace_id": "AbCdEf"
            }
        }));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let err = gateway.get_media_insights("999".to_owned(), Vec::new()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::RemoteApi);
    let remote = err.remote_error().unwrap();
    assert_eq!(remote.message, "Invalid parameter");
    assert_eq!(remote.code, Some(100));
    assert_eq!(remote.subcode, Some(2_108_006));
    assert!(err.remediation().is_none());
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    resource.mock(|when, then| {
        when.method(Method::GET).path("/v19.0/me/accounts");
        then.status(200).body("<html>maintenance</html>");
    });
    let gateway = gateway(&config(&resource, &messaging));

    let err = gateway.list_pages().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidResponse);
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let mut config = config(&resource, &messaging);
    config.api_base_url = "http://127.0.0.1:9".to_owned();
    let gateway = gateway(&config);

    let err = gateway.get_profile(None).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(!err.to_string().contains(TOKEN));
    assert!(!gateway.validate_token().await.unwrap());
}

#[tokio::test]
async fn slow_response_times_out_as_network_error() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    resource.mock(|when, then| {
        when.method(Method::GET).path("/v19.0/me");
        then.status(200)
            .json_body(json!({"id": "1"}))
            .delay(Duration::from_millis(800));
    });
    let mut config = config(&resource, &messaging);
    config.request_timeout_ms = 100;
    let gateway = gateway(&config);

    assert!(!gateway.validate_token().await.unwrap());
}

#[tokio::test]
async fn conversations_go_to_the_messaging_host() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let pages = resource.mock(|when, then| {
        when.method(Method::GET).path("/v19.0/me/accounts");
        then.status(200).json_body(json!({
            "data": [{"id": "page-1", "name": "Acme", "instagram_business_account": {"id": ACCOUNT}}]
        }));
    });
    let conversations = messaging.mock(|when, then| {
        when.method(Method::GET)
            .path("/v22.0/page-1/conversations")
            .query_param("platform", "instagram")
            .query_param("access_token", TOKEN);
        then.status(200).json_body(json!({
            "data": [
                {"id": "t_1", "updated_time": "2024-03-01T10:00:00+0000", "message_count": 3},
                {"id": "t_2", "updated_time": "2024-03-02T10:00:00+0000"}
            ]
        }));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let listed = gateway.list_conversations(None, 25).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].message_count, Some(3));
    assert_eq!(pages.calls(), 1);
    assert_eq!(conversations.calls(), 1);
}

#[tokio::test]
async fn messaging_permission_failure_carries_remediation() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    messaging.mock(|when, then| {
        when.method(Method::GET).path("/v22.0/t_1");
        then.status(400).json_body(json!({
            "error": {"message": "(#2) This feature is temporarily unavailable", "code": 2}
        }));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let err = gateway.list_messages("t_1".to_owned(), 10).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::PermissionAdvancedAccessRequired);
    let text = err.to_string();
    assert!(text.contains("temporarily unavailable"));
    assert!(text.contains("Advanced Access"));
}

#[tokio::test]
async fn send_message_posts_to_messaging_host() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let mock = messaging.mock(|when, then| {
        when.method(Method::POST)
            .path("/v22.0/me/messages")
            .json_body(json!({"recipient": {"id": "igsid-1"}, "message": {"text": "Thanks!"}}));
        then.status(200)
            .json_body(json!({"recipient_id": "igsid-1", "message_id": "mid.abc"}));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let sent = gateway
        .send_message(SendMessageRequest {
            recipient_id: "igsid-1".to_owned(),
            text: "Thanks!".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(sent.message_id, "mid.abc");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn publish_image_runs_both_phases_once() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let image = resource.mock(|when, then| {
        when.method(Method::GET).path("/cdn/photo.png");
        then.status(200)
            .header("content-type", "image/png")
            .body(png(1080, 1080));
    });
    let create = resource.mock(|when, then| {
        when.method(Method::POST)
            .path(format!("/v19.0/{ACCOUNT}/media"))
            .json_body(json!({
                "caption": "Hello",
                "image_url": format!("{}/cdn/photo.png", resource.base_url())
            }));
        then.status(200).json_body(json!({"id": "17900000001"}));
    });
    let commit = resource.mock(|when, then| {
        when.method(Method::POST)
            .path(format!("/v19.0/{ACCOUNT}/media_publish"))
            .json_body(json!({"creation_id": "17900000001"}));
        then.status(200).json_body(json!({"id": "17900000002"}));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let published = gateway
        .publish_media(PublishMediaRequest {
            image_url: Some(format!("{}/cdn/photo.png", resource.base_url())),
            caption: Some("Hello".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(published.id, "17900000002");
    assert_eq!(published.container_id, "17900000001");
    assert_eq!(image.calls(), 1);
    assert_eq!(create.calls(), 1);
    assert_eq!(commit.calls(), 1);
}

#[tokio::test]
async fn publish_with_bad_ratio_never_creates_a_container() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    resource.mock(|when, then| {
        when.method(Method::GET).path("/cdn/wide.png");
        then.status(200).body(png(1000, 800));
    });
    let create = resource.mock(|when, then| {
        when.method(Method::POST).path(format!("/v19.0/{ACCOUNT}/media"));
        then.status(200).json_body(json!({"id": "c"}));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let failure = gateway
        .publish_media(PublishMediaRequest {
            image_url: Some(format!("{}/cdn/wide.png", resource.base_url())),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(failure.phase, PublishPhase::Precondition);
    assert_eq!(failure.error.category(), ErrorCategory::Validation);
    assert!(failure.error.to_string().contains("1.250"));
    assert_eq!(create.calls(), 0);
}

#[tokio::test]
async fn publish_without_media_makes_no_calls() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let posts = resource.mock(|when, then| {
        when.method(Method::POST);
        then.status(200).json_body(json!({"id": "x"}));
    });
    let gets = resource.mock(|when, then| {
        when.method(Method::GET);
        then.status(200).json_body(json!({"id": "x"}));
    });
    let gateway = gateway(&config(&resource, &messaging));

    let failure = gateway
        .publish_media(PublishMediaRequest {
            caption: Some("no media".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(failure.error.category(), ErrorCategory::Validation);
    assert_eq!(posts.calls(), 0);
    assert_eq!(gets.calls(), 0);
}

#[tokio::test]
async fn third_call_waits_for_the_rolling_window() {
    let resource = MockServer::start();
    let messaging = MockServer::start();
    let mock = resource.mock(|when, then| {
        when.method(Method::GET).path(format!("/v19.0/{ACCOUNT}/media"));
        then.status(200).json_body(json!({"data": []}));
    });
    let mut config: GatewayConfig = config(&resource, &messaging);
    config.rate_limit_requests_per_hour = 2;
    config.rate_limit_period_secs = 1;
    let gateway = gateway(&config);

    let start = Instant::now();
    for limit in [10, 20, 30] {
        gateway.list_media(None, limit, None).await.unwrap();
    }
    let elapsed = start.elapsed();

    assert_eq!(mock.calls(), 3);
    assert!(
        elapsed >= Duration::from_millis(950),
        "third call admitted after {} ms",
        elapsed.as_millis()
    );
}

//! Query relay integration tests
//!
//! The composed router talks to a real answer service stand-in: a wiremock
//! HTTP server, or a shell script run as a subprocess.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medrelay_relay::{mock::MockRelay, RelayConfig, RelayServiceFactory};

use crate::common::{json_post, parse_body, relay_router};

/// Router whose relay posts to `base_url`
fn http_router(base_url: Option<String>, timeout: Duration) -> axum::Router {
    let config = RelayConfig {
        base_url,
        ..RelayConfig::default()
    }
    .with_timeout(timeout);
    let relay = RelayServiceFactory::create(config).unwrap();
    relay_router(Arc::from(relay))
}

mod test_http_relay {
    use super::*;

    #[tokio::test]
    async fn test_answer_is_returned_to_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({"query": "Is paracetamol safe in pregnancy?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "X"})))
            .expect(1)
            .mount(&server)
            .await;

        let app = http_router(Some(server.uri()), Duration::from_secs(5));
        let resp = app
            .oneshot(json_post(
                "/api/chat",
                r#"{"query": "Is paracetamol safe in pregnancy?"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await, json!({"answer": "X"}));
    }

    #[tokio::test]
    async fn test_remote_500_surfaces_error_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "oops"})))
            .mount(&server)
            .await;

        let app = http_router(Some(server.uri()), Duration::from_secs(5));
        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = parse_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("oops"));
    }

    #[tokio::test]
    async fn test_reply_without_fields_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contexts": []})))
            .mount(&server)
            .await;

        let app = http_router(Some(server.uri()), Duration::from_secs(5));
        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_slow_service_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let app = http_router(Some(server.uri()), Duration::from_millis(200));
        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = parse_body(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("cannot reach answer service"));
    }

    #[tokio::test]
    async fn test_refused_connection_does_not_expose_service_url() {
        // Reserve a port, then free it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let app = http_router(
            Some(format!("http://{}/internal-rag", addr)),
            Duration::from_secs(2),
        );
        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = parse_body(resp).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("cannot reach answer service: "));
        assert!(!error.contains("127.0.0.1"));
        assert!(!error.contains("internal-rag"));
    }

    #[tokio::test]
    async fn test_missing_url_is_service_unavailable_without_io() {
        let app = http_router(None, Duration::from_secs(5));
        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_empty_query_never_reaches_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "X"})))
            .expect(0)
            .mount(&server)
            .await;

        let app = http_router(Some(server.uri()), Duration::from_secs(5));
        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": ""}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_same_query_twice_calls_service_twice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "X"})))
            .expect(2)
            .mount(&server)
            .await;

        let app = http_router(Some(server.uri()), Duration::from_secs(5));
        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(json_post("/api/chat", r#"{"query": "repeat"}"#))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }
}

#[cfg(unix)]
mod test_subprocess_relay {
    use super::*;

    #[tokio::test]
    async fn test_script_answer_is_returned_to_caller() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("answer.sh");
        std::fs::write(&script, "printf '{\"answer\": \"%s\"}\\n' \"$2\"\n").unwrap();

        let config = RelayConfig {
            interpreter: Some("sh".to_string()),
            ..RelayConfig::subprocess(script)
        };
        let relay = RelayServiceFactory::create(config).unwrap();
        let app = relay_router(Arc::from(relay));

        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "dizziness"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await, json!({"answer": "dizziness"}));
    }

    #[tokio::test]
    async fn test_crashing_script_does_not_expose_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("answer.sh");
        std::fs::write(
            &script,
            "echo 'Traceback: File \"/srv/rag/secrets.py\", line 3, KeyError: GEMINI_API_KEY' >&2\nexit 1\n",
        )
        .unwrap();

        let config = RelayConfig {
            interpreter: Some("sh".to_string()),
            ..RelayConfig::subprocess(script)
        };
        let relay = RelayServiceFactory::create(config).unwrap();
        let app = relay_router(Arc::from(relay));

        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = parse_body(resp).await;
        assert_eq!(
            body["error"],
            "cannot reach answer service: exit status 1"
        );
        let text = body.to_string();
        assert!(!text.contains("secrets.py"));
        assert!(!text.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_missing_program_is_service_unavailable() {
        let config = RelayConfig {
            program: None,
            ..RelayConfig::subprocess("unused")
        };
        let relay = RelayServiceFactory::create(config).unwrap();
        let app = relay_router(Arc::from(relay));

        let resp = app
            .oneshot(json_post("/api/chat", r#"{"query": "q"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

mod test_input_validation {
    use super::*;

    #[tokio::test]
    async fn test_absent_query_makes_no_relay_call() {
        let relay = MockRelay::new();
        let app = relay_router(Arc::new(relay.clone()));

        let resp = app
            .oneshot(json_post("/api/chat", r#"{"question": "wrong field"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = parse_body(resp).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(relay.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_json_makes_no_relay_call() {
        let relay = MockRelay::new();
        let app = relay_router(Arc::new(relay.clone()));

        let resp = app
            .oneshot(json_post("/api/chat", "query=hello"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(relay.calls(), 0);
    }
}

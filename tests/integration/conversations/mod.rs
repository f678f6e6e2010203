//! Conversation listing integration tests
//!
//! Require a PostgreSQL database (`TEST_DATABASE_URL`); run with
//! `--ignored`. Tests share one table, so run them with `--test-threads=1`.

use axum::http::StatusCode;
use tower::ServiceExt;

use crate::common::{json_post, parse_body, ConversationsTestApp};

mod test_list_conversations {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_list_empty() {
        let app = ConversationsTestApp::new().await.unwrap();
        app.cleanup().await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_post("/api/conversations", "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        assert_eq!(body["total"], 0);
        assert_eq!(body["totalPages"], 0);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 10);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_list_newest_first() {
        let app = ConversationsTestApp::new().await.unwrap();
        app.cleanup().await.unwrap();

        app.create_test_conversation("older").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        app.create_test_conversation("newer").await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_post("/api/conversations", ""))
            .await
            .unwrap();
        let body = parse_body(resp).await;

        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["description"], "newer");
        assert_eq!(body["data"][1]["description"], "older");
        assert_eq!(body["data"][0]["patient"], "test-patient");
        assert!(body["data"][0]["createdAt"].is_string());

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_list_second_page() {
        let app = ConversationsTestApp::new().await.unwrap();
        app.cleanup().await.unwrap();

        for i in 0..5 {
            app.create_test_conversation(&format!("consultation {}", i))
                .await
                .unwrap();
        }

        let resp = app
            .test_router()
            .oneshot(json_post("/api/conversations", r#"{"page": 2, "limit": 2}"#))
            .await
            .unwrap();
        let body = parse_body(resp).await;

        assert_eq!(body["total"], 5);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_list_page_past_end_is_empty() {
        let app = ConversationsTestApp::new().await.unwrap();
        app.cleanup().await.unwrap();
        app.create_test_conversation("only one").await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_post("/api/conversations", r#"{"page": 9}"#))
            .await
            .unwrap();
        let body = parse_body(resp).await;

        assert_eq!(body["total"], 1);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL
    async fn test_list_malformed_body_returns_400() {
        let app = ConversationsTestApp::new().await.unwrap();

        let resp = app
            .test_router()
            .oneshot(json_post("/api/conversations", r#"{"page": "two"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

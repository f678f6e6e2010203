//! HTTP relay
//!
//! Calls a long-running answer service at `<base-url>/chat` using the
//! reqwest HTTP client.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;

use crate::{
    classify, preview, FailureKind, RelayError, RelayMode, RelayOutcome, RelayService,
};

const CHAT_PATH: &str = "chat";

/// Answer service request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

/// HTTP relay implementation
pub struct HttpRelay {
    client: Client,
    /// Resolved `/chat` endpoint, or the failure every call reports
    endpoint: Result<Url, RelayOutcome>,
    timeout: Duration,
}

impl HttpRelay {
    /// Create a new HTTP relay.
    ///
    /// A missing or malformed `base_url` does not fail construction; the
    /// relay reports `ServiceMisconfigured` on every call instead.
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Configuration(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            endpoint: resolve_endpoint(base_url.as_deref()),
            timeout,
        })
    }

    /// The `/chat` URL this relay posts to, when configured
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref().ok()
    }

    /// reqwest error text names the endpoint, so it only goes into `detail`
    fn classify_transport_error(&self, err: &reqwest::Error) -> RelayOutcome {
        let (kind, reason) = if err.is_builder() {
            (FailureKind::ServiceMisconfigured, "invalid request".to_string())
        } else if err.is_timeout() {
            (
                FailureKind::Unreachable,
                format!("no reply within {}s", self.timeout.as_secs_f32()),
            )
        } else if err.is_connect() {
            (FailureKind::Unreachable, "connection failed".to_string())
        } else {
            (FailureKind::Unreachable, "request failed".to_string())
        };
        RelayOutcome::failure(kind, reason).with_detail(err.to_string())
    }
}

fn misconfigured(reason: &str, detail: String) -> RelayOutcome {
    RelayOutcome::failure(FailureKind::ServiceMisconfigured, reason).with_detail(detail)
}

fn resolve_endpoint(base_url: Option<&str>) -> Result<Url, RelayOutcome> {
    let base = base_url
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            misconfigured(
                "not configured",
                "answer service URL is not configured".to_string(),
            )
        })?;

    // Treat the base as a directory so `/chat` is appended, not substituted
    let base = Url::parse(&format!("{}/", base.trim_end_matches('/'))).map_err(|e| {
        misconfigured(
            "invalid service URL",
            format!("invalid answer service URL {:?}: {}", base, e),
        )
    })?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(misconfigured(
            "invalid service URL",
            format!(
                "answer service URL must use http or https, got {:?}",
                base.scheme()
            ),
        ));
    }

    base.join(CHAT_PATH).map_err(|e| {
        misconfigured(
            "invalid service URL",
            format!("invalid answer service URL {:?}: {}", base.as_str(), e),
        )
    })
}

#[async_trait::async_trait]
impl RelayService for HttpRelay {
    async fn send(&self, query: &str) -> RelayOutcome {
        let endpoint = match &self.endpoint {
            Ok(url) => url.clone(),
            Err(failure) => {
                tracing::warn!(outcome = ?failure, "HTTP relay is misconfigured, skipping call");
                return failure.clone();
            }
        };

        tracing::debug!(endpoint = %endpoint, query = %preview(query), "Sending query to answer service");

        let response = match self
            .client
            .post(endpoint)
            .json(&ChatRequest { query })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return self.classify_transport_error(&e),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            // The status already arrived, so the service did reply
            Err(e) if !status.is_success() => {
                return classify::classify_error_status(status.as_u16(), "")
                    .with_detail(format!("status {}, unreadable body: {}", status.as_u16(), e));
            }
            Err(e) => return self.classify_transport_error(&e),
        };

        if !status.is_success() {
            tracing::debug!(status = %status, body = %preview(&body), "Answer service returned error status");
            return classify::classify_error_status(status.as_u16(), &body);
        }

        classify::classify_body(&body)
    }

    fn mode(&self) -> RelayMode {
        RelayMode::Http
    }
}

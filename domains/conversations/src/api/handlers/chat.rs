//! Query relay API handler
//!
//! Accepts a free-text query, forwards it through the relay and maps the
//! normalized outcome to an HTTP response.

use axum::{extract::State, Json};
use medrelay_common::{Error, Result, ValidatedJson};
use medrelay_relay::{preview, FailureKind, RelayOutcome};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::SharedRelay;

/// Response text for replies the relay could not interpret
pub const INVALID_RESPONSE_MESSAGE: &str = "answer service returned an unexpected response";

/// Request for submitting a query
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQueryRequest {
    /// Free-text question
    #[validate(required(message = "Missing 'query' field in request body"))]
    pub query: Option<String>,
}

/// Successful answer
#[derive(Debug, Serialize)]
pub struct SubmitQueryResponse {
    pub answer: String,
}

/// Submit a query to the answer service
pub async fn submit_query(
    State(relay): State<SharedRelay>,
    ValidatedJson(req): ValidatedJson<SubmitQueryRequest>,
) -> Result<Json<SubmitQueryResponse>> {
    let query = req.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        tracing::warn!("Rejected query request with empty 'query' field");
        return Err(Error::Validation(
            "Field 'query' must be a non-empty string".to_string(),
        ));
    }

    tracing::info!(query = %preview(query), "Received query");
    tracing::debug!(mode = %relay.mode(), "Forwarding query to answer service");

    let outcome = relay.send(query).await;
    respond(outcome).map(Json)
}

/// Map a relay outcome to the response body or an HTTP error.
///
/// Only the failure `reason` reaches the caller; `detail` is logged here.
pub fn respond(outcome: RelayOutcome) -> Result<SubmitQueryResponse> {
    match outcome {
        RelayOutcome::Success { answer } => {
            tracing::info!(answer = %preview(&answer), "Answer service replied");
            Ok(SubmitQueryResponse { answer })
        }
        RelayOutcome::Failure {
            kind,
            reason,
            detail,
        } => {
            tracing::warn!(kind = %kind, reason = %reason, detail = %detail, "Answer service call failed");
            Err(failure_error(kind, reason, detail))
        }
    }
}

fn failure_error(kind: FailureKind, reason: String, detail: String) -> Error {
    match kind {
        FailureKind::ServiceMisconfigured | FailureKind::Unreachable => {
            Error::ServiceUnavailable(format!("cannot reach answer service: {}", reason))
        }
        FailureKind::InvalidResponse => Error::BadGateway(INVALID_RESPONSE_MESSAGE.to_string()),
        FailureKind::RemoteError { .. } => {
            Error::ServiceUnavailable(format!("answer service error: {}", reason))
        }
        FailureKind::Internal => Error::Internal(detail),
    }
}

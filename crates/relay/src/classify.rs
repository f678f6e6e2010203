//! Classification of answer-service replies
//!
//! Both transports hand their raw reply to these functions so the HTTP and
//! subprocess relays agree on what counts as an answer.

use serde_json::Value;

use crate::{preview, FailureKind, RelayOutcome};

/// Classify a reply body received with a success status.
///
/// `{"answer": "..."}` with non-empty text is a success, an `error` field is a
/// remote error, anything else is an invalid response.
pub fn classify_body(body: &str) -> RelayOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => classify_value(&value),
        Err(e) => RelayOutcome::failure(FailureKind::InvalidResponse, "reply is not valid JSON")
            .with_detail(format!("reply is not valid JSON: {}", e)),
    }
}

/// Classify an already-parsed reply.
pub fn classify_value(value: &Value) -> RelayOutcome {
    if let Some(answer) = value
        .get("answer")
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty())
    {
        return RelayOutcome::success(answer);
    }

    if let Some(detail) = error_field(value) {
        return remote_error(None, detail);
    }

    RelayOutcome::failure(
        FailureKind::InvalidResponse,
        "reply contains neither an answer nor an error",
    )
}

/// Classify a reply that arrived with a non-2xx status.
///
/// The detail is the body's `error` field, or `status N` when there is none.
pub fn classify_error_status(status: u16, body: &str) -> RelayOutcome {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(error_field)
        .unwrap_or_else(|| format!("status {}", status));

    remote_error(Some(status), detail)
}

/// The service's own error text is the caller-facing reason, bounded in length.
fn remote_error(status: Option<u16>, detail: String) -> RelayOutcome {
    RelayOutcome::failure(FailureKind::RemoteError { status }, preview(&detail)).with_detail(detail)
}

/// Text of a non-null `error` field; non-string values are rendered as JSON.
pub(crate) fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

//! Medrelay Relay Client
//!
//! Forwards user queries to the external answer service and normalizes every
//! result into a [`RelayOutcome`]. Supported transports:
//! - HTTP relay for a long-running answer service reachable by URL
//! - Subprocess relay that runs the answer program once per query
//! - Mock relay for tests (`test-support` feature)
//!
//! `send` never fails: transport faults, remote errors and malformed replies
//! all come back as [`RelayOutcome::Failure`]. A failure carries a short
//! `reason` that is safe to show callers and a `detail` that is only logged.

pub mod classify;
pub mod http;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod subprocess;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Bounded wait for a single call to the answer service
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Characters of query/answer text kept in log lines
pub const LOG_PREVIEW_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay configuration error: {0}")]
    Configuration(String),
}

/// Why a relay attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Local setup is missing or invalid; no I/O was attempted
    ServiceMisconfigured,
    /// I/O was attempted but no response came back (refused, timeout, crash)
    Unreachable,
    /// The service answered and reported a failure
    RemoteError { status: Option<u16> },
    /// The service answered with something we cannot interpret
    InvalidResponse,
    /// Any other local fault
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ServiceMisconfigured => write!(f, "service_misconfigured"),
            FailureKind::Unreachable => write!(f, "unreachable"),
            FailureKind::RemoteError { status: Some(s) } => write!(f, "remote_error({})", s),
            FailureKind::RemoteError { status: None } => write!(f, "remote_error"),
            FailureKind::InvalidResponse => write!(f, "invalid_response"),
            FailureKind::Internal => write!(f, "internal"),
        }
    }
}

/// Normalized result of one relay attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Success {
        answer: String,
    },
    Failure {
        kind: FailureKind,
        /// Short cause that may be returned to the caller
        reason: String,
        /// Full cause for logs only (error text, stderr, URLs)
        detail: String,
    },
}

impl RelayOutcome {
    pub fn success(answer: impl Into<String>) -> Self {
        RelayOutcome::Success {
            answer: answer.into(),
        }
    }

    /// Failure whose public reason is also its full detail
    pub fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        RelayOutcome::Failure {
            kind,
            detail: reason.clone(),
            reason,
        }
    }

    /// Attach log-only detail to a failure; successes are returned unchanged
    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        match self {
            RelayOutcome::Failure { kind, reason, .. } => RelayOutcome::Failure {
                kind,
                reason,
                detail: detail.into(),
            },
            success => success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RelayOutcome::Success { .. })
    }

    /// Failure kind, if this outcome is a failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RelayOutcome::Success { .. } => None,
            RelayOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Caller-safe failure reason, if this outcome is a failure
    pub fn reason(&self) -> Option<&str> {
        match self {
            RelayOutcome::Success { .. } => None,
            RelayOutcome::Failure { reason, .. } => Some(reason),
        }
    }
}

/// Truncate text for log output without splitting a UTF-8 character
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Transport used to reach the answer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    #[default]
    Http,
    Subprocess,
    #[cfg(any(test, feature = "test-support"))]
    Mock,
}

impl std::str::FromStr for RelayMode {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(RelayMode::Http),
            "subprocess" | "process" => Ok(RelayMode::Subprocess),
            #[cfg(any(test, feature = "test-support"))]
            "mock" => Ok(RelayMode::Mock),
            other => Err(RelayError::Configuration(format!(
                "Unknown answer service mode: {}. Supported modes: http, subprocess",
                other
            ))),
        }
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayMode::Http => write!(f, "http"),
            RelayMode::Subprocess => write!(f, "subprocess"),
            #[cfg(any(test, feature = "test-support"))]
            RelayMode::Mock => write!(f, "mock"),
        }
    }
}

/// Relay configuration, loaded once at startup and immutable afterwards.
///
/// Missing addresses are kept as `None` rather than guessed; the relay then
/// answers every call with `ServiceMisconfigured`.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: RelayMode,
    /// Base URL of the answer service (http mode); `/chat` is appended
    pub base_url: Option<String>,
    /// Answer program or script (subprocess mode)
    pub program: Option<PathBuf>,
    /// Interpreter used to run `program`, e.g. `python3`
    pub interpreter: Option<String>,
    /// Working directory for the subprocess
    pub working_dir: Option<PathBuf>,
    /// Index/config path handed to the subprocess as `--index`
    pub index_path: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::default(),
            base_url: None,
            program: None,
            interpreter: None,
            working_dir: None,
            index_path: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RelayConfig {
    /// Network-mode configuration for the given base URL
    pub fn http(base_url: impl Into<String>) -> Self {
        Self {
            mode: RelayMode::Http,
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Subprocess-mode configuration for the given program
    pub fn subprocess(program: impl Into<PathBuf>) -> Self {
        Self {
            mode: RelayMode::Subprocess,
            program: Some(program.into()),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create relay config from environment variables
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build relay config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match non_blank("ANSWER_SERVICE_MODE") {
            Some(raw) => raw.parse()?,
            None => RelayMode::default(),
        };

        let timeout = match non_blank("ANSWER_SERVICE_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    RelayError::Configuration(format!(
                        "ANSWER_SERVICE_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                        raw
                    ))
                })?;
                if secs == 0 {
                    return Err(RelayError::Configuration(
                        "ANSWER_SERVICE_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            mode,
            base_url: non_blank("ANSWER_SERVICE_URL").or_else(|| non_blank("PYTHON_API_URL")),
            program: non_blank("ANSWER_SERVICE_PROGRAM").map(PathBuf::from),
            interpreter: non_blank("ANSWER_SERVICE_INTERPRETER"),
            working_dir: non_blank("ANSWER_SERVICE_WORKDIR").map(PathBuf::from),
            index_path: non_blank("ANSWER_SERVICE_INDEX").map(PathBuf::from),
            timeout,
        })
    }

    /// Whether the selected mode has the address it needs
    pub fn is_complete(&self) -> bool {
        match self.mode {
            RelayMode::Http => self.base_url.is_some(),
            RelayMode::Subprocess => self.program.is_some(),
            #[cfg(any(test, feature = "test-support"))]
            RelayMode::Mock => true,
        }
    }
}

/// Relay service trait for different transports
#[async_trait::async_trait]
pub trait RelayService: Send + Sync {
    /// Forward one query and classify the result. Never panics or errors.
    async fn send(&self, query: &str) -> RelayOutcome;

    /// Transport this relay uses
    fn mode(&self) -> RelayMode;
}

/// Relay service factory
pub struct RelayServiceFactory;

impl RelayServiceFactory {
    /// Create the relay selected by `config.mode`
    pub fn create(config: RelayConfig) -> Result<Box<dyn RelayService>, RelayError> {
        if !config.is_complete() {
            tracing::warn!(
                mode = %config.mode,
                "Answer service address is not configured; every query will fail as misconfigured"
            );
        }

        match config.mode {
            RelayMode::Http => {
                tracing::info!(base_url = ?config.base_url, "Creating HTTP relay");
                Ok(Box::new(http::HttpRelay::new(
                    config.base_url,
                    config.timeout,
                )?))
            }
            RelayMode::Subprocess => {
                tracing::info!(program = ?config.program, "Creating subprocess relay");
                Ok(Box::new(subprocess::SubprocessRelay::new(config)))
            }
            #[cfg(any(test, feature = "test-support"))]
            RelayMode::Mock => {
                tracing::info!("Creating mock relay");
                Ok(Box::new(mock::MockRelay::new()))
            }
        }
    }
}

//! Subprocess relay
//!
//! Runs the answer program once per query:
//! `[interpreter] <program> --query <text> [--index <path>]`.
//! The program prints its reply as one JSON line on stdout; earlier stdout
//! lines (progress chatter) are ignored. Stderr and paths are logged through
//! the failure `detail`, never returned in the `reason`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::{
    classify, preview, FailureKind, RelayConfig, RelayMode, RelayOutcome, RelayService,
};

/// Subprocess relay implementation
#[derive(Debug, Clone)]
pub struct SubprocessRelay {
    program: Option<PathBuf>,
    interpreter: Option<String>,
    working_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    timeout: Duration,
}

impl SubprocessRelay {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            program: config.program.filter(|p| !p.as_os_str().is_empty()),
            interpreter: config.interpreter.filter(|i| !i.trim().is_empty()),
            working_dir: config.working_dir,
            index_path: config.index_path,
            timeout: config.timeout,
        }
    }

    fn command(&self, program: &Path, query: &str) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(program);
                cmd
            }
            None => Command::new(program),
        };

        cmd.arg("--query").arg(query);
        if let Some(index) = &self.index_path {
            cmd.arg("--index").arg(index);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// With an interpreter the program is a script path; check it exists
    /// so a typo surfaces as misconfiguration rather than a remote error.
    fn missing_script(&self, program: &Path) -> Option<PathBuf> {
        self.interpreter.as_ref()?;
        let resolved = match &self.working_dir {
            Some(dir) => dir.join(program),
            None => program.to_path_buf(),
        };
        (!resolved.exists()).then_some(resolved)
    }
}

#[async_trait::async_trait]
impl RelayService for SubprocessRelay {
    async fn send(&self, query: &str) -> RelayOutcome {
        let Some(program) = &self.program else {
            tracing::warn!("Subprocess relay has no program configured, skipping call");
            return RelayOutcome::failure(FailureKind::ServiceMisconfigured, "not configured")
                .with_detail("answer program is not configured");
        };

        if let Some(path) = self.missing_script(program) {
            return RelayOutcome::failure(FailureKind::ServiceMisconfigured, "program not found")
                .with_detail(format!("answer script {} does not exist", path.display()));
        }

        tracing::debug!(program = %program.display(), query = %preview(query), "Running answer program");

        let output = match timeout(self.timeout, self.command(program, query).output()).await {
            Err(_) => {
                return RelayOutcome::failure(
                    FailureKind::Unreachable,
                    format!("no reply within {}s", self.timeout.as_secs_f32()),
                )
            }
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                return RelayOutcome::failure(FailureKind::ServiceMisconfigured, "program not found")
                    .with_detail(format!(
                        "cannot start answer program {}: {}",
                        program.display(),
                        e
                    ))
            }
            Ok(Err(e)) => {
                return RelayOutcome::failure(FailureKind::Internal, "program could not run")
                    .with_detail(format!("failed to run answer program: {}", e))
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply_line = stdout.lines().map(str::trim).rfind(|l| !l.is_empty());

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = preview(stderr.trim());

            // An error payload on the way out is a reply; anything else is a crash
            let reported = reply_line
                .and_then(|line| serde_json::from_str::<serde_json::Value>(line).ok())
                .filter(|value| classify::error_field(value).is_some());
            if let Some(value) = reported {
                return classify::classify_value(&value);
            }

            let reason = match output.status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            };
            return RelayOutcome::failure(FailureKind::Unreachable, reason.as_str())
                .with_detail(format!("answer program {}: {}", reason, stderr));
        }

        match reply_line {
            Some(line) => classify::classify_body(line),
            None => RelayOutcome::failure(
                FailureKind::InvalidResponse,
                "answer program produced no output",
            ),
        }
    }

    fn mode(&self) -> RelayMode {
        RelayMode::Subprocess
    }
}

//! Execution Dispatcher
//!
//! Resolves the executor for a submission's language, materializes the
//! source in a scratch workspace and runs it as a child process, bounded by
//! a timeout. Output streams are drained concurrently into capped buffers so
//! that partial output survives a kill.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use code_insight_core::CodeSubmission;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ExecutionError, ExecutionResult, FailureReason};
use crate::memory::sample_process_memory;
use crate::models::ExecutionOutcome;
use crate::registry::ExecutorRegistry;
use crate::workspace::Workspace;

const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// How waiting on a child ended
enum Wait {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Wall-clock limit for one child process
    pub timeout: Duration,
    /// Maximum bytes kept per output stream
    pub max_output_bytes: usize,
    /// How long to wait for pipe readers after the child exits or is killed
    pub drain_grace: Duration,
    /// Parent of scratch workspaces; system temp dir when unset
    pub scratch_root: Option<PathBuf>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_output_bytes: 1024 * 1024, // 1MB
            drain_grace: Duration::from_millis(500),
            scratch_root: None,
        }
    }
}

/// Bytes captured from one stream, capped
#[derive(Debug)]
struct CapturedStream {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl CapturedStream {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    fn take_text(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.bytes);
        if self.truncated {
            bytes.truncate(complete_prefix_len(&bytes));
        }
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        if self.truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

/// Length of `bytes` without a multi-byte UTF-8 sequence cut off at the end
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    // A sequence is at most 4 bytes: look back past up to 3 continuation bytes
    let Some(lead) = (1..=len.min(4))
        .map(|back| len - back)
        .find(|&i| bytes[i] & 0b1100_0000 != 0b1000_0000)
    else {
        return len;
    };
    let expected = match bytes[lead] {
        b if b >= 0b1111_0000 => 4,
        b if b >= 0b1110_0000 => 3,
        b if b >= 0b1100_0000 => 2,
        _ => 1,
    };
    if lead + expected > len {
        lead
    } else {
        len
    }
}

type SharedStream = Arc<Mutex<CapturedStream>>;

/// Read a pipe to EOF, keeping at most the stream's limit. Keeps reading past
/// the limit so the child never blocks on a full pipe.
fn spawn_reader<R>(pipe: Option<R>, sink: SharedStream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let mut stream = sink.lock().unwrap_or_else(|e| e.into_inner());
                    stream.push(&buf[..n]);
                }
                Err(e) => {
                    debug!(error = %e, "output pipe read failed");
                    break;
                }
            }
        }
    })
}

fn take_text(stream: &SharedStream) -> String {
    stream.lock().unwrap_or_else(|e| e.into_inner()).take_text()
}

/// Runs submissions as child processes
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ExecutorRegistry,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: ExecutorRegistry, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run one submission.
    ///
    /// Fails with `UnsupportedLanguage` before anything touches the
    /// filesystem when no executor is registered. Spawn failures, non-zero
    /// exits, timeouts and cancellation of a running child come back as
    /// `Failure` carrying the captured output. A token cancelled before the
    /// spawn gives `Cancelled` with nothing started. The scratch workspace is
    /// gone by the time this returns.
    pub async fn execute(
        &self,
        submission: &CodeSubmission,
        cancel: &CancellationToken,
    ) -> ExecutionResult<ExecutionOutcome> {
        let language = submission.language();
        let executable = self
            .registry
            .resolve(language)
            .ok_or(ExecutionError::UnsupportedLanguage(language))?;

        if cancel.is_cancelled() {
            debug!(file = %submission.filename(), "execution skipped, already cancelled");
            return Err(ExecutionError::Cancelled);
        }

        let workspace = match &self.config.scratch_root {
            Some(root) => {
                Workspace::create_in(root, submission.filename(), language, submission.code())
                    .await?
            }
            None => Workspace::create(submission.filename(), language, submission.code()).await?,
        };

        info!(
            file = %submission.filename(),
            language = %language,
            executable,
            "dispatching submission"
        );

        let mut cmd = Command::new(executable);
        cmd.arg(workspace.source_path())
            .current_dir(workspace.path())
            .envs(submission.environment())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(executable, error = %e, "failed to spawn executor");
                let outcome = ExecutionOutcome {
                    combined_output: format!("Failed to start {}: {}", executable, e),
                    execution_time_seconds: start.elapsed().as_secs_f64(),
                    memory_usage_bytes: sample_process_memory(),
                    exit_code: None,
                    timed_out: false,
                };
                return Err(ExecutionError::failure(
                    FailureReason::SpawnFailed(e.to_string()),
                    outcome,
                ));
            }
        };

        let stdout: SharedStream = Arc::new(Mutex::new(CapturedStream::new(
            self.config.max_output_bytes,
        )));
        let stderr: SharedStream = Arc::new(Mutex::new(CapturedStream::new(
            self.config.max_output_bytes,
        )));
        let readers = [
            spawn_reader(child.stdout.take(), Arc::clone(&stdout)),
            spawn_reader(child.stderr.take(), Arc::clone(&stderr)),
        ];

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => Wait::Cancelled,
            waited = timeout(self.config.timeout, child.wait()) => match waited {
                Ok(status) => Wait::Exited(status),
                Err(_) => Wait::TimedOut,
            },
        };
        let elapsed = start.elapsed();

        let exit_code = match &waited {
            Wait::Exited(Ok(status)) => status.code(),
            _ => None,
        };
        let failure = match waited {
            Wait::Exited(Ok(status)) if status.success() => None,
            Wait::Exited(Ok(status)) => Some(FailureReason::NonZeroExit(status.code())),
            Wait::Exited(Err(e)) => {
                if let Err(kill_err) = child.kill().await {
                    debug!(error = %kill_err, "kill after failed wait failed");
                }
                Some(FailureReason::SpawnFailed(format!("wait failed: {}", e)))
            }
            Wait::TimedOut => {
                warn!(
                    file = %submission.filename(),
                    limit_secs = self.config.timeout.as_secs(),
                    "execution timed out, killing child"
                );
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "kill after timeout failed");
                }
                Some(FailureReason::TimedOut(self.config.timeout))
            }
            Wait::Cancelled => {
                info!(file = %submission.filename(), "execution cancelled, killing child");
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "kill after cancellation failed");
                }
                Some(FailureReason::Cancelled)
            }
        };

        self.drain(readers).await;

        let outcome = ExecutionOutcome {
            combined_output: ExecutionOutcome::select_output(take_text(&stdout), take_text(&stderr)),
            execution_time_seconds: elapsed.as_secs_f64(),
            memory_usage_bytes: sample_process_memory(),
            exit_code,
            timed_out: matches!(failure, Some(FailureReason::TimedOut(_))),
        };

        debug!(
            file = %submission.filename(),
            elapsed_ms = elapsed.as_millis() as u64,
            output_len = outcome.combined_output.len(),
            exit_code = ?outcome.exit_code,
            "execution finished"
        );

        drop(workspace);

        match failure {
            None => Ok(outcome),
            Some(reason) => Err(ExecutionError::failure(reason, outcome)),
        }
    }

    /// Give pipe readers a bounded time to reach EOF. A grandchild holding
    /// the pipe open must not stall the dispatcher.
    async fn drain(&self, readers: [JoinHandle<()>; 2]) {
        for mut reader in readers {
            if timeout(self.config.drain_grace, &mut reader).await.is_err() {
                reader.abort();
            }
        }
    }
}

//! Run the external model-checking engine.
//!
//! The engine is an opaque program that receives an argument vector and
//! writes its result to stdout. [`EngineGateway`] launches it, enforces the
//! wall-clock ceiling, and turns the output into a single payload string.

use std::{
    borrow::Cow,
    ffi::OsString,
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, error, warn};

use crate::{dispatch::InvocationDescriptor, error::StructuredError};

/// Something that can evaluate an engine invocation.
///
/// The HTTP layer depends on this trait rather than on [`EngineGateway`] so
/// it can be exercised without spawning processes.
#[async_trait]
pub trait Compute: Send + Sync {
    /// Run `invocation` and return the engine payload.
    ///
    /// # Errors
    ///
    /// Returns [`StructuredError::Compute`] when the engine fails and
    /// [`StructuredError::MaxExecutionTimeExceeded`] when it runs too long.
    async fn compute(&self, invocation: InvocationDescriptor) -> Result<String, StructuredError>;
}

/// Convert a configured number of seconds into an execution ceiling.
///
/// Zero means the engine may run indefinitely.
#[must_use]
pub const fn max_execution_time_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Launches the engine as a child process.
#[derive(Clone, Debug)]
pub struct EngineGateway {
    program: OsString,
    leading_args: Vec<OsString>,
    max_execution_time: Option<Duration>,
}

impl EngineGateway {
    /// Gateway running `program` with no ceiling and no leading arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            max_execution_time: None,
        }
    }

    /// Add an argument placed before every engine argument vector, such as
    /// the engine script passed to an interpreter.
    #[must_use]
    pub fn with_leading_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Set the wall-clock ceiling; `None` disables it.
    #[must_use]
    pub const fn with_max_execution_time(mut self, max: Option<Duration>) -> Self {
        self.max_execution_time = max;
        self
    }

    /// The configured wall-clock ceiling.
    #[must_use]
    pub const fn max_execution_time(&self) -> Option<Duration> { self.max_execution_time }

    /// Run the engine with `argv` and return its normalized output.
    ///
    /// # Errors
    ///
    /// See [`Compute::compute`].
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! macro usage"
    )]
    pub async fn run(&self, argv: &[String]) -> Result<String, StructuredError> {
        debug!(program = ?self.program, ?argv, "launching engine");
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                error!(program = ?self.program, error = %err, "failed to launch engine");
                StructuredError::compute(format!("failed to launch engine: {err}"))
            })?;

        let mut stdout = spawn_reader(child.stdout.take());
        let mut stderr = spawn_reader(child.stderr.take());

        // The deadline covers draining the pipes too: a detached descendant
        // can hold stdout open after the engine itself has exited.
        let deadline = self.max_execution_time;
        let finished = tokio::select! {
            outcome = finish(&mut child, &mut stdout, &mut stderr) => outcome?,
            () = expire(deadline) => {
                if let Err(err) = child.kill().await {
                    debug!(error = %err, "engine already exited at timeout");
                }
                stdout.abort();
                stderr.abort();
                warn!(?deadline, "engine exceeded maximum execution time");
                return Err(StructuredError::MaxExecutionTimeExceeded);
            }
        };

        let Finished {
            status,
            stdout: output,
            stderr: diagnostics,
        } = finished;
        if !status.success() {
            let stderr_text = decode_output(&diagnostics, "stderr");
            let message = last_line(&stderr_text)
                .map_or_else(|| format!("engine exited with {status}"), str::to_owned);
            warn!(%status, %message, "engine failed");
            return Err(StructuredError::compute(message));
        }
        debug!(elapsed_ms = started.elapsed().as_millis(), "engine finished");
        normalize_output(&decode_output(&output, "stdout"))
    }
}

#[async_trait]
impl Compute for EngineGateway {
    async fn compute(&self, invocation: InvocationDescriptor) -> Result<String, StructuredError> {
        self.run(&invocation.into_argv()).await
    }
}

async fn expire(deadline: Option<Duration>) {
    match deadline {
        Some(duration) => sleep(duration).await,
        None => std::future::pending().await,
    }
}

type Reader = JoinHandle<std::io::Result<Vec<u8>>>;

struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn spawn_reader<R>(pipe: Option<R>) -> Reader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut stream) = pipe {
            stream.read_to_end(&mut buffer).await?;
        }
        Ok(buffer)
    })
}

/// Wait for the engine to exit and for both pipes to close.
async fn finish(
    child: &mut Child,
    stdout: &mut Reader,
    stderr: &mut Reader,
) -> Result<Finished, StructuredError> {
    let status = child
        .wait()
        .await
        .map_err(|err| StructuredError::compute(format!("failed waiting for engine: {err}")))?;
    let output = collect(stdout).await?;
    let diagnostics = collect(stderr).await.unwrap_or_default();
    Ok(Finished {
        status,
        stdout: output,
        stderr: diagnostics,
    })
}

async fn collect(reader: &mut Reader) -> Result<Vec<u8>, StructuredError> {
    reader
        .await
        .map_err(|err| StructuredError::compute(format!("failed joining engine reader: {err}")))?
        .map_err(|err| StructuredError::compute(format!("failed reading engine output: {err}")))
}

/// Decode engine output, replacing invalid UTF-8 and logging when it does.
fn decode_output(bytes: &[u8], stream: &'static str) -> String {
    let text = String::from_utf8_lossy(bytes);
    if matches!(text, Cow::Owned(_)) {
        warn!(stream, len = bytes.len(), "engine output is not valid UTF-8");
    }
    text.into_owned()
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|line| !line.is_empty())
}

/// Collapse engine stdout into the payload returned to callers.
///
/// Trailing blank lines are dropped. A single remaining line is returned as
/// is; several lines are returned as a JSON array of strings.
///
/// # Errors
///
/// Returns [`StructuredError::Compute`] when the engine printed nothing.
pub fn normalize_output(stdout: &str) -> Result<String, StructuredError> {
    let mut lines: Vec<&str> = stdout.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    match lines.as_slice() {
        [] => Err(StructuredError::compute("no response")),
        [line] => Ok((*line).to_owned()),
        many => serde_json::to_string(many)
            .map_err(|err| StructuredError::compute(format!("failed to encode engine output: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("{\"ok\":true}\n", "{\"ok\":true}")]
    #[case("result\n\n\n", "result")]
    #[case("a\nb\n", "[\"a\",\"b\"]")]
    #[case("a\n\nb\n", "[\"a\",\"\",\"b\"]")]
    fn output_is_normalized(#[case] stdout: &str, #[case] expected: &str) {
        assert_eq!(normalize_output(stdout).expect("payload"), expected);
    }

    #[rstest]
    #[case("")]
    #[case("\n\n")]
    fn silent_engine_reports_no_response(#[case] stdout: &str) {
        assert_eq!(
            normalize_output(stdout),
            Err(StructuredError::compute("no response"))
        );
    }

    #[rstest]
    fn valid_output_is_decoded_unchanged() {
        assert_eq!(decode_output("żółw\n".as_bytes(), "stdout"), "żółw\n");
    }

    #[rstest]
    fn invalid_output_is_replaced() {
        assert_eq!(decode_output(b"ok\xff\n", "stdout"), "ok\u{fffd}\n");
    }

    #[rstest]
    fn last_stderr_line_is_the_message() {
        assert_eq!(last_line("Traceback\n  boom\nValueError: bad\n\n"), Some("ValueError: bad"));
        assert_eq!(last_line("\n"), None);
    }

    #[rstest]
    #[case(0, None)]
    #[case(3, Some(Duration::from_secs(3)))]
    fn zero_seconds_disables_ceiling(#[case] secs: u64, #[case] expected: Option<Duration>) {
        assert_eq!(max_execution_time_from_secs(secs), expected);
    }

    #[rstest]
    fn builder_keeps_leading_args_in_order() {
        let gateway = EngineGateway::new("python3")
            .with_leading_arg("gui.py")
            .with_max_execution_time(Some(Duration::from_secs(1)));
        assert_eq!(gateway.leading_args, [OsString::from("gui.py")]);
        assert_eq!(gateway.max_execution_time(), Some(Duration::from_secs(1)));
    }
}

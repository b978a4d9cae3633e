//! # Build Command Module / 构建命令模块
//!
//! Runs a project's connected-instrumentation-test command. Only the exit code
//! matters; the output is either streamed to the terminal or captured for
//! display when the build fails.
//!
//! 运行项目的连接设备插桩测试命令。只有退出码有意义；
//! 输出要么直接输出到终端，要么被捕获以便在构建失败时显示。

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::core::error::{BatchError, BatchResult};

/// What one run of the build command produced.
/// 构建命令一次运行的产物。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, when captured.
    pub output: Option<String>,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The last `count` lines of the captured output.
    pub fn output_tail(&self, count: usize) -> Option<String> {
        let output = self.output.as_deref()?;
        let lines: Vec<&str> = output.lines().collect();
        let start = lines.len().saturating_sub(count);
        Some(lines[start..].join("\n"))
    }
}

/// Runs the connected instrumentation tests of one project.
/// 运行一个项目的连接设备插桩测试。
#[allow(async_fn_in_trait)]
pub trait BuildTool {
    /// Human-readable command line, for messages.
    fn describe(&self) -> String;

    /// Runs the tests with `project_dir` as working directory.
    ///
    /// # Errors
    /// `BatchError::BuildInvocation` when the process cannot be started. A
    /// non-zero exit code is returned as a normal outcome.
    async fn run_tests(&self, project_dir: &Path) -> BatchResult<BuildOutcome>;
}

/// The project's own Gradle wrapper, or any command configured in its place.
/// 项目自带的 Gradle wrapper，或配置的任意替代命令。
#[derive(Debug, Clone)]
pub struct GradleWrapper {
    program: String,
    args: Vec<String>,
    capture_output: bool,
}

impl GradleWrapper {
    /// # Arguments
    /// * `parts` - Program followed by its arguments, already split
    /// * `capture_output` - Capture output instead of inheriting the terminal
    pub fn new(parts: Vec<String>, capture_output: bool) -> BatchResult<Self> {
        let mut parts = parts.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| BatchError::Configuration("build command is empty".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            capture_output,
        })
    }

    /// Resolves a relative program path containing a separator against the
    /// project directory. Bare names are left for `PATH` lookup.
    ///
    /// 将包含分隔符的相对程序路径相对于项目目录解析。裸命令名留给 `PATH` 查找。
    pub fn program_path(&self, project_dir: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        let has_separator = self.program.contains('/') || self.program.contains('\\');
        if has_separator && program.is_relative() {
            project_dir.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

impl BuildTool for GradleWrapper {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run_tests(&self, project_dir: &Path) -> BatchResult<BuildOutcome> {
        let program = self.program_path(project_dir);
        let invocation_error = |source: std::io::Error| BatchError::BuildInvocation {
            command: self.describe(),
            source,
        };

        if program.is_absolute() && !program.exists() {
            return Err(invocation_error(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", program.display()),
            )));
        }

        info!(project = %project_dir.display(), command = %self.describe(), "running build");
        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&self.args).current_dir(project_dir).kill_on_drop(true);

        let outcome = if self.capture_output {
            let (status, output) = spawn_and_capture(cmd).await;
            let status = status.map_err(invocation_error)?;
            BuildOutcome {
                exit_code: status.code(),
                output: Some(output),
            }
        } else {
            let status = cmd.status().await.map_err(invocation_error)?;
            BuildOutcome {
                exit_code: status.code(),
                output: None,
            }
        };
        debug!(exit_code = ?outcome.exit_code, "build finished");
        Ok(outcome)
    }
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<std::process::ExitStatus>, String) {
    let mut child = match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other("failed to capture build output")),
            String::new(),
        );
    };

    let output = Arc::new(tokio::sync::Mutex::new(String::new()));

    let stdout_output = Arc::clone(&output);
    let stdout_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stdout_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let stderr_output = Arc::clone(&output);
    let stderr_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stderr_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let status = child.wait().await;

    // Drain both readers so no trailing output is lost.
    if let Err(e) = stdout_handle.await {
        debug!("failed to join stdout task: {e}");
    }
    if let Err(e) = stderr_handle.await {
        debug!("failed to join stderr task: {e}");
    }

    let captured = output.lock().await.clone();
    (status, captured)
}

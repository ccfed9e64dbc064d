//! Subprocess execution behind a trait so the solver can be faked in tests.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// What a finished solver process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when killed by a signal
    pub status: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs the solver executable to completion.
///
/// Implementations must stop the process when the returned future is
/// dropped; the invoker enforces its timeout that way.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, executable: &Path, working_dir: &Path) -> std::io::Result<ProcessOutput>;
}

/// Runs the real solver binary with tokio.
#[derive(Debug, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, executable: &Path, working_dir: &Path) -> std::io::Result<ProcessOutput> {
        let output = Command::new(executable)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ProcessOutput {
            status: output.status.code(),
            output: combined,
        })
    }
}

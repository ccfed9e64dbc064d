//! Runs the external path optimizer against an input document on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gcom_core::{SolverInput, SolverOutput};

use super::runner::ProcessRunner;
use crate::errors::PlanError;

/// Where the solver lives and which files it exchanges.
#[derive(Debug, Clone)]
pub struct SolverLayout {
    /// Installation directory; the solver runs with this as its working directory
    pub dir: PathBuf,
    pub executable: String,
    pub input_file: String,
    pub output_file: String,
}

impl SolverLayout {
    pub fn executable_path(&self) -> PathBuf {
        self.dir.join(&self.executable)
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(&self.output_file)
    }
}

/// Writes solver input, runs the solver and reads back its output.
pub struct SolverInvoker {
    layout: SolverLayout,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl SolverInvoker {
    pub fn new(layout: SolverLayout, runner: Arc<dyn ProcessRunner>, timeout: Duration) -> Self {
        Self {
            layout,
            runner,
            timeout,
        }
    }

    /// Write `input` as pretty-printed JSON to the input artifact.
    pub async fn write_input(&self, input: &SolverInput) -> Result<PathBuf, PlanError> {
        let path = self.layout.input_path();
        let encoded = serde_json::to_vec_pretty(input).map_err(PlanError::Encode)?;

        tokio::fs::create_dir_all(&self.layout.dir)
            .await
            .map_err(|source| io_error(&self.layout.dir, source))?;
        tokio::fs::write(&path, encoded)
            .await
            .map_err(|source| io_error(&path, source))?;

        tracing::debug!(
            "Wrote solver input ({} waypoints, {} routes) to {}",
            input.num_waypoints,
            input.num_routes,
            path.display()
        );
        Ok(path)
    }

    /// Run the solver and return the path of the output artifact.
    ///
    /// The input artifact must already exist. A zero exit status is not
    /// trusted on its own: the output artifact has to exist afterwards.
    pub async fn invoke(&self) -> Result<PathBuf, PlanError> {
        let input_path = self.layout.input_path();
        if !exists(&input_path).await {
            tracing::error!("Solver input {} is missing", input_path.display());
            return Err(PlanError::Precondition { path: input_path });
        }

        let output_path = self.layout.output_path();
        remove_stale_output(&output_path).await?;

        let executable = std::path::absolute(self.layout.executable_path()).map_err(|source| {
            PlanError::Launch {
                path: self.layout.executable_path(),
                source,
            }
        })?;

        tracing::info!("Running solver {}", executable.display());
        let started = std::time::Instant::now();

        let run = self.runner.run(&executable, &self.layout.dir);
        let result = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(result)) => result,
            Ok(Err(source)) => {
                tracing::error!("Failed to launch solver {}: {}", executable.display(), source);
                return Err(PlanError::Launch {
                    path: executable,
                    source,
                });
            }
            Err(_) => {
                tracing::error!("Solver timed out after {:?}, killed", self.timeout);
                return Err(PlanError::Timeout {
                    after: self.timeout,
                });
            }
        };

        tracing::debug!("Solver output: {}", result.output.trim_end());

        if !result.success() {
            tracing::error!("Solver exited with {:?}", result.status);
            return Err(PlanError::Process {
                status: result.status,
                output: result.output,
            });
        }

        if !exists(&output_path).await {
            tracing::error!(
                "Solver reported success but {} was not written",
                output_path.display()
            );
            return Err(PlanError::Postcondition { path: output_path });
        }

        tracing::info!("Solver finished in {:?}", started.elapsed());
        Ok(output_path)
    }

    /// Parse the output artifact.
    pub async fn read_output(&self) -> Result<SolverOutput, PlanError> {
        let path = self.layout.output_path();
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| io_error(&path, source))?;

        serde_json::from_slice(&raw).map_err(|err| {
            tracing::error!("Malformed solver output in {}: {}", path.display(), err);
            PlanError::Parse(err)
        })
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn remove_stale_output(path: &Path) -> Result<(), PlanError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed stale solver output {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(io_error(path, source)),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PlanError {
    tracing::error!("I/O error on {}: {}", path.display(), source);
    PlanError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::runner::ProcessOutput;
    use async_trait::async_trait;
    use gcom_core::{ReRouter, RouteFinder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake solver: records calls and optionally writes a canned output.
    struct FakeRunner {
        calls: AtomicUsize,
        status: Option<i32>,
        output_file: Option<(String, String)>,
        delay: Duration,
    }

    impl FakeRunner {
        fn writing(file: &str, body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                status: Some(0),
                output_file: Some((file.to_string(), body.to_string())),
                delay: Duration::ZERO,
            }
        }

        fn silent(status: Option<i32>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                status,
                output_file: None,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ProcessRunner for FakeRunner {
        async fn run(&self, _executable: &Path, working_dir: &Path) -> std::io::Result<ProcessOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if let Some((file, body)) = &self.output_file {
                tokio::fs::write(working_dir.join(file), body).await?;
            }
            Ok(ProcessOutput {
                status: self.status,
                output: "fake solver".to_string(),
            })
        }
    }

    fn layout(dir: &Path) -> SolverLayout {
        SolverLayout {
            dir: dir.to_path_buf(),
            executable: "pathfinding".to_string(),
            input_file: "input.json".to_string(),
            output_file: "output.json".to_string(),
        }
    }

    fn empty_input() -> SolverInput {
        SolverInput {
            num_waypoints: 0,
            num_routes: 0,
            waypoints: Vec::new(),
            routes: Vec::new(),
            route_finder: RouteFinder::default(),
            re_router: ReRouter::default(),
            aeac_routes: Vec::new(),
        }
    }

    fn invoker(dir: &Path, runner: Arc<FakeRunner>) -> SolverInvoker {
        SolverInvoker::new(layout(dir), runner, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn missing_input_never_runs_solver() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::writing("output.json", r#"{"Routes": []}"#));

        let err = invoker(dir.path(), runner.clone()).invoke().await.unwrap_err();

        assert!(matches!(err, PlanError::Precondition { .. }));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_run_yields_parsed_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::writing("output.json", r#"{"Routes": [3, 1, 2]}"#));
        let invoker = invoker(dir.path(), runner.clone());

        let input_path = invoker.write_input(&empty_input()).await.unwrap();
        let written = std::fs::read_to_string(&input_path).unwrap();
        assert!(written.contains("\n  \"numWaypoints\": 0"));

        let output_path = invoker.invoke().await.unwrap();
        assert_eq!(output_path, dir.path().join("output.json"));
        assert_eq!(invoker.read_output().await.unwrap().routes, vec![3, 1, 2]);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_exit_without_output_is_postcondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = invoker(dir.path(), Arc::new(FakeRunner::silent(Some(0))));
        invoker.write_input(&empty_input()).await.unwrap();

        let err = invoker.invoke().await.unwrap_err();
        assert!(matches!(err, PlanError::Postcondition { .. }));
    }

    #[tokio::test]
    async fn stale_output_does_not_satisfy_postcondition() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("output.json"), r#"{"Routes": [9]}"#).unwrap();
        let invoker = invoker(dir.path(), Arc::new(FakeRunner::silent(Some(0))));
        invoker.write_input(&empty_input()).await.unwrap();

        let err = invoker.invoke().await.unwrap_err();
        assert!(matches!(err, PlanError::Postcondition { .. }));
        assert!(!dir.path().join("output.json").exists());
    }

    #[tokio::test]
    async fn non_zero_exit_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = invoker(dir.path(), Arc::new(FakeRunner::silent(Some(1))));
        invoker.write_input(&empty_input()).await.unwrap();

        match invoker.invoke().await.unwrap_err() {
            PlanError::Process { status, output } => {
                assert_eq!(status, Some(1));
                assert_eq!(output, "fake solver");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_solver_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            delay: Duration::from_secs(30),
            ..FakeRunner::writing("output.json", r#"{"Routes": []}"#)
        });
        let invoker = SolverInvoker::new(layout(dir.path()), runner, Duration::from_millis(50));
        invoker.write_input(&empty_input()).await.unwrap();

        let err = invoker.invoke().await.unwrap_err();
        assert!(matches!(err, PlanError::Timeout { .. }));
        assert!(!dir.path().join("output.json").exists());
    }

    #[tokio::test]
    async fn malformed_output_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = invoker(
            dir.path(),
            Arc::new(FakeRunner::writing("output.json", r#"{"Routes": "nope"}"#)),
        );
        invoker.write_input(&empty_input()).await.unwrap();
        invoker.invoke().await.unwrap();

        assert!(matches!(
            invoker.read_output().await.unwrap_err(),
            PlanError::Parse(_)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn real_process_runner_contract() {
        use crate::solver::runner::TokioProcessRunner;
        use std::os::unix::fs::PermissionsExt;

        async fn run_script(script: &str, timeout: Duration) -> (tempfile::TempDir, Result<PathBuf, PlanError>) {
            let dir = tempfile::tempdir().unwrap();
            let executable = dir.path().join("pathfinding");
            std::fs::write(&executable, script).unwrap();
            std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755)).unwrap();

            let invoker = SolverInvoker::new(
                layout(dir.path()),
                Arc::new(TokioProcessRunner),
                timeout,
            );
            invoker.write_input(&empty_input()).await.unwrap();
            let result = invoker.invoke().await;
            (dir, result)
        }

        // Runs in the solver directory and reads the input it was given
        let (dir, result) = run_script(
            "#!/bin/sh\ntest -f input.json || exit 4\necho '{\"Routes\": [1]}' > output.json\n",
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(result.unwrap(), dir.path().join("output.json"));

        let (_dir, result) = run_script("#!/bin/sh\necho boom >&2\nexit 3\n", Duration::from_secs(10)).await;
        match result.unwrap_err() {
            PlanError::Process { status, output } => {
                assert_eq!(status, Some(3));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let (_dir, result) = run_script("#!/bin/sh\nsleep 30\n", Duration::from_millis(200)).await;
        assert!(matches!(result.unwrap_err(), PlanError::Timeout { .. }));
    }
}

/// Benchmark run phase: for each evaluation, configured method, and run
/// index, reset the environment, spawn the agent subprocess once, tee
/// its stdout to both the console and a JSONL sink file, and wait for
/// exit before starting the next run. Strictly sequential.
use crate::config::{AgentConfig, BenchConfig};
use crate::hooks::{run_hooks, HookError};
use crate::method::{Method, DEFAULT_EVALUATION};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Result of one completed benchmark run.
#[derive(Debug)]
pub struct RunOutcome {
    pub evaluation: String,
    pub method: Method,
    pub run_index: u32,
    /// Process exit code (None if killed by signal).
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Path to the JSONL sink file.
    pub output_file: PathBuf,
}

/// Errors from the run phase.
#[derive(Debug)]
pub enum RunnerError {
    /// No `[methods.<key>]` tables are configured.
    NoMethods,
    /// Failed to create the results directory.
    ResultsDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read an evaluation's prompt file.
    Prompt {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a sink file.
    Sink {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to spawn the agent subprocess.
    Spawn {
        command: String,
        source: std::io::Error,
    },
    /// Failed to stream from child stdout or write the sink.
    Io { source: std::io::Error },
    Hook(HookError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::NoMethods => {
                write!(f, "no methods configured; add a [methods.<key>] table")
            }
            RunnerError::ResultsDir { path, source } => {
                write!(
                    f,
                    "failed to create results directory {}: {}",
                    path.display(),
                    source
                )
            }
            RunnerError::Prompt { path, source } => {
                write!(
                    f,
                    "failed to read prompt file {}: {}",
                    path.display(),
                    source
                )
            }
            RunnerError::Sink { path, source } => {
                write!(f, "failed to create sink file {}: {}", path.display(), source)
            }
            RunnerError::Spawn { command, source } => {
                write!(f, "failed to spawn `{command}`: {source}")
            }
            RunnerError::Io { source } => write!(f, "I/O error during run: {source}"),
            RunnerError::Hook(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::ResultsDir { source, .. } => Some(source),
            RunnerError::Prompt { source, .. } => Some(source),
            RunnerError::Sink { source, .. } => Some(source),
            RunnerError::Spawn { source, .. } => Some(source),
            RunnerError::Io { source } => Some(source),
            RunnerError::Hook(e) => Some(e),
            RunnerError::NoMethods => None,
        }
    }
}

impl From<HookError> for RunnerError {
    fn from(e: HookError) -> Self {
        RunnerError::Hook(e)
    }
}

/// Sink filename for one run: `<evaluation>-<key>-run<N>.jsonl`, with
/// the evaluation prefix omitted for the default evaluation. The
/// classifier in `method` decodes this exact layout.
pub fn sink_file_name(evaluation: &str, method: Method, run_index: u32) -> String {
    if evaluation == DEFAULT_EVALUATION {
        format!("{}-run{}.jsonl", method.key(), run_index)
    } else {
        format!("{}-{}-run{}.jsonl", evaluation, method.key(), run_index)
    }
}

/// Build the command arguments, replacing `{prompt}` placeholders with
/// the actual prompt content.
fn build_args(agent: &AgentConfig, prompt: &str) -> Vec<String> {
    agent
        .args
        .iter()
        .map(|arg| arg.replace("{prompt}", prompt))
        .collect()
}

/// Execute every configured run, one subprocess at a time.
///
/// Methods run in canonical registry order; only methods with a
/// `[methods.<key>]` table are executed. A non-zero agent exit is
/// logged but not fatal: the report phase judges the artifacts.
pub async fn run_all(config: &BenchConfig) -> Result<Vec<RunOutcome>, RunnerError> {
    let methods: Vec<(Method, &AgentConfig)> = Method::ALL
        .iter()
        .filter_map(|m| config.methods.get(m.key()).map(|agent| (*m, agent)))
        .collect();
    if methods.is_empty() {
        return Err(RunnerError::NoMethods);
    }

    std::fs::create_dir_all(&config.bench.results_dir).map_err(|e| RunnerError::ResultsDir {
        path: config.bench.results_dir.clone(),
        source: e,
    })?;

    let mut outcomes = Vec::new();
    for eval in &config.evaluations {
        let prompt =
            std::fs::read_to_string(&eval.prompt_file).map_err(|e| RunnerError::Prompt {
                path: eval.prompt_file.clone(),
                source: e,
            })?;

        for (method, agent) in &methods {
            for run_index in 1..=config.bench.runs {
                run_hooks(&config.hooks.pre_run).await?;

                let sink = config
                    .bench
                    .results_dir
                    .join(sink_file_name(&eval.name, *method, run_index));
                tracing::info!(
                    evaluation = %eval.name,
                    method = method.key(),
                    run_index,
                    sink = %sink.display(),
                    "starting benchmark run"
                );

                let (exit_code, duration) = run_once(agent, &prompt, &sink).await?;
                match exit_code {
                    Some(0) => tracing::info!(
                        method = method.key(),
                        run_index,
                        duration_secs = duration.as_secs(),
                        "run completed"
                    ),
                    _ => tracing::warn!(
                        method = method.key(),
                        run_index,
                        exit_code = ?exit_code,
                        "agent exited abnormally"
                    ),
                }

                outcomes.push(RunOutcome {
                    evaluation: eval.name.clone(),
                    method: *method,
                    run_index,
                    exit_code,
                    duration,
                    output_file: sink,
                });
            }
        }
    }
    Ok(outcomes)
}

/// Spawn the agent once, tee stdout lines to console and sink file, and
/// wait for exit. Stderr passes through to the console untouched.
async fn run_once(
    agent: &AgentConfig,
    prompt: &str,
    sink_path: &Path,
) -> Result<(Option<i32>, Duration), RunnerError> {
    let mut sink = tokio::fs::File::create(sink_path)
        .await
        .map_err(|e| RunnerError::Sink {
            path: sink_path.to_path_buf(),
            source: e,
        })?;

    let args = build_args(agent, prompt);
    let start = Instant::now();

    let mut child = Command::new(&agent.command)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| RunnerError::Spawn {
            command: agent.command.clone(),
            source: e,
        })?;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| RunnerError::Io { source: e })?
        {
            println!("{line}");
            sink.write_all(line.as_bytes())
                .await
                .map_err(|e| RunnerError::Io { source: e })?;
            sink.write_all(b"\n")
                .await
                .map_err(|e| RunnerError::Io { source: e })?;
        }
    }
    sink.flush()
        .await
        .map_err(|e| RunnerError::Io { source: e })?;

    let status = child
        .wait()
        .await
        .map_err(|e| RunnerError::Io { source: e })?;

    Ok((status.code(), start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;

    #[test]
    fn sink_file_name_default_evaluation() {
        assert_eq!(
            sink_file_name("default", Method::DevBrowser, 1),
            "dev-browser-run1.jsonl"
        );
    }

    #[test]
    fn sink_file_name_named_evaluation() {
        assert_eq!(
            sink_file_name("game-tracker", Method::PlaywrightMcp, 2),
            "game-tracker-playwright-mcp-run2.jsonl"
        );
    }

    #[test]
    fn sink_file_name_roundtrips_through_classifier() {
        for method in Method::ALL {
            for eval in ["default", "game-tracker"] {
                let name = sink_file_name(eval, method, 7);
                let (decoded_eval, decoded_method) = crate::method::classify(&name).unwrap();
                assert_eq!(decoded_eval, eval);
                assert_eq!(decoded_method, method);
            }
        }
    }

    #[test]
    fn build_args_replaces_prompt_placeholder() {
        let agent = AgentConfig {
            command: "claude".to_string(),
            args: vec!["-p".to_string(), "{prompt}".to_string()],
        };
        assert_eq!(build_args(&agent, "do the task"), vec!["-p", "do the task"]);
    }

    #[test]
    fn build_args_without_placeholder() {
        let agent = AgentConfig {
            command: "echo".to_string(),
            args: vec!["fixed".to_string()],
        };
        assert_eq!(build_args(&agent, "unused"), vec!["fixed"]);
    }

    #[tokio::test]
    async fn run_once_tees_stdout_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("dev-browser-run1.jsonl");
        let agent = AgentConfig {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "printf '{\"type\":\"init\"}\\n{\"done\":true}\\n'".to_string(),
            ],
        };

        let (exit_code, duration) = run_once(&agent, "unused", &sink).await.unwrap();
        assert_eq!(exit_code, Some(0));
        assert!(duration.as_secs() < 5);

        let contents = std::fs::read_to_string(&sink).unwrap();
        assert_eq!(contents, "{\"type\":\"init\"}\n{\"done\":true}\n");
    }

    #[tokio::test]
    async fn run_once_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("r.jsonl");
        let agent = AgentConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 42".to_string()],
        };
        let (exit_code, _) = run_once(&agent, "unused", &sink).await.unwrap();
        assert_eq!(exit_code, Some(42));
    }

    #[tokio::test]
    async fn run_once_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("r.jsonl");
        let agent = AgentConfig {
            command: "nonexistent-binary-xyz".to_string(),
            args: vec![],
        };
        let err = run_once(&agent, "unused", &sink).await.unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn run_all_produces_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let prompt_path = dir.path().join("PROMPT.md");
        std::fs::write(&prompt_path, "benchmark task").unwrap();

        let mut config = BenchConfig::default();
        config.bench.results_dir = dir.path().join("results");
        config.bench.runs = 2;
        config.evaluations = vec![EvaluationConfig {
            name: "default".to_string(),
            prompt_file: prompt_path,
        }];
        config.methods.clear();
        config.methods.insert(
            "dev-browser".to_string(),
            AgentConfig {
                command: "sh".to_string(),
                args: vec![
                    "-c".to_string(),
                    "printf '{\"duration_ms\":1,\"total_cost_usd\":0.1,\"num_turns\":1}\\n'"
                        .to_string(),
                ],
            },
        );

        let outcomes = run_all(&config).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(config
            .bench
            .results_dir
            .join("dev-browser-run1.jsonl")
            .exists());
        assert!(config
            .bench
            .results_dir
            .join("dev-browser-run2.jsonl")
            .exists());
        assert!(outcomes.iter().all(|o| o.exit_code == Some(0)));
    }

    #[tokio::test]
    async fn run_all_requires_configured_methods() {
        let mut config = BenchConfig::default();
        config.methods.clear();
        let err = run_all(&config).await.unwrap_err();
        assert!(matches!(err, RunnerError::NoMethods));
    }

    #[tokio::test]
    async fn run_all_missing_prompt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BenchConfig::default();
        config.bench.results_dir = dir.path().join("results");
        config.evaluations = vec![EvaluationConfig {
            name: "default".to_string(),
            prompt_file: dir.path().join("missing.md"),
        }];
        let err = run_all(&config).await.unwrap_err();
        assert!(matches!(err, RunnerError::Prompt { .. }));
    }
}

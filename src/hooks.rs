/// Pre-run reset hooks: each configured entry is a shell command run
/// via `sh -c` before every benchmark run (killing stale dev servers,
/// freeing ports, clearing scratch state).
use tokio::process::Command;

/// Errors from running a hook command.
#[derive(Debug)]
pub enum HookError {
    Spawn {
        command: String,
        source: std::io::Error,
    },
    Failed {
        command: String,
        code: Option<i32>,
    },
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookError::Spawn { command, source } => {
                write!(f, "failed to run hook `{command}`: {source}")
            }
            HookError::Failed { command, code } => match code {
                Some(code) => write!(f, "hook `{command}` exited with status {code}"),
                None => write!(f, "hook `{command}` was killed by a signal"),
            },
        }
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HookError::Spawn { source, .. } => Some(source),
            HookError::Failed { .. } => None,
        }
    }
}

/// Run each hook command in order, stopping at the first failure.
pub async fn run_hooks(commands: &[String]) -> Result<(), HookError> {
    for command in commands {
        tracing::info!(command = %command, "running pre-run hook");
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .await
            .map_err(|e| HookError::Spawn {
                command: command.clone(),
                source: e,
            })?;
        if !status.success() {
            return Err(HookError::Failed {
                command: command.clone(),
                code: status.code(),
            });
        }
    }
    Ok(())
}

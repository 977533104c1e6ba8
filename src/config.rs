use crate::method::Method;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from bench.toml.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub bench: BenchSettings,
    pub hooks: HooksConfig,
    /// Agent command templates keyed by method key. Only methods listed
    /// here are executed by the run phase.
    pub methods: BTreeMap<String, AgentConfig>,
    pub evaluations: Vec<EvaluationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    pub results_dir: PathBuf,
    pub report_file: PathBuf,
    /// Runs per method per evaluation.
    pub runs: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct HooksConfig {
    /// Shell commands run via `sh -c` before every benchmark run
    /// (environment reset: freeing dev-server ports, clearing state).
    pub pre_run: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    pub name: String,
    pub prompt_file: PathBuf,
}

// --- Default implementations ---

impl Default for BenchConfig {
    fn default() -> Self {
        let mut methods = BTreeMap::new();
        methods.insert(Method::DevBrowser.key().to_string(), AgentConfig::default());
        Self {
            bench: BenchSettings::default(),
            hooks: HooksConfig::default(),
            methods,
            evaluations: vec![EvaluationConfig {
                name: crate::method::DEFAULT_EVALUATION.to_string(),
                prompt_file: PathBuf::from("PROMPT.md"),
            }],
        }
    }
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            report_file: PathBuf::from("results/comparison.md"),
            runs: 3,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec![
                "-p".to_string(),
                "{prompt}".to_string(),
                "--dangerously-skip-permissions".to_string(),
                "--verbose".to_string(),
                "--output-format".to_string(),
                "stream-json".to_string(),
            ],
        }
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A `[methods.<key>]` table names a key not in the method registry.
    UnknownMethod {
        key: String,
    },
    EmptyEvaluationName,
    DuplicateEvaluation {
        name: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::UnknownMethod { key } => {
                let known: Vec<&str> = Method::ALL.iter().map(|m| m.key()).collect();
                write!(
                    f,
                    "unknown method `{key}` in [methods]; known methods: {}",
                    known.join(", ")
                )
            }
            ConfigError::EmptyEvaluationName => {
                write!(f, "evaluation name must not be empty")
            }
            ConfigError::DuplicateEvaluation { name } => {
                write!(f, "duplicate evaluation name `{name}`")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in self.methods.keys() {
            if Method::from_key(key).is_none() {
                return Err(ConfigError::UnknownMethod { key: key.clone() });
            }
        }
        let mut seen = std::collections::BTreeSet::new();
        for eval in &self.evaluations {
            if eval.name.is_empty() {
                return Err(ConfigError::EmptyEvaluationName);
            }
            if !seen.insert(eval.name.as_str()) {
                return Err(ConfigError::DuplicateEvaluation {
                    name: eval.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Load and validate config from `path`.
pub fn load_config(path: &Path) -> Result<BenchConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: BenchConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load config if the file exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<BenchConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(BenchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.bench.results_dir, PathBuf::from("results"));
        assert_eq!(config.bench.runs, 3);
        assert!(config.methods.contains_key("dev-browser"));
        assert_eq!(config.evaluations.len(), 1);
        assert_eq!(config.evaluations[0].name, "default");
        config.validate().unwrap();
    }

    #[test]
    fn parse_full_config() {
        let toml_text = r#"
[bench]
results_dir = "out"
report_file = "out/report.md"
runs = 5

[hooks]
pre_run = ["fuser -k 5173/tcp || true"]

[methods.dev-browser]
command = "claude"
args = ["-p", "{prompt}", "--output-format", "stream-json"]

[methods.playwright-mcp]
command = "claude"
args = ["-p", "{prompt}", "--mcp-config", "playwright.json"]

[[evaluations]]
name = "game-tracker"
prompt_file = "prompts/game-tracker.md"
"#;
        let config: BenchConfig = toml::from_str(toml_text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.bench.runs, 5);
        assert_eq!(config.hooks.pre_run.len(), 1);
        assert_eq!(config.methods.len(), 2);
        assert_eq!(config.evaluations[0].name, "game-tracker");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: BenchConfig = toml::from_str("[bench]\nruns = 1\n").unwrap();
        assert_eq!(config.bench.runs, 1);
        assert_eq!(config.bench.results_dir, PathBuf::from("results"));
        assert!(!config.evaluations.is_empty());
    }

    #[test]
    fn unknown_method_key_rejected() {
        let config: BenchConfig = toml::from_str("[methods.selenium]\ncommand = \"x\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMethod { .. }));
        assert!(err.to_string().contains("selenium"));
    }

    #[test]
    fn duplicate_evaluation_rejected() {
        let config: BenchConfig = toml::from_str(
            "[[evaluations]]\nname = \"a\"\nprompt_file = \"p.md\"\n\
             [[evaluations]]\nname = \"a\"\nprompt_file = \"q.md\"\n",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEvaluation { .. }));
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = load_or_default(&dir.path().join("bench.toml")).unwrap();
        assert_eq!(config.bench.runs, 3);
    }

    #[test]
    fn load_config_bad_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "not [valid toml").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

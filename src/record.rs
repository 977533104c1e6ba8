/// Telemetry extraction: read the terminal summary record from a run's
/// JSONL sink file.
///
/// The agent writes one JSON event per line; the last line is the
/// `result` event carrying `duration_ms`, `total_cost_usd`, and
/// `num_turns`. The producing process guarantees that ordering, so only
/// the final line is parsed here.
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One completed execution of one method against one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunRecord {
    /// Wall-clock time for the run, in milliseconds.
    pub duration_ms: u64,
    /// Computed spend for the run, in USD.
    pub cost_usd: f64,
    /// Count of interaction turns taken.
    pub turns: u64,
}

/// Errors from reading a run's telemetry record. All of these abort the
/// whole report generation: batch semantics are all-or-nothing at the
/// file level.
#[derive(Debug)]
pub enum RecordError {
    /// Failed to read the sink file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The sink file contains no lines.
    Empty { path: PathBuf },
    /// The last line is not a valid JSON object.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The last line lacks a required numeric field.
    MissingField {
        path: PathBuf,
        field: &'static str,
    },
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            RecordError::Empty { path } => {
                write!(f, "result file {} is empty", path.display())
            }
            RecordError::Json { path, source } => {
                write!(
                    f,
                    "last line of {} is not valid JSON: {}",
                    path.display(),
                    source
                )
            }
            RecordError::MissingField { path, field } => {
                write!(
                    f,
                    "last line of {} has no numeric `{}` field",
                    path.display(),
                    field
                )
            }
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Io { source, .. } => Some(source),
            RecordError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse the trailing summary line of a JSONL sink file into a RunRecord.
pub fn read_last_record(path: &Path) -> Result<RunRecord, RecordError> {
    let contents = std::fs::read_to_string(path).map_err(|e| RecordError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let last = contents
        .trim_end()
        .lines()
        .last()
        .ok_or_else(|| RecordError::Empty {
            path: path.to_path_buf(),
        })?;

    let value: Value = serde_json::from_str(last).map_err(|e| RecordError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(RunRecord {
        duration_ms: require_u64(&value, "duration_ms", path)?,
        cost_usd: require_f64(&value, "total_cost_usd", path)?,
        turns: require_u64(&value, "num_turns", path)?,
    })
}

fn require_u64(value: &Value, field: &'static str, path: &Path) -> Result<u64, RecordError> {
    value
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| RecordError::MissingField {
            path: path.to_path_buf(),
            field,
        })
}

fn require_f64(value: &Value, field: &'static str, path: &Path) -> Result<f64, RecordError> {
    value
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| RecordError::MissingField {
            path: path.to_path_buf(),
            field,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_trailing_result_line() {
        let dir = TempDir::new().unwrap();
        let contents = concat!(
            "{\"type\":\"system\",\"subtype\":\"init\"}\n",
            "{\"type\":\"assistant\",\"message\":{\"content\":[]}}\n",
            "{\"type\":\"result\",\"duration_ms\":233000,\"total_cost_usd\":0.88,\"num_turns\":12}\n",
        );
        let path = write_file(dir.path(), "dev-browser-run1.jsonl", contents);

        let record = read_last_record(&path).unwrap();
        assert_eq!(record.duration_ms, 233000);
        assert!((record.cost_usd - 0.88).abs() < 1e-9);
        assert_eq!(record.turns, 12);
    }

    #[test]
    fn trailing_newline_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "r.jsonl",
            "{\"duration_ms\":1,\"total_cost_usd\":0.5,\"num_turns\":2}\n\n",
        );
        let record = read_last_record(&path).unwrap();
        assert_eq!(record.duration_ms, 1);
    }

    #[test]
    fn last_line_not_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "r.jsonl", "{\"type\":\"init\"}\n{not json\n");
        let err = read_last_record(&path).unwrap_err();
        assert!(matches!(err, RecordError::Json { .. }));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn missing_field_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "r.jsonl",
            "{\"duration_ms\":5,\"num_turns\":2}\n",
        );
        let err = read_last_record(&path).unwrap_err();
        assert!(matches!(
            err,
            RecordError::MissingField {
                field: "total_cost_usd",
                ..
            }
        ));
    }

    #[test]
    fn empty_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "r.jsonl", "");
        let err = read_last_record(&path).unwrap_err();
        assert!(matches!(err, RecordError::Empty { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_last_record(Path::new("/nonexistent/r.jsonl")).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
    }
}

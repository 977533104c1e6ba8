/// Results-directory collector: scan the flat results directory, decode
/// each filename, read one telemetry record per recognized file, and
/// group records by evaluation and method.
use crate::method::{classify, Method};
use crate::record::{read_last_record, RecordError, RunRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// evaluation name -> method -> records, in discovery order per group.
///
/// Directory listing order only decides where each run lands in its
/// group; averaging downstream is order-independent.
pub type Grouped = BTreeMap<String, BTreeMap<Method, Vec<RunRecord>>>;

/// Errors from collecting results. Any of these abort report generation
/// before anything is written.
#[derive(Debug)]
pub enum CollectError {
    /// The results directory does not exist.
    MissingDir { path: PathBuf },
    /// Failed to list the results directory.
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The directory holds no recognizable result files.
    NoResults { path: PathBuf },
    /// A recognized result file could not be parsed.
    Record(RecordError),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::MissingDir { path } => {
                write!(f, "results directory {} does not exist", path.display())
            }
            CollectError::ReadDir { path, source } => {
                write!(
                    f,
                    "failed to list results directory {}: {}",
                    path.display(),
                    source
                )
            }
            CollectError::NoResults { path } => {
                write!(f, "no result files found in {}", path.display())
            }
            CollectError::Record(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::ReadDir { source, .. } => Some(source),
            CollectError::Record(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordError> for CollectError {
    fn from(e: RecordError) -> Self {
        CollectError::Record(e)
    }
}

/// Scan `dir` (non-recursive) and build the evaluation/method grouping.
///
/// Files that don't decode to a known result filename are skipped
/// silently; the directory is allowed to hold unrelated files. A
/// recognized file that fails to parse is fatal.
pub fn collect_results(dir: &Path) -> Result<Grouped, CollectError> {
    if !dir.is_dir() {
        return Err(CollectError::MissingDir {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| CollectError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut grouped: Grouped = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| CollectError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        let (evaluation, method) = match classify(name) {
            Some(decoded) => decoded,
            None => {
                tracing::debug!(file = name, "skipping unrecognized file");
                continue;
            }
        };

        let record = read_last_record(&path)?;
        tracing::debug!(
            file = name,
            evaluation = %evaluation,
            method = method.key(),
            duration_ms = record.duration_ms,
            "collected run"
        );
        grouped
            .entry(evaluation)
            .or_default()
            .entry(method)
            .or_default()
            .push(record);
    }

    if grouped.is_empty() {
        return Err(CollectError::NoResults {
            path: dir.to_path_buf(),
        });
    }
    Ok(grouped)
}

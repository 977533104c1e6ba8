/// Static registry of the browser-automation methods under comparison,
/// plus the classifier that decodes result filenames into
/// (evaluation name, method) pairs.
///
/// Result files are named `<evaluation>-<key>-run<N>.jsonl`, with the
/// `<evaluation>-` part omitted for the default evaluation.

/// Sentinel evaluation name used when a result filename carries no
/// evaluation prefix.
pub const DEFAULT_EVALUATION: &str = "default";

/// One browser-automation method under comparison.
///
/// Variant order is the canonical order: it drives filename-suffix
/// disambiguation, default display order, and ranking tiebreaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    DevBrowser,
    PlaywrightMcp,
    ChromeDevtools,
}

impl Method {
    /// All known methods, in canonical order.
    pub const ALL: [Method; 3] = [
        Method::DevBrowser,
        Method::PlaywrightMcp,
        Method::ChromeDevtools,
    ];

    /// Stable slug used in result filenames and config keys.
    pub fn key(self) -> &'static str {
        match self {
            Method::DevBrowser => "dev-browser",
            Method::PlaywrightMcp => "playwright-mcp",
            Method::ChromeDevtools => "chrome-devtools",
        }
    }

    /// Human-readable label used in the rendered report.
    pub fn display_name(self) -> &'static str {
        match self {
            Method::DevBrowser => "Dev Browser",
            Method::PlaywrightMcp => "Playwright MCP",
            Method::ChromeDevtools => "Chrome DevTools MCP",
        }
    }

    /// Look up a method by its exact key.
    pub fn from_key(key: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Classify a result filename into (evaluation name, method).
///
/// Returns `None` for anything that is not a result file: wrong
/// extension, no `-run<digits>` suffix, or no known method key in the
/// remaining prefix. Unrecognized files are expected in the results
/// directory and are skipped by the caller without complaint.
///
/// Suffix probing is only here to decode legacy filenames. It assumes
/// no method key is a suffix of another; `keys_are_suffix_free` pins
/// that. Breaking it is a registry defect, not a runtime condition.
pub fn classify(filename: &str) -> Option<(String, Method)> {
    let stem = filename.strip_suffix(".jsonl")?;
    let run_at = stem.rfind("-run")?;
    let digits = &stem[run_at + "-run".len()..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let prefix = &stem[..run_at];

    for method in Method::ALL {
        let key = method.key();
        if prefix == key {
            return Some((DEFAULT_EVALUATION.to_string(), method));
        }
        if let Some(evaluation) = prefix.strip_suffix(key) {
            if let Some(evaluation) = evaluation.strip_suffix('-') {
                if evaluation.is_empty() {
                    return Some((DEFAULT_EVALUATION.to_string(), method));
                }
                return Some((evaluation.to_string(), method));
            }
        }
    }
    None
}

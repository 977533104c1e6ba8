/// Markdown report renderer: a pure function from evaluation summaries
/// to the comparison report text. All I/O stays in the command handler.
use crate::method::DEFAULT_EVALUATION;
use crate::summary::{compare_by, pool_overall, EvaluationSummary, MethodSummary};

/// Render the full comparison report.
///
/// With a single evaluation the report is just title + table + analysis.
/// With several, a table of contents and a pooled "Overall Summary"
/// section bracket the per-evaluation sections.
pub fn render(evals: &[EvaluationSummary]) -> String {
    let multi = evals.len() > 1;
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Browser Automation Benchmark".to_string());
    lines.push(String::new());

    if multi {
        lines.push("## Evaluations".to_string());
        lines.push(String::new());
        for eval in evals {
            let heading = heading_name(&eval.name);
            lines.push(format!("- [{}](#{})", heading, anchor(&heading)));
        }
        lines.push("- [Overall Summary](#overall-summary)".to_string());
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    for eval in evals {
        if multi {
            lines.push(format!("## {}", heading_name(&eval.name)));
            lines.push(String::new());
        }
        render_section(&mut lines, &eval.methods, eval.max_runs());
    }

    if multi {
        lines.push("## Overall Summary".to_string());
        lines.push(String::new());
        let pooled = pool_overall(evals);
        let max_runs = pooled.iter().map(|m| m.runs.len()).max().unwrap_or(0);
        render_section(&mut lines, &pooled, max_runs);
    }

    let mut out = lines.join("\n");
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// Table + analysis for one set of ranked method summaries. Shared by
/// the per-evaluation sections and the pooled overall section.
fn render_section(lines: &mut Vec<String>, methods: &[MethodSummary], max_runs: usize) {
    if max_runs > 1 {
        lines.push(format!(
            "*Results averaged across {max_runs} runs per method.*"
        ));
        lines.push(String::new());
    }

    lines.push("| Method | Time | Cost | Turns |".to_string());
    lines.push("|--------|------|------|-------|".to_string());
    for (i, m) in methods.iter().enumerate() {
        let name = if i == 0 {
            format!("**{}**", m.method)
        } else {
            m.method.to_string()
        };
        lines.push(format!(
            "| {} | {} | {} | {} |",
            name,
            format_duration_ms(m.avg_duration_ms),
            format_cost(m.avg_cost_usd),
            m.avg_turns
        ));
    }
    lines.push(String::new());

    lines.push("### Analysis".to_string());
    lines.push(String::new());

    if let Some(cmp) = compare_by(methods, |m| m.avg_duration_ms) {
        lines.push(format!(
            "**Fastest: {} ({})**",
            cmp.winner.method,
            format_duration_ms(cmp.winner.avg_duration_ms)
        ));
        lines.push(String::new());
        for (m, pct) in &cmp.others {
            let delta_secs =
                ((m.avg_duration_ms - cmp.winner.avg_duration_ms) / 1000.0).round() as u64;
            lines.push(format!(
                "- {pct}% faster than {} ({delta_secs}s faster)",
                m.method
            ));
        }
        if !cmp.others.is_empty() {
            lines.push(String::new());
        }
    }

    if let Some(cmp) = compare_by(methods, |m| m.avg_cost_usd) {
        lines.push(format!(
            "**Cheapest: {} ({})**",
            cmp.winner.method,
            format_cost(cmp.winner.avg_cost_usd)
        ));
        lines.push(String::new());
        for (m, pct) in &cmp.others {
            let delta = m.avg_cost_usd - cmp.winner.avg_cost_usd;
            lines.push(format!(
                "- {pct}% cheaper than {} (${delta:.2} less)",
                m.method
            ));
        }
        if !cmp.others.is_empty() {
            lines.push(String::new());
        }
    }

    if let Some(cmp) = compare_by(methods, |m| m.avg_turns as f64) {
        lines.push(format!(
            "**Fewest turns: {} ({})**",
            cmp.winner.method, cmp.winner.avg_turns
        ));
        lines.push(String::new());
        for (m, pct) in &cmp.others {
            let delta = m.avg_turns.saturating_sub(cmp.winner.avg_turns);
            lines.push(format!(
                "- {pct}% fewer turns than {} ({delta} fewer)",
                m.method
            ));
        }
        lines.push(String::new());
    }
}

/// Heading label for an evaluation: uppercased, with the sentinel
/// rendered as "Default".
fn heading_name(name: &str) -> String {
    if name == DEFAULT_EVALUATION {
        "Default".to_string()
    } else {
        name.to_uppercase()
    }
}

/// Markdown anchor slug for a heading, the way GitHub generates them.
fn anchor(heading: &str) -> String {
    heading
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                Some(c.to_ascii_lowercase())
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// Format milliseconds as `<minutes>m <seconds>s`, rounding to the
/// nearest whole second first.
pub fn format_duration_ms(ms: f64) -> String {
    let total_secs = (ms / 1000.0).round() as u64;
    format!("{}m {:02}s", total_secs / 60, total_secs % 60)
}

/// Format a dollar amount with two decimals.
pub fn format_cost(cost: f64) -> String {
    format!("${cost:.2}")
}

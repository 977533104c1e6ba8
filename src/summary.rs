/// Aggregation and ranking: per-method averages, fastest-first ordering
/// within an evaluation, and per-metric comparisons against each
/// metric's own best performer.
use crate::collect::Grouped;
use crate::method::{Method, DEFAULT_EVALUATION};
use crate::record::RunRecord;
use std::collections::BTreeMap;

/// Aggregated view of all runs of one method within one evaluation.
/// Only materialized for methods with at least one run.
#[derive(Debug, Clone)]
pub struct MethodSummary {
    pub method: Method,
    pub runs: Vec<RunRecord>,
    pub avg_duration_ms: f64,
    pub avg_cost_usd: f64,
    /// Mean turn count, rounded half-away-from-zero.
    pub avg_turns: u64,
}

impl MethodSummary {
    /// Compute averages over `runs`. Returns None for an empty run list.
    pub fn from_runs(method: Method, runs: Vec<RunRecord>) -> Option<Self> {
        if runs.is_empty() {
            return None;
        }
        let n = runs.len() as f64;
        let avg_duration_ms = runs.iter().map(|r| r.duration_ms as f64).sum::<f64>() / n;
        let avg_cost_usd = runs.iter().map(|r| r.cost_usd).sum::<f64>() / n;
        let avg_turns = (runs.iter().map(|r| r.turns as f64).sum::<f64>() / n).round() as u64;
        Some(Self {
            method,
            runs,
            avg_duration_ms,
            avg_cost_usd,
            avg_turns,
        })
    }
}

/// One named evaluation and the methods benchmarked against it,
/// ranked fastest-first.
#[derive(Debug, Clone)]
pub struct EvaluationSummary {
    pub name: String,
    pub methods: Vec<MethodSummary>,
}

impl EvaluationSummary {
    pub fn from_groups(name: String, groups: BTreeMap<Method, Vec<RunRecord>>) -> Self {
        // BTreeMap iteration follows the canonical Method order, and the
        // duration sort is stable, so tied averages keep canonical order.
        let methods = rank(
            groups
                .into_iter()
                .filter_map(|(method, runs)| MethodSummary::from_runs(method, runs))
                .collect(),
        );
        Self { name, methods }
    }

    /// Largest run count across this evaluation's methods.
    pub fn max_runs(&self) -> usize {
        self.methods.iter().map(|m| m.runs.len()).max().unwrap_or(0)
    }
}

/// Sort method summaries ascending by average duration (stable).
fn rank(mut methods: Vec<MethodSummary>) -> Vec<MethodSummary> {
    methods.sort_by(|a, b| a.avg_duration_ms.total_cmp(&b.avg_duration_ms));
    methods
}

/// Turn the collector's grouping into ranked evaluation summaries,
/// ordered alphabetically with the sentinel "default" evaluation first.
pub fn summarize(grouped: Grouped) -> Vec<EvaluationSummary> {
    let mut evals: Vec<EvaluationSummary> = grouped
        .into_iter()
        .map(|(name, groups)| EvaluationSummary::from_groups(name, groups))
        .collect();
    evals.sort_by(|a, b| {
        let a_default = a.name == DEFAULT_EVALUATION;
        let b_default = b.name == DEFAULT_EVALUATION;
        b_default.cmp(&a_default).then_with(|| a.name.cmp(&b.name))
    });
    evals
}

/// Pool ALL raw runs across evaluations per method and re-aggregate.
/// Run lists are concatenated; averages of averages are never taken.
pub fn pool_overall(evals: &[EvaluationSummary]) -> Vec<MethodSummary> {
    let mut pooled: BTreeMap<Method, Vec<RunRecord>> = BTreeMap::new();
    for eval in evals {
        for summary in &eval.methods {
            pooled
                .entry(summary.method)
                .or_default()
                .extend(summary.runs.iter().copied());
        }
    }
    rank(
        pooled
            .into_iter()
            .filter_map(|(method, runs)| MethodSummary::from_runs(method, runs))
            .collect(),
    )
}

/// Percentage by which the best performer beats `other` on a metric,
/// with the comparator's own value as the denominator:
/// `round(((other - best) / other) * 100)`.
pub fn percent_diff(best: f64, other: f64) -> i64 {
    if other == 0.0 {
        return 0;
    }
    (((other - best) / other) * 100.0).round() as i64
}

/// One metric's best performer and every other method's percent
/// difference against it, in ranked order.
pub struct MetricComparison<'a> {
    pub winner: &'a MethodSummary,
    pub others: Vec<(&'a MethodSummary, i64)>,
}

/// Compare all methods on one metric. The first method with the strictly
/// smallest value wins, so ties go to the earlier-ranked method.
pub fn compare_by<'a, F>(methods: &'a [MethodSummary], metric: F) -> Option<MetricComparison<'a>>
where
    F: Fn(&MethodSummary) -> f64,
{
    let winner = methods.iter().reduce(|best, m| {
        if metric(m) < metric(best) {
            m
        } else {
            best
        }
    })?;
    let best_value = metric(winner);
    let others = methods
        .iter()
        .filter(|m| !std::ptr::eq(*m, winner))
        .map(|m| (m, percent_diff(best_value, metric(m))))
        .collect();
    Some(MetricComparison { winner, others })
}

pub mod types;

pub use types::*;

use crate::calendar;

/// Hours in a display workday for `format_days_hours`. Independent of the
/// 09:00–17:00 calendar window used for the duration math.
pub const HOURS_PER_WORKDAY: f64 = 8.0;

/// Compute working-hours metrics for a single issue.
///
/// Cycle time runs started→completed, lead time created→completed. An
/// absent `created` yields a lead time of 0.0 rather than an error.
pub fn compute_metrics(issue: Issue) -> IssueMetrics {
    let cycle = calendar::business_hours_between(issue.started, issue.completed);
    let lead = issue
        .created
        .map(|created| calendar::business_hours_between(created, issue.completed))
        .unwrap_or(0.0);
    let month = issue.completed.format("%Y-%m").to_string();

    IssueMetrics {
        issue,
        duration_hours: cycle,
        cycle_time_hours: cycle,
        lead_time_hours: lead,
        month,
    }
}

/// Format a working-hours total as `"{days}d {hours}h"` using the 8-hour
/// display workday. Negative or non-finite input returns `"Invalid input"`.
pub fn format_days_hours(hours: f64) -> String {
    if !hours.is_finite() || hours < 0.0 {
        return "Invalid input".to_string();
    }
    let days = (hours / HOURS_PER_WORKDAY).floor() as i64;
    let leftover = hours % HOURS_PER_WORKDAY;
    format!("{days}d {leftover:.2}h")
}

/// Reduce a batch of issue metrics to summary statistics.
///
/// Returns `None` for an empty batch — average, median, and the extremes
/// are undefined there, and callers must surface that as a distinct
/// "no data" outcome rather than a zero-valued summary.
pub fn aggregate(metrics: &[IssueMetrics]) -> Option<AggregateSummary> {
    if metrics.is_empty() {
        return None;
    }

    let count = metrics.len();
    let total_hours: f64 = metrics.iter().map(|m| m.duration_hours).sum();
    let average_hours = total_hours / count as f64;

    let mut sorted: Vec<f64> = metrics.iter().map(|m| m.duration_hours).collect();
    sorted.sort_by(f64::total_cmp);
    let median_hours = sorted[count / 2];
    let min_hours = sorted[0];
    let max_hours = sorted[count - 1];

    let average_lead_time_hours = positive_average(metrics.iter().map(|m| m.lead_time_hours));
    let average_cycle_time_hours = positive_average(metrics.iter().map(|m| m.cycle_time_hours));

    Some(AggregateSummary {
        count,
        total_hours,
        average_hours,
        median_hours,
        min_hours,
        max_hours,
        average_lead_time_hours,
        average_cycle_time_hours,
        contributions: contributions(metrics),
    })
}

/// All issues sorted descending by duration for display ranking. The sort
/// is stable, so equal durations keep their input order.
pub fn rank_by_duration(metrics: &[IssueMetrics]) -> Vec<&IssueMetrics> {
    let mut ranked: Vec<&IssueMetrics> = metrics.iter().collect();
    ranked.sort_by(|a, b| b.duration_hours.total_cmp(&a.duration_hours));
    ranked
}

/// Average over the values greater than zero; 0.0 when none qualify.
/// Zero entries (e.g. a missing `created`) are excluded from the
/// denominator, not averaged in as zeros.
fn positive_average(values: impl Iterator<Item = f64>) -> f64 {
    let positive: Vec<f64> = values.filter(|h| *h > 0.0).collect();
    if positive.is_empty() {
        return 0.0;
    }
    positive.iter().sum::<f64>() / positive.len() as f64
}

fn contributions(metrics: &[IssueMetrics]) -> Vec<Contribution> {
    // Group in ranking order so that the stable count sort leaves tied
    // assignees in first-appearance order.
    let mut counts: Vec<Contribution> = Vec::new();
    for m in rank_by_duration(metrics) {
        match counts.iter_mut().find(|c| c.assignee == m.issue.assignee) {
            Some(c) => c.count += 1,
            None => counts.push(Contribution {
                assignee: m.issue.assignee.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

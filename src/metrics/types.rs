use chrono::NaiveDateTime;
use serde::Serialize;

/// A ticket parsed from a tracker export.
///
/// Invariant: an `Issue` exists only if both `started` and `completed`
/// parsed to valid instants — rows failing that are dropped by the
/// loader and never reach the metrics pipeline. `created` may be absent.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub assignee: String,
    pub team: String,
    pub state: String,
    pub created: Option<NaiveDateTime>,
    pub started: NaiveDateTime,
    pub completed: NaiveDateTime,
    /// Always false in the current pipeline; partial tickets are dropped
    /// at load time rather than carried through.
    pub in_progress: bool,
}

/// Per-issue working-hours metrics, computed once and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct IssueMetrics {
    #[serde(flatten)]
    pub issue: Issue,
    pub duration_hours: f64,
    pub cycle_time_hours: f64,
    pub lead_time_hours: f64,
    /// Completion month as `YYYY-MM`.
    pub month: String,
}

/// Tickets solved by one assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub assignee: String,
    pub count: u64,
}

/// Summary statistics over a batch of issue metrics.
///
/// Recomputed fresh for every report; not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub count: usize,
    pub total_hours: f64,
    pub average_hours: f64,
    /// Element at sorted index `count / 2` — for even counts this is the
    /// upper-middle value, not the usual average of the two middles.
    pub median_hours: f64,
    pub min_hours: f64,
    pub max_hours: f64,
    pub average_lead_time_hours: f64,
    pub average_cycle_time_hours: f64,
    /// Per-assignee ticket counts, descending; ties keep the order in
    /// which assignees first appear in the duration-descending ranking.
    pub contributions: Vec<Contribution>,
}

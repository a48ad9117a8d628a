pub mod calendar;
pub mod error;
pub mod load;
pub mod metrics;
pub mod storage;

pub use calendar::business_hours_between;
pub use error::{Error, Result};
pub use load::{load_issues, LoadReport};
pub use metrics::{
    aggregate, compute_metrics, format_days_hours, rank_by_duration, AggregateSummary,
    Contribution, Issue, IssueMetrics,
};
pub use storage::repository::{AssigneeStats, MonthlyStats};
pub use storage::Database;

use serde::Serialize;
use std::path::Path;

use storage::repository;

/// Outcome of importing a CSV export into the warehouse.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub issues_imported: u64,
    pub rows_skipped: u64,
}

/// Main entry point for the Linear metrics warehouse.
pub struct LinearDW {
    db: Database,
}

impl LinearDW {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Load a CSV export, compute per-issue metrics, and persist them.
    pub async fn import(&self, csv_path: impl AsRef<Path>) -> Result<ImportReport> {
        let report = load::load_issues(csv_path)?;
        let metrics: Vec<IssueMetrics> = report.issues.into_iter().map(compute_metrics).collect();
        self.persist(&metrics).await?;
        Ok(ImportReport {
            issues_imported: metrics.len() as u64,
            rows_skipped: report.rows_skipped,
        })
    }

    /// Upsert a batch of issue metrics in a single transaction.
    pub async fn persist(&self, metrics: &[IssueMetrics]) -> Result<()> {
        let metrics = metrics.to_vec();
        self.db
            .writer()
            .call(move |conn| {
                let tx = conn.transaction()?;
                for m in &metrics {
                    repository::upsert_issue(&tx, m)?;
                }
                tx.commit()?;
                Ok::<(), rusqlite::Error>(())
            })
            .await?;
        Ok(())
    }

    /// Completed-issue rollups grouped by month and team.
    pub async fn monthly_stats(&self) -> Result<Vec<MonthlyStats>> {
        self.db
            .reader()
            .call(|conn| repository::monthly_stats(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Completed-issue rollups grouped by month, team, and assignee.
    pub async fn assignee_stats(&self) -> Result<Vec<AssigneeStats>> {
        self.db
            .reader()
            .call(|conn| repository::assignee_stats(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::metrics::IssueMetrics;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Issues ─────────────────────────────────────────────────────────

/// Insert or replace a per-issue metrics row, keyed by issue id.
/// Re-running with the same id overwrites the prior values.
pub fn upsert_issue(conn: &Connection, m: &IssueMetrics) -> Result<(), rusqlite::Error> {
    let created_at = m
        .issue
        .created
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string());

    conn.execute(
        "INSERT INTO issues (
            id, title, assignee, team, state,
            created_at, started_at, completed_at,
            duration_hours, cycle_time_hours, lead_time_hours, month
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            title=excluded.title, assignee=excluded.assignee, team=excluded.team,
            state=excluded.state, created_at=excluded.created_at,
            started_at=excluded.started_at, completed_at=excluded.completed_at,
            duration_hours=excluded.duration_hours,
            cycle_time_hours=excluded.cycle_time_hours,
            lead_time_hours=excluded.lead_time_hours, month=excluded.month",
        params![
            m.issue.id,
            m.issue.title,
            m.issue.assignee,
            m.issue.team,
            m.issue.state,
            created_at,
            m.issue.started.format(TIMESTAMP_FORMAT).to_string(),
            m.issue.completed.format(TIMESTAMP_FORMAT).to_string(),
            m.duration_hours,
            m.cycle_time_hours,
            m.lead_time_hours,
            m.month,
        ],
    )?;
    Ok(())
}

pub fn issue_count(conn: &Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
}

// ── Rollups ────────────────────────────────────────────────────────

/// Completed-issue rollup for one month and team.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub month: String,
    pub team: String,
    pub issues_done: i64,
    pub avg_cycle_time: f64,
    pub avg_lead_time: f64,
}

/// Completed-issue rollup for one month, team, and assignee.
#[derive(Debug, Clone, Serialize)]
pub struct AssigneeStats {
    pub month: String,
    pub team: String,
    pub assignee: String,
    pub issues_done: i64,
    pub avg_cycle_time: f64,
    pub avg_lead_time: f64,
}

pub fn monthly_stats(conn: &Connection) -> Result<Vec<MonthlyStats>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT
            month,
            team,
            COUNT(*) AS issues_done,
            ROUND(AVG(cycle_time_hours), 2) AS avg_cycle_time,
            ROUND(AVG(lead_time_hours), 2) AS avg_lead_time
         FROM issues
         WHERE completed_at IS NOT NULL
         GROUP BY month, team
         ORDER BY month DESC, team",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(MonthlyStats {
            month: row.get(0)?,
            team: row.get(1)?,
            issues_done: row.get(2)?,
            avg_cycle_time: row.get(3)?,
            avg_lead_time: row.get(4)?,
        })
    })?;
    rows.collect()
}

pub fn assignee_stats(conn: &Connection) -> Result<Vec<AssigneeStats>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT
            month,
            team,
            assignee,
            COUNT(*) AS issues_done,
            ROUND(AVG(cycle_time_hours), 2) AS avg_cycle_time,
            ROUND(AVG(lead_time_hours), 2) AS avg_lead_time
         FROM issues
         WHERE completed_at IS NOT NULL
         GROUP BY month, team, assignee
         ORDER BY month DESC, team, assignee",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AssigneeStats {
            month: row.get(0)?,
            team: row.get(1)?,
            assignee: row.get(2)?,
            issues_done: row.get(3)?,
            avg_cycle_time: row.get(4)?,
            avg_lead_time: row.get(5)?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Issue, IssueMetrics};
    use crate::storage::Database;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn metrics(id: &str, assignee: &str, month: &str, cycle: f64, lead: f64) -> IssueMetrics {
        let (y, m) = month.split_once('-').unwrap();
        let completed = dt(y.parse().unwrap(), m.parse().unwrap(), 10, 14);
        IssueMetrics {
            issue: Issue {
                id: id.to_string(),
                title: format!("Issue {id}"),
                assignee: assignee.to_string(),
                team: "Core".to_string(),
                state: "Done".to_string(),
                created: None,
                started: completed - chrono::Duration::hours(4),
                completed,
                in_progress: false,
            },
            duration_hours: cycle,
            cycle_time_hours: cycle,
            lead_time_hours: lead,
            month: month.to_string(),
        }
    }

    #[tokio::test]
    async fn test_monthly_stats_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                upsert_issue(conn, &metrics("LIN-1", "Alice", "2025-06", 4.0, 6.0))?;
                upsert_issue(conn, &metrics("LIN-2", "Bob", "2025-06", 2.0, 3.0))?;
                upsert_issue(conn, &metrics("LIN-3", "Alice", "2025-05", 8.0, 8.0))?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let stats = db.reader().call(|conn| monthly_stats(conn)).await.unwrap();

        // Ordered by month descending
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].month, "2025-06");
        assert_eq!(stats[0].team, "Core");
        assert_eq!(stats[0].issues_done, 2);
        assert_eq!(stats[0].avg_cycle_time, 3.0);
        assert_eq!(stats[0].avg_lead_time, 4.5);
        assert_eq!(stats[1].month, "2025-05");
        assert_eq!(stats[1].issues_done, 1);
    }

    #[tokio::test]
    async fn test_assignee_stats_grouping() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                upsert_issue(conn, &metrics("LIN-1", "Alice", "2025-06", 4.0, 4.0))?;
                upsert_issue(conn, &metrics("LIN-2", "Alice", "2025-06", 2.0, 2.0))?;
                upsert_issue(conn, &metrics("LIN-3", "Bob", "2025-06", 1.0, 1.0))?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let stats = db.reader().call(|conn| assignee_stats(conn)).await.unwrap();

        assert_eq!(stats.len(), 2);
        // Within a month, ordered by team then assignee ascending
        assert_eq!(stats[0].assignee, "Alice");
        assert_eq!(stats[0].issues_done, 2);
        assert_eq!(stats[0].avg_cycle_time, 3.0);
        assert_eq!(stats[1].assignee, "Bob");
        assert_eq!(stats[1].issues_done, 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_row() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                upsert_issue(conn, &metrics("LIN-1", "Alice", "2025-06", 4.0, 6.0))?;
                upsert_issue(conn, &metrics("LIN-1", "Bob", "2025-06", 9.0, 9.0))?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let (count, assignee, cycle) = db
            .reader()
            .call(|conn| {
                let count = issue_count(conn)?;
                let (assignee, cycle): (String, f64) = conn.query_row(
                    "SELECT assignee, cycle_time_hours FROM issues WHERE id = 'LIN-1'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok::<_, rusqlite::Error>((count, assignee, cycle))
            })
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(assignee, "Bob");
        assert_eq!(cycle, 9.0);
    }

    #[tokio::test]
    async fn test_absent_created_stored_as_null() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| upsert_issue(conn, &metrics("LIN-1", "Alice", "2025-06", 4.0, 0.0)))
            .await
            .unwrap();

        let created: Option<String> = db
            .reader()
            .call(|conn| {
                conn.query_row("SELECT created_at FROM issues WHERE id = 'LIN-1'", [], |r| {
                    r.get(0)
                })
            })
            .await
            .unwrap();
        assert!(created.is_none());
    }
}

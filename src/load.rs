use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::Result;
use crate::metrics::Issue;

/// Outcome of loading a CSV export.
#[derive(Debug)]
pub struct LoadReport {
    pub issues: Vec<Issue>,
    /// Rows dropped for lacking a valid `Started` or `Completed` value.
    pub rows_skipped: u64,
}

/// Load issues from a tracker CSV export.
///
/// Columns are addressed by header name (`ID`, `Title`, `Assignee`,
/// `Team`, `State`, `Created`, `Started`, `Completed`); missing columns
/// read as empty. Rows without a parseable `Started` and `Completed`
/// never become issues — they are counted and logged, not errors.
pub fn load_issues(path: impl AsRef<Path>) -> Result<LoadReport> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();

    let mut issues = Vec::new();
    let mut rows_skipped = 0u64;
    for record in reader.records() {
        let record = record?;
        match issue_from_record(&headers, &record) {
            Some(issue) => issues.push(issue),
            None => {
                rows_skipped += 1;
                log::debug!(
                    "skipping row without valid start/completion: {:?}",
                    field(&headers, &record, "ID")
                );
            }
        }
    }

    log::info!(
        "loaded {} issues from {} ({} rows skipped)",
        issues.len(),
        path.as_ref().display(),
        rows_skipped
    );
    Ok(LoadReport {
        issues,
        rows_skipped,
    })
}

fn issue_from_record(headers: &StringRecord, record: &StringRecord) -> Option<Issue> {
    let started = parse_instant(field(headers, record, "Started"))?;
    let completed = parse_instant(field(headers, record, "Completed"))?;
    let created = parse_instant(field(headers, record, "Created"));

    Some(Issue {
        id: field(headers, record, "ID").to_string(),
        title: non_empty(field(headers, record, "Title"), "(No title)"),
        assignee: non_empty(field(headers, record, "Assignee"), "Unassigned"),
        team: field(headers, record, "Team").to_string(),
        state: field(headers, record, "State").to_string(),
        created,
        started,
        completed,
        in_progress: false,
    })
}

fn field<'a>(headers: &StringRecord, record: &'a StringRecord, name: &str) -> &'a str {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| record.get(i))
        .unwrap_or("")
}

fn non_empty(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Parse an export timestamp. RFC 3339 offsets are discarded after
/// parsing — the instant is taken as written, with no conversion into
/// another timezone. Bare dates parse as midnight.
pub fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_basic_export() {
        let file = write_csv(
            "ID,Title,Assignee,Team,State,Created,Started,Completed\n\
             LIN-1,Fix login,Alice,Core,Done,2025-06-02T08:00:00Z,2025-06-02T10:00:00Z,2025-06-02T14:00:00Z\n\
             LIN-2,Update docs,Bob,Core,Done,,2025-06-03T09:00:00Z,2025-06-03T12:00:00Z\n",
        );
        let report = load_issues(file.path()).unwrap();
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.rows_skipped, 0);

        let first = &report.issues[0];
        assert_eq!(first.id, "LIN-1");
        assert_eq!(first.assignee, "Alice");
        assert!(first.created.is_some());
        assert!(!first.in_progress);

        assert!(report.issues[1].created.is_none());
    }

    #[test]
    fn test_rows_without_timestamps_are_dropped() {
        let file = write_csv(
            "ID,Title,Assignee,Team,State,Created,Started,Completed\n\
             LIN-1,No start,Alice,Core,Todo,,,2025-06-02T14:00:00Z\n\
             LIN-2,No completion,Alice,Core,In Progress,,2025-06-02T10:00:00Z,\n\
             LIN-3,Complete,Alice,Core,Done,,2025-06-02T10:00:00Z,2025-06-02T14:00:00Z\n",
        );
        let report = load_issues(file.path()).unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].id, "LIN-3");
        assert_eq!(report.rows_skipped, 2);
    }

    #[test]
    fn test_defaults_for_empty_fields() {
        let file = write_csv(
            "ID,Title,Assignee,Team,State,Created,Started,Completed\n\
             LIN-1,,,,,,2025-06-02T10:00:00Z,2025-06-02T14:00:00Z\n",
        );
        let report = load_issues(file.path()).unwrap();
        let issue = &report.issues[0];
        assert_eq!(issue.title, "(No title)");
        assert_eq!(issue.assignee, "Unassigned");
        assert_eq!(issue.team, "");
        assert_eq!(issue.state, "");
    }

    #[test]
    fn test_ragged_rows_are_tolerated() {
        // Trailing columns missing entirely
        let file = write_csv(
            "ID,Title,Assignee,Team,State,Created,Started,Completed\n\
             LIN-1,Short row\n\
             LIN-2,Full row,Alice,Core,Done,,2025-06-02T10:00:00Z,2025-06-02T14:00:00Z\n",
        );
        let report = load_issues(file.path()).unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.rows_skipped, 1);
    }

    #[test]
    fn test_parse_instant_formats() {
        assert_eq!(
            parse_instant("2025-06-02T10:30:00Z"),
            Some(
                NaiveDate::from_ymd_opt(2025, 6, 2)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            parse_instant("2025-06-02 10:30:00"),
            parse_instant("2025-06-02T10:30:00Z")
        );
        assert_eq!(
            parse_instant("2025-06-02"),
            Some(
                NaiveDate::from_ymd_opt(2025, 6, 2)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(parse_instant(""), None);
        assert_eq!(parse_instant("not a date"), None);
    }
}

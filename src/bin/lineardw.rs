use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use lineardw::{Database, IssueMetrics, LinearDW};

#[derive(Parser)]
#[command(name = "lineardw", about = "Linear metrics warehouse CLI")]
struct Cli {
    /// Database path (default: ~/.lineardw/lineardw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV export into the local warehouse
    Import {
        /// Path to the CSV export
        csv_path: PathBuf,
    },
    /// Print a metrics summary for a CSV export
    Report {
        /// Path to the CSV export
        csv_path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query persisted rollups
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },
    /// Show warehouse status
    Status,
}

#[derive(Subcommand)]
enum StatsTarget {
    /// Completed issues per month and team
    Monthly {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Completed issues per month, team, and assignee
    Assignees {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        // Report reads the CSV directly; no warehouse needed.
        Commands::Report { csv_path, json } => {
            handle_report(&csv_path, json)?;
        }
        command => {
            let db = match &cli.db {
                Some(path) => Database::open_at(path).await?,
                None => Database::open().await?,
            };
            let dw = LinearDW::new(db);

            match command {
                Commands::Import { csv_path } => {
                    let report = dw.import(&csv_path).await?;
                    println!(
                        "Imported {} issues ({} rows skipped)",
                        report.issues_imported, report.rows_skipped
                    );
                }
                Commands::Stats { target } => {
                    handle_stats(&dw, target).await?;
                }
                Commands::Status => {
                    print_status(dw.db()).await?;
                }
                Commands::Report { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}

fn handle_report(csv_path: &Path, json: bool) -> anyhow::Result<()> {
    let loaded = lineardw::load_issues(csv_path)?;
    let metrics: Vec<IssueMetrics> = loaded
        .issues
        .into_iter()
        .map(lineardw::compute_metrics)
        .collect();

    let Some(summary) = lineardw::aggregate(&metrics) else {
        println!("No completed tickets found.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Metrics Summary");
    println!("  Tickets solved: {}", summary.count);
    println!("  Average resolution time: {:.2}h", summary.average_hours);
    println!("  Median resolution time: {:.2}h", summary.median_hours);
    println!(
        "  Shortest: {:.2}h | Longest: {:.2}h",
        summary.min_hours, summary.max_hours
    );
    println!("  Average lead time: {:.2}h", summary.average_lead_time_hours);
    println!(
        "  Average cycle time: {:.2}h",
        summary.average_cycle_time_hours
    );

    println!();
    println!("Tickets by duration");
    for (i, m) in lineardw::rank_by_duration(&metrics).iter().enumerate() {
        println!(
            "  {}. {} — ({}) ({})",
            i + 1,
            m.issue.title,
            lineardw::format_days_hours(m.duration_hours),
            m.issue.assignee
        );
    }

    println!();
    println!("Top contributors");
    for (i, c) in summary.contributions.iter().enumerate() {
        println!("  {}. {} {}", i + 1, c.assignee, c.count);
    }

    Ok(())
}

async fn handle_stats(dw: &LinearDW, target: StatsTarget) -> anyhow::Result<()> {
    match target {
        StatsTarget::Monthly { json } => {
            let stats = dw.monthly_stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if stats.is_empty() {
                println!("No issues in the warehouse. Run 'lineardw import' first.");
            } else {
                for row in &stats {
                    println!(
                        "{} {:<20} done: {:<4} avg cycle: {:.2}h  avg lead: {:.2}h",
                        row.month, row.team, row.issues_done, row.avg_cycle_time, row.avg_lead_time
                    );
                }
            }
        }
        StatsTarget::Assignees { json } => {
            let stats = dw.assignee_stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if stats.is_empty() {
                println!("No issues in the warehouse. Run 'lineardw import' first.");
            } else {
                for row in &stats {
                    println!(
                        "{} {:<20} {:<20} done: {:<4} avg cycle: {:.2}h  avg lead: {:.2}h",
                        row.month,
                        row.team,
                        row.assignee,
                        row.issues_done,
                        row.avg_cycle_time,
                        row.avg_lead_time
                    );
                }
            }
        }
    }
    Ok(())
}

async fn print_status(db: &Database) -> anyhow::Result<()> {
    let stats = db
        .reader()
        .call(|conn| {
            let issues: i64 = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
            let teams: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT team) FROM issues",
                [],
                |row| row.get(0),
            )?;
            let assignees: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT assignee) FROM issues",
                [],
                |row| row.get(0),
            )?;
            let months: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT month) FROM issues",
                [],
                |row| row.get(0),
            )?;
            let latest: Option<String> = conn
                .query_row("SELECT MAX(completed_at) FROM issues", [], |row| row.get(0))
                .ok()
                .flatten();

            Ok::<_, rusqlite::Error>((issues, teams, assignees, months, latest))
        })
        .await?;

    let (issues, teams, assignees, months, latest) = stats;
    println!("Warehouse Status");
    println!("  Issues:    {issues}");
    println!("  Teams:     {teams}");
    println!("  Assignees: {assignees}");
    println!("  Months:    {months}");
    println!(
        "  Latest completion: {}",
        latest.unwrap_or_else(|| "never".to_string())
    );
    Ok(())
}

//! Civic Triage - command line front end.
//!
//! The `civic-triage` command submits citizen reports and administers the queue.
//!
//! ## Commands
//!
//! - `submit`: triage and store a report
//! - `list` / `show` / `history`: browse the queue and the audit trail
//! - `update` / `reclassify` / `delete`: change a report
//! - `spam` / `approve` / `reject`: moderation
//! - `stats` / `trends` / `summary` / `insights` / `plan` / `report`: reporting
//! - `public`: transparency figures over public reports
//! - `seed`: load demonstration data

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use civic_triage::actors::llm::{GeminiActorHandle, GeminiSettings};
use civic_triage::config::AppConfig;
use civic_triage::models::{FeedbackFilter, FeedbackStatus, FeedbackUpdate, NewFeedback};
use civic_triage::service::FeedbackService;
use civic_triage::triage::{Category, Severity, TriageAnalyzer};
use civic_triage::{database, sample_data, telemetry};

#[derive(Parser)]
#[command(name = "civic-triage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Triage civic feedback: classify, screen for spam, prioritise", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Database URL (overrides CIVIC_DATABASE_URL)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Ignore GOOGLE_API_KEY and use the keyword rules only
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Triage and store a new report
    Submit {
        /// Submitter identifier (usually an email address)
        #[arg(short, long)]
        submitter: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// Skip category detection
        #[arg(short, long)]
        category: Option<Category>,

        /// Skip severity detection
        #[arg(long)]
        severity: Option<Severity>,

        #[arg(short, long)]
        location: Option<String>,
    },

    /// List reports, highest priority first
    List {
        #[arg(long)]
        status: Option<FeedbackStatus>,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        severity: Option<Severity>,

        /// Only reports filed by this submitter
        #[arg(long)]
        submitter: Option<String>,
    },

    /// Show one report
    Show { id: i64 },

    /// Show the audit trail of a report
    History { id: i64 },

    /// Change status, official response or public visibility
    Update {
        id: i64,

        #[arg(long)]
        status: Option<FeedbackStatus>,

        #[arg(long)]
        response: Option<String>,

        /// Show or hide the report on the public dashboard
        #[arg(long)]
        public: Option<bool>,

        #[arg(long, default_value = "admin")]
        by: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Override category and/or severity; priority is recomputed
    Reclassify {
        id: i64,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        severity: Option<Severity>,

        #[arg(long, default_value = "admin")]
        by: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Soft-delete a report (submitter only)
    Delete {
        id: i64,

        #[arg(short, long)]
        submitter: String,
    },

    /// List spam candidates
    Spam,

    /// Mark a spam candidate as legitimate
    Approve {
        id: i64,

        #[arg(long, default_value = "moderator")]
        by: String,
    },

    /// Reject a report as spam
    Reject {
        id: i64,

        #[arg(long, default_value = "moderator")]
        by: String,
    },

    /// Dashboard statistics
    Stats {
        /// Window for the "recent" count
        #[arg(long, default_value = "30", value_parser = days_in_range)]
        days: i64,
    },

    /// Daily submission counts
    Trends {
        #[arg(long, default_value = "30", value_parser = days_in_range)]
        days: i64,
    },

    /// Executive summary of the last 7 days
    Summary,

    /// Insights over dashboard statistics
    Insights {
        #[arg(long, default_value = "30", value_parser = days_in_range)]
        days: i64,
    },

    /// Action plan for a report
    Plan { id: i64 },

    /// Comprehensive analysis: statistics, trends and an executive summary
    Report {
        #[arg(long, default_value = "30", value_parser = days_in_range)]
        days: i64,
    },

    /// Transparency figures over public reports
    Public,

    /// Load demonstration data
    Seed,
}

const MAX_DAYS: i64 = 36_500;

fn days_in_range(value: &str) -> Result<i64, String> {
    let days: i64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of days"))?;
    if (0..=MAX_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(format!("days must be between 0 and {MAX_DAYS}"))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn build_analyzer(config: &AppConfig, offline: bool) -> TriageAnalyzer {
    match (&config.api_key, offline) {
        (Some(api_key), false) => {
            let llm = GeminiActorHandle::new(
                GeminiSettings::new(
                    api_key.clone(),
                    config.model.clone(),
                    config.model_base_url.clone(),
                )
                .with_request_timeout(config.remote_timeout),
            );
            info!(model = %config.model, "Using hosted model with keyword fallback");
            TriageAnalyzer::with_model(Arc::new(llm), config.remote_timeout)
        }
        _ => {
            info!("Using keyword rules only");
            TriageAnalyzer::keyword_only()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    telemetry::init_tracing(cli.json || config.log_json, telemetry::level_for(cli.verbose));

    let db_url = cli.database.clone().unwrap_or_else(|| config.database_url.clone());
    let pool = database::init_db(&db_url)
        .await
        .with_context(|| format!("Failed to open database {db_url}"))?;
    let analyzer = build_analyzer(&config, cli.offline);
    let service = FeedbackService::new(pool, Arc::new(analyzer));

    match cli.command {
        Commands::Submit {
            submitter,
            title,
            description,
            category,
            severity,
            location,
        } => {
            let submission = service
                .submit(NewFeedback {
                    submitter,
                    title,
                    description,
                    category,
                    severity,
                    location_detail: location,
                })
                .await
                .context("Failed to submit feedback")?;
            print_json(&submission)?;
        }

        Commands::List {
            status,
            category,
            severity,
            submitter,
        } => {
            let feedback = match submitter {
                Some(submitter) => service.list_for_submitter(&submitter).await?,
                None => {
                    service
                        .list(&FeedbackFilter {
                            status,
                            category,
                            severity,
                            include_deleted: false,
                        })
                        .await?
                }
            };
            print_json(&feedback)?;
        }

        Commands::Show { id } => print_json(&service.get(id).await?)?,

        Commands::History { id } => print_json(&service.history(id).await?)?,

        Commands::Update {
            id,
            status,
            response,
            public,
            by,
            reason,
        } => {
            let update = FeedbackUpdate {
                status,
                official_response: response,
                is_public: public,
                change_reason: reason,
                ..Default::default()
            };
            let feedback = service
                .update(id, update, &by)
                .await
                .with_context(|| format!("Failed to update feedback {id}"))?;
            print_json(&feedback)?;
        }

        Commands::Reclassify {
            id,
            category,
            severity,
            by,
            reason,
        } => {
            let feedback = service
                .reclassify(id, category, severity, &by, reason)
                .await
                .with_context(|| format!("Failed to reclassify feedback {id}"))?;
            print_json(&feedback)?;
        }

        Commands::Delete { id, submitter } => {
            service
                .delete(id, &submitter)
                .await
                .with_context(|| format!("Failed to delete feedback {id}"))?;
            println!("Deleted feedback {id}");
        }

        Commands::Spam => print_json(&service.spam_candidates().await?)?,

        Commands::Approve { id, by } => print_json(&service.approve(id, &by).await?)?,

        Commands::Reject { id, by } => print_json(&service.reject(id, &by).await?)?,

        Commands::Stats { days } => print_json(&service.stats(days).await?)?,

        Commands::Trends { days } => print_json(&service.trends(days).await?)?,

        Commands::Summary => println!("{}", service.weekly_summary().await?),

        Commands::Insights { days } => println!("{}", service.insights(days).await?),

        Commands::Plan { id } => println!("{}", service.action_plan(id).await?),

        Commands::Report { days } => print_json(&service.analysis_report(days).await?)?,

        Commands::Public => print_json(&service.public_stats().await?)?,

        Commands::Seed => {
            let stored = sample_data::seed(&service)
                .await
                .context("Failed to seed sample data")?;
            println!("Created {} sample reports", stored.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_range() {
        assert_eq!(days_in_range("30"), Ok(30));
        assert_eq!(days_in_range("0"), Ok(0));
        assert_eq!(days_in_range("36500"), Ok(MAX_DAYS));
        assert!(days_in_range("36501").is_err());
        assert!(days_in_range("-1").is_err());
        assert!(days_in_range("9223372036854775807").is_err());
        assert!(days_in_range("week").is_err());
    }

    #[test]
    fn test_cli_rejects_oversized_window() {
        assert!(Cli::try_parse_from(["civic-triage", "stats", "--days", "7"]).is_ok());
        assert!(Cli::try_parse_from(["civic-triage", "report", "--days", "99999999"]).is_err());
        assert!(Cli::try_parse_from(["civic-triage", "update", "3", "--public", "false"]).is_ok());
    }
}

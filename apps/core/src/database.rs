use crate::error::AppError;
use crate::models::{
    Feedback, FeedbackFilter, FeedbackHistory, FeedbackRecord, FeedbackStats, FeedbackStatus,
    FeedbackUpdate, PublicStats, TrendPoint, WeeklyTrend,
};
use crate::triage::summary::round1;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

const SECONDS_PER_DAY: i64 = 86_400;
/// Weeks of history on the public dashboard.
pub const PUBLIC_TREND_WEEKS: i64 = 12;
/// Stored spam scores above this count as potential spam in statistics.
pub const POTENTIAL_SPAM_SCORE: f64 = 0.7;

const FEEDBACK_COLUMNS: &str = "id, submitter, title, description, category, severity, status, \
     ai_response, official_response, spam_confidence, priority_score, location_detail, \
     created_at, updated_at, resolved_at, is_deleted, is_public";

/// Open (creating if needed) the database at `db_url` and apply migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool, AppError> {
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database lives and dies with its single connection.
    let pool_options = if db_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}

/// Start of a window reaching `days` back from now. Huge windows saturate
/// instead of overflowing, so they simply cover every row.
fn cutoff(days: i64) -> i64 {
    Utc::now()
        .timestamp()
        .saturating_sub(days.max(0).saturating_mul(SECONDS_PER_DAY))
}

fn check_unit_range(field: &str, value: Option<f64>) -> Result<(), AppError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(AppError::Validation(format!(
            "{field} must be between 0 and 1, got {v}"
        ))),
        _ => Ok(()),
    }
}

// --- Feedback CRUD ---

pub async fn insert_feedback(
    pool: &SqlitePool,
    record: &FeedbackRecord,
) -> Result<Feedback, sqlx::Error> {
    let now = Utc::now().timestamp();

    let feedback = sqlx::query_as::<_, Feedback>(&format!(
        r#"
        INSERT INTO feedback (submitter, title, description, category, severity, ai_response,
                              spam_confidence, priority_score, location_detail, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {FEEDBACK_COLUMNS}
        "#
    ))
    .bind(&record.submitter)
    .bind(&record.title)
    .bind(&record.description)
    .bind(record.category.label())
    .bind(record.severity.label())
    .bind(&record.ai_response)
    .bind(record.spam_confidence)
    .bind(record.priority_score)
    .bind(&record.location_detail)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    debug!(id = feedback.id, "feedback stored");
    Ok(feedback)
}

/// Fetch a live report; soft-deleted reports are invisible.
pub async fn get_feedback(pool: &SqlitePool, id: i64) -> Result<Option<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ? AND is_deleted = 0"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Administrator queue, highest priority first, then newest.
pub async fn list_feedback(
    pool: &SqlitePool,
    filter: &FeedbackFilter,
) -> Result<Vec<Feedback>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE 1 = 1"));

    if !filter.include_deleted {
        query.push(" AND is_deleted = 0");
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.label());
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category.label());
    }
    if let Some(severity) = filter.severity {
        query.push(" AND severity = ").push_bind(severity.label());
    }
    query.push(" ORDER BY priority_score DESC, created_at DESC, id DESC");

    query.build_query_as::<Feedback>().fetch_all(pool).await
}

pub async fn list_submitter_feedback(
    pool: &SqlitePool,
    submitter: &str,
) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(&format!(
        r#"
        SELECT {FEEDBACK_COLUMNS} FROM feedback
        WHERE submitter = ? AND is_deleted = 0
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(submitter)
    .fetch_all(pool)
    .await
}

/// Number of live reports filed by `submitter`.
pub async fn count_submitter_feedback(
    pool: &SqlitePool,
    submitter: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE submitter = ? AND is_deleted = 0")
        .bind(submitter)
        .fetch_one(pool)
        .await
}

/// Number of live reports at exactly `location` (case-insensitive).
pub async fn count_location_reports(pool: &SqlitePool, location: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM feedback WHERE location_detail = ? COLLATE NOCASE AND is_deleted = 0",
    )
    .bind(location.trim())
    .fetch_one(pool)
    .await
}

/// One audit row to write alongside an update.
struct FieldChange {
    field: &'static str,
    old: Option<String>,
    new: Option<String>,
}

fn collect_changes(current: &Feedback, update: &FeedbackUpdate) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if let Some(status) = update.status {
        changes.push(FieldChange {
            field: "status",
            old: Some(current.status.clone()),
            new: Some(status.label().to_string()),
        });
    }
    if let Some(response) = &update.official_response {
        changes.push(FieldChange {
            field: "official_response",
            old: current.official_response.clone(),
            new: Some(response.clone()),
        });
    }
    if let Some(response) = &update.ai_response {
        changes.push(FieldChange {
            field: "ai_response",
            old: current.ai_response.clone(),
            new: Some(response.clone()),
        });
    }
    if let Some(category) = update.category {
        changes.push(FieldChange {
            field: "category",
            old: current.category.clone(),
            new: Some(category.label().to_string()),
        });
    }
    if let Some(severity) = update.severity {
        changes.push(FieldChange {
            field: "severity",
            old: current.severity.clone(),
            new: Some(severity.label().to_string()),
        });
    }
    if let Some(score) = update.priority_score {
        changes.push(FieldChange {
            field: "priority_score",
            old: Some(current.priority_score.to_string()),
            new: Some(score.to_string()),
        });
    }
    if let Some(score) = update.spam_confidence {
        changes.push(FieldChange {
            field: "spam_confidence",
            old: Some(current.spam_confidence.to_string()),
            new: Some(score.to_string()),
        });
    }
    if let Some(public) = update.is_public {
        changes.push(FieldChange {
            field: "is_public",
            old: Some(current.is_public.to_string()),
            new: Some(public.to_string()),
        });
    }

    changes
}

/// Apply an administrative change and record one history row per field,
/// all in one transaction. Moving to `Resolved` stamps `resolved_at`.
pub async fn apply_update(
    pool: &SqlitePool,
    id: i64,
    update: &FeedbackUpdate,
    changed_by: &str,
) -> Result<Feedback, AppError> {
    if update.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }
    check_unit_range("priority_score", update.priority_score)?;
    check_unit_range("spam_confidence", update.spam_confidence)?;

    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Feedback>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ? AND is_deleted = 0"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("feedback {id}")))?;

    let now = Utc::now().timestamp();
    let changes = collect_changes(&current, update);

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE feedback SET updated_at = ");
    query.push_bind(now);
    if let Some(status) = update.status {
        query.push(", status = ").push_bind(status.label());
        if status == FeedbackStatus::Resolved {
            query.push(", resolved_at = ").push_bind(now);
        }
    }
    if let Some(response) = &update.official_response {
        query.push(", official_response = ").push_bind(response.clone());
    }
    if let Some(response) = &update.ai_response {
        query.push(", ai_response = ").push_bind(response.clone());
    }
    if let Some(category) = update.category {
        query.push(", category = ").push_bind(category.label());
    }
    if let Some(severity) = update.severity {
        query.push(", severity = ").push_bind(severity.label());
    }
    if let Some(score) = update.priority_score {
        query.push(", priority_score = ").push_bind(score);
    }
    if let Some(score) = update.spam_confidence {
        query.push(", spam_confidence = ").push_bind(score);
    }
    if let Some(public) = update.is_public {
        query.push(", is_public = ").push_bind(public);
    }
    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(&mut *tx).await?;

    for change in &changes {
        sqlx::query(
            r#"
            INSERT INTO feedback_history (feedback_id, changed_by, field_name, old_value, new_value, change_reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(changed_by)
        .bind(change.field)
        .bind(&change.old)
        .bind(&change.new)
        .bind(&update.change_reason)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    let updated = sqlx::query_as::<_, Feedback>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?"
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(id, fields = changes.len(), changed_by, "feedback updated");
    Ok(updated)
}

pub async fn get_feedback_history(
    pool: &SqlitePool,
    feedback_id: i64,
) -> Result<Vec<FeedbackHistory>, sqlx::Error> {
    sqlx::query_as::<_, FeedbackHistory>(
        r#"
        SELECT id, feedback_id, changed_by, field_name, old_value, new_value, change_reason, created_at
        FROM feedback_history
        WHERE feedback_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(feedback_id)
    .fetch_all(pool)
    .await
}

/// Soft delete; only the original submitter may delete. Returns whether a row changed.
pub async fn soft_delete_feedback(
    pool: &SqlitePool,
    id: i64,
    submitter: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE feedback SET is_deleted = 1, updated_at = ? WHERE id = ? AND submitter = ? AND is_deleted = 0",
    )
    .bind(Utc::now().timestamp())
    .bind(id)
    .bind(submitter)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// --- Reporting ---

async fn grouped_counts(
    pool: &SqlitePool,
    column: &str,
) -> Result<std::collections::BTreeMap<String, i64>, sqlx::Error> {
    let rows: Vec<(String, i64)> = sqlx::query_as(&format!(
        "SELECT {column}, COUNT(*) FROM feedback WHERE {column} IS NOT NULL AND is_deleted = 0 GROUP BY {column}"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Dashboard statistics; `days` bounds the "recent" count only.
pub async fn feedback_stats(pool: &SqlitePool, days: i64) -> Result<FeedbackStats, sqlx::Error> {
    let total_feedback: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE is_deleted = 0")
        .fetch_one(pool)
        .await?;

    let recent_feedback: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE created_at >= ? AND is_deleted = 0")
            .bind(cutoff(days))
            .fetch_one(pool)
            .await?;

    let category_stats = grouped_counts(pool, "category").await?;
    let severity_stats = grouped_counts(pool, "severity").await?;
    let status_stats = grouped_counts(pool, "status").await?;

    let resolved = status_stats
        .get(FeedbackStatus::Resolved.label())
        .copied()
        .unwrap_or(0);
    let resolution_rate = if total_feedback > 0 {
        round1(resolved as f64 / total_feedback as f64 * 100.0)
    } else {
        0.0
    };

    let avg_resolution_hours: Option<f64> = sqlx::query_scalar(
        "SELECT AVG((resolved_at - created_at) / 3600.0) FROM feedback WHERE resolved_at IS NOT NULL AND is_deleted = 0",
    )
    .fetch_one(pool)
    .await?;

    let potential_spam: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM feedback WHERE spam_confidence > ? AND is_deleted = 0",
    )
    .bind(POTENTIAL_SPAM_SCORE)
    .fetch_one(pool)
    .await?;

    Ok(FeedbackStats {
        total_feedback,
        recent_feedback,
        category_stats,
        severity_stats,
        status_stats,
        resolution_rate,
        avg_resolution_hours: round1(avg_resolution_hours.unwrap_or(0.0)),
        potential_spam,
    })
}

/// Submissions and resolutions per UTC day over the last `days` days.
pub async fn trend_data(pool: &SqlitePool, days: i64) -> Result<Vec<TrendPoint>, sqlx::Error> {
    sqlx::query_as::<_, TrendPoint>(
        r#"
        SELECT date(created_at, 'unixepoch') AS date,
               COUNT(*) AS count,
               SUM(CASE WHEN status = 'Resolved' THEN 1 ELSE 0 END) AS resolved
        FROM feedback
        WHERE created_at >= ? AND is_deleted = 0
        GROUP BY date(created_at, 'unixepoch')
        ORDER BY date
        "#,
    )
    .bind(cutoff(days))
    .fetch_all(pool)
    .await
}

pub async fn feedback_since(pool: &SqlitePool, days: i64) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(&format!(
        r#"
        SELECT {FEEDBACK_COLUMNS} FROM feedback
        WHERE created_at >= ? AND is_deleted = 0
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(cutoff(days))
    .fetch_all(pool)
    .await
}

/// Live reports with a spam score strictly above `min_score`, most suspicious first.
pub async fn spam_candidates(
    pool: &SqlitePool,
    min_score: f64,
) -> Result<Vec<Feedback>, sqlx::Error> {
    sqlx::query_as::<_, Feedback>(&format!(
        r#"
        SELECT {FEEDBACK_COLUMNS} FROM feedback
        WHERE spam_confidence > ? AND is_deleted = 0
        ORDER BY spam_confidence DESC, id ASC
        "#
    ))
    .bind(min_score)
    .fetch_all(pool)
    .await
}

/// Transparency figures over public, live reports.
pub async fn public_stats(pool: &SqlitePool) -> Result<PublicStats, sqlx::Error> {
    let (total_issues, resolved_issues, in_progress_issues, pending_issues): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(CASE WHEN status = 'Resolved' THEN 1 END),
                   COUNT(CASE WHEN status = 'In Progress' THEN 1 END),
                   COUNT(CASE WHEN status = 'Pending' THEN 1 END)
            FROM feedback
            WHERE is_public = 1 AND is_deleted = 0
            "#,
        )
        .fetch_one(pool)
        .await?;

    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT category, COUNT(*) FROM feedback
        WHERE is_public = 1 AND is_deleted = 0 AND category IS NOT NULL
        GROUP BY category
        "#,
    )
    .fetch_all(pool)
    .await?;

    let weekly_trends = sqlx::query_as::<_, WeeklyTrend>(
        r#"
        SELECT strftime('%Y-%W', created_at, 'unixepoch') AS week,
               COUNT(*) AS submitted,
               COUNT(CASE WHEN status = 'Resolved' THEN 1 END) AS resolved
        FROM feedback
        WHERE is_public = 1 AND is_deleted = 0 AND created_at >= ?
        GROUP BY week
        ORDER BY week
        "#,
    )
    .bind(cutoff(PUBLIC_TREND_WEEKS * 7))
    .fetch_all(pool)
    .await?;

    let resolution_rate = if total_issues > 0 {
        round1(resolved_issues as f64 / total_issues as f64 * 100.0)
    } else {
        0.0
    };

    debug!(total_issues, weeks = weekly_trends.len(), "public stats computed");

    Ok(PublicStats {
        total_issues,
        resolved_issues,
        in_progress_issues,
        pending_issues,
        resolution_rate,
        category_distribution: rows.into_iter().collect(),
        weekly_trends,
    })
}

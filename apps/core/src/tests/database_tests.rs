//! Database Module Tests
//!
//! Store operations: CRUD, filtering, audit history and reporting queries.

use crate::database;
use crate::error::AppError;
use crate::models::{FeedbackFilter, FeedbackRecord, FeedbackStatus, FeedbackUpdate};
use crate::triage::{Category, Severity};
use chrono::Utc;
use sqlx::sqlite::SqlitePool;

/// Create a fresh in-memory database with migrations applied
pub async fn create_test_pool() -> SqlitePool {
    database::init_db("sqlite::memory:")
        .await
        .expect("Failed to create test pool")
}

pub fn record(submitter: &str, title: &str, category: Category, severity: Severity) -> FeedbackRecord {
    FeedbackRecord {
        submitter: submitter.to_string(),
        title: title.to_string(),
        description: format!("{title} description"),
        category,
        severity,
        ai_response: "Thank you for your report.".to_string(),
        spam_confidence: 0.0,
        priority_score: 0.5,
        location_detail: None,
    }
}

#[cfg(test)]
mod crud_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = create_test_pool().await;

        let mut new = record("a@example.com", "Leak", Category::Water, Severity::High);
        new.location_detail = Some("Main St".into());
        let stored = database::insert_feedback(&pool, &new)
            .await
            .expect("Failed to insert feedback");

        assert!(stored.id > 0);
        assert_eq!(stored.status, "Pending");
        assert_eq!(stored.category(), Some(Category::Water));
        assert_eq!(stored.severity(), Some(Severity::High));
        assert_eq!(stored.status(), Some(FeedbackStatus::Pending));
        assert!(!stored.is_deleted);
        assert!(stored.is_public);
        assert!(stored.resolved_at.is_none());

        let fetched = database::get_feedback(&pool, stored.id)
            .await
            .unwrap()
            .expect("feedback should exist");
        assert_eq!(fetched.title, "Leak");
        assert_eq!(fetched.location_detail.as_deref(), Some("Main St"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let pool = create_test_pool().await;
        assert!(database::get_feedback(&pool, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ordering_and_filters() {
        let pool = create_test_pool().await;

        let mut low = record("a@example.com", "Low", Category::Other, Severity::Low);
        low.priority_score = 0.1;
        let mut high = record("b@example.com", "High", Category::Safety, Severity::High);
        high.priority_score = 0.9;
        let mut mid = record("a@example.com", "Mid", Category::Safety, Severity::Medium);
        mid.priority_score = 0.5;

        for r in [&low, &high, &mid] {
            database::insert_feedback(&pool, r).await.unwrap();
        }

        let all = database::list_feedback(&pool, &FeedbackFilter::default())
            .await
            .unwrap();
        let titles: Vec<&str> = all.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["High", "Mid", "Low"]);

        let safety = database::list_feedback(
            &pool,
            &FeedbackFilter {
                category: Some(Category::Safety),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(safety.len(), 2);

        let medium_safety = database::list_feedback(
            &pool,
            &FeedbackFilter {
                category: Some(Category::Safety),
                severity: Some(Severity::Medium),
                status: Some(FeedbackStatus::Pending),
                include_deleted: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(medium_safety.len(), 1);
        assert_eq!(medium_safety[0].title, "Mid");
    }

    #[tokio::test]
    async fn test_counters() {
        let pool = create_test_pool().await;

        let mut first = record("a@example.com", "One", Category::Traffic, Severity::Low);
        first.location_detail = Some("Main St".into());
        let mut second = record("a@example.com", "Two", Category::Traffic, Severity::Low);
        second.location_detail = Some("main st".into());
        let third = record("b@example.com", "Three", Category::Traffic, Severity::Low);

        for r in [&first, &second, &third] {
            database::insert_feedback(&pool, r).await.unwrap();
        }

        assert_eq!(
            database::count_submitter_feedback(&pool, "a@example.com").await.unwrap(),
            2
        );
        assert_eq!(
            database::count_location_reports(&pool, "MAIN ST").await.unwrap(),
            2
        );
        assert_eq!(
            database::count_location_reports(&pool, "Elm St").await.unwrap(),
            0
        );
        assert_eq!(
            database::list_submitter_feedback(&pool, "b@example.com")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_soft_delete_only_by_submitter() {
        let pool = create_test_pool().await;
        let stored = database::insert_feedback(
            &pool,
            &record("a@example.com", "Mine", Category::Other, Severity::Low),
        )
        .await
        .unwrap();

        assert!(!database::soft_delete_feedback(&pool, stored.id, "b@example.com")
            .await
            .unwrap());
        assert!(database::soft_delete_feedback(&pool, stored.id, "a@example.com")
            .await
            .unwrap());
        // Second delete is a no-op
        assert!(!database::soft_delete_feedback(&pool, stored.id, "a@example.com")
            .await
            .unwrap());

        assert!(database::get_feedback(&pool, stored.id).await.unwrap().is_none());
        assert!(database::list_feedback(&pool, &FeedbackFilter::default())
            .await
            .unwrap()
            .is_empty());
        let with_deleted = database::list_feedback(
            &pool,
            &FeedbackFilter {
                include_deleted: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(with_deleted.len(), 1);
        assert!(with_deleted[0].is_deleted);
        assert_eq!(
            database::count_submitter_feedback(&pool, "a@example.com").await.unwrap(),
            0
        );
    }
}

#[cfg(test)]
mod update_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_records_history() {
        let pool = create_test_pool().await;
        let stored = database::insert_feedback(
            &pool,
            &record("a@example.com", "Leak", Category::Water, Severity::Medium),
        )
        .await
        .unwrap();

        let update = FeedbackUpdate {
            status: Some(FeedbackStatus::InProgress),
            official_response: Some("Crew dispatched".into()),
            change_reason: Some("triaged".into()),
            ..Default::default()
        };
        let updated = database::apply_update(&pool, stored.id, &update, "admin")
            .await
            .unwrap();

        assert_eq!(updated.status(), Some(FeedbackStatus::InProgress));
        assert_eq!(updated.official_response.as_deref(), Some("Crew dispatched"));
        assert!(updated.resolved_at.is_none());

        let history = database::get_feedback_history(&pool, stored.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].field_name, "status");
        assert_eq!(history[0].old_value.as_deref(), Some("Pending"));
        assert_eq!(history[0].new_value.as_deref(), Some("In Progress"));
        assert_eq!(history[0].changed_by, "admin");
        assert_eq!(history[0].change_reason.as_deref(), Some("triaged"));
        assert_eq!(history[1].field_name, "official_response");
        assert_eq!(history[1].old_value, None);
    }

    #[tokio::test]
    async fn test_resolving_sets_resolved_at() {
        let pool = create_test_pool().await;
        let stored = database::insert_feedback(
            &pool,
            &record("a@example.com", "Leak", Category::Water, Severity::Medium),
        )
        .await
        .unwrap();

        let update = FeedbackUpdate {
            status: Some(FeedbackStatus::Resolved),
            ..Default::default()
        };
        let updated = database::apply_update(&pool, stored.id, &update, "admin")
            .await
            .unwrap();

        let resolved_at = updated.resolved_at.expect("resolved_at should be set");
        assert!(resolved_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let pool = create_test_pool().await;

        let update = FeedbackUpdate {
            status: Some(FeedbackStatus::Resolved),
            ..Default::default()
        };
        let missing = database::apply_update(&pool, 99, &update, "admin").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let stored = database::insert_feedback(
            &pool,
            &record("a@example.com", "Leak", Category::Water, Severity::Medium),
        )
        .await
        .unwrap();
        let empty = database::apply_update(&pool, stored.id, &FeedbackUpdate::default(), "admin").await;
        assert!(matches!(empty, Err(AppError::Validation(_))));
        assert!(database::get_feedback_history(&pool, stored.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_scores_must_stay_in_unit_range() {
        let pool = create_test_pool().await;
        let stored = database::insert_feedback(
            &pool,
            &record("a@example.com", "Leak", Category::Water, Severity::Medium),
        )
        .await
        .unwrap();

        for update in [
            FeedbackUpdate {
                priority_score: Some(1.5),
                ..Default::default()
            },
            FeedbackUpdate {
                spam_confidence: Some(-0.1),
                ..Default::default()
            },
            FeedbackUpdate {
                spam_confidence: Some(f64::NAN),
                ..Default::default()
            },
        ] {
            let result = database::apply_update(&pool, stored.id, &update, "admin").await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{update:?}");
        }

        // The schema rejects out-of-range scores written around the store API
        let raw = sqlx::query("UPDATE feedback SET priority_score = 2.0 WHERE id = ?")
            .bind(stored.id)
            .execute(&pool)
            .await;
        assert!(raw.is_err());

        let unchanged = database::get_feedback(&pool, stored.id).await.unwrap().unwrap();
        assert_eq!(unchanged.priority_score, 0.5);
        assert_eq!(unchanged.spam_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_visibility_change_is_audited() {
        let pool = create_test_pool().await;
        let stored = database::insert_feedback(
            &pool,
            &record("a@example.com", "Leak", Category::Water, Severity::Medium),
        )
        .await
        .unwrap();

        let update = FeedbackUpdate {
            is_public: Some(false),
            ..Default::default()
        };
        let hidden = database::apply_update(&pool, stored.id, &update, "admin").await.unwrap();
        assert!(!hidden.is_public);

        let history = database::get_feedback_history(&pool, stored.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field_name, "is_public");
        assert_eq!(history[0].old_value.as_deref(), Some("true"));
        assert_eq!(history[0].new_value.as_deref(), Some("false"));
    }
}

#[cfg(test)]
mod reporting_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats() {
        let pool = create_test_pool().await;

        let mut spam = record("s@example.com", "Spam", Category::Other, Severity::Low);
        spam.spam_confidence = 0.9;
        let mut maybe = record("m@example.com", "Maybe", Category::Other, Severity::Low);
        maybe.spam_confidence = 0.4;
        let water = record("w@example.com", "Water", Category::Water, Severity::High);
        let traffic = record("t@example.com", "Traffic", Category::Traffic, Severity::Medium);

        let mut ids = Vec::new();
        for r in [&spam, &maybe, &water, &traffic] {
            ids.push(database::insert_feedback(&pool, r).await.unwrap().id);
        }
        database::apply_update(
            &pool,
            ids[2],
            &FeedbackUpdate {
                status: Some(FeedbackStatus::Resolved),
                ..Default::default()
            },
            "admin",
        )
        .await
        .unwrap();

        let stats = database::feedback_stats(&pool, 30).await.unwrap();
        assert_eq!(stats.total_feedback, 4);
        assert_eq!(stats.recent_feedback, 4);
        assert_eq!(stats.category_stats.get("Other"), Some(&2));
        assert_eq!(stats.severity_stats.get("High"), Some(&1));
        assert_eq!(stats.status_stats.get("Resolved"), Some(&1));
        assert_eq!(stats.status_stats.get("Pending"), Some(&3));
        assert_eq!(stats.resolution_rate, 25.0);
        assert_eq!(stats.potential_spam, 1);
        assert!(stats.avg_resolution_hours >= 0.0);

        let candidates = database::spam_candidates(&pool, 0.3).await.unwrap();
        let titles: Vec<&str> = candidates.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Spam", "Maybe"]);
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let pool = create_test_pool().await;
        let stats = database::feedback_stats(&pool, 30).await.unwrap();
        assert_eq!(stats.total_feedback, 0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert_eq!(stats.avg_resolution_hours, 0.0);
        assert!(stats.category_stats.is_empty());
    }

    #[tokio::test]
    async fn test_trends_and_window() {
        let pool = create_test_pool().await;

        let recent = database::insert_feedback(
            &pool,
            &record("a@example.com", "Recent", Category::Traffic, Severity::Low),
        )
        .await
        .unwrap();
        let old = database::insert_feedback(
            &pool,
            &record("a@example.com", "Old", Category::Traffic, Severity::Low),
        )
        .await
        .unwrap();

        // Backdate one report by 40 days
        let forty_days_ago = Utc::now().timestamp() - 40 * 86_400;
        sqlx::query("UPDATE feedback SET created_at = ? WHERE id = ?")
            .bind(forty_days_ago)
            .bind(old.id)
            .execute(&pool)
            .await
            .unwrap();

        let trends = database::trend_data(&pool, 30).await.unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].count, 1);
        assert_eq!(trends[0].resolved, 0);
        assert_eq!(trends[0].date, Utc::now().format("%Y-%m-%d").to_string());

        let week = database::feedback_since(&pool, 7).await.unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week[0].id, recent.id);

        let stats = database::feedback_stats(&pool, 30).await.unwrap();
        assert_eq!(stats.total_feedback, 2);
        assert_eq!(stats.recent_feedback, 1);
    }

    #[tokio::test]
    async fn test_huge_windows_cover_everything() {
        let pool = create_test_pool().await;
        database::insert_feedback(
            &pool,
            &record("a@example.com", "Recent", Category::Traffic, Severity::Low),
        )
        .await
        .unwrap();

        let stats = database::feedback_stats(&pool, i64::MAX).await.unwrap();
        assert_eq!(stats.recent_feedback, 1);
        assert_eq!(database::trend_data(&pool, i64::MAX).await.unwrap().len(), 1);
        assert_eq!(database::feedback_since(&pool, i64::MAX).await.unwrap().len(), 1);

        // Negative windows behave like an empty look-back
        let stats = database::feedback_stats(&pool, i64::MIN).await.unwrap();
        assert_eq!(stats.total_feedback, 1);
    }

    #[tokio::test]
    async fn test_public_stats() {
        let pool = create_test_pool().await;

        let mut ids = Vec::new();
        for (title, category) in [
            ("Pothole", Category::Traffic),
            ("Jam", Category::Traffic),
            ("Leak", Category::Water),
            ("Hidden", Category::Safety),
            ("Gone", Category::Sanitation),
        ] {
            let stored = database::insert_feedback(
                &pool,
                &record("a@example.com", title, category, Severity::Medium),
            )
            .await
            .unwrap();
            ids.push(stored.id);
        }

        let resolve = FeedbackUpdate {
            status: Some(FeedbackStatus::Resolved),
            ..Default::default()
        };
        database::apply_update(&pool, ids[0], &resolve, "admin").await.unwrap();
        let progress = FeedbackUpdate {
            status: Some(FeedbackStatus::InProgress),
            ..Default::default()
        };
        database::apply_update(&pool, ids[1], &progress, "admin").await.unwrap();
        let hide = FeedbackUpdate {
            is_public: Some(false),
            ..Default::default()
        };
        database::apply_update(&pool, ids[3], &hide, "admin").await.unwrap();
        assert!(database::soft_delete_feedback(&pool, ids[4], "a@example.com")
            .await
            .unwrap());

        // A public report older than the trend window still counts in the totals
        let mut old = record("b@example.com", "Old", Category::Water, Severity::Low);
        old.location_detail = Some("Harbour".into());
        let old = database::insert_feedback(&pool, &old).await.unwrap();
        sqlx::query("UPDATE feedback SET created_at = ? WHERE id = ?")
            .bind(Utc::now().timestamp() - 100 * 86_400)
            .bind(old.id)
            .execute(&pool)
            .await
            .unwrap();

        let stats = database::public_stats(&pool).await.unwrap();
        assert_eq!(stats.total_issues, 4);
        assert_eq!(stats.resolved_issues, 1);
        assert_eq!(stats.in_progress_issues, 1);
        assert_eq!(stats.pending_issues, 2);
        assert_eq!(stats.resolution_rate, 25.0);
        assert_eq!(stats.category_distribution.get("Traffic"), Some(&2));
        assert_eq!(stats.category_distribution.get("Water"), Some(&2));
        assert!(!stats.category_distribution.contains_key("Safety"));
        assert!(!stats.category_distribution.contains_key("Sanitation"));

        assert_eq!(stats.weekly_trends.len(), 1);
        let week = &stats.weekly_trends[0];
        assert_eq!(week.week, Utc::now().format("%Y-%W").to_string());
        assert_eq!(week.submitted, 3);
        assert_eq!(week.resolved, 1);
    }

    #[tokio::test]
    async fn test_public_stats_empty() {
        let pool = create_test_pool().await;
        let stats = database::public_stats(&pool).await.unwrap();
        assert_eq!(stats.total_issues, 0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert!(stats.category_distribution.is_empty());
        assert!(stats.weekly_trends.is_empty());
    }
}

//! Session lifecycle and daily analytics tests

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use studygenius::db;
use studygenius::models::study_session::{ActivityUpdateDto, EndSessionDto};
use studygenius::models::{daily_analytics, study_session};
use studygenius::services::{analytics_service, session_service, stats_service, ServiceError};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// In-memory session model for exercising the analytics fold directly
fn session_fixture(started_at: &str, duration: i32, pages: i32, focus: f64) -> study_session::Model {
    study_session::Model {
        id: 0,
        user_id: 1,
        document_id: None,
        started_at: started_at.to_string(),
        ended_at: Some(started_at.to_string()),
        total_duration_seconds: duration,
        active_reading_seconds: duration,
        break_time_seconds: 0,
        pages_covered: pages,
        tab_switches: 0,
        app_minimized_count: 0,
        inactivity_periods: 0,
        focus_events: 0,
        focus_score: focus,
        completion_status: "completed".to_string(),
        created_at: started_at.to_string(),
        updated_at: started_at.to_string(),
    }
}

#[tokio::test]
async fn test_session_lifecycle() {
    let db = setup_test_db().await;

    let session = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    assert_eq!(session.completion_status, "active");
    assert!(session.ended_at.is_none());

    let session = session_service::update_activity(
        &db,
        session.id,
        ActivityUpdateDto {
            tab_switches: Some(2),
            pages_covered: Some(3),
            active_reading_seconds: Some(180),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to update activity");
    assert_eq!(session.tab_switches, 2);
    assert_eq!(session.pages_covered, 3);
    assert_eq!(session.active_reading_seconds, 180);
    assert!((0.1..=1.0).contains(&session.focus_score));

    let summary = session_service::end_session(
        &db,
        session.id,
        EndSessionDto {
            completion_status: Some("completed".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to end session");

    assert_eq!(summary.session.completion_status, "completed");
    assert!(summary.session.ended_at.is_some());
    assert_eq!(summary.daily.study_sessions_count, 1);
    assert_eq!(summary.stats.total_study_sessions, 1);
}

#[tokio::test]
async fn test_second_start_abandons_the_stale_session() {
    let db = setup_test_db().await;

    let first = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    let second = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    assert_ne!(first.id, second.id);

    let stale = study_session::Entity::find_by_id(first.id)
        .one(&db)
        .await
        .expect("Failed to fetch session")
        .expect("Session not found");
    assert_eq!(stale.completion_status, "abandoned");
    assert!(stale.ended_at.is_some());

    // Only the new session is live
    let active = session_service::find_active(&db, 1)
        .await
        .expect("Failed to query active session")
        .expect("Expected an active session");
    assert_eq!(active.id, second.id);

    // Abandoning a stale session is not a completed session: no stats fold
    let stats = stats_service::get_or_create(&db, 1).await.unwrap();
    assert_eq!(stats.total_study_sessions, 0);
}

#[tokio::test]
async fn test_ending_twice_is_an_invalid_state() {
    let db = setup_test_db().await;

    let session = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    session_service::end_session(&db, session.id, EndSessionDto::default())
        .await
        .expect("Failed to end session");

    let err = session_service::end_session(&db, session.id, EndSessionDto::default())
        .await
        .expect_err("Expected invalid state");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn test_unknown_completion_status_is_recorded_as_completed() {
    let db = setup_test_db().await;

    let session = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    let summary = session_service::end_session(
        &db,
        session.id,
        EndSessionDto {
            completion_status: Some("paused".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to end session");

    assert_eq!(summary.session.completion_status, "completed");
}

#[tokio::test]
async fn test_activity_on_an_ended_session_fails() {
    let db = setup_test_db().await;

    let session = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    session_service::end_session(&db, session.id, EndSessionDto::default())
        .await
        .expect("Failed to end session");

    let err = session_service::update_activity(&db, session.id, ActivityUpdateDto::default())
        .await
        .expect_err("Expected invalid state");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn test_daily_fold_accumulates_two_sessions() {
    let db = setup_test_db().await;

    let morning = session_fixture("2026-08-07 09:10:00", 1200, 10, 0.9);
    let evening = session_fixture("2026-08-07 20:00:00", 600, 5, 0.7);

    analytics_service::fold_session(&db, 1, &morning)
        .await
        .expect("Failed to fold session");
    let day = analytics_service::fold_session(&db, 1, &evening)
        .await
        .expect("Failed to fold session");

    assert_eq!(day.date, "2026-08-07");
    assert_eq!(day.total_pages_read, 15);
    assert_eq!(day.total_time_seconds, 1800);
    assert_eq!(day.study_sessions_count, 2);
    // Running mean equals the arithmetic mean of the two scores
    assert!((day.focus_score_average - 0.8).abs() < 1e-9);
    assert_eq!(day.morning_minutes, 20);
    assert_eq!(day.evening_minutes, 10);
    assert_eq!(day.afternoon_minutes, 0);
    assert_eq!(day.night_minutes, 0);

    // Still a single row for the day
    let rows = daily_analytics::Entity::find()
        .filter(daily_analytics::Column::UserId.eq(1))
        .all(&db)
        .await
        .expect("Failed to list analytics");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_days_do_not_bleed_into_each_other() {
    let db = setup_test_db().await;

    analytics_service::fold_session(&db, 1, &session_fixture("2026-08-06 22:30:00", 600, 4, 1.0))
        .await
        .expect("Failed to fold session");
    analytics_service::fold_session(&db, 1, &session_fixture("2026-08-07 08:00:00", 600, 6, 0.5))
        .await
        .expect("Failed to fold session");

    let days = analytics_service::range(&db, 1, Some("2026-08-01"), Some("2026-08-31"))
        .await
        .expect("Failed to query range");
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, "2026-08-06");
    assert_eq!(days[0].night_minutes, 10);
    assert_eq!(days[1].date, "2026-08-07");
    assert_eq!(days[1].morning_minutes, 10);
}

#[tokio::test]
async fn test_end_session_folds_stats_and_awards() {
    let db = setup_test_db().await;

    let session = session_service::start_session(&db, 1, None)
        .await
        .expect("Failed to start session");
    let summary = session_service::end_session(
        &db,
        session.id,
        EndSessionDto {
            completion_status: Some("completed".to_string()),
            pages_covered: Some(4),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to end session");

    // First completed sprint earns the starter achievement and its XP
    assert!(summary
        .newly_earned
        .iter()
        .any(|earned| earned.achievement.code == "sprint_starter"));
    assert_eq!(summary.stats.total_xp_points, 50);
    assert_eq!(summary.stats.current_level, 1);
}

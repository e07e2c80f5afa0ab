//! Study session lifecycle: start, activity pings, end.
//!
//! Ending a session is the moment the rest of the engine fires: the stats
//! aggregate folds the session in, the daily rollup is updated, and the
//! achievement catalog is swept once.

use chrono::{NaiveDateTime, Utc};
use sea_orm::*;
use serde::Serialize;

use crate::models::study_session::{self, ActivityUpdateDto, EndSessionDto};
use crate::models::{daily_analytics, user_stats};
use crate::services::achievement_service::EarnedAchievement;
use crate::services::focus::{self, ActivitySignals, PerformanceSummary};
use crate::services::{achievement_service, analytics_service, stats_service, ServiceError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const KNOWN_STATUSES: [&str; 3] = ["completed", "interrupted", "abandoned"];

pub async fn find_active(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<study_session::Model>, ServiceError> {
    Ok(study_session::Entity::find()
        .filter(study_session::Column::UserId.eq(user_id))
        .filter(study_session::Column::EndedAt.is_null())
        .one(db)
        .await?)
}

/// Open a new session. At most one session per user may be live; a leftover
/// active session means the client died mid-session, so it is closed as
/// abandoned first (without the completed-session side effects).
pub async fn start_session(
    db: &DatabaseConnection,
    user_id: i32,
    document_id: Option<i32>,
) -> Result<study_session::Model, ServiceError> {
    if let Some(stale) = find_active(db, user_id).await? {
        tracing::warn!(
            "Abandoning stale session {} before starting a new one for user {}",
            stale.id,
            user_id
        );
        finalize(db, stale, "abandoned", None, None).await?;
    }

    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let session = study_session::ActiveModel {
        user_id: Set(user_id),
        document_id: Set(document_id),
        started_at: Set(now.clone()),
        ended_at: Set(None),
        total_duration_seconds: Set(0),
        active_reading_seconds: Set(0),
        break_time_seconds: Set(0),
        pages_covered: Set(0),
        tab_switches: Set(0),
        app_minimized_count: Set(0),
        inactivity_periods: Set(0),
        focus_events: Set(0),
        focus_score: Set(1.0),
        completion_status: Set("active".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(session.insert(db).await?)
}

/// Apply an activity ping: accumulate counter deltas and refresh the live
/// focus score against the elapsed time.
pub async fn update_activity(
    db: &DatabaseConnection,
    session_id: i32,
    update: ActivityUpdateDto,
) -> Result<study_session::Model, ServiceError> {
    let session = study_session::Entity::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    if session.ended_at.is_some() {
        return Err(ServiceError::InvalidState(
            "session has already ended".to_string(),
        ));
    }

    let tab_switches = session.tab_switches + update.tab_switches.unwrap_or(0).max(0);
    let app_minimized_count =
        session.app_minimized_count + update.app_minimized_count.unwrap_or(0).max(0);
    let inactivity_periods =
        session.inactivity_periods + update.inactivity_periods.unwrap_or(0).max(0);
    let focus_events = session.focus_events + update.focus_events.unwrap_or(0).max(0);
    let pages_covered = session.pages_covered + update.pages_covered.unwrap_or(0).max(0);
    let active_reading_seconds =
        session.active_reading_seconds + update.active_reading_seconds.unwrap_or(0).max(0);

    let elapsed = elapsed_seconds(&session.started_at);
    let score = focus::focus_score(
        elapsed,
        &ActivitySignals {
            tab_switches,
            app_minimized_count,
            inactivity_periods,
            focus_events,
        },
    );

    let mut active: study_session::ActiveModel = session.into();
    active.tab_switches = Set(tab_switches);
    active.app_minimized_count = Set(app_minimized_count);
    active.inactivity_periods = Set(inactivity_periods);
    active.focus_events = Set(focus_events);
    active.pages_covered = Set(pages_covered);
    active.active_reading_seconds = Set(active_reading_seconds);
    active.total_duration_seconds = Set(elapsed as i32);
    active.focus_score = Set(score);
    active.updated_at = Set(Utc::now().format(TIMESTAMP_FORMAT).to_string());
    Ok(active.update(db).await?)
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session: study_session::Model,
    pub performance: PerformanceSummary,
    pub daily: daily_analytics::Model,
    pub newly_earned: Vec<EarnedAchievement>,
    pub stats: user_stats::Model,
}

/// Close a session and run the downstream folds exactly once.
pub async fn end_session(
    db: &DatabaseConnection,
    session_id: i32,
    payload: EndSessionDto,
) -> Result<SessionSummary, ServiceError> {
    let session = study_session::Entity::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    if session.ended_at.is_some() {
        return Err(ServiceError::InvalidState(
            "session has already ended".to_string(),
        ));
    }

    let status = normalize_status(payload.completion_status);
    let session = finalize(
        db,
        session,
        &status,
        payload.active_reading_seconds,
        payload.pages_covered,
    )
    .await?;

    stats_service::apply_session_end(
        db,
        session.user_id,
        session.total_duration_seconds,
        session.focus_score,
    )
    .await?;
    let daily = analytics_service::fold_session(db, session.user_id, &session).await?;
    let newly_earned = achievement_service::evaluate(db, session.user_id).await?;
    // Re-read: achievement XP may have moved the aggregate since the fold
    let stats = stats_service::get_or_create(db, session.user_id).await?;

    Ok(SessionSummary {
        performance: focus::summarize(&session),
        session,
        daily,
        newly_earned,
        stats,
    })
}

pub async fn list_recent(
    db: &DatabaseConnection,
    user_id: i32,
    limit: u64,
) -> Result<Vec<study_session::Model>, ServiceError> {
    Ok(study_session::Entity::find()
        .filter(study_session::Column::UserId.eq(user_id))
        .order_by_desc(study_session::Column::StartedAt)
        .limit(limit)
        .all(db)
        .await?)
}

fn normalize_status(raw: Option<String>) -> String {
    match raw {
        None => "completed".to_string(),
        Some(s) if KNOWN_STATUSES.contains(&s.as_str()) => s,
        Some(s) => {
            tracing::warn!("Unknown completion status '{}', recording as completed", s);
            "completed".to_string()
        }
    }
}

async fn finalize(
    db: &DatabaseConnection,
    session: study_session::Model,
    status: &str,
    active_override: Option<i32>,
    pages_override: Option<i32>,
) -> Result<study_session::Model, ServiceError> {
    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let total = elapsed_seconds(&session.started_at) as i32;
    let active_seconds = active_override
        .unwrap_or(session.active_reading_seconds)
        .clamp(0, total.max(0));
    let score = focus::focus_score(total as i64, &ActivitySignals::from_session(&session));

    let mut active: study_session::ActiveModel = session.into();
    active.ended_at = Set(Some(now.clone()));
    active.total_duration_seconds = Set(total);
    active.active_reading_seconds = Set(active_seconds);
    active.break_time_seconds = Set((total - active_seconds).max(0));
    if let Some(pages) = pages_override {
        active.pages_covered = Set(pages.max(0));
    }
    active.focus_score = Set(score);
    active.completion_status = Set(status.to_string());
    active.updated_at = Set(now);
    Ok(active.update(db).await?)
}

fn elapsed_seconds(started_at: &str) -> i64 {
    NaiveDateTime::parse_from_str(started_at, TIMESTAMP_FORMAT)
        .map(|start| (Utc::now().naive_utc() - start).num_seconds().max(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_pass_through() {
        assert_eq!(normalize_status(Some("interrupted".to_string())), "interrupted");
        assert_eq!(normalize_status(Some("abandoned".to_string())), "abandoned");
    }

    #[test]
    fn missing_or_unknown_status_defaults_to_completed() {
        assert_eq!(normalize_status(None), "completed");
        assert_eq!(normalize_status(Some("paused".to_string())), "completed");
    }
}

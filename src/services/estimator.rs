//! Remaining-time and completion-date projection.
//!
//! The numeric core is pure and parameterized by [`EstimatorConfig`]; the
//! async wrappers feed it from `reading_progress` and `study_sessions`.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::*;
use serde::Serialize;

use crate::models::{document, reading_progress, study_session};
use crate::services::{stats_service, ServiceError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DAILY_WINDOW_DAYS: i64 = 30;

/// Tunable estimation constants. The actual/estimated blend weight and the
/// ratio sanity window are configuration rather than literals; the defaults
/// match the historically observed behavior.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub default_page_seconds: f64,
    pub default_daily_seconds: f64,
    pub blend_weight: f64,
    pub ratio_floor: f64,
    pub ratio_ceiling: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            default_page_seconds: 120.0,
            default_daily_seconds: 3600.0,
            blend_weight: 0.7,
            ratio_floor: 0.1,
            ratio_ceiling: 10.0,
        }
    }
}

fn difficulty_multiplier(rating: i32) -> f64 {
    match rating {
        1 => 0.8,
        2 => 0.9,
        3 => 1.0,
        4 => 1.2,
        5 => 1.4,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RemainingTime {
    pub remaining_seconds: i64,
    pub remaining_pages: i32,
    pub percent_complete: f64,
}

/// Estimate the seconds left in a document.
///
/// `pages` holds the rows that exist for the document; pages never opened
/// have no row and cost the plain personal average. Opened pages cost their
/// analysis estimate (falling back to the average) scaled by difficulty.
/// When at least one completed page carries recorded time, the total is
/// blended toward the observed pace, unless the observed/expected ratio
/// falls outside the sanity window, in which case the unblended estimate
/// stands (one garbage session must not skew the projection).
pub fn remaining_time(
    pages: &[reading_progress::Model],
    total_pages: i32,
    user_avg_speed: f64,
    cfg: &EstimatorConfig,
) -> RemainingTime {
    if total_pages <= 0 {
        return RemainingTime {
            remaining_seconds: 0,
            remaining_pages: 0,
            percent_complete: 100.0,
        };
    }

    // The stored average is seeded at the default and recomputed on every
    // completed page; a zero here means an unset value, never a real pace.
    let avg = if user_avg_speed > 0.0 {
        user_avg_speed
    } else {
        cfg.default_page_seconds
    };

    let mut remaining = 0.0;
    for page in pages.iter().filter(|p| !p.is_completed) {
        let base = if page.estimated_time_seconds > 0 {
            page.estimated_time_seconds as f64
        } else {
            avg
        };
        let multiplier = page
            .difficulty_rating
            .map(difficulty_multiplier)
            .unwrap_or(1.0);
        remaining += base * multiplier;
    }

    let untracked = (total_pages - pages.len() as i32).max(0);
    remaining += untracked as f64 * avg;

    let completed: Vec<&reading_progress::Model> =
        pages.iter().filter(|p| p.is_completed).collect();
    let completed_time: i64 = completed.iter().map(|p| p.time_spent_seconds as i64).sum();
    if !completed.is_empty() && completed_time > 0 {
        let actual_avg = completed_time as f64 / completed.len() as f64;
        let ratio = actual_avg / avg;
        if ratio > cfg.ratio_floor && ratio < cfg.ratio_ceiling {
            remaining *= cfg.blend_weight * ratio + (1.0 - cfg.blend_weight);
        }
    }

    let completed_count = completed.len() as i32;
    RemainingTime {
        remaining_seconds: remaining.round() as i64,
        remaining_pages: (total_pages - completed_count).max(0),
        percent_complete: (completed_count.min(total_pages) as f64 / total_pages as f64) * 100.0,
    }
}

/// Mean study seconds per active day over the recent session history.
/// No history means no personalization: the default stands in.
pub fn daily_study_seconds(sessions: &[study_session::Model], cfg: &EstimatorConfig) -> f64 {
    let mut per_day: HashMap<String, i64> = HashMap::new();
    for session in sessions {
        if session.total_duration_seconds <= 0 {
            continue;
        }
        let day = session
            .started_at
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        *per_day.entry(day).or_insert(0) += session.total_duration_seconds as i64;
    }

    if per_day.is_empty() {
        return cfg.default_daily_seconds;
    }
    per_day.values().sum::<i64>() as f64 / per_day.len() as f64
}

pub fn project_completion_date(
    remaining_seconds: i64,
    daily_seconds: f64,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if remaining_seconds <= 0 || daily_seconds <= 0.0 {
        return None;
    }
    let days = (remaining_seconds as f64 / daily_seconds).ceil() as i64;
    today.checked_add_signed(Duration::days(days))
}

#[derive(Debug, Serialize)]
pub struct SprintSuggestion {
    pub start_page: i32,
    pub end_page: i32,
    pub page_count: i32,
    pub estimated_seconds: i64,
    pub document_complete: bool,
}

/// Size a contiguous page range to fit the preferred session length.
pub fn suggest_sprint(
    total_pages: i32,
    completed_pages: i32,
    user_avg_speed: f64,
    preferred_session_seconds: i64,
    cfg: &EstimatorConfig,
) -> SprintSuggestion {
    let avg = if user_avg_speed > 0.0 {
        user_avg_speed
    } else {
        cfg.default_page_seconds
    };

    let remaining = (total_pages - completed_pages).max(0);
    if remaining == 0 {
        return SprintSuggestion {
            start_page: 0,
            end_page: 0,
            page_count: 0,
            estimated_seconds: 0,
            document_complete: true,
        };
    }

    let fit = (preferred_session_seconds.max(0) as f64 / avg).floor() as i32;
    let pages = fit.min(remaining).max(1);
    let start_page = completed_pages + 1;

    SprintSuggestion {
        start_page,
        end_page: start_page + pages - 1,
        page_count: pages,
        estimated_seconds: (pages as f64 * avg).round() as i64,
        document_complete: false,
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentEstimate {
    pub document_id: i32,
    pub title: String,
    pub total_pages: i32,
    pub remaining_pages: i32,
    pub remaining_seconds: i64,
    pub percent_complete: f64,
    pub daily_study_seconds: i64,
    pub estimated_completion_date: Option<String>,
}

pub async fn estimate_for_document(
    db: &DatabaseConnection,
    user_id: i32,
    document_id: i32,
    cfg: &EstimatorConfig,
) -> Result<DocumentEstimate, ServiceError> {
    let doc = document::Entity::find_by_id(document_id)
        .filter(document::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let pages = reading_progress::Entity::find()
        .filter(reading_progress::Column::UserId.eq(user_id))
        .filter(reading_progress::Column::DocumentId.eq(document_id))
        .all(db)
        .await?;

    let stats = stats_service::get_or_create(db, user_id).await?;
    let core = remaining_time(&pages, doc.total_pages, stats.average_reading_speed_seconds, cfg);

    let daily = daily_study_seconds(&recent_sessions(db, user_id).await?, cfg);
    let date = project_completion_date(core.remaining_seconds, daily, Utc::now().date_naive());

    Ok(DocumentEstimate {
        document_id: doc.id,
        title: doc.title,
        total_pages: doc.total_pages,
        remaining_pages: core.remaining_pages,
        remaining_seconds: core.remaining_seconds,
        percent_complete: core.percent_complete,
        daily_study_seconds: daily.round() as i64,
        estimated_completion_date: date.map(|d| d.format("%Y-%m-%d").to_string()),
    })
}

#[derive(Debug, Serialize)]
pub struct BacklogEstimate {
    pub documents: Vec<DocumentEstimate>,
    pub total_remaining_seconds: i64,
    pub daily_study_seconds: i64,
    pub estimated_completion_date: Option<String>,
}

/// Remaining time across every document the user owns, with a single
/// completion date for the whole backlog.
pub async fn estimate_backlog(
    db: &DatabaseConnection,
    user_id: i32,
    cfg: &EstimatorConfig,
) -> Result<BacklogEstimate, ServiceError> {
    let docs = document::Entity::find()
        .filter(document::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let stats = stats_service::get_or_create(db, user_id).await?;
    let daily = daily_study_seconds(&recent_sessions(db, user_id).await?, cfg);
    let today = Utc::now().date_naive();

    let mut documents = Vec::with_capacity(docs.len());
    let mut total_remaining = 0i64;
    for doc in docs {
        let pages = reading_progress::Entity::find()
            .filter(reading_progress::Column::UserId.eq(user_id))
            .filter(reading_progress::Column::DocumentId.eq(doc.id))
            .all(db)
            .await?;
        let core = remaining_time(&pages, doc.total_pages, stats.average_reading_speed_seconds, cfg);
        total_remaining += core.remaining_seconds;
        documents.push(DocumentEstimate {
            document_id: doc.id,
            title: doc.title,
            total_pages: doc.total_pages,
            remaining_pages: core.remaining_pages,
            remaining_seconds: core.remaining_seconds,
            percent_complete: core.percent_complete,
            daily_study_seconds: daily.round() as i64,
            estimated_completion_date: project_completion_date(core.remaining_seconds, daily, today)
                .map(|d| d.format("%Y-%m-%d").to_string()),
        });
    }

    Ok(BacklogEstimate {
        total_remaining_seconds: total_remaining,
        daily_study_seconds: daily.round() as i64,
        estimated_completion_date: project_completion_date(total_remaining, daily, today)
            .map(|d| d.format("%Y-%m-%d").to_string()),
        documents,
    })
}

async fn recent_sessions(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<study_session::Model>, ServiceError> {
    let cutoff = (Utc::now() - Duration::days(DAILY_WINDOW_DAYS))
        .format(TIMESTAMP_FORMAT)
        .to_string();
    // Timestamps are stored in a lexically sortable format
    let sessions = study_session::Entity::find()
        .filter(study_session::Column::UserId.eq(user_id))
        .filter(study_session::Column::EndedAt.is_not_null())
        .filter(study_session::Column::StartedAt.gte(cutoff))
        .all(db)
        .await?;
    Ok(sessions)
}

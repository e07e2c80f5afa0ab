//! User stat aggregate - lazy creation, page-completion folds, streaks, XP.
//!
//! Every mutation re-reads the stored row first (read-modify-write); the
//! surrounding system gives no single-writer guarantee per user, so nothing
//! here trusts an in-memory copy across await points.

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::models::{reading_progress, user_stats};
use crate::services::{leveling, ServiceError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Seed value for `average_reading_speed_seconds` before any page is read.
pub const DEFAULT_PAGE_SECONDS: f64 = 120.0;

/// Fetch the user's stats row, creating it with defaults on first activity.
pub async fn get_or_create(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<user_stats::Model, ServiceError> {
    if let Some(stats) = find(db, user_id).await? {
        return Ok(stats);
    }

    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let fresh = user_stats::ActiveModel {
        user_id: Set(user_id),
        total_pages_read: Set(0),
        total_time_spent_seconds: Set(0),
        average_reading_speed_seconds: Set(DEFAULT_PAGE_SECONDS),
        total_documents: Set(0),
        current_streak_days: Set(0),
        longest_streak_days: Set(0),
        last_activity_date: Set(None),
        focus_score_average: Set(0.0),
        total_study_sessions: Set(0),
        average_session_duration_seconds: Set(0),
        total_xp_points: Set(0),
        current_level: Set(1),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    // Two racing creators collapse onto the unique user_id key
    match user_stats::Entity::insert(fresh)
        .on_conflict(
            OnConflict::column(user_stats::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    find(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::Database("user_stats row missing after insert".to_string()))
}

async fn find(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<user_stats::Model>, ServiceError> {
    Ok(user_stats::Entity::find()
        .filter(user_stats::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Streak rules: activity on the same day keeps the streak, activity the
/// day after extends it, anything else restarts at 1.
pub fn touch_streak(
    current: i32,
    longest: i32,
    last_activity: Option<&str>,
    today: NaiveDate,
) -> (i32, i32) {
    let last = last_activity.and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok());
    let next = match last {
        Some(day) if day == today => current.max(1),
        Some(day) if today - day == Duration::days(1) => current + 1,
        _ => 1,
    };
    (next, longest.max(next))
}

/// Record a completed page and fold it into the aggregate.
///
/// The page row is created lazily on first touch and never recreated; the
/// pages-read counter moves only on the not-completed to completed
/// transition, so re-reading a finished page accumulates time without
/// double counting.
pub async fn record_page_progress(
    db: &DatabaseConnection,
    user_id: i32,
    document_id: i32,
    page_number: i32,
    seconds: i32,
) -> Result<(reading_progress::Model, user_stats::Model), ServiceError> {
    if seconds <= 0 {
        return Err(ServiceError::Validation(
            "time spent must be a positive number of seconds".to_string(),
        ));
    }
    if page_number <= 0 {
        return Err(ServiceError::Validation(
            "page number must be positive".to_string(),
        ));
    }

    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

    let existing = reading_progress::Entity::find()
        .filter(reading_progress::Column::UserId.eq(user_id))
        .filter(reading_progress::Column::DocumentId.eq(document_id))
        .filter(reading_progress::Column::PageNumber.eq(page_number))
        .one(db)
        .await?;

    let (page, newly_completed) = match existing {
        Some(row) => {
            let newly_completed = !row.is_completed;
            let accumulated = row.time_spent_seconds + seconds;
            let mut active: reading_progress::ActiveModel = row.into();
            active.time_spent_seconds = Set(accumulated);
            active.is_completed = Set(true);
            active.last_read_at = Set(Some(now.clone()));
            active.updated_at = Set(now.clone());
            (active.update(db).await?, newly_completed)
        }
        None => {
            let fresh = reading_progress::ActiveModel {
                user_id: Set(user_id),
                document_id: Set(document_id),
                page_number: Set(page_number),
                time_spent_seconds: Set(seconds),
                is_completed: Set(true),
                estimated_time_seconds: Set(DEFAULT_PAGE_SECONDS as i32),
                difficulty_rating: Set(None),
                last_read_at: Set(Some(now.clone())),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            };
            (fresh.insert(db).await?, true)
        }
    };

    let stats = get_or_create(db, user_id).await?;
    let total_pages = stats.total_pages_read + if newly_completed { 1 } else { 0 };
    let total_time = stats.total_time_spent_seconds + seconds;
    let average = if total_pages > 0 {
        total_time as f64 / total_pages as f64
    } else {
        DEFAULT_PAGE_SECONDS
    };

    let today = Utc::now().date_naive();
    let (current, longest) = touch_streak(
        stats.current_streak_days,
        stats.longest_streak_days,
        stats.last_activity_date.as_deref(),
        today,
    );

    let mut active: user_stats::ActiveModel = stats.into();
    active.total_pages_read = Set(total_pages);
    active.total_time_spent_seconds = Set(total_time);
    active.average_reading_speed_seconds = Set(average);
    active.current_streak_days = Set(current);
    active.longest_streak_days = Set(longest);
    active.last_activity_date = Set(Some(today.format(DATE_FORMAT).to_string()));
    active.updated_at = Set(now);
    let stats = active.update(db).await?;

    Ok((page, stats))
}

/// Fold a finished session into the aggregate: session count, running means
/// for duration and focus, and the streak touch.
pub async fn apply_session_end(
    db: &DatabaseConnection,
    user_id: i32,
    duration_seconds: i32,
    focus_score: f64,
) -> Result<user_stats::Model, ServiceError> {
    let stats = get_or_create(db, user_id).await?;

    let previous = stats.total_study_sessions as i64;
    let count = previous + 1;
    let average_duration =
        (stats.average_session_duration_seconds as i64 * previous + duration_seconds as i64)
            / count;
    let focus_average = (stats.focus_score_average * previous as f64 + focus_score) / count as f64;

    let today = Utc::now().date_naive();
    let (current, longest) = touch_streak(
        stats.current_streak_days,
        stats.longest_streak_days,
        stats.last_activity_date.as_deref(),
        today,
    );

    let mut active: user_stats::ActiveModel = stats.into();
    active.total_study_sessions = Set(count as i32);
    active.average_session_duration_seconds = Set(average_duration as i32);
    active.focus_score_average = Set(focus_average);
    active.current_streak_days = Set(current);
    active.longest_streak_days = Set(longest);
    active.last_activity_date = Set(Some(today.format(DATE_FORMAT).to_string()));
    active.updated_at = Set(Utc::now().format(TIMESTAMP_FORMAT).to_string());
    Ok(active.update(db).await?)
}

/// Bump the document counter (delta may be negative on delete).
pub async fn adjust_document_count(
    db: &DatabaseConnection,
    user_id: i32,
    delta: i32,
) -> Result<user_stats::Model, ServiceError> {
    let stats = get_or_create(db, user_id).await?;
    let total = (stats.total_documents + delta).max(0);
    let mut active: user_stats::ActiveModel = stats.into();
    active.total_documents = Set(total);
    active.updated_at = Set(Utc::now().format(TIMESTAMP_FORMAT).to_string());
    Ok(active.update(db).await?)
}

/// Add XP and recompute the level invariant.
pub async fn add_xp(
    db: &DatabaseConnection,
    user_id: i32,
    points: i32,
) -> Result<user_stats::Model, ServiceError> {
    let stats = get_or_create(db, user_id).await?;
    let xp = stats.total_xp_points + points.max(0);
    let mut active: user_stats::ActiveModel = stats.into();
    active.total_xp_points = Set(xp);
    active.current_level = Set(leveling::level_for_xp(xp));
    active.updated_at = Set(Utc::now().format(TIMESTAMP_FORMAT).to_string());
    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn first_activity_starts_a_streak() {
        assert_eq!(touch_streak(0, 0, None, date("2026-08-07")), (1, 1));
    }

    #[test]
    fn same_day_activity_keeps_the_streak() {
        assert_eq!(
            touch_streak(4, 6, Some("2026-08-07"), date("2026-08-07")),
            (4, 6)
        );
    }

    #[test]
    fn next_day_activity_extends_the_streak() {
        assert_eq!(
            touch_streak(6, 6, Some("2026-08-06"), date("2026-08-07")),
            (7, 7)
        );
    }

    #[test]
    fn a_gap_resets_the_streak() {
        assert_eq!(
            touch_streak(12, 12, Some("2026-08-01"), date("2026-08-07")),
            (1, 12)
        );
    }
}

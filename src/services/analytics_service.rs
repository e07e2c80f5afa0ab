//! Per-day analytics rollups.
//!
//! One row per (user, date), created by the first completed session of the
//! day and updated additively afterwards. `fold_session` is called exactly
//! once per completed session, from `session_service::end_session`.

use chrono::{NaiveDateTime, Timelike};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::models::{daily_analytics, study_session};
use crate::services::ServiceError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// Time-of-day bucket for a session start hour: morning [6,12),
/// afternoon [12,18), evening [18,22), night otherwise.
pub fn bucket_for_hour(hour: u32) -> DayBucket {
    match hour {
        6..=11 => DayBucket::Morning,
        12..=17 => DayBucket::Afternoon,
        18..=21 => DayBucket::Evening,
        _ => DayBucket::Night,
    }
}

/// Fold a finished session into its day's rollup (upsert semantics).
pub async fn fold_session(
    db: &DatabaseConnection,
    user_id: i32,
    session: &study_session::Model,
) -> Result<daily_analytics::Model, ServiceError> {
    let started = NaiveDateTime::parse_from_str(&session.started_at, TIMESTAMP_FORMAT)
        .map_err(|_| ServiceError::Validation("malformed session start timestamp".to_string()))?;
    let date = started.date().format("%Y-%m-%d").to_string();
    let minutes = session.total_duration_seconds.max(0) / 60;
    let bucket = bucket_for_hour(started.hour());
    let now = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();

    let existing = find_day(db, user_id, &date).await?;
    if existing.is_none() {
        let fresh = daily_analytics::ActiveModel {
            user_id: Set(user_id),
            date: Set(date.clone()),
            total_pages_read: Set(session.pages_covered),
            total_time_seconds: Set(session.total_duration_seconds),
            study_sessions_count: Set(1),
            focus_score_average: Set(session.focus_score),
            morning_minutes: Set(if bucket == DayBucket::Morning { minutes } else { 0 }),
            afternoon_minutes: Set(if bucket == DayBucket::Afternoon { minutes } else { 0 }),
            evening_minutes: Set(if bucket == DayBucket::Evening { minutes } else { 0 }),
            night_minutes: Set(if bucket == DayBucket::Night { minutes } else { 0 }),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        match daily_analytics::Entity::insert(fresh)
            .on_conflict(
                OnConflict::columns([
                    daily_analytics::Column::UserId,
                    daily_analytics::Column::Date,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(db)
            .await
        {
            Ok(res) => {
                return daily_analytics::Entity::find_by_id(res.last_insert_id)
                    .one(db)
                    .await?
                    .ok_or(ServiceError::NotFound);
            }
            // Another session of the same day got there first; fall through
            // to the additive update against the row it created.
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let row = find_day(db, user_id, &date)
        .await?
        .ok_or_else(|| ServiceError::Database("daily_analytics row vanished".to_string()))?;

    let previous = row.study_sessions_count as f64;
    let focus_average =
        (row.focus_score_average * previous + session.focus_score) / (previous + 1.0);

    let mut active: daily_analytics::ActiveModel = row.clone().into();
    active.total_pages_read = Set(row.total_pages_read + session.pages_covered);
    active.total_time_seconds = Set(row.total_time_seconds + session.total_duration_seconds);
    active.study_sessions_count = Set(row.study_sessions_count + 1);
    active.focus_score_average = Set(focus_average);
    match bucket {
        DayBucket::Morning => active.morning_minutes = Set(row.morning_minutes + minutes),
        DayBucket::Afternoon => active.afternoon_minutes = Set(row.afternoon_minutes + minutes),
        DayBucket::Evening => active.evening_minutes = Set(row.evening_minutes + minutes),
        DayBucket::Night => active.night_minutes = Set(row.night_minutes + minutes),
    }
    active.updated_at = Set(now);
    Ok(active.update(db).await?)
}

async fn find_day(
    db: &DatabaseConnection,
    user_id: i32,
    date: &str,
) -> Result<Option<daily_analytics::Model>, ServiceError> {
    Ok(daily_analytics::Entity::find()
        .filter(daily_analytics::Column::UserId.eq(user_id))
        .filter(daily_analytics::Column::Date.eq(date))
        .one(db)
        .await?)
}

/// Daily rollups in an inclusive date range, oldest first.
pub async fn range(
    db: &DatabaseConnection,
    user_id: i32,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Vec<daily_analytics::Model>, ServiceError> {
    let mut query = daily_analytics::Entity::find()
        .filter(daily_analytics::Column::UserId.eq(user_id));
    if let Some(from) = from {
        query = query.filter(daily_analytics::Column::Date.gte(from));
    }
    if let Some(to) = to {
        query = query.filter(daily_analytics::Column::Date.lte(to));
    }
    Ok(query
        .order_by_asc(daily_analytics::Column::Date)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_land_in_the_documented_buckets() {
        assert_eq!(bucket_for_hour(5), DayBucket::Night);
        assert_eq!(bucket_for_hour(6), DayBucket::Morning);
        assert_eq!(bucket_for_hour(11), DayBucket::Morning);
        assert_eq!(bucket_for_hour(12), DayBucket::Afternoon);
        assert_eq!(bucket_for_hour(17), DayBucket::Afternoon);
        assert_eq!(bucket_for_hour(18), DayBucket::Evening);
        assert_eq!(bucket_for_hour(21), DayBucket::Evening);
        assert_eq!(bucket_for_hour(22), DayBucket::Night);
        assert_eq!(bucket_for_hour(0), DayBucket::Night);
    }
}

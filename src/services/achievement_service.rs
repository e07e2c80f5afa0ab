//! Threshold achievement evaluation and race-safe awarding.
//!
//! Safe to call after every session end: already-earned entries are skipped
//! via the award table, and the award insert itself rides on the
//! UNIQUE(user_id, achievement_id) key, so a concurrent evaluation that
//! wins the race degrades this one to a no-op rather than a duplicate.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::Serialize;

use crate::models::{achievement, study_session, user_achievement, user_stats};
use crate::services::{stats_service, ServiceError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const HIGH_FOCUS_THRESHOLD: f64 = 0.80;
pub const ULTRA_FOCUS_THRESHOLD: f64 = 0.95;
pub const PERFECT_FOCUS_THRESHOLD: f64 = 0.99;

/// Session-derived counters the catalog can reference but the stats row
/// does not carry.
#[derive(Debug, Default, Clone, Copy)]
pub struct DerivedMetrics {
    pub completed_sprints: i64,
    pub perfect_sprints: i64,
    pub high_focus_sessions: i64,
    pub ultra_focus_sessions: i64,
}

pub async fn derive_metrics(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<DerivedMetrics, ServiceError> {
    let finished = study_session::Entity::find()
        .filter(study_session::Column::UserId.eq(user_id))
        .filter(study_session::Column::EndedAt.is_not_null())
        .all(db)
        .await?;

    let mut metrics = DerivedMetrics::default();
    for session in &finished {
        if session.focus_score >= HIGH_FOCUS_THRESHOLD {
            metrics.high_focus_sessions += 1;
        }
        if session.focus_score >= ULTRA_FOCUS_THRESHOLD {
            metrics.ultra_focus_sessions += 1;
        }
        if session.completion_status == "completed" {
            metrics.completed_sprints += 1;
            if session.focus_score >= PERFECT_FOCUS_THRESHOLD {
                metrics.perfect_sprints += 1;
            }
        }
    }
    Ok(metrics)
}

#[derive(Debug, Serialize)]
pub struct EarnedAchievement {
    pub achievement: achievement::Model,
    pub record: user_achievement::Model,
}

/// Evaluate the whole catalog against the user's current aggregates and
/// award anything newly reached. Returns only the new awards; calling
/// twice in a row with unchanged stats returns an empty list.
pub async fn evaluate(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<EarnedAchievement>, ServiceError> {
    let stats = stats_service::get_or_create(db, user_id).await?;
    let derived = derive_metrics(db, user_id).await?;

    let catalog = achievement::Entity::find().all(db).await?;
    let earned: HashSet<i32> = user_achievement::Entity::find()
        .filter(user_achievement::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.achievement_id)
        .collect();

    let mut newly = Vec::new();
    for entry in catalog {
        if earned.contains(&entry.id) {
            continue;
        }

        let Some(value) = metric_value(&entry.requirement_type, &stats, &derived) else {
            // The catalog can grow faster than the code; skip quietly.
            tracing::debug!(
                "Skipping achievement '{}': unknown requirement type '{}'",
                entry.code,
                entry.requirement_type
            );
            continue;
        };

        // avg_page_time is a speed achievement: lower is better, and a
        // value of 0 means "no pages read yet", never a pace.
        let met = if entry.requirement_type == "avg_page_time" {
            value > 0.0 && value <= entry.requirement_value as f64
        } else {
            value >= entry.requirement_value as f64
        };
        if !met {
            continue;
        }

        if let Some(record) = award(db, user_id, &entry, value).await? {
            if entry.points > 0 {
                stats_service::add_xp(db, user_id, entry.points).await?;
            }
            tracing::info!("🏆 User {} earned achievement '{}'", user_id, entry.code);
            newly.push(EarnedAchievement {
                achievement: entry,
                record,
            });
        }
    }

    Ok(newly)
}

fn metric_value(
    requirement_type: &str,
    stats: &user_stats::Model,
    derived: &DerivedMetrics,
) -> Option<f64> {
    let value = match requirement_type {
        "documents_uploaded" => stats.total_documents as f64,
        "pages_read" => stats.total_pages_read as f64,
        "streak_days" => stats.longest_streak_days as f64,
        "total_time_hours" => stats.total_time_spent_seconds as f64 / 3600.0,
        "sprints_completed" => derived.completed_sprints as f64,
        "perfect_focus_sprints" => derived.perfect_sprints as f64,
        "high_focus_sessions" => derived.high_focus_sessions as f64,
        "ultra_focus_sessions" => derived.ultra_focus_sessions as f64,
        "avg_page_time" => {
            if stats.total_pages_read > 0 {
                stats.average_reading_speed_seconds
            } else {
                0.0
            }
        }
        _ => return None,
    };
    Some(value)
}

/// Insert the (user, achievement) pair, riding on the unique key for
/// idempotency. Returns None when another evaluation already holds the
/// pair - that is "already earned", not an error.
async fn award(
    db: &DatabaseConnection,
    user_id: i32,
    entry: &achievement::Model,
    progress_value: f64,
) -> Result<Option<user_achievement::Model>, ServiceError> {
    let record = user_achievement::ActiveModel {
        user_id: Set(user_id),
        achievement_id: Set(entry.id),
        earned_at: Set(Utc::now().format(TIMESTAMP_FORMAT).to_string()),
        progress_value: Set(progress_value.round() as i32),
        ..Default::default()
    };

    match user_achievement::Entity::insert(record)
        .on_conflict(
            OnConflict::columns([
                user_achievement::Column::UserId,
                user_achievement::Column::AchievementId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(db)
        .await
    {
        Ok(res) => Ok(user_achievement::Entity::find_by_id(res.last_insert_id)
            .one(db)
            .await?),
        Err(DbErr::RecordNotInserted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Earned achievements joined with their catalog entries, newest first.
pub async fn earned_with_details(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<EarnedAchievement>, ServiceError> {
    let rows = user_achievement::Entity::find()
        .filter(user_achievement::Column::UserId.eq(user_id))
        .order_by_desc(user_achievement::Column::EarnedAt)
        .find_also_related(achievement::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(record, entry)| {
            entry.map(|achievement| EarnedAchievement {
                achievement,
                record,
            })
        })
        .collect())
}

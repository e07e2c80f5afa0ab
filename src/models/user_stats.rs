use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rolling per-user aggregate, one row per user, mutated by every completed
/// page, completed session and achievement award.
///
/// Invariant: `current_level = floor(sqrt(total_xp_points / 100)) + 1`,
/// recomputed through `services::leveling` whenever XP changes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub total_pages_read: i32,
    pub total_time_spent_seconds: i32,
    /// total_time / total_pages, seeded at 120.0 before any page is read.
    pub average_reading_speed_seconds: f64,
    pub total_documents: i32,
    pub current_streak_days: i32,
    pub longest_streak_days: i32,
    pub last_activity_date: Option<String>, // YYYY-MM-DD
    pub focus_score_average: f64,
    pub total_study_sessions: i32,
    pub average_session_duration_seconds: i32,
    pub total_xp_points: i32,
    pub current_level: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

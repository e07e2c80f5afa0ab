use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-day rollup, unique per (user_id, date). Updated additively by every
/// completed session; never overwritten wholesale.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_analytics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub date: String, // YYYY-MM-DD
    pub total_pages_read: i32,
    pub total_time_seconds: i32,
    pub study_sessions_count: i32,
    pub focus_score_average: f64,
    pub morning_minutes: i32,
    pub afternoon_minutes: i32,
    pub evening_minutes: i32,
    pub night_minutes: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

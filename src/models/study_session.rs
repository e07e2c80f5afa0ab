use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "study_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub document_id: Option<i32>,
    pub started_at: String,
    pub ended_at: Option<String>, // NULL while the session is live
    pub total_duration_seconds: i32,
    pub active_reading_seconds: i32,
    pub break_time_seconds: i32,
    pub pages_covered: i32,
    pub tab_switches: i32,
    pub app_minimized_count: i32,
    pub inactivity_periods: i32,
    pub focus_events: i32,
    pub focus_score: f64,
    pub completion_status: String, // 'active', 'completed', 'interrupted', 'abandoned'
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document::Entity",
        from = "Column::DocumentId",
        to = "super::document::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Document,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Counter deltas sent by the client on each activity ping.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ActivityUpdateDto {
    pub tab_switches: Option<i32>,
    pub app_minimized_count: Option<i32>,
    pub inactivity_periods: Option<i32>,
    pub focus_events: Option<i32>,
    pub pages_covered: Option<i32>,
    pub active_reading_seconds: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EndSessionDto {
    pub completion_status: Option<String>,
    pub active_reading_seconds: Option<i32>,
    pub pages_covered: Option<i32>,
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per (user, document, page). Created lazily the first time a page
/// is touched (analysis push or completion), never recreated afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reading_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub document_id: i32,
    pub page_number: i32,
    pub time_spent_seconds: i32,
    pub is_completed: bool,
    /// Supplied by the upstream document analysis step; 120 until it arrives.
    pub estimated_time_seconds: i32,
    pub difficulty_rating: Option<i32>, // 1..=5
    pub last_read_at: Option<String>,
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
        on_delete = "Cascade"
    )]
    Document,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payload pushed by the document analysis subsystem.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageAnalysisDto {
    pub user_id: i32,
    pub estimated_time_seconds: Option<i32>,
    pub difficulty_rating: Option<i32>,
}

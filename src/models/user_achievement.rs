use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Award record. UNIQUE(user_id, achievement_id) is the sole "already
/// earned" signal; awarding inserts with conflict-ignore so concurrent
/// evaluations collapse to a single row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_achievements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub achievement_id: i32,
    pub earned_at: String,
    pub progress_value: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::achievement::Entity",
        from = "Column::AchievementId",
        to = "super::achievement::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Achievement,
}

impl Related<super::achievement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Achievement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

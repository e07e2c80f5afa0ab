use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Immutable catalog row, seeded by migration. The catalog can evolve
/// independently of the code, so `requirement_type` is stored as text and
/// unrecognized values are skipped at evaluation time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: String,
    pub requirement_type: String,
    pub requirement_value: i32,
    pub points: i32,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_achievement::Entity")]
    Earned,
}

impl Related<super::user_achievement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Earned.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

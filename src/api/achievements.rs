use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::*;
use serde_json::{json, Value};

use crate::models::achievement::{self, Entity as Achievement};
use crate::services::achievement_service;

use super::documents::UserQuery;
use super::map_service_error;

pub async fn list_catalog(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let catalog = Achievement::find()
        .order_by_asc(achievement::Column::Id)
        .all(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({ "achievements": catalog })))
}

pub async fn list_earned(
    State(db): State<DatabaseConnection>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let earned = achievement_service::earned_with_details(&db, query.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(json!({ "earned": earned })))
}

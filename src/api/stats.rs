use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::services::stats_service;

use super::documents::UserQuery;
use super::map_service_error;

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "The user's rolling stats, created lazily")
    )
)]
pub async fn get_stats(
    State(db): State<DatabaseConnection>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let stats = stats_service::get_or_create(&db, query.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(json!({ "stats": stats })))
}

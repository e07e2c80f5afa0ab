use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services::analytics_service;

use super::map_service_error;

#[derive(Deserialize)]
pub struct DailyQuery {
    pub user_id: i32,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn daily_analytics(
    State(db): State<DatabaseConnection>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let days = analytics_service::range(
        &db,
        query.user_id,
        query.from.as_deref(),
        query.to.as_deref(),
    )
    .await
    .map_err(map_service_error)?;

    Ok(Json(json!({ "days": days })))
}

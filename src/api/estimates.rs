use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::document::{self, Entity as Document};
use crate::models::reading_progress::{self, Entity as ReadingProgress};
use crate::services::estimator::{self, EstimatorConfig};
use crate::services::stats_service;

use super::documents::UserQuery;
use super::map_service_error;

#[utoipa::path(
    get,
    path = "/api/documents/{id}/estimate",
    responses(
        (status = 200, description = "Remaining time and projected completion date"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn document_estimate(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let estimate =
        estimator::estimate_for_document(&db, query.user_id, id, &EstimatorConfig::default())
            .await
            .map_err(map_service_error)?;

    Ok(Json(json!({ "estimate": estimate })))
}

pub async fn backlog_estimate(
    State(db): State<DatabaseConnection>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let estimate = estimator::estimate_backlog(&db, query.user_id, &EstimatorConfig::default())
        .await
        .map_err(map_service_error)?;

    Ok(Json(json!({ "backlog": estimate })))
}

#[derive(Deserialize)]
pub struct SprintQuery {
    pub user_id: i32,
    pub preferred_session_seconds: Option<i64>,
}

const DEFAULT_SPRINT_SECONDS: i64 = 1800;

pub async fn sprint_suggestion(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Query(query): Query<SprintQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let preferred = query
        .preferred_session_seconds
        .unwrap_or(DEFAULT_SPRINT_SECONDS);
    if preferred <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "preferred_session_seconds must be positive".to_string(),
        ));
    }

    let doc = Document::find_by_id(id)
        .filter(document::Column::UserId.eq(query.user_id))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Document not found".to_string()))?;

    let completed = ReadingProgress::find()
        .filter(reading_progress::Column::UserId.eq(query.user_id))
        .filter(reading_progress::Column::DocumentId.eq(id))
        .filter(reading_progress::Column::IsCompleted.eq(true))
        .count(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let stats = stats_service::get_or_create(&db, query.user_id)
        .await
        .map_err(map_service_error)?;

    let sprint = estimator::suggest_sprint(
        doc.total_pages,
        completed as i32,
        stats.average_reading_speed_seconds,
        preferred,
        &EstimatorConfig::default(),
    );

    Ok(Json(json!({ "sprint": sprint })))
}

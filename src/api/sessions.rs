use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::study_session::{ActivityUpdateDto, EndSessionDto};
use crate::services::session_service;

use super::map_service_error;

#[derive(Deserialize)]
pub struct StartSessionDto {
    pub user_id: i32,
    pub document_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct ListSessionsQuery {
    pub user_id: i32,
    pub limit: Option<u64>,
}

pub async fn start_session(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<StartSessionDto>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let session = session_service::start_session(&db, payload.user_id, payload.document_id)
        .await
        .map_err(map_service_error)?;

    Ok(Json(
        json!({ "session": session, "message": "Session started" }),
    ))
}

pub async fn update_activity(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<ActivityUpdateDto>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let session = session_service::update_activity(&db, id, payload)
        .await
        .map_err(map_service_error)?;

    // The live focus score goes back with every ping so the client can
    // render it without a second round trip.
    let focus_score = session.focus_score;
    Ok(Json(json!({
        "session": session,
        "focus_score": focus_score,
    })))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/end",
    responses(
        (status = 200, description = "Session summary with any new achievements"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already ended")
    )
)]
pub async fn end_session(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<EndSessionDto>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let summary = session_service::end_session(&db, id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(Json(json!({
        "session": summary.session,
        "performance": summary.performance,
        "daily": summary.daily,
        "newly_earned": summary.newly_earned,
        "stats": summary.stats,
        "message": "Session ended"
    })))
}

pub async fn list_sessions(
    State(db): State<DatabaseConnection>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let sessions = session_service::list_recent(&db, query.user_id, query.limit.unwrap_or(20))
        .await
        .map_err(map_service_error)?;

    Ok(Json(json!({ "sessions": sessions })))
}

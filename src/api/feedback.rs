use axum::{extract::State, http::StatusCode, Json};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::reading_progress::{self, Entity as ReadingProgress};
use crate::services::{pace, stats_service};

use super::map_service_error;

const NEUTRAL_DIFFICULTY: i32 = 3;

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub user_id: i32,
    pub document_id: i32,
    pub page_number: Option<i32>,
    pub current_page_seconds: Option<f64>,
    pub activity_level: Option<f64>,
}

/// Real-time pace feedback for the page currently on screen. Degrades to
/// defaults (120s average, neutral difficulty) when history is missing
/// rather than failing.
#[utoipa::path(
    post,
    path = "/api/feedback",
    responses(
        (status = 200, description = "Pace classification with suggestions"),
        (status = 400, description = "Missing or invalid reading time")
    )
)]
pub async fn get_feedback(
    State(db): State<DatabaseConnection>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Some(seconds) = request.current_page_seconds else {
        return Err((
            StatusCode::BAD_REQUEST,
            "current_page_seconds is required".to_string(),
        ));
    };
    if seconds < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "current_page_seconds must not be negative".to_string(),
        ));
    }

    let stats = stats_service::get_or_create(&db, request.user_id)
        .await
        .map_err(map_service_error)?;

    let difficulty = match request.page_number {
        Some(page_number) => ReadingProgress::find()
            .filter(reading_progress::Column::UserId.eq(request.user_id))
            .filter(reading_progress::Column::DocumentId.eq(request.document_id))
            .filter(reading_progress::Column::PageNumber.eq(page_number))
            .one(&db)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
            .and_then(|page| page.difficulty_rating)
            .unwrap_or(NEUTRAL_DIFFICULTY),
        None => NEUTRAL_DIFFICULTY,
    };

    let activity_level = request.activity_level.unwrap_or(1.0).clamp(0.0, 1.0);
    let feedback = pace::classify(
        seconds,
        stats.average_reading_speed_seconds,
        difficulty,
        activity_level,
    );

    Ok(Json(json!({ "feedback": feedback })))
}

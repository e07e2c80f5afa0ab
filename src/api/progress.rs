use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::document::{self, Entity as Document};
use crate::models::reading_progress::{self, Entity as ReadingProgress, PageAnalysisDto};
use crate::services::stats_service;

use super::documents::UserQuery;
use super::map_service_error;

#[derive(Deserialize)]
pub struct CompletePageDto {
    pub user_id: i32,
    pub seconds: Option<i32>,
}

/// Page completion: the central write path of the engine. Updates the page
/// row and folds the time into the user's aggregate.
pub async fn complete_page(
    State(db): State<DatabaseConnection>,
    Path((document_id, page_number)): Path<(i32, i32)>,
    Json(payload): Json<CompletePageDto>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Some(seconds) = payload.seconds else {
        return Err((
            StatusCode::BAD_REQUEST,
            "seconds is required".to_string(),
        ));
    };

    let doc = Document::find_by_id(document_id)
        .filter(document::Column::UserId.eq(payload.user_id))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Document not found".to_string()))?;

    if page_number > doc.total_pages {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Document has only {} pages", doc.total_pages),
        ));
    }

    let (page, stats) =
        stats_service::record_page_progress(&db, payload.user_id, document_id, page_number, seconds)
            .await
            .map_err(map_service_error)?;

    Ok(Json(json!({
        "page": page,
        "stats": stats,
        "message": "Page progress recorded"
    })))
}

/// Upstream document analysis pushes per-page estimates and difficulty
/// ratings through here. Creates the page row lazily on first push.
pub async fn set_page_analysis(
    State(db): State<DatabaseConnection>,
    Path((document_id, page_number)): Path<(i32, i32)>,
    Json(payload): Json<PageAnalysisDto>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if let Some(rating) = payload.difficulty_rating {
        if !(1..=5).contains(&rating) {
            return Err((
                StatusCode::BAD_REQUEST,
                "difficulty_rating must be between 1 and 5".to_string(),
            ));
        }
    }
    if let Some(estimate) = payload.estimated_time_seconds {
        if estimate < 0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "estimated_time_seconds must not be negative".to_string(),
            ));
        }
    }

    Document::find_by_id(document_id)
        .filter(document::Column::UserId.eq(payload.user_id))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Document not found".to_string()))?;

    let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let existing = ReadingProgress::find()
        .filter(reading_progress::Column::UserId.eq(payload.user_id))
        .filter(reading_progress::Column::DocumentId.eq(document_id))
        .filter(reading_progress::Column::PageNumber.eq(page_number))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let page = match existing {
        Some(row) => {
            let mut active: reading_progress::ActiveModel = row.into();
            if let Some(estimate) = payload.estimated_time_seconds {
                active.estimated_time_seconds = Set(estimate);
            }
            if payload.difficulty_rating.is_some() {
                active.difficulty_rating = Set(payload.difficulty_rating);
            }
            active.updated_at = Set(now);
            active
                .update(&db)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        }
        None => {
            let fresh = reading_progress::ActiveModel {
                user_id: Set(payload.user_id),
                document_id: Set(document_id),
                page_number: Set(page_number),
                time_spent_seconds: Set(0),
                is_completed: Set(false),
                estimated_time_seconds: Set(payload
                    .estimated_time_seconds
                    .unwrap_or(stats_service::DEFAULT_PAGE_SECONDS as i32)),
                difficulty_rating: Set(payload.difficulty_rating),
                last_read_at: Set(None),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            };
            fresh
                .insert(&db)
                .await
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        }
    };

    Ok(Json(json!({ "page": page })))
}

pub async fn document_progress(
    State(db): State<DatabaseConnection>,
    Path(document_id): Path<i32>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let pages = ReadingProgress::find()
        .filter(reading_progress::Column::UserId.eq(query.user_id))
        .filter(reading_progress::Column::DocumentId.eq(document_id))
        .order_by_asc(reading_progress::Column::PageNumber)
        .all(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({ "pages": pages })))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::models::document::{self, DocumentDto, Entity as Document};
use crate::models::reading_progress::{self, Entity as ReadingProgress};
use crate::services::stats_service;

use super::map_service_error;

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: i32,
}

pub async fn create_document(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<DocumentDto>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if payload.total_pages < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "total_pages must not be negative".to_string(),
        ));
    }

    let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let new_document = document::ActiveModel {
        user_id: Set(payload.user_id),
        title: Set(payload.title),
        file_name: Set(payload.file_name),
        total_pages: Set(payload.total_pages),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = new_document
        .insert(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    stats_service::adjust_document_count(&db, saved.user_id, 1)
        .await
        .map_err(map_service_error)?;

    Ok(Json(
        json!({ "document": saved, "message": "Document registered successfully" }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "List documents with progress counts")
    )
)]
pub async fn list_documents(
    State(db): State<DatabaseConnection>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let documents = Document::find()
        .filter(document::Column::UserId.eq(query.user_id))
        .order_by_desc(document::Column::CreatedAt)
        .all(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    // One pass over the user's progress rows instead of a count per document
    let pages = ReadingProgress::find()
        .filter(reading_progress::Column::UserId.eq(query.user_id))
        .filter(reading_progress::Column::IsCompleted.eq(true))
        .all(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut completed_map: HashMap<i32, i32> = HashMap::new();
    for page in pages {
        *completed_map.entry(page.document_id).or_insert(0) += 1;
    }

    let result: Vec<Value> = documents
        .into_iter()
        .map(|doc| {
            let completed = completed_map.get(&doc.id).copied().unwrap_or(0);
            let percent = if doc.total_pages > 0 {
                completed as f64 / doc.total_pages as f64 * 100.0
            } else {
                100.0
            };
            json!({
                "id": doc.id,
                "title": doc.title,
                "file_name": doc.file_name,
                "total_pages": doc.total_pages,
                "completed_pages": completed,
                "percent_complete": percent,
                "created_at": doc.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "documents": result })))
}

pub async fn get_document(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
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

    let percent = if doc.total_pages > 0 {
        completed as f64 / doc.total_pages as f64 * 100.0
    } else {
        100.0
    };

    Ok(Json(json!({
        "document": doc,
        "completed_pages": completed,
        "percent_complete": percent,
    })))
}

pub async fn delete_document(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let doc = Document::find_by_id(id)
        .filter(document::Column::UserId.eq(query.user_id))
        .one(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Document not found".to_string()))?;

    ReadingProgress::delete_many()
        .filter(reading_progress::Column::UserId.eq(query.user_id))
        .filter(reading_progress::Column::DocumentId.eq(id))
        .exec(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let user_id = doc.user_id;
    doc.delete(&db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    stats_service::adjust_document_count(&db, user_id, -1)
        .await
        .map_err(map_service_error)?;

    Ok(Json(json!({ "message": "Document deleted successfully" })))
}

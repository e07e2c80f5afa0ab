pub mod achievements;
pub mod analytics;
pub mod documents;
pub mod estimates;
pub mod feedback;
pub mod health;
pub mod progress;
pub mod sessions;
pub mod stats;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;

use crate::services::ServiceError;

pub fn api_router(db: DatabaseConnection) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Documents (metadata only; upload/extraction live upstream)
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        // Reading progress
        .route("/documents/:id/progress", get(progress::document_progress))
        .route(
            "/documents/:id/pages/:page/analysis",
            put(progress::set_page_analysis),
        )
        .route(
            "/documents/:id/pages/:page/complete",
            post(progress::complete_page),
        )
        // Real-time pace feedback
        .route("/feedback", post(feedback::get_feedback))
        // Study sessions
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/start", post(sessions::start_session))
        .route("/sessions/:id/activity", put(sessions::update_activity))
        .route("/sessions/:id/end", post(sessions::end_session))
        // Estimates & sprints
        .route("/documents/:id/estimate", get(estimates::document_estimate))
        .route("/documents/:id/sprint", get(estimates::sprint_suggestion))
        .route("/estimates/backlog", get(estimates::backlog_estimate))
        // Aggregates
        .route("/stats", get(stats::get_stats))
        .route("/analytics/daily", get(analytics::daily_analytics))
        // Achievements
        .route("/achievements", get(achievements::list_catalog))
        .route("/achievements/earned", get(achievements::list_earned))
        .with_state(db)
}

pub(crate) fn map_service_error(e: ServiceError) -> (StatusCode, String) {
    match e {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
        ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        ServiceError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
        ServiceError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
    }
}

use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::documents::list_documents,
        api::feedback::get_feedback,
        api::sessions::end_session,
        api::estimates::document_estimate,
        api::stats::get_stats,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "studygenius", description = "StudyGenius API")
    )
)]
pub struct ApiDoc;

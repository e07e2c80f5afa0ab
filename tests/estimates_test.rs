//! Remaining-time estimation against the persistence layer

use sea_orm::{DatabaseConnection, EntityTrait, Set};

use studygenius::db;
use studygenius::models::document;
use studygenius::services::estimator::{self, EstimatorConfig};
use studygenius::services::{stats_service, ServiceError};

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn create_test_document(db: &DatabaseConnection, user_id: i32, total_pages: i32) -> i32 {
    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let doc = document::ActiveModel {
        user_id: Set(user_id),
        title: Set("Estimation Target".to_string()),
        file_name: Set(None),
        total_pages: Set(total_pages),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = document::Entity::insert(doc)
        .exec(db)
        .await
        .expect("Failed to create document");
    res.last_insert_id
}

#[tokio::test]
async fn test_untouched_document_costs_the_default_average() {
    let db = setup_test_db().await;
    let doc_id = create_test_document(&db, 1, 10).await;

    let estimate = estimator::estimate_for_document(&db, 1, doc_id, &EstimatorConfig::default())
        .await
        .expect("Failed to estimate");

    // 10 pages at the seeded 120s average, one default 3600s day
    assert_eq!(estimate.remaining_pages, 10);
    assert_eq!(estimate.remaining_seconds, 1200);
    assert_eq!(estimate.percent_complete, 0.0);
    assert_eq!(estimate.daily_study_seconds, 3600);
    assert!(estimate.estimated_completion_date.is_some());
}

#[tokio::test]
async fn test_completed_pages_shrink_the_estimate() {
    let db = setup_test_db().await;
    let doc_id = create_test_document(&db, 1, 10).await;

    // Read 5 pages at exactly the default pace so no blend correction kicks in
    for page in 1..=5 {
        stats_service::record_page_progress(&db, 1, doc_id, page, 120)
            .await
            .expect("Failed to record progress");
    }

    let estimate = estimator::estimate_for_document(&db, 1, doc_id, &EstimatorConfig::default())
        .await
        .expect("Failed to estimate");

    assert_eq!(estimate.remaining_pages, 5);
    assert_eq!(estimate.remaining_seconds, 600);
    assert!((estimate.percent_complete - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_finished_document_has_no_completion_date() {
    let db = setup_test_db().await;
    let doc_id = create_test_document(&db, 1, 2).await;

    for page in 1..=2 {
        stats_service::record_page_progress(&db, 1, doc_id, page, 120)
            .await
            .expect("Failed to record progress");
    }

    let estimate = estimator::estimate_for_document(&db, 1, doc_id, &EstimatorConfig::default())
        .await
        .expect("Failed to estimate");

    assert_eq!(estimate.remaining_pages, 0);
    assert_eq!(estimate.remaining_seconds, 0);
    assert!(estimate.estimated_completion_date.is_none());
}

#[tokio::test]
async fn test_unknown_document_is_not_found() {
    let db = setup_test_db().await;

    let err = estimator::estimate_for_document(&db, 1, 999, &EstimatorConfig::default())
        .await
        .expect_err("Expected not found");
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
async fn test_backlog_sums_over_documents() {
    let db = setup_test_db().await;
    let first = create_test_document(&db, 1, 10).await;
    let second = create_test_document(&db, 1, 5).await;
    // Another user's backlog must not leak in
    create_test_document(&db, 2, 100).await;

    let backlog = estimator::estimate_backlog(&db, 1, &EstimatorConfig::default())
        .await
        .expect("Failed to estimate backlog");

    assert_eq!(backlog.documents.len(), 2);
    assert_eq!(backlog.total_remaining_seconds, 15 * 120);
    assert!(backlog
        .documents
        .iter()
        .any(|doc| doc.document_id == first && doc.remaining_seconds == 1200));
    assert!(backlog
        .documents
        .iter()
        .any(|doc| doc.document_id == second && doc.remaining_seconds == 600));
}

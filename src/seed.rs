use sea_orm::*;

use crate::models::document;
use crate::models::reading_progress::PageAnalysisDto;
use crate::services::{session_service, stats_service, ServiceError};

const DEMO_USER_ID: i32 = 1;

/// Seed a demo user with a document, some read pages and a finished
/// session. Intended for local development only (SEED_DEMO=1).
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), ServiceError> {
    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let doc = document::ActiveModel {
        user_id: Set(DEMO_USER_ID),
        title: Set("Operating Systems: Three Easy Pieces".to_owned()),
        file_name: Set(Some("ostep.pdf".to_owned())),
        total_pages: Set(40),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let doc = doc.insert(db).await?;
    stats_service::adjust_document_count(db, DEMO_USER_ID, 1).await?;

    // Pretend the analysis subsystem rated the opening chapter
    for page_number in 1..=10 {
        let analysis = PageAnalysisDto {
            user_id: DEMO_USER_ID,
            estimated_time_seconds: Some(90 + page_number * 5),
            difficulty_rating: Some(if page_number > 6 { 4 } else { 2 }),
        };
        upsert_page_analysis(db, doc.id, page_number, &analysis).await?;
    }

    // Read the first few pages
    for page_number in 1..=5 {
        stats_service::record_page_progress(db, DEMO_USER_ID, doc.id, page_number, 100).await?;
    }

    // One finished session so analytics and achievements have something
    let session = session_service::start_session(db, DEMO_USER_ID, Some(doc.id)).await?;
    session_service::end_session(
        db,
        session.id,
        crate::models::study_session::EndSessionDto {
            completion_status: Some("completed".to_owned()),
            active_reading_seconds: Some(500),
            pages_covered: Some(5),
        },
    )
    .await?;

    Ok(())
}

async fn upsert_page_analysis(
    db: &DatabaseConnection,
    document_id: i32,
    page_number: i32,
    analysis: &PageAnalysisDto,
) -> Result<(), ServiceError> {
    use crate::models::reading_progress::{self, Entity as ReadingProgress};

    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let existing = ReadingProgress::find()
        .filter(reading_progress::Column::UserId.eq(analysis.user_id))
        .filter(reading_progress::Column::DocumentId.eq(document_id))
        .filter(reading_progress::Column::PageNumber.eq(page_number))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let fresh = reading_progress::ActiveModel {
        user_id: Set(analysis.user_id),
        document_id: Set(document_id),
        page_number: Set(page_number),
        time_spent_seconds: Set(0),
        is_completed: Set(false),
        estimated_time_seconds: Set(analysis
            .estimated_time_seconds
            .unwrap_or(stats_service::DEFAULT_PAGE_SECONDS as i32)),
        difficulty_rating: Set(analysis.difficulty_rating),
        last_read_at: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    fresh.insert(db).await?;
    Ok(())
}

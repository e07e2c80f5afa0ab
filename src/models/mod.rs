pub mod document;
pub mod reading_progress;
pub mod user_stats;
pub mod study_session;
pub mod daily_analytics;
pub mod achievement;
pub mod user_achievement;

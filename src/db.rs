use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Document metadata. The PDF itself (upload, storage, text extraction)
    // lives in another subsystem; we only track pages and titles.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            file_name TEXT,
            total_pages INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Per-page progress, one row per (user, document, page)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS reading_progress (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            document_id INTEGER NOT NULL,
            page_number INTEGER NOT NULL,
            time_spent_seconds INTEGER NOT NULL DEFAULT 0,
            is_completed BOOLEAN NOT NULL DEFAULT 0,
            estimated_time_seconds INTEGER NOT NULL DEFAULT 120,
            difficulty_rating INTEGER,
            last_read_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, document_id, page_number)
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE,
            total_pages_read INTEGER NOT NULL DEFAULT 0,
            total_time_spent_seconds INTEGER NOT NULL DEFAULT 0,
            average_reading_speed_seconds REAL NOT NULL DEFAULT 120.0,
            total_documents INTEGER NOT NULL DEFAULT 0,
            current_streak_days INTEGER NOT NULL DEFAULT 0,
            longest_streak_days INTEGER NOT NULL DEFAULT 0,
            last_activity_date TEXT,
            focus_score_average REAL NOT NULL DEFAULT 0.0,
            total_study_sessions INTEGER NOT NULL DEFAULT 0,
            average_session_duration_seconds INTEGER NOT NULL DEFAULT 0,
            total_xp_points INTEGER NOT NULL DEFAULT 0,
            current_level INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS study_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            document_id INTEGER,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            total_duration_seconds INTEGER NOT NULL DEFAULT 0,
            active_reading_seconds INTEGER NOT NULL DEFAULT 0,
            break_time_seconds INTEGER NOT NULL DEFAULT 0,
            pages_covered INTEGER NOT NULL DEFAULT 0,
            tab_switches INTEGER NOT NULL DEFAULT 0,
            app_minimized_count INTEGER NOT NULL DEFAULT 0,
            inactivity_periods INTEGER NOT NULL DEFAULT 0,
            focus_events INTEGER NOT NULL DEFAULT 0,
            focus_score REAL NOT NULL DEFAULT 1.0,
            completion_status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS daily_analytics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            total_pages_read INTEGER NOT NULL DEFAULT 0,
            total_time_seconds INTEGER NOT NULL DEFAULT 0,
            study_sessions_count INTEGER NOT NULL DEFAULT 0,
            focus_score_average REAL NOT NULL DEFAULT 0.0,
            morning_minutes INTEGER NOT NULL DEFAULT 0,
            afternoon_minutes INTEGER NOT NULL DEFAULT 0,
            evening_minutes INTEGER NOT NULL DEFAULT 0,
            night_minutes INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, date)
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS achievements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            requirement_type TEXT NOT NULL,
            requirement_value INTEGER NOT NULL,
            points INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_achievements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            achievement_id INTEGER NOT NULL,
            earned_at TEXT NOT NULL,
            progress_value INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, achievement_id)
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Migration: sessions gained an explicit break time column
    let _ = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            "ALTER TABLE study_sessions ADD COLUMN break_time_seconds INTEGER NOT NULL DEFAULT 0"
                .to_owned(),
        ))
        .await;

    // Seed the achievement catalog (static reference data). INSERT OR IGNORE
    // keeps existing installs untouched when the catalog grows.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        INSERT OR IGNORE INTO achievements (code, name, description, requirement_type, requirement_value, points, created_at) VALUES
            ('first_upload',     'Getting Started',  'Add your first document',                  'documents_uploaded',    1,    50, datetime('now')),
            ('bookworm',         'Bookworm',         'Read 100 pages',                           'pages_read',          100,   100, datetime('now')),
            ('page_master',      'Page Master',      'Read 1000 pages',                          'pages_read',         1000,   400, datetime('now')),
            ('week_streak',      'Consistent',       'Study 7 days in a row',                    'streak_days',           7,   150, datetime('now')),
            ('month_streak',     'Unstoppable',      'Study 30 days in a row',                   'streak_days',          30,   500, datetime('now')),
            ('dedicated_reader', 'Dedicated Reader', 'Accumulate 10 hours of reading',           'total_time_hours',     10,   200, datetime('now')),
            ('marathon_reader',  'Marathon Reader',  'Accumulate 100 hours of reading',          'total_time_hours',    100,   600, datetime('now')),
            ('sprint_starter',   'Sprint Starter',   'Finish your first study sprint',           'sprints_completed',     1,    50, datetime('now')),
            ('sprint_veteran',   'Sprint Veteran',   'Finish 50 study sprints',                  'sprints_completed',    50,   300, datetime('now')),
            ('laser_focus',      'Laser Focus',      'Finish 10 sprints without distraction',    'perfect_focus_sprints',10,   250, datetime('now')),
            ('deep_work',        'Deep Work',        'Complete 25 high-focus sessions',          'high_focus_sessions',  25,   200, datetime('now')),
            ('flow_state',       'Flow State',       'Complete 10 ultra-focus sessions',         'ultra_focus_sessions', 10,   300, datetime('now')),
            ('speed_reader',     'Speed Reader',     'Average under 60 seconds per page',        'avg_page_time',        60,   250, datetime('now'))
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub async fn connect(db_url: &str) -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(16)
        .connect(db_url)
        .await
        .context("Failed to connect to SQLite database")
}

/// Create the schema if it doesn't exist yet. UUIDs are stored as TEXT,
/// timestamps as RFC 3339 TEXT via the sqlx chrono integration.
pub async fn init(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            birth_date DATETIME NOT NULL,
            bio TEXT,
            job_title TEXT,
            education TEXT,
            focus_slots_limit INTEGER NOT NULL DEFAULT 3,
            created_at DATETIME NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversation_cards (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            media_url TEXT NOT NULL,
            prompt_text TEXT NOT NULL,
            created_at DATETIME NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cards_user ON conversation_cards(user_id);

        CREATE TABLE IF NOT EXISTS icebreakers (
            id TEXT PRIMARY KEY,
            sender_id TEXT NOT NULL,
            receiver_id TEXT NOT NULL,
            target_card_id TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            created_at DATETIME NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_icebreakers_receiver_status ON icebreakers(receiver_id, status);
        CREATE INDEX IF NOT EXISTS idx_icebreakers_sender_card ON icebreakers(sender_id, target_card_id);

        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            user_a_id TEXT NOT NULL,
            user_b_id TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_a ON matches(user_a_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_matches_b ON matches(user_b_id, is_active);

        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            match_id TEXT NOT NULL,
            sender_id TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at DATETIME NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_match_created ON messages(match_id, created_at DESC);
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to initialize database schema")?;

    Ok(())
}

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

// A single never-recycled connection so the in-memory database survives
// for the whole test.
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    crate::db::init(&pool).await.expect("init schema");
    pool
}

pub(crate) async fn seed_user(pool: &SqlitePool, id: &str, first_name: &str, focus_slots_limit: i64) {
    sqlx::query(
        "INSERT INTO users (id,email,password_hash,first_name,last_name,birth_date,focus_slots_limit,created_at) \
         VALUES (?,?,'x',?,'Tester',?,?,?)",
    )
    .bind(id)
    .bind(format!("{id}@example.com"))
    .bind(first_name)
    .bind(Utc::now())
    .bind(focus_slots_limit)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed user");
}

pub(crate) async fn seed_card(pool: &SqlitePool, id: &str, owner_id: &str) {
    sqlx::query(
        "INSERT INTO conversation_cards (id,user_id,media_url,prompt_text,created_at) \
         VALUES (?,?,'https://example.com/pic.jpg','What is your go-to karaoke song?',?)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed card");
}

pub(crate) async fn seed_icebreaker(
    pool: &SqlitePool,
    id: &str,
    sender_id: &str,
    receiver_id: &str,
    target_card_id: &str,
) {
    sqlx::query(
        "INSERT INTO icebreakers (id,sender_id,receiver_id,target_card_id,content,status,created_at) \
         VALUES (?,?,?,?,?,'PENDING',?)",
    )
    .bind(id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(target_card_id)
    .bind(long_content())
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed icebreaker");
}

pub(crate) async fn seed_match(pool: &SqlitePool, id: &str, user_a_id: &str, user_b_id: &str) {
    sqlx::query(
        "INSERT INTO matches (id,user_a_id,user_b_id,is_active,created_at) VALUES (?,?,?,1,?)",
    )
    .bind(id)
    .bind(user_a_id)
    .bind(user_b_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed match");
}

pub(crate) async fn active_matches(pool: &SqlitePool, user_id: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM matches WHERE is_active=1 AND (user_a_id=? OR user_b_id=?)",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("count active matches");
    n
}

pub(crate) fn long_content() -> String {
    "I saw your karaoke card and I have so many questions about your song choice!".to_owned()
}

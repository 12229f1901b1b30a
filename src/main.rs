use deepmatch::{AdmissionLock, AppState, Config, auth, db, feed, icebreakers, matches, profiles};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let db_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://deepmatch.db?mode=rwc".to_owned());
    let db_pool = db::connect(&db_url).await?;
    db::init(&db_pool).await?;

    let app_state = AppState {
        db_pool,
        config: Config::from_env(),
        admission: AdmissionLock::default(),
    };

    let app = Router::new()
        .route("/", get(alive))
        .nest("/api/v1/auth", auth::router())
        .nest("/api/v1/profiles", profiles::router())
        .nest("/api/v1/feed", feed::router())
        .nest("/api/v1/cards", icebreakers::card_router())
        .nest("/api/v1/icebreakers", icebreakers::router())
        .nest("/api/v1/matches", matches::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    info!("DeepMatch API listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn alive() -> &'static str {
    "DeepMatch API is alive!"
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use taprush_api::auth::{self, AppState, AppStateInner};
use taprush_api::middleware::require_auth;
use taprush_api::{rounds, taps};
use taprush_core::lifecycle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taprush=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("TAPRUSH_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("TAPRUSH_DB_PATH").unwrap_or_else(|_| "taprush.db".into());
    let host = std::env::var("TAPRUSH_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("TAPRUSH_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let cooldown_secs: i64 = match std::env::var("TAPRUSH_COOLDOWN_SECS") {
        Ok(v) => v.parse()?,
        Err(_) => lifecycle::DEFAULT_COOLDOWN_SECS,
    };
    let round_secs: i64 = match std::env::var("TAPRUSH_ROUND_SECS") {
        Ok(v) => v.parse()?,
        Err(_) => lifecycle::DEFAULT_ROUND_SECS,
    };
    let secure_cookies = std::env::var("TAPRUSH_ENV").is_ok_and(|v| v == "production");
    let frontend_url = std::env::var("TAPRUSH_FRONTEND_URL").ok();

    // Init database
    let db = taprush_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        cooldown_secs,
        round_secs,
        secure_cookies,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/rounds", get(rounds::list_rounds))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/rounds", post(rounds::create_round))
        .route("/rounds/{id}", get(rounds::get_round))
        .route("/rounds/{round_id}/tap", post(taps::submit_tap))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    // Cookie auth needs credentialed CORS, which rules out wildcards; fall
    // back to permissive when no frontend origin is configured.
    let cors = match frontend_url {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        None => CorsLayer::permissive(),
    };

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Taprush server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod bookings;
mod config;
mod email;
mod handlers;
mod mentors;
mod middleware;
mod models;
mod notifications;
mod ratings;
mod routes;
mod services;
mod uploads;
mod webhook;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::Json,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mentorhub_common::ApiResponse;
use mentorhub_database::create_pool;

use crate::config::AppConfig;
use crate::email::EmailService;
use crate::services::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mentorhub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database).await?;

    // Run migrations
    mentorhub_database::run_migrations(&db_pool).await?;

    // Create Redis connection
    let redis_service = mentorhub_common::RedisService::new(&config.redis).await?;

    // Create JWT service
    let jwt_service = mentorhub_auth::JwtService::new(&config.jwt.secret);

    // Create email transport
    let email_service = EmailService::new(&config.email)?;

    // Uploads are served from local disk
    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    // Build application state
    let app_state = AppState {
        db_pool,
        redis_service,
        jwt_service,
        email_service,
        config: config.clone(),
    };

    // Build CORS layer from the configured origin allow-list
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = if config.server.cors_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    };

    // Build the application
    let app = Router::new()
        .nest("/api", routes::create_routes(app_state))
        .nest_service("/uploads", ServeDir::new(&config.uploads.dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .fallback(handler_404);

    // Start the server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!(
        "MentorHub API listening on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn handler_404() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}

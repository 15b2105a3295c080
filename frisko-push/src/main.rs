use axum::routing::{delete, get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use frisko_shared::clients::fcm::FcmClient;
use frisko_shared::clients::rabbitmq::RabbitMQClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub fcm: FcmClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    frisko_shared::middleware::init_tracing("frisko-push");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the auth extractor middleware
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    // One FCM client for the process, injected through state
    let fcm = FcmClient::new(&config.fcm_project_id, &config.fcm_access_token);

    let state = Arc::new(AppState { db, config, rabbitmq, fcm });

    // Spawn reservation event subscribers
    let created_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_reservation_created(created_state).await {
            tracing::error!(error = %e, "reservation.created subscriber failed");
        }
    });

    let status_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_reservation_status_changed(status_state).await {
            tracing::error!(error = %e, "reservation.status_changed subscriber failed");
        }
    });

    // Spawn message event subscriber
    let message_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_message_events(message_state).await {
            tracing::error!(error = %e, "message event subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/tokens", post(routes::tokens::register_token))
        .route("/tokens/:token", delete(routes::tokens::unregister_token))
        .route("/push/send", post(routes::push::send))
        .route("/push/send-batch", post(routes::push::send_batch))
        .route("/push/dispatch", post(routes::push::dispatch_queue))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "frisko-push starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use axum::routing::{delete, get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use metrics_exporter_prometheus::PrometheusHandle;
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;
mod socket;

use config::AppConfig;
use frisko_shared::clients::rabbitmq::RabbitMQClient;
use frisko_shared::clients::redis::RedisClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub io: SocketIo,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    frisko_shared::middleware::init_tracing("frisko-api");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the auth extractor middleware
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let metrics_handle = frisko_shared::middleware::init_metrics();

    // Build Socket.IO layer - we need io in AppState for emitting from REST routes
    let (sio_layer, io) = SocketIo::builder().build_layer();

    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        io: io.clone(),
        metrics_handle,
    });

    // Configure the Socket.IO namespace with state via closure
    io.ns("/", {
        let state = state.clone();
        move |socket: socketioxide::extract::SocketRef| {
            let state = state.clone();
            async move {
                socket::handlers::on_connect_with_state(socket, state).await;
            }
        }
    });

    let app = Router::new()
        // Health & metrics
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Profiles
        .route("/me", get(routes::profiles::get_me).patch(routes::profiles::update_me))
        .route("/profiles/:id", get(routes::profiles::get_profile))
        .route("/opgs", get(routes::profiles::list_opgs))
        // Products
        .route("/products", get(routes::products::list_products).post(routes::products::create_product))
        .route("/products/:id", get(routes::products::get_product)
            .patch(routes::products::update_product)
            .delete(routes::products::delete_product))
        // Favorites
        .route("/favorites", get(routes::favorites::list_favorites).post(routes::favorites::add_favorite))
        .route("/favorites/:seller_id", delete(routes::favorites::remove_favorite))
        // Reservations
        .route("/reservations", get(routes::reservations::list_reservations).post(routes::reservations::create_reservation))
        .route("/reservations/:id/status", post(routes::reservations::update_status))
        // Messaging
        .route("/messages", post(routes::messages::send_message))
        .route("/conversations", get(routes::conversations::list_conversations))
        .route("/conversations/:partner_id/messages", get(routes::messages::list_thread))
        .route("/conversations/:partner_id/read", post(routes::messages::mark_thread_read))
        .route("/unread-count", get(routes::messages::get_unread_count))
        // Notifications
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/mark-all-read", post(routes::notifications::mark_all_read))
        .layer(axum::middleware::from_fn(frisko_shared::middleware::metrics_middleware))
        .layer(sio_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "frisko-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

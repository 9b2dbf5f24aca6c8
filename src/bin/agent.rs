use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::Database;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::error;
use zonepulse_server::agent::event_loop::{EntityChangeEvent, EventLoop};
use zonepulse_server::config::Config;

struct AppState {
    tx: mpsc::Sender<EntityChangeEvent>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    zonepulse_server::telemetry::init_telemetry("zonepulse-agent");

    tracing::info!("Starting ZonePulse Agent Service...");

    let config = Config::from_env();

    // Database Connection
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Redis Connection (notification delivery queue)
    let redis_client = redis::Client::open(config.redis_url.clone()).expect("Invalid Redis URL");

    // Create Channel for the event queue
    let (tx, mut rx) = mpsc::channel::<EntityChangeEvent>(100);

    let event_loop = Arc::new(EventLoop::new(db, redis_client));

    // Spawn Dispatcher Task with Concurrency Limit
    let loop_logic = event_loop.clone();
    tokio::spawn(async move {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(2));
        while let Some(event) = rx.recv().await {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let logic = loop_logic.clone();
            tokio::spawn(async move {
                logic.process_event(event).await;
                drop(permit);
            });
        }
    });

    let state = Arc::new(AppState { tx });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/event", post(handle_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3002));
    tracing::info!("Agent listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health_check() -> &'static str {
    "OK"
}

async fn handle_event(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    Json(event): Json<EntityChangeEvent>,
) -> &'static str {
    tracing::info!(entity_id = %event.entity_id, "Received entity change webhook");

    // Send to channel, don't wait for evaluation
    match state.tx.send(event).await {
        Ok(_) => "Queued",
        Err(_) => {
            error!("Failed to queue event - channel closed");
            "Error"
        }
    }
}

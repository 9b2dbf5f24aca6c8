use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use zonepulse_server::config::Config;
use zonepulse_server::migrator::Migrator;
use zonepulse_server::worker;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    zonepulse_server::telemetry::init_telemetry("zonepulse-worker");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Spawn metrics server
    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(
                "/metrics",
                axum::routing::get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], 9091));
        tracing::info!("Metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config::from_env();
    if config.device_api.is_none() {
        tracing::warn!("Device API credentials not set; push cycles will be skipped");
    }

    // Database Connection
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Migration failed");

    // Redis Connection
    let redis_client = redis::Client::open(config.redis_url.clone()).expect("Invalid Redis URL");

    zonepulse_server::metrics::init_metrics(&db).await;

    tracing::info!("Starting background worker...");

    // Notification delivery workers (3 concurrent) + backlog sweep
    worker::start_delivery_workers(redis_client.clone(), db.clone(), 3).await;
    worker::start_backlog_sweep(redis_client.clone(), db.clone()).await;

    // Thermostat push cycle
    {
        let db = db.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.push_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let started = std::time::Instant::now();
                zonepulse_server::hvac::push::run_push_cycle(&db, &config, "cron-5min").await;
                zonepulse_server::metrics::record_push_cycle_duration(
                    started.elapsed().as_secs_f64(),
                );
            }
        });
    }

    // Alert cron pass
    {
        let db = db.clone();
        let redis_client = redis_client.clone();
        let interval_duration = config.alert_cron_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                zonepulse_server::alerts::evaluator::run_cron_pass(&db, &redis_client).await;
            }
        });
    }

    // Repeat-notification pass
    {
        let db = db.clone();
        let redis_client = redis_client.clone();
        let interval_duration = config.repeat_pass_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                zonepulse_server::alerts::notify::run_repeat_pass(&db, &redis_client).await;
            }
        });
    }

    // Keep the main process alive
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down worker process"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}

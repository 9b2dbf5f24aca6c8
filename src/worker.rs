//! Notification delivery worker: drains the redis queue, transmits each
//! row over its channel, and flips its status. Dashboard rows are terminal
//! at `sent` — the UI reads them in place. A periodic backlog sweep
//! re-queues pending rows whose enqueue was lost.

use crate::alerts::notify::NOTIFICATION_QUEUE;
use crate::entities::notification;
use crate::notifications::AlertNotifier;
use chrono::{Duration, Utc};
use redis::AsyncCommands;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

// Queue Monitoring
pub async fn start_queue_monitor(redis_client: redis::Client) {
    let redis_client = Arc::new(redis_client);

    tokio::spawn(async move {
        tracing::info!("Queue Monitor started");
        loop {
            let mut conn = match redis_client.get_multiplexed_async_connection().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Queue Monitor: Failed to get redis conn: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(15)).await;
                    continue;
                }
            };

            let queue_len: redis::RedisResult<u64> = conn.llen(NOTIFICATION_QUEUE).await;
            match queue_len {
                Ok(len) => metrics::gauge!("zonepulse_queue_depth", "queue" => NOTIFICATION_QUEUE)
                    .set(len as f64),
                Err(e) => tracing::error!("Failed to get {} len: {}", NOTIFICATION_QUEUE, e),
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(15)).await;
        }
    });
}

pub async fn start_delivery_workers(
    redis_client: redis::Client,
    db: DatabaseConnection,
    concurrency: usize,
) {
    start_queue_monitor(redis_client.clone()).await;

    let db = Arc::new(db);
    let redis_client = Arc::new(redis_client);
    let notifier = Arc::new(AlertNotifier::new());

    for i in 0..concurrency {
        let db = db.clone();
        let redis_client = redis_client.clone();
        let notifier = notifier.clone();

        tokio::spawn(async move {
            tracing::info!("Delivery worker {} started", i);
            loop {
                let mut conn = match redis_client.get_multiplexed_async_connection().await {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::error!("Worker {}: Failed to get redis conn: {}", i, e);
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let result: redis::RedisResult<(String, String)> =
                    conn.blpop(NOTIFICATION_QUEUE, 0.0).await;

                match result {
                    Ok((_key, id_str)) => {
                        let id = match Uuid::parse_str(&id_str) {
                            Ok(id) => id,
                            Err(_) => {
                                tracing::error!("Worker {}: Invalid notification id", i);
                                continue;
                            }
                        };
                        deliver_notification(id, &db, &notifier).await;
                    }
                    Err(e) => {
                        tracing::error!("Worker {}: Redis error: {}", i, e);
                        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }
}

async fn deliver_notification(id: Uuid, db: &DatabaseConnection, notifier: &AlertNotifier) {
    let row = match notification::Entity::find_by_id(id).one(db).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            tracing::error!(notification_id = %id, "Notification row not found");
            return;
        }
        Err(e) => {
            tracing::error!(notification_id = %id, "Failed to load notification: {}", e);
            return;
        }
    };
    // A row can be queued twice (enqueue + backlog sweep); only pending
    // rows are delivered.
    if row.status != "pending" {
        return;
    }

    let outcome = match row.channel.as_str() {
        // Dashboard rows need no transmission; marking them sent makes
        // them visible to the feed.
        "dashboard" => Ok(()),
        "email" => match row.recipient.as_deref() {
            Some(email) => notifier.send_email(email, &row.title, &row.message).await,
            None => Err("no recipient address".to_string()),
        },
        "sms" => match row.recipient.as_deref() {
            Some(phone) => notifier.send_sms(phone, &row.message).await,
            None => Err("no recipient number".to_string()),
        },
        other => Err(format!("unknown channel: {}", other)),
    };

    let mut active: notification::ActiveModel = row.into();
    match outcome {
        Ok(()) => {
            active.status = Set("sent".to_string());
            active.sent_at = Set(Some(Utc::now()));
        }
        Err(reason) => {
            tracing::error!(notification_id = %id, "Delivery failed: {}", reason);
            active.status = Set("failed".to_string());
            active.error = Set(Some(reason));
        }
    }
    if let Err(e) = active.update(db).await {
        tracing::error!(notification_id = %id, "Failed to update notification status: {}", e);
    }
}

/// Re-queue pending rows whose redis enqueue was lost (e.g. redis was down
/// at dispatch time). Runs alongside the delivery workers.
pub async fn start_backlog_sweep(redis_client: redis::Client, db: DatabaseConnection) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;

            let cutoff = Utc::now() - Duration::minutes(2);
            let stale = match notification::Entity::find()
                .filter(notification::Column::Status.eq("pending"))
                .filter(notification::Column::CreatedAt.lt(cutoff))
                .all(&db)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!("Backlog sweep query failed: {}", e);
                    continue;
                }
            };
            if stale.is_empty() {
                continue;
            }

            let mut conn = match redis_client.get_multiplexed_async_connection().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Backlog sweep: Failed to get redis conn: {}", e);
                    continue;
                }
            };
            tracing::info!("Backlog sweep re-queuing {} notifications", stale.len());
            for row in stale {
                let res: redis::RedisResult<()> =
                    conn.rpush(NOTIFICATION_QUEUE, row.id.to_string()).await;
                if let Err(e) = res {
                    tracing::error!(notification_id = %row.id, "Re-queue failed: {}", e);
                }
            }
        }
    });
}

use crate::entities::{alert_definition, site, zone};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

pub async fn init_metrics(db: &DatabaseConnection) {
    let site_count = site::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("zonepulse_sites_total").set(site_count as f64);

    let zone_count = zone::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("zonepulse_zones_total").set(zone_count as f64);

    let definition_count = alert_definition::Entity::find()
        .filter(alert_definition::Column::Enabled.eq(true))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("zonepulse_alert_definitions_total").set(definition_count as f64);

    tracing::info!(
        "Initialized metrics: Sites={}, Zones={}, Definitions={}",
        site_count,
        zone_count,
        definition_count
    );
}

pub fn increment_pushes(pushed: bool) {
    let result = if pushed { "pushed" } else { "skipped" };
    metrics::counter!("zonepulse_pushes_total", "result" => result).increment(1);
}

pub fn increment_guardrail_overrides(zone_id: i32) {
    metrics::counter!("zonepulse_guardrail_overrides_total", "zone_id" => zone_id.to_string())
        .increment(1);
}

pub fn increment_alerts_fired(severity: &str) {
    metrics::counter!("zonepulse_alerts_fired_total", "severity" => severity.to_string())
        .increment(1);
}

pub fn increment_alerts_resolved(severity: &str) {
    metrics::counter!("zonepulse_alerts_resolved_total", "severity" => severity.to_string())
        .increment(1);
}

pub fn increment_notifications_enqueued(channel: &str) {
    metrics::counter!("zonepulse_notifications_enqueued_total", "channel" => channel.to_string())
        .increment(1);
}

pub fn increment_notifications_sent(channel: &str) {
    metrics::counter!("zonepulse_notifications_sent_total", "channel" => channel.to_string())
        .increment(1);
}

pub fn increment_notifications_failed(channel: &str) {
    metrics::counter!("zonepulse_notifications_failed_total", "channel" => channel.to_string())
        .increment(1);
}

pub fn record_push_cycle_duration(seconds: f64) {
    metrics::histogram!("zonepulse_push_cycle_duration_seconds").record(seconds);
}

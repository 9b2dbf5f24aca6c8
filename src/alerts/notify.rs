//! Notification fan-out: one row per (instance, subscription, enabled
//! channel), quiet-hours suppression for email/SMS, a fallback dashboard
//! row for unsubscribed definitions, and the periodic repeat pass.
//!
//! Rows are written `pending` and their ids pushed to the redis delivery
//! queue; the delivery worker owns transmission and status updates.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use redis::AsyncCommands;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::entities::{alert_definition, alert_instance, alert_subscription, notification};
use crate::notifications::NotificationTemplates;

pub const NOTIFICATION_QUEUE: &str = "notification_queue";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Fired,
    Repeat,
    Resolved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Fired => "fired",
            NotificationKind::Repeat => "repeat",
            NotificationKind::Resolved => "resolved",
        }
    }
}

/// Whether `now` falls inside the subscriber's quiet-hours window, in the
/// subscriber's local clock. Windows may wrap midnight. No window means
/// never quiet.
pub fn in_quiet_hours(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    utc_offset_minutes: i32,
    now: DateTime<Utc>,
) -> bool {
    let (Some(start), Some(end)) = (start, end) else {
        return false;
    };
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    let local = now.with_timezone(&offset).time();
    if start <= end {
        local >= start && local < end
    } else {
        local >= start || local < end
    }
}

/// Whether a repeat notification is due for one subscription.
pub fn repeat_due(
    sent_repeats: u64,
    max_repeats: i32,
    last_notified_at: Option<DateTime<Utc>>,
    repeat_interval_minutes: i32,
    now: DateTime<Utc>,
) -> bool {
    if max_repeats <= 0 || sent_repeats >= max_repeats as u64 {
        return false;
    }
    match last_notified_at {
        Some(last) => now - last >= Duration::minutes(repeat_interval_minutes as i64),
        None => true,
    }
}

struct PendingRow {
    subscription_id: Option<Uuid>,
    channel: &'static str,
    recipient: Option<String>,
    title: String,
    message: String,
}

fn rows_for_subscription(
    sub: &alert_subscription::Model,
    def: &alert_definition::Model,
    instance: &alert_instance::Model,
    kind: NotificationKind,
    now: DateTime<Utc>,
) -> Vec<PendingRow> {
    if kind == NotificationKind::Resolved && !sub.send_resolved {
        return Vec::new();
    }
    let quiet = in_quiet_hours(
        sub.quiet_hours_start,
        sub.quiet_hours_end,
        sub.utc_offset_minutes,
        now,
    );

    let title = NotificationTemplates::alert_title(&def.name, &def.severity, kind.as_str());
    let mut rows = Vec::new();
    if sub.dashboard_enabled {
        rows.push(PendingRow {
            subscription_id: Some(sub.id),
            channel: "dashboard",
            recipient: None,
            title: title.clone(),
            message: NotificationTemplates::alert_dashboard(def, instance, kind.as_str()),
        });
    }
    // Quiet hours suppress the interrupting channels only; dashboard rows
    // still land for morning review.
    if !quiet {
        if sub.email_enabled {
            if let Some(email) = &sub.email {
                rows.push(PendingRow {
                    subscription_id: Some(sub.id),
                    channel: "email",
                    recipient: Some(email.clone()),
                    title: title.clone(),
                    message: NotificationTemplates::alert_email(def, instance, kind.as_str()),
                });
            }
        }
        if sub.sms_enabled {
            if let Some(phone) = &sub.phone {
                rows.push(PendingRow {
                    subscription_id: Some(sub.id),
                    channel: "sms",
                    recipient: Some(phone.clone()),
                    title,
                    message: NotificationTemplates::alert_sms(def, instance, kind.as_str()),
                });
            }
        }
    }
    rows
}

async fn persist_and_enqueue(
    db: &DatabaseConnection,
    redis: &redis::Client,
    instance: &alert_instance::Model,
    def: &alert_definition::Model,
    kind: NotificationKind,
    repeat_seq: i32,
    rows: Vec<PendingRow>,
    now: DateTime<Utc>,
) {
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        let id = Uuid::new_v4();
        let model = notification::ActiveModel {
            id: Set(id),
            instance_id: Set(instance.id),
            subscription_id: Set(row.subscription_id),
            channel: Set(row.channel.to_string()),
            kind: Set(kind.as_str().to_string()),
            status: Set("pending".to_string()),
            recipient: Set(row.recipient),
            title: Set(row.title),
            message: Set(row.message),
            severity: Set(def.severity.clone()),
            repeat_seq: Set(repeat_seq),
            error: Set(None),
            created_at: Set(now),
            sent_at: Set(None),
        };
        match model.insert(db).await {
            Ok(_) => {
                crate::metrics::increment_notifications_enqueued(row.channel);
                ids.push(id);
            }
            Err(e) => error!(instance_id = %instance.id, "Failed to write notification: {}", e),
        }
    }
    if ids.is_empty() {
        return;
    }

    let mut conn = match redis.get_multiplexed_async_connection().await {
        Ok(c) => c,
        Err(e) => {
            // Rows stay pending; the delivery worker's backlog sweep picks
            // them up.
            warn!("Redis unavailable, notifications stay queued in DB: {}", e);
            return;
        }
    };
    for id in ids {
        let res: redis::RedisResult<()> = conn.rpush(NOTIFICATION_QUEUE, id.to_string()).await;
        if let Err(e) = res {
            warn!(notification_id = %id, "Failed to enqueue notification: {}", e);
        }
    }
}

/// Fan a fired/resolved event out to the definition's subscriptions. A
/// definition without subscriptions still gets one dashboard row for
/// visibility.
pub async fn dispatch(
    db: &DatabaseConnection,
    redis: &redis::Client,
    def: &alert_definition::Model,
    instance: &alert_instance::Model,
    kind: NotificationKind,
    now: DateTime<Utc>,
) {
    let subs = match alert_subscription::Entity::find()
        .filter(alert_subscription::Column::DefinitionId.eq(def.id))
        .filter(alert_subscription::Column::Enabled.eq(true))
        .all(db)
        .await
    {
        Ok(subs) => subs,
        Err(e) => {
            error!(definition_id = %def.id, "Failed to load subscriptions: {}", e);
            return;
        }
    };

    let rows = if subs.is_empty() {
        vec![PendingRow {
            subscription_id: None,
            channel: "dashboard",
            recipient: None,
            title: NotificationTemplates::alert_title(&def.name, &def.severity, kind.as_str()),
            message: NotificationTemplates::alert_dashboard(def, instance, kind.as_str()),
        }]
    } else {
        subs.iter()
            .flat_map(|sub| rows_for_subscription(sub, def, instance, kind, now))
            .collect()
    };

    persist_and_enqueue(db, redis, instance, def, kind, 0, rows, now).await;
}

/// Periodic re-notification of still-active alerts, gated per subscription
/// by max-repeat-count and minimum interval; each repeat carries an
/// incrementing sequence number.
pub async fn run_repeat_pass(db: &DatabaseConnection, redis: &redis::Client) {
    let now = Utc::now();
    let instances = match alert_instance::Entity::find()
        .filter(alert_instance::Column::Status.eq("active"))
        .all(db)
        .await
    {
        Ok(i) => i,
        Err(e) => {
            error!("Failed to load active instances: {}", e);
            return;
        }
    };

    for instance in instances {
        let def = match alert_definition::Entity::find_by_id(instance.definition_id)
            .one(db)
            .await
        {
            Ok(Some(def)) => def,
            Ok(None) => continue,
            Err(e) => {
                error!(instance_id = %instance.id, "Definition lookup failed: {}", e);
                continue;
            }
        };
        let subs = match alert_subscription::Entity::find()
            .filter(alert_subscription::Column::DefinitionId.eq(def.id))
            .filter(alert_subscription::Column::Enabled.eq(true))
            .all(db)
            .await
        {
            Ok(subs) => subs,
            Err(e) => {
                error!(definition_id = %def.id, "Failed to load subscriptions: {}", e);
                continue;
            }
        };

        for sub in subs {
            let sent_repeats = match notification::Entity::find()
                .filter(notification::Column::InstanceId.eq(instance.id))
                .filter(notification::Column::SubscriptionId.eq(sub.id))
                .filter(notification::Column::Kind.eq("repeat"))
                .count(db)
                .await
            {
                Ok(n) => n,
                Err(e) => {
                    error!(subscription_id = %sub.id, "Repeat count failed: {}", e);
                    continue;
                }
            };
            let last_notified_at = match notification::Entity::find()
                .filter(notification::Column::InstanceId.eq(instance.id))
                .filter(notification::Column::SubscriptionId.eq(sub.id))
                .order_by_desc(notification::Column::CreatedAt)
                .one(db)
                .await
            {
                Ok(n) => n.map(|n| n.created_at),
                Err(e) => {
                    error!(subscription_id = %sub.id, "Last-notification lookup failed: {}", e);
                    continue;
                }
            };

            if !repeat_due(
                sent_repeats,
                sub.max_repeats,
                last_notified_at,
                sub.repeat_interval_minutes,
                now,
            ) {
                continue;
            }

            let rows = rows_for_subscription(&sub, &def, &instance, NotificationKind::Repeat, now);
            persist_and_enqueue(
                db,
                redis,
                &instance,
                &def,
                NotificationKind::Repeat,
                sent_repeats as i32 + 1,
                rows,
                now,
            )
            .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at_utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn no_window_is_never_quiet() {
        assert!(!in_quiet_hours(None, None, 0, at_utc(3, 0)));
        assert!(!in_quiet_hours(Some(t(22, 0)), None, 0, at_utc(23, 0)));
    }

    #[test]
    fn quiet_window_respects_local_offset() {
        // 22:00-07:00 local at UTC-5: 03:00 UTC is 22:00 local, quiet.
        assert!(in_quiet_hours(Some(t(22, 0)), Some(t(7, 0)), -300, at_utc(3, 0)));
        // 17:00 UTC is 12:00 local, not quiet.
        assert!(!in_quiet_hours(Some(t(22, 0)), Some(t(7, 0)), -300, at_utc(17, 0)));
    }

    #[test]
    fn wrapping_window_covers_both_sides_of_midnight() {
        let start = Some(t(22, 0));
        let end = Some(t(7, 0));
        assert!(in_quiet_hours(start, end, 0, at_utc(23, 30)));
        assert!(in_quiet_hours(start, end, 0, at_utc(6, 59)));
        assert!(!in_quiet_hours(start, end, 0, at_utc(7, 0)));
        assert!(!in_quiet_hours(start, end, 0, at_utc(12, 0)));
    }

    #[test]
    fn non_wrapping_window_is_half_open() {
        let start = Some(t(9, 0));
        let end = Some(t(17, 0));
        assert!(in_quiet_hours(start, end, 0, at_utc(9, 0)));
        assert!(in_quiet_hours(start, end, 0, at_utc(16, 59)));
        assert!(!in_quiet_hours(start, end, 0, at_utc(17, 0)));
    }

    #[test]
    fn repeat_gating_honors_count_and_interval() {
        let now = at_utc(12, 0);
        // Disabled repeats.
        assert!(!repeat_due(0, 0, None, 60, now));
        // Cap reached.
        assert!(!repeat_due(3, 3, Some(now - Duration::hours(5)), 60, now));
        // Interval not yet elapsed.
        assert!(!repeat_due(1, 3, Some(now - Duration::minutes(30)), 60, now));
        // Due.
        assert!(repeat_due(1, 3, Some(now - Duration::minutes(60)), 60, now));
        // Never notified somehow: due immediately.
        assert!(repeat_due(0, 3, None, 60, now));
    }
}

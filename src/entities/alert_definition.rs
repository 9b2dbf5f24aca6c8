use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A configurable alert rule: target selector, condition parameters,
/// sustain window, scope filter. Deleting a definition cascades to its
/// eval state and instances.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_definition")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,

    /// "entity" | "equipment_role" | "zone_metric" | "anomaly_flag"
    pub target_kind: String,
    pub entity_id: Option<String>,
    pub equipment_type: Option<String>,
    pub sensor_role: Option<String>,
    /// Derived-metric or anomaly-flag key for zone-level targets.
    pub metric: Option<String>,

    /// "above_threshold" | "below_threshold" | "changes_to" | "stale" |
    /// "rate_of_change"
    pub condition_type: String,
    pub threshold_value: Option<f64>,
    pub target_value: Option<String>,
    /// "string" | "number" | "boolean"
    pub target_value_type: Option<String>,
    pub stale_minutes: Option<i32>,
    pub delta_value: Option<f64>,
    /// "increase" | "decrease"; None means either direction.
    pub delta_direction: Option<String>,
    pub window_minutes: Option<i32>,

    pub sustain_minutes: i32,
    /// "realtime" | "cron" | "auto"
    pub eval_path: String,
    /// Closed scope struct, see `alerts::targets::ScopeFilter`.
    #[sea_orm(column_type = "JsonBinary")]
    pub scope: Json,
    pub severity: String,
    pub enabled: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::alert_eval_state::Entity")]
    AlertEvalState,
    #[sea_orm(has_many = "super::alert_instance::Entity")]
    AlertInstance,
    #[sea_orm(has_many = "super::alert_subscription::Entity")]
    AlertSubscription,
}

impl Related<super::alert_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertInstance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

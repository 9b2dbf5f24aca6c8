use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only delivery audit: one row per (instance, subscription,
/// channel) attempt. The delivery worker flips status and stamps errors;
/// the evaluation engine only inserts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub instance_id: Uuid,
    /// None for the fallback dashboard row emitted when a definition has
    /// no subscriptions.
    pub subscription_id: Option<Uuid>,
    /// "dashboard" | "email" | "sms"
    pub channel: String,
    /// "fired" | "repeat" | "resolved"
    pub kind: String,
    /// "pending" | "sent" | "failed"
    pub status: String,
    pub recipient: Option<String>,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub severity: String,
    /// 0 for the initial fired/resolved rows; increments per repeat.
    pub repeat_seq: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub created_at: DateTimeUtc,
    pub sent_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert_instance::Entity",
        from = "Column::InstanceId",
        to = "super::alert_instance::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    AlertInstance,
}

impl Related<super::alert_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertInstance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One firing episode. A partial unique index on (definition_id,
/// target_key) WHERE status = 'active' guarantees at most one active
/// instance per target; a duplicate insert is a benign no-op.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_instance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub definition_id: Uuid,
    pub target_key: String,
    /// "active" | "resolved"
    pub status: String,

    pub first_detected_at: DateTimeUtc,
    pub fired_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,

    pub trigger_value: Option<String>,
    pub peak_value: Option<f64>,
    pub last_value: Option<String>,
    /// Free-form context snapshot at fire time.
    #[sea_orm(column_type = "JsonBinary")]
    pub context: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert_definition::Entity",
        from = "Column::DefinitionId",
        to = "super::alert_definition::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    AlertDefinition,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::alert_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertDefinition.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub definition_id: Uuid,
    pub recipient_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub dashboard_enabled: bool,
    pub email_enabled: bool,
    pub sms_enabled: bool,

    /// Quiet-hours window in the subscriber's local clock; email/SMS are
    /// suppressed inside it.
    pub quiet_hours_start: Option<Time>,
    pub quiet_hours_end: Option<Time>,
    pub utc_offset_minutes: i32,

    pub send_resolved: bool,
    pub max_repeats: i32,
    pub repeat_interval_minutes: i32,
    pub enabled: bool,
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
}

impl Related<super::alert_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertDefinition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

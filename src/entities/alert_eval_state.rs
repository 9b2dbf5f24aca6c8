use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per (definition, target) evaluation memory, created lazily on first
/// evaluation. The unit of consistency for the state machine.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_eval_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub definition_id: Uuid,
    pub target_key: String,

    pub last_value: Option<String>,
    pub last_value_ts: Option<DateTimeUtc>,
    pub condition_met: bool,
    pub condition_met_since: Option<DateTimeUtc>,
    pub fired: bool,
    /// Rolling window of timestamped values for rate-of-change conditions.
    #[sea_orm(column_type = "JsonBinary")]
    pub window: Json,
    pub updated_at: DateTimeUtc,
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

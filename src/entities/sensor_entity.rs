use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mirror of the external entity-sync table: last value and freshness per
/// device entity. Read-only from the core's perspective.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "sensor_entity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_id: String,
    pub space_id: Option<i32>,
    pub equipment_id: Option<i32>,
    /// Explicit role tag: "temperature", "humidity", "motion",
    /// "supply_temp", "return_temp", "compressor", "thermostat".
    pub role: String,
    /// Weight within the space-level average; 1.0 when unset.
    pub weight: Option<f64>,
    pub last_value: Option<String>,
    pub last_seen: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::space::Entity",
        from = "Column::SpaceId",
        to = "super::space::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Space,
    #[sea_orm(
        belongs_to = "super::equipment::Entity",
        from = "Column::EquipmentId",
        to = "super::equipment::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Equipment,
}

impl Related<super::space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Space.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

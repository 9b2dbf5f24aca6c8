use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit of every push cycle, one row per zone. Site-level
/// failures (missing credentials, unreachable device API) write a row with
/// no zone. The snapshot columns are read back over trailing windows to
/// detect cycling and delayed-response anomalies.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "setpoint_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub site_id: i32,
    pub zone_id: Option<i32>,
    /// Free-form scheduler label, e.g. "cron-5min". Traceability only.
    pub trigger: String,
    /// "occupied" | "unoccupied" | "n/a"
    pub phase: String,
    pub entity_id: Option<String>,

    pub zone_temp_f: Option<f64>,
    pub supply_temp_f: Option<f64>,
    pub return_temp_f: Option<f64>,
    pub compressor_on: Option<bool>,

    /// Full push-result payload.
    pub payload: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Site,
    #[sea_orm(
        belongs_to = "super::zone::Entity",
        from = "Column::ZoneId",
        to = "super::zone::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Zone,
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One controllable HVAC unit: a thermostat plus the equipment it drives
/// and the spaces it serves. Setpoint fields are the zone's own override
/// values, used when no profile is linked or `is_override` is set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "zone")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub site_id: i32,
    pub name: String,
    pub equipment_id: i32,
    /// Device API entity id of the thermostat.
    pub thermostat_entity_id: String,
    pub profile_id: Option<i32>,
    /// When true the zone's own fields win even if a profile is linked.
    pub is_override: bool,

    pub occupied_heat_f: Option<f64>,
    pub occupied_cool_f: Option<f64>,
    pub occupied_hvac_mode: Option<String>,
    pub occupied_fan_mode: Option<String>,
    pub unoccupied_heat_f: Option<f64>,
    pub unoccupied_cool_f: Option<f64>,
    pub unoccupied_hvac_mode: Option<String>,
    pub unoccupied_fan_mode: Option<String>,

    /// Hard safety bounds; always sourced from the zone, never the profile.
    pub guardrail_min_f: f64,
    pub guardrail_max_f: f64,
    /// Max magnitude of the manager-deviation adjustment.
    pub manager_offset_max_f: f64,

    /// Per-zone overrides for anomaly detection thresholds; fields absent
    /// here fall back to the built-in defaults.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub anomaly_thresholds: Option<Json>,
    /// Device state captured by the last read-back; the idempotence
    /// baseline for the next push cycle.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub last_known_state: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_directive: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
        belongs_to = "super::equipment::Entity",
        from = "Column::EquipmentId",
        to = "super::equipment::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Equipment,
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ProfileId",
        to = "super::profile::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Profile,
    #[sea_orm(has_many = "super::space::Entity")]
    Space,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Space.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

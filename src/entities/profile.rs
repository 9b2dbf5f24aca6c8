use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named, reusable bundle of phase setpoints/modes and adjustment-feature
/// toggles. Many zones may reference one profile; profiles never carry
/// guardrails.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub org_id: Option<i32>,
    /// Shared across organizations when set.
    pub is_global: bool,

    pub occupied_heat_f: Option<f64>,
    pub occupied_cool_f: Option<f64>,
    pub occupied_hvac_mode: Option<String>,
    pub occupied_fan_mode: Option<String>,
    pub unoccupied_heat_f: Option<f64>,
    pub unoccupied_cool_f: Option<f64>,
    pub unoccupied_hvac_mode: Option<String>,
    pub unoccupied_fan_mode: Option<String>,

    pub feels_like_enabled: bool,
    pub feels_like_max_f: f64,
    pub smart_start_enabled: bool,
    pub smart_start_max_f: f64,
    pub smart_start_lead_minutes: i32,
    pub occupancy_enabled: bool,
    pub occupancy_max_f: f64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::zone::Entity")]
    Zone,
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

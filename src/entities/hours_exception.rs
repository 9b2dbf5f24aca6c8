use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Date-specific override of the base store hours. `single_day` rows use
/// `open_time`/`close_time` for `start_date` only; `date_range` rows span
/// [start_date, end_date] with distinct first-day, middle-day and last-day
/// hours.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "hours_exception")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub site_id: i32,
    /// "single_day" | "date_range"
    pub kind: String,
    pub start_date: Date,
    pub end_date: Date,
    pub closed: bool,

    pub open_time: Option<Time>,
    pub close_time: Option<Time>,

    pub first_open_time: Option<Time>,
    pub first_close_time: Option<Time>,
    pub middle_open_time: Option<Time>,
    pub middle_close_time: Option<Time>,
    pub last_open_time: Option<Time>,
    pub last_close_time: Option<Time>,
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
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

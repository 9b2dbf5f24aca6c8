//! Target resolution: expand an alert definition into the concrete
//! (definition, target) pairs it currently applies to, honoring the
//! definition's scope filter.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entities::{alert_definition, equipment, sensor_entity, zone};

/// Closed scope configuration stored as JSON on the definition. Validated
/// here, at the persistence boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeFilter {
    #[serde(default)]
    pub mode: ScopeMode,
    #[serde(default)]
    pub site_ids: Vec<i32>,
    #[serde(default)]
    pub equipment_ids: Vec<i32>,
    #[serde(default)]
    pub zone_ids: Vec<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    #[default]
    All,
    Include,
    Exclude,
}

impl ScopeFilter {
    pub fn from_json(value: &serde_json::Value) -> ScopeFilter {
        match serde_json::from_value(value.clone()) {
            Ok(scope) => scope,
            Err(e) => {
                warn!("Invalid scope filter, treating as unscoped: {}", e);
                ScopeFilter::default()
            }
        }
    }

    /// Whether a unit identified by any of the given ids is in scope.
    pub fn allows(
        &self,
        site_id: Option<i32>,
        equipment_id: Option<i32>,
        zone_id: Option<i32>,
    ) -> bool {
        let listed = site_id.map(|id| self.site_ids.contains(&id)).unwrap_or(false)
            || equipment_id
                .map(|id| self.equipment_ids.contains(&id))
                .unwrap_or(false)
            || zone_id.map(|id| self.zone_ids.contains(&id)).unwrap_or(false);
        match self.mode {
            ScopeMode::All => true,
            ScopeMode::Include => listed,
            ScopeMode::Exclude => !listed,
        }
    }
}

/// A concrete evaluation target after selector and scope resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Stable key for the eval-state row, e.g. "sensor.supply_temp_1",
    /// "equipment:4:supply_temp", "zone:12:anomaly_count".
    pub key: String,
    pub entity_id: Option<String>,
    pub equipment_id: Option<i32>,
    pub zone_id: Option<i32>,
    pub site_id: Option<i32>,
}

/// Expand a definition into its current targets.
///
/// A specific entity resolves to exactly one target; equipment-type+role
/// resolves to one per matching unit that has a sensor of that role;
/// zone-metric and anomaly-flag definitions resolve to one per zone in
/// scope.
pub async fn resolve_targets(
    db: &DatabaseConnection,
    def: &alert_definition::Model,
) -> Result<Vec<Target>, DbErr> {
    let scope = ScopeFilter::from_json(&def.scope);

    match def.target_kind.as_str() {
        "entity" => {
            let Some(entity_id) = def.entity_id.as_deref() else {
                return Ok(Vec::new());
            };
            let Some(entity) = sensor_entity::Entity::find_by_id(entity_id.to_string())
                .one(db)
                .await?
            else {
                return Ok(Vec::new());
            };
            if !scope.allows(None, entity.equipment_id, None) {
                return Ok(Vec::new());
            }
            Ok(vec![Target {
                key: entity.entity_id.clone(),
                entity_id: Some(entity.entity_id),
                equipment_id: entity.equipment_id,
                zone_id: None,
                site_id: None,
            }])
        }
        "equipment_role" => {
            let (Some(equipment_type), Some(role)) =
                (def.equipment_type.as_deref(), def.sensor_role.as_deref())
            else {
                return Ok(Vec::new());
            };
            let units = equipment::Entity::find()
                .filter(equipment::Column::EquipmentType.eq(equipment_type))
                .all(db)
                .await?;
            let mut targets = Vec::new();
            for unit in units {
                if !scope.allows(Some(unit.site_id), Some(unit.id), None) {
                    continue;
                }
                let sensor = sensor_entity::Entity::find()
                    .filter(sensor_entity::Column::EquipmentId.eq(unit.id))
                    .filter(sensor_entity::Column::Role.eq(role))
                    .one(db)
                    .await?;
                if let Some(sensor) = sensor {
                    targets.push(Target {
                        key: format!("equipment:{}:{}", unit.id, role),
                        entity_id: Some(sensor.entity_id),
                        equipment_id: Some(unit.id),
                        zone_id: None,
                        site_id: Some(unit.site_id),
                    });
                }
            }
            Ok(targets)
        }
        "zone_metric" | "anomaly_flag" => {
            let Some(metric) = def.metric.as_deref() else {
                return Ok(Vec::new());
            };
            let zones = zone::Entity::find().all(db).await?;
            Ok(zones
                .into_iter()
                .filter(|z| scope.allows(Some(z.site_id), Some(z.equipment_id), Some(z.id)))
                .map(|z| Target {
                    key: format!("zone:{}:{}", z.id, metric),
                    entity_id: None,
                    equipment_id: Some(z.equipment_id),
                    zone_id: Some(z.id),
                    site_id: Some(z.site_id),
                })
                .collect())
        }
        other => {
            warn!(definition_id = %def.id, "Unknown target kind: {}", other);
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_allows_everything() {
        let scope = ScopeFilter::default();
        assert!(scope.allows(Some(1), Some(2), Some(3)));
        assert!(scope.allows(None, None, None));
    }

    #[test]
    fn include_requires_membership() {
        let scope = ScopeFilter {
            mode: ScopeMode::Include,
            site_ids: vec![1],
            equipment_ids: vec![],
            zone_ids: vec![7],
        };
        assert!(scope.allows(Some(1), None, None));
        assert!(scope.allows(None, None, Some(7)));
        assert!(!scope.allows(Some(2), Some(9), Some(8)));
    }

    #[test]
    fn exclude_rejects_membership() {
        let scope = ScopeFilter {
            mode: ScopeMode::Exclude,
            site_ids: vec![],
            equipment_ids: vec![4],
            zone_ids: vec![],
        };
        assert!(!scope.allows(None, Some(4), None));
        assert!(scope.allows(Some(1), Some(5), None));
    }

    #[test]
    fn invalid_scope_json_degrades_to_unscoped() {
        let scope = ScopeFilter::from_json(&serde_json::json!({ "bogus": true }));
        assert_eq!(scope, ScopeFilter::default());
    }

    #[test]
    fn scope_json_round_trip() {
        let json = serde_json::json!({
            "mode": "include",
            "site_ids": [1, 2],
            "equipment_ids": [],
            "zone_ids": [9]
        });
        let scope = ScopeFilter::from_json(&json);
        assert_eq!(scope.mode, ScopeMode::Include);
        assert_eq!(scope.site_ids, vec![1, 2]);
        assert_eq!(scope.zone_ids, vec![9]);
    }
}

//! Setpoint resolution: zone overrides, optional profile, hard defaults.
//!
//! Pure and total — no I/O, no failure modes. The `source` tag travels with
//! the result for dashboard transparency and audit rows.

use crate::device::HvacMode;
use crate::entities::{profile, zone};
use crate::hvac::Phase;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OCCUPIED_HEAT_F: f64 = 68.0;
pub const DEFAULT_OCCUPIED_COOL_F: f64 = 76.0;
pub const DEFAULT_UNOCCUPIED_HEAT_F: f64 = 55.0;
pub const DEFAULT_UNOCCUPIED_COOL_F: f64 = 85.0;
pub const DEFAULT_FAN_MODE: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetpointSource {
    Profile,
    ZoneOverride,
    Default,
}

impl SetpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetpointSource::Profile => "profile",
            SetpointSource::ZoneOverride => "zone_override",
            SetpointSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSetpoints {
    pub heat_f: f64,
    pub cool_f: f64,
    pub hvac_mode: HvacMode,
    pub fan_mode: String,
}

/// Per-feature adjustment toggles and caps, taken from the profile when one
/// applies. A zone resolving without a profile gets every feature disabled;
/// the manager adjustment is bounded by the zone record instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentPolicy {
    pub feels_like_enabled: bool,
    pub feels_like_max_f: f64,
    pub smart_start_enabled: bool,
    pub smart_start_max_f: f64,
    pub smart_start_lead_minutes: i64,
    pub occupancy_enabled: bool,
    pub occupancy_max_f: f64,
}

impl AdjustmentPolicy {
    pub fn disabled() -> Self {
        AdjustmentPolicy {
            feels_like_enabled: false,
            feels_like_max_f: 0.0,
            smart_start_enabled: false,
            smart_start_max_f: 0.0,
            smart_start_lead_minutes: 0,
            occupancy_enabled: false,
            occupancy_max_f: 0.0,
        }
    }

    fn from_profile(p: &profile::Model) -> Self {
        AdjustmentPolicy {
            feels_like_enabled: p.feels_like_enabled,
            feels_like_max_f: p.feels_like_max_f,
            smart_start_enabled: p.smart_start_enabled,
            smart_start_max_f: p.smart_start_max_f,
            smart_start_lead_minutes: p.smart_start_lead_minutes as i64,
            occupancy_enabled: p.occupancy_enabled,
            occupancy_max_f: p.occupancy_max_f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSetpoints {
    pub occupied: PhaseSetpoints,
    pub unoccupied: PhaseSetpoints,
    pub source: SetpointSource,
    pub adjustments: AdjustmentPolicy,
    /// Always sourced from the zone record; profiles carry no guardrails.
    pub guardrail_min_f: f64,
    pub guardrail_max_f: f64,
    pub manager_offset_max_f: f64,
}

impl ResolvedSetpoints {
    pub fn for_phase(&self, phase: Phase) -> &PhaseSetpoints {
        match phase {
            Phase::Occupied => &self.occupied,
            Phase::Unoccupied => &self.unoccupied,
        }
    }
}

struct FieldSet<'a> {
    occupied_heat_f: Option<f64>,
    occupied_cool_f: Option<f64>,
    occupied_hvac_mode: Option<&'a str>,
    occupied_fan_mode: Option<&'a str>,
    unoccupied_heat_f: Option<f64>,
    unoccupied_cool_f: Option<f64>,
    unoccupied_hvac_mode: Option<&'a str>,
    unoccupied_fan_mode: Option<&'a str>,
}

/// Resolve the effective setpoints for a zone.
///
/// Profile fields win iff the zone links a profile, a profile is supplied,
/// and `is_override` is false. Otherwise the zone's own stored fields apply.
/// Nulls fall back to fixed defaults; a resolution where every setpoint
/// defaulted is tagged `default`.
pub fn resolve(zone: &zone::Model, profile: Option<&profile::Model>) -> ResolvedSetpoints {
    let use_profile = zone.profile_id.is_some() && !zone.is_override && profile.is_some();

    let (fields, mut source, adjustments) = if use_profile {
        let p = profile.unwrap();
        (
            FieldSet {
                occupied_heat_f: p.occupied_heat_f,
                occupied_cool_f: p.occupied_cool_f,
                occupied_hvac_mode: p.occupied_hvac_mode.as_deref(),
                occupied_fan_mode: p.occupied_fan_mode.as_deref(),
                unoccupied_heat_f: p.unoccupied_heat_f,
                unoccupied_cool_f: p.unoccupied_cool_f,
                unoccupied_hvac_mode: p.unoccupied_hvac_mode.as_deref(),
                unoccupied_fan_mode: p.unoccupied_fan_mode.as_deref(),
            },
            SetpointSource::Profile,
            AdjustmentPolicy::from_profile(p),
        )
    } else {
        (
            FieldSet {
                occupied_heat_f: zone.occupied_heat_f,
                occupied_cool_f: zone.occupied_cool_f,
                occupied_hvac_mode: zone.occupied_hvac_mode.as_deref(),
                occupied_fan_mode: zone.occupied_fan_mode.as_deref(),
                unoccupied_heat_f: zone.unoccupied_heat_f,
                unoccupied_cool_f: zone.unoccupied_cool_f,
                unoccupied_hvac_mode: zone.unoccupied_hvac_mode.as_deref(),
                unoccupied_fan_mode: zone.unoccupied_fan_mode.as_deref(),
            },
            SetpointSource::ZoneOverride,
            AdjustmentPolicy::disabled(),
        )
    };

    let all_defaulted = fields.occupied_heat_f.is_none()
        && fields.occupied_cool_f.is_none()
        && fields.unoccupied_heat_f.is_none()
        && fields.unoccupied_cool_f.is_none();
    if all_defaulted {
        source = SetpointSource::Default;
    }

    let occupied = PhaseSetpoints {
        heat_f: fields.occupied_heat_f.unwrap_or(DEFAULT_OCCUPIED_HEAT_F),
        cool_f: fields.occupied_cool_f.unwrap_or(DEFAULT_OCCUPIED_COOL_F),
        hvac_mode: fields
            .occupied_hvac_mode
            .and_then(HvacMode::parse)
            .unwrap_or(HvacMode::HeatCool),
        fan_mode: fields
            .occupied_fan_mode
            .unwrap_or(DEFAULT_FAN_MODE)
            .to_string(),
    };
    let unoccupied = PhaseSetpoints {
        heat_f: fields.unoccupied_heat_f.unwrap_or(DEFAULT_UNOCCUPIED_HEAT_F),
        cool_f: fields.unoccupied_cool_f.unwrap_or(DEFAULT_UNOCCUPIED_COOL_F),
        hvac_mode: fields
            .unoccupied_hvac_mode
            .and_then(HvacMode::parse)
            .unwrap_or(HvacMode::HeatCool),
        fan_mode: fields
            .unoccupied_fan_mode
            .unwrap_or(DEFAULT_FAN_MODE)
            .to_string(),
    };

    ResolvedSetpoints {
        occupied,
        unoccupied,
        source,
        adjustments,
        guardrail_min_f: zone.guardrail_min_f,
        guardrail_max_f: zone.guardrail_max_f,
        manager_offset_max_f: zone.manager_offset_max_f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn base_zone() -> zone::Model {
        zone::Model {
            id: 1,
            site_id: 1,
            name: "Sales Floor".to_string(),
            equipment_id: 1,
            thermostat_entity_id: "climate.rtu_1".to_string(),
            profile_id: None,
            is_override: false,
            occupied_heat_f: Some(70.0),
            occupied_cool_f: Some(74.0),
            occupied_hvac_mode: Some("heat_cool".to_string()),
            occupied_fan_mode: Some("auto".to_string()),
            unoccupied_heat_f: Some(60.0),
            unoccupied_cool_f: Some(82.0),
            unoccupied_hvac_mode: Some("heat_cool".to_string()),
            unoccupied_fan_mode: Some("auto".to_string()),
            guardrail_min_f: 45.0,
            guardrail_max_f: 95.0,
            manager_offset_max_f: 4.0,
            anomaly_thresholds: None,
            last_known_state: None,
            last_directive: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn base_profile() -> profile::Model {
        profile::Model {
            id: 7,
            name: "Retail Standard".to_string(),
            org_id: None,
            is_global: true,
            occupied_heat_f: Some(69.0),
            occupied_cool_f: Some(75.0),
            occupied_hvac_mode: Some("heat_cool".to_string()),
            occupied_fan_mode: Some("auto".to_string()),
            unoccupied_heat_f: Some(58.0),
            unoccupied_cool_f: Some(84.0),
            unoccupied_hvac_mode: Some("heat_cool".to_string()),
            unoccupied_fan_mode: Some("auto".to_string()),
            feels_like_enabled: true,
            feels_like_max_f: 2.0,
            smart_start_enabled: true,
            smart_start_max_f: 1.0,
            smart_start_lead_minutes: 60,
            occupancy_enabled: true,
            occupancy_max_f: 1.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn profile_wins_when_linked_and_not_overridden() {
        let mut zone = base_zone();
        zone.profile_id = Some(7);
        let profile = base_profile();

        let resolved = resolve(&zone, Some(&profile));
        assert_eq!(resolved.source, SetpointSource::Profile);
        assert_eq!(resolved.occupied.heat_f, 69.0);
        assert_eq!(resolved.unoccupied.cool_f, 84.0);
        assert!(resolved.adjustments.feels_like_enabled);
    }

    #[test]
    fn zone_fields_win_when_override_set() {
        let mut zone = base_zone();
        zone.profile_id = Some(7);
        zone.is_override = true;
        let profile = base_profile();

        let resolved = resolve(&zone, Some(&profile));
        assert_eq!(resolved.source, SetpointSource::ZoneOverride);
        assert_eq!(resolved.occupied.heat_f, 70.0);
        assert!(!resolved.adjustments.feels_like_enabled);
    }

    #[test]
    fn zone_fields_win_when_profile_missing() {
        let mut zone = base_zone();
        zone.profile_id = Some(7);

        let resolved = resolve(&zone, None);
        assert_eq!(resolved.source, SetpointSource::ZoneOverride);
        assert_eq!(resolved.occupied.cool_f, 74.0);
    }

    #[test]
    fn all_null_setpoints_fall_back_to_defaults() {
        let mut zone = base_zone();
        zone.occupied_heat_f = None;
        zone.occupied_cool_f = None;
        zone.unoccupied_heat_f = None;
        zone.unoccupied_cool_f = None;
        zone.occupied_hvac_mode = None;
        zone.occupied_fan_mode = None;

        let resolved = resolve(&zone, None);
        assert_eq!(resolved.source, SetpointSource::Default);
        assert_eq!(resolved.occupied.heat_f, DEFAULT_OCCUPIED_HEAT_F);
        assert_eq!(resolved.occupied.cool_f, DEFAULT_OCCUPIED_COOL_F);
        assert_eq!(resolved.unoccupied.heat_f, DEFAULT_UNOCCUPIED_HEAT_F);
        assert_eq!(resolved.unoccupied.cool_f, DEFAULT_UNOCCUPIED_COOL_F);
        assert_eq!(resolved.occupied.hvac_mode, HvacMode::HeatCool);
        assert_eq!(resolved.occupied.fan_mode, "auto");
    }

    #[test]
    fn guardrails_always_come_from_the_zone() {
        let mut zone = base_zone();
        zone.profile_id = Some(7);
        zone.guardrail_min_f = 50.0;
        zone.guardrail_max_f = 90.0;
        let profile = base_profile();

        let resolved = resolve(&zone, Some(&profile));
        assert_eq!(resolved.guardrail_min_f, 50.0);
        assert_eq!(resolved.guardrail_max_f, 90.0);
        assert_eq!(resolved.manager_offset_max_f, 4.0);
    }

    #[test]
    fn resolve_is_deterministic() {
        let zone = base_zone();
        let a = resolve(&zone, None);
        let b = resolve(&zone, None);
        assert_eq!(a, b);
    }
}

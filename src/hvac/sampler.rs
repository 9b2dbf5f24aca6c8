//! Zone state sampling: weighted sensor aggregation, feels-like
//! temperature, occupancy signal, and equipment anomaly detection.
//!
//! Split into an async telemetry loader (batch reads into a request-scoped
//! `ZoneTelemetry`) and pure computation over it. Missing data degrades to
//! `None` — "unknown, skip dependent logic" — never to zero.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::device::DeviceState;
use crate::entities::{sensor_entity, setpoint_log, space, zone};

/// Sensor readings older than this are excluded from aggregation.
pub const SENSOR_FRESH_MINUTES: i64 = 30;
/// How far back the anomaly detectors read the setpoint log.
pub const HISTORY_WINDOW_MINUTES: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorRole {
    Temperature,
    Humidity,
    Motion,
    SupplyTemp,
    ReturnTemp,
    Compressor,
    Thermostat,
}

impl SensorRole {
    pub fn parse(s: &str) -> Option<SensorRole> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" => Some(SensorRole::Temperature),
            "humidity" => Some(SensorRole::Humidity),
            "motion" | "occupancy" => Some(SensorRole::Motion),
            "supply_temp" => Some(SensorRole::SupplyTemp),
            "return_temp" => Some(SensorRole::ReturnTemp),
            "compressor" => Some(SensorRole::Compressor),
            "thermostat" => Some(SensorRole::Thermostat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SensorReading {
    pub role: SensorRole,
    pub value: Option<String>,
    pub weight: f64,
    pub last_seen: Option<DateTime<Utc>>,
}

impl SensorReading {
    fn fresh_numeric(&self, now: DateTime<Utc>) -> Option<f64> {
        if !self.is_fresh(now) {
            return None;
        }
        self.value.as_deref()?.trim().parse::<f64>().ok()
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.last_seen {
            Some(seen) => now - seen <= Duration::minutes(SENSOR_FRESH_MINUTES),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpaceTelemetry {
    pub zone_weight: f64,
    pub sensors: Vec<SensorReading>,
}

/// One trailing setpoint-log point; cycling anomalies derive elapsed time
/// from these timestamps, never from an assumed sampling cadence.
#[derive(Debug, Clone, Copy)]
pub struct LogPoint {
    pub ts: DateTime<Utc>,
    pub zone_temp_f: Option<f64>,
    pub compressor_on: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneTelemetry {
    pub spaces: Vec<SpaceTelemetry>,
    /// Thermostat-reported values, the fallback when no space sensors
    /// resolve. Sourced from the last read-back.
    pub thermostat_temp_f: Option<f64>,
    pub thermostat_humidity: Option<f64>,
    pub supply_temp_f: Option<f64>,
    pub return_temp_f: Option<f64>,
    pub compressor_on: Option<bool>,
    /// Oldest-first trailing log points.
    pub history: Vec<LogPoint>,
}

/// Where the aggregated temperature/humidity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Spaces,
    Thermostat,
    None,
}

/// Anomaly thresholds: built-in defaults, overridable per zone via the
/// zone's JSON override column. Closed struct — unknown keys are rejected
/// at the persistence boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyThresholds {
    pub coil_freeze_supply_f: f64,
    pub filter_delta_t_f: f64,
    pub refrigerant_delta_t_f: f64,
    pub short_cycle_count: u32,
    pub short_cycle_window_minutes: i64,
    pub long_cycle_minutes: i64,
    pub idle_gain_f: f64,
    pub idle_gain_window_minutes: i64,
    pub delayed_response_f: f64,
    pub delayed_response_window_minutes: i64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        AnomalyThresholds {
            coil_freeze_supply_f: 35.0,
            filter_delta_t_f: 25.0,
            refrigerant_delta_t_f: 5.0,
            short_cycle_count: 4,
            short_cycle_window_minutes: 60,
            long_cycle_minutes: 120,
            idle_gain_f: 2.0,
            idle_gain_window_minutes: 15,
            delayed_response_f: 0.5,
            delayed_response_window_minutes: 15,
        }
    }
}

/// Per-zone override payload; absent fields keep the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnomalyThresholdOverrides {
    pub coil_freeze_supply_f: Option<f64>,
    pub filter_delta_t_f: Option<f64>,
    pub refrigerant_delta_t_f: Option<f64>,
    pub short_cycle_count: Option<u32>,
    pub short_cycle_window_minutes: Option<i64>,
    pub long_cycle_minutes: Option<i64>,
    pub idle_gain_f: Option<f64>,
    pub idle_gain_window_minutes: Option<i64>,
    pub delayed_response_f: Option<f64>,
    pub delayed_response_window_minutes: Option<i64>,
}

impl AnomalyThresholds {
    pub fn for_zone(overrides: Option<&serde_json::Value>) -> Self {
        let mut t = AnomalyThresholds::default();
        let Some(value) = overrides else {
            return t;
        };
        let parsed: AnomalyThresholdOverrides = match serde_json::from_value(value.clone()) {
            Ok(p) => p,
            Err(e) => {
                warn!("Invalid anomaly threshold overrides, using defaults: {}", e);
                return t;
            }
        };
        if let Some(v) = parsed.coil_freeze_supply_f {
            t.coil_freeze_supply_f = v;
        }
        if let Some(v) = parsed.filter_delta_t_f {
            t.filter_delta_t_f = v;
        }
        if let Some(v) = parsed.refrigerant_delta_t_f {
            t.refrigerant_delta_t_f = v;
        }
        if let Some(v) = parsed.short_cycle_count {
            t.short_cycle_count = v;
        }
        if let Some(v) = parsed.short_cycle_window_minutes {
            t.short_cycle_window_minutes = v;
        }
        if let Some(v) = parsed.long_cycle_minutes {
            t.long_cycle_minutes = v;
        }
        if let Some(v) = parsed.idle_gain_f {
            t.idle_gain_f = v;
        }
        if let Some(v) = parsed.idle_gain_window_minutes {
            t.idle_gain_window_minutes = v;
        }
        if let Some(v) = parsed.delayed_response_f {
            t.delayed_response_f = v;
        }
        if let Some(v) = parsed.delayed_response_window_minutes {
            t.delayed_response_window_minutes = v;
        }
        t
    }
}

/// Every flag is None when its prerequisite data is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub coil_freeze: Option<bool>,
    pub filter_restriction: Option<bool>,
    pub refrigerant_low: Option<bool>,
    pub short_cycling: Option<bool>,
    pub long_cycle: Option<bool>,
    pub idle_heat_gain: Option<bool>,
    pub delayed_temp_response: Option<bool>,
}

impl AnomalyReport {
    fn entries(&self) -> [(&'static str, Option<bool>); 7] {
        [
            ("coil_freeze", self.coil_freeze),
            ("filter_restriction", self.filter_restriction),
            ("refrigerant_low", self.refrigerant_low),
            ("short_cycling", self.short_cycling),
            ("long_cycle", self.long_cycle),
            ("idle_heat_gain", self.idle_heat_gain),
            ("delayed_temp_response", self.delayed_temp_response),
        ]
    }

    pub fn anomaly_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|(_, v)| *v == Some(true))
            .count()
    }

    pub fn anomaly_flags(&self) -> Vec<&'static str> {
        self.entries()
            .iter()
            .filter(|(_, v)| *v == Some(true))
            .map(|(k, _)| *k)
            .collect()
    }

    /// Current value of a named flag, for anomaly-flag alert targets.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.entries()
            .iter()
            .find(|(k, _)| *k == name)
            .and_then(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSample {
    pub zone_temp_f: Option<f64>,
    pub zone_humidity: Option<f64>,
    pub feels_like_temp_f: Option<f64>,
    /// -1.0 when motion sensors exist and none are active, else 0.0.
    /// Clamped against the profile cap by the caller.
    pub occupancy_adj: f64,
    pub temp_source: DataSource,
    pub anomalies: AnomalyReport,
}

/// Weighted average of fresh numeric readings of one role within a space.
fn space_average(space: &SpaceTelemetry, role: SensorRole, now: DateTime<Utc>) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for sensor in space.sensors.iter().filter(|s| s.role == role) {
        if let Some(v) = sensor.fresh_numeric(now) {
            weighted_sum += v * sensor.weight;
            weight_total += sensor.weight;
        }
    }
    if weight_total > 0.0 {
        Some(weighted_sum / weight_total)
    } else {
        None
    }
}

/// Zone-level aggregate: space averages weighted by each space's
/// zone-weight. None when no space resolves a value.
fn zone_aggregate(spaces: &[SpaceTelemetry], role: SensorRole, now: DateTime<Utc>) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for space in spaces {
        if let Some(avg) = space_average(space, role, now) {
            weighted_sum += avg * space.zone_weight;
            weight_total += space.zone_weight;
        }
    }
    if weight_total > 0.0 {
        Some(weighted_sum / weight_total)
    } else {
        None
    }
}

/// Perceived temperature, rounded to the nearest integer °F.
///
/// Below 80 °F a linear humidity correction applies; at or above 80 °F with
/// humidity >= 40 the Rothfusz heat-index regression takes over; at or above
/// 80 °F with drier air the actual temperature stands.
pub fn feels_like_f(temp_f: f64, humidity_pct: f64) -> f64 {
    if temp_f < 80.0 {
        (temp_f + 0.33 * (humidity_pct / 100.0) * 6.105 - 4.0).round()
    } else if humidity_pct >= 40.0 {
        rothfusz_heat_index(temp_f, humidity_pct).round()
    } else {
        temp_f.round()
    }
}

fn rothfusz_heat_index(t: f64, rh: f64) -> f64 {
    -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 6.83783e-3 * t * t
        - 5.481717e-2 * rh * rh
        + 1.22874e-3 * t * t * rh
        + 8.5282e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh
}

const ACTIVE_MOTION_STATES: [&str; 4] = ["on", "true", "1", "detected"];

/// -1 when motion sensors exist in the served spaces and none report an
/// active state; 0 when any is active or no motion sensors are present.
pub fn occupancy_adjustment(spaces: &[SpaceTelemetry], now: DateTime<Utc>) -> f64 {
    let mut saw_sensor = false;
    for space in spaces {
        for sensor in space.sensors.iter().filter(|s| s.role == SensorRole::Motion) {
            if !sensor.is_fresh(now) {
                continue;
            }
            let Some(value) = sensor.value.as_deref() else {
                continue;
            };
            saw_sensor = true;
            let v = value.trim().to_ascii_lowercase();
            if ACTIVE_MOTION_STATES.contains(&v.as_str()) {
                return 0.0;
            }
        }
    }
    if saw_sensor {
        -1.0
    } else {
        0.0
    }
}

/// Count of on->off compressor transitions in the trailing window.
fn count_off_transitions(history: &[LogPoint], window_start: DateTime<Utc>) -> Option<u32> {
    let points: Vec<(DateTime<Utc>, bool)> = history
        .iter()
        .filter(|p| p.ts >= window_start)
        .filter_map(|p| p.compressor_on.map(|on| (p.ts, on)))
        .collect();
    if points.len() < 2 {
        return None;
    }
    let mut transitions = 0;
    for pair in points.windows(2) {
        if pair[0].1 && !pair[1].1 {
            transitions += 1;
        }
    }
    Some(transitions)
}

/// Duration of the run the compressor is currently in, from log timestamps.
fn current_run_minutes(history: &[LogPoint], now: DateTime<Utc>) -> Option<i64> {
    let mut run_start: Option<DateTime<Utc>> = None;
    for p in history {
        match p.compressor_on {
            Some(true) => {
                if run_start.is_none() {
                    run_start = Some(p.ts);
                }
            }
            Some(false) => run_start = None,
            None => return None,
        }
    }
    let start = run_start?;
    Some((now - start).num_minutes())
}

/// Temperature change over the trailing window, requiring the compressor to
/// hold `compressor_state` throughout. None when coverage is insufficient.
fn temp_delta_with_compressor(
    history: &[LogPoint],
    window_start: DateTime<Utc>,
    compressor_state: bool,
) -> Option<f64> {
    let points: Vec<&LogPoint> = history.iter().filter(|p| p.ts >= window_start).collect();
    if points.len() < 2 {
        return None;
    }
    for p in &points {
        if p.compressor_on != Some(compressor_state) {
            return None;
        }
    }
    let first = points.first()?.zone_temp_f?;
    let last = points.last()?.zone_temp_f?;
    Some(last - first)
}

pub fn detect_anomalies(
    telemetry: &ZoneTelemetry,
    thresholds: &AnomalyThresholds,
    now: DateTime<Utc>,
) -> AnomalyReport {
    let mut report = AnomalyReport::default();

    report.coil_freeze = telemetry
        .supply_temp_f
        .map(|supply| supply < thresholds.coil_freeze_supply_f);

    let delta_t = match (telemetry.supply_temp_f, telemetry.return_temp_f) {
        (Some(supply), Some(ret)) => Some(supply - ret),
        _ => None,
    };
    report.filter_restriction = match (delta_t, telemetry.compressor_on) {
        (Some(dt), Some(true)) => Some(dt.abs() > thresholds.filter_delta_t_f),
        (Some(_), Some(false)) => Some(false),
        _ => None,
    };
    report.refrigerant_low = match (delta_t, telemetry.compressor_on) {
        (Some(dt), Some(true)) => Some(dt.abs() < thresholds.refrigerant_delta_t_f),
        (Some(_), Some(false)) => Some(false),
        _ => None,
    };

    report.short_cycling = count_off_transitions(
        &telemetry.history,
        now - Duration::minutes(thresholds.short_cycle_window_minutes),
    )
    .map(|n| n > thresholds.short_cycle_count);

    report.long_cycle = if telemetry.compressor_on == Some(true) {
        current_run_minutes(&telemetry.history, now)
            .map(|mins| mins > thresholds.long_cycle_minutes)
    } else if telemetry.compressor_on == Some(false) {
        Some(false)
    } else {
        None
    };

    report.idle_heat_gain = temp_delta_with_compressor(
        &telemetry.history,
        now - Duration::minutes(thresholds.idle_gain_window_minutes),
        false,
    )
    .map(|delta| delta > thresholds.idle_gain_f);

    report.delayed_temp_response = temp_delta_with_compressor(
        &telemetry.history,
        now - Duration::minutes(thresholds.delayed_response_window_minutes),
        true,
    )
    .map(|delta| delta.abs() < thresholds.delayed_response_f);

    report
}

/// Compute the full sample from loaded telemetry. Pure.
pub fn sample(
    telemetry: &ZoneTelemetry,
    thresholds: &AnomalyThresholds,
    now: DateTime<Utc>,
) -> ZoneSample {
    let space_temp = zone_aggregate(&telemetry.spaces, SensorRole::Temperature, now);
    let space_humidity = zone_aggregate(&telemetry.spaces, SensorRole::Humidity, now);

    let (zone_temp_f, zone_humidity, temp_source) = match space_temp {
        Some(t) => (Some(t), space_humidity.or(telemetry.thermostat_humidity), DataSource::Spaces),
        None => match telemetry.thermostat_temp_f {
            Some(t) => (Some(t), telemetry.thermostat_humidity, DataSource::Thermostat),
            None => (None, None, DataSource::None),
        },
    };

    let feels_like_temp_f = match (zone_temp_f, zone_humidity) {
        (Some(t), Some(h)) => Some(feels_like_f(t, h)),
        _ => None,
    };

    ZoneSample {
        zone_temp_f,
        zone_humidity,
        feels_like_temp_f,
        occupancy_adj: occupancy_adjustment(&telemetry.spaces, now),
        temp_source,
        anomalies: detect_anomalies(telemetry, thresholds, now),
    }
}

/// Batch-load everything the sampler needs for one zone into a
/// request-scoped lookup. No state survives between invocations.
pub async fn load_zone_telemetry(
    db: &DatabaseConnection,
    zone: &zone::Model,
    now: DateTime<Utc>,
) -> Result<ZoneTelemetry, DbErr> {
    let spaces = space::Entity::find()
        .filter(space::Column::ZoneId.eq(zone.id))
        .all(db)
        .await?;

    let mut space_telemetry = Vec::with_capacity(spaces.len());
    let mut weight_sum = 0.0;
    for s in &spaces {
        let sensors = sensor_entity::Entity::find()
            .filter(sensor_entity::Column::SpaceId.eq(s.id))
            .all(db)
            .await?;
        let readings = sensors
            .iter()
            .filter_map(|e| {
                SensorRole::parse(&e.role).map(|role| SensorReading {
                    role,
                    value: e.last_value.clone(),
                    weight: e.weight.unwrap_or(1.0),
                    last_seen: e.last_seen,
                })
            })
            .collect();
        let zone_weight = s.zone_weight.unwrap_or(1.0);
        weight_sum += zone_weight;
        space_telemetry.push(SpaceTelemetry {
            zone_weight,
            sensors: readings,
        });
    }
    if !spaces.is_empty() && (weight_sum - 1.0).abs() > 0.01 {
        warn!(
            zone_id = zone.id,
            weight_sum, "Zone-weights for spaces do not sum to 1.0"
        );
    }

    let equipment_sensors = sensor_entity::Entity::find()
        .filter(sensor_entity::Column::EquipmentId.eq(zone.equipment_id))
        .all(db)
        .await?;

    let fresh_numeric = |role: SensorRole| -> Option<f64> {
        equipment_sensors
            .iter()
            .filter_map(|e| {
                SensorRole::parse(&e.role).filter(|r| *r == role).map(|r| SensorReading {
                    role: r,
                    value: e.last_value.clone(),
                    weight: e.weight.unwrap_or(1.0),
                    last_seen: e.last_seen,
                })
            })
            .find_map(|r| r.fresh_numeric(now))
    };
    let supply_temp_f = fresh_numeric(SensorRole::SupplyTemp);
    let return_temp_f = fresh_numeric(SensorRole::ReturnTemp);
    let compressor_on = equipment_sensors
        .iter()
        .filter(|e| SensorRole::parse(&e.role) == Some(SensorRole::Compressor))
        .filter_map(|e| e.last_value.as_deref())
        .next()
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "on" || v == "true" || v == "1" || v == "running"
        });

    let last_known: Option<DeviceState> = zone
        .last_known_state
        .as_ref()
        .and_then(|j| serde_json::from_value(j.clone()).ok());
    let (thermostat_temp_f, thermostat_humidity) = match &last_known {
        Some(s) => (s.current_temp_f, s.humidity),
        None => (None, None),
    };

    let window_start = now - Duration::minutes(HISTORY_WINDOW_MINUTES);
    let log_rows = setpoint_log::Entity::find()
        .filter(setpoint_log::Column::ZoneId.eq(zone.id))
        .filter(setpoint_log::Column::CreatedAt.gte(window_start))
        .order_by_asc(setpoint_log::Column::CreatedAt)
        .all(db)
        .await?;
    let history = log_rows
        .iter()
        .map(|r| LogPoint {
            ts: r.created_at,
            zone_temp_f: r.zone_temp_f,
            compressor_on: r.compressor_on,
        })
        .collect();

    Ok(ZoneTelemetry {
        spaces: space_telemetry,
        thermostat_temp_f,
        thermostat_humidity,
        supply_temp_f,
        return_temp_f,
        compressor_on,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn reading(role: SensorRole, value: &str, weight: f64) -> SensorReading {
        SensorReading {
            role,
            value: Some(value.to_string()),
            weight,
            last_seen: Some(now() - Duration::minutes(1)),
        }
    }

    #[test]
    fn weighted_space_average_is_exact() {
        let space = SpaceTelemetry {
            zone_weight: 1.0,
            sensors: vec![
                reading(SensorRole::Temperature, "68", 0.5),
                reading(SensorRole::Temperature, "72", 0.5),
            ],
        };
        assert_eq!(space_average(&space, SensorRole::Temperature, now()), Some(70.0));
    }

    #[test]
    fn stale_sensors_are_excluded() {
        let mut stale = reading(SensorRole::Temperature, "90", 1.0);
        stale.last_seen = Some(now() - Duration::minutes(SENSOR_FRESH_MINUTES + 5));
        let space = SpaceTelemetry {
            zone_weight: 1.0,
            sensors: vec![stale, reading(SensorRole::Temperature, "70", 1.0)],
        };
        assert_eq!(space_average(&space, SensorRole::Temperature, now()), Some(70.0));
    }

    #[test]
    fn zone_aggregate_uses_space_weights() {
        let spaces = vec![
            SpaceTelemetry {
                zone_weight: 0.75,
                sensors: vec![reading(SensorRole::Temperature, "72", 1.0)],
            },
            SpaceTelemetry {
                zone_weight: 0.25,
                sensors: vec![reading(SensorRole::Temperature, "64", 1.0)],
            },
        ];
        assert_eq!(zone_aggregate(&spaces, SensorRole::Temperature, now()), Some(70.0));
    }

    #[test]
    fn sample_falls_back_to_thermostat_then_none() {
        let telemetry = ZoneTelemetry {
            thermostat_temp_f: Some(71.0),
            thermostat_humidity: Some(45.0),
            ..Default::default()
        };
        let s = sample(&telemetry, &AnomalyThresholds::default(), now());
        assert_eq!(s.zone_temp_f, Some(71.0));
        assert_eq!(s.temp_source, DataSource::Thermostat);

        let empty = ZoneTelemetry::default();
        let s = sample(&empty, &AnomalyThresholds::default(), now());
        assert_eq!(s.zone_temp_f, None);
        assert_eq!(s.temp_source, DataSource::None);
        assert_eq!(s.feels_like_temp_f, None);
    }

    #[test]
    fn feels_like_boundary_at_eighty() {
        // 39% humidity at 80F: identity.
        assert_eq!(feels_like_f(80.0, 39.0), 80.0);
        // 40% humidity at 80F: Rothfusz applies (happens to round to 80).
        assert_eq!(feels_like_f(80.0, 40.0), rothfusz_heat_index(80.0, 40.0).round());
        // Deep into heat-index territory the regression dominates.
        assert_eq!(feels_like_f(90.0, 70.0), 106.0);
    }

    #[test]
    fn feels_like_linear_below_eighty() {
        // 70F at 50% RH: 70 + 0.33*0.5*6.105 - 4.0 = 67.007 -> 67.
        assert_eq!(feels_like_f(70.0, 50.0), 67.0);
    }

    #[test]
    fn occupancy_negative_only_when_all_sensors_inactive() {
        let active = vec![SpaceTelemetry {
            zone_weight: 1.0,
            sensors: vec![
                reading(SensorRole::Motion, "off", 1.0),
                reading(SensorRole::Motion, "Detected", 1.0),
            ],
        }];
        assert_eq!(occupancy_adjustment(&active, now()), 0.0);

        let inactive = vec![SpaceTelemetry {
            zone_weight: 1.0,
            sensors: vec![reading(SensorRole::Motion, "off", 1.0)],
        }];
        assert_eq!(occupancy_adjustment(&inactive, now()), -1.0);

        let none: Vec<SpaceTelemetry> = vec![];
        assert_eq!(occupancy_adjustment(&none, now()), 0.0);
    }

    fn history_point(mins_ago: i64, temp: f64, on: bool) -> LogPoint {
        LogPoint {
            ts: now() - Duration::minutes(mins_ago),
            zone_temp_f: Some(temp),
            compressor_on: Some(on),
        }
    }

    #[test]
    fn coil_freeze_requires_supply_temp() {
        let mut telemetry = ZoneTelemetry::default();
        let report = detect_anomalies(&telemetry, &AnomalyThresholds::default(), now());
        assert_eq!(report.coil_freeze, None);

        telemetry.supply_temp_f = Some(33.0);
        let report = detect_anomalies(&telemetry, &AnomalyThresholds::default(), now());
        assert_eq!(report.coil_freeze, Some(true));
    }

    #[test]
    fn delta_t_flags_depend_on_compressor_running() {
        let telemetry = ZoneTelemetry {
            supply_temp_f: Some(55.0),
            return_temp_f: Some(58.0),
            compressor_on: Some(true),
            ..Default::default()
        };
        let report = detect_anomalies(&telemetry, &AnomalyThresholds::default(), now());
        // |delta_t| = 3 < 5 while running.
        assert_eq!(report.refrigerant_low, Some(true));
        assert_eq!(report.filter_restriction, Some(false));

        let idle = ZoneTelemetry {
            compressor_on: Some(false),
            ..telemetry
        };
        let report = detect_anomalies(&idle, &AnomalyThresholds::default(), now());
        assert_eq!(report.refrigerant_low, Some(false));
    }

    #[test]
    fn short_cycling_counts_off_transitions_in_window() {
        let mut history = Vec::new();
        // Five on->off transitions over the last hour.
        for i in 0..5 {
            history.push(history_point(55 - i * 10, 70.0, true));
            history.push(history_point(52 - i * 10, 70.0, false));
        }
        let telemetry = ZoneTelemetry {
            history,
            ..Default::default()
        };
        let report = detect_anomalies(&telemetry, &AnomalyThresholds::default(), now());
        assert_eq!(report.short_cycling, Some(true));
    }

    #[test]
    fn long_cycle_derives_duration_from_timestamps() {
        let history = vec![
            history_point(130, 70.0, true),
            history_point(60, 70.5, true),
            history_point(5, 71.0, true),
        ];
        let telemetry = ZoneTelemetry {
            compressor_on: Some(true),
            history,
            ..Default::default()
        };
        let report = detect_anomalies(&telemetry, &AnomalyThresholds::default(), now());
        assert_eq!(report.long_cycle, Some(true));
    }

    #[test]
    fn idle_heat_gain_and_delayed_response() {
        let gain = ZoneTelemetry {
            history: vec![history_point(14, 70.0, false), history_point(2, 72.5, false)],
            ..Default::default()
        };
        let report = detect_anomalies(&gain, &AnomalyThresholds::default(), now());
        assert_eq!(report.idle_heat_gain, Some(true));
        // Not evaluable for the running-compressor window.
        assert_eq!(report.delayed_temp_response, None);

        let stuck = ZoneTelemetry {
            history: vec![history_point(14, 70.0, true), history_point(2, 70.2, true)],
            ..Default::default()
        };
        let report = detect_anomalies(&stuck, &AnomalyThresholds::default(), now());
        assert_eq!(report.delayed_temp_response, Some(true));
        assert_eq!(report.idle_heat_gain, None);
    }

    #[test]
    fn threshold_overrides_merge_over_defaults() {
        let overrides = serde_json::json!({ "coil_freeze_supply_f": 32.0 });
        let t = AnomalyThresholds::for_zone(Some(&overrides));
        assert_eq!(t.coil_freeze_supply_f, 32.0);
        assert_eq!(t.filter_delta_t_f, 25.0);
    }

    #[test]
    fn anomaly_report_count_and_flags() {
        let report = AnomalyReport {
            coil_freeze: Some(true),
            filter_restriction: Some(false),
            refrigerant_low: None,
            short_cycling: Some(true),
            ..Default::default()
        };
        assert_eq!(report.anomaly_count(), 2);
        assert_eq!(report.anomaly_flags(), vec!["coil_freeze", "short_cycling"]);
        assert_eq!(report.flag("coil_freeze"), Some(true));
        assert_eq!(report.flag("refrigerant_low"), None);
    }
}

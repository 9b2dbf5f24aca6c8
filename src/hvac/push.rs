//! Thermostat push engine: combine resolved setpoints and live adjustments
//! into a desired device state, guard it, and push it as an idempotent,
//! ordered command sequence with read-back confirmation and audit logging.
//!
//! The planning half (`desired_state`, `plan_push`) is pure; the executor
//! owns the network and database effects. Zones within a site process
//! sequentially — the natural rate limit on the device API — and every
//! failure path leaves a durable trace rather than throwing at the
//! scheduler.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::device::{DeviceClient, DeviceError, DeviceState, HvacMode, TempCommand};
use crate::entities::{hours_exception, profile, setpoint_log, site, store_hours, zone};
use crate::hvac::adjust::{self, Adjustments};
use crate::hvac::resolver::{self, ResolvedSetpoints};
use crate::hvac::sampler::{self, AnomalyThresholds, ZoneSample};
use crate::hvac::schedule;
use crate::hvac::Phase;

/// Forced setpoint distance from the violated guardrail bound.
pub const GUARDRAIL_MARGIN_F: f64 = 10.0;
/// Device firmware applies mode changes asynchronously; later commands wait
/// this long after a mode command.
pub const MODE_SETTLE_MS: u64 = 1500;
/// Read-back runs this long after the last command.
pub const READBACK_SETTLE_MS: u64 = 1000;
/// Setpoints closer than this are considered equal for idempotence.
const SETPOINT_EPS_F: f64 = 0.01;

pub const SKIP_ALREADY_AT_TARGET: &str = "Already at target";

/// The state the device should be in after this cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesiredState {
    pub hvac_mode: HvacMode,
    pub heat_setpoint_f: f64,
    pub cool_setpoint_f: f64,
    pub fan_mode: String,
    pub guardrail_triggered: bool,
}

/// Commands in mandatory order: mode, then temperature, then fan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedCommand {
    SetMode(HvacMode),
    SetTemperature(TempCommand),
    SetFan(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushPlan {
    pub commands: Vec<PlannedCommand>,
    /// Set when the push is skipped entirely.
    pub skip_reason: Option<String>,
}

/// Apply the summed adjustment offset and the guardrail override.
///
/// Guardrails bypass all profile and adjustment logic: at or below the
/// minimum the zone heats to min+10, at or above the maximum it cools to
/// max-10. They are evaluated on every cycle and always win.
pub fn desired_state(
    resolved: &ResolvedSetpoints,
    phase: Phase,
    adjustments: &Adjustments,
    current_temp_f: Option<f64>,
) -> DesiredState {
    let base = resolved.for_phase(phase);
    let offset = adjustments.total();
    let mut desired = DesiredState {
        hvac_mode: base.hvac_mode,
        heat_setpoint_f: base.heat_f + offset,
        cool_setpoint_f: base.cool_f + offset,
        fan_mode: base.fan_mode.clone(),
        guardrail_triggered: false,
    };

    if let Some(temp) = current_temp_f {
        if temp <= resolved.guardrail_min_f {
            desired.hvac_mode = HvacMode::Heat;
            desired.heat_setpoint_f = resolved.guardrail_min_f + GUARDRAIL_MARGIN_F;
            desired.guardrail_triggered = true;
        } else if temp >= resolved.guardrail_max_f {
            desired.hvac_mode = HvacMode::Cool;
            desired.cool_setpoint_f = resolved.guardrail_max_f - GUARDRAIL_MARGIN_F;
            desired.guardrail_triggered = true;
        }
    }
    desired
}

fn approx_eq(a: Option<f64>, b: f64) -> bool {
    matches!(a, Some(v) if (v - b).abs() < SETPOINT_EPS_F)
}

fn current_mode(current: Option<&DeviceState>) -> Option<HvacMode> {
    current?.hvac_mode.as_deref().and_then(HvacMode::parse)
}

fn setpoints_match(current: &DeviceState, desired: &DesiredState) -> bool {
    match desired.hvac_mode {
        HvacMode::Heat => approx_eq(
            current.target_temp_f.or(current.heat_setpoint_f),
            desired.heat_setpoint_f,
        ),
        HvacMode::Cool => approx_eq(
            current.target_temp_f.or(current.cool_setpoint_f),
            desired.cool_setpoint_f,
        ),
        HvacMode::HeatCool => {
            approx_eq(current.heat_setpoint_f, desired.heat_setpoint_f)
                && approx_eq(current.cool_setpoint_f, desired.cool_setpoint_f)
        }
        HvacMode::Off => true,
    }
}

fn fan_matches(current: &DeviceState, desired: &DesiredState) -> bool {
    current
        .fan_mode
        .as_deref()
        .map(|f| f.eq_ignore_ascii_case(&desired.fan_mode))
        .unwrap_or(false)
}

/// Build the command sequence, or skip when the device already matches.
/// A guardrail-triggered state is never skipped.
pub fn plan_push(current: Option<&DeviceState>, desired: &DesiredState) -> PushPlan {
    let mode_matches = current_mode(current) == Some(desired.hvac_mode);

    if !desired.guardrail_triggered {
        if let Some(state) = current {
            if mode_matches && fan_matches(state, desired) && setpoints_match(state, desired) {
                return PushPlan {
                    commands: Vec::new(),
                    skip_reason: Some(SKIP_ALREADY_AT_TARGET.to_string()),
                };
            }
        }
    }

    let mut commands = Vec::new();
    if !mode_matches {
        commands.push(PlannedCommand::SetMode(desired.hvac_mode));
    }
    match desired.hvac_mode {
        HvacMode::Heat => commands.push(PlannedCommand::SetTemperature(TempCommand::Single(
            desired.heat_setpoint_f,
        ))),
        HvacMode::Cool => commands.push(PlannedCommand::SetTemperature(TempCommand::Single(
            desired.cool_setpoint_f,
        ))),
        HvacMode::HeatCool => commands.push(PlannedCommand::SetTemperature(TempCommand::Dual {
            high: desired.cool_setpoint_f,
            low: desired.heat_setpoint_f,
        })),
        HvacMode::Off => {}
    }
    let fan_needs_push = match current {
        Some(state) => !fan_matches(state, desired),
        None => true,
    };
    if fan_needs_push {
        commands.push(PlannedCommand::SetFan(desired.fan_mode.clone()));
    }

    PushPlan {
        commands,
        skip_reason: None,
    }
}

/// Full outcome of one zone's push cycle; serialized into the audit row.
#[derive(Debug, Serialize)]
pub struct PushResult {
    pub pushed: bool,
    pub reason: Option<String>,
    pub actions: Vec<String>,
    pub phase: Phase,
    pub source: resolver::SetpointSource,
    pub desired: DesiredState,
    pub adjustments: Adjustments,
    pub guardrail_triggered: bool,
    pub sample: ZoneSample,
    pub readback: Option<DeviceState>,
}

/// Run the planned commands in order. A failed command is tagged `:FAILED`
/// and the sequence continues; partial application is safer to read back
/// and log than to leave unknown.
async fn execute_commands(
    client: &DeviceClient,
    entity_id: &str,
    plan: &PushPlan,
) -> Vec<String> {
    let mut actions = Vec::with_capacity(plan.commands.len());
    for command in &plan.commands {
        match command {
            PlannedCommand::SetMode(mode) => {
                let label = format!("set_hvac_mode:{}", mode.as_str());
                match client.set_mode(entity_id, *mode).await {
                    Ok(()) => actions.push(label),
                    Err(e) => {
                        warn!(entity_id, "Mode command failed: {}", e);
                        actions.push(format!("{}:FAILED", label));
                    }
                }
                // Firmware processes mode changes asynchronously.
                tokio::time::sleep(std::time::Duration::from_millis(MODE_SETTLE_MS)).await;
            }
            PlannedCommand::SetTemperature(temp) => {
                let label = match temp {
                    TempCommand::Single(t) => format!("set_temperature:{:.1}", t),
                    TempCommand::Dual { high, low } => {
                        format!("set_temperature:{:.1}/{:.1}", low, high)
                    }
                };
                match client.set_temperature(entity_id, *temp).await {
                    Ok(()) => actions.push(label),
                    Err(e) => {
                        warn!(entity_id, "Temperature command failed: {}", e);
                        actions.push(format!("{}:FAILED", label));
                    }
                }
            }
            PlannedCommand::SetFan(fan) => {
                let label = format!("set_fan_mode:{}", fan);
                match client.set_fan_mode(entity_id, fan).await {
                    Ok(()) => actions.push(label),
                    Err(e) => {
                        warn!(entity_id, "Fan command failed: {}", e);
                        actions.push(format!("{}:FAILED", label));
                    }
                }
            }
        }
    }
    actions
}

/// Request-scoped site context, batch-loaded once per cycle.
pub struct SiteCycleContext {
    pub site: site::Model,
    pub hours: Vec<store_hours::Model>,
    pub exceptions: Vec<hours_exception::Model>,
    pub profiles: HashMap<i32, profile::Model>,
    pub zones: Vec<zone::Model>,
}

async fn load_site_context(
    db: &DatabaseConnection,
    site: site::Model,
) -> Result<SiteCycleContext, sea_orm::DbErr> {
    let hours = store_hours::Entity::find()
        .filter(store_hours::Column::SiteId.eq(site.id))
        .all(db)
        .await?;
    let exceptions = hours_exception::Entity::find()
        .filter(hours_exception::Column::SiteId.eq(site.id))
        .all(db)
        .await?;
    let zones = zone::Entity::find()
        .filter(zone::Column::SiteId.eq(site.id))
        .all(db)
        .await?;
    let profile_ids: Vec<i32> = zones.iter().filter_map(|z| z.profile_id).collect();
    let profiles = if profile_ids.is_empty() {
        HashMap::new()
    } else {
        profile::Entity::find()
            .filter(profile::Column::Id.is_in(profile_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };
    Ok(SiteCycleContext {
        site,
        hours,
        exceptions,
        profiles,
        zones,
    })
}

/// One zone's full push pipeline: phase, resolve + adjust, guardrail,
/// idempotence, command sequence, read-back, audit.
pub async fn push_zone(
    db: &DatabaseConnection,
    client: &DeviceClient,
    ctx: &SiteCycleContext,
    zone: &zone::Model,
    trigger: &str,
    now: DateTime<Utc>,
) -> Result<PushResult, sea_orm::DbErr> {
    let local_now = schedule::site_local_now(&ctx.site, now);
    let phase = schedule::phase_at(local_now, &ctx.hours, &ctx.exceptions);
    let minutes_until_open =
        schedule::minutes_until_open(local_now, &ctx.hours, &ctx.exceptions);

    let profile = zone.profile_id.and_then(|id| ctx.profiles.get(&id));
    let resolved = resolver::resolve(zone, profile);

    let thresholds = AnomalyThresholds::for_zone(zone.anomaly_thresholds.as_ref());
    let telemetry = sampler::load_zone_telemetry(db, zone, now).await?;
    let sample = sampler::sample(&telemetry, &thresholds, now);

    let last_known: Option<DeviceState> = zone
        .last_known_state
        .as_ref()
        .and_then(|j| serde_json::from_value(j.clone()).ok());

    let base = resolved.for_phase(phase);
    let adjustments = adjust::compute(
        &resolved.adjustments,
        base,
        &resolved.occupied,
        &sample,
        phase,
        minutes_until_open,
        last_known.as_ref(),
        resolved.manager_offset_max_f,
    );

    let current_temp = sample
        .zone_temp_f
        .or(last_known.as_ref().and_then(|s| s.current_temp_f));
    let desired = desired_state(&resolved, phase, &adjustments, current_temp);
    let plan = plan_push(last_known.as_ref(), &desired);

    let (pushed, reason, actions, readback) = if let Some(reason) = plan.skip_reason.clone() {
        (false, Some(reason), Vec::new(), None)
    } else {
        let actions = execute_commands(client, &zone.thermostat_entity_id, &plan).await;
        tokio::time::sleep(std::time::Duration::from_millis(READBACK_SETTLE_MS)).await;
        // The device's reported state, not the commanded one, becomes the
        // idempotence baseline for the next cycle.
        let readback = match client.get_state(&zone.thermostat_entity_id).await {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(zone_id = zone.id, "Read-back failed: {}", e);
                None
            }
        };
        (true, None, actions, readback)
    };

    let guardrail_triggered = desired.guardrail_triggered;
    if guardrail_triggered {
        warn!(
            zone_id = zone.id,
            guardrail_min_f = resolved.guardrail_min_f,
            guardrail_max_f = resolved.guardrail_max_f,
            "Guardrail override drove this push"
        );
        crate::metrics::increment_guardrail_overrides(zone.id);
    }

    let result = PushResult {
        pushed,
        reason,
        actions,
        phase,
        source: resolved.source,
        desired,
        adjustments,
        guardrail_triggered,
        sample,
        readback,
    };

    // Persist read-back state and directive text on the zone.
    if pushed {
        let directive = if result.guardrail_triggered {
            format!(
                "guardrail override: {} @ {:.0}F",
                result.desired.hvac_mode.as_str(),
                match result.desired.hvac_mode {
                    HvacMode::Cool => result.desired.cool_setpoint_f,
                    _ => result.desired.heat_setpoint_f,
                }
            )
        } else {
            format!(
                "{} heat {:.1}F cool {:.1}F fan {}",
                result.desired.hvac_mode.as_str(),
                result.desired.heat_setpoint_f,
                result.desired.cool_setpoint_f,
                result.desired.fan_mode
            )
        };
        let mut active: zone::ActiveModel = zone.clone().into();
        if let Some(rb) = &result.readback {
            active.last_known_state = Set(serde_json::to_value(rb).ok());
        }
        active.last_directive = Set(Some(directive));
        active.updated_at = Set(now);
        active.update(db).await?;
    }

    // Audit row, written on every cycle, successful or not.
    let payload = serde_json::to_value(&result).unwrap_or_default();
    let log = setpoint_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        site_id: Set(ctx.site.id),
        zone_id: Set(Some(zone.id)),
        trigger: Set(trigger.to_string()),
        phase: Set(result.phase.as_str().to_string()),
        entity_id: Set(Some(zone.thermostat_entity_id.clone())),
        zone_temp_f: Set(result.sample.zone_temp_f),
        supply_temp_f: Set(telemetry.supply_temp_f),
        return_temp_f: Set(telemetry.return_temp_f),
        compressor_on: Set(telemetry.compressor_on),
        payload: Set(payload),
        created_at: Set(now),
    };
    log.insert(db).await?;

    crate::metrics::increment_pushes(pushed);
    Ok(result)
}

async fn audit_site_failure(
    db: &DatabaseConnection,
    site_id: i32,
    trigger: &str,
    kind: &str,
    detail: String,
    now: DateTime<Utc>,
) {
    let log = setpoint_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        site_id: Set(site_id),
        zone_id: Set(None),
        trigger: Set(trigger.to_string()),
        phase: Set("n/a".to_string()),
        entity_id: Set(None),
        zone_temp_f: Set(None),
        supply_temp_f: Set(None),
        return_temp_f: Set(None),
        compressor_on: Set(None),
        payload: Set(serde_json::json!({ "error_kind": kind, "detail": detail })),
        created_at: Set(now),
    };
    if let Err(e) = log.insert(db).await {
        error!(site_id, "Failed to write site audit row: {}", e);
    }
}

/// Process one site: connectivity probe, then zones strictly sequentially.
pub async fn run_site_cycle(
    db: &DatabaseConnection,
    client: &DeviceClient,
    site: site::Model,
    trigger: &str,
    now: DateTime<Utc>,
) {
    let site_id = site.id;

    // Connectivity failure short-circuits before any zone work, with its
    // own audit entry distinct from per-zone push failures.
    if let Err(e) = client.ping().await {
        error!(site_id, "Device API unreachable, skipping site: {}", e);
        audit_site_failure(db, site_id, trigger, "connectivity", e.to_string(), now).await;
        return;
    }

    let ctx = match load_site_context(db, site).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(site_id, "Failed to load site context: {}", e);
            return;
        }
    };

    for zone in &ctx.zones {
        match push_zone(db, client, &ctx, zone, trigger, now).await {
            Ok(result) => {
                info!(
                    zone_id = zone.id,
                    pushed = result.pushed,
                    phase = result.phase.as_str(),
                    actions = ?result.actions,
                    "Zone push cycle complete"
                );
            }
            Err(e) => {
                // One zone failing never blocks the rest of the cycle.
                error!(zone_id = zone.id, "Zone push cycle failed: {}", e);
            }
        }
    }
}

/// Entry point for the scheduled push pass across all sites.
pub async fn run_push_cycle(db: &DatabaseConnection, config: &Config, trigger: &str) {
    let now = Utc::now();
    let sites = match site::Entity::find().all(db).await {
        Ok(sites) => sites,
        Err(e) => {
            error!("Failed to load sites: {}", e);
            return;
        }
    };

    // Missing credentials short-circuit everything; log once per cycle and
    // leave a durable trace per site.
    let Some(device_config) = &config.device_api else {
        error!("{}", DeviceError::MissingConfig);
        for s in &sites {
            audit_site_failure(
                db,
                s.id,
                trigger,
                "config",
                DeviceError::MissingConfig.to_string(),
                now,
            )
            .await;
        }
        return;
    };
    let client = match DeviceClient::new(device_config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build device client: {}", e);
            return;
        }
    };

    for s in sites {
        run_site_cycle(db, &client, s, trigger, now).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hvac::resolver::{AdjustmentPolicy, PhaseSetpoints, SetpointSource};

    fn resolved() -> ResolvedSetpoints {
        ResolvedSetpoints {
            occupied: PhaseSetpoints {
                heat_f: 68.0,
                cool_f: 76.0,
                hvac_mode: HvacMode::HeatCool,
                fan_mode: "auto".to_string(),
            },
            unoccupied: PhaseSetpoints {
                heat_f: 55.0,
                cool_f: 85.0,
                hvac_mode: HvacMode::HeatCool,
                fan_mode: "auto".to_string(),
            },
            source: SetpointSource::Profile,
            adjustments: AdjustmentPolicy::disabled(),
            guardrail_min_f: 45.0,
            guardrail_max_f: 95.0,
            manager_offset_max_f: 4.0,
        }
    }

    fn matching_state() -> DeviceState {
        DeviceState {
            hvac_mode: Some("heat_cool".to_string()),
            fan_mode: Some("auto".to_string()),
            current_temp_f: Some(70.0),
            humidity: Some(45.0),
            heat_setpoint_f: Some(68.0),
            cool_setpoint_f: Some(76.0),
            target_temp_f: None,
            hvac_action: Some("idle".to_string()),
        }
    }

    #[test]
    fn guardrail_min_forces_heat_regardless_of_desired() {
        let r = resolved();
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(44.0));
        assert!(desired.guardrail_triggered);
        assert_eq!(desired.hvac_mode, HvacMode::Heat);
        assert_eq!(desired.heat_setpoint_f, 55.0);

        // Boundary: exactly at the guardrail still triggers.
        let at_bound = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(45.0));
        assert!(at_bound.guardrail_triggered);
        assert_eq!(at_bound.hvac_mode, HvacMode::Heat);
    }

    #[test]
    fn guardrail_max_forces_cool() {
        let r = resolved();
        let desired = desired_state(&r, Phase::Unoccupied, &Adjustments::default(), Some(96.0));
        assert!(desired.guardrail_triggered);
        assert_eq!(desired.hvac_mode, HvacMode::Cool);
        assert_eq!(desired.cool_setpoint_f, 85.0);
    }

    #[test]
    fn unknown_temperature_never_triggers_guardrail() {
        let r = resolved();
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), None);
        assert!(!desired.guardrail_triggered);
        assert_eq!(desired.hvac_mode, HvacMode::HeatCool);
    }

    #[test]
    fn offset_applies_equally_to_heat_and_cool() {
        let r = resolved();
        let adjustments = Adjustments {
            feels_like_f: -1.0,
            smart_start_f: 0.0,
            occupancy_f: -1.0,
            manager_f: 0.5,
        };
        let desired = desired_state(&r, Phase::Occupied, &adjustments, Some(70.0));
        assert_eq!(desired.heat_setpoint_f, 66.5);
        assert_eq!(desired.cool_setpoint_f, 74.5);
    }

    #[test]
    fn identical_state_skips_with_zero_commands() {
        let r = resolved();
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(70.0));
        let plan = plan_push(Some(&matching_state()), &desired);
        assert_eq!(plan.skip_reason.as_deref(), Some(SKIP_ALREADY_AT_TARGET));
        assert!(plan.commands.is_empty());
    }

    #[test]
    fn guardrail_push_is_never_skipped() {
        let r = resolved();
        // Device already in heat at the forced setpoint; guardrail still
        // produces a plan.
        let mut state = matching_state();
        state.hvac_mode = Some("heat".to_string());
        state.target_temp_f = Some(55.0);
        state.current_temp_f = Some(44.0);
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(44.0));
        let plan = plan_push(Some(&state), &desired);
        assert!(plan.skip_reason.is_none());
        assert!(!plan.commands.is_empty());
    }

    #[test]
    fn mode_command_strictly_precedes_temperature() {
        let r = resolved();
        let mut state = matching_state();
        state.hvac_mode = Some("off".to_string());
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(70.0));
        let plan = plan_push(Some(&state), &desired);

        let mode_idx = plan
            .commands
            .iter()
            .position(|c| matches!(c, PlannedCommand::SetMode(_)))
            .expect("mode command present");
        let temp_idx = plan
            .commands
            .iter()
            .position(|c| matches!(c, PlannedCommand::SetTemperature(_)))
            .expect("temperature command present");
        assert!(mode_idx < temp_idx);
    }

    #[test]
    fn fan_command_follows_temperature() {
        let r = resolved();
        let mut state = matching_state();
        state.fan_mode = Some("on".to_string());
        state.heat_setpoint_f = Some(60.0);
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(70.0));
        let plan = plan_push(Some(&state), &desired);

        let temp_idx = plan
            .commands
            .iter()
            .position(|c| matches!(c, PlannedCommand::SetTemperature(_)))
            .expect("temperature command present");
        let fan_idx = plan
            .commands
            .iter()
            .position(|c| matches!(c, PlannedCommand::SetFan(_)))
            .expect("fan command present");
        assert!(temp_idx < fan_idx);
    }

    #[test]
    fn heat_cool_pushes_dual_setpoints() {
        let r = resolved();
        let mut state = matching_state();
        state.cool_setpoint_f = Some(80.0);
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(70.0));
        let plan = plan_push(Some(&state), &desired);
        assert!(plan.commands.iter().any(|c| matches!(
            c,
            PlannedCommand::SetTemperature(TempCommand::Dual {
                high,
                low,
            }) if *high == 76.0 && *low == 68.0
        )));
    }

    #[test]
    fn off_mode_sends_no_temperature_command() {
        let r = ResolvedSetpoints {
            occupied: PhaseSetpoints {
                heat_f: 68.0,
                cool_f: 76.0,
                hvac_mode: HvacMode::Off,
                fan_mode: "auto".to_string(),
            },
            ..resolved()
        };
        let mut state = matching_state();
        state.hvac_mode = Some("cool".to_string());
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(70.0));
        let plan = plan_push(Some(&state), &desired);
        assert!(plan
            .commands
            .iter()
            .all(|c| !matches!(c, PlannedCommand::SetTemperature(_))));
        assert!(plan
            .commands
            .iter()
            .any(|c| matches!(c, PlannedCommand::SetMode(HvacMode::Off))));
    }

    #[test]
    fn no_known_state_always_pushes() {
        let r = resolved();
        let desired = desired_state(&r, Phase::Occupied, &Adjustments::default(), Some(70.0));
        let plan = plan_push(None, &desired);
        assert!(plan.skip_reason.is_none());
        assert!(!plan.commands.is_empty());
    }
}

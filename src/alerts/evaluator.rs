//! Per-(definition, target) alert state machine and the two entry paths
//! that feed it: the realtime path (single entity-value change) and the
//! cron path (re-derive current values for every matching target).
//!
//! The eval-state row is the unit of consistency; the partial unique index
//! on active instances is the safety net against double-firing under
//! overlapping invocations. Every failure is caught, logged, and skipped —
//! the next definition/target always gets its turn.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::alerts::conditions::{self, ConditionType, EvalInputs, WindowPoint};
use crate::alerts::notify::{self, NotificationKind};
use crate::alerts::targets::{self, Target};
use crate::entities::{
    alert_definition, alert_eval_state, alert_instance, equipment, sensor_entity, zone,
};
use crate::hvac::sampler::{self, AnomalyThresholds};

/// What one evaluation step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Condition newly true, sustain window accumulating.
    Pending,
    Fired,
    Resolved,
}

/// The machine's persisted bits, decoupled from the entity row for
/// testability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineState {
    pub condition_met: bool,
    pub condition_met_since: Option<DateTime<Utc>>,
    pub fired: bool,
}

impl MachineState {
    pub const IDLE: MachineState = MachineState {
        condition_met: false,
        condition_met_since: None,
        fired: false,
    };
}

/// Advance the machine one step.
///
/// idle -> pending on a fresh true (or straight to fired when sustain <= 0);
/// pending -> fired once the sustain window elapses; any false while fired
/// resolves. Continued true evaluations while fired change nothing here.
pub fn step(
    state: &MachineState,
    met: bool,
    sustain_minutes: i64,
    now: DateTime<Utc>,
) -> (MachineState, Transition) {
    match (met, state.condition_met, state.fired) {
        (true, false, _) => {
            let next = MachineState {
                condition_met: true,
                condition_met_since: Some(now),
                fired: sustain_minutes <= 0,
            };
            if sustain_minutes <= 0 {
                (next, Transition::Fired)
            } else {
                (next, Transition::Pending)
            }
        }
        (true, true, false) => {
            let since = state.condition_met_since.unwrap_or(now);
            if now - since >= Duration::minutes(sustain_minutes) {
                (
                    MachineState {
                        fired: true,
                        ..*state
                    },
                    Transition::Fired,
                )
            } else {
                (*state, Transition::None)
            }
        }
        (true, true, true) => (*state, Transition::None),
        (false, _, true) => (MachineState::IDLE, Transition::Resolved),
        (false, _, false) => (MachineState::IDLE, Transition::None),
    }
}

/// Whether a definition evaluates on the realtime path. `auto` routes
/// threshold/changes_to sensor conditions realtime; staleness, derived
/// metrics and anomaly flags always go to cron.
pub fn routes_realtime(def: &alert_definition::Model) -> bool {
    match def.eval_path.as_str() {
        "realtime" => true,
        "cron" => false,
        _ => {
            let sensor_target = matches!(def.target_kind.as_str(), "entity" | "equipment_role");
            let realtime_condition = matches!(
                ConditionType::parse(&def.condition_type),
                Some(ConditionType::AboveThreshold)
                    | Some(ConditionType::BelowThreshold)
                    | Some(ConditionType::ChangesTo)
            );
            sensor_target && realtime_condition
        }
    }
}

fn load_window(state: &alert_eval_state::Model) -> Vec<WindowPoint> {
    serde_json::from_value(state.window.clone()).unwrap_or_default()
}

/// Evaluate one (definition, target) pair against a current value and apply
/// whatever transition results.
pub async fn process_target(
    db: &DatabaseConnection,
    redis: &redis::Client,
    def: &alert_definition::Model,
    target: &Target,
    current_value: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, DbErr> {
    let existing = alert_eval_state::Entity::find()
        .filter(alert_eval_state::Column::DefinitionId.eq(def.id))
        .filter(alert_eval_state::Column::TargetKey.eq(target.key.clone()))
        .one(db)
        .await?;

    let inputs = match &existing {
        Some(row) => EvalInputs {
            previous_value: row.last_value.clone(),
            last_value_ts: row.last_value_ts,
            window: load_window(row),
        },
        None => EvalInputs::default(),
    };

    let outcome = conditions::evaluate(def, &inputs, current_value, now);

    let machine = match &existing {
        Some(row) => MachineState {
            condition_met: row.condition_met,
            condition_met_since: row.condition_met_since,
            fired: row.fired,
        },
        None => MachineState::IDLE,
    };
    let (next, transition) = step(&machine, outcome.met, def.sustain_minutes as i64, now);

    match transition {
        Transition::Fired => {
            fire(db, redis, def, target, outcome.observed.as_deref(), now).await?;
        }
        Transition::Resolved => {
            resolve(db, redis, def, target, outcome.observed.as_deref(), now).await?;
        }
        _ => {
            if next.fired && outcome.met {
                touch_active_instance(db, def, target, outcome.observed.as_deref()).await?;
            }
        }
    }

    // Persist the updated eval state. The value timestamp only advances
    // when the observed value actually changes, which is what staleness
    // measures.
    let value_changed = current_value.map(str::to_string) != inputs.previous_value;
    let window_json = serde_json::to_value(&outcome.window).unwrap_or_default();
    match existing {
        Some(row) => {
            let mut active: alert_eval_state::ActiveModel = row.into();
            if value_changed {
                active.last_value = Set(current_value.map(str::to_string));
                active.last_value_ts = Set(Some(now));
            }
            active.condition_met = Set(next.condition_met);
            active.condition_met_since = Set(next.condition_met_since);
            active.fired = Set(next.fired);
            active.window = Set(window_json);
            active.updated_at = Set(now);
            active.update(db).await?;
        }
        None => {
            let row = alert_eval_state::ActiveModel {
                id: Set(Uuid::new_v4()),
                definition_id: Set(def.id),
                target_key: Set(target.key.clone()),
                last_value: Set(current_value.map(str::to_string)),
                last_value_ts: Set(current_value.map(|_| now)),
                condition_met: Set(next.condition_met),
                condition_met_since: Set(next.condition_met_since),
                fired: Set(next.fired),
                window: Set(window_json),
                updated_at: Set(now),
            };
            row.insert(db).await?;
        }
    }

    Ok(transition)
}

async fn find_active_instance(
    db: &DatabaseConnection,
    def: &alert_definition::Model,
    target: &Target,
) -> Result<Option<alert_instance::Model>, DbErr> {
    alert_instance::Entity::find()
        .filter(alert_instance::Column::DefinitionId.eq(def.id))
        .filter(alert_instance::Column::TargetKey.eq(target.key.clone()))
        .filter(alert_instance::Column::Status.eq("active"))
        .one(db)
        .await
}

async fn fire(
    db: &DatabaseConnection,
    redis: &redis::Client,
    def: &alert_definition::Model,
    target: &Target,
    observed: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    // A second fire while active is a no-op: no new instance, no second
    // notification batch.
    if find_active_instance(db, def, target).await?.is_some() {
        debug!(definition_id = %def.id, target = %target.key, "Instance already active");
        return Ok(());
    }

    let instance = alert_instance::ActiveModel {
        id: Set(Uuid::new_v4()),
        definition_id: Set(def.id),
        target_key: Set(target.key.clone()),
        status: Set("active".to_string()),
        first_detected_at: Set(now),
        fired_at: Set(now),
        resolved_at: Set(None),
        trigger_value: Set(observed.map(str::to_string)),
        peak_value: Set(observed.and_then(|v| v.trim().parse::<f64>().ok())),
        last_value: Set(observed.map(str::to_string)),
        context: Set(serde_json::json!({
            "definition_name": def.name,
            "target_key": target.key,
            "severity": def.severity,
        })),
        created_at: Set(now),
    };
    let inserted = match instance.insert(db).await {
        Ok(model) => model,
        Err(e) => {
            // Duplicate-insert race against the partial unique index:
            // another invocation won, which is fine.
            if find_active_instance(db, def, target).await?.is_some() {
                debug!(definition_id = %def.id, target = %target.key,
                    "Lost fire race, treating as no-op: {}", e);
                return Ok(());
            }
            return Err(e);
        }
    };

    info!(definition_id = %def.id, target = %target.key, observed, "Alert fired");
    crate::metrics::increment_alerts_fired(&def.severity);
    notify::dispatch(db, redis, def, &inserted, NotificationKind::Fired, now).await;
    Ok(())
}

async fn resolve(
    db: &DatabaseConnection,
    redis: &redis::Client,
    def: &alert_definition::Model,
    target: &Target,
    observed: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    // Resolving without an active instance is a no-op.
    let Some(instance) = find_active_instance(db, def, target).await? else {
        return Ok(());
    };

    let duration_minutes = (now - instance.fired_at).num_minutes();
    let mut context = instance.context.clone();
    if let Some(obj) = context.as_object_mut() {
        obj.insert(
            "duration_minutes".to_string(),
            serde_json::json!(duration_minutes),
        );
    }

    let mut active: alert_instance::ActiveModel = instance.clone().into();
    active.status = Set("resolved".to_string());
    active.resolved_at = Set(Some(now));
    active.last_value = Set(observed.map(str::to_string));
    active.context = Set(context);
    let resolved = active.update(db).await?;

    info!(definition_id = %def.id, target = %target.key, duration_minutes, "Alert resolved");
    crate::metrics::increment_alerts_resolved(&def.severity);
    notify::dispatch(db, redis, def, &resolved, NotificationKind::Resolved, now).await;
    Ok(())
}

/// Continued true evaluation while fired: refresh last/peak values only.
async fn touch_active_instance(
    db: &DatabaseConnection,
    def: &alert_definition::Model,
    target: &Target,
    observed: Option<&str>,
) -> Result<(), DbErr> {
    let Some(instance) = find_active_instance(db, def, target).await? else {
        return Ok(());
    };
    let numeric = observed.and_then(|v| v.trim().parse::<f64>().ok());
    let peak = match (instance.peak_value, numeric) {
        (Some(p), Some(n)) => Some(p.max(n)),
        (p, n) => n.or(p),
    };
    let mut active: alert_instance::ActiveModel = instance.into();
    active.last_value = Set(observed.map(str::to_string));
    active.peak_value = Set(peak);
    active.update(db).await?;
    Ok(())
}

/// Derive the current value for a cron-evaluated target.
async fn derive_current_value(
    db: &DatabaseConnection,
    def: &alert_definition::Model,
    target: &Target,
    now: DateTime<Utc>,
) -> Result<Option<String>, DbErr> {
    match def.target_kind.as_str() {
        "entity" | "equipment_role" => {
            let Some(entity_id) = target.entity_id.as_deref() else {
                return Ok(None);
            };
            let entity = sensor_entity::Entity::find_by_id(entity_id.to_string())
                .one(db)
                .await?;
            Ok(entity.and_then(|e| e.last_value))
        }
        "zone_metric" | "anomaly_flag" => {
            let Some(zone_id) = target.zone_id else {
                return Ok(None);
            };
            let Some(zone) = zone::Entity::find_by_id(zone_id).one(db).await? else {
                return Ok(None);
            };
            let thresholds = AnomalyThresholds::for_zone(zone.anomaly_thresholds.as_ref());
            let telemetry = sampler::load_zone_telemetry(db, &zone, now).await?;
            let sample = sampler::sample(&telemetry, &thresholds, now);

            let metric = def.metric.as_deref().unwrap_or_default();
            if def.target_kind == "anomaly_flag" {
                return Ok(sample.anomalies.flag(metric).map(|b| b.to_string()));
            }
            let value = match metric {
                "zone_temp_f" => sample.zone_temp_f,
                "zone_humidity" => sample.zone_humidity,
                "feels_like_temp_f" => sample.feels_like_temp_f,
                "anomaly_count" => Some(sample.anomalies.anomaly_count() as f64),
                _ => None,
            };
            Ok(value.map(|v| v.to_string()))
        }
        _ => Ok(None),
    }
}

/// The periodic pass: every enabled cron-routed definition, every resolved
/// target, one evaluation step each.
pub async fn run_cron_pass(db: &DatabaseConnection, redis: &redis::Client) {
    let now = Utc::now();
    let defs = match alert_definition::Entity::find()
        .filter(alert_definition::Column::Enabled.eq(true))
        .all(db)
        .await
    {
        Ok(defs) => defs,
        Err(e) => {
            error!("Failed to load alert definitions: {}", e);
            return;
        }
    };

    for def in defs.iter().filter(|d| !routes_realtime(d)) {
        let targets = match targets::resolve_targets(db, def).await {
            Ok(t) => t,
            Err(e) => {
                error!(definition_id = %def.id, "Target resolution failed: {}", e);
                continue;
            }
        };
        for target in targets {
            let current = match derive_current_value(db, def, &target, now).await {
                Ok(v) => v,
                Err(e) => {
                    error!(definition_id = %def.id, target = %target.key,
                        "Value derivation failed: {}", e);
                    continue;
                }
            };
            if let Err(e) =
                process_target(db, redis, def, &target, current.as_deref(), now).await
            {
                error!(definition_id = %def.id, target = %target.key,
                    "Evaluation step failed: {}", e);
            }
        }
    }
}

/// The realtime path: one entity-value change event, evaluated against
/// every realtime-routed definition that targets it.
pub async fn process_entity_event(
    db: &DatabaseConnection,
    redis: &redis::Client,
    entity_id: &str,
    value: &str,
) {
    let now = Utc::now();
    let sensor = match sensor_entity::Entity::find_by_id(entity_id.to_string())
        .one(db)
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(entity_id, "Sensor lookup failed: {}", e);
            return;
        }
    };
    let unit = match &sensor {
        Some(s) => match s.equipment_id {
            Some(id) => equipment::Entity::find_by_id(id).one(db).await.ok().flatten(),
            None => None,
        },
        None => None,
    };

    let defs = match alert_definition::Entity::find()
        .filter(alert_definition::Column::Enabled.eq(true))
        .all(db)
        .await
    {
        Ok(defs) => defs,
        Err(e) => {
            error!("Failed to load alert definitions: {}", e);
            return;
        }
    };

    for def in defs.iter().filter(|d| routes_realtime(d)) {
        let scope = targets::ScopeFilter::from_json(&def.scope);
        let target = match def.target_kind.as_str() {
            "entity" if def.entity_id.as_deref() == Some(entity_id) => Some(Target {
                key: entity_id.to_string(),
                entity_id: Some(entity_id.to_string()),
                equipment_id: sensor.as_ref().and_then(|s| s.equipment_id),
                zone_id: None,
                site_id: unit.as_ref().map(|u| u.site_id),
            }),
            "equipment_role" => match (&sensor, &unit) {
                (Some(s), Some(u))
                    if def.sensor_role.as_deref() == Some(s.role.as_str())
                        && def.equipment_type.as_deref() == Some(u.equipment_type.as_str())
                        && scope.allows(Some(u.site_id), Some(u.id), None) =>
                {
                    Some(Target {
                        key: format!("equipment:{}:{}", u.id, s.role),
                        entity_id: Some(s.entity_id.clone()),
                        equipment_id: Some(u.id),
                        zone_id: None,
                        site_id: Some(u.site_id),
                    })
                }
                _ => None,
            },
            _ => None,
        };

        if let Some(target) = target {
            if let Err(e) = process_target(db, redis, def, &target, Some(value), now).await {
                error!(definition_id = %def.id, target = %target.key,
                    "Realtime evaluation failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn zero_sustain_fires_immediately() {
        let (state, transition) = step(&MachineState::IDLE, true, 0, now());
        assert_eq!(transition, Transition::Fired);
        assert!(state.fired);
        assert!(state.condition_met);
    }

    #[test]
    fn sustain_window_fires_exactly_once_at_elapse() {
        let (pending, t1) = step(&MachineState::IDLE, true, 10, now());
        assert_eq!(t1, Transition::Pending);
        assert!(!pending.fired);

        // Still inside the window: no fire.
        let (held, t2) = step(&pending, true, 10, now() + Duration::minutes(5));
        assert_eq!(t2, Transition::None);
        assert!(!held.fired);

        // Window elapsed: fire.
        let (fired, t3) = step(&held, true, 10, now() + Duration::minutes(10));
        assert_eq!(t3, Transition::Fired);
        assert!(fired.fired);

        // Continued true evaluations do not re-fire.
        let (still, t4) = step(&fired, true, 10, now() + Duration::minutes(20));
        assert_eq!(t4, Transition::None);
        assert!(still.fired);
    }

    #[test]
    fn false_while_fired_resolves_and_allows_retrigger() {
        let (fired, _) = step(&MachineState::IDLE, true, 0, now());
        let (idle, transition) = step(&fired, false, 0, now() + Duration::minutes(1));
        assert_eq!(transition, Transition::Resolved);
        assert_eq!(idle, MachineState::IDLE);

        // A fresh true after resolution starts a new episode.
        let (_, again) = step(&idle, true, 0, now() + Duration::minutes(2));
        assert_eq!(again, Transition::Fired);
    }

    #[test]
    fn false_while_pending_quietly_resets() {
        let (pending, _) = step(&MachineState::IDLE, true, 10, now());
        let (idle, transition) = step(&pending, false, 10, now() + Duration::minutes(5));
        assert_eq!(transition, Transition::None);
        assert_eq!(idle, MachineState::IDLE);
    }

    fn definition(eval_path: &str, target_kind: &str, condition: &str) -> alert_definition::Model {
        alert_definition::Model {
            id: Uuid::new_v4(),
            name: "routing".to_string(),
            target_kind: target_kind.to_string(),
            entity_id: None,
            equipment_type: None,
            sensor_role: None,
            metric: None,
            condition_type: condition.to_string(),
            threshold_value: None,
            target_value: None,
            target_value_type: None,
            stale_minutes: None,
            delta_value: None,
            delta_direction: None,
            window_minutes: None,
            sustain_minutes: 0,
            eval_path: eval_path.to_string(),
            scope: serde_json::json!({ "mode": "all" }),
            severity: "warning".to_string(),
            enabled: true,
            created_at: now(),
        }
    }

    #[test]
    fn auto_routing_splits_by_condition_and_target() {
        assert!(routes_realtime(&definition("auto", "entity", "above_threshold")));
        assert!(routes_realtime(&definition("auto", "equipment_role", "changes_to")));
        assert!(!routes_realtime(&definition("auto", "entity", "stale")));
        assert!(!routes_realtime(&definition("auto", "entity", "rate_of_change")));
        assert!(!routes_realtime(&definition("auto", "zone_metric", "above_threshold")));
        assert!(!routes_realtime(&definition("auto", "anomaly_flag", "changes_to")));
    }

    #[test]
    fn explicit_routing_wins_over_auto_rules() {
        assert!(routes_realtime(&definition("realtime", "zone_metric", "stale")));
        assert!(!routes_realtime(&definition("cron", "entity", "above_threshold")));
    }
}

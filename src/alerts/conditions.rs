//! Condition semantics for alert definitions.
//!
//! Every evaluation is total: missing data, non-numeric values, and absent
//! history all degrade to "condition false", never to an error. Staleness is
//! measured against the evaluation state's own timestamp, not the raw
//! source, because the state row is the unit of consistency.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::alert_definition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    AboveThreshold,
    BelowThreshold,
    ChangesTo,
    Stale,
    RateOfChange,
}

impl ConditionType {
    pub fn parse(s: &str) -> Option<ConditionType> {
        match s {
            "above_threshold" => Some(ConditionType::AboveThreshold),
            "below_threshold" => Some(ConditionType::BelowThreshold),
            "changes_to" => Some(ConditionType::ChangesTo),
            "stale" => Some(ConditionType::Stale),
            "rate_of_change" => Some(ConditionType::RateOfChange),
            _ => None,
        }
    }
}

/// One point in the rolling rate-of-change window, persisted as JSON on the
/// evaluation state row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPoint {
    pub ts: DateTime<Utc>,
    pub value: f64,
}

/// Prior state the condition may consult.
#[derive(Debug, Clone, Default)]
pub struct EvalInputs {
    pub previous_value: Option<String>,
    pub last_value_ts: Option<DateTime<Utc>>,
    pub window: Vec<WindowPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionOutcome {
    pub met: bool,
    /// Human-readable observed value for instance/notification text.
    pub observed: Option<String>,
    /// Updated rolling window to persist back.
    pub window: Vec<WindowPoint>,
}

fn parse_numeric(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok()
}

fn matches_target(current: &str, def: &alert_definition::Model) -> bool {
    let Some(target) = def.target_value.as_deref() else {
        return false;
    };
    match def.target_value_type.as_deref() {
        Some("number") => match (current.trim().parse::<f64>(), target.trim().parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        Some("boolean") => current.trim().eq_ignore_ascii_case(target.trim()),
        _ => current == target,
    }
}

/// Drop points older than the window and append the current numeric value.
fn roll_window(
    mut window: Vec<WindowPoint>,
    current: Option<f64>,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Vec<WindowPoint> {
    if let Some(value) = current {
        window.push(WindowPoint { ts: now, value });
    }
    let cutoff = now - Duration::minutes(window_minutes);
    window.retain(|p| p.ts >= cutoff);
    window
}

/// Evaluate one definition's condition against the current value.
pub fn evaluate(
    def: &alert_definition::Model,
    inputs: &EvalInputs,
    current_value: Option<&str>,
    now: DateTime<Utc>,
) -> ConditionOutcome {
    let Some(condition) = ConditionType::parse(&def.condition_type) else {
        return ConditionOutcome {
            met: false,
            observed: current_value.map(str::to_string),
            window: inputs.window.clone(),
        };
    };

    match condition {
        ConditionType::AboveThreshold | ConditionType::BelowThreshold => {
            let met = match (parse_numeric(current_value), def.threshold_value) {
                (Some(v), Some(threshold)) => match condition {
                    ConditionType::AboveThreshold => v > threshold,
                    _ => v < threshold,
                },
                // Non-numeric or unconfigured: condition false.
                _ => false,
            };
            ConditionOutcome {
                met,
                observed: current_value.map(str::to_string),
                window: inputs.window.clone(),
            }
        }
        ConditionType::ChangesTo => {
            let met = match current_value {
                Some(current) => {
                    let now_matches = matches_target(current, def);
                    // Transition-only: the previous value must exist and
                    // differ from the target.
                    let prev_differs = inputs
                        .previous_value
                        .as_deref()
                        .map(|prev| !matches_target(prev, def))
                        .unwrap_or(false);
                    now_matches && prev_differs
                }
                None => false,
            };
            ConditionOutcome {
                met,
                observed: current_value.map(str::to_string),
                window: inputs.window.clone(),
            }
        }
        ConditionType::Stale => {
            // Without history staleness cannot be proven.
            let (met, observed) = match (inputs.last_value_ts, def.stale_minutes) {
                (Some(ts), Some(threshold)) => {
                    let minutes = (now - ts).num_minutes();
                    (
                        minutes >= threshold as i64,
                        Some(format!("{} min since last update", minutes)),
                    )
                }
                _ => (false, None),
            };
            ConditionOutcome {
                met,
                observed,
                window: inputs.window.clone(),
            }
        }
        ConditionType::RateOfChange => {
            let window_minutes = def.window_minutes.unwrap_or(15) as i64;
            let window = roll_window(
                inputs.window.clone(),
                parse_numeric(current_value),
                window_minutes,
                now,
            );
            let met = match (window.first(), window.last(), def.delta_value) {
                (Some(oldest), Some(newest), Some(delta_value)) if window.len() >= 2 => {
                    let delta = newest.value - oldest.value;
                    let magnitude_ok = delta.abs() >= delta_value;
                    let direction_ok = match def.delta_direction.as_deref() {
                        Some("increase") => delta > 0.0,
                        Some("decrease") => delta < 0.0,
                        _ => true,
                    };
                    magnitude_ok && direction_ok
                }
                _ => false,
            };
            let observed = match (window.first(), window.last()) {
                (Some(oldest), Some(newest)) if window.len() >= 2 => Some(format!(
                    "{:+.1} over {} min",
                    newest.value - oldest.value,
                    (newest.ts - oldest.ts).num_minutes()
                )),
                _ => current_value.map(str::to_string),
            };
            ConditionOutcome {
                met,
                observed,
                window,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn definition(condition_type: &str) -> alert_definition::Model {
        alert_definition::Model {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            target_kind: "entity".to_string(),
            entity_id: Some("sensor.supply_temp_1".to_string()),
            equipment_type: None,
            sensor_role: None,
            metric: None,
            condition_type: condition_type.to_string(),
            threshold_value: None,
            target_value: None,
            target_value_type: None,
            stale_minutes: None,
            delta_value: None,
            delta_direction: None,
            window_minutes: None,
            sustain_minutes: 0,
            eval_path: "auto".to_string(),
            scope: serde_json::json!({ "mode": "all" }),
            severity: "warning".to_string(),
            enabled: true,
            created_at: now(),
        }
    }

    #[test]
    fn threshold_comparisons_are_strict() {
        let mut def = definition("above_threshold");
        def.threshold_value = Some(85.0);
        let inputs = EvalInputs::default();

        assert!(!evaluate(&def, &inputs, Some("85"), now()).met);
        assert!(evaluate(&def, &inputs, Some("85.1"), now()).met);

        def.condition_type = "below_threshold".to_string();
        def.threshold_value = Some(35.0);
        assert!(evaluate(&def, &inputs, Some("34.9"), now()).met);
        assert!(!evaluate(&def, &inputs, Some("35"), now()).met);
    }

    #[test]
    fn non_numeric_value_never_meets_threshold() {
        let mut def = definition("above_threshold");
        def.threshold_value = Some(10.0);
        let outcome = evaluate(&def, &EvalInputs::default(), Some("unavailable"), now());
        assert!(!outcome.met);
        assert_eq!(outcome.observed.as_deref(), Some("unavailable"));
    }

    #[test]
    fn changes_to_fires_only_on_transition() {
        let mut def = definition("changes_to");
        def.target_value = Some("off".to_string());
        def.target_value_type = Some("string".to_string());

        let transition = EvalInputs {
            previous_value: Some("on".to_string()),
            ..Default::default()
        };
        assert!(evaluate(&def, &transition, Some("off"), now()).met);

        let sustained = EvalInputs {
            previous_value: Some("off".to_string()),
            ..Default::default()
        };
        assert!(!evaluate(&def, &sustained, Some("off"), now()).met);

        // No history: no provable transition.
        assert!(!evaluate(&def, &EvalInputs::default(), Some("off"), now()).met);
    }

    #[test]
    fn changes_to_boolean_is_case_insensitive() {
        let mut def = definition("changes_to");
        def.target_value = Some("true".to_string());
        def.target_value_type = Some("boolean".to_string());
        let inputs = EvalInputs {
            previous_value: Some("False".to_string()),
            ..Default::default()
        };
        assert!(evaluate(&def, &inputs, Some("TRUE"), now()).met);
    }

    #[test]
    fn changes_to_numeric_compares_by_value() {
        let mut def = definition("changes_to");
        def.target_value = Some("1".to_string());
        def.target_value_type = Some("number".to_string());
        let inputs = EvalInputs {
            previous_value: Some("0".to_string()),
            ..Default::default()
        };
        assert!(evaluate(&def, &inputs, Some("1.0"), now()).met);
    }

    #[test]
    fn stale_requires_history_and_reports_minutes() {
        let mut def = definition("stale");
        def.stale_minutes = Some(30);

        // No prior timestamp: cannot prove staleness.
        assert!(!evaluate(&def, &EvalInputs::default(), None, now()).met);

        let inputs = EvalInputs {
            last_value_ts: Some(now() - Duration::minutes(45)),
            ..Default::default()
        };
        let outcome = evaluate(&def, &inputs, None, now());
        assert!(outcome.met);
        assert_eq!(
            outcome.observed.as_deref(),
            Some("45 min since last update")
        );
    }

    #[test]
    fn rate_of_change_meets_delta_with_direction() {
        let mut def = definition("rate_of_change");
        def.delta_value = Some(5.0);
        def.delta_direction = Some("increase".to_string());
        def.window_minutes = Some(15);

        let window = vec![
            WindowPoint {
                ts: now() - Duration::minutes(14),
                value: 70.0,
            },
            WindowPoint {
                ts: now() - Duration::minutes(4),
                value: 74.0,
            },
        ];
        let inputs = EvalInputs {
            window,
            ..Default::default()
        };
        let outcome = evaluate(&def, &inputs, Some("76"), now());
        // 76 - 70 = 6 >= 5, increasing.
        assert!(outcome.met);
        assert_eq!(outcome.window.len(), 3);
    }

    #[test]
    fn rate_of_change_below_delta_is_false() {
        let mut def = definition("rate_of_change");
        def.delta_value = Some(5.0);
        def.delta_direction = Some("increase".to_string());
        def.window_minutes = Some(15);

        let window = vec![
            WindowPoint {
                ts: now() - Duration::minutes(14),
                value: 70.0,
            },
            WindowPoint {
                ts: now() - Duration::minutes(4),
                value: 72.0,
            },
        ];
        let inputs = EvalInputs {
            window,
            ..Default::default()
        };
        assert!(!evaluate(&def, &inputs, Some("73"), now()).met);
    }

    #[test]
    fn rate_of_change_wrong_direction_is_false() {
        let mut def = definition("rate_of_change");
        def.delta_value = Some(5.0);
        def.delta_direction = Some("decrease".to_string());
        def.window_minutes = Some(15);

        let window = vec![WindowPoint {
            ts: now() - Duration::minutes(10),
            value: 70.0,
        }];
        let inputs = EvalInputs {
            window,
            ..Default::default()
        };
        assert!(!evaluate(&def, &inputs, Some("76"), now()).met);
    }

    #[test]
    fn rate_of_change_prunes_expired_points() {
        let mut def = definition("rate_of_change");
        def.delta_value = Some(5.0);
        def.window_minutes = Some(15);

        let window = vec![
            // Outside the 15-minute window; must be dropped.
            WindowPoint {
                ts: now() - Duration::minutes(40),
                value: 60.0,
            },
            WindowPoint {
                ts: now() - Duration::minutes(10),
                value: 70.0,
            },
        ];
        let inputs = EvalInputs {
            window,
            ..Default::default()
        };
        let outcome = evaluate(&def, &inputs, Some("72"), now());
        assert_eq!(outcome.window.len(), 2);
        assert!(!outcome.met);
    }

    #[test]
    fn rate_of_change_requires_two_points() {
        let mut def = definition("rate_of_change");
        def.delta_value = Some(5.0);
        def.window_minutes = Some(15);
        let outcome = evaluate(&def, &EvalInputs::default(), Some("70"), now());
        assert!(!outcome.met);
        assert_eq!(outcome.window.len(), 1);
    }
}

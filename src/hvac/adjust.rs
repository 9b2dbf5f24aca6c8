//! Corrective adjustment factors: feels-like, smart-start, occupancy,
//! manager deviation. Each produces a signed, capped additive offset in °F;
//! factors are independent and sum linearly into one offset applied to heat
//! and cool alike.

use serde::Serialize;

use crate::device::{DeviceState, HvacMode};
use crate::hvac::resolver::{AdjustmentPolicy, PhaseSetpoints};
use crate::hvac::sampler::ZoneSample;
use crate::hvac::Phase;

/// Below this magnitude the manager deviation is treated as noise.
pub const MANAGER_DEADBAND_F: f64 = 0.5;
/// Smart-start nudges one degree per cycle toward comfort.
pub const SMART_START_STEP_F: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Adjustments {
    pub feels_like_f: f64,
    pub smart_start_f: f64,
    pub occupancy_f: f64,
    pub manager_f: f64,
}

impl Adjustments {
    pub fn total(&self) -> f64 {
        self.feels_like_f + self.smart_start_f + self.occupancy_f + self.manager_f
    }
}

fn clamp(value: f64, cap: f64) -> f64 {
    value.clamp(-cap.abs(), cap.abs())
}

/// Feels-like bias: when perceived temperature exceeds the measured one the
/// setpoints shift down, and vice versa. Capped by the profile.
fn feels_like_adjustment(policy: &AdjustmentPolicy, sample: &ZoneSample) -> f64 {
    if !policy.feels_like_enabled {
        return 0.0;
    }
    match (sample.zone_temp_f, sample.feels_like_temp_f) {
        (Some(actual), Some(feels)) => clamp(actual - feels, policy.feels_like_max_f),
        _ => 0.0,
    }
}

/// Pre-open nudge toward the occupied comfort band. Active only while
/// unoccupied and within the configured lead window.
fn smart_start_adjustment(
    policy: &AdjustmentPolicy,
    occupied: &PhaseSetpoints,
    sample: &ZoneSample,
    phase: Phase,
    minutes_until_open: Option<i64>,
) -> f64 {
    if !policy.smart_start_enabled || phase != Phase::Unoccupied {
        return 0.0;
    }
    let Some(lead) = minutes_until_open else {
        return 0.0;
    };
    if lead > policy.smart_start_lead_minutes {
        return 0.0;
    }
    let Some(temp) = sample.zone_temp_f else {
        return 0.0;
    };
    let nudge = if temp < occupied.heat_f {
        SMART_START_STEP_F
    } else if temp > occupied.cool_f {
        -SMART_START_STEP_F
    } else {
        0.0
    };
    clamp(nudge, policy.smart_start_max_f)
}

fn occupancy_adjustment(policy: &AdjustmentPolicy, sample: &ZoneSample) -> f64 {
    if !policy.occupancy_enabled {
        return 0.0;
    }
    clamp(sample.occupancy_adj, policy.occupancy_max_f)
}

/// Observed active setpoint minus the expected one (base plus the other
/// three factors), clamped, with a deadband against thermostat noise. This
/// reads a manual bump at the unit as intent and carries it forward.
fn manager_adjustment(
    observed: Option<&DeviceState>,
    base: &PhaseSetpoints,
    other_factors_total: f64,
    manager_offset_max_f: f64,
) -> f64 {
    let Some(state) = observed else {
        return 0.0;
    };
    let mode = state.hvac_mode.as_deref().and_then(HvacMode::parse);
    let observed_setpoint = match mode {
        Some(HvacMode::Heat) => state.target_temp_f.or(state.heat_setpoint_f),
        Some(HvacMode::Cool) => state.target_temp_f.or(state.cool_setpoint_f),
        // Dual-setpoint mode tracks the heat side, matching the audit
        // logger's snapshot.
        Some(HvacMode::HeatCool) => state.heat_setpoint_f,
        _ => None,
    };
    let Some(observed_setpoint) = observed_setpoint else {
        return 0.0;
    };
    let expected = match mode {
        Some(HvacMode::Cool) => base.cool_f + other_factors_total,
        _ => base.heat_f + other_factors_total,
    };
    let deviation = observed_setpoint - expected;
    if deviation.abs() < MANAGER_DEADBAND_F {
        return 0.0;
    }
    clamp(deviation, manager_offset_max_f)
}

/// Compute all four factors for one push cycle.
#[allow(clippy::too_many_arguments)]
pub fn compute(
    policy: &AdjustmentPolicy,
    base: &PhaseSetpoints,
    occupied: &PhaseSetpoints,
    sample: &ZoneSample,
    phase: Phase,
    minutes_until_open: Option<i64>,
    observed: Option<&DeviceState>,
    manager_offset_max_f: f64,
) -> Adjustments {
    let feels_like_f = feels_like_adjustment(policy, sample);
    let smart_start_f =
        smart_start_adjustment(policy, occupied, sample, phase, minutes_until_open);
    let occupancy_f = occupancy_adjustment(policy, sample);
    let others = feels_like_f + smart_start_f + occupancy_f;
    let manager_f = manager_adjustment(observed, base, others, manager_offset_max_f);
    Adjustments {
        feels_like_f,
        smart_start_f,
        occupancy_f,
        manager_f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hvac::sampler::{AnomalyReport, DataSource};

    fn policy() -> AdjustmentPolicy {
        AdjustmentPolicy {
            feels_like_enabled: true,
            feels_like_max_f: 2.0,
            smart_start_enabled: true,
            smart_start_max_f: 1.0,
            smart_start_lead_minutes: 60,
            occupancy_enabled: true,
            occupancy_max_f: 1.0,
        }
    }

    fn setpoints(heat: f64, cool: f64) -> PhaseSetpoints {
        PhaseSetpoints {
            heat_f: heat,
            cool_f: cool,
            hvac_mode: HvacMode::HeatCool,
            fan_mode: "auto".to_string(),
        }
    }

    fn sample_with(temp: Option<f64>, feels: Option<f64>, occupancy: f64) -> ZoneSample {
        ZoneSample {
            zone_temp_f: temp,
            zone_humidity: Some(50.0),
            feels_like_temp_f: feels,
            occupancy_adj: occupancy,
            temp_source: DataSource::Spaces,
            anomalies: AnomalyReport::default(),
        }
    }

    #[test]
    fn feels_like_shifts_down_when_it_feels_hotter() {
        let sample = sample_with(Some(76.0), Some(79.0), 0.0);
        let adj = compute(
            &policy(),
            &setpoints(68.0, 76.0),
            &setpoints(68.0, 76.0),
            &sample,
            Phase::Occupied,
            None,
            None,
            4.0,
        );
        // Perceived 3 over actual, capped at 2.
        assert_eq!(adj.feels_like_f, -2.0);
    }

    #[test]
    fn smart_start_only_inside_lead_window() {
        let sample = sample_with(Some(63.0), None, 0.0);
        let occupied = setpoints(68.0, 76.0);

        let inside = compute(
            &policy(),
            &occupied,
            &occupied,
            &sample,
            Phase::Unoccupied,
            Some(30),
            None,
            4.0,
        );
        assert_eq!(inside.smart_start_f, 1.0);

        let outside = compute(
            &policy(),
            &occupied,
            &occupied,
            &sample,
            Phase::Unoccupied,
            Some(90),
            None,
            4.0,
        );
        assert_eq!(outside.smart_start_f, 0.0);

        let already_open = compute(
            &policy(),
            &occupied,
            &occupied,
            &sample,
            Phase::Occupied,
            None,
            None,
            4.0,
        );
        assert_eq!(already_open.smart_start_f, 0.0);
    }

    #[test]
    fn smart_start_idle_when_on_target() {
        let sample = sample_with(Some(70.0), None, 0.0);
        let occupied = setpoints(68.0, 76.0);
        let adj = compute(
            &policy(),
            &occupied,
            &occupied,
            &sample,
            Phase::Unoccupied,
            Some(30),
            None,
            4.0,
        );
        assert_eq!(adj.smart_start_f, 0.0);
    }

    #[test]
    fn occupancy_clamped_to_profile_cap() {
        let mut p = policy();
        p.occupancy_max_f = 0.5;
        let sample = sample_with(Some(70.0), None, -1.0);
        let adj = compute(
            &p,
            &setpoints(68.0, 76.0),
            &setpoints(68.0, 76.0),
            &sample,
            Phase::Occupied,
            None,
            None,
            4.0,
        );
        assert_eq!(adj.occupancy_f, -0.5);
    }

    #[test]
    fn manager_deviation_nets_against_other_factors() {
        let sample = sample_with(Some(70.0), Some(70.0), 0.0);
        let observed = DeviceState {
            hvac_mode: Some("heat".to_string()),
            target_temp_f: Some(71.0),
            ..Default::default()
        };
        let adj = compute(
            &policy(),
            &setpoints(68.0, 76.0),
            &setpoints(68.0, 76.0),
            &sample,
            Phase::Occupied,
            None,
            Some(&observed),
            4.0,
        );
        // Other factors are zero; 71 observed vs 68 expected.
        assert_eq!(adj.manager_f, 3.0);
        assert_eq!(adj.total(), 3.0);
    }

    #[test]
    fn manager_deviation_deadband_and_clamp() {
        let sample = sample_with(Some(70.0), Some(70.0), 0.0);
        let small = DeviceState {
            hvac_mode: Some("heat".to_string()),
            target_temp_f: Some(68.4),
            ..Default::default()
        };
        let adj = compute(
            &policy(),
            &setpoints(68.0, 76.0),
            &setpoints(68.0, 76.0),
            &sample,
            Phase::Occupied,
            None,
            Some(&small),
            4.0,
        );
        assert_eq!(adj.manager_f, 0.0);

        let large = DeviceState {
            hvac_mode: Some("heat".to_string()),
            target_temp_f: Some(80.0),
            ..Default::default()
        };
        let adj = compute(
            &policy(),
            &setpoints(68.0, 76.0),
            &setpoints(68.0, 76.0),
            &sample,
            Phase::Occupied,
            None,
            Some(&large),
            4.0,
        );
        assert_eq!(adj.manager_f, 4.0);
    }

    #[test]
    fn disabled_features_contribute_nothing() {
        let p = AdjustmentPolicy::disabled();
        let sample = sample_with(Some(76.0), Some(80.0), -1.0);
        let adj = compute(
            &p,
            &setpoints(68.0, 76.0),
            &setpoints(68.0, 76.0),
            &sample,
            Phase::Unoccupied,
            Some(10),
            None,
            4.0,
        );
        assert_eq!(adj.feels_like_f, 0.0);
        assert_eq!(adj.smart_start_f, 0.0);
        assert_eq!(adj.occupancy_f, 0.0);
    }
}
